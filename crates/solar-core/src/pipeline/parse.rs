use crate::types::{round_to, FaultAnnotation, FaultType, PanelRegion, Severity};
use serde::Deserialize;
use std::str::FromStr;
use tracing::debug;

use super::VisionError;

/// Installation plan as the model is asked to return it
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ModelInstallation {
    pub roof_type: Option<String>,
    pub estimated_roof_area_sq_ft: Option<f64>,
    pub usable_roof_area_sq_ft: Option<f64>,
    pub coverage_percent: Option<f64>,
    pub efficiency_percent: Option<f64>,
    /// Read as a float since models often write counts like `24.0`
    pub total_panels: Option<f64>,
    pub panel_regions: Vec<ModelRegion>,
    pub notes: Option<String>,
    pub orientation_analysis: Option<String>,
    pub shading_analysis: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelRegion {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    #[serde(default)]
    pub roof_section: Option<String>,
}

impl From<ModelRegion> for PanelRegion {
    fn from(region: ModelRegion) -> Self {
        PanelRegion {
            x: region.x,
            y: region.y,
            width: region.width,
            height: region.height,
            roof_section_name: region.roof_section,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ModelFaults {
    pub faults: Vec<ModelFault>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ModelFault {
    #[serde(rename = "type")]
    pub fault_type: String,
    pub severity: String,
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub description: Option<String>,
}

/// Cuts the JSON object out of a reply that may be wrapped in prose or a
/// markdown code fence.
pub fn extract_json(reply: &str) -> Option<&str> {
    let start = reply.find('{')?;
    let end = reply.rfind('}')?;
    (start < end).then(|| &reply[start..=end])
}

pub fn parse_installation(reply: &str) -> Result<ModelInstallation, VisionError> {
    let json = extract_json(reply)
        .ok_or_else(|| VisionError::Malformed("no JSON object in reply".to_string()))?;
    serde_json::from_str(json).map_err(|e| VisionError::Malformed(e.to_string()))
}

/// Parses the fault list, skipping entries with unknown vocabulary or
/// positions outside the image.
pub fn parse_faults(reply: &str) -> Result<Vec<FaultAnnotation>, VisionError> {
    let json = extract_json(reply)
        .ok_or_else(|| VisionError::Malformed("no JSON object in reply".to_string()))?;
    let parsed: ModelFaults =
        serde_json::from_str(json).map_err(|e| VisionError::Malformed(e.to_string()))?;

    let faults = parsed
        .faults
        .into_iter()
        .filter_map(|fault| {
            let fault_type = FaultType::from_str(&fault.fault_type).ok()?;
            let severity = Severity::from_str(&fault.severity).ok()?;
            let in_frame = |v: f64| (0.0..=1.0).contains(&v);
            if !in_frame(fault.x) || !in_frame(fault.y) {
                debug!(
                    "Dropping {} fault at ({}, {}) outside the image",
                    fault_type, fault.x, fault.y
                );
                return None;
            }

            let description = fault
                .description
                .filter(|d| !d.trim().is_empty())
                .unwrap_or_else(|| crate::faults::describe(fault_type, severity));
            Some(FaultAnnotation {
                fault_type,
                severity,
                x: round_to(fault.x, 3),
                y: round_to(fault.y, 3),
                description,
            })
        })
        .collect();

    Ok(faults)
}

/// Reads a yes/no classification reply.
pub fn parse_yes_no(reply: &str) -> Option<bool> {
    let word = reply
        .trim_start_matches(|c: char| !c.is_ascii_alphabetic())
        .chars()
        .take_while(|c| c.is_ascii_alphabetic())
        .collect::<String>()
        .to_ascii_lowercase();

    match word.as_str() {
        "yes" => Some(true),
        "no" => Some(false),
        _ => None,
    }
}
