//! Orchestration around the external vision model.
//!
//! Every path that cannot use the model's answer ends in the deterministic
//! fallback: sectioning plus packing for installations, fault synthesis for
//! inspections.

use crate::faults::{assess_faults, synthesize_faults};
use crate::installation::{fallback_installation, orientation_summary};
use crate::roof::section_roof;
use crate::types::*;
use crate::validator::RegionValidator;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

mod parse;
pub mod prompts;
mod retry;
#[cfg(test)]
mod tests;

pub use parse::{extract_json, parse_faults, parse_installation, parse_yes_no};
pub use retry::RetryPolicy;

/// Failure talking to the vision model
#[derive(Debug, thiserror::Error)]
pub enum VisionError {
    #[error("Vision model unavailable: {0}")]
    Unavailable(String),

    #[error("Vision model overloaded: {0}")]
    Overloaded(String),

    #[error("Vision model call timed out")]
    Timeout,

    #[error("Vision model API error: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("Malformed model output: {0}")]
    Malformed(String),
}

/// Image handed to the model
#[derive(Debug, Clone)]
pub struct ImageInput {
    pub bytes: Vec<u8>,
    pub format: ImageFormat,
}

impl ImageInput {
    pub fn new(bytes: Vec<u8>, format: ImageFormat) -> Self {
        Self { bytes, format }
    }

    pub fn zoom_level(&self) -> ZoomLevel {
        ZoomLevel::from_file_size(self.bytes.len())
    }
}

/// Multimodal model that answers a text prompt about an image.
pub trait VisionModel {
    fn describe_image(
        &self,
        image: &ImageInput,
        prompt: &str,
    ) -> std::result::Result<String, VisionError>;
}

/// Model stand-in used when no credentials are configured.
#[derive(Debug, Clone, Default)]
pub struct UnavailableModel;

impl VisionModel for UnavailableModel {
    fn describe_image(
        &self,
        _image: &ImageInput,
        _prompt: &str,
    ) -> std::result::Result<String, VisionError> {
        Err(VisionError::Unavailable(
            "no vision model configured".to_string(),
        ))
    }
}

/// User-supplied values that take precedence over model estimates
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RoofOverrides {
    #[serde(default)]
    pub roof_type: Option<RoofType>,
    #[serde(default)]
    pub total_area_sq_ft: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    #[serde(default)]
    pub retry: RetryPolicy,
    #[serde(default = "default_roof_type")]
    pub default_roof_type: RoofType,
    #[serde(default = "default_area_sq_ft")]
    pub default_area_sq_ft: f64,
}

fn default_roof_type() -> RoofType {
    RoofType::Gable
}

fn default_area_sq_ft() -> f64 {
    1500.0
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            retry: RetryPolicy::default(),
            default_roof_type: default_roof_type(),
            default_area_sq_ft: default_area_sq_ft(),
        }
    }
}

/// Runs model-backed analyses and falls back to the deterministic core.
pub struct Analyzer {
    config: AnalysisConfig,
}

impl Analyzer {
    pub fn new(config: AnalysisConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Plans a panel layout for a rooftop image.
    ///
    /// Errors only on invalid overrides; model failures, rejected images and
    /// unusable model output all produce a fallback result.
    pub fn analyze_installation<M: VisionModel + ?Sized>(
        &self,
        model: &M,
        image: &ImageInput,
        overrides: &RoofOverrides,
    ) -> Result<InstallationResult> {
        if let Some(area) = overrides.total_area_sq_ft {
            if !area.is_finite() || area < 0.0 {
                return Err(LayoutError::InvalidInput(format!(
                    "Roof area override must be a non-negative number, got {}",
                    area
                )));
            }
        }

        match self.classify(model, image, prompts::ROOFTOP_CHECK_PROMPT) {
            Some(true) => {}
            Some(false) => return self.fallback_installation(image, overrides, "not a rooftop"),
            None => {
                return self.fallback_installation(image, overrides, "rooftop check unavailable")
            }
        }

        let reply = match self.ask(model, image, prompts::INSTALLATION_PROMPT) {
            Ok(reply) => reply,
            Err(err) => return self.fallback_installation(image, overrides, &err.to_string()),
        };

        let plan = match parse_installation(&reply) {
            Ok(plan) => plan,
            Err(err) => return self.fallback_installation(image, overrides, &err.to_string()),
        };

        match self.assemble_model_installation(plan, image, overrides) {
            Ok(result) => Ok(result),
            Err(reason) => self.fallback_installation(image, overrides, &reason),
        }
    }

    /// Inspects a panel image for faults, synthesizing a report with `rng`
    /// when the model cannot be used.
    pub fn analyze_faults<M: VisionModel + ?Sized, R: Rng>(
        &self,
        model: &M,
        image: &ImageInput,
        panel_id: Option<&str>,
        rng: &mut R,
    ) -> FaultReport {
        if self.classify(model, image, prompts::PANEL_CHECK_PROMPT) != Some(true) {
            warn!("Panel check failed, synthesizing fault report");
            return synthesize_faults(rng, panel_id);
        }

        let faults = self
            .ask(model, image, prompts::FAULT_PROMPT)
            .and_then(|reply| parse_faults(&reply));

        match faults {
            Ok(faults) => {
                info!("Model reported {} faults", faults.len());
                assess_faults(faults, panel_id, AnalysisSource::Ai)
            }
            Err(err) => {
                warn!("Fault analysis unusable ({}), synthesizing fault report", err);
                synthesize_faults(rng, panel_id)
            }
        }
    }

    fn ask<M: VisionModel + ?Sized>(
        &self,
        model: &M,
        image: &ImageInput,
        prompt: &str,
    ) -> std::result::Result<String, VisionError> {
        self.config.retry.run(|attempt| {
            debug!("Model call attempt {}", attempt);
            model.describe_image(image, prompt)
        })
    }

    /// `None` when the model fails or answers something other than yes/no.
    fn classify<M: VisionModel + ?Sized>(
        &self,
        model: &M,
        image: &ImageInput,
        prompt: &str,
    ) -> Option<bool> {
        match self.ask(model, image, prompt) {
            Ok(reply) => {
                let verdict = parse_yes_no(&reply);
                if verdict.is_none() {
                    warn!("Unrecognized classification reply: {:?}", reply);
                }
                verdict
            }
            Err(err) => {
                warn!("Classification failed: {}", err);
                None
            }
        }
    }

    fn fallback_installation(
        &self,
        image: &ImageInput,
        overrides: &RoofOverrides,
        reason: &str,
    ) -> Result<InstallationResult> {
        let roof_type = overrides.roof_type.unwrap_or(self.config.default_roof_type);
        let area = overrides
            .total_area_sq_ft
            .unwrap_or(self.config.default_area_sq_ft);

        warn!("Using fallback installation layout: {}", reason);
        fallback_installation(roof_type, area, image.zoom_level())
    }

    /// Validates model regions and builds the result; `Err` carries the reason
    /// to fall back.
    fn assemble_model_installation(
        &self,
        plan: parse::ModelInstallation,
        image: &ImageInput,
        overrides: &RoofOverrides,
    ) -> std::result::Result<InstallationResult, String> {
        let roof_type = match overrides.roof_type {
            Some(roof_type) => roof_type,
            None => plan
                .roof_type
                .as_deref()
                .ok_or_else(|| "model omitted roof type".to_string())?
                .parse::<RoofType>()
                .map_err(|e| e.to_string())?,
        };

        if plan.panel_regions.is_empty() {
            return Err("model returned no panel regions".to_string());
        }

        let estimated = overrides
            .total_area_sq_ft
            .or(plan.estimated_roof_area_sq_ft)
            .filter(|area| area.is_finite() && *area > 0.0)
            .unwrap_or(self.config.default_area_sq_ft);
        let sectioning = section_roof(roof_type, estimated).map_err(|e| e.to_string())?;

        let coverage = clamp_percent(plan.coverage_percent).unwrap_or(0.0);
        let candidates: Vec<PanelRegion> =
            plan.panel_regions.into_iter().map(PanelRegion::from).collect();
        let declared = declared_panel_count(plan.total_panels, candidates.len());
        let validated = RegionValidator::new(image.format)
            .validate(&candidates, coverage, declared)
            .map_err(|e| e.to_string())?;

        let usable = plan
            .usable_roof_area_sq_ft
            .filter(|area| area.is_finite() && *area >= 0.0)
            .unwrap_or(sectioning.total_usable_area_sq_ft)
            .min(estimated);
        let efficiency = clamp_percent(plan.efficiency_percent)
            .unwrap_or(sectioning.overall_efficiency_percent as f64);

        info!(
            "Model layout for {} roof: {} of {} regions kept, confidence {}%",
            roof_type,
            validated.total_panels,
            candidates.len(),
            validated.confidence_percent
        );

        Ok(InstallationResult {
            source: AnalysisSource::Ai,
            roof_type,
            total_panels: validated.total_panels,
            coverage_percent: coverage,
            efficiency_percent: efficiency,
            confidence_percent: validated.confidence_percent,
            power_output_kw: validated.power_output_kw,
            estimated_roof_area_sq_ft: estimated,
            usable_roof_area_sq_ft: usable,
            notes: non_empty(plan.notes).unwrap_or_else(|| {
                format!("Layout planned from image analysis of a {} roof.", roof_type)
            }),
            orientation_analysis: non_empty(plan.orientation_analysis)
                .unwrap_or_else(|| orientation_summary(&sectioning.sections)),
            shading_analysis: non_empty(plan.shading_analysis)
                .unwrap_or_else(|| "No shading analysis provided.".to_string()),
            sections: sectioning.sections,
            regions: validated.regions,
        })
    }
}

fn clamp_percent(value: Option<f64>) -> Option<f64> {
    value
        .filter(|v| v.is_finite())
        .map(|v| round_to(v.clamp(0.0, 100.0), 1))
}

/// Panel total the model claimed, or the number of regions it sent when the
/// claim is missing or unusable.
fn declared_panel_count(claimed: Option<f64>, offered: usize) -> u32 {
    claimed
        .filter(|n| n.is_finite() && *n >= 0.0)
        .map(|n| n.round().min(u32::MAX as f64) as u32)
        .unwrap_or(offered as u32)
}

fn non_empty(text: Option<String>) -> Option<String> {
    text.filter(|t| !t.trim().is_empty())
}
