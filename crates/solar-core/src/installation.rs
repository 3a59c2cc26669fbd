use crate::packer::{pack_panels, SETBACK};
use crate::roof::section_roof;
use crate::types::*;
use tracing::info;

/// Confidence reported for layouts that never saw model output
pub const FALLBACK_CONFIDENCE: u32 = 85;

/// Normalized area left inside the setback frame
const PACKABLE_AREA: f64 = (1.0 - 2.0 * SETBACK) * (1.0 - 2.0 * SETBACK);

/// Estimated output of the fallback path, derated by the system efficiency factor.
pub fn fallback_power_kw(total_panels: u32) -> f64 {
    round_to(
        total_panels as f64 * PANEL_POWER_KW * SYSTEM_EFFICIENCY_FACTOR,
        2,
    )
}

/// Share of the packable frame covered by regions, in percent.
pub fn coverage_percent(regions: &[PanelRegion]) -> f64 {
    let covered: f64 = regions.iter().map(PanelRegion::area).sum();
    round_to((covered / PACKABLE_AREA * 100.0).clamp(0.0, 100.0), 1)
}

/// Sections the roof, packs panels and assembles a complete result without
/// consulting any model.
pub fn fallback_installation(
    roof_type: RoofType,
    total_area_sq_ft: f64,
    zoom_level: ZoomLevel,
) -> Result<InstallationResult> {
    let sectioning = section_roof(roof_type, total_area_sq_ft)?;
    let regions = pack_panels(
        roof_type,
        &sectioning.sections,
        sectioning.total_panel_count,
        zoom_level,
    )?;

    let total_panels = regions.len() as u32;
    let result = InstallationResult {
        source: AnalysisSource::Fallback,
        roof_type,
        total_panels,
        coverage_percent: coverage_percent(&regions),
        efficiency_percent: (sectioning.overall_efficiency_percent as f64).clamp(0.0, 100.0),
        confidence_percent: FALLBACK_CONFIDENCE,
        power_output_kw: fallback_power_kw(total_panels),
        estimated_roof_area_sq_ft: total_area_sq_ft,
        usable_roof_area_sq_ft: sectioning.total_usable_area_sq_ft.min(total_area_sq_ft),
        notes: fallback_notes(roof_type, total_area_sq_ft, total_panels),
        orientation_analysis: orientation_summary(&sectioning.sections),
        shading_analysis: shading_summary(roof_type),
        sections: sectioning.sections,
        regions,
    };

    info!(
        "Fallback layout for {} roof ({:.0} sq ft, {} zoom): {} panels, {:.2} kW",
        roof_type, total_area_sq_ft, zoom_level, result.total_panels, result.power_output_kw
    );

    Ok(result)
}

fn fallback_notes(roof_type: RoofType, area: f64, panels: u32) -> String {
    format!(
        "Estimated layout for a {} roof of about {:.0} sq ft with {} panels. \
         Generated from standard roof templates because image analysis was unavailable; \
         confirm measurements on site before installation.",
        roof_type, area, panels
    )
}

pub(crate) fn orientation_summary(sections: &[RoofSection]) -> String {
    if sections.is_empty() {
        return "No roof sections identified.".to_string();
    }

    sections
        .iter()
        .map(|s| {
            format!(
                "{} faces {} at {:.0}° tilt, {} panels at {:.0}% efficiency",
                s.name, s.orientation_label, s.tilt_degrees, s.panel_count, s.efficiency_percent
            )
        })
        .collect::<Vec<_>>()
        .join("; ")
}

fn shading_summary(roof_type: RoofType) -> String {
    let detail = match roof_type {
        RoofType::Flat => "tilt racks are spaced to avoid row-to-row shading",
        RoofType::Complex => "valleys and dormers may shade parts of the wings",
        RoofType::Hip => "the north face is excluded to avoid low-yield placement",
        RoofType::Gable | RoofType::Shed => "no obstructions assumed on the main slope",
    };
    format!("Shading not measured from the image; {}.", detail)
}
