use crate::types::*;

/// Fixed share of a roof assigned to one section.
#[derive(Debug, Clone, Copy)]
pub struct SectionTemplate {
    pub name: &'static str,
    pub orientation_label: &'static str,
    pub tilt_degrees: f64,
    /// Share of the total roof area covered by this section
    pub area_fraction: f64,
    /// Share of the section area that can hold panels
    pub usable_fraction: f64,
    pub efficiency_percent: f64,
}

const fn section(
    name: &'static str,
    orientation_label: &'static str,
    tilt_degrees: f64,
    area_fraction: f64,
    usable_fraction: f64,
    efficiency_percent: f64,
) -> SectionTemplate {
    SectionTemplate {
        name,
        orientation_label,
        tilt_degrees,
        area_fraction,
        usable_fraction,
        efficiency_percent,
    }
}

const GABLE: [SectionTemplate; 2] = [
    section("South-Facing Gable", "South (180°)", 30.0, 0.50, 0.70, 96.0),
    section("North-Facing Gable", "North (0°)", 30.0, 0.50, 0.30, 65.0),
];

const HIP: [SectionTemplate; 4] = [
    section("South Hip Face", "South (180°)", 25.0, 0.35, 0.80, 94.0),
    section("East Hip Face", "East (90°)", 25.0, 0.25, 0.60, 82.0),
    section("West Hip Face", "West (270°)", 25.0, 0.25, 0.60, 84.0),
    section("North Hip Face", "North (0°)", 25.0, 0.15, 0.0, 60.0),
];

const SHED: [SectionTemplate; 1] = [section(
    "Single-Slope Roof",
    "South (180°)",
    15.0,
    1.0,
    0.80,
    97.0,
)];

// Tilt racks on a flat roof need row gaps to avoid self-shading.
const FLAT: [SectionTemplate; 1] = [section(
    "Flat Roof (Tilt-Rack)",
    "South (180°)",
    10.0,
    1.0,
    0.60,
    91.0,
)];

const COMPLEX: [SectionTemplate; 3] = [
    section("Main South Section", "South (180°)", 30.0, 0.40, 0.75, 95.0),
    section("West Wing", "West (270°)", 28.0, 0.30, 0.65, 83.0),
    section("East Wing", "East (90°)", 28.0, 0.30, 0.65, 81.0),
];

/// Efficiency reported when no panel fits anywhere on the roof.
const DEFAULT_OVERALL_EFFICIENCY: u32 = 90;

/// Returns the partition template for a roof type.
pub fn templates(roof_type: RoofType) -> &'static [SectionTemplate] {
    match roof_type {
        RoofType::Gable => &GABLE,
        RoofType::Hip => &HIP,
        RoofType::Shed => &SHED,
        RoofType::Flat => &FLAT,
        RoofType::Complex => &COMPLEX,
    }
}

/// Number of physical panels that fit on `usable_area_sq_ft` with racking allowance.
pub fn panels_for_area(usable_area_sq_ft: f64) -> u32 {
    (usable_area_sq_ft / (PANEL_AREA_SQ_FT * SPACING_FACTOR)).floor() as u32
}

/// Splits a roof into its template sections and totals panel counts.
pub fn section_roof(roof_type: RoofType, total_area_sq_ft: f64) -> Result<RoofSectioning> {
    if !total_area_sq_ft.is_finite() || total_area_sq_ft < 0.0 {
        return Err(LayoutError::InvalidInput(format!(
            "Roof area must be a non-negative number, got {}",
            total_area_sq_ft
        )));
    }

    let sections: Vec<RoofSection> = templates(roof_type)
        .iter()
        .map(|template| {
            let area = total_area_sq_ft * template.area_fraction;
            RoofSection {
                name: template.name.to_string(),
                orientation_label: template.orientation_label.to_string(),
                tilt_degrees: template.tilt_degrees,
                area_sq_ft: round_to(area, 2),
                panel_count: panels_for_area(area * template.usable_fraction),
                efficiency_percent: template.efficiency_percent,
            }
        })
        .collect();

    let total_usable_area_sq_ft = round_to(sections.iter().map(|s| s.area_sq_ft).sum(), 2);
    let total_panel_count: u32 = sections.iter().map(|s| s.panel_count).sum();
    let overall_efficiency_percent = if total_panel_count == 0 {
        DEFAULT_OVERALL_EFFICIENCY
    } else {
        let weighted: f64 = sections
            .iter()
            .map(|s| s.efficiency_percent * s.panel_count as f64)
            .sum();
        (weighted / total_panel_count as f64).round() as u32
    };

    Ok(RoofSectioning {
        roof_type,
        sections,
        total_usable_area_sq_ft,
        total_panel_count,
        overall_efficiency_percent,
    })
}
