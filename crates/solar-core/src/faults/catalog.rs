use crate::types::{FaultType, HealthRating, Severity};

/// Occurrence odds and severity mix for one fault type.
#[derive(Debug, Clone, Copy)]
pub struct FaultTemplate {
    pub fault_type: FaultType,
    pub occurrence_probability: f64,
    /// Probabilities in `Severity::ALL` order: Critical, High, Medium, Low
    pub severity_distribution: [f64; 4],
}

const fn template(
    fault_type: FaultType,
    occurrence_probability: f64,
    severity_distribution: [f64; 4],
) -> FaultTemplate {
    FaultTemplate {
        fault_type,
        occurrence_probability,
        severity_distribution,
    }
}

pub const FAULT_TEMPLATES: [FaultTemplate; 10] = [
    template(FaultType::HailDamage, 0.08, [0.15, 0.35, 0.35, 0.15]),
    template(FaultType::CellCracking, 0.15, [0.20, 0.40, 0.30, 0.10]),
    template(FaultType::MicroCrack, 0.25, [0.05, 0.20, 0.45, 0.30]),
    template(FaultType::DirtDebris, 0.35, [0.00, 0.05, 0.35, 0.60]),
    template(FaultType::CellDiscoloration, 0.20, [0.00, 0.15, 0.45, 0.40]),
    template(FaultType::HotSpot, 0.12, [0.25, 0.40, 0.25, 0.10]),
    template(FaultType::FrameDamage, 0.08, [0.10, 0.30, 0.40, 0.20]),
    template(FaultType::Shading, 0.30, [0.00, 0.10, 0.40, 0.50]),
    template(FaultType::Corrosion, 0.10, [0.05, 0.25, 0.40, 0.30]),
    template(FaultType::Delamination, 0.07, [0.20, 0.40, 0.30, 0.10]),
];

/// Inspection text for a fault at a given severity.
pub fn describe(fault_type: FaultType, severity: Severity) -> String {
    use FaultType::*;
    use Severity::*;

    let text = match (fault_type, severity) {
        (HailDamage, Critical) => "Severe hail impact with shattered glass exposing cells to moisture",
        (HailDamage, High) => "Multiple hail impact points with radial cracking across the glass",
        (HailDamage, Medium) => "Isolated hail dents on the surface with minor glass stress",
        (HailDamage, Low) => "Light hail marks with no visible structural damage",
        (CellCracking, Critical) => "Broken cells with disconnected areas causing major power loss",
        (CellCracking, High) => "Cracks spanning several cells, likely reducing string output",
        (CellCracking, Medium) => "Visible cracks in a single cell with partial isolation",
        (CellCracking, Low) => "Hairline crack in one cell with negligible output impact",
        (MicroCrack, Critical) => "Dense micro-crack network likely to grow into cell breakage",
        (MicroCrack, High) => "Micro-cracks across several cells, expect progressive degradation",
        (MicroCrack, Medium) => "Micro-cracks detected in a small cell cluster",
        (MicroCrack, Low) => "Isolated micro-crack near a busbar",
        (DirtDebris, High) => "Heavy soiling and debris blocking a large share of the surface",
        (DirtDebris, Medium) => "Noticeable dust and debris build-up reducing light capture",
        (DirtDebris, Low) => "Light dust layer, routine cleaning recommended",
        (CellDiscoloration, High) => "Strong browning across multiple cells from encapsulant aging",
        (CellDiscoloration, Medium) => "Yellowing visible on several cells",
        (CellDiscoloration, Low) => "Slight discoloration on a single cell",
        (HotSpot, Critical) => "Hot spot with burn marks, risk of backsheet failure and fire",
        (HotSpot, High) => "Pronounced hot spot indicating bypass diode or cell failure",
        (HotSpot, Medium) => "Localized heating pattern on a cell",
        (HotSpot, Low) => "Minor temperature irregularity",
        (FrameDamage, Critical) => "Bent or detached frame compromising module mounting",
        (FrameDamage, High) => "Frame deformation putting stress on the glass edge",
        (FrameDamage, Medium) => "Dented frame section with intact seal",
        (FrameDamage, Low) => "Cosmetic scratches on the frame",
        (Shading, High) => "Persistent shading over a large share of the panel",
        (Shading, Medium) => "Partial shading from nearby objects during part of the day",
        (Shading, Low) => "Brief shading at low sun angles",
        (Corrosion, Critical) => "Advanced corrosion of contacts and junction box",
        (Corrosion, High) => "Corrosion on frame joints and connectors",
        (Corrosion, Medium) => "Surface corrosion starting on the frame",
        (Corrosion, Low) => "Light oxidation spots",
        (Delamination, Critical) => "Large delaminated area letting moisture reach the cells",
        (Delamination, High) => "Delamination bubbles spreading across cells",
        (Delamination, Medium) => "Delamination starting at the panel edge",
        (Delamination, Low) => "Small delamination spot near the frame",
        _ => return format!("{} severity {} detected", severity, fault_type.label()),
    };
    text.to_string()
}

/// Overall health from the severity multiset; the first matching rule wins.
pub fn overall_health(severities: &[Severity]) -> HealthRating {
    let count = |wanted: Severity| severities.iter().filter(|&&s| s == wanted).count();
    let critical = count(Severity::Critical);
    let high = count(Severity::High);
    let medium = count(Severity::Medium);

    if critical > 0 {
        HealthRating::Critical
    } else if high >= 2 || (high >= 1 && medium >= 2) {
        HealthRating::Poor
    } else if high >= 1 || medium >= 3 {
        HealthRating::Fair
    } else if medium >= 1 || severities.len() >= 2 {
        HealthRating::Good
    } else {
        HealthRating::Excellent
    }
}

/// Maintenance advice keyed on the most severe fault present.
pub fn recommendations(worst: Option<Severity>) -> Vec<String> {
    let lines: &[&str] = match worst {
        Some(Severity::Critical) => &[
            "Disconnect the affected panel and schedule an emergency inspection",
            "Have a certified technician assess replacement under warranty",
            "Check neighbouring panels and wiring for related damage",
            "Document the damage with photos for insurance claims",
        ],
        Some(Severity::High) => &[
            "Schedule a professional inspection within the next two weeks",
            "Monitor panel output daily for further drops",
            "Plan repair or replacement of the affected panel",
        ],
        Some(Severity::Medium) => &[
            "Schedule maintenance within the next month",
            "Clean the panel surface and re-inspect",
            "Compare output against neighbouring panels",
        ],
        Some(Severity::Low) => &[
            "Include the panel in the next routine maintenance",
            "Clean the panel surface to restore light capture",
            "Re-inspect in three to six months",
        ],
        None => &[
            "Panel is in excellent condition",
            "Continue routine cleaning every six months",
            "Re-inspect annually to catch early wear",
        ],
    };
    lines.iter().map(|line| line.to_string()).collect()
}
