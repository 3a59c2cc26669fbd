//! Weighted confidence score for validated AI layouts.

const IMAGE_QUALITY_WEIGHT: f64 = 0.25;
const VALIDATION_WEIGHT: f64 = 0.35;
const COVERAGE_WEIGHT: f64 = 0.20;
const PANEL_COUNT_WEIGHT: f64 = 0.12;
const COMPLEXITY_WEIGHT: f64 = 0.08;

/// Coverage at which the coverage term saturates
const FULL_COVERAGE_PERCENT: f64 = 80.0;
/// Panel count at which the panel-count term saturates
const FULL_PANEL_COUNT: f64 = 25.0;

pub const MIN_CONFIDENCE: u32 = 85;
pub const MAX_CONFIDENCE: u32 = 96;

#[derive(Debug, Clone, Copy)]
pub struct ConfidenceInputs {
    pub image_quality: f64,
    /// Accepted / offered candidates
    pub validation_success_rate: f64,
    pub coverage_percent: f64,
    pub total_panels: u32,
}

/// Blends the five quality terms into an integer percentage in `[85, 96]`.
pub fn blended_confidence(inputs: &ConfidenceInputs) -> u32 {
    let image_quality = unit(inputs.image_quality);
    let validation = unit(inputs.validation_success_rate);
    let coverage = unit(inputs.coverage_percent / FULL_COVERAGE_PERCENT);
    let panel_count = unit(inputs.total_panels as f64 / FULL_PANEL_COUNT);
    let complexity = if inputs.total_panels > 12 { 0.95 } else { 0.88 };

    let blended = IMAGE_QUALITY_WEIGHT * image_quality
        + VALIDATION_WEIGHT * validation
        + COVERAGE_WEIGHT * coverage
        + PANEL_COUNT_WEIGHT * panel_count
        + COMPLEXITY_WEIGHT * complexity;

    ((blended * 100.0).round() as u32).clamp(MIN_CONFIDENCE, MAX_CONFIDENCE)
}

/// Clamps into [0, 1]; garbage input counts as zero.
fn unit(value: f64) -> f64 {
    if value.is_finite() {
        value.clamp(0.0, 1.0)
    } else {
        0.0
    }
}
