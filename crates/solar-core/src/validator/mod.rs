use crate::types::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, info};

mod confidence;
#[cfg(test)]
mod tests;

pub use confidence::{blended_confidence, ConfidenceInputs};

const MIN_WIDTH: f64 = 0.04;
const MAX_WIDTH: f64 = 0.12;
const MIN_HEIGHT: f64 = 0.03;
const MAX_HEIGHT: f64 = 0.08;

const MIN_X: f64 = 0.05;
const MIN_Y: f64 = 0.10;
const MAX_RIGHT: f64 = 0.95;
const MAX_BOTTOM: f64 = 0.90;

const CENTER_X_RANGE: (f64, f64) = (0.10, 0.90);
const CENTER_Y_RANGE: (f64, f64) = (0.15, 0.85);

/// Minimum distance between the centers of two accepted panels
pub const MIN_CENTER_SPACING: f64 = 0.025;

/// Input for validating externally supplied regions
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationRequest {
    pub candidates: Vec<PanelRegion>,
    #[serde(default)]
    pub declared_coverage: f64,
    #[serde(default)]
    pub declared_total_panels: u32,
    #[serde(default)]
    pub image_format: ImageFormat,
}

/// Predicate a candidate region failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectReason {
    Size,
    Bounds,
    Overlap,
    Spacing,
    CenterOutOfBounds,
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            RejectReason::Size => "size",
            RejectReason::Bounds => "bounds",
            RejectReason::Overlap => "overlap",
            RejectReason::Spacing => "spacing",
            RejectReason::CenterOutOfBounds => "center out of bounds",
        };
        f.write_str(label)
    }
}

/// Diagnostic record for a dropped candidate
#[derive(Debug, Clone, PartialEq)]
pub struct Rejection {
    /// Position of the candidate in the input list
    pub index: usize,
    pub reasons: Vec<RejectReason>,
    /// Set when the region only failed after resizing to the reference size
    pub after_normalization: bool,
}

/// Regions that survived validation plus recomputed metrics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidatedRegions {
    pub regions: Vec<PanelRegion>,
    pub total_panels: u32,
    /// Panel count the source claimed before validation
    pub declared_total_panels: u32,
    pub power_output_kw: f64,
    pub confidence_percent: u32,
    #[serde(skip)]
    pub rejections: Vec<Rejection>,
}

/// Filters untrusted panel regions down to a renderable, uniform set.
pub struct RegionValidator {
    image_format: ImageFormat,
}

impl RegionValidator {
    pub fn new(image_format: ImageFormat) -> Self {
        Self { image_format }
    }

    /// Accepts candidates in input order, normalizes them to the first accepted
    /// size and recomputes panel count, power output and confidence.
    ///
    /// Returns `AllPanelsRejected` when candidates were offered but none survive.
    pub fn validate(
        &self,
        candidates: &[PanelRegion],
        declared_coverage: f64,
        declared_total_panels: u32,
    ) -> Result<ValidatedRegions> {
        let mut accepted: Vec<(usize, PanelRegion)> = Vec::new();
        let mut rejections = Vec::new();

        for (index, candidate) in candidates.iter().enumerate() {
            let mut reasons = Vec::new();
            if !size_in_range(candidate) {
                reasons.push(RejectReason::Size);
            }
            reasons.extend(placement_violations(
                candidate,
                accepted.iter().map(|(_, region)| region),
            ));

            if reasons.is_empty() {
                accepted.push((index, candidate.clone()));
            } else {
                debug!(
                    "Rejected candidate #{} at ({:.3}, {:.3}) {:.3}x{:.3}: {}",
                    index,
                    candidate.x,
                    candidate.y,
                    candidate.width,
                    candidate.height,
                    join_reasons(&reasons)
                );
                rejections.push(Rejection {
                    index,
                    reasons,
                    after_normalization: false,
                });
            }
        }

        if !candidates.is_empty() && accepted.is_empty() {
            info!("All {} candidate regions rejected", candidates.len());
            return Err(LayoutError::AllPanelsRejected {
                offered: candidates.len(),
            });
        }

        let regions = normalize_sizes(accepted, &mut rejections);
        let total_panels = regions.len() as u32;
        let power_output_kw = round_to(total_panels as f64 * PANEL_POWER_KW, 2);

        let validation_success_rate = if candidates.is_empty() {
            0.0
        } else {
            regions.len() as f64 / candidates.len() as f64
        };
        let confidence_percent = blended_confidence(&ConfidenceInputs {
            image_quality: self.image_format.image_quality(),
            validation_success_rate,
            coverage_percent: declared_coverage,
            total_panels,
        });

        if declared_total_panels != total_panels {
            info!(
                "Source declared {} panels but {} survived validation",
                declared_total_panels, total_panels
            );
        }
        info!(
            "Validated {} of {} candidate regions, confidence {}%",
            total_panels,
            candidates.len(),
            confidence_percent
        );

        Ok(ValidatedRegions {
            regions,
            total_panels,
            declared_total_panels,
            power_output_kw,
            confidence_percent,
            rejections,
        })
    }
}

/// Validates a candidate list in one call.
pub fn validate_external_regions(request: &ValidationRequest) -> Result<ValidatedRegions> {
    RegionValidator::new(request.image_format).validate(
        &request.candidates,
        request.declared_coverage,
        request.declared_total_panels,
    )
}

fn size_in_range(region: &PanelRegion) -> bool {
    (MIN_WIDTH..=MAX_WIDTH).contains(&region.width)
        && (MIN_HEIGHT..=MAX_HEIGHT).contains(&region.height)
}

/// Bounds, overlap, spacing and center checks against already accepted regions.
fn placement_violations<'a>(
    region: &PanelRegion,
    accepted: impl IntoIterator<Item = &'a PanelRegion>,
) -> Vec<RejectReason> {
    let mut reasons = Vec::new();

    let in_bounds = region.x >= MIN_X
        && region.y >= MIN_Y
        && region.right() <= MAX_RIGHT
        && region.bottom() <= MAX_BOTTOM;
    if !in_bounds {
        reasons.push(RejectReason::Bounds);
    }

    let mut overlap = false;
    let mut crowded = false;
    for other in accepted {
        overlap |= region.overlaps(other);
        crowded |= region.center_distance(other) < MIN_CENTER_SPACING;
    }
    if overlap {
        reasons.push(RejectReason::Overlap);
    }
    if crowded {
        reasons.push(RejectReason::Spacing);
    }

    let (cx, cy) = region.center();
    let center_ok = (CENTER_X_RANGE.0..=CENTER_X_RANGE.1).contains(&cx)
        && (CENTER_Y_RANGE.0..=CENTER_Y_RANGE.1).contains(&cy);
    if !center_ok {
        reasons.push(RejectReason::CenterOutOfBounds);
    }

    reasons
}

/// Resizes every accepted region to the first one's footprint. A region that
/// stops satisfying the placement checks once resized is dropped.
fn normalize_sizes(
    accepted: Vec<(usize, PanelRegion)>,
    rejections: &mut Vec<Rejection>,
) -> Vec<PanelRegion> {
    let Some((_, reference)) = accepted.first() else {
        return Vec::new();
    };
    let (width, height) = (reference.width, reference.height);

    let mut normalized: Vec<PanelRegion> = Vec::with_capacity(accepted.len());
    for (index, mut region) in accepted {
        region.width = width;
        region.height = height;

        let reasons = placement_violations(&region, &normalized);
        if reasons.is_empty() {
            normalized.push(region);
        } else {
            debug!(
                "Dropped candidate #{} after size normalization: {}",
                index,
                join_reasons(&reasons)
            );
            rejections.push(Rejection {
                index,
                reasons,
                after_normalization: true,
            });
        }
    }

    normalized
}

fn join_reasons(reasons: &[RejectReason]) -> String {
    reasons
        .iter()
        .map(|r| r.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
