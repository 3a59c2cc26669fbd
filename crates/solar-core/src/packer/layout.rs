use crate::types::{round_to, PanelRegion, ZoomLevel};
use serde::{Deserialize, Serialize};

/// Margin kept free on every side of the image
pub const SETBACK: f64 = 0.10;

pub(super) const AVAILABLE_WIDTH: f64 = 1.0 - 2.0 * SETBACK;
pub(super) const AVAILABLE_HEIGHT: f64 = 1.0 - 2.0 * SETBACK;

const MIN_SPACING_X: f64 = 0.005;
const MIN_SPACING_Y: f64 = 0.008;
const SPACING_X_RATIO: f64 = 0.08;
const SPACING_Y_RATIO: f64 = 0.12;

/// Absorbs float noise when comparing rounded edges against the setback.
const EDGE_EPSILON: f64 = 1e-9;

/// Normalized footprint of one panel on the image
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PanelSize {
    pub width: f64,
    pub height: f64,
}

impl PanelSize {
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Looks up the panel footprint for a roof area bucket and zoom level.
    /// Larger roofs shrink the footprint; closer shots enlarge it.
    pub fn for_roof(total_area_sq_ft: f64, zoom: ZoomLevel) -> Self {
        let (width, height) = if total_area_sq_ft > 2000.0 {
            match zoom {
                ZoomLevel::CloseUp => (0.070, 0.050),
                ZoomLevel::Medium => (0.060, 0.045),
                ZoomLevel::Aerial => (0.050, 0.035),
            }
        } else if total_area_sq_ft > 1000.0 {
            match zoom {
                ZoomLevel::CloseUp => (0.090, 0.065),
                ZoomLevel::Medium => (0.080, 0.060),
                ZoomLevel::Aerial => (0.065, 0.048),
            }
        } else {
            match zoom {
                ZoomLevel::CloseUp => (0.120, 0.085),
                ZoomLevel::Medium => (0.100, 0.075),
                ZoomLevel::Aerial => (0.080, 0.060),
            }
        };
        Self::new(width, height)
    }
}

/// Row/column geometry inside the setback frame.
#[derive(Debug, Clone, Copy)]
pub(super) struct LayoutGrid {
    pub size: PanelSize,
    pub spacing_x: f64,
    pub spacing_y: f64,
    pub max_per_row: usize,
    pub max_rows: usize,
}

impl LayoutGrid {
    pub fn new(size: PanelSize, spacing_x: f64, spacing_y: f64) -> Self {
        let max_per_row = (AVAILABLE_WIDTH / (size.width + spacing_x)).floor() as usize;
        let max_rows = (AVAILABLE_HEIGHT / (size.height + spacing_y)).floor() as usize;
        Self {
            size,
            spacing_x,
            spacing_y,
            max_per_row,
            max_rows,
        }
    }

    /// Gaps scale with the panel but never drop below a fixed minimum.
    pub fn with_proportional_spacing(size: PanelSize) -> Self {
        let spacing_x = MIN_SPACING_X.max(size.width * SPACING_X_RATIO);
        let spacing_y = MIN_SPACING_Y.max(size.height * SPACING_Y_RATIO);
        Self::new(size, spacing_x, spacing_y)
    }

    pub fn capacity(&self) -> usize {
        self.max_per_row * self.max_rows
    }

    /// Places `row_counts[r]` panels on row `r`, each row centered horizontally.
    /// Panels whose rounded edges would cross the far setback are skipped.
    pub fn place_rows<F>(&self, row_counts: &[usize], mut section_for_row: F) -> Vec<PanelRegion>
    where
        F: FnMut(usize) -> Option<String>,
    {
        let width = round_to(self.size.width, 3);
        let height = round_to(self.size.height, 3);
        let limit = 1.0 - SETBACK + EDGE_EPSILON;
        let mut regions = Vec::with_capacity(row_counts.iter().sum());

        for (row, &count) in row_counts.iter().enumerate() {
            if count == 0 {
                continue;
            }

            let row_width =
                count as f64 * self.size.width + (count - 1) as f64 * self.spacing_x;
            let start_x = SETBACK + ((AVAILABLE_WIDTH - row_width) / 2.0).max(0.0);
            let y = round_to(SETBACK + row as f64 * (self.size.height + self.spacing_y), 3);
            if y + height > limit {
                continue;
            }

            let section = section_for_row(row);
            for col in 0..count {
                let x = round_to(start_x + col as f64 * (self.size.width + self.spacing_x), 3);
                if x + width > limit {
                    continue;
                }

                regions.push(PanelRegion {
                    x,
                    y,
                    width,
                    height,
                    roof_section_name: section.clone(),
                });
            }
        }

        regions
    }
}

/// Splits `total` panels into rows of `per_row`, the last row taking the remainder.
pub(super) fn fill_rows(total: usize, per_row: usize) -> Vec<usize> {
    if per_row == 0 {
        return Vec::new();
    }

    let mut rows = vec![per_row; total / per_row];
    if total % per_row > 0 {
        rows.push(total % per_row);
    }
    rows
}
