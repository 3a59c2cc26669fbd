use crate::types::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

mod alternative;
mod layout;

pub use layout::{PanelSize, SETBACK};

/// Share of the requested panels the primary layout must place before
/// the alternative layout takes over.
const UNDERFILL_RATIO: f64 = 0.8;

/// Input for deterministic panel packing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackRequest {
    pub roof_type: RoofType,
    pub sections: Vec<RoofSection>,
    pub total_panel_count: u32,
    pub zoom_level: ZoomLevel,
}

/// Lays out panel regions in normalized image space without randomness.
pub struct PanelPacker {
    request: PackRequest,
}

impl PanelPacker {
    /// Validates the request and builds a new packer instance.
    pub fn new(request: PackRequest) -> Result<Self> {
        for section in &request.sections {
            if !section.area_sq_ft.is_finite() || section.area_sq_ft < 0.0 {
                return Err(LayoutError::InvalidInput(format!(
                    "Section '{}' has invalid area {}",
                    section.name, section.area_sq_ft
                )));
            }
        }

        Ok(Self { request })
    }

    /// Produces at most `total_panel_count` non-overlapping regions.
    pub fn pack(&self) -> Vec<PanelRegion> {
        let requested = self.request.total_panel_count as usize;
        if requested == 0 {
            return Vec::new();
        }

        let size = PanelSize::for_roof(self.total_roof_area(), self.request.zoom_level);
        let regions = self.primary_layout(size);

        if (regions.len() as f64) < requested as f64 * UNDERFILL_RATIO {
            warn!(
                "Primary layout placed {} of {} panels on {} roof, switching to alternative layout",
                regions.len(),
                requested,
                self.request.roof_type
            );
            return self.alternative_layout();
        }

        debug!(
            "Primary layout placed {} of {} panels ({}x{} at {} zoom)",
            regions.len(),
            requested,
            size.width,
            size.height,
            self.request.zoom_level
        );
        regions
    }

    /// Sum of all section areas; selects the panel size bucket.
    fn total_roof_area(&self) -> f64 {
        self.request.sections.iter().map(|s| s.area_sq_ft).sum()
    }

    /// Near-square grid sized from the roof bucket, with rows tagged by section.
    fn primary_layout(&self, size: PanelSize) -> Vec<PanelRegion> {
        let grid = layout::LayoutGrid::with_proportional_spacing(size);
        let to_place = (self.request.total_panel_count as usize).min(grid.capacity());
        if to_place == 0 {
            return Vec::new();
        }

        let aspect = layout::AVAILABLE_HEIGHT / layout::AVAILABLE_WIDTH;
        let balanced_rows = (to_place as f64 * aspect).sqrt().ceil() as usize;
        let rows = grid.max_rows.min(balanced_rows).max(1);
        let per_row = to_place.div_ceil(rows);
        let row_counts = layout::fill_rows(to_place, per_row);
        let actual_rows = row_counts.len();

        let sections = &self.request.sections;
        grid.place_rows(&row_counts, |row| {
            if sections.is_empty() {
                return None;
            }
            let index = (row as f64 / actual_rows as f64 * sections.len() as f64).floor() as usize;
            Some(sections[index.min(sections.len() - 1)].name.clone())
        })
    }
}

/// Builds a packer for already-sectioned roof and runs it.
pub fn pack_panels(
    roof_type: RoofType,
    sections: &[RoofSection],
    total_panel_count: u32,
    zoom_level: ZoomLevel,
) -> Result<Vec<PanelRegion>> {
    let packer = PanelPacker::new(PackRequest {
        roof_type,
        sections: sections.to_vec(),
        total_panel_count,
        zoom_level,
    })?;
    Ok(packer.pack())
}
