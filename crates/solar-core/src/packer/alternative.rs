use super::layout::{fill_rows, LayoutGrid, PanelSize};
use super::*;

const ALTERNATIVE_PANEL: PanelSize = PanelSize::new(0.05, 0.035);
const ALTERNATIVE_SPACING: f64 = 0.005;
const DEFAULT_SECTION_NAME: &str = "Primary Roof Section";

impl PanelPacker {
    /// Dense fallback grid: small fixed panels, tight spacing, full rows.
    /// Every panel carries the first section's name.
    pub(super) fn alternative_layout(&self) -> Vec<PanelRegion> {
        let grid = LayoutGrid::new(ALTERNATIVE_PANEL, ALTERNATIVE_SPACING, ALTERNATIVE_SPACING);
        let to_place = (self.request.total_panel_count as usize).min(grid.capacity());
        let row_counts = fill_rows(to_place, grid.max_per_row);

        let label = self
            .request
            .sections
            .first()
            .map(|s| s.name.clone())
            .unwrap_or_else(|| DEFAULT_SECTION_NAME.to_string());

        let regions = grid.place_rows(&row_counts, |_| Some(label.clone()));
        debug!(
            "Alternative layout placed {} of {} panels",
            regions.len(),
            self.request.total_panel_count
        );
        regions
    }
}
