//! Rooftop solar layout planning and panel inspection.
//!
//! The deterministic core sections a roof, packs panels into the image frame
//! and validates externally proposed layouts. The [`pipeline`] module wraps
//! an external vision model around that core and falls back to it whenever
//! the model cannot be used.

pub mod faults;
pub mod installation;
pub mod packer;
pub mod pipeline;
pub mod render;
pub mod roof;
pub mod types;
pub mod validator;

pub use faults::{assess_faults, synthesize_faults};
pub use installation::fallback_installation;
pub use packer::{pack_panels, PackRequest, PanelPacker, PanelSize};
pub use pipeline::{
    AnalysisConfig, Analyzer, ImageInput, RetryPolicy, RoofOverrides, UnavailableModel,
    VisionError, VisionModel,
};
pub use render::{render_faults_svg, render_installation_svg};
pub use roof::section_roof;
pub use types::*;
pub use validator::{
    validate_external_regions, RegionValidator, ValidatedRegions, ValidationRequest,
};
