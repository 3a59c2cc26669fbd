use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Physical footprint of one 66"x40" panel in square feet
pub const PANEL_AREA_SQ_FT: f64 = 18.3;

/// Rated output of a single panel in kW
pub const PANEL_POWER_KW: f64 = 0.425;

/// Extra room per panel for racking and walkways
pub const SPACING_FACTOR: f64 = 1.15;

/// Derating applied to estimated output on the fallback path
pub const SYSTEM_EFFICIENCY_FACTOR: f64 = 0.87;

/// Roof shape recognized by the sectioning model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoofType {
    Gable,
    Hip,
    Shed,
    Flat,
    Complex,
}

impl RoofType {
    pub const ALL: [RoofType; 5] = [
        RoofType::Gable,
        RoofType::Hip,
        RoofType::Shed,
        RoofType::Flat,
        RoofType::Complex,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RoofType::Gable => "gable",
            RoofType::Hip => "hip",
            RoofType::Shed => "shed",
            RoofType::Flat => "flat",
            RoofType::Complex => "complex",
        }
    }
}

impl fmt::Display for RoofType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RoofType {
    type Err = LayoutError;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().to_ascii_lowercase();
        RoofType::ALL
            .into_iter()
            .find(|roof| roof.as_str() == wanted)
            .ok_or_else(|| LayoutError::InvalidInput(format!("Unknown roof type '{}'", s)))
    }
}

/// Coarse classification of how much roof the image frame covers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ZoomLevel {
    CloseUp,
    Medium,
    Aerial,
}

impl ZoomLevel {
    /// Guesses the zoom level from the uploaded file size.
    /// Close-up shots carry more detail per frame and tend to be larger files.
    pub fn from_file_size(bytes: usize) -> Self {
        const CLOSE_UP_MIN_BYTES: usize = 2 * 1024 * 1024;
        const MEDIUM_MIN_BYTES: usize = 512 * 1024;

        if bytes >= CLOSE_UP_MIN_BYTES {
            ZoomLevel::CloseUp
        } else if bytes >= MEDIUM_MIN_BYTES {
            ZoomLevel::Medium
        } else {
            ZoomLevel::Aerial
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ZoomLevel::CloseUp => "close-up",
            ZoomLevel::Medium => "medium",
            ZoomLevel::Aerial => "aerial",
        }
    }
}

impl fmt::Display for ZoomLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ZoomLevel {
    type Err = LayoutError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "close-up" | "closeup" => Ok(ZoomLevel::CloseUp),
            "medium" => Ok(ZoomLevel::Medium),
            "aerial" => Ok(ZoomLevel::Aerial),
            _ => Err(LayoutError::InvalidInput(format!(
                "Unknown zoom level '{}'",
                s
            ))),
        }
    }
}

/// Encoding of the uploaded image
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    #[default]
    Jpeg,
    Png,
    Webp,
    Other,
}

impl ImageFormat {
    pub fn from_mime(mime: &str) -> Self {
        match mime.trim().to_ascii_lowercase().as_str() {
            "image/jpeg" | "image/jpg" => ImageFormat::Jpeg,
            "image/png" => ImageFormat::Png,
            "image/webp" => ImageFormat::Webp,
            _ => ImageFormat::Other,
        }
    }

    pub fn from_extension(ext: &str) -> Self {
        match ext.trim_start_matches('.').to_ascii_lowercase().as_str() {
            "jpg" | "jpeg" => ImageFormat::Jpeg,
            "png" => ImageFormat::Png,
            "webp" => ImageFormat::Webp,
            _ => ImageFormat::Other,
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            ImageFormat::Jpeg => "image/jpeg",
            ImageFormat::Png => "image/png",
            ImageFormat::Webp => "image/webp",
            ImageFormat::Other => "application/octet-stream",
        }
    }

    /// Fixed image-quality term used by the confidence blend.
    pub fn image_quality(&self) -> f64 {
        match self {
            ImageFormat::Webp => 0.88,
            _ => 0.92,
        }
    }
}

/// One planar face of the roof
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoofSection {
    pub name: String,
    pub orientation_label: String,
    pub tilt_degrees: f64,
    pub area_sq_ft: f64,
    pub panel_count: u32,
    pub efficiency_percent: f64,
}

/// Output of the sectioning model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoofSectioning {
    pub roof_type: RoofType,
    pub sections: Vec<RoofSection>,
    pub total_usable_area_sq_ft: f64,
    pub total_panel_count: u32,
    pub overall_efficiency_percent: u32,
}

/// Rectangle in normalized image space, top-left origin
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PanelRegion {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub roof_section_name: Option<String>,
}

impl PanelRegion {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
            roof_section_name: None,
        }
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    pub fn center(&self) -> (f64, f64) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    pub fn area(&self) -> f64 {
        self.width * self.height
    }

    /// Axis-aligned overlap test. Touching edges do not count as overlap.
    pub fn overlaps(&self, other: &PanelRegion) -> bool {
        self.x < other.right()
            && other.x < self.right()
            && self.y < other.bottom()
            && other.y < self.bottom()
    }

    pub fn center_distance(&self, other: &PanelRegion) -> f64 {
        let (ax, ay) = self.center();
        let (bx, by) = other.center();
        ((ax - bx).powi(2) + (ay - by).powi(2)).sqrt()
    }
}

/// Which path produced a result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisSource {
    Ai,
    Fallback,
}

/// Complete installation analysis handed back to the caller
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstallationResult {
    pub source: AnalysisSource,
    pub roof_type: RoofType,
    pub total_panels: u32,
    pub coverage_percent: f64,
    pub efficiency_percent: f64,
    pub confidence_percent: u32,
    pub power_output_kw: f64,
    pub estimated_roof_area_sq_ft: f64,
    pub usable_roof_area_sq_ft: f64,
    pub sections: Vec<RoofSection>,
    pub regions: Vec<PanelRegion>,
    pub notes: String,
    pub orientation_analysis: String,
    pub shading_analysis: String,
}

/// Fault vocabulary for panel inspections
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FaultType {
    #[serde(rename = "Hail Damage")]
    HailDamage,
    #[serde(rename = "Cell Damage/Cracking")]
    CellCracking,
    #[serde(rename = "Micro-crack")]
    MicroCrack,
    #[serde(rename = "Dirt/Debris")]
    DirtDebris,
    #[serde(rename = "Cell Discoloration")]
    CellDiscoloration,
    #[serde(rename = "Hot Spot")]
    HotSpot,
    #[serde(rename = "Frame Damage")]
    FrameDamage,
    Shading,
    Corrosion,
    Delamination,
}

impl FaultType {
    pub const ALL: [FaultType; 10] = [
        FaultType::HailDamage,
        FaultType::CellCracking,
        FaultType::MicroCrack,
        FaultType::DirtDebris,
        FaultType::CellDiscoloration,
        FaultType::HotSpot,
        FaultType::FrameDamage,
        FaultType::Shading,
        FaultType::Corrosion,
        FaultType::Delamination,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            FaultType::HailDamage => "Hail Damage",
            FaultType::CellCracking => "Cell Damage/Cracking",
            FaultType::MicroCrack => "Micro-crack",
            FaultType::DirtDebris => "Dirt/Debris",
            FaultType::CellDiscoloration => "Cell Discoloration",
            FaultType::HotSpot => "Hot Spot",
            FaultType::FrameDamage => "Frame Damage",
            FaultType::Shading => "Shading",
            FaultType::Corrosion => "Corrosion",
            FaultType::Delamination => "Delamination",
        }
    }
}

impl fmt::Display for FaultType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for FaultType {
    type Err = LayoutError;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim();
        FaultType::ALL
            .into_iter()
            .find(|fault| fault.label().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| LayoutError::InvalidInput(format!("Unknown fault type '{}'", s)))
    }
}

/// Fault severity, most severe first
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Severity {
    Critical,
    High,
    Medium,
    Low,
}

impl Severity {
    /// Order used by the categorical severity distributions
    pub const ALL: [Severity; 4] = [
        Severity::Critical,
        Severity::High,
        Severity::Medium,
        Severity::Low,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Critical => "Critical",
            Severity::High => "High",
            Severity::Medium => "Medium",
            Severity::Low => "Low",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Severity {
    type Err = LayoutError;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim();
        Severity::ALL
            .into_iter()
            .find(|severity| severity.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| LayoutError::InvalidInput(format!("Unknown severity '{}'", s)))
    }
}

/// Overall panel condition derived from the fault severities
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HealthRating {
    Excellent,
    Good,
    Fair,
    Poor,
    Critical,
}

impl fmt::Display for HealthRating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            HealthRating::Excellent => "Excellent",
            HealthRating::Good => "Good",
            HealthRating::Fair => "Fair",
            HealthRating::Poor => "Poor",
            HealthRating::Critical => "Critical",
        };
        f.write_str(label)
    }
}

/// Single fault marker on a panel image
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FaultAnnotation {
    #[serde(rename = "type")]
    pub fault_type: FaultType,
    pub severity: Severity,
    pub x: f64,
    pub y: f64,
    pub description: String,
}

/// Output of a fault inspection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FaultReport {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub panel_id: Option<String>,
    pub source: AnalysisSource,
    pub faults: Vec<FaultAnnotation>,
    pub overall_health: HealthRating,
    pub recommendations: Vec<String>,
}

/// Error type for layout and validation
#[derive(Debug, thiserror::Error)]
pub enum LayoutError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("All panels outside roof boundary ({offered} candidates rejected)")]
    AllPanelsRejected { offered: usize },
}

pub type Result<T> = std::result::Result<T, LayoutError>;

/// Rounds to a fixed number of decimal places.
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}
