//! SVG overlays drawn in image space.
//!
//! Regions and fault positions are normalized, so the caller passes the pixel
//! size of the image the overlay will sit on.

use crate::types::*;
use std::fmt::{self, Write};

const SECTION_COLORS: [&str; 5] = ["#1E88E5", "#43A047", "#FB8C00", "#8E24AA", "#00ACC1"];

/// Stroke color used for a fault marker
pub fn severity_color(severity: Severity) -> &'static str {
    match severity {
        Severity::Critical => "#D32F2F",
        Severity::High => "#F57C00",
        Severity::Medium => "#FBC02D",
        Severity::Low => "#388E3C",
    }
}

/// Draws every panel region as a rectangle, colored by roof section.
pub fn render_installation_svg(result: &InstallationResult, width: f64, height: f64) -> Result<String> {
    check_canvas(width, height)?;
    draw_installation(result, width, height).map_err(render_failed)
}

/// Draws a marker for each fault with a numbered label.
pub fn render_faults_svg(report: &FaultReport, width: f64, height: f64) -> Result<String> {
    check_canvas(width, height)?;
    draw_faults(report, width, height).map_err(render_failed)
}

fn check_canvas(width: f64, height: f64) -> Result<()> {
    if !(width.is_finite() && height.is_finite() && width > 0.0 && height > 0.0) {
        return Err(LayoutError::InvalidInput(format!(
            "Canvas must have positive dimensions, got {}x{}",
            width, height
        )));
    }
    Ok(())
}

fn render_failed(err: fmt::Error) -> LayoutError {
    LayoutError::InvalidInput(format!("Failed to render SVG: {}", err))
}

fn open_svg(svg: &mut String, width: f64, height: f64) -> fmt::Result {
    writeln!(svg, r#"<?xml version="1.0" encoding="UTF-8"?>"#)?;
    writeln!(
        svg,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{}" height="{}" viewBox="0 0 {} {}">"#,
        width, height, width, height
    )
}

fn draw_installation(
    result: &InstallationResult,
    width: f64,
    height: f64,
) -> std::result::Result<String, fmt::Error> {
    let mut svg = String::new();
    open_svg(&mut svg, width, height)?;

    for (index, region) in result.regions.iter().enumerate() {
        let color = section_color(result, region);
        writeln!(
            &mut svg,
            r##"  <rect x="{:.1}" y="{:.1}" width="{:.1}" height="{:.1}" fill="{}" fill-opacity="0.45" stroke="{}" stroke-width="1.5"><title>Panel {}{}</title></rect>"##,
            region.x * width,
            region.y * height,
            region.width * width,
            region.height * height,
            color,
            color,
            index + 1,
            region
                .roof_section_name
                .as_deref()
                .map(|name| format!(" ({})", escape(name)))
                .unwrap_or_default()
        )?;
    }

    writeln!(
        &mut svg,
        r##"  <text x="10" y="{:.1}" font-family="Arial" font-size="14" fill="#FFFFFF" stroke="#000000" stroke-width="0.4">{} panels | {:.2} kW | {}% confidence</text>"##,
        height - 10.0,
        result.total_panels,
        result.power_output_kw,
        result.confidence_percent
    )?;
    writeln!(&mut svg, "</svg>")?;

    Ok(svg)
}

fn draw_faults(
    report: &FaultReport,
    width: f64,
    height: f64,
) -> std::result::Result<String, fmt::Error> {
    let mut svg = String::new();
    open_svg(&mut svg, width, height)?;

    let radius = (width.min(height) * 0.03).max(4.0);
    for (index, fault) in report.faults.iter().enumerate() {
        let cx = fault.x * width;
        let cy = fault.y * height;
        let color = severity_color(fault.severity);

        writeln!(
            &mut svg,
            r##"  <circle cx="{:.1}" cy="{:.1}" r="{:.1}" fill="none" stroke="{}" stroke-width="3"><title>{} ({}): {}</title></circle>"##,
            cx,
            cy,
            radius,
            color,
            escape(fault.fault_type.label()),
            fault.severity,
            escape(&fault.description)
        )?;
        writeln!(
            &mut svg,
            r##"  <text x="{:.1}" y="{:.1}" font-family="Arial" font-size="12" fill="{}" text-anchor="middle">{}</text>"##,
            cx,
            cy - radius - 4.0,
            color,
            index + 1
        )?;
    }

    writeln!(
        &mut svg,
        r##"  <text x="10" y="{:.1}" font-family="Arial" font-size="14" fill="#FFFFFF" stroke="#000000" stroke-width="0.4">Health: {} | {} faults</text>"##,
        height - 10.0,
        report.overall_health,
        report.faults.len()
    )?;
    writeln!(&mut svg, "</svg>")?;

    Ok(svg)
}

fn section_color(result: &InstallationResult, region: &PanelRegion) -> &'static str {
    let index = region
        .roof_section_name
        .as_deref()
        .and_then(|name| result.sections.iter().position(|s| s.name == name))
        .unwrap_or(0);
    SECTION_COLORS[index % SECTION_COLORS.len()]
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::faults::assess_faults;
    use crate::installation::fallback_installation;

    #[test]
    fn test_installation_overlay_has_one_rect_per_region() {
        let result = fallback_installation(RoofType::Gable, 1800.0, ZoomLevel::Aerial).unwrap();
        let svg = render_installation_svg(&result, 1000.0, 800.0).unwrap();

        assert!(svg.starts_with("<?xml"));
        assert!(svg.trim_end().ends_with("</svg>"));
        assert_eq!(svg.matches("<rect").count(), result.regions.len());
        assert!(svg.contains(&format!("{} panels", result.total_panels)));
    }

    #[test]
    fn test_region_scaled_to_canvas() {
        let mut result = fallback_installation(RoofType::Shed, 0.0, ZoomLevel::Aerial).unwrap();
        result.regions = vec![PanelRegion::new(0.25, 0.5, 0.1, 0.05)];
        let svg = render_installation_svg(&result, 200.0, 100.0).unwrap();

        assert!(svg.contains(r#"x="50.0" y="50.0" width="20.0" height="5.0""#));
    }

    #[test]
    fn test_fault_overlay_colors_by_severity() {
        let faults = vec![
            FaultAnnotation {
                fault_type: FaultType::HotSpot,
                severity: Severity::Critical,
                x: 0.5,
                y: 0.5,
                description: "Scorched <cell>".to_string(),
            },
            FaultAnnotation {
                fault_type: FaultType::DirtDebris,
                severity: Severity::Low,
                x: 0.2,
                y: 0.8,
                description: "Leaves".to_string(),
            },
        ];
        let report = assess_faults(faults, None, AnalysisSource::Ai);
        let svg = render_faults_svg(&report, 400.0, 400.0).unwrap();

        assert_eq!(svg.matches("<circle").count(), 2);
        assert!(svg.contains(severity_color(Severity::Critical)));
        assert!(svg.contains(severity_color(Severity::Low)));
        assert!(svg.contains("Scorched &lt;cell&gt;"));
        assert!(svg.contains("Health: Critical"));
    }

    #[test]
    fn test_healthy_report_renders_caption_only() {
        let report = assess_faults(Vec::new(), Some("P-1"), AnalysisSource::Ai);
        let svg = render_faults_svg(&report, 640.0, 480.0).unwrap();

        assert!(svg.starts_with("<?xml"));
        assert!(svg.contains(r#"viewBox="0 0 640 480""#));
        assert_eq!(svg.matches("<circle").count(), 0);
        assert!(svg.contains("Health: Excellent | 0 faults"));
        assert!(svg.trim_end().ends_with("</svg>"));
    }

    #[test]
    fn test_rejects_empty_canvas() {
        let report = assess_faults(Vec::new(), None, AnalysisSource::Fallback);
        assert!(render_faults_svg(&report, 0.0, 100.0).is_err());
        assert!(render_faults_svg(&report, f64::NAN, 100.0).is_err());
    }
}
