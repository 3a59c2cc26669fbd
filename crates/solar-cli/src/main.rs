use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use colored::*;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::de::DeserializeOwned;
use serde::Serialize;
use solar_core::{
    fallback_installation, render_faults_svg, render_installation_svg, section_roof,
    synthesize_faults, FaultReport, HealthRating, InstallationResult, RegionValidator, RoofType,
    Severity, ValidationRequest, ZoomLevel,
};
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Parser)]
#[command(name = "solar")]
#[command(about = "Solar Layout Planner - Section roofs, lay out panels and inspect faults", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Split a roof into sections with panel estimates
    Sections {
        /// Roof shape (gable, hip, shed, flat, complex)
        #[arg(short, long)]
        roof_type: RoofType,

        /// Total roof area in square feet
        #[arg(short, long)]
        area: f64,

        /// Output file for result (JSON)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Plan a deterministic panel layout
    Layout {
        #[arg(short, long)]
        roof_type: RoofType,

        #[arg(short, long)]
        area: f64,

        /// Camera distance (close-up, medium, aerial)
        #[arg(short, long, default_value = "aerial")]
        zoom: ZoomLevel,

        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Validate panel regions proposed by an external source
    Validate {
        /// Validation request file (YAML or JSON)
        #[arg(short, long)]
        input: PathBuf,

        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Synthesize a fault inspection report
    Faults {
        /// Seed for a reproducible report
        #[arg(short, long)]
        seed: Option<u64>,

        #[arg(short, long)]
        panel_id: Option<String>,

        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Render an installation or fault report as an SVG overlay
    Render {
        /// Result file (JSON or YAML)
        #[arg(short, long)]
        input: PathBuf,

        /// Output SVG file
        #[arg(short, long)]
        output: PathBuf,

        #[arg(short, long, value_enum, default_value_t = ReportKind::Installation)]
        kind: ReportKind,

        /// Width of the underlying image in pixels
        #[arg(long, default_value_t = 1024.0)]
        width: f64,

        /// Height of the underlying image in pixels
        #[arg(long, default_value_t = 768.0)]
        height: f64,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum ReportKind {
    Installation,
    Faults,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Sections {
            roof_type,
            area,
            output,
        } => sections_command(roof_type, area, output)?,
        Commands::Layout {
            roof_type,
            area,
            zoom,
            output,
        } => layout_command(roof_type, area, zoom, output)?,
        Commands::Validate { input, output } => validate_command(input, output)?,
        Commands::Faults {
            seed,
            panel_id,
            output,
        } => faults_command(seed, panel_id, output)?,
        Commands::Render {
            input,
            output,
            kind,
            width,
            height,
        } => render_command(input, output, kind, width, height)?,
    }

    Ok(())
}

fn sections_command(roof_type: RoofType, area: f64, output: Option<PathBuf>) -> Result<()> {
    println!(
        "{}",
        format!("📐 Sectioning {} roof ({} sq ft)...", roof_type, area).bright_blue()
    );

    let sectioning = section_roof(roof_type, area)?;

    println!();
    println!("{}", "📊 Sections:".bright_yellow().bold());
    for section in &sectioning.sections {
        println!(
            "  • {} ({}, {:.0}°): {} sq ft, {} panels, {:.0}% efficiency",
            section.name.bright_white(),
            section.orientation_label,
            section.tilt_degrees,
            section.area_sq_ft,
            section.panel_count.to_string().bright_white().bold(),
            section.efficiency_percent
        );
    }
    println!();
    println!(
        "  Usable area: {} sq ft",
        sectioning.total_usable_area_sq_ft.to_string().bright_white()
    );
    println!(
        "  Total panels: {}",
        sectioning.total_panel_count.to_string().bright_white().bold()
    );
    println!(
        "  Overall efficiency: {}%",
        sectioning.overall_efficiency_percent.to_string().bright_white()
    );
    println!();

    write_json(&sectioning, output)
}

fn layout_command(
    roof_type: RoofType,
    area: f64,
    zoom: ZoomLevel,
    output: Option<PathBuf>,
) -> Result<()> {
    println!(
        "{}",
        format!("🚀 Planning {} layout for a {} roof...", zoom, roof_type).bright_blue()
    );

    let result = fallback_installation(roof_type, area, zoom)?;

    println!();
    println!("{}", "✅ Layout complete!".bright_green().bold());
    println!();
    print_installation(&result);
    println!();

    write_json(&result, output)
}

fn validate_command(input: PathBuf, output: Option<PathBuf>) -> Result<()> {
    println!("{}", "🔍 Loading candidate regions...".bright_blue());

    let request: ValidationRequest = read_input(&input)?;
    println!(
        "  {} candidates to check",
        request.candidates.len().to_string().bright_white().bold()
    );
    println!();

    let validated = RegionValidator::new(request.image_format).validate(
        &request.candidates,
        request.declared_coverage,
        request.declared_total_panels,
    )?;

    println!("{}", "📊 Results:".bright_yellow().bold());
    println!(
        "  Accepted: {} of {}",
        validated.total_panels.to_string().bright_green().bold(),
        request.candidates.len()
    );
    println!(
        "  Power output: {} kW",
        validated.power_output_kw.to_string().bright_white()
    );
    println!(
        "  Confidence: {}%",
        validated.confidence_percent.to_string().bright_white()
    );

    if !validated.rejections.is_empty() {
        println!();
        println!("  Rejected candidates:");
        for rejection in &validated.rejections {
            let reasons: Vec<String> = rejection.reasons.iter().map(|r| r.to_string()).collect();
            let stage = if rejection.after_normalization {
                " (after resizing)"
            } else {
                ""
            };
            println!(
                "    • #{}: {}{}",
                rejection.index,
                reasons.join(", ").bright_red(),
                stage
            );
        }
    }
    println!();

    write_json(&validated, output)
}

fn faults_command(
    seed: Option<u64>,
    panel_id: Option<String>,
    output: Option<PathBuf>,
) -> Result<()> {
    println!("{}", "🔎 Synthesizing inspection report...".bright_blue());

    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let report = synthesize_faults(&mut rng, panel_id.as_deref());

    println!();
    println!(
        "{} {}",
        "🩺 Overall health:".bright_yellow().bold(),
        health_label(report.overall_health)
    );
    if report.faults.is_empty() {
        println!("  No faults found");
    }
    for fault in &report.faults {
        println!(
            "  • {} [{}] at ({:.3}, {:.3}): {}",
            fault.fault_type.label().bright_white(),
            severity_label(fault.severity),
            fault.x,
            fault.y,
            fault.description
        );
    }
    println!();
    println!("  Recommendations:");
    for line in &report.recommendations {
        println!("    • {}", line.bright_cyan());
    }
    println!();

    write_json(&report, output)
}

fn render_command(
    input: PathBuf,
    output: PathBuf,
    kind: ReportKind,
    width: f64,
    height: f64,
) -> Result<()> {
    println!("{}", "🔍 Loading result...".bright_blue());

    let svg = match kind {
        ReportKind::Installation => {
            let result: InstallationResult = read_input(&input)?;
            println!("{}", "🎨 Drawing panel regions...".bright_blue());
            render_installation_svg(&result, width, height)?
        }
        ReportKind::Faults => {
            let report: FaultReport = read_input(&input)?;
            println!("{}", "🎨 Drawing fault markers...".bright_blue());
            render_faults_svg(&report, width, height)?
        }
    };

    std::fs::write(&output, svg)
        .with_context(|| format!("Failed to write {}", output.display()))?;

    println!();
    println!(
        "{} Saved SVG to {}",
        "✅".bright_green(),
        output.display().to_string().bright_white()
    );

    Ok(())
}

fn print_installation(result: &InstallationResult) {
    println!("{}", "📊 Results:".bright_yellow().bold());
    println!(
        "  Panels placed: {}",
        result.total_panels.to_string().bright_white().bold()
    );
    println!(
        "  Power output: {} kW",
        result.power_output_kw.to_string().bright_white()
    );
    println!("  Coverage: {:.1}%", result.coverage_percent);
    println!("  Efficiency: {:.0}%", result.efficiency_percent);
    println!("  Confidence: {}%", result.confidence_percent);
    println!(
        "  Usable area: {} of {} sq ft",
        result.usable_roof_area_sq_ft, result.estimated_roof_area_sq_ft
    );
    println!();
    println!("  {}", result.orientation_analysis.dimmed());
}

fn severity_label(severity: Severity) -> ColoredString {
    match severity {
        Severity::Critical => severity.as_str().bright_red().bold(),
        Severity::High => severity.as_str().red(),
        Severity::Medium => severity.as_str().yellow(),
        Severity::Low => severity.as_str().green(),
    }
}

fn health_label(health: HealthRating) -> ColoredString {
    let label = health.to_string();
    match health {
        HealthRating::Excellent | HealthRating::Good => label.bright_green().bold(),
        HealthRating::Fair => label.yellow().bold(),
        HealthRating::Poor | HealthRating::Critical => label.bright_red().bold(),
    }
}

/// Reads YAML for `.yaml`/`.yml` files, JSON otherwise.
fn read_input<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let is_yaml = matches!(
        path.extension().and_then(|s| s.to_str()),
        Some("yaml") | Some("yml")
    );

    debug!(
        "Parsing {} as {}",
        path.display(),
        if is_yaml { "YAML" } else { "JSON" }
    );
    let value = if is_yaml {
        serde_yaml::from_str(&content)?
    } else {
        serde_json::from_str(&content)?
    };
    Ok(value)
}

fn write_json<T: Serialize>(value: &T, output: Option<PathBuf>) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;

    if let Some(output_path) = output {
        std::fs::write(&output_path, json)?;
        println!(
            "💾 Saved result to {}",
            output_path.display().to_string().bright_white()
        );
    } else {
        println!("{}", json);
    }

    Ok(())
}
