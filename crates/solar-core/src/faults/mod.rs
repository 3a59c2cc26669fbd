use crate::types::*;
use rand::Rng;
use tracing::debug;

mod catalog;

pub use catalog::{describe, overall_health, recommendations, FaultTemplate, FAULT_TEMPLATES};

const POSITION_MIN: f64 = 0.1;
const POSITION_MAX: f64 = 0.9;

/// Draws a plausible fault set for a panel when no model output is available.
///
/// Each template fires independently with its occurrence probability; a fired
/// fault gets a severity from the template's distribution and a uniform position.
pub fn synthesize_faults<R: Rng>(rng: &mut R, panel_id: Option<&str>) -> FaultReport {
    let mut faults = Vec::new();

    for template in &FAULT_TEMPLATES {
        if !rng.gen_bool(template.occurrence_probability) {
            continue;
        }

        let severity = sample_severity(&template.severity_distribution, rng.gen::<f64>());
        let x = round_to(rng.gen_range(POSITION_MIN..=POSITION_MAX), 3);
        let y = round_to(rng.gen_range(POSITION_MIN..=POSITION_MAX), 3);

        faults.push(FaultAnnotation {
            fault_type: template.fault_type,
            severity,
            x,
            y,
            description: describe(template.fault_type, severity),
        });
    }

    debug!("Synthesized {} faults", faults.len());
    assess_faults(faults, panel_id, AnalysisSource::Fallback)
}

/// Builds a report, deriving health and recommendations from the faults.
pub fn assess_faults(
    faults: Vec<FaultAnnotation>,
    panel_id: Option<&str>,
    source: AnalysisSource,
) -> FaultReport {
    let severities: Vec<Severity> = faults.iter().map(|f| f.severity).collect();
    let overall_health = overall_health(&severities);
    let recommendations = recommendations(worst_severity(&severities));

    FaultReport {
        panel_id: panel_id.map(str::to_string),
        source,
        faults,
        overall_health,
        recommendations,
    }
}

/// Most severe entry; `Severity` orders Critical first.
pub fn worst_severity(severities: &[Severity]) -> Option<Severity> {
    severities.iter().min().copied()
}

/// Cumulative-probability pick from a `[Critical, High, Medium, Low]` distribution.
fn sample_severity(distribution: &[f64; 4], draw: f64) -> Severity {
    let mut cumulative = 0.0;
    for (severity, probability) in Severity::ALL.iter().zip(distribution) {
        cumulative += probability;
        if draw < cumulative {
            return *severity;
        }
    }
    // Float rounding can leave the cumulative sum a hair under 1.0.
    Severity::Low
}
