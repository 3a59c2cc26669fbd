use super::*;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::cell::RefCell;
use std::collections::VecDeque;

/// Replays scripted replies in order and records every prompt.
struct ScriptedModel {
    replies: RefCell<VecDeque<std::result::Result<String, VisionError>>>,
    prompts: RefCell<Vec<String>>,
}

impl ScriptedModel {
    fn new(replies: Vec<std::result::Result<&str, VisionError>>) -> Self {
        Self {
            replies: RefCell::new(
                replies
                    .into_iter()
                    .map(|r| r.map(String::from))
                    .collect(),
            ),
            prompts: RefCell::new(Vec::new()),
        }
    }

    fn calls(&self) -> usize {
        self.prompts.borrow().len()
    }
}

impl VisionModel for ScriptedModel {
    fn describe_image(
        &self,
        _image: &ImageInput,
        prompt: &str,
    ) -> std::result::Result<String, VisionError> {
        self.prompts.borrow_mut().push(prompt.to_string());
        self.replies
            .borrow_mut()
            .pop_front()
            .unwrap_or_else(|| Err(VisionError::Unavailable("script exhausted".into())))
    }
}

fn analyzer() -> Analyzer {
    Analyzer::new(AnalysisConfig {
        retry: RetryPolicy {
            max_attempts: 3,
            backoff_unit_ms: 0,
        },
        ..AnalysisConfig::default()
    })
}

fn small_jpeg() -> ImageInput {
    ImageInput::new(vec![0u8; 1024], ImageFormat::Jpeg)
}

const GOOD_PLAN: &str = r#"Here is the layout:
```json
{
  "roofType": "hip",
  "estimatedRoofAreaSqFt": 2200,
  "usableRoofAreaSqFt": 1500,
  "coveragePercent": 72,
  "efficiencyPercent": 91,
  "totalPanels": 5,
  "panelRegions": [
    {"x": 0.20, "y": 0.30, "width": 0.08, "height": 0.06, "roofSection": "South Hip Face"},
    {"x": 0.30, "y": 0.30, "width": 0.08, "height": 0.06},
    {"x": 0.40, "y": 0.30, "width": 0.08, "height": 0.06},
    {"x": 0.41, "y": 0.30, "width": 0.08, "height": 0.06},
    {"x": 0.50, "y": 0.30, "width": 0.30, "height": 0.06}
  ],
  "notes": "Clear south face",
  "orientationAnalysis": "",
  "shadingAnalysis": "Chimney shades the north-east corner"
}
```"#;

#[test]
fn test_model_layout_is_validated() {
    let model = ScriptedModel::new(vec![Ok("Yes."), Ok(GOOD_PLAN)]);
    let result = analyzer()
        .analyze_installation(&model, &small_jpeg(), &RoofOverrides::default())
        .unwrap();

    assert_eq!(result.source, AnalysisSource::Ai);
    assert_eq!(result.roof_type, RoofType::Hip);
    assert_eq!(result.total_panels, 3);
    assert_eq!(result.regions.len(), 3);
    assert_eq!(result.power_output_kw, 1.27);
    assert!((85..=96).contains(&result.confidence_percent));
    assert_eq!(result.coverage_percent, 72.0);
    assert_eq!(result.usable_roof_area_sq_ft, 1500.0);
    assert_eq!(result.notes, "Clear south face");
    assert!(result.orientation_analysis.contains("South Hip Face"));
    assert_eq!(result.sections.len(), 4);
    assert_eq!(
        result.regions[0].roof_section_name.as_deref(),
        Some("South Hip Face")
    );
}

#[test]
fn test_overrides_win_over_model_estimates() {
    let model = ScriptedModel::new(vec![Ok("yes"), Ok(GOOD_PLAN)]);
    let overrides = RoofOverrides {
        roof_type: Some(RoofType::Flat),
        total_area_sq_ft: Some(1200.0),
    };
    let result = analyzer()
        .analyze_installation(&model, &small_jpeg(), &overrides)
        .unwrap();

    assert_eq!(result.source, AnalysisSource::Ai);
    assert_eq!(result.roof_type, RoofType::Flat);
    assert_eq!(result.estimated_roof_area_sq_ft, 1200.0);
    assert_eq!(result.usable_roof_area_sq_ft, 1200.0);
}

#[test]
fn test_non_rooftop_image_uses_fallback() {
    let model = ScriptedModel::new(vec![Ok("No, this is a cat.")]);
    let result = analyzer()
        .analyze_installation(&model, &small_jpeg(), &RoofOverrides::default())
        .unwrap();

    assert_eq!(result.source, AnalysisSource::Fallback);
    assert_eq!(result.roof_type, RoofType::Gable);
    assert_eq!(result.estimated_roof_area_sq_ft, 1500.0);
    assert_eq!(model.calls(), 1);
}

#[test]
fn test_all_regions_rejected_uses_fallback() {
    let plan = r#"{"roofType": "shed", "panelRegions": [{"x": 0.5, "y": 0.5, "width": 0.3, "height": 0.3}]}"#;
    let model = ScriptedModel::new(vec![Ok("yes"), Ok(plan)]);
    let overrides = RoofOverrides {
        roof_type: Some(RoofType::Shed),
        total_area_sq_ft: Some(1000.0),
    };
    let result = analyzer()
        .analyze_installation(&model, &small_jpeg(), &overrides)
        .unwrap();

    assert_eq!(result.source, AnalysisSource::Fallback);
    assert_eq!(result.total_panels, 38);
    assert_eq!(result.power_output_kw, 14.05);
}

#[test]
fn test_malformed_plan_uses_fallback() {
    for reply in ["I cannot help with that", r#"{"roofType": "dome", "panelRegions": [{"x": 0.2, "y": 0.3, "width": 0.08, "height": 0.06}]}"#, r#"{"roofType": "gable", "panelRegions": []}"#] {
        let model = ScriptedModel::new(vec![Ok("yes"), Ok(reply)]);
        let result = analyzer()
            .analyze_installation(&model, &small_jpeg(), &RoofOverrides::default())
            .unwrap();
        assert_eq!(result.source, AnalysisSource::Fallback, "reply {:?}", reply);
    }
}

#[test]
fn test_overloaded_model_is_retried() {
    let model = ScriptedModel::new(vec![
        Err(VisionError::Overloaded("503".into())),
        Ok("yes"),
        Err(VisionError::Overloaded("503".into())),
        Err(VisionError::Overloaded("503".into())),
        Ok(GOOD_PLAN),
    ]);
    let result = analyzer()
        .analyze_installation(&model, &small_jpeg(), &RoofOverrides::default())
        .unwrap();

    assert_eq!(result.source, AnalysisSource::Ai);
    assert_eq!(model.calls(), 5);
}

#[test]
fn test_exhausted_retries_fall_back() {
    let model = ScriptedModel::new(vec![
        Ok("yes"),
        Err(VisionError::Overloaded("503".into())),
        Err(VisionError::Overloaded("503".into())),
        Err(VisionError::Overloaded("503".into())),
    ]);
    let result = analyzer()
        .analyze_installation(&model, &small_jpeg(), &RoofOverrides::default())
        .unwrap();

    assert_eq!(result.source, AnalysisSource::Fallback);
    assert_eq!(model.calls(), 4);
}

#[test]
fn test_unavailable_model_uses_fallback_with_zoom_from_size() {
    let image = ImageInput::new(vec![0u8; 3 * 1024 * 1024], ImageFormat::Png);
    let overrides = RoofOverrides {
        roof_type: Some(RoofType::Shed),
        total_area_sq_ft: Some(1000.0),
    };
    let result = analyzer()
        .analyze_installation(&UnavailableModel, &image, &overrides)
        .unwrap();

    assert_eq!(result.source, AnalysisSource::Fallback);
    // Close-up panels on a small roof
    assert!(result.regions.iter().all(|r| r.width == 0.12));
}

#[test]
fn test_invalid_area_override_is_rejected() {
    let overrides = RoofOverrides {
        roof_type: None,
        total_area_sq_ft: Some(-10.0),
    };
    let result = analyzer().analyze_installation(&UnavailableModel, &small_jpeg(), &overrides);

    assert!(matches!(result, Err(LayoutError::InvalidInput(_))));
}

#[test]
fn test_model_faults_are_parsed_and_assessed() {
    let reply = r#"{"faults": [
        {"type": "Hot Spot", "severity": "High", "x": 0.4, "y": 0.5, "description": "Warm cell"},
        {"type": "dirt/debris", "severity": "low", "x": 0.2, "y": 0.7},
        {"type": "Snail Trail", "severity": "Medium", "x": 0.3, "y": 0.3},
        {"type": "Corrosion", "severity": "Medium", "x": 1.4, "y": 0.3}
    ]}"#;
    let model = ScriptedModel::new(vec![Ok("yes"), Ok(reply)]);
    let mut rng = StdRng::seed_from_u64(1);
    let report = analyzer().analyze_faults(&model, &small_jpeg(), Some("P-12"), &mut rng);

    assert_eq!(report.source, AnalysisSource::Ai);
    assert_eq!(report.faults.len(), 2);
    assert_eq!(report.faults[0].description, "Warm cell");
    assert_eq!(
        report.faults[1].description,
        crate::faults::describe(FaultType::DirtDebris, Severity::Low)
    );
    assert_eq!(report.overall_health, HealthRating::Fair);
    assert_eq!(report.panel_id.as_deref(), Some("P-12"));
}

#[test]
fn test_healthy_model_report_is_excellent() {
    let model = ScriptedModel::new(vec![Ok("yes"), Ok(r#"{"faults": []}"#)]);
    let mut rng = StdRng::seed_from_u64(1);
    let report = analyzer().analyze_faults(&model, &small_jpeg(), None, &mut rng);

    assert_eq!(report.source, AnalysisSource::Ai);
    assert_eq!(report.overall_health, HealthRating::Excellent);
}

#[test]
fn test_fault_fallback_is_reproducible() {
    let image = small_jpeg();
    let a = analyzer().analyze_faults(
        &UnavailableModel,
        &image,
        None,
        &mut StdRng::seed_from_u64(99),
    );
    let b = analyzer().analyze_faults(
        &UnavailableModel,
        &image,
        None,
        &mut StdRng::seed_from_u64(99),
    );

    assert_eq!(a.source, AnalysisSource::Fallback);
    assert_eq!(a.faults, b.faults);
}

#[test]
fn test_model_panel_total_is_parsed() {
    let plan = parse_installation(GOOD_PLAN).unwrap();
    assert_eq!(plan.total_panels, Some(5.0));
    assert_eq!(plan.panel_regions.len(), 5);

    let plan = parse_installation(r#"{"totalPanels": 24.0, "panelRegions": []}"#).unwrap();
    assert_eq!(plan.total_panels, Some(24.0));
}

#[test]
fn test_declared_count_falls_back_to_region_count() {
    assert_eq!(declared_panel_count(Some(24.0), 3), 24);
    assert_eq!(declared_panel_count(Some(11.6), 3), 12);
    assert_eq!(declared_panel_count(None, 3), 3);
    assert_eq!(declared_panel_count(Some(-4.0), 3), 3);
    assert_eq!(declared_panel_count(Some(f64::NAN), 3), 3);
}

#[test]
fn test_yes_no_parsing() {
    assert_eq!(parse_yes_no("Yes"), Some(true));
    assert_eq!(parse_yes_no("**yes**, it is"), Some(true));
    assert_eq!(parse_yes_no(" no."), Some(false));
    assert_eq!(parse_yes_no("Maybe"), None);
    assert_eq!(parse_yes_no("nothing"), None);
}

#[test]
fn test_extract_json_from_fenced_reply() {
    assert_eq!(
        extract_json("```json\n{\"a\": 1}\n```"),
        Some("{\"a\": 1}")
    );
    assert_eq!(extract_json("no braces"), None);
}
