use super::*;

fn grid(cols: usize, rows: usize) -> Vec<PanelRegion> {
    let mut regions = Vec::new();
    for r in 0..rows {
        for c in 0..cols {
            regions.push(PanelRegion::new(
                0.1 + c as f64 * 0.1,
                0.2 + r as f64 * 0.09,
                0.08,
                0.06,
            ));
        }
    }
    regions
}

fn validate(candidates: &[PanelRegion]) -> Result<ValidatedRegions> {
    RegionValidator::new(ImageFormat::Jpeg).validate(candidates, 60.0, candidates.len() as u32)
}

#[test]
fn test_clean_grid_is_fully_accepted() {
    let candidates = grid(5, 4);
    let result = validate(&candidates).unwrap();

    assert_eq!(result.total_panels, 20);
    assert_eq!(result.regions.len(), 20);
    assert_eq!(result.power_output_kw, 8.5);
    assert!(result.rejections.is_empty());
    // 0.23 + 0.35 + 0.15 + 0.096 + 0.076
    assert_eq!(result.confidence_percent, 90);
}

#[test]
fn test_webp_uses_lower_image_quality() {
    let candidates = grid(5, 4);
    let result = RegionValidator::new(ImageFormat::Webp)
        .validate(&candidates, 60.0, 20)
        .unwrap();

    assert_eq!(result.confidence_percent, 89);
}

#[test]
fn test_single_oversized_candidate_rejects_all() {
    let candidates = vec![PanelRegion::new(0.5, 0.5, 0.3, 0.3)];

    match validate(&candidates) {
        Err(LayoutError::AllPanelsRejected { offered }) => assert_eq!(offered, 1),
        other => panic!("expected all-rejected error, got {:?}", other),
    }
}

#[test]
fn test_oversized_candidate_dropped_among_valid_ones() {
    let mut candidates = grid(2, 1);
    candidates.push(PanelRegion::new(0.5, 0.5, 0.3, 0.3));
    let result = validate(&candidates).unwrap();

    assert_eq!(result.total_panels, 2);
    assert_eq!(result.rejections.len(), 1);
    assert_eq!(result.rejections[0].index, 2);
    assert!(result.rejections[0].reasons.contains(&RejectReason::Size));
}

#[test]
fn test_close_centers_fail_spacing() {
    let candidates = vec![
        PanelRegion::new(0.30, 0.30, 0.08, 0.06),
        PanelRegion::new(0.31, 0.30, 0.08, 0.06),
    ];
    let result = validate(&candidates).unwrap();

    assert_eq!(result.total_panels, 1);
    let reasons = &result.rejections[0].reasons;
    assert!(reasons.contains(&RejectReason::Spacing));
    assert!(reasons.contains(&RejectReason::Overlap));
}

#[test]
fn test_bounds_and_center_checks() {
    let candidates = vec![
        PanelRegion::new(0.30, 0.30, 0.08, 0.06),
        // left of the 0.05 margin, center still inside
        PanelRegion::new(0.045, 0.40, 0.12, 0.06),
        // inside bounds, but center y = 0.115
        PanelRegion::new(0.60, 0.10, 0.08, 0.03),
        // past the bottom margin
        PanelRegion::new(0.60, 0.85, 0.08, 0.06),
    ];
    let result = validate(&candidates).unwrap();

    assert_eq!(result.total_panels, 1);
    assert_eq!(result.rejections[0].reasons, vec![RejectReason::Bounds]);
    assert_eq!(
        result.rejections[1].reasons,
        vec![RejectReason::CenterOutOfBounds]
    );
    assert!(result.rejections[2].reasons.contains(&RejectReason::Bounds));
}

#[test]
fn test_non_finite_candidate_rejected() {
    let candidates = vec![
        PanelRegion::new(f64::NAN, 0.3, 0.08, 0.06),
        PanelRegion::new(0.3, 0.3, 0.08, 0.06),
    ];
    let result = validate(&candidates).unwrap();

    assert_eq!(result.total_panels, 1);
    assert_eq!(result.regions[0].x, 0.3);
}

#[test]
fn test_sizes_normalized_to_first_accepted() {
    let candidates = vec![
        PanelRegion::new(0.20, 0.20, 0.10, 0.07),
        PanelRegion::new(0.50, 0.20, 0.05, 0.04),
        PanelRegion::new(0.20, 0.50, 0.06, 0.05),
    ];
    let result = validate(&candidates).unwrap();

    assert_eq!(result.total_panels, 3);
    assert!(result
        .regions
        .iter()
        .all(|r| r.width == 0.10 && r.height == 0.07));
}

#[test]
fn test_region_conflicting_after_normalization_is_dropped() {
    let candidates = vec![
        PanelRegion::new(0.10, 0.20, 0.12, 0.08),
        PanelRegion::new(0.23, 0.21, 0.04, 0.03),
        PanelRegion::new(0.28, 0.21, 0.04, 0.03),
    ];
    let result = validate(&candidates).unwrap();

    assert_eq!(result.total_panels, 2);
    assert_eq!(result.power_output_kw, 0.85);
    let dropped = &result.rejections[0];
    assert_eq!(dropped.index, 2);
    assert!(dropped.after_normalization);
    assert!(dropped.reasons.contains(&RejectReason::Overlap));

    for (i, a) in result.regions.iter().enumerate() {
        for b in &result.regions[i + 1..] {
            assert!(!a.overlaps(b));
            assert!(a.center_distance(b) >= MIN_CENTER_SPACING);
        }
    }
}

#[test]
fn test_empty_candidates_is_empty_success() {
    let result = validate(&[]).unwrap();

    assert_eq!(result.total_panels, 0);
    assert_eq!(result.power_output_kw, 0.0);
    assert_eq!(result.confidence_percent, 85);
}

#[test]
fn test_power_output_tracks_accepted_count() {
    for cols in 1..=8 {
        let result = validate(&grid(cols, 3)).unwrap();
        let expected = round_to(result.total_panels as f64 * PANEL_POWER_KW, 2);
        assert_eq!(result.power_output_kw, expected);
        assert!((85..=96).contains(&result.confidence_percent));
    }
}

#[test]
fn test_section_names_survive_validation() {
    let mut candidates = grid(2, 1);
    candidates[1].roof_section_name = Some("West Wing".to_string());
    let result = validate(&candidates).unwrap();

    assert_eq!(result.regions[0].roof_section_name, None);
    assert_eq!(
        result.regions[1].roof_section_name.as_deref(),
        Some("West Wing")
    );
}

#[test]
fn test_request_wrapper_reads_image_format() {
    let request = ValidationRequest {
        candidates: grid(5, 4),
        declared_coverage: 60.0,
        declared_total_panels: 18,
        image_format: ImageFormat::Webp,
    };
    let result = validate_external_regions(&request).unwrap();

    assert_eq!(result.confidence_percent, 89);
}

#[test]
fn test_declared_count_is_reported_next_to_kept_count() {
    let mut candidates = grid(2, 1);
    candidates.push(candidates[0].clone());
    let result = RegionValidator::new(ImageFormat::Png)
        .validate(&candidates, 30.0, 5)
        .unwrap();

    assert_eq!(result.declared_total_panels, 5);
    assert_eq!(result.total_panels, 2);
    assert_eq!(result.rejections.len(), 1);
    assert_eq!(result.rejections[0].index, 2);
}
