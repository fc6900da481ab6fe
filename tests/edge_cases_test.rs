//! Edge case and boundary condition tests for ROI evaluation.

use roi_eval::config::EvaluationConfig;
use roi_eval::evaluator::evaluate;
use roi_eval::matching::best_area_match;
use roi_eval::metrics::Statistics;
use roi_eval::types::{PixelRect, Roi, RoiIndex};

fn create_roi(class: &str, rect: (i64, i64, i64, i64)) -> Roi {
    Roi::new(class, PixelRect::new(rect.0, rect.1, rect.2, rect.3))
}

fn create_detection(class: &str, rect: (i64, i64, i64, i64)) -> Roi {
    Roi::detected(class, PixelRect::new(rect.0, rect.1, rect.2, rect.3), 0.9)
}

fn index(entries: Vec<(&str, Vec<Roi>)>) -> RoiIndex {
    entries
        .into_iter()
        .map(|(file, rois)| (file.to_string(), rois))
        .collect()
}

fn config(min_size: u32) -> EvaluationConfig {
    EvaluationConfig {
        min_size,
        ..EvaluationConfig::default()
    }
}

// ============================================================================
// MATCHING EDGE CASES
// ============================================================================

#[test]
fn test_tied_overlap_keeps_first_actual() {
    let expected = create_roi("STOP", (0, 0, 20, 20));
    let actual = vec![
        create_detection("YIELD", (0, 0, 20, 20)),
        create_detection("STOP", (0, 0, 20, 20)),
    ];
    let matched = best_area_match(&actual, &expected).unwrap();
    assert_eq!(matched.class, "YIELD");

    let report = evaluate(
        &index(vec![("a.jpg", vec![expected])]),
        &index(vec![("a.jpg", actual)]),
        &config(1),
    );
    assert_eq!(report.statistics.class("STOP").misclassified, 1);
    assert_eq!(report.statistics.class("STOP").true_positives, 0);
}

#[test]
fn test_touching_boxes_do_not_overlap() {
    // Shared edge at column 20.
    let expected = index(vec![("a.jpg", vec![create_roi("STOP", (0, 0, 30, 20))])]);
    let actual = index(vec![("a.jpg", vec![create_detection("STOP", (0, 20, 30, 50))])]);

    let report = evaluate(&expected, &actual, &config(15));
    let stop = report.statistics.class("STOP");
    assert_eq!(stop.true_positives, 0);
    assert_eq!(stop.false_negatives, 1);
    assert_eq!(stop.false_positives, 1);
}

#[test]
fn test_one_actual_can_match_several_expected() {
    let expected = index(vec![(
        "a.jpg",
        vec![
            create_roi("STOP", (0, 0, 20, 20)),
            create_roi("STOP", (0, 20, 20, 40)),
        ],
    )]);
    let actual = index(vec![("a.jpg", vec![create_detection("STOP", (0, 0, 20, 40))])]);

    let report = evaluate(&expected, &actual, &config(15));
    let stop = report.statistics.class("STOP");
    assert_eq!(stop.true_positives, 2);
    assert_eq!(stop.false_positives, 0);
    assert!((stop.sum_iou - 1.0).abs() < 1e-12);
}

#[test]
fn test_small_expected_matched_by_large_actual() {
    // Only the actual box passes the size filter; one box passing is enough.
    let expected = index(vec![("a.jpg", vec![create_roi("STOP", (10, 10, 20, 20))])]);
    let actual = index(vec![("a.jpg", vec![create_detection("STOP", (0, 0, 30, 30))])]);

    let report = evaluate(&expected, &actual, &config(25));
    let stop = report.statistics.class("STOP");
    assert_eq!(stop.true_positives, 1);
    assert!((stop.sum_iou - 100.0 / 900.0).abs() < 1e-12);
}

#[test]
fn test_large_expected_matched_by_small_actual() {
    let expected = index(vec![("a.jpg", vec![create_roi("STOP", (0, 0, 30, 30))])]);
    let actual = index(vec![("a.jpg", vec![create_detection("YIELD", (10, 10, 20, 20))])]);

    let report = evaluate(&expected, &actual, &config(25));
    assert_eq!(report.statistics.class("STOP").misclassified, 1);
    // The small actual box overlaps an expected ROI and is no false positive.
    assert_eq!(report.statistics.class("YIELD").false_positives, 0);
}

#[test]
fn test_both_boxes_below_min_size_count_nothing() {
    let expected = index(vec![("a.jpg", vec![create_roi("STOP", (0, 0, 10, 10))])]);
    let actual = index(vec![("a.jpg", vec![create_detection("STOP", (0, 0, 10, 10))])]);

    let report = evaluate(&expected, &actual, &config(25));
    assert_eq!(report.statistics.total, Statistics::new());
}

#[test]
fn test_min_size_uses_shorter_side() {
    // 100 wide but only 20 tall.
    let expected = index(vec![("a.jpg", vec![create_roi("STOP", (0, 0, 20, 100))])]);
    let actual = index(vec![("a.jpg", vec![])]);

    assert_eq!(evaluate(&expected, &actual, &config(25)).statistics.total.false_negatives, 0);
    assert_eq!(evaluate(&expected, &actual, &config(20)).statistics.total.false_negatives, 1);
}

// ============================================================================
// FILE-LEVEL EDGE CASES
// ============================================================================

#[test]
fn test_empty_indexes() {
    let report = evaluate(&RoiIndex::new(), &RoiIndex::new(), &config(25));
    assert!(report.statistics.per_class.is_empty());
    assert!(report.mismatched_files.is_empty());
    assert_eq!(report.statistics.report_lines().len(), 1);
}

#[test]
fn test_expected_file_without_rois() {
    let expected = index(vec![("a.jpg", vec![])]);
    let actual = index(vec![(
        "a.jpg",
        vec![
            create_detection("STOP", (0, 0, 30, 30)),
            create_detection("YIELD", (50, 50, 90, 90)),
        ],
    )]);

    let report = evaluate(&expected, &actual, &config(25));
    assert_eq!(report.statistics.class("STOP").false_positives, 1);
    assert_eq!(report.statistics.class("YIELD").false_positives, 1);
    assert_eq!(report.statistics.total.precision(), 0.0);
}

#[test]
fn test_mismatched_files_are_sorted() {
    let expected = index(vec![
        ("c.jpg", vec![create_roi("STOP", (0, 0, 30, 30))]),
        ("a.jpg", vec![create_roi("STOP", (0, 0, 30, 30))]),
        ("b.jpg", vec![create_roi("STOP", (0, 0, 30, 30))]),
    ]);
    let actual = index(vec![("b.jpg", vec![create_detection("STOP", (0, 0, 30, 30))])]);

    let report = evaluate(&expected, &actual, &config(25));
    assert_eq!(report.mismatched_files, vec!["a.jpg".to_string(), "c.jpg".to_string()]);
    assert_eq!(report.statistics.class("STOP").false_negatives, 2);
    assert_eq!(report.statistics.class("STOP").true_positives, 1);
}

// ============================================================================
// STATISTICS EDGE CASES
// ============================================================================

#[test]
fn test_zero_denominators() {
    let statistics = Statistics::new();
    assert_eq!(statistics.precision(), 0.0);
    assert_eq!(statistics.recall(), 0.0);
    assert_eq!(statistics.accuracy(), 0.0);
    assert_eq!(statistics.mean_iou(), 0.0);
}

#[test]
fn test_misclassification_lowers_precision_but_not_recall() {
    let statistics = Statistics {
        true_positives: 2,
        misclassified: 2,
        ..Statistics::new()
    };
    assert_eq!(statistics.precision(), 0.5);
    assert_eq!(statistics.recall(), 1.0);
    assert_eq!(statistics.accuracy(), 0.5);
}

#[test]
fn test_invalid_class_reported_but_not_totalled() {
    let expected = index(vec![(
        "a.jpg",
        vec![
            create_roi("STOP", (0, 0, 30, 30)),
            create_roi("INVALID", (100, 100, 130, 130)),
        ],
    )]);
    let actual = index(vec![(
        "a.jpg",
        vec![
            create_detection("STOP", (0, 0, 30, 30)),
            create_detection("INVALID", (100, 100, 130, 130)),
        ],
    )]);

    let report = evaluate(&expected, &actual, &config(25));
    assert_eq!(report.statistics.class("INVALID").true_positives, 1);
    assert_eq!(report.statistics.total.true_positives, 1);

    let lines = report.statistics.report_lines();
    assert_eq!(lines.len(), 3);
    assert!(lines[0].starts_with("INVALID tp = 1"));
    assert!(lines[2].starts_with("Total tp = 1"));
}

#[test]
fn test_class_line_prints_iou_sum() {
    let expected = index(vec![(
        "a.jpg",
        vec![
            create_roi("STOP", (0, 0, 30, 30)),
            create_roi("STOP", (100, 100, 130, 130)),
        ],
    )]);
    let actual = index(vec![(
        "a.jpg",
        vec![
            create_detection("STOP", (0, 0, 30, 30)),
            create_detection("STOP", (100, 100, 130, 130)),
        ],
    )]);

    let report = evaluate(&expected, &actual, &config(25));
    let lines = report.statistics.report_lines();
    assert_eq!(
        lines[0],
        "STOP tp = 2 fp = 0 fn = 0 mc = 0 precision = 1.0000 recall = 1.0000 accuracy = 1.000000 iou = 2.000000"
    );
    assert_eq!(
        lines[1],
        "Total tp = 2 fp = 0 fn = 0 mc = 0 precision = 1.0000 recall = 1.0000 accuracy = 1.000000 iou = 1.000000"
    );
}
