//! ROI set evaluation against hand-labeled ground truth.
//!
//! Every expected ROI is matched to the actual ROI of the same file that
//! covers it best (see [`best_area_match`]). Matches and misses are counted per
//! expected class; actual ROIs touching no expected ROI are counted as false
//! positives of their own class. ROIs whose shorter side is below the minimum
//! size are ignored by every counter.

use crate::config::EvaluationConfig;
use crate::error::Result;
use crate::matching::{best_area_match, either_has_min_size, rois_overlap};
use crate::metrics::Statistics;
use crate::types::{Roi, RoiIndex};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::{debug, warn};

/// Name of the aggregate statistics line.
pub const TOTAL_NAME: &str = "Total";

/// Per-class statistics plus the aggregate `Total`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelStatistics {
    pub per_class: BTreeMap<String, Statistics>,
    /// Sum of every class except the excluded ones. `sum_iou` is a sum; use
    /// [`Statistics::mean_iou`] to read the mean.
    pub total: Statistics,
}

impl ModelStatistics {
    /// Aggregate per-class counters into a `Total`, skipping `excluded` classes.
    pub fn from_classes(per_class: BTreeMap<String, Statistics>, excluded: &[String]) -> Self {
        let mut total = Statistics::new();
        for (class, statistics) in &per_class {
            if !excluded.iter().any(|e| e == class) {
                total.accumulate(statistics);
            }
        }
        Self { per_class, total }
    }

    /// Counters of one class; zeroed when the class never occurred.
    pub fn class(&self, name: &str) -> Statistics {
        self.per_class.get(name).cloned().unwrap_or_default()
    }

    /// Mean IoU of the true positives of the `Total`.
    pub fn mean_iou(&self) -> f64 {
        self.total.mean_iou()
    }

    /// Report lines: one per class in name order, then the `Total`.
    ///
    /// Class lines print the accumulated IoU sum in their `iou` field, the
    /// `Total` line prints the mean IoU.
    pub fn report_lines(&self) -> Vec<String> {
        let mut lines: Vec<String> = self
            .per_class
            .iter()
            .map(|(class, statistics)| statistics.report_line(class, statistics.sum_iou).to_string())
            .collect();
        lines.push(
            self.total
                .report_line(TOTAL_NAME, self.total.mean_iou())
                .to_string(),
        );
        lines
    }
}

/// Outcome of one evaluation run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EvaluationReport {
    pub statistics: ModelStatistics,
    /// Expected files with no entry in the actual set.
    pub mismatched_files: Vec<String>,
}

/// Evaluate `actual` against `expected` over every file of `expected`.
///
/// A file missing from `actual` is logged and evaluated as if it had no
/// actual ROIs: its expected ROIs become false negatives and no false
/// positives are computed for it.
///
/// # Example
///
/// ```
/// use roi_eval::config::EvaluationConfig;
/// use roi_eval::evaluator::evaluate;
/// use roi_eval::types::{PixelRect, Roi, RoiIndex};
///
/// let mut expected = RoiIndex::new();
/// expected.insert("a.jpg".into(), vec![Roi::new("STOP", PixelRect::new(0, 0, 10, 10))]);
/// let mut actual = RoiIndex::new();
/// actual.insert("a.jpg".into(), vec![Roi::detected("STOP", PixelRect::new(0, 0, 10, 10), 0.9)]);
///
/// let config = EvaluationConfig { min_size: 1, ..EvaluationConfig::default() };
/// let report = evaluate(&expected, &actual, &config);
/// assert_eq!(report.statistics.total.accuracy(), 1.0);
/// ```
pub fn evaluate(expected: &RoiIndex, actual: &RoiIndex, config: &EvaluationConfig) -> EvaluationReport {
    let mut per_class: BTreeMap<String, Statistics> = BTreeMap::new();
    let mut mismatched_files = Vec::new();

    for (file_name, expected_rois) in expected {
        match actual.get(file_name) {
            Some(actual_rois) => {
                evaluate_file(expected_rois, actual_rois, config.min_size, &mut per_class);
                select_false_positives(expected_rois, actual_rois, config.min_size, &mut per_class);
            }
            None => {
                warn!(file = %file_name, "mismatched file: expected file has no actual ROIs");
                mismatched_files.push(file_name.clone());
                evaluate_file(expected_rois, &[], config.min_size, &mut per_class);
            }
        }
        debug!(
            file = %file_name,
            expected = expected_rois.len(),
            actual = actual.get(file_name).map_or(0, Vec::len),
            "evaluated file"
        );
    }

    EvaluationReport {
        statistics: ModelStatistics::from_classes(per_class, &config.excluded_total_classes),
        mismatched_files,
    }
}

/// Match every expected ROI of one file and count TP, MC and FN.
pub fn evaluate_file(
    expected: &[Roi],
    actual: &[Roi],
    min_size: u32,
    per_class: &mut BTreeMap<String, Statistics>,
) {
    for expected_roi in expected {
        match best_area_match(actual, expected_roi) {
            Some(matched) => {
                let sized = either_has_min_size(matched, expected_roi, min_size);
                if matched.class == expected_roi.class && sized {
                    let statistics = per_class.entry(expected_roi.class.clone()).or_default();
                    statistics.true_positives += 1;
                    statistics.sum_iou += matched.rectangle().iou(&expected_roi.rectangle());
                }
                if matched.class != expected_roi.class && sized {
                    per_class
                        .entry(expected_roi.class.clone())
                        .or_default()
                        .misclassified += 1;
                }
            }
            None => {
                if expected_roi.has_min_size(min_size) {
                    per_class
                        .entry(expected_roi.class.clone())
                        .or_default()
                        .false_negatives += 1;
                }
            }
        }
    }
}

/// Count actual ROIs overlapping no expected ROI as false positives.
pub fn select_false_positives(
    expected: &[Roi],
    actual: &[Roi],
    min_size: u32,
    per_class: &mut BTreeMap<String, Statistics>,
) {
    for actual_roi in actual {
        let found = expected
            .iter()
            .any(|expected_roi| rois_overlap(expected_roi, actual_roi));
        if !found && actual_roi.has_min_size(min_size) {
            per_class
                .entry(actual_roi.class.clone())
                .or_default()
                .false_positives += 1;
        }
    }
}

/// Write every report line to `writer`, one per line.
pub fn write_report<W: Write>(statistics: &ModelStatistics, writer: &mut W) -> Result<()> {
    for line in statistics.report_lines() {
        writeln!(writer, "{line}")?;
    }
    Ok(())
}

/// Write the report lines to a file.
pub fn save_report<P: AsRef<Path>>(statistics: &ModelStatistics, path: P) -> Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    write_report(statistics, &mut writer)?;
    writer.flush()?;
    Ok(())
}
