//! Confidence thresholding and per-class threshold search.
//!
//! The search is a 1-D line search per class: each class sweeps the threshold
//! grid while every other class stays at the default threshold, and keeps the
//! value giving the best `Total` accuracy. Classes are searched independently
//! on a worker pool; the result is not a joint optimum.

use crate::config::ThresholdSearchConfig;
use crate::error::{Result, RoiEvalError};
use crate::evaluator::{evaluate, EvaluationReport};
use crate::loader::class_names;
use crate::nms::default_thresholds;
use crate::types::{ClassThresholds, RoiIndex};
use rayon::prelude::*;
use std::collections::{BTreeMap, BTreeSet};
use tracing::info;

/// Keep the ROIs whose first detection is strictly more confident than the
/// threshold of the ROI's class.
///
/// Files whose ROIs are all dropped stay in the index with an empty list.
///
/// # Errors
///
/// Returns [`RoiEvalError::MissingThreshold`] for a class absent from
/// `thresholds` and [`RoiEvalError::MissingDetection`] for an ROI without
/// detections.
///
/// # Example
///
/// ```
/// use roi_eval::threshold::filter_confident_rois;
/// use roi_eval::types::{ClassThresholds, PixelRect, Roi, RoiIndex};
///
/// let mut index = RoiIndex::new();
/// index.insert(
///     "a.jpg".into(),
///     vec![
///         Roi::detected("STOP", PixelRect::new(0, 0, 10, 10), 0.9),
///         Roi::detected("STOP", PixelRect::new(0, 20, 10, 30), 0.3),
///     ],
/// );
/// let thresholds = ClassThresholds::from([("STOP".to_string(), 0.5)]);
///
/// let filtered = filter_confident_rois(&index, &thresholds).unwrap();
/// assert_eq!(filtered["a.jpg"].len(), 1);
/// ```
pub fn filter_confident_rois(index: &RoiIndex, thresholds: &ClassThresholds) -> Result<RoiIndex> {
    let mut selected = RoiIndex::new();
    for (file_name, rois) in index {
        let mut kept = Vec::with_capacity(rois.len());
        for roi in rois {
            let confidence = roi.confidence().ok_or_else(|| RoiEvalError::MissingDetection {
                file: file_name.clone(),
                class: roi.class.clone(),
            })?;
            let threshold = thresholds
                .get(&roi.class)
                .ok_or_else(|| RoiEvalError::MissingThreshold(roi.class.clone()))?;
            if confidence > *threshold {
                kept.push(roi.clone());
            }
        }
        selected.insert(file_name.clone(), kept);
    }
    Ok(selected)
}

/// Generate the inclusive threshold grid `start, start + step, ..., end`.
///
/// Values are rounded to two decimals.
///
/// # Example
///
/// ```
/// use roi_eval::threshold::threshold_grid;
///
/// let grid = threshold_grid(0.10, 1.00, 0.01).unwrap();
/// assert_eq!(grid.len(), 91);
/// assert_eq!(grid[0], 0.10);
/// assert_eq!(grid[63], 0.73);
/// assert_eq!(grid[90], 1.00);
/// ```
pub fn threshold_grid(start: f64, end: f64, step: f64) -> Result<Vec<f64>> {
    validate_threshold(start)?;
    validate_threshold(end)?;

    if start > end {
        return Err(RoiEvalError::InvalidThreshold(format!(
            "Start threshold ({start}) must be <= end threshold ({end})"
        )));
    }
    if !(step > 0.0 && step.is_finite()) {
        return Err(RoiEvalError::InvalidThreshold(format!(
            "Step must be a positive number, got {step}"
        )));
    }

    let steps = ((end - start) / step + 1e-9).floor() as usize;
    Ok((0..=steps)
        .map(|i| round_to_hundredths(start + step * i as f64))
        .collect())
}

fn round_to_hundredths(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Validate that a threshold is in the valid range [0.0, 1.0].
fn validate_threshold(threshold: f64) -> Result<()> {
    if !(0.0..=1.0).contains(&threshold) {
        return Err(RoiEvalError::InvalidThreshold(format!(
            "Threshold must be between 0.0 and 1.0, got {threshold}"
        )));
    }
    Ok(())
}

/// Best threshold found for one class.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassSearchResult {
    pub class: String,
    pub threshold: f64,
    /// `Total` accuracy reached with `threshold`.
    pub accuracy: f64,
}

/// Sweep the grid for `class`, holding every other class in `classes` at the
/// default threshold.
///
/// Only strictly better accuracies replace the current best, so ties keep the
/// lowest threshold. When no threshold beats an accuracy of 0 the first grid
/// value is returned.
pub fn search_class_threshold(
    expected: &RoiIndex,
    actual: &RoiIndex,
    class: &str,
    classes: &[String],
    config: &ThresholdSearchConfig,
) -> Result<ClassSearchResult> {
    let grid = threshold_grid(config.start, config.end, config.step)?;
    let evaluation = config.evaluation();
    let mut thresholds = default_thresholds(classes.iter().cloned(), config.default_threshold);

    info!(class, "searching best threshold");
    let mut best = ClassSearchResult {
        class: class.to_string(),
        threshold: grid[0],
        accuracy: 0.0,
    };
    for threshold in grid {
        thresholds.insert(class.to_string(), threshold);
        let confident = filter_confident_rois(actual, &thresholds)?;
        let report = evaluate(expected, &confident, &evaluation);
        let accuracy = report.statistics.total.accuracy();
        if accuracy > best.accuracy {
            best.accuracy = accuracy;
            best.threshold = threshold;
        }
    }
    info!(class, threshold = best.threshold, accuracy = best.accuracy, "best threshold");
    Ok(best)
}

/// Result of a full threshold search.
#[derive(Debug, Clone, PartialEq)]
pub struct ThresholdSearchOutcome {
    pub thresholds: ClassThresholds,
    pub best_accuracy: BTreeMap<String, f64>,
    /// Evaluation with every class at its best threshold.
    pub final_report: EvaluationReport,
}

/// Find the best confidence threshold of every class.
///
/// The classes are the union of the classes of `expected` and `actual`. One
/// task per class runs on a dedicated worker pool; any task error aborts the
/// whole search. A final evaluation with the combined map is logged and
/// returned for information.
pub fn search_thresholds(
    expected: &RoiIndex,
    actual: &RoiIndex,
    config: &ThresholdSearchConfig,
) -> Result<ThresholdSearchOutcome> {
    let classes: Vec<String> = class_names(expected)
        .into_iter()
        .chain(class_names(actual))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    let workers = config.worker_count();
    info!(classes = classes.len(), workers, "starting threshold search");
    let pool = rayon::ThreadPoolBuilder::new().num_threads(workers).build()?;
    let results: Vec<ClassSearchResult> = pool.install(|| {
        classes
            .par_iter()
            .map(|class| search_class_threshold(expected, actual, class, &classes, config))
            .collect::<Result<Vec<_>>>()
    })?;
    drop(pool);

    let mut thresholds = ClassThresholds::new();
    let mut best_accuracy = BTreeMap::new();
    for result in results {
        thresholds.insert(result.class.clone(), result.threshold);
        best_accuracy.insert(result.class, result.accuracy);
    }

    let confident = filter_confident_rois(actual, &thresholds)?;
    let final_report = evaluate(expected, &confident, &config.evaluation());
    for line in final_report.statistics.report_lines() {
        info!("{line}");
    }

    Ok(ThresholdSearchOutcome {
        thresholds,
        best_accuracy,
        final_report,
    })
}
