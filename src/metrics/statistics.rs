/// Match-outcome counters and the quality ratios derived from them
///
/// Every ratio returns 0.0 when its denominator is zero. Precision counts
/// misclassified matches in its denominator alongside false positives.
use serde::{Deserialize, Serialize};
use std::fmt;

/// Calculate recall from match counters
///
/// Recall = TP / (TP + FN)
///
/// # Examples
///
/// ```
/// # use roi_eval::metrics::statistics::calculate_recall;
/// assert_eq!(calculate_recall(80, 20), 0.8);
/// assert_eq!(calculate_recall(0, 0), 0.0);
/// ```
#[must_use]
pub fn calculate_recall(tp: usize, fn_: usize) -> f64 {
    let denominator = tp + fn_;
    if denominator == 0 {
        return 0.0;
    }

    #[allow(clippy::cast_precision_loss)]
    let recall = (tp as f64) / (denominator as f64);
    recall
}

/// Calculate precision from match counters
///
/// Precision = TP / (TP + FP + MC)
///
/// # Examples
///
/// ```
/// # use roi_eval::metrics::statistics::calculate_precision;
/// assert_eq!(calculate_precision(8, 1, 1), 0.8);
/// ```
#[must_use]
pub fn calculate_precision(tp: usize, fp: usize, mc: usize) -> f64 {
    let denominator = tp + fp + mc;
    if denominator == 0 {
        return 0.0;
    }

    #[allow(clippy::cast_precision_loss)]
    let precision = (tp as f64) / (denominator as f64);
    precision
}

/// Calculate accuracy from match counters
///
/// Accuracy = TP / (TP + FP + FN + MC)
///
/// # Examples
///
/// ```
/// # use roi_eval::metrics::statistics::calculate_accuracy;
/// assert_eq!(calculate_accuracy(6, 1, 2, 1), 0.6);
/// ```
#[must_use]
pub fn calculate_accuracy(tp: usize, fp: usize, fn_: usize, mc: usize) -> f64 {
    let denominator = tp + fp + fn_ + mc;
    if denominator == 0 {
        return 0.0;
    }

    #[allow(clippy::cast_precision_loss)]
    let accuracy = (tp as f64) / (denominator as f64);
    accuracy
}

/// Mean IoU over true positives, 0.0 without true positives
#[must_use]
pub fn calculate_mean_iou(sum_iou: f64, tp: usize) -> f64 {
    if tp == 0 {
        return 0.0;
    }

    #[allow(clippy::cast_precision_loss)]
    let mean = sum_iou / (tp as f64);
    mean
}

/// Match counters of one class (or of the `Total`)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Statistics {
    pub true_positives: usize,
    pub false_positives: usize,
    pub false_negatives: usize,
    pub misclassified: usize,
    /// Sum of the IoU of every true positive match
    pub sum_iou: f64,
}

impl Statistics {
    /// Create zeroed counters
    pub fn new() -> Self {
        Self::default()
    }

    pub fn recall(&self) -> f64 {
        calculate_recall(self.true_positives, self.false_negatives)
    }

    pub fn precision(&self) -> f64 {
        calculate_precision(self.true_positives, self.false_positives, self.misclassified)
    }

    pub fn accuracy(&self) -> f64 {
        calculate_accuracy(
            self.true_positives,
            self.false_positives,
            self.false_negatives,
            self.misclassified,
        )
    }

    pub fn mean_iou(&self) -> f64 {
        calculate_mean_iou(self.sum_iou, self.true_positives)
    }

    /// Add another set of counters to this one
    pub fn accumulate(&mut self, other: &Statistics) {
        self.true_positives += other.true_positives;
        self.false_positives += other.false_positives;
        self.false_negatives += other.false_negatives;
        self.misclassified += other.misclassified;
        self.sum_iou += other.sum_iou;
    }

    /// One report line for this record, printing `iou` in the iou field
    pub fn report_line<'a>(&'a self, name: &'a str, iou: f64) -> StatisticsLine<'a> {
        StatisticsLine {
            name,
            statistics: self,
            iou,
        }
    }
}

/// Displayable evaluation report line
///
/// `{class} tp = .. fp = .. fn = .. mc = .. precision = .. recall = .. accuracy = .. iou = ..`
#[derive(Debug, Clone, Copy)]
pub struct StatisticsLine<'a> {
    name: &'a str,
    statistics: &'a Statistics,
    iou: f64,
}

impl fmt::Display for StatisticsLine<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = self.statistics;
        write!(
            f,
            "{} tp = {} fp = {} fn = {} mc = {} precision = {:.4} recall = {:.4} accuracy = {:4.6} iou = {:4.6}",
            self.name,
            s.true_positives,
            s.false_positives,
            s.false_negatives,
            s.misclassified,
            s.precision(),
            s.recall(),
            s.accuracy(),
            self.iou,
        )
    }
}
