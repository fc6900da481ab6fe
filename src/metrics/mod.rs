//! Metrics calculation modules for ROI evaluation.

pub mod statistics;

pub use statistics::{
    calculate_accuracy, calculate_mean_iou, calculate_precision, calculate_recall, Statistics,
    StatisticsLine,
};
