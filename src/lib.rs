//! # roi-eval
//!
//! Detection-quality layer between a perception model and its consumers.
//!
//! This library provides:
//! - **Fusion** of raw detection candidates from several inference passes at
//!   different working resolutions into one de-duplicated ROI set per image
//! - **Evaluation** of an ROI set against hand-labeled ground truth, giving
//!   per-class and total true/false positives, false negatives,
//!   misclassifications, precision, recall, accuracy and mean IoU
//! - **Threshold search** finding the per-class confidence threshold that
//!   maximizes total accuracy, run in parallel over classes
//!
//! ## Quick Start
//!
//! ```rust
//! use roi_eval::config::EvaluationConfig;
//! use roi_eval::evaluator::evaluate;
//! use roi_eval::types::{PixelRect, Roi, RoiIndex};
//!
//! let mut expected = RoiIndex::new();
//! expected.insert("frame_0001.jpg".into(), vec![Roi::new("STOP", PixelRect::new(10, 10, 60, 60))]);
//!
//! let mut actual = RoiIndex::new();
//! actual.insert(
//!     "frame_0001.jpg".into(),
//!     vec![Roi::detected("STOP", PixelRect::new(12, 10, 60, 58), 0.93)],
//! );
//!
//! let report = evaluate(&expected, &actual, &EvaluationConfig::default());
//! for line in report.statistics.report_lines() {
//!     println!("{line}");
//! }
//! ```
//!
//! ## Image set format
//!
//! Image sets are exchanged as JSON:
//!
//! ```json
//! {
//!   "name": "detections",
//!   "images": [
//!     {
//!       "metadata": {"image_path": "a.jpg", "trip_id": "", "image_index": 0, "region": ""},
//!       "rois": [
//!         {
//!           "type": "STOP",
//!           "rect": {"top_left": {"row": 10, "col": 10}, "bottom_right": {"row": 60, "col": 60}},
//!           "manual": false,
//!           "algorithm": "retinanet",
//!           "algorithm_version": "",
//!           "detections": [{"type": "STOP", "confidence": 0.93}],
//!           "components": [],
//!           "validation": "UNKNOWN"
//!         }
//!       ]
//!     }
//!   ]
//! }
//! ```

pub mod config;
pub mod error;
pub mod evaluator;
pub mod loader;
pub mod matching;
pub mod metrics;
pub mod nms;
pub mod rectangle;
pub mod stats;
pub mod threshold;
pub mod types;

// Re-export commonly used types and functions
pub use config::{Config, EvaluationConfig, FusionConfig, ThresholdSearchConfig};
pub use error::{Result, RoiEvalError};
pub use evaluator::{evaluate, EvaluationReport, ModelStatistics};
pub use loader::{load_image_set, roi_index, save_thresholds};
pub use metrics::Statistics;
pub use nms::{fuse_detections, fuse_resolution_passes, Candidate, ResolutionPass};
pub use rectangle::Rectangle;
pub use stats::FusionStats;
pub use threshold::{filter_confident_rois, search_thresholds, threshold_grid};
pub use types::{ClassThresholds, ImageRecord, ImageSet, PixelRect, Roi, RoiIndex, Validation};
