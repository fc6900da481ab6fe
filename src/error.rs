//! Error types for the roi-eval library.

use thiserror::Error;

/// Result type for roi-eval operations.
pub type Result<T> = std::result::Result<T, RoiEvalError>;

/// Error types that can occur during fusion, evaluation and threshold search.
#[derive(Error, Debug)]
pub enum RoiEvalError {
    /// Error during JSON parsing or serialization.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Error during I/O operations.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Parallel candidate arrays do not have the same length.
    #[error("Length mismatch: {boxes} boxes, {scores} scores, {labels} labels")]
    LengthMismatch {
        boxes: usize,
        scores: usize,
        labels: usize,
    },

    /// A class label has no entry in a per-class threshold map.
    #[error("Missing threshold for class: {0}")]
    MissingThreshold(String),

    /// An ROI without any detection hypothesis reached a confidence filter.
    #[error("ROI of class {class} in {file} has no detections")]
    MissingDetection { file: String, class: String },

    /// Resolution scale factor that is not a positive finite number.
    #[error("Invalid scale factor for resolution {resolution}: {scale}")]
    InvalidScale { resolution: u32, scale: f64 },

    /// Invalid confidence threshold or threshold grid.
    #[error("Invalid threshold: {0}")]
    InvalidThreshold(String),

    /// Configuration value out of its valid range.
    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    /// The worker pool for the threshold search could not be built.
    #[error("Thread pool error: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}
