/// Statistics tracking for detection fusion and ROI materialization
///
/// This module provides counters describing what happened to the raw
/// candidates of one or more images on their way to the final ROI set.

use serde::{Deserialize, Serialize};

/// Counters collected while fusing candidates and materializing ROIs
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FusionStats {
    /// Total number of raw candidates seen
    pub total_candidates: usize,

    /// Candidates whose score did not exceed their class threshold
    pub below_threshold: usize,

    /// Candidates removed because a higher-scoring candidate collided with them
    pub suppressed: usize,

    /// Surviving candidates dropped because a side was below the minimum size
    pub skipped_small: usize,

    /// ROIs emitted
    pub emitted_rois: usize,

    /// Number of images processed
    pub processed_images: usize,

    /// Images that ended with zero ROIs
    pub empty_images: usize,
}

impl FusionStats {
    /// Create a new `FusionStats` with all counters at zero
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the outcome of one fusion call
    pub fn record_fusion(&mut self, total: usize, below_threshold: usize, survivors: usize) {
        self.total_candidates += total;
        self.below_threshold += below_threshold;
        self.suppressed += total.saturating_sub(below_threshold).saturating_sub(survivors);
    }

    /// Record a surviving candidate that was too small to become an ROI
    pub fn skip_small(&mut self) {
        self.skipped_small += 1;
    }

    /// Record an emitted ROI
    pub fn emit_roi(&mut self) {
        self.emitted_rois += 1;
    }

    /// Record a processed image and whether it ended up empty
    pub fn finish_image(&mut self, roi_count: usize) {
        self.processed_images += 1;
        if roi_count == 0 {
            self.empty_images += 1;
        }
    }

    /// Fold another set of counters into this one
    pub fn merge(&mut self, other: &FusionStats) {
        self.total_candidates += other.total_candidates;
        self.below_threshold += other.below_threshold;
        self.suppressed += other.suppressed;
        self.skipped_small += other.skipped_small;
        self.emitted_rois += other.emitted_rois;
        self.processed_images += other.processed_images;
        self.empty_images += other.empty_images;
    }

    /// Candidates that cleared their class threshold
    pub fn accepted_candidates(&self) -> usize {
        self.total_candidates.saturating_sub(self.below_threshold)
    }

    /// Get a formatted string summary of the statistics
    pub fn summary_string(&self) -> String {
        format!(
            "FusionStats {{ candidates: {}, below_threshold: {}, suppressed: {}, skipped_small: {}, rois: {}, images: {}, empty: {} }}",
            self.total_candidates,
            self.below_threshold,
            self.suppressed,
            self.skipped_small,
            self.emitted_rois,
            self.processed_images,
            self.empty_images
        )
    }
}
