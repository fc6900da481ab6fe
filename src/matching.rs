//! Area-based matching of actual ROIs against expected ROIs.

use crate::types::Roi;

/// Fraction of `roi`'s area covered by `other`.
///
/// Asymmetric: the ratio is taken over the area of the first argument.
/// Returns 0.0 when the boxes do not overlap or `roi` has no area.
pub fn overlap_ratio(roi: &Roi, other: &Roi) -> f64 {
    roi.rectangle().containment_in(&other.rectangle())
}

/// Whether the two ROIs share a region of positive area.
pub fn rois_overlap(a: &Roi, b: &Roi) -> bool {
    overlap_ratio(a, b) > 0.0
}

/// Pick the actual ROI covering the expected one best.
///
/// For each actual ROI the overlap is `intersection / area(actual)`; the ROI
/// with the strictly greatest positive overlap wins and ties keep the first
/// ROI seen. Returns `None` when nothing overlaps.
pub fn best_area_match<'a>(actual: &'a [Roi], expected: &Roi) -> Option<&'a Roi> {
    let mut best_overlap = 0.0;
    let mut best: Option<&Roi> = None;

    for candidate in actual {
        let overlap = overlap_ratio(candidate, expected);
        if overlap > best_overlap {
            best_overlap = overlap;
            best = Some(candidate);
        }
    }

    best
}

/// Whether either ROI has its shorter side at least `min_size` pixels.
pub fn either_has_min_size(a: &Roi, b: &Roi, min_size: u32) -> bool {
    a.has_min_size(min_size) || b.has_min_size(min_size)
}
