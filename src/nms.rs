/// Multi-resolution detection fusion
///
/// Candidates produced by several inference passes (one per working
/// resolution) are rescaled to original image coordinates, filtered by a
/// per-class score threshold and then de-duplicated by repeated all-pairs
/// elimination: whenever one box of a colliding pair is mostly contained in
/// the other, the lower-scoring box is dropped. Passes repeat until one of
/// them removes nothing.
///
/// Collisions use per-box containment ratios, not IoU, so a small box sitting
/// inside a larger one is redundant even when their IoU is small.

use crate::config::FusionConfig;
use crate::error::{Result, RoiEvalError};
use crate::rectangle::Rectangle;
use crate::stats::FusionStats;
use crate::types::{ClassThresholds, Detection, ImageRecord, ImageSet, PixelRect, Roi, Validation};
use std::collections::BTreeMap;
use tracing::debug;

/// Raw detection candidate, already in original image coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub rect: Rectangle,
    pub score: f64,
    pub label: String,
    /// Working resolution the candidate came from. Informational only.
    pub resolution: u32,
}

/// Output of one inference pass at a single working resolution.
///
/// Boxes are in the coordinates of the resized image; `scale` is the factor
/// the original image was multiplied by (see [`working_scale`]).
#[derive(Debug, Clone, PartialEq)]
pub struct ResolutionPass {
    pub resolution: u32,
    pub scale: f64,
    pub boxes: Vec<Rectangle>,
    pub scores: Vec<f64>,
    pub labels: Vec<String>,
}

/// Scale factor that fits an image of the given size into a square working
/// resolution: `resolution / max(width, height)`.
///
/// # Examples
///
/// ```
/// # use roi_eval::nms::working_scale;
/// assert_eq!(working_scale(2592, 1944, 1296), 0.5);
/// ```
#[must_use]
pub fn working_scale(image_width: u32, image_height: u32, resolution: u32) -> f64 {
    f64::from(resolution) / f64::from(image_width.max(image_height))
}

/// Threshold map giving every label the same value.
pub fn default_thresholds<I, S>(labels: I, threshold: f64) -> ClassThresholds
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    labels
        .into_iter()
        .map(|label| (label.into(), threshold))
        .collect()
}

/// Whether two boxes collide: either one has more than `containment_threshold`
/// of its area inside the other.
#[must_use]
pub fn collides(a: &Rectangle, b: &Rectangle, containment_threshold: f64) -> bool {
    a.containment_in(b) > containment_threshold || b.containment_in(a) > containment_threshold
}

/// Fuse flattened candidate arrays into the set of surviving indices.
///
/// 1. A candidate is alive when its score is strictly above its class
///    threshold.
/// 2. Every pair `(i, j)`, `i < j`, of alive candidates is visited in index
///    order. If they collide, the one with the strictly lower score is
///    removed; on a tie `j` is removed.
/// 3. Passes repeat until a full pass removes nothing.
///
/// The returned indices are sorted ascending.
///
/// # Errors
///
/// Returns [`RoiEvalError::LengthMismatch`] when the arrays differ in length
/// and [`RoiEvalError::MissingThreshold`] when a label has no threshold.
///
/// # Examples
///
/// ```
/// # use roi_eval::nms::{fuse_detections, default_thresholds};
/// # use roi_eval::rectangle::Rectangle;
/// let boxes = vec![
///     Rectangle::new(0.0, 0.0, 100.0, 100.0),
///     Rectangle::new(10.0, 10.0, 30.0, 30.0),
///     Rectangle::new(200.0, 200.0, 250.0, 250.0),
/// ];
/// let scores = vec![0.9, 0.8, 0.7];
/// let labels = vec!["STOP", "STOP", "STOP"];
/// let thresholds = default_thresholds(["STOP"], 0.5);
///
/// let keep = fuse_detections(&boxes, &scores, &labels, &thresholds, 0.5).unwrap();
/// assert_eq!(keep, vec![0, 2]);
/// ```
pub fn fuse_detections<S: AsRef<str>>(
    boxes: &[Rectangle],
    scores: &[f64],
    labels: &[S],
    thresholds: &ClassThresholds,
    containment_threshold: f64,
) -> Result<Vec<usize>> {
    if boxes.len() != scores.len() || boxes.len() != labels.len() {
        return Err(RoiEvalError::LengthMismatch {
            boxes: boxes.len(),
            scores: scores.len(),
            labels: labels.len(),
        });
    }

    let mut alive = Vec::with_capacity(boxes.len());
    for (score, label) in scores.iter().zip(labels) {
        let label = label.as_ref();
        let threshold = thresholds
            .get(label)
            .ok_or_else(|| RoiEvalError::MissingThreshold(label.to_string()))?;
        alive.push(*score > *threshold);
    }

    let n = boxes.len();
    let passes = suppress_colliding(boxes, scores, &mut alive, containment_threshold);

    let keep: Vec<usize> = (0..n).filter(|&i| alive[i]).collect();
    debug!(candidates = n, survivors = keep.len(), passes, "fused detections");
    Ok(keep)
}

/// Repeat all-pairs elimination passes over the alive candidates until a pass
/// removes nothing. Returns the number of passes run.
///
/// Pairs left alive by a pass were all checked and found apart, so the pass
/// after the first removal is always the last one.
fn suppress_colliding(
    boxes: &[Rectangle],
    scores: &[f64],
    alive: &mut [bool],
    containment_threshold: f64,
) -> usize {
    let n = boxes.len();
    let mut passes = 0;
    let mut removed_any = true;
    while removed_any {
        removed_any = false;
        passes += 1;
        for i in 0..n {
            for j in (i + 1)..n {
                if !alive[i] {
                    break;
                }
                if !alive[j] || !collides(&boxes[i], &boxes[j], containment_threshold) {
                    continue;
                }
                if scores[i] < scores[j] {
                    alive[i] = false;
                } else {
                    alive[j] = false;
                }
                removed_any = true;
            }
        }
    }
    passes
}

/// Fuse candidate structs, returning the survivors in input order.
pub fn fuse_candidates(
    candidates: &[Candidate],
    thresholds: &ClassThresholds,
    config: &FusionConfig,
    stats: &mut FusionStats,
) -> Result<Vec<Candidate>> {
    let boxes: Vec<Rectangle> = candidates.iter().map(|c| c.rect).collect();
    let scores: Vec<f64> = candidates.iter().map(|c| c.score).collect();
    let labels: Vec<&str> = candidates.iter().map(|c| c.label.as_str()).collect();

    let keep = fuse_detections(
        &boxes,
        &scores,
        &labels,
        thresholds,
        config.containment_threshold,
    )?;

    // Thresholds are known to cover every label at this point.
    let below_threshold = candidates
        .iter()
        .filter(|c| thresholds.get(&c.label).is_some_and(|t| c.score <= *t))
        .count();
    stats.record_fusion(candidates.len(), below_threshold, keep.len());

    Ok(keep.into_iter().map(|i| candidates[i].clone()).collect())
}

/// Bring every pass back to original image coordinates and flatten the
/// passes into one candidate list.
pub fn flatten_resolution_passes(passes: &[ResolutionPass]) -> Result<Vec<Candidate>> {
    let mut candidates = Vec::new();
    for pass in passes {
        if pass.boxes.len() != pass.scores.len() || pass.boxes.len() != pass.labels.len() {
            return Err(RoiEvalError::LengthMismatch {
                boxes: pass.boxes.len(),
                scores: pass.scores.len(),
                labels: pass.labels.len(),
            });
        }
        if !(pass.scale > 0.0 && pass.scale.is_finite()) {
            return Err(RoiEvalError::InvalidScale {
                resolution: pass.resolution,
                scale: pass.scale,
            });
        }
        for ((rect, score), label) in pass.boxes.iter().zip(&pass.scores).zip(&pass.labels) {
            candidates.push(Candidate {
                rect: Rectangle::new(
                    rect.xmin / pass.scale,
                    rect.ymin / pass.scale,
                    rect.xmax / pass.scale,
                    rect.ymax / pass.scale,
                ),
                score: *score,
                label: label.clone(),
                resolution: pass.resolution,
            });
        }
    }
    Ok(candidates)
}

/// Fuse the passes of one image into its canonical candidate set.
pub fn fuse_resolution_passes(
    passes: &[ResolutionPass],
    thresholds: &ClassThresholds,
    config: &FusionConfig,
    stats: &mut FusionStats,
) -> Result<Vec<Candidate>> {
    let candidates = flatten_resolution_passes(passes)?;
    fuse_candidates(&candidates, thresholds, config, stats)
}

/// Turn fused candidates into ROIs.
///
/// Top-left coordinates are clamped at 0, bottom-right coordinates at the
/// image size when it is known; coordinates are truncated to whole pixels.
/// Candidates with a side shorter than `config.min_side_size` are skipped.
pub fn materialize_rois(
    candidates: &[Candidate],
    image_size: Option<(u32, u32)>,
    config: &FusionConfig,
    stats: &mut FusionStats,
) -> Vec<Roi> {
    let (max_col, max_row) = match image_size {
        Some((width, height)) => (i64::from(width), i64::from(height)),
        None => (i64::MAX, i64::MAX),
    };
    let min_side = i64::from(config.min_side_size);

    let mut rois = Vec::with_capacity(candidates.len());
    for candidate in candidates {
        let r = &candidate.rect;
        let tl_row = if r.ymin > 0.0 { r.ymin as i64 } else { 0 };
        let tl_col = if r.xmin > 0.0 { r.xmin as i64 } else { 0 };
        let br_row = if r.ymax < max_row as f64 { r.ymax as i64 } else { max_row };
        let br_col = if r.xmax < max_col as f64 { r.xmax as i64 } else { max_col };

        if br_col - tl_col < min_side || br_row - tl_row < min_side {
            stats.skip_small();
            continue;
        }

        rois.push(Roi {
            class: candidate.label.clone(),
            rect: PixelRect::new(tl_row, tl_col, br_row, br_col),
            manual: false,
            algorithm: config.algorithm.clone(),
            algorithm_version: config.algorithm_version.clone(),
            detections: vec![Detection {
                class: candidate.label.clone(),
                confidence: candidate.score,
            }],
            components: Vec::new(),
            validation: Validation::Unknown,
        });
        stats.emit_roi();
    }
    rois
}

/// Lowest pixel coordinate of a predicted ROI.
pub const MIN_PREDICTED_COORDINATE: f64 = 1.0;

/// Raise every coordinate of the box to at least `min`.
fn clip_below(rect: &Rectangle, min: f64) -> Rectangle {
    Rectangle::new(
        rect.xmin.max(min),
        rect.ymin.max(min),
        rect.xmax.max(min),
        rect.ymax.max(min),
    )
}

/// Build an image set from per-file fused candidates.
///
/// Every coordinate is first raised to [`MIN_PREDICTED_COORDINATE`], so a
/// survivor lying partly or wholly outside the image origin still yields
/// exactly one ROI (unless `config.min_side_size` rejects it).
pub fn image_set_from_predictions(
    name: &str,
    predictions: &BTreeMap<String, Vec<Candidate>>,
    config: &FusionConfig,
    stats: &mut FusionStats,
) -> ImageSet {
    let mut image_set = ImageSet::new(name);
    for (file_name, candidates) in predictions {
        let clipped: Vec<Candidate> = candidates
            .iter()
            .map(|candidate| Candidate {
                rect: clip_below(&candidate.rect, MIN_PREDICTED_COORDINATE),
                ..candidate.clone()
            })
            .collect();
        let mut record = ImageRecord::new(file_name.as_str());
        record.rois = materialize_rois(&clipped, None, config, stats);
        stats.finish_image(record.rois.len());
        image_set.images.push(record);
    }
    image_set
}

#[cfg(test)]
mod tests {
    use super::*;

    fn thresholds() -> ClassThresholds {
        default_thresholds(["STOP", "YIELD"], 0.5)
    }

    fn fuse(boxes: &[Rectangle], scores: &[f64], labels: &[&str]) -> Vec<usize> {
        fuse_detections(boxes, scores, labels, &thresholds(), 0.5).unwrap()
    }

    #[test]
    fn test_empty_input() {
        assert!(fuse(&[], &[], &[]).is_empty());
    }

    #[test]
    fn test_single_candidate() {
        let boxes = [Rectangle::new(0.0, 0.0, 10.0, 10.0)];
        assert_eq!(fuse(&boxes, &[0.9], &["STOP"]), vec![0]);
        assert!(fuse(&boxes, &[0.3], &["STOP"]).is_empty());
    }

    #[test]
    fn test_threshold_is_strict() {
        let boxes = [Rectangle::new(0.0, 0.0, 10.0, 10.0)];
        assert!(fuse(&boxes, &[0.5], &["STOP"]).is_empty());
    }

    #[test]
    fn test_identical_boxes_keep_higher_score() {
        let r = Rectangle::new(0.0, 0.0, 10.0, 10.0);
        assert_eq!(fuse(&[r, r], &[0.7, 0.9], &["STOP", "STOP"]), vec![1]);
        assert_eq!(fuse(&[r, r], &[0.9, 0.7], &["STOP", "STOP"]), vec![0]);
    }

    #[test]
    fn test_tie_removes_later_index() {
        let r = Rectangle::new(0.0, 0.0, 10.0, 10.0);
        assert_eq!(fuse(&[r, r], &[0.8, 0.8], &["STOP", "STOP"]), vec![0]);
    }

    #[test]
    fn test_disjoint_boxes_survive() {
        let boxes = [
            Rectangle::new(0.0, 0.0, 10.0, 10.0),
            Rectangle::new(20.0, 20.0, 30.0, 30.0),
        ];
        assert_eq!(fuse(&boxes, &[0.9, 0.8], &["STOP", "STOP"]), vec![0, 1]);
    }

    #[test]
    fn test_contained_box_is_suppressed() {
        let outer = Rectangle::new(0.0, 0.0, 100.0, 100.0);
        let inner = Rectangle::new(40.0, 40.0, 60.0, 60.0);
        assert!(outer.iou(&inner) < 0.5);
        assert_eq!(fuse(&[outer, inner], &[0.6, 0.9], &["STOP", "STOP"]), vec![1]);
        assert_eq!(fuse(&[outer, inner], &[0.9, 0.6], &["STOP", "STOP"]), vec![0]);
    }

    #[test]
    fn test_labels_do_not_gate_collisions() {
        let r = Rectangle::new(0.0, 0.0, 10.0, 10.0);
        assert_eq!(fuse(&[r, r], &[0.6, 0.9], &["STOP", "YIELD"]), vec![1]);
    }

    #[test]
    fn test_chain_keeps_both_ends() {
        // A overlaps B, B overlaps C, A and C are disjoint.
        let a = Rectangle::new(0.0, 0.0, 10.0, 10.0);
        let b = Rectangle::new(4.0, 0.0, 14.0, 10.0);
        let c = Rectangle::new(8.0, 0.0, 18.0, 10.0);
        assert!(collides(&a, &b, 0.5));
        assert!(collides(&b, &c, 0.5));
        assert!(!collides(&a, &c, 0.5));
        assert_eq!(fuse(&[a, b, c], &[0.9, 0.8, 0.7], &["STOP"; 3]), vec![0, 2]);
    }

    #[test]
    fn test_second_pass_finds_nothing() {
        let a = Rectangle::new(0.0, 0.0, 10.0, 10.0);
        let b = Rectangle::new(4.0, 0.0, 14.0, 10.0);
        let c = Rectangle::new(8.0, 0.0, 18.0, 10.0);
        let d = Rectangle::new(1.0, 1.0, 9.0, 9.0);
        let boxes = [a, b, c, d];

        let mut alive = vec![true; 4];
        let passes = suppress_colliding(&boxes, &[0.7, 0.8, 0.9, 0.95], &mut alive, 0.5);
        assert_eq!(passes, 2);
        assert_eq!(alive, vec![false, false, true, true]);

        let mut alive = vec![true; 2];
        let passes = suppress_colliding(&[a, c], &[0.9, 0.8], &mut alive, 0.5);
        assert_eq!(passes, 1);
    }

    #[test]
    fn test_length_mismatch() {
        let boxes = [Rectangle::new(0.0, 0.0, 10.0, 10.0)];
        let result = fuse_detections(&boxes, &[0.9, 0.8], &["STOP"], &thresholds(), 0.5);
        assert!(matches!(result, Err(RoiEvalError::LengthMismatch { .. })));
    }

    #[test]
    fn test_missing_threshold() {
        let boxes = [Rectangle::new(0.0, 0.0, 10.0, 10.0)];
        let result = fuse_detections(&boxes, &[0.9], &["SPEED_LIMIT"], &thresholds(), 0.5);
        assert!(matches!(result, Err(RoiEvalError::MissingThreshold(ref c)) if c == "SPEED_LIMIT"));
    }

    #[test]
    fn test_working_scale() {
        assert_eq!(working_scale(1000, 500, 500), 0.5);
        assert_eq!(working_scale(400, 800, 1600), 2.0);
    }

    #[test]
    fn test_resolution_passes_are_rescaled() {
        let passes = vec![
            ResolutionPass {
                resolution: 500,
                scale: 0.5,
                boxes: vec![Rectangle::new(10.0, 10.0, 20.0, 20.0)],
                scores: vec![0.9],
                labels: vec!["STOP".to_string()],
            },
            ResolutionPass {
                resolution: 1000,
                scale: 1.0,
                boxes: vec![Rectangle::new(21.0, 21.0, 39.0, 39.0)],
                scores: vec![0.8],
                labels: vec!["STOP".to_string()],
            },
        ];
        let flat = flatten_resolution_passes(&passes).unwrap();
        assert_eq!(flat[0].rect, Rectangle::new(20.0, 20.0, 40.0, 40.0));
        assert_eq!(flat[1].resolution, 1000);

        let mut stats = FusionStats::new();
        let fused =
            fuse_resolution_passes(&passes, &thresholds(), &FusionConfig::default(), &mut stats)
                .unwrap();
        assert_eq!(fused.len(), 1);
        assert_eq!(fused[0].resolution, 500);
        assert_eq!(stats.suppressed, 1);
    }

    #[test]
    fn test_invalid_scale() {
        let passes = vec![ResolutionPass {
            resolution: 800,
            scale: 0.0,
            boxes: vec![],
            scores: vec![],
            labels: vec![],
        }];
        assert!(matches!(
            flatten_resolution_passes(&passes),
            Err(RoiEvalError::InvalidScale { resolution: 800, .. })
        ));
    }

    #[test]
    fn test_materialize_rois() {
        let candidates = vec![
            Candidate {
                rect: Rectangle::new(-3.0, 5.7, 40.9, 120.0),
                score: 0.75,
                label: "STOP".to_string(),
                resolution: 1000,
            },
            Candidate {
                rect: Rectangle::new(50.0, 50.0, 52.0, 80.0),
                score: 0.9,
                label: "YIELD".to_string(),
                resolution: 1000,
            },
        ];
        let config = FusionConfig {
            min_side_size: 5,
            algorithm_version: "1.0".to_string(),
            ..FusionConfig::default()
        };
        let mut stats = FusionStats::new();
        let rois = materialize_rois(&candidates, Some((100, 100)), &config, &mut stats);

        assert_eq!(rois.len(), 1);
        let roi = &rois[0];
        assert_eq!(roi.rect, PixelRect::new(5, 0, 100, 40));
        assert_eq!(roi.class, "STOP");
        assert!(!roi.manual);
        assert_eq!(roi.algorithm, "retinanet");
        assert_eq!(roi.algorithm_version, "1.0");
        assert_eq!(roi.detections.len(), 1);
        assert_eq!(roi.detections[0].confidence, 0.75);
        assert_eq!(stats.skipped_small, 1);
        assert_eq!(stats.emitted_rois, 1);
    }

    #[test]
    fn test_image_set_from_predictions() {
        let mut predictions = BTreeMap::new();
        predictions.insert(
            "b.jpg".to_string(),
            vec![Candidate {
                rect: Rectangle::new(0.0, 0.0, 30.0, 30.0),
                score: 0.9,
                label: "STOP".to_string(),
                resolution: 800,
            }],
        );
        predictions.insert("a.jpg".to_string(), Vec::new());

        let mut stats = FusionStats::new();
        let set =
            image_set_from_predictions("RetinaNet", &predictions, &FusionConfig::default(), &mut stats);
        assert_eq!(set.name, "RetinaNet");
        assert_eq!(set.images.len(), 2);
        assert_eq!(set.images[0].metadata.image_path, "a.jpg");
        assert_eq!(set.roi_count(), 1);
        assert_eq!(stats.empty_images, 1);
    }

    #[test]
    fn test_image_set_raises_coordinates_to_one() {
        let candidate = |rect| Candidate {
            rect,
            score: 0.9,
            label: "STOP".to_string(),
            resolution: 800,
        };
        let mut predictions = BTreeMap::new();
        predictions.insert(
            "a.jpg".to_string(),
            vec![
                candidate(Rectangle::new(-3.0, 5.0, 40.0, 50.0)),
                candidate(Rectangle::new(-20.0, 5.0, -4.0, 50.0)),
            ],
        );

        let mut stats = FusionStats::new();
        let set =
            image_set_from_predictions("RetinaNet", &predictions, &FusionConfig::default(), &mut stats);
        let rois = &set.images[0].rois;
        assert_eq!(rois.len(), 2);
        assert_eq!(rois[0].rect, PixelRect::new(5, 1, 50, 40));
        assert_eq!(rois[1].rect, PixelRect::new(5, 1, 50, 1));
        assert_eq!(stats.skipped_small, 0);
        assert_eq!(stats.emitted_rois, 2);
    }
}
