//! Fuse multi-resolution detections and evaluate them against ground truth.

use roi_eval::{
    evaluator::write_report,
    loader::{load_image_set_from_str, roi_index},
    nms::{default_thresholds, fuse_resolution_passes, image_set_from_predictions, working_scale},
    evaluate, EvaluationConfig, FusionConfig, FusionStats, Rectangle, ResolutionPass,
};
use std::collections::BTreeMap;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    println!("=== ROI Evaluation Example ===\n");

    // Example 1: Geometry
    println!("1. Overlap Measures");
    let outer = Rectangle::new(100.0, 100.0, 300.0, 300.0);
    let inner = Rectangle::new(150.0, 150.0, 200.0, 200.0);
    println!("   IoU:                     {:.4}", outer.iou(&inner));
    println!("   Inner contained in outer: {:.4}", inner.containment_in(&outer));
    println!();

    // Example 2: Multi-resolution fusion
    println!("2. Fusing Two Resolution Passes");
    let (width, height) = (2592, 1944);
    let low = working_scale(width, height, 1296);
    let high = working_scale(width, height, 2592);
    let passes = vec![
        ResolutionPass {
            resolution: 1296,
            scale: low,
            boxes: vec![Rectangle::new(60.0, 40.0, 90.0, 70.0)],
            scores: vec![0.91],
            labels: vec!["STOP".to_string()],
        },
        ResolutionPass {
            resolution: 2592,
            scale: high,
            boxes: vec![
                Rectangle::new(121.0, 79.0, 181.0, 141.0),
                Rectangle::new(700.0, 400.0, 760.0, 455.0),
                Rectangle::new(900.0, 900.0, 930.0, 930.0),
            ],
            scores: vec![0.83, 0.77, 0.32],
            labels: vec!["STOP".to_string(), "YIELD".to_string(), "YIELD".to_string()],
        },
    ];

    let config = FusionConfig::default();
    let thresholds = default_thresholds(["STOP", "YIELD"], config.lowest_score_threshold);
    let mut stats = FusionStats::new();
    let fused = fuse_resolution_passes(&passes, &thresholds, &config, &mut stats)?;
    for candidate in &fused {
        println!(
            "   {} {:.2} from {}px: {}",
            candidate.label, candidate.score, candidate.resolution, candidate.rect
        );
    }

    let mut predictions = BTreeMap::new();
    predictions.insert("trip_7/frame_0042.jpg".to_string(), fused);
    let detections = image_set_from_predictions("RetinaNet", &predictions, &config, &mut stats);
    println!("   {}", stats.summary_string());
    println!();

    // Example 3: Ground truth
    println!("3. Loading Ground Truth");
    let ground_truth = load_image_set_from_str(
        r#"{
        "name": "ground_truth",
        "images": [
            {
                "metadata": {"image_path": "trip_7/frame_0042.jpg", "trip_id": "trip_7", "image_index": 42},
                "rois": [
                    {
                        "type": "STOP",
                        "rect": {"top_left": {"row": 80, "col": 120}, "bottom_right": {"row": 140, "col": 180}},
                        "manual": true
                    },
                    {
                        "type": "NO_ENTRY",
                        "rect": {"top_left": {"row": 400, "col": 700}, "bottom_right": {"row": 455, "col": 760}},
                        "manual": true
                    },
                    {
                        "type": "STOP",
                        "rect": {"top_left": {"row": 1200, "col": 40}, "bottom_right": {"row": 1260, "col": 100}},
                        "manual": true
                    }
                ]
            }
        ]
    }"#,
    )?;
    println!("   Loaded {} ground truth ROIs", ground_truth.roi_count());
    println!();

    // Example 4: Evaluation
    println!("4. Evaluation Report");
    let expected = roi_index(&ground_truth, true);
    let actual = roi_index(&detections, true);
    let report = evaluate(&expected, &actual, &EvaluationConfig::default());
    write_report(&report.statistics, &mut std::io::stdout())?;
    println!();

    println!("=== Example Complete ===");

    Ok(())
}
