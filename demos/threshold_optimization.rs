//! Search the per-class confidence thresholds maximizing total accuracy.

use roi_eval::{
    loader::class_counts,
    threshold::{filter_confident_rois, threshold_grid},
    search_thresholds, PixelRect, Roi, RoiIndex, ThresholdSearchConfig,
};

/// Synthetic corpus: every frame holds one stop sign and one yield sign. The
/// detector finds them with a confidence that varies per frame and adds
/// low-confidence false alarms on some frames.
fn synthetic_corpus(num_frames: usize) -> (RoiIndex, RoiIndex) {
    let mut expected = RoiIndex::new();
    let mut actual = RoiIndex::new();

    for frame in 0..num_frames {
        let name = format!("frame_{frame:04}.jpg");
        let f = frame as f64;
        expected.insert(
            name.clone(),
            vec![
                Roi::new("STOP", PixelRect::new(100, 100, 160, 160)),
                Roi::new("YIELD", PixelRect::new(300, 400, 350, 450)),
            ],
        );

        let mut rois = vec![
            Roi::detected("STOP", PixelRect::new(102, 98, 161, 158), 0.55 + (f * 0.037) % 0.4),
            Roi::detected("YIELD", PixelRect::new(301, 402, 352, 449), 0.35 + (f * 0.051) % 0.6),
        ];
        if frame % 3 == 0 {
            rois.push(Roi::detected(
                "STOP",
                PixelRect::new(600, 600, 640, 640),
                0.2 + (f * 0.029) % 0.5,
            ));
        }
        if frame % 4 == 0 {
            rois.push(Roi::detected(
                "YIELD",
                PixelRect::new(20, 700, 60, 740),
                0.15 + (f * 0.043) % 0.3,
            ));
        }
        actual.insert(name, rois);
    }

    (expected, actual)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    println!("=== Confidence Threshold Optimization Example ===\n");

    // Example 1: Threshold grid
    println!("1. Threshold Grid");
    let config = ThresholdSearchConfig {
        workers: Some(2),
        ..ThresholdSearchConfig::default()
    };
    let grid = threshold_grid(config.start, config.end, config.step)?;
    println!(
        "   {} thresholds from {:.2} to {:.2}",
        grid.len(),
        grid[0],
        grid[grid.len() - 1]
    );
    println!();

    // Example 2: Corpus
    println!("2. Synthetic Corpus");
    let (expected, actual) = synthetic_corpus(60);
    for (class, count) in class_counts(&actual) {
        println!("   {class}: {count} detections");
    }
    println!();

    // Example 3: Search
    println!("3. Per-Class Search");
    let outcome = search_thresholds(&expected, &actual, &config)?;
    println!("   Class    | Threshold | Total accuracy");
    println!("   ---------|-----------|---------------");
    for (class, threshold) in &outcome.thresholds {
        println!(
            "   {:<8} | {:>9.2} | {:>14.4}",
            class, threshold, outcome.best_accuracy[class]
        );
    }
    println!();

    // Example 4: Applying the thresholds
    println!("4. Applying the Best Thresholds");
    let confident = filter_confident_rois(&actual, &outcome.thresholds)?;
    let kept: usize = confident.values().map(Vec::len).sum();
    let total: usize = actual.values().map(Vec::len).sum();
    println!("   Kept {kept} of {total} detections");
    for line in outcome.final_report.statistics.report_lines() {
        println!("   {line}");
    }
    println!();

    println!("=== Example Complete ===");

    Ok(())
}
