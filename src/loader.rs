//! JSON loading and saving of image sets and threshold maps, plus helpers
//! turning image sets into per-file ROI indexes.

use crate::error::{Result, RoiEvalError};
use crate::types::{ClassThresholds, ImageRecord, ImageSet, RoiIndex, Validation};
use std::collections::{BTreeMap, BTreeSet};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

/// Load an image set from a JSON file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed.
///
/// # Example
///
/// ```no_run
/// use roi_eval::loader::load_image_set;
///
/// let image_set = load_image_set("rois.json").unwrap();
/// println!("Loaded {} images", image_set.images.len());
/// ```
pub fn load_image_set<P: AsRef<Path>>(path: P) -> Result<ImageSet> {
    let file = File::open(path)?;
    let reader = BufReader::new(file);
    let image_set: ImageSet = serde_json::from_reader(reader)?;
    Ok(image_set)
}

/// Load an image set from a JSON string.
///
/// # Example
///
/// ```
/// use roi_eval::loader::load_image_set_from_str;
///
/// let json = r#"{
///     "name": "ground_truth",
///     "images": [{"metadata": {"image_path": "a.jpg"}, "rois": []}]
/// }"#;
/// let image_set = load_image_set_from_str(json).unwrap();
/// assert_eq!(image_set.images.len(), 1);
/// ```
pub fn load_image_set_from_str(json_str: &str) -> Result<ImageSet> {
    let image_set: ImageSet = serde_json::from_str(json_str)?;
    Ok(image_set)
}

/// Write an image set as pretty-printed JSON.
pub fn save_image_set<P: AsRef<Path>>(image_set: &ImageSet, path: P) -> Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut writer, image_set)?;
    writer.flush()?;
    Ok(())
}

/// Write a per-class threshold map as a JSON object.
pub fn save_thresholds<P: AsRef<Path>>(thresholds: &ClassThresholds, path: P) -> Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut writer, thresholds)?;
    writer.flush()?;
    Ok(())
}

/// Read a per-class threshold map written by [`save_thresholds`].
///
/// # Errors
///
/// Besides I/O and parse errors, thresholds outside `[0, 1]` are rejected.
pub fn load_thresholds<P: AsRef<Path>>(path: P) -> Result<ClassThresholds> {
    let reader = BufReader::new(File::open(path)?);
    let thresholds: ClassThresholds = serde_json::from_reader(reader)?;
    for (class, threshold) in &thresholds {
        if !(0.0..=1.0).contains(threshold) {
            return Err(RoiEvalError::InvalidThreshold(format!(
                "Threshold of class {class} must be between 0.0 and 1.0, got {threshold}"
            )));
        }
    }
    Ok(thresholds)
}

/// Group the ROIs of an image set by image path.
///
/// With `check_validation`, only ROIs whose validation is still
/// [`Validation::Unknown`] are kept, so annotations already confirmed as true
/// or false positives are left out. Images contributing no ROI do not appear.
pub fn roi_index(image_set: &ImageSet, check_validation: bool) -> RoiIndex {
    let mut index = RoiIndex::new();
    for image in &image_set.images {
        for roi in &image.rois {
            if check_validation && roi.validation != Validation::Unknown {
                continue;
            }
            index
                .entry(image.metadata.image_path.clone())
                .or_default()
                .push(roi.clone());
        }
    }
    index
}

/// Sorted unique class labels of an index.
pub fn class_names(index: &RoiIndex) -> Vec<String> {
    index
        .values()
        .flatten()
        .map(|roi| roi.class.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Number of ROIs of every class.
pub fn class_counts(index: &RoiIndex) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for roi in index.values().flatten() {
        *counts.entry(roi.class.clone()).or_insert(0) += 1;
    }
    counts
}

/// Append the non-empty ROI lists of `other` onto `index`.
pub fn merge_indexes(mut index: RoiIndex, other: RoiIndex) -> RoiIndex {
    for (file_name, rois) in other {
        if !rois.is_empty() {
            index.entry(file_name).or_default().extend(rois);
        }
    }
    index
}

/// Keep only ROIs of the given classes; files left without ROIs are dropped.
pub fn filter_classes(index: &RoiIndex, classes: &[&str]) -> RoiIndex {
    index
        .iter()
        .filter_map(|(file_name, rois)| {
            let remaining: Vec<_> = rois
                .iter()
                .filter(|roi| classes.contains(&roi.class.as_str()))
                .cloned()
                .collect();
            (!remaining.is_empty()).then(|| (file_name.clone(), remaining))
        })
        .collect()
}

/// Build an image set with one record per indexed file.
pub fn image_set_from_index(name: &str, index: &RoiIndex) -> ImageSet {
    let mut image_set = ImageSet::new(name);
    for (file_name, rois) in index {
        let mut record = ImageRecord::new(file_name.as_str());
        record.rois = rois.clone();
        image_set.images.push(record);
    }
    image_set
}
