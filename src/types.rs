//! Core data types for ROIs, image records and image sets.

use crate::rectangle::Rectangle;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Per-class confidence thresholds, keyed by class label.
pub type ClassThresholds = BTreeMap<String, f64>;

/// ROIs grouped by image file name.
pub type RoiIndex = BTreeMap<String, Vec<Roi>>;

/// Pixel position given as row/column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Point {
    pub row: i64,
    pub col: i64,
}

/// Integer pixel box of an ROI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PixelRect {
    pub top_left: Point,
    pub bottom_right: Point,
}

impl PixelRect {
    /// Create a pixel box from its corner rows/columns.
    pub fn new(tl_row: i64, tl_col: i64, br_row: i64, br_col: i64) -> Self {
        Self {
            top_left: Point {
                row: tl_row,
                col: tl_col,
            },
            bottom_right: Point {
                row: br_row,
                col: br_col,
            },
        }
    }

    /// Geometry view: columns map to x, rows map to y.
    pub fn to_rectangle(&self) -> Rectangle {
        Rectangle::new(
            self.top_left.col as f64,
            self.top_left.row as f64,
            self.bottom_right.col as f64,
            self.bottom_right.row as f64,
        )
    }
}

/// One class hypothesis attached to an ROI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    #[serde(rename = "type")]
    pub class: String,
    pub confidence: f64,
}

/// Sub-part of an ROI. Carried through untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Component {
    #[serde(rename = "type")]
    pub class: String,
    #[serde(rename = "box")]
    pub rect: PixelRect,
    #[serde(default)]
    pub value: String,
}

/// Ground-truth annotation quality flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Validation {
    #[default]
    Unknown,
    TruePositive,
    FalsePositive,
    BadQuality,
}

/// Region of interest: a labeled or detected object box plus its metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Roi {
    #[serde(rename = "type")]
    pub class: String,
    pub rect: PixelRect,
    #[serde(default)]
    pub manual: bool,
    #[serde(default)]
    pub algorithm: String,
    #[serde(default)]
    pub algorithm_version: String,
    /// Class hypotheses; index 0 is the one used for threshold checks.
    #[serde(default)]
    pub detections: Vec<Detection>,
    #[serde(default)]
    pub components: Vec<Component>,
    #[serde(default)]
    pub validation: Validation,
}

impl Roi {
    /// Create a manual (ground-truth style) ROI without detections.
    pub fn new(class: impl Into<String>, rect: PixelRect) -> Self {
        Self {
            class: class.into(),
            rect,
            manual: true,
            algorithm: String::new(),
            algorithm_version: String::new(),
            detections: Vec::new(),
            components: Vec::new(),
            validation: Validation::Unknown,
        }
    }

    /// Create a detected ROI with a single hypothesis of its own class.
    pub fn detected(class: impl Into<String>, rect: PixelRect, confidence: f64) -> Self {
        let class = class.into();
        Self {
            detections: vec![Detection {
                class: class.clone(),
                confidence,
            }],
            manual: false,
            ..Self::new(class, rect)
        }
    }

    /// Geometry of the pixel box.
    pub fn rectangle(&self) -> Rectangle {
        self.rect.to_rectangle()
    }

    /// Confidence of the authoritative (first) detection, if any.
    pub fn confidence(&self) -> Option<f64> {
        self.detections.first().map(|d| d.confidence)
    }

    /// Whether the shorter side of the box is at least `min_size` pixels.
    pub fn has_min_size(&self, min_size: u32) -> bool {
        self.rectangle().min_side() >= f64::from(min_size)
    }
}

/// Descriptive metadata of an image.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ImageMetadata {
    pub image_path: String,
    #[serde(default)]
    pub trip_id: String,
    #[serde(default)]
    pub image_index: u64,
    #[serde(default)]
    pub region: String,
}

/// One image and its ROIs.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ImageRecord {
    pub metadata: ImageMetadata,
    #[serde(default)]
    pub rois: Vec<Roi>,
}

impl ImageRecord {
    /// Create an empty record for `image_path` with blank trip/region data.
    pub fn new(image_path: impl Into<String>) -> Self {
        Self {
            metadata: ImageMetadata {
                image_path: image_path.into(),
                ..ImageMetadata::default()
            },
            rois: Vec::new(),
        }
    }
}

/// Named collection of image records.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ImageSet {
    pub name: String,
    #[serde(default)]
    pub images: Vec<ImageRecord>,
}

impl ImageSet {
    /// Create an empty image set.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            images: Vec::new(),
        }
    }

    /// Total number of ROIs over all images.
    pub fn roi_count(&self) -> usize {
        self.images.iter().map(|image| image.rois.len()).sum()
    }
}
