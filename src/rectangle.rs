//! Axis-aligned rectangle geometry.
//!
//! Coordinates are in XYXY (corner) format. A rectangle with zero width or
//! height is valid and stands for "no overlap".

use serde::{Deserialize, Serialize};
use std::fmt;

/// Axis-aligned rectangle given by its top-left and bottom-right corners.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rectangle {
    pub xmin: f64,
    pub ymin: f64,
    pub xmax: f64,
    pub ymax: f64,
}

impl Rectangle {
    /// Create a new rectangle from its corners.
    pub fn new(xmin: f64, ymin: f64, xmax: f64, ymax: f64) -> Self {
        Self {
            xmin,
            ymin,
            xmax,
            ymax,
        }
    }

    /// The degenerate rectangle at the origin.
    pub fn zero() -> Self {
        Self::default()
    }

    /// Width (`xmax - xmin`).
    pub fn width(&self) -> f64 {
        self.xmax - self.xmin
    }

    /// Height (`ymax - ymin`).
    pub fn height(&self) -> f64 {
        self.ymax - self.ymin
    }

    /// Get the area of the rectangle.
    pub fn area(&self) -> f64 {
        self.width() * self.height()
    }

    /// Length of the shorter side.
    pub fn min_side(&self) -> f64 {
        self.width().min(self.height())
    }

    /// Check that the corners are ordered (`xmax >= xmin`, `ymax >= ymin`).
    pub fn is_valid(&self) -> bool {
        self.xmax >= self.xmin && self.ymax >= self.ymin
    }

    /// Area shared by both rectangles, 0 when they are disjoint.
    pub fn intersection_area(&self, other: &Rectangle) -> f64 {
        let dx = self.xmax.min(other.xmax) - self.xmin.max(other.xmin);
        let dy = self.ymax.min(other.ymax) - self.ymin.max(other.ymin);
        if dx >= 0.0 && dy >= 0.0 {
            dx * dy
        } else {
            0.0
        }
    }

    /// Rectangle shared by both, or the zero rectangle when they are disjoint.
    pub fn overlap_region(&self, other: &Rectangle) -> Rectangle {
        let xmin = self.xmin.max(other.xmin);
        let ymin = self.ymin.max(other.ymin);
        let xmax = self.xmax.min(other.xmax);
        let ymax = self.ymax.min(other.ymax);
        if xmin <= xmax && ymin <= ymax {
            Rectangle::new(xmin, ymin, xmax, ymax)
        } else {
            Rectangle::zero()
        }
    }

    /// Intersection over Union.
    ///
    /// Returns 0.0 when the union is empty, so two degenerate rectangles never
    /// produce NaN.
    ///
    /// # Example
    ///
    /// ```
    /// use roi_eval::rectangle::Rectangle;
    ///
    /// let a = Rectangle::new(0.0, 0.0, 10.0, 10.0);
    /// let b = Rectangle::new(5.0, 5.0, 15.0, 15.0);
    /// let iou = a.iou(&b);
    /// assert!((iou - 25.0 / 175.0).abs() < 1e-12);
    /// ```
    pub fn iou(&self, other: &Rectangle) -> f64 {
        let intersection = self.intersection_area(other);
        let union = self.area() + other.area() - intersection;
        if union == 0.0 {
            return 0.0;
        }
        intersection / union
    }

    /// Fraction of this rectangle's area covered by `other`.
    ///
    /// Asymmetric: a small box inside a large one is fully contained (1.0)
    /// while the large one is only partially covered. Returns 0.0 for a
    /// zero-area rectangle.
    pub fn containment_in(&self, other: &Rectangle) -> f64 {
        let area = self.area();
        if area == 0.0 {
            return 0.0;
        }
        self.intersection_area(other) / area
    }

    /// Smallest rectangle enclosing both.
    pub fn bounding_box(&self, other: &Rectangle) -> Rectangle {
        Rectangle::new(
            self.xmin.min(other.xmin),
            self.ymin.min(other.ymin),
            self.xmax.max(other.xmax),
            self.ymax.max(other.ymax),
        )
    }

    /// Coordinate-wise mean of the two rectangles.
    pub fn average_box(&self, other: &Rectangle) -> Rectangle {
        Rectangle::new(
            (self.xmin + other.xmin) / 2.0,
            (self.ymin + other.ymin) / 2.0,
            (self.xmax + other.xmax) / 2.0,
            (self.ymax + other.ymax) / 2.0,
        )
    }

    /// Center point `(x, y)`.
    pub fn center(&self) -> (f64, f64) {
        (
            (self.xmin + self.xmax) / 2.0,
            (self.ymin + self.ymax) / 2.0,
        )
    }

    /// Euclidean distance between the two centers.
    pub fn center_distance(&self, other: &Rectangle) -> f64 {
        let (x1, y1) = self.center();
        let (x2, y2) = other.center();
        ((x2 - x1).powi(2) + (y2 - y1).powi(2)).sqrt()
    }

    /// Multiply every coordinate by `factor`.
    #[must_use]
    pub fn scaled(&self, factor: f64) -> Rectangle {
        Rectangle::new(
            self.xmin * factor,
            self.ymin * factor,
            self.xmax * factor,
            self.ymax * factor,
        )
    }
}

impl fmt::Display for Rectangle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "xmin {}, ymin {}, xmax {}, ymax {}",
            self.xmin, self.ymin, self.xmax, self.ymax
        )
    }
}
