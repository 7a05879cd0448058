//! Word cloud data structures

use serde::{Deserialize, Serialize};

/// Global frequency of a single title word
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordFrequencyEntry {
    /// Lowercase alphabetic token
    pub word: String,
    /// Occurrences across every title in the set
    pub count: usize,
}

/// A ranked word with its assigned font size, ready for layout
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankedWord {
    pub word: String,
    pub count: usize,
    pub font_size: f64,
}

/// A word positioned on the canvas.
///
/// `x`/`y` is the centre of the word; the measured box extends half of
/// `width`/`height` in each direction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Placement {
    pub word: String,
    pub font_size: f64,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Placement {
    /// Bounding box grown by `padding` on every side
    pub fn bounds(&self, padding: f64) -> Rect {
        Rect::centered(self.x, self.y, self.width, self.height).expand(padding)
    }
}

/// Axis-aligned rectangle in canvas coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub left: f64,
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
}

impl Rect {
    pub fn centered(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            left: x - width / 2.0,
            top: y - height / 2.0,
            right: x + width / 2.0,
            bottom: y + height / 2.0,
        }
    }

    pub fn expand(self, padding: f64) -> Self {
        Self {
            left: self.left - padding,
            top: self.top - padding,
            right: self.right + padding,
            bottom: self.bottom + padding,
        }
    }

    /// Strict overlap test; rectangles that only touch do not intersect
    pub fn intersects(&self, other: &Rect) -> bool {
        self.left < other.right
            && other.left < self.right
            && self.top < other.bottom
            && other.top < self.bottom
    }

    /// Whether the rectangle lies within `[0, width] x [0, height]`
    pub fn within(&self, width: f64, height: f64) -> bool {
        self.left >= 0.0 && self.top >= 0.0 && self.right <= width && self.bottom <= height
    }
}
