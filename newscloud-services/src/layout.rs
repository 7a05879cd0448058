//! Word Cloud Layout Engine
//!
//! Archimedean spiral packing: each word walks outward from the canvas
//! centre until its padded box neither leaves the canvas nor overlaps the
//! padded box of a word placed before it. Words that find no spot within
//! the attempt budget are dropped.

use tracing::debug;

use newscloud_core::{CoreError, CoreResult, Placement, RankedWord, Rect};

/// Measures the rendered size of a word
pub trait TextMeasurer {
    /// Returns `(width, height)` of `word` drawn at `font_size`
    fn measure(&self, word: &str, font_size: f64) -> (f64, f64);
}

/// Font-free estimate from average glyph advance and line height
#[derive(Debug, Clone, Copy)]
pub struct ApproxTextMeasurer {
    /// Average advance per character, as a fraction of the font size
    pub advance_ratio: f64,
    /// Line height as a fraction of the font size
    pub line_height_ratio: f64,
}

impl Default for ApproxTextMeasurer {
    fn default() -> Self {
        Self {
            advance_ratio: 0.55,
            line_height_ratio: 1.2,
        }
    }
}

impl TextMeasurer for ApproxTextMeasurer {
    fn measure(&self, word: &str, font_size: f64) -> (f64, f64) {
        let chars = word.chars().count() as f64;
        (
            chars * self.advance_ratio * font_size,
            self.line_height_ratio * font_size,
        )
    }
}

/// Canvas and search parameters for [`CloudLayout`]
#[derive(Debug, Clone)]
pub struct CloudConfig {
    pub width: f64,
    pub height: f64,
    /// Gap kept around every word
    pub padding: f64,
    /// Spiral positions tried per word before giving up
    pub max_attempts: usize,
    /// Angle increment per attempt, in radians
    pub spiral_step: f64,
    /// Radius growth per radian
    pub spiral_spacing: f64,
}

impl Default for CloudConfig {
    fn default() -> Self {
        Self {
            width: 600.0,
            height: 450.0,
            padding: 3.0,
            max_attempts: 800,
            spiral_step: 0.15,
            spiral_spacing: 2.5,
        }
    }
}

impl CloudConfig {
    pub fn validate(&self) -> CoreResult<()> {
        let positive = |v: f64| v.is_finite() && v > 0.0;

        if !positive(self.width) || !positive(self.height) {
            return Err(CoreError::invalid_value(
                "canvas",
                format!("{}x{} must be positive", self.width, self.height),
            ));
        }
        if !(self.padding.is_finite() && self.padding >= 0.0) {
            return Err(CoreError::invalid_value("padding", "must be non-negative"));
        }
        if self.max_attempts == 0 {
            return Err(CoreError::invalid_value("max_attempts", "must be at least 1"));
        }
        if !positive(self.spiral_step) || !positive(self.spiral_spacing) {
            return Err(CoreError::invalid_value("spiral", "step and spacing must be positive"));
        }
        Ok(())
    }

    pub fn center(&self) -> (f64, f64) {
        (self.width / 2.0, self.height / 2.0)
    }

    /// Position tried at `attempt`: angle `attempt * step`, radius `spacing * angle`
    pub fn spiral_point(&self, attempt: usize) -> (f64, f64) {
        let (cx, cy) = self.center();
        let angle = attempt as f64 * self.spiral_step;
        let radius = self.spiral_spacing * angle;
        (cx + radius * angle.cos(), cy + radius * angle.sin())
    }
}

/// Spiral word placer
#[derive(Debug, Clone, Default)]
pub struct CloudLayout<M = ApproxTextMeasurer> {
    config: CloudConfig,
    measurer: M,
}

impl CloudLayout<ApproxTextMeasurer> {
    pub fn new(config: CloudConfig) -> CoreResult<Self> {
        Self::with_measurer(config, ApproxTextMeasurer::default())
    }
}

impl<M: TextMeasurer> CloudLayout<M> {
    pub fn with_measurer(config: CloudConfig, measurer: M) -> CoreResult<Self> {
        config.validate()?;
        Ok(Self { config, measurer })
    }

    pub fn config(&self) -> &CloudConfig {
        &self.config
    }

    /// Place as many words as fit, largest first.
    ///
    /// Output is in placement order. Words that cannot be placed are
    /// silently skipped; a partial cloud is a normal result.
    pub fn place(&self, words: &[RankedWord]) -> Vec<Placement> {
        let mut order: Vec<&RankedWord> = words.iter().collect();
        order.sort_by(|a, b| b.font_size.total_cmp(&a.font_size));

        let mut placed: Vec<Placement> = Vec::with_capacity(order.len());
        let mut occupied: Vec<Rect> = Vec::with_capacity(order.len());

        for word in order {
            let (width, height) = self.measurer.measure(&word.word, word.font_size);

            if let Some((x, y)) = self.find_position(width, height, &occupied) {
                let placement = Placement {
                    word: word.word.clone(),
                    font_size: word.font_size,
                    x,
                    y,
                    width,
                    height,
                };
                occupied.push(placement.bounds(self.config.padding));
                placed.push(placement);
            }
        }

        debug!(
            "Placed {} words out of {} candidates",
            placed.len(),
            words.len()
        );
        placed
    }

    fn find_position(&self, width: f64, height: f64, occupied: &[Rect]) -> Option<(f64, f64)> {
        (0..self.config.max_attempts)
            .map(|attempt| self.config.spiral_point(attempt))
            .find(|&(x, y)| {
                let padded = Rect::centered(x, y, width, height).expand(self.config.padding);
                padded.within(self.config.width, self.config.height)
                    && !occupied.iter().any(|other| padded.intersects(other))
            })
    }
}
