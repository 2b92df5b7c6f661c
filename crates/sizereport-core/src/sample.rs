#![forbid(unsafe_code)]

//! Content-box size samples.

/// Rendered size of an element's content box, in CSS pixels.
///
/// Samples are produced once per observation event and never retained.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SizeSample {
    pub width: f64,
    pub height: f64,
}

impl SizeSample {
    /// Build a sample, clamping negative or NaN extents to zero.
    #[must_use]
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width: clamp_extent(width),
            height: clamp_extent(height),
        }
    }

    /// The all-zero sample hosts report when an element is registered before
    /// its first layout pass.
    #[must_use]
    pub fn is_degenerate(&self) -> bool {
        self.width == 0.0 && self.height == 0.0
    }
}

impl From<(f64, f64)> for SizeSample {
    fn from((width, height): (f64, f64)) -> Self {
        Self::new(width, height)
    }
}

fn clamp_extent(v: f64) -> f64 {
    if v.is_nan() || v < 0.0 { 0.0 } else { v }
}
