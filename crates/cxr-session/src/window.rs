//! Window/level display state
//!
//! Pure state math behind the presentation layer's windowing controls:
//! native values come from the image metadata (or sensible defaults from
//! the intensity bounds), the reviewer adjusts via a lower/upper range,
//! and reset restores the native values. Re-initialized whenever the
//! displayed image changes.

use crate::catalog::ImageMetadata;

/// Window center/width state for one displayed image.
#[derive(Debug, Clone, PartialEq)]
pub struct WindowState {
    image_path: String,
    native_center: f64,
    native_width: f64,
    /// Current window center.
    pub center: f64,
    /// Current window width.
    pub width: f64,
    intensity_min: f64,
    intensity_max: f64,
}

impl WindowState {
    /// Initialize for an image from its resolved metadata.
    ///
    /// Missing window hints fall back to mid-range center and full-range
    /// width over the theoretical intensity bounds.
    #[must_use]
    pub fn from_metadata(image_path: &str, meta: &ImageMetadata) -> Self {
        let (intensity_min, intensity_max) =
            intensity_bounds(meta.bits_stored, meta.signed_pixels);
        let native_center = meta
            .window_center
            .unwrap_or((intensity_min + intensity_max) / 2.0);
        let native_width = meta
            .window_width
            .unwrap_or(intensity_max - intensity_min);
        Self {
            image_path: image_path.to_string(),
            native_center,
            native_width,
            center: native_center,
            width: native_width,
            intensity_min,
            intensity_max,
        }
    }

    /// Whether this state was initialized for the given image.
    #[inline]
    #[must_use]
    pub fn is_for(&self, image_path: &str) -> bool {
        self.image_path == image_path
    }

    /// Theoretical intensity bounds of the pixel data.
    #[inline]
    #[must_use]
    pub fn intensity_bounds(&self) -> (f64, f64) {
        (self.intensity_min, self.intensity_max)
    }

    /// Current window as a (lower, upper) range.
    #[inline]
    #[must_use]
    pub fn range(&self) -> (f64, f64) {
        (self.center - self.width / 2.0, self.center + self.width / 2.0)
    }

    /// Set the window from a (lower, upper) range: center becomes the
    /// midpoint, width the span.
    pub fn set_range(&mut self, lower: f64, upper: f64) {
        self.center = (lower + upper) / 2.0;
        self.width = upper - lower;
    }

    /// Restore the native center and width.
    pub fn reset(&mut self) {
        self.center = self.native_center;
        self.width = self.native_width;
    }
}

/// Theoretical pixel value bounds for a stored bit depth.
#[must_use]
fn intensity_bounds(bits_stored: u8, signed: bool) -> (f64, f64) {
    let bits = u32::from(bits_stored.clamp(1, 32));
    if signed {
        let half = 2f64.powi(bits as i32 - 1);
        (-half, half - 1.0)
    } else {
        (0.0, 2f64.powi(bits as i32) - 1.0)
    }
}
