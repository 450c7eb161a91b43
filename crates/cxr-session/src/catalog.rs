//! Assigned image table and the image metadata provider seam
//!
//! The catalog is the ordered list of images a reviewer works through:
//! flat for the Data Scientist, grouped by study for the Clinician. Pixel
//! decoding and header parsing live behind [`MetadataProvider`]; the core
//! only sees the resolved [`ImageMetadata`].

use crate::error::MetadataError;
use std::path::PathBuf;

/// One image in the reviewer's assignment.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ImageRef {
    /// Study the image belongs to.
    pub study_key: String,
    /// Image identifier within the study.
    pub image_id: String,
    /// Path of the image file.
    pub image_path: String,
}

/// Ordered table of assigned images, with study grouping derived from it.
///
/// Studies keep their first-appearance order; views within a study keep
/// the table order.
#[derive(Debug, Clone, Default)]
pub struct ImageCatalog {
    images: Vec<ImageRef>,
    studies: Vec<String>,
}

impl ImageCatalog {
    /// Build from the assignment table.
    #[must_use]
    pub fn new(images: Vec<ImageRef>) -> Self {
        let mut studies: Vec<String> = Vec::new();
        for image in &images {
            if !studies.contains(&image.study_key) {
                studies.push(image.study_key.clone());
            }
        }
        Self { images, studies }
    }

    /// Total number of images.
    #[inline]
    #[must_use]
    pub fn image_count(&self) -> usize {
        self.images.len()
    }

    /// Whether the catalog holds no images.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    /// Image at a flat index.
    #[inline]
    #[must_use]
    pub fn image(&self, index: usize) -> Option<&ImageRef> {
        self.images.get(index)
    }

    /// All images, in table order.
    #[inline]
    #[must_use]
    pub fn images(&self) -> &[ImageRef] {
        &self.images
    }

    /// Number of distinct studies.
    #[inline]
    #[must_use]
    pub fn study_count(&self) -> usize {
        self.studies.len()
    }

    /// Study key at a study index.
    #[inline]
    #[must_use]
    pub fn study(&self, index: usize) -> Option<&str> {
        self.studies.get(index).map(String::as_str)
    }

    /// All views (images) of a study, in table order.
    #[must_use]
    pub fn views_of(&self, study_key: &str) -> Vec<&ImageRef> {
        self.images
            .iter()
            .filter(|i| i.study_key == study_key)
            .collect()
    }

    /// Number of views in the study at a study index.
    #[must_use]
    pub fn view_count(&self, study_index: usize) -> usize {
        match self.study(study_index) {
            Some(key) => self.views_of(key).len(),
            None => 0,
        }
    }

    /// View at (study index, view index).
    #[must_use]
    pub fn view(&self, study_index: usize, view_index: usize) -> Option<&ImageRef> {
        let key = self.study(study_index)?;
        self.views_of(key).get(view_index).copied()
    }
}

/// Resolved metadata for one image.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageMetadata {
    /// Study the image belongs to.
    pub study_key: String,
    /// Image identifier within the study.
    pub image_id: String,
    /// Where the pixel intensities come from.
    pub pixel_source: PathBuf,
    /// Window center hint from the image header, if present.
    pub window_center: Option<f64>,
    /// Window width hint from the image header, if present.
    pub window_width: Option<f64>,
    /// Stored bit depth of the pixel data.
    pub bits_stored: u8,
    /// Whether pixel values are signed.
    pub signed_pixels: bool,
}

impl ImageMetadata {
    /// Metadata with no window hints and the common 12-bit unsigned layout.
    #[must_use]
    pub fn new(
        study_key: impl Into<String>,
        image_id: impl Into<String>,
        pixel_source: impl Into<PathBuf>,
    ) -> Self {
        Self {
            study_key: study_key.into(),
            image_id: image_id.into(),
            pixel_source: pixel_source.into(),
            window_center: None,
            window_width: None,
            bits_stored: 12,
            signed_pixels: false,
        }
    }

    /// With window hints.
    #[inline]
    #[must_use]
    pub fn with_window(mut self, center: f64, width: f64) -> Self {
        self.window_center = Some(center);
        self.window_width = Some(width);
        self
    }

    /// With pixel layout.
    #[inline]
    #[must_use]
    pub fn with_pixel_layout(mut self, bits_stored: u8, signed_pixels: bool) -> Self {
        self.bits_stored = bits_stored;
        self.signed_pixels = signed_pixels;
        self
    }
}

/// External provider of image metadata (header parsing, pixel access).
///
/// Failures are reported, never fatal: the session suspends navigation and
/// save for the affected image until a later resolve succeeds.
pub trait MetadataProvider {
    /// Resolve metadata for an image path.
    fn metadata(&self, image_path: &str) -> Result<ImageMetadata, MetadataError>;
}
