//! Letterboxing: pad an image onto a square canvas without resampling.

use std::path::{Path, PathBuf};

use image::{imageops, DynamicImage, Rgb, RgbImage};

use super::{load_image, save_image};
use crate::config::RgbColor;
use crate::error::PrepError;
use crate::materialize::TreeTransform;

/// Top-left position of a `width` x `height` image centred on its square
/// canvas. The padded axis gets `(side - dim) / 2`, rounded down.
pub fn letterbox_offset(width: u32, height: u32) -> (u32, u32) {
    let side = width.max(height);
    ((side - width) / 2, (side - height) / 2)
}

/// Composites `image` onto a `max(w, h)` square of `background`.
///
/// The source is flattened to 8-bit RGB first; alpha is discarded, not
/// blended.
pub fn letterbox(image: &DynamicImage, background: RgbColor) -> RgbImage {
    let rgb = image.to_rgb8();
    let (width, height) = rgb.dimensions();
    let side = width.max(height);
    let (x, y) = letterbox_offset(width, height);

    let mut canvas = RgbImage::from_pixel(side, side, Rgb(background.0));
    imageops::replace(&mut canvas, &rgb, i64::from(x), i64::from(y));
    canvas
}

/// Letterboxes files into a mirrored output tree, keeping file names.
#[derive(Clone, Copy, Debug)]
pub struct Letterbox {
    pub background: RgbColor,
}

impl Letterbox {
    /// A letterbox transform padding with `background`.
    pub fn new(background: RgbColor) -> Self {
        Self { background }
    }

    /// Letterboxes one file into `out_dir`.
    pub fn letterbox_file(&self, source: &Path, out_dir: &Path) -> Result<PathBuf, PrepError> {
        let image = load_image(source)?;
        let squared = DynamicImage::ImageRgb8(letterbox(&image, self.background));

        let file_name = source.file_name().ok_or_else(|| PrepError::FileIo {
            path: source.to_path_buf(),
            source: std::io::Error::new(std::io::ErrorKind::InvalidInput, "path has no file name"),
        })?;
        let target = out_dir.join(file_name);
        save_image(&squared, &target)?;
        Ok(target)
    }
}

impl TreeTransform for Letterbox {
    fn name(&self) -> &'static str {
        "letterbox"
    }

    fn requires_distinct_output(&self) -> bool {
        true
    }

    fn apply(&self, source: &Path, out_dir: &Path) -> Result<Vec<PathBuf>, PrepError> {
        Ok(vec![self.letterbox_file(source, out_dir)?])
    }
}
