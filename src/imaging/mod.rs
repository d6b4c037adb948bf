//! Image decoding, encoding and the per-file transforms.
//!
//! Decoding sniffs the real format from the file header and falls back to
//! the extension. Encoding always follows the output file's extension, and
//! the encoded bytes are written atomically.

pub mod augment;
pub mod letterbox;

pub use augment::{is_augmentation_product, Augment, Variant};
pub use letterbox::{letterbox, letterbox_offset, Letterbox};

use std::io::Cursor;
use std::path::Path;

use image::{ColorType, DynamicImage, ImageDecoder, ImageFormat, ImageReader};

use crate::error::PrepError;
use crate::fsutil;

/// Decodes an image as stored, ignoring orientation metadata.
pub fn load_image(path: &Path) -> Result<DynamicImage, PrepError> {
    ImageReader::open(path)
        .map_err(PrepError::file_io(path))?
        .with_guessed_format()
        .map_err(PrepError::file_io(path))?
        .decode()
        .map_err(|source| PrepError::ImageDecode {
            path: path.to_path_buf(),
            source,
        })
}

/// Decodes an image and applies its stored camera orientation, so the
/// returned pixels are upright.
pub fn load_oriented(path: &Path) -> Result<DynamicImage, PrepError> {
    let decode_err = |source: image::ImageError| PrepError::ImageDecode {
        path: path.to_path_buf(),
        source,
    };

    let mut decoder = ImageReader::open(path)
        .map_err(PrepError::file_io(path))?
        .with_guessed_format()
        .map_err(PrepError::file_io(path))?
        .into_decoder()
        .map_err(decode_err)?;
    let orientation = decoder.orientation().map_err(decode_err)?;
    let mut image = DynamicImage::from_decoder(decoder).map_err(decode_err)?;
    image.apply_orientation(orientation);
    Ok(image)
}

/// Encodes `image` in the format implied by `path`'s extension.
pub fn encode_image(image: &DynamicImage, path: &Path) -> Result<Vec<u8>, PrepError> {
    let encode_err = |source: image::ImageError| PrepError::ImageEncode {
        path: path.to_path_buf(),
        source,
    };
    let format = ImageFormat::from_path(path).map_err(encode_err)?;

    let mut buf = Vec::new();
    // JPEG has no alpha channel and no 16-bit mode.
    if format == ImageFormat::Jpeg && !matches!(image.color(), ColorType::L8 | ColorType::Rgb8) {
        DynamicImage::ImageRgb8(image.to_rgb8())
            .write_to(&mut Cursor::new(&mut buf), format)
            .map_err(encode_err)?;
    } else {
        image
            .write_to(&mut Cursor::new(&mut buf), format)
            .map_err(encode_err)?;
    }
    Ok(buf)
}

/// Encodes and atomically writes `image` to `path`.
pub fn save_image(image: &DynamicImage, path: &Path) -> Result<(), PrepError> {
    let bytes = encode_image(image, path)?;
    fsutil::write_atomic(path, &bytes)
}
