#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use image::{Rgb, RgbImage};

pub const FOX_DEER_COCO: &str = include_str!("../fixtures/fox_deer.coco.json");

/// Minimal 24-bit BMP with all-black pixels.
pub fn bmp_bytes(width: u32, height: u32) -> Vec<u8> {
    let row_stride = (width * 3).div_ceil(4) * 4;
    let pixel_array_size = row_stride * height;
    let file_size = 54 + pixel_array_size;

    let mut bytes = Vec::with_capacity(file_size as usize);
    bytes.extend_from_slice(b"BM");
    bytes.extend_from_slice(&file_size.to_le_bytes());
    bytes.extend_from_slice(&[0, 0, 0, 0]);
    bytes.extend_from_slice(&54u32.to_le_bytes());

    bytes.extend_from_slice(&40u32.to_le_bytes());
    bytes.extend_from_slice(&(width as i32).to_le_bytes());
    bytes.extend_from_slice(&(height as i32).to_le_bytes());
    bytes.extend_from_slice(&1u16.to_le_bytes());
    bytes.extend_from_slice(&24u16.to_le_bytes());
    bytes.extend_from_slice(&0u32.to_le_bytes());
    bytes.extend_from_slice(&pixel_array_size.to_le_bytes());
    bytes.extend_from_slice(&2835u32.to_le_bytes());
    bytes.extend_from_slice(&2835u32.to_le_bytes());
    bytes.extend_from_slice(&0u32.to_le_bytes());
    bytes.extend_from_slice(&0u32.to_le_bytes());

    bytes.resize(file_size as usize, 0);
    bytes
}

pub fn write_bmp(path: &Path, width: u32, height: u32) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create parent dir");
    }
    fs::write(path, bmp_bytes(width, height)).expect("write bmp file");
}

/// Writes a solid-colour image; the format follows the extension.
pub fn write_image(path: &Path, width: u32, height: u32, colour: [u8; 3]) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create parent dir");
    }
    RgbImage::from_pixel(width, height, Rgb(colour))
        .save(path)
        .expect("write image file");
}

/// Writes a black JPEG whose Exif block records `orientation` (1-8).
pub fn write_jpeg_with_orientation(path: &Path, width: u32, height: u32, orientation: u16) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create parent dir");
    }
    let mut plain = Vec::new();
    RgbImage::new(width, height)
        .write_to(&mut std::io::Cursor::new(&mut plain), image::ImageFormat::Jpeg)
        .expect("encode jpeg");

    // Little-endian TIFF header with a single Orientation (0x0112) SHORT entry.
    let mut tiff = Vec::new();
    tiff.extend_from_slice(b"II");
    tiff.extend_from_slice(&42u16.to_le_bytes());
    tiff.extend_from_slice(&8u32.to_le_bytes());
    tiff.extend_from_slice(&1u16.to_le_bytes());
    tiff.extend_from_slice(&0x0112u16.to_le_bytes());
    tiff.extend_from_slice(&3u16.to_le_bytes());
    tiff.extend_from_slice(&1u32.to_le_bytes());
    tiff.extend_from_slice(&orientation.to_le_bytes());
    tiff.extend_from_slice(&[0, 0]);
    tiff.extend_from_slice(&0u32.to_le_bytes());

    let segment_len = (2 + 6 + tiff.len()) as u16;
    let mut bytes = plain[..2].to_vec();
    bytes.extend_from_slice(&[0xFF, 0xE1]);
    bytes.extend_from_slice(&segment_len.to_be_bytes());
    bytes.extend_from_slice(b"Exif\0\0");
    bytes.extend_from_slice(&tiff);
    bytes.extend_from_slice(&plain[2..]);
    fs::write(path, bytes).expect("write jpeg file");
}

/// Writes bytes that carry an image extension but decode as nothing.
pub fn write_corrupt_image(path: &Path) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create parent dir");
    }
    fs::write(path, b"\xff\xd8\xff\xe0 truncated").expect("write corrupt file");
}

/// Every regular file under `root`, relative and sorted.
pub fn list_files(root: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = walkdir::WalkDir::new(root)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file())
        .map(|e| e.path().strip_prefix(root).expect("under root").to_path_buf())
        .collect();
    files.sort();
    files
}

/// Lays out the fox/deer raw dataset: `annotations/train.json` plus the two
/// images it declares. Returns `(annotations_dir, images_dir)`.
pub fn write_fox_deer_raw(root: &Path) -> (PathBuf, PathBuf) {
    let annotations = root.join("annotations");
    let images = root.join("images");
    fs::create_dir_all(&annotations).expect("create annotations dir");
    fs::write(annotations.join("train.json"), FOX_DEER_COCO).expect("write train.json");
    write_image(&images.join("A.jpg"), 100, 200, [200, 120, 40]);
    write_image(&images.join("B.jpg"), 50, 50, [40, 120, 200]);
    (annotations, images)
}
