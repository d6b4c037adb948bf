//! Ultralytics-style YOLO output: label files, split layout and `data.yaml`.
//!
//! A prepared dataset looks like this:
//!
//! ```text
//! <output_root>/
//!   data.yaml
//!   train/images/IMG_0001.jpg
//!   train/labels/IMG_0001.txt
//!   val/...
//! ```
//!
//! Each label file holds one `<class_id> <cx> <cy> <w> <h>` line per box,
//! with the four box values normalized to the image size.

use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::{BBoxCXCYWH, NormalizedLabel};
use crate::error::PrepError;
use crate::fsutil;

/// File name of the dataset manifest inside the output root.
pub const MANIFEST_FILE_NAME: &str = "data.yaml";

const LABEL_EXTENSION: &str = "txt";

/// Output directories of one split.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SplitLayout {
    pub name: String,
    pub images_dir: PathBuf,
    pub labels_dir: PathBuf,
}

impl SplitLayout {
    /// Lays out `<output_root>/<split>/{images,labels}`.
    pub fn new(output_root: &Path, split: &str) -> Self {
        let root = output_root.join(split);
        Self {
            name: split.to_string(),
            images_dir: root.join("images"),
            labels_dir: root.join("labels"),
        }
    }

    /// Creates both directories if absent.
    pub fn create_dirs(&self) -> Result<(), PrepError> {
        fsutil::ensure_dir(&self.images_dir)?;
        fsutil::ensure_dir(&self.labels_dir)
    }
}

/// The `data.yaml` consumed by the training library.
///
/// Split entries point at the per-split `images/` directories; `names[i]` is
/// the class with dense id `i`. Pass an absolute `output_root` so the entries
/// resolve from any working directory.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DatasetManifest {
    pub train: PathBuf,
    pub val: PathBuf,
    pub test: PathBuf,
    pub nc: usize,
    pub names: Vec<String>,
}

impl DatasetManifest {
    /// Points each split entry at its `images/` directory under `output_root`.
    pub fn new(output_root: &Path, names: Vec<String>) -> Self {
        Self {
            train: SplitLayout::new(output_root, "train").images_dir,
            val: SplitLayout::new(output_root, "val").images_dir,
            test: SplitLayout::new(output_root, "test").images_dir,
            nc: names.len(),
            names,
        }
    }
}

/// Writes the manifest atomically as YAML.
pub fn write_manifest(path: &Path, manifest: &DatasetManifest) -> Result<(), PrepError> {
    let yaml = serde_yaml::to_string(manifest).map_err(|source| PrepError::ManifestWrite {
        path: path.to_path_buf(),
        source,
    })?;
    fsutil::write_atomic(path, yaml.as_bytes())
}

/// Reads a manifest previously written by [`write_manifest`].
pub fn read_manifest(path: &Path) -> Result<DatasetManifest, PrepError> {
    let data = fs::read_to_string(path).map_err(PrepError::file_io(path))?;
    serde_yaml::from_str(&data).map_err(|source| PrepError::ManifestParse {
        path: path.to_path_buf(),
        source,
    })
}

/// Renders one label line.
///
/// Values use the shortest decimal form that round-trips to the same `f64`,
/// so `0.25` stays `0.25` rather than `0.250000`.
pub fn format_label_line(label: &NormalizedLabel) -> String {
    let b = &label.bbox;
    format!("{} {} {} {} {}", label.class_id, b.cx, b.cy, b.width, b.height)
}

/// Renders a whole label file, one line per label, newline-terminated.
pub fn render_label_file(labels: &[NormalizedLabel]) -> String {
    let mut out = String::new();
    for label in labels {
        // Writing into a String cannot fail.
        let _ = writeln!(out, "{}", format_label_line(label));
    }
    out
}

/// Label file path inside `labels_dir` for an image file name.
pub fn label_path(labels_dir: &Path, image_name: &str) -> PathBuf {
    labels_dir.join(Path::new(image_name).with_extension(LABEL_EXTENSION))
}

/// Replaces the label file at `path` with `labels`.
pub fn write_label_file(path: &Path, labels: &[NormalizedLabel]) -> Result<(), PrepError> {
    fsutil::write_atomic(path, render_label_file(labels).as_bytes())
}

/// Reads every label in a label file. Blank lines are skipped.
pub fn read_label_file(path: &Path) -> Result<Vec<NormalizedLabel>, PrepError> {
    let content = fs::read_to_string(path).map_err(PrepError::file_io(path))?;
    let mut labels = Vec::new();
    for (line_idx, line) in content.lines().enumerate() {
        if let Some(label) = parse_label_line(line, path, line_idx + 1)? {
            labels.push(label);
        }
    }
    Ok(labels)
}

/// Parses one label line; `Ok(None)` for a blank line.
pub fn parse_label_line(
    line: &str,
    file_path: &Path,
    line_num: usize,
) -> Result<Option<NormalizedLabel>, PrepError> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }

    // Take at most 6 tokens so pathological inputs do not allocate unbounded memory.
    let tokens: Vec<&str> = trimmed.split_whitespace().take(6).collect();

    if tokens.len() < 5 {
        return Err(PrepError::LabelParse {
            path: file_path.to_path_buf(),
            line: line_num,
            message: format!("expected 5 tokens, found {}", tokens.len()),
        });
    }

    if tokens.len() > 5 {
        return Err(PrepError::LabelParse {
            path: file_path.to_path_buf(),
            line: line_num,
            message: "segmentation/pose rows are not supported; expected a single bounding box"
                .to_string(),
        });
    }

    let class_id = tokens[0]
        .parse::<usize>()
        .map_err(|_| PrepError::LabelParse {
            path: file_path.to_path_buf(),
            line: line_num,
            message: format!(
                "invalid class_id '{}'; expected non-negative integer",
                tokens[0]
            ),
        })?;

    let cx = parse_f64_token(tokens[1], "x_center", file_path, line_num)?;
    let cy = parse_f64_token(tokens[2], "y_center", file_path, line_num)?;
    let w = parse_f64_token(tokens[3], "width", file_path, line_num)?;
    let h = parse_f64_token(tokens[4], "height", file_path, line_num)?;

    Ok(Some(NormalizedLabel {
        class_id,
        bbox: BBoxCXCYWH::new(cx, cy, w, h),
    }))
}

/// Fuzz-only entrypoint for single-line label parsing.
#[cfg(feature = "fuzzing")]
pub fn fuzz_parse_label_line(input: &str) -> Result<(), PrepError> {
    let _ = parse_label_line(input, Path::new("<fuzz>"), 1)?;
    Ok(())
}

fn parse_f64_token(
    raw: &str,
    field_name: &str,
    file_path: &Path,
    line_num: usize,
) -> Result<f64, PrepError> {
    raw.parse::<f64>().map_err(|_| PrepError::LabelParse {
        path: file_path.to_path_buf(),
        line: line_num,
        message: format!("invalid {field_name} '{raw}'; expected floating-point number"),
    })
}
