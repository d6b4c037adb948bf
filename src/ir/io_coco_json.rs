//! COCO JSON reader (and a small writer for fixtures and tests).
//!
//! # Format
//!
//! One JSON object per split with three required lists:
//!
//! - `images`: `{id, file_name, width, height}`
//! - `annotations`: `{image_id, category_id, bbox: [x_min, y_min, w, h]}`
//! - `categories`: `{id, name}`
//!
//! Boxes are absolute pixel coordinates with `(x_min, y_min)` at the top-left
//! corner. Any other keys (`info`, `licenses`, `segmentation`, `area`,
//! `iscrowd`, ...) are accepted and ignored. A record missing one of the
//! required fields fails the whole document at parse time.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::model::{AnnotationDocument, AnnotationRecord, CategoryRecord, ImageRecord};
use super::{AnnotationId, BBoxXYWH, CategoryId, ImageId, Pixel};
use crate::error::PrepError;

#[derive(Debug, Serialize, Deserialize)]
struct CocoDocument {
    images: Vec<CocoImage>,
    annotations: Vec<CocoAnnotation>,
    categories: Vec<CocoCategory>,
}

#[derive(Debug, Serialize, Deserialize)]
struct CocoImage {
    id: u64,
    file_name: String,
    #[serde(deserialize_with = "whole_dimension")]
    width: u32,
    #[serde(deserialize_with = "whole_dimension")]
    height: u32,
}

/// Accepts `640` and `640.0`; rejects fractional, negative and oversized values.
fn whole_dimension<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = f64::deserialize(deserializer)?;
    if value.fract() != 0.0 || !(0.0..=f64::from(u32::MAX)).contains(&value) {
        return Err(serde::de::Error::custom(format!(
            "invalid image dimension {value}; expected a non-negative integer"
        )));
    }
    Ok(value as u32)
}

#[derive(Debug, Serialize, Deserialize)]
struct CocoCategory {
    id: u64,
    name: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct CocoAnnotation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    id: Option<u64>,
    image_id: u64,
    category_id: u64,
    bbox: [f64; 4],
}

/// Reads an annotation document from a COCO JSON file.
///
/// A path that does not exist is reported as
/// [`PrepError::AnnotationFileMissing`]; malformed content as
/// [`PrepError::CocoJsonParse`].
///
/// # Example
/// ```no_run
/// use std::path::Path;
/// use trackprep::ir::io_coco_json::read_coco_json;
///
/// let document = read_coco_json(Path::new("annotations/train.json"))?;
/// # Ok::<(), trackprep::PrepError>(())
/// ```
pub fn read_coco_json(path: &Path) -> Result<AnnotationDocument, PrepError> {
    if !path.is_file() {
        return Err(PrepError::AnnotationFileMissing {
            path: path.to_path_buf(),
        });
    }

    let file = File::open(path).map_err(PrepError::file_io(path))?;
    let reader = BufReader::new(file);

    let coco: CocoDocument =
        serde_json::from_reader(reader).map_err(|source| PrepError::CocoJsonParse {
            path: path.to_path_buf(),
            source,
        })?;

    Ok(coco_to_document(coco))
}

/// Parses a COCO JSON string.
pub fn from_coco_str(json: &str) -> Result<AnnotationDocument, serde_json::Error> {
    let coco: CocoDocument = serde_json::from_str(json)?;
    Ok(coco_to_document(coco))
}

/// Parses COCO JSON bytes without a UTF-8 pass.
pub fn from_coco_slice(bytes: &[u8]) -> Result<AnnotationDocument, serde_json::Error> {
    let coco: CocoDocument = serde_json::from_slice(bytes)?;
    Ok(coco_to_document(coco))
}

/// Serializes a document back to COCO JSON, records in document order.
pub fn to_coco_string(document: &AnnotationDocument) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(&document_to_coco(document))
}

fn coco_to_document(coco: CocoDocument) -> AnnotationDocument {
    let images = coco
        .images
        .into_iter()
        .map(|img| ImageRecord {
            id: ImageId::new(img.id),
            file_name: img.file_name,
            width: img.width,
            height: img.height,
        })
        .collect();

    let categories = coco
        .categories
        .into_iter()
        .map(|cat| CategoryRecord {
            id: CategoryId::new(cat.id),
            name: cat.name,
        })
        .collect();

    let annotations = coco
        .annotations
        .into_iter()
        .map(|ann| AnnotationRecord {
            id: ann.id.map(AnnotationId::new),
            image_id: ImageId::new(ann.image_id),
            category_id: CategoryId::new(ann.category_id),
            bbox: BBoxXYWH::<Pixel>::from_array(ann.bbox),
        })
        .collect();

    AnnotationDocument {
        images,
        annotations,
        categories,
    }
}

fn document_to_coco(document: &AnnotationDocument) -> CocoDocument {
    CocoDocument {
        images: document
            .images
            .iter()
            .map(|img| CocoImage {
                id: img.id.as_u64(),
                file_name: img.file_name.clone(),
                width: img.width,
                height: img.height,
            })
            .collect(),
        annotations: document
            .annotations
            .iter()
            .map(|ann| CocoAnnotation {
                id: ann.id.map(|id| id.as_u64()),
                image_id: ann.image_id.as_u64(),
                category_id: ann.category_id.as_u64(),
                bbox: ann.bbox.to_array(),
            })
            .collect(),
        categories: document
            .categories
            .iter()
            .map(|cat| CocoCategory {
                id: cat.id.as_u64(),
                name: cat.name.clone(),
            })
            .collect(),
    }
}
