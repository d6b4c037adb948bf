//! Typed records read from one annotation document.
//!
//! These are the validated, strongly-typed counterparts of the COCO JSON
//! objects. Parsing produces them once per run; nothing mutates them
//! afterwards.

use std::collections::BTreeMap;
use std::path::Path;

use super::bbox::{BBoxCXCYWH, BBoxXYWH, Normalized, Pixel};
use super::ids::{AnnotationId, CategoryId, ImageId};
use crate::error::PrepError;

/// One annotation document (one dataset split).
#[derive(Clone, Debug, Default)]
pub struct AnnotationDocument {
    pub images: Vec<ImageRecord>,
    pub annotations: Vec<AnnotationRecord>,
    pub categories: Vec<CategoryRecord>,
}

/// An image as declared by the document.
#[derive(Clone, Debug, PartialEq)]
pub struct ImageRecord {
    pub id: ImageId,

    /// Path of the image relative to the raw image root.
    pub file_name: String,

    pub width: u32,
    pub height: u32,
}

/// A category declaration (source numbering).
#[derive(Clone, Debug, PartialEq)]
pub struct CategoryRecord {
    pub id: CategoryId,
    pub name: String,
}

/// One bounding box attached to an image.
#[derive(Clone, Debug)]
pub struct AnnotationRecord {
    /// COCO annotation id, when the document carries one.
    pub id: Option<AnnotationId>,
    pub image_id: ImageId,
    pub category_id: CategoryId,
    pub bbox: BBoxXYWH<Pixel>,
}

/// A YOLO label: dense class index plus normalized centre box.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NormalizedLabel {
    pub class_id: usize,
    pub bbox: BBoxCXCYWH<Normalized>,
}

impl ImageRecord {
    /// Creates an image record.
    pub fn new(id: impl Into<ImageId>, file_name: impl Into<String>, width: u32, height: u32) -> Self {
        Self {
            id: id.into(),
            file_name: file_name.into(),
            width,
            height,
        }
    }

    /// The final path component of `file_name`.
    ///
    /// Label files and copied images are flattened into a single directory
    /// per split, keyed by this name.
    pub fn base_name(&self) -> &str {
        self.file_name
            .rsplit(['/', '\\'])
            .next()
            .unwrap_or(&self.file_name)
    }

    /// Label file name for this image: base name with a `.txt` extension.
    pub fn label_file_name(&self) -> String {
        let stem = Path::new(self.base_name())
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.base_name().to_string());
        format!("{stem}.txt")
    }

    /// Normalizes a pixel box against this image's dimensions.
    ///
    /// Fails with [`PrepError::InvalidImageDimensions`] when either dimension
    /// is zero. Out-of-bounds boxes are passed through unchanged.
    pub fn normalize(&self, bbox: &BBoxXYWH<Pixel>) -> Result<BBoxCXCYWH<Normalized>, PrepError> {
        if self.width == 0 || self.height == 0 {
            return Err(PrepError::InvalidImageDimensions {
                image_id: self.id,
                file_name: self.file_name.clone(),
                width: self.width,
                height: self.height,
            });
        }
        Ok(bbox.to_normalized(self.width as f64, self.height as f64))
    }
}

impl CategoryRecord {
    /// Creates a category record.
    pub fn new(id: impl Into<CategoryId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

impl AnnotationRecord {
    /// Creates an annotation without a source id.
    pub fn new(
        image_id: impl Into<ImageId>,
        category_id: impl Into<CategoryId>,
        bbox: BBoxXYWH<Pixel>,
    ) -> Self {
        Self {
            id: None,
            image_id: image_id.into(),
            category_id: category_id.into(),
            bbox,
        }
    }

    /// Sets the source annotation id.
    pub fn with_id(mut self, id: impl Into<AnnotationId>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Human-readable reference used in error messages and reports.
    ///
    /// Uses the annotation id when present and the position in the document
    /// otherwise.
    pub fn describe(&self, index: usize) -> String {
        match self.id {
            Some(id) => id.to_string(),
            None => format!("#{index}"),
        }
    }
}

impl AnnotationDocument {
    /// Category names keyed by source id; the first declaration of an id wins.
    pub fn category_names(&self) -> BTreeMap<CategoryId, &str> {
        let mut names = BTreeMap::new();
        for category in &self.categories {
            names.entry(category.id).or_insert(category.name.as_str());
        }
        names
    }

    /// Images keyed by id; the first declaration of an id wins.
    pub fn image_index(&self) -> BTreeMap<ImageId, &ImageRecord> {
        let mut index = BTreeMap::new();
        for image in &self.images {
            index.entry(image.id).or_insert(image);
        }
        index
    }
}
