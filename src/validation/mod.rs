//! Validation of COCO annotation documents.
//!
//! Checks everything conversion relies on without writing anything:
//! - structural integrity (unique ids, valid references, a non-empty category set)
//! - data quality (non-empty names, positive dimensions, distinct output file names)
//! - geometry (finite, non-empty boxes inside their image)
//! - optionally, that declared image sizes match the files on disk

mod report;

pub use report::{IssueCode, IssueContext, Severity, ValidationIssue, ValidationReport};

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;

use crate::ir::{AnnotationDocument, AnnotationId, CategoryId, ImageId};

/// Pixels a box may extend past the image edge before it is reported.
const BOUNDS_TOLERANCE: f64 = 0.5;

/// Options for validation behavior.
#[derive(Clone, Debug, Default)]
pub struct ValidateOptions {
    /// If true, the caller treats warnings as errors.
    pub strict: bool,

    /// When set, every image is looked up under this root and its header
    /// dimensions compared with the declared ones.
    pub images_dir: Option<PathBuf>,
}

/// Validates a document and returns a report of all issues found.
pub fn validate_document(document: &AnnotationDocument, opts: &ValidateOptions) -> ValidationReport {
    let mut report = ValidationReport::new();

    let image_ids: HashSet<ImageId> = document.images.iter().map(|i| i.id).collect();
    let category_ids: HashSet<CategoryId> = document.categories.iter().map(|c| c.id).collect();

    validate_images(document, &mut report);
    validate_categories(document, &mut report);
    validate_annotations(document, &image_ids, &category_ids, &mut report);

    if let Some(images_dir) = &opts.images_dir {
        validate_image_files(document, images_dir, &mut report);
    }

    report
}

fn validate_images(document: &AnnotationDocument, report: &mut ValidationReport) {
    let mut seen_ids: HashMap<ImageId, usize> = HashMap::new();
    let mut seen_names: HashMap<&str, ImageId> = HashMap::new();

    for (idx, image) in document.images.iter().enumerate() {
        let id = image.id.as_u64();

        if let Some(first_idx) = seen_ids.get(&image.id) {
            report.add(ValidationIssue::error(
                IssueCode::DuplicateImageId,
                format!(
                    "Duplicate image ID {} (first seen at index {})",
                    id, first_idx
                ),
                IssueContext::Image { id },
            ));
        } else {
            seen_ids.insert(image.id, idx);
        }

        if image.width == 0 || image.height == 0 {
            report.add(ValidationIssue::error(
                IssueCode::InvalidImageDimensions,
                format!(
                    "Invalid dimensions {}x{} (must be positive)",
                    image.width, image.height
                ),
                IssueContext::Image { id },
            ));
        }

        if image.file_name.is_empty() {
            report.add(ValidationIssue::warning(
                IssueCode::EmptyFileName,
                "Empty filename",
                IssueContext::Image { id },
            ));
            continue;
        }

        match seen_names.get(image.base_name()) {
            Some(first_id) if *first_id != image.id => {
                report.add(ValidationIssue::warning(
                    IssueCode::DuplicateBaseName,
                    format!(
                        "File name '{}' is also used by image {}; outputs would collide",
                        image.base_name(),
                        first_id
                    ),
                    IssueContext::Image { id },
                ));
            }
            Some(_) => {}
            None => {
                seen_names.insert(image.base_name(), image.id);
            }
        }
    }
}

fn validate_categories(document: &AnnotationDocument, report: &mut ValidationReport) {
    if document.categories.is_empty() {
        report.add(ValidationIssue::error(
            IssueCode::EmptyCategorySet,
            "No categories declared",
            IssueContext::Document,
        ));
        return;
    }

    let mut seen_ids: HashMap<CategoryId, usize> = HashMap::new();
    let mut seen_names: HashMap<&str, CategoryId> = HashMap::new();

    for (idx, category) in document.categories.iter().enumerate() {
        let id = category.id.as_u64();

        if let Some(first_idx) = seen_ids.get(&category.id) {
            report.add(ValidationIssue::error(
                IssueCode::DuplicateCategoryId,
                format!(
                    "Duplicate category ID {} (first seen at index {})",
                    id, first_idx
                ),
                IssueContext::Category { id },
            ));
        } else {
            seen_ids.insert(category.id, idx);
        }

        if category.name.is_empty() {
            report.add(ValidationIssue::warning(
                IssueCode::EmptyCategoryName,
                "Empty category name",
                IssueContext::Category { id },
            ));
        } else if let Some(first_id) = seen_names.get(category.name.as_str()) {
            // Warning only: two source ids may legitimately share a label.
            report.add(ValidationIssue::warning(
                IssueCode::DuplicateCategoryName,
                format!(
                    "Duplicate category name '{}' (also used by category {})",
                    category.name, first_id
                ),
                IssueContext::Category { id },
            ));
        } else {
            seen_names.insert(&category.name, category.id);
        }
    }
}

fn validate_annotations(
    document: &AnnotationDocument,
    image_ids: &HashSet<ImageId>,
    category_ids: &HashSet<CategoryId>,
    report: &mut ValidationReport,
) {
    let mut seen_ids: HashMap<AnnotationId, usize> = HashMap::new();

    let image_dims: HashMap<ImageId, (u32, u32)> = document
        .images
        .iter()
        .map(|i| (i.id, (i.width, i.height)))
        .collect();

    for (idx, annotation) in document.annotations.iter().enumerate() {
        let context = || IssueContext::Annotation {
            index: idx,
            id: annotation.id.map(|id| id.as_u64()),
        };

        if let Some(ann_id) = annotation.id {
            if let Some(first_idx) = seen_ids.get(&ann_id) {
                report.add(ValidationIssue::error(
                    IssueCode::DuplicateAnnotationId,
                    format!(
                        "Duplicate annotation ID {} (first seen at index {})",
                        ann_id, first_idx
                    ),
                    context(),
                ));
            } else {
                seen_ids.insert(ann_id, idx);
            }
        }

        if !image_ids.contains(&annotation.image_id) {
            report.add(ValidationIssue::error(
                IssueCode::MissingImageRef,
                format!("References non-existent image {}", annotation.image_id),
                context(),
            ));
        }

        if !category_ids.contains(&annotation.category_id) {
            report.add(ValidationIssue::error(
                IssueCode::MissingCategoryRef,
                format!(
                    "References non-existent category {}",
                    annotation.category_id
                ),
                context(),
            ));
        }

        let bbox = &annotation.bbox;

        if !bbox.is_finite() {
            report.add(ValidationIssue::error(
                IssueCode::BBoxNotFinite,
                format!(
                    "Non-finite box [{}, {}, {}, {}]",
                    bbox.x, bbox.y, bbox.width, bbox.height
                ),
                context(),
            ));
            continue;
        }

        if bbox.width <= 0.0 || bbox.height <= 0.0 {
            report.add(ValidationIssue::error(
                IssueCode::InvalidBBoxSize,
                format!(
                    "Box size {}x{} must be positive",
                    bbox.width, bbox.height
                ),
                context(),
            ));
        }

        if let Some((width, height)) = image_dims.get(&annotation.image_id) {
            let (w, h) = (*width as f64, *height as f64);

            if bbox.x < -BOUNDS_TOLERANCE
                || bbox.y < -BOUNDS_TOLERANCE
                || bbox.xmax() > w + BOUNDS_TOLERANCE
                || bbox.ymax() > h + BOUNDS_TOLERANCE
            {
                report.add(ValidationIssue::warning(
                    IssueCode::BBoxOutOfBounds,
                    format!(
                        "Box [{:.1}, {:.1}, {:.1}, {:.1}] extends outside image bounds {}x{}; labels will fall outside (0, 1]",
                        bbox.x, bbox.y, bbox.width, bbox.height, width, height
                    ),
                    context(),
                ));
            }
        }
    }
}

fn validate_image_files(
    document: &AnnotationDocument,
    images_dir: &std::path::Path,
    report: &mut ValidationReport,
) {
    for image in &document.images {
        let id = image.id.as_u64();
        if image.file_name.is_empty() {
            continue;
        }
        let path = images_dir.join(&image.file_name);

        if !path.is_file() {
            report.add(ValidationIssue::error(
                IssueCode::ImageFileMissing,
                format!("{} does not exist", path.display()),
                IssueContext::Image { id },
            ));
            continue;
        }

        match imagesize::size(&path) {
            Ok(size) => {
                let declared = (image.width as usize, image.height as usize);
                if (size.width, size.height) != declared {
                    report.add(ValidationIssue::error(
                        IssueCode::ImageDimensionMismatch,
                        format!(
                            "Declared {}x{} but {} is {}x{}",
                            image.width,
                            image.height,
                            path.display(),
                            size.width,
                            size.height
                        ),
                        IssueContext::Image { id },
                    ));
                }
            }
            Err(e) => {
                report.add(ValidationIssue::warning(
                    IssueCode::ImageUnreadable,
                    format!("Cannot read header of {}: {e}", path.display()),
                    IssueContext::Image { id },
                ));
            }
        }
    }
}
