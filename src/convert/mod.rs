//! COCO to YOLO dataset conversion.
//!
//! For each split the converter reads `<annotations_dir>/<split>.json`,
//! builds a dense [`CategoryMap`] over the declared categories, normalizes
//! every box against its image, and then writes the split:
//!
//! - one label file per annotated image under `<split>/labels/`;
//! - a copy of every declared image under `<split>/images/`;
//! - `data.yaml` in the output root when the split is the primary one.
//!
//! All labels of a document are computed before anything is written, so a
//! malformed document leaves no partial output behind.

pub mod report;

pub use report::{
    ConversionCounts, ConversionIssue, ConversionIssueCode, ConversionReport, ConversionSeverity,
    DatasetReport, SplitOutcome,
};

use std::collections::BTreeMap;
use std::path::Path;

use log::{debug, error, info, warn};

use crate::config::ConvertConfig;
use crate::error::PrepError;
use crate::fsutil;
use crate::ir::io_coco_json::read_coco_json;
use crate::ir::io_yolo::{self, DatasetManifest, SplitLayout, MANIFEST_FILE_NAME};
use crate::ir::{AnnotationDocument, CategoryMap, NormalizedLabel};

/// Labels of one document, keyed by label file name.
#[derive(Clone, Debug, Default)]
pub struct LabelPlan {
    pub files: BTreeMap<String, Vec<NormalizedLabel>>,
    /// Class names in dense-id order.
    pub names: Vec<String>,
    pub issues: Vec<ConversionIssue>,
}

/// Computes every label of `document` without touching the file system.
///
/// Fails on the first annotation that references an unknown image or
/// category, or an image with a zero dimension.
pub fn plan_labels(document: &AnnotationDocument, source: &Path) -> Result<LabelPlan, PrepError> {
    let classes = CategoryMap::build(document.categories.iter().map(|c| c.id)).map_err(|_| {
        PrepError::EmptyCategorySet {
            path: source.to_path_buf(),
        }
    })?;

    let category_names = document.category_names();
    let names = classes
        .iter()
        .map(|(id, _)| category_names.get(id).copied().unwrap_or_default().to_string())
        .collect();

    let images = document.image_index();
    let mut plan = LabelPlan {
        names,
        ..Default::default()
    };

    // Label files are flattened by base name; the last image declaring a
    // name owns it.
    let mut owners = BTreeMap::new();
    for image in &document.images {
        if let Some(previous) = owners.insert(image.base_name(), image.id) {
            if previous != image.id {
                plan.issues.push(ConversionIssue::warning(
                    ConversionIssueCode::DuplicateBaseName,
                    format!(
                        "images {} and {} share the file name '{}'; image {} wins",
                        previous,
                        image.id,
                        image.base_name(),
                        image.id
                    ),
                ));
            }
        }
    }

    for (index, ann) in document.annotations.iter().enumerate() {
        let image = images
            .get(&ann.image_id)
            .ok_or_else(|| PrepError::DanglingImageReference {
                annotation: ann.describe(index),
                image_id: ann.image_id,
            })?;
        let class_id = classes
            .get(&ann.category_id)
            .ok_or_else(|| PrepError::UnknownCategory {
                annotation: ann.describe(index),
                category_id: ann.category_id,
            })?;
        let bbox = image.normalize(&ann.bbox)?;

        if owners.get(image.base_name()) != Some(&image.id) {
            continue;
        }

        if !bbox.is_within_unit() {
            plan.issues.push(ConversionIssue::warning(
                ConversionIssueCode::LabelOutOfRange,
                format!(
                    "annotation {} on '{}' normalizes outside (0, 1]: {:?}",
                    ann.describe(index),
                    image.file_name,
                    bbox
                ),
            ));
        }

        plan.files
            .entry(image.label_file_name())
            .or_default()
            .push(NormalizedLabel { class_id, bbox });
    }

    Ok(plan)
}

/// Converts one split whose annotation document exists.
pub fn convert_split(config: &ConvertConfig, split: &str) -> Result<ConversionReport, PrepError> {
    let source = config.annotation_path(split);
    let document = read_coco_json(&source)?;
    let plan = plan_labels(&document, &source)?;

    let mut report = ConversionReport::new(split, &source);
    report.counts.images = document.images.len();
    report.counts.categories = plan.names.len();
    report.counts.annotations = document.annotations.len();

    let layout = SplitLayout::new(&config.output_root, split);
    layout.create_dirs()?;

    for (file_name, labels) in &plan.files {
        let path = layout.labels_dir.join(file_name);
        io_yolo::write_label_file(&path, labels)?;
        debug!("{split}: wrote {} label(s) to {}", labels.len(), path.display());
    }
    report.counts.label_files = plan.files.len();

    for image in &document.images {
        let file_name = image.label_file_name();
        if plan.files.contains_key(&file_name) {
            continue;
        }
        let path = layout.labels_dir.join(&file_name);
        if fsutil::remove_if_exists(&path)? {
            debug!("{split}: removed stale label file {}", path.display());
            report.counts.labels_removed += 1;
        }
    }

    for issue in plan.issues {
        warn!("{split}: {}", issue.message);
        report.add(issue);
    }

    for image in &document.images {
        let src = config.images_dir.join(&image.file_name);
        let dst = layout.images_dir.join(image.base_name());
        match fsutil::copy_atomic(&src, &dst) {
            Ok(_) => report.counts.images_copied += 1,
            Err(e) => {
                warn!("{split}: skipping image {}: {e}", src.display());
                report.counts.images_skipped += 1;
                report.add(ConversionIssue::warning(
                    ConversionIssueCode::ImageCopyFailed,
                    format!("image {} was not copied: {e}", image.id),
                ));
            }
        }
    }

    let manifest_path = config.output_root.join(MANIFEST_FILE_NAME);
    if split == config.primary_split {
        let output_root = fsutil::resolve_path(&config.output_root)?;
        let manifest = DatasetManifest::new(&output_root, plan.names);
        io_yolo::write_manifest(&manifest_path, &manifest)?;
        report.add(ConversionIssue::info(
            ConversionIssueCode::ManifestWritten,
            format!(
                "wrote {} with {} class(es)",
                manifest_path.display(),
                manifest.nc
            ),
        ));
    } else if manifest_path.is_file() {
        check_manifest_classes(&manifest_path, &plan.names, &mut report);
    }

    Ok(report)
}

fn check_manifest_classes(manifest_path: &Path, names: &[String], report: &mut ConversionReport) {
    match io_yolo::read_manifest(manifest_path) {
        Ok(manifest) if manifest.names != names => {
            let issue = ConversionIssue::warning(
                ConversionIssueCode::ManifestClassMismatch,
                format!(
                    "{} lists classes {:?} but this split declares {:?}; class ids will disagree",
                    manifest_path.display(),
                    manifest.names,
                    names
                ),
            );
            warn!("{}: {}", report.split, issue.message);
            report.add(issue);
        }
        Ok(_) => {}
        Err(e) => {
            warn!("{}: {e}", report.split);
            report.add(ConversionIssue::warning(
                ConversionIssueCode::ManifestUnreadable,
                e.to_string(),
            ));
        }
    }
}

/// Converts every configured split.
///
/// The primary split runs first so the others are compared against a fresh
/// manifest. A split without a document is skipped; a split that fails is
/// recorded and does not stop its siblings. Only a missing input root or an
/// invalid configuration returns `Err`.
pub fn convert_dataset(config: &ConvertConfig) -> Result<DatasetReport, PrepError> {
    config.validate()?;
    for root in [&config.annotations_dir, &config.images_dir] {
        if !root.is_dir() {
            return Err(PrepError::InputRootMissing { path: root.clone() });
        }
    }

    let mut order: Vec<&String> = config
        .splits
        .iter()
        .filter(|s| **s == config.primary_split)
        .collect();
    order.extend(config.splits.iter().filter(|s| **s != config.primary_split));

    let mut dataset = DatasetReport::default();
    for split in order {
        let source = config.annotation_path(split);
        if !source.is_file() {
            warn!("{split}: {} not found, skipped", source.display());
            dataset.splits.push(SplitOutcome::Skipped {
                split: split.clone(),
                source,
            });
            continue;
        }

        match convert_split(config, split) {
            Ok(report) => {
                info!(
                    "{split}: {} label file(s), {} image(s) copied, {} skipped",
                    report.counts.label_files, report.counts.images_copied, report.counts.images_skipped
                );
                dataset.splits.push(SplitOutcome::Converted { report });
            }
            Err(e) => {
                error!("{split}: conversion failed: {e}");
                dataset.splits.push(SplitOutcome::Failed {
                    split: split.clone(),
                    error: e.to_string(),
                });
            }
        }
    }

    Ok(dataset)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{AnnotationRecord, BBoxXYWH, CategoryRecord, ImageRecord};

    fn fox_deer_document() -> AnnotationDocument {
        AnnotationDocument {
            images: vec![
                ImageRecord::new(1u64, "A.jpg", 100, 200),
                ImageRecord::new(2u64, "B.jpg", 50, 50),
            ],
            annotations: vec![AnnotationRecord::new(
                1u64,
                7u64,
                BBoxXYWH::new(10.0, 20.0, 30.0, 40.0),
            )],
            categories: vec![
                CategoryRecord::new(7u64, "fox"),
                CategoryRecord::new(3u64, "deer"),
            ],
        }
    }

    #[test]
    fn plan_remaps_classes_and_skips_unannotated_images() {
        let plan = plan_labels(&fox_deer_document(), Path::new("train.json")).expect("plan");

        assert_eq!(plan.names, vec!["deer", "fox"]);
        assert_eq!(plan.files.len(), 1);
        let labels = &plan.files["A.txt"];
        assert_eq!(labels.len(), 1);
        assert_eq!(io_yolo::format_label_line(&labels[0]), "1 0.25 0.2 0.3 0.2");
        assert!(plan.issues.is_empty());
    }

    #[test]
    fn dangling_image_fails_plan() {
        let mut doc = fox_deer_document();
        doc.annotations[0].image_id = 9u64.into();
        let err = plan_labels(&doc, Path::new("val.json")).unwrap_err();
        assert!(matches!(err, PrepError::DanglingImageReference { .. }));
    }

    #[test]
    fn undeclared_category_fails_plan() {
        let mut doc = fox_deer_document();
        doc.annotations[0].category_id = 4u64.into();
        let err = plan_labels(&doc, Path::new("val.json")).unwrap_err();
        assert!(matches!(err, PrepError::UnknownCategory { .. }));
    }

    #[test]
    fn empty_categories_fail_plan() {
        let mut doc = fox_deer_document();
        doc.categories.clear();
        let err = plan_labels(&doc, Path::new("train.json")).unwrap_err();
        assert!(matches!(err, PrepError::EmptyCategorySet { .. }));
    }

    #[test]
    fn zero_sized_annotated_image_fails_plan() {
        let mut doc = fox_deer_document();
        doc.images[0].width = 0;
        let err = plan_labels(&doc, Path::new("train.json")).unwrap_err();
        assert!(matches!(err, PrepError::InvalidImageDimensions { .. }));
    }

    #[test]
    fn out_of_range_box_is_kept_and_flagged() {
        let mut doc = fox_deer_document();
        doc.annotations[0].bbox = BBoxXYWH::new(90.0, 0.0, 40.0, 10.0);
        let plan = plan_labels(&doc, Path::new("train.json")).expect("plan");

        assert!(plan.files["A.txt"][0].bbox.cx > 1.0);
        assert_eq!(plan.issues.len(), 1);
        assert_eq!(plan.issues[0].code, ConversionIssueCode::LabelOutOfRange);
    }

    #[test]
    fn boxes_of_one_image_share_a_file() {
        let mut doc = fox_deer_document();
        doc.annotations.push(AnnotationRecord::new(
            1u64,
            3u64,
            BBoxXYWH::new(0.0, 0.0, 100.0, 200.0),
        ));
        let plan = plan_labels(&doc, Path::new("train.json")).expect("plan");
        let lines: Vec<_> = plan.files["A.txt"]
            .iter()
            .map(io_yolo::format_label_line)
            .collect();
        assert_eq!(lines, vec!["1 0.25 0.2 0.3 0.2", "0 0.5 0.5 1 1"]);
    }

    #[test]
    fn duplicate_base_names_keep_the_later_image() {
        let mut doc = fox_deer_document();
        doc.images.push(ImageRecord::new(3u64, "other/A.jpg", 10, 10));
        let plan = plan_labels(&doc, Path::new("train.json")).expect("plan");

        assert!(!plan.files.contains_key("A.txt"));
        assert_eq!(plan.issues[0].code, ConversionIssueCode::DuplicateBaseName);
    }
}
