//! Fixed geometric augmentation: three rotations and a horizontal mirror.
//!
//! Every genuine source produces exactly one file per [`Variant`], named
//! `<stem><suffix>.<ext>`. Files whose stem already ends in one of the
//! suffixes are augmentation products and are never used as sources, so
//! running the generator over its own output adds nothing.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use image::DynamicImage;
use log::debug;

use super::{load_oriented, save_image};
use crate::config::AugmentSuffixes;
use crate::error::PrepError;
use crate::materialize::TreeTransform;

/// One geometric variant. Rotation angles are counter-clockwise.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Variant {
    Rotate90,
    Rotate180,
    Rotate270,
    MirrorHorizontal,
}

impl Variant {
    pub const ALL: [Variant; 4] = [
        Variant::Rotate90,
        Variant::Rotate180,
        Variant::Rotate270,
        Variant::MirrorHorizontal,
    ];

    /// Applies the variant. Quarter turns swap width and height.
    pub fn apply(self, image: &DynamicImage) -> DynamicImage {
        match self {
            // image-rs rotates clockwise.
            Variant::Rotate90 => image.rotate270(),
            Variant::Rotate180 => image.rotate180(),
            Variant::Rotate270 => image.rotate90(),
            Variant::MirrorHorizontal => image.fliph(),
        }
    }

    /// The file-stem suffix this variant writes under.
    pub fn suffix(self, suffixes: &AugmentSuffixes) -> &str {
        match self {
            Variant::Rotate90 => &suffixes.rot90,
            Variant::Rotate180 => &suffixes.rot180,
            Variant::Rotate270 => &suffixes.rot270,
            Variant::MirrorHorizontal => &suffixes.mirror,
        }
    }
}

/// True when `path`'s stem ends with any augmentation suffix.
pub fn is_augmentation_product(path: &Path, suffixes: &AugmentSuffixes) -> bool {
    let Some(stem) = path.file_stem().and_then(OsStr::to_str) else {
        return false;
    };
    suffixes.all().iter().any(|suffix| stem.ends_with(suffix))
}

/// Output path of `variant` for `source`, placed in `out_dir`.
pub fn variant_path(
    source: &Path,
    out_dir: &Path,
    variant: Variant,
    suffixes: &AugmentSuffixes,
) -> PathBuf {
    let stem = source.file_stem().unwrap_or_default().to_string_lossy();
    let suffix = variant.suffix(suffixes);
    let name = match source.extension() {
        Some(ext) => format!("{stem}{suffix}.{}", ext.to_string_lossy()),
        None => format!("{stem}{suffix}"),
    };
    out_dir.join(name)
}

/// Writes the augmentation variants of single images.
#[derive(Clone, Debug, Default)]
pub struct Augment {
    pub suffixes: AugmentSuffixes,
}

impl Augment {
    /// An augmentation transform using `suffixes` for its outputs.
    pub fn new(suffixes: AugmentSuffixes) -> Self {
        Self { suffixes }
    }

    /// Writes all four variants of `source` into `out_dir`, replacing any
    /// previous versions. The source is turned upright first.
    pub fn augment_file(&self, source: &Path, out_dir: &Path) -> Result<Vec<PathBuf>, PrepError> {
        let image = load_oriented(source)?;

        let mut written = Vec::with_capacity(Variant::ALL.len());
        for variant in Variant::ALL {
            let target = variant_path(source, out_dir, variant, &self.suffixes);
            save_image(&variant.apply(&image), &target)?;
            debug!("wrote {}", target.display());
            written.push(target);
        }
        Ok(written)
    }
}

impl TreeTransform for Augment {
    fn name(&self) -> &'static str {
        "augment"
    }

    fn accepts(&self, path: &Path) -> bool {
        !is_augmentation_product(path, &self.suffixes)
    }

    fn apply(&self, source: &Path, out_dir: &Path) -> Result<Vec<PathBuf>, PrepError> {
        self.augment_file(source, out_dir)
    }
}
