//! Batch application of a per-file transform over a directory tree.
//!
//! The input tree is listed in full before any work starts, so files written
//! during the run are never picked up by it. Each recognized image is handed
//! to a [`TreeTransform`] together with the output directory that mirrors
//! its relative location. Failures are logged, recorded in the
//! [`BatchReport`] and do not stop the batch.

pub mod report;

pub use report::{BatchReport, SkippedFile};

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use log::{debug, info, warn};
use rayon::prelude::*;
use walkdir::WalkDir;

use crate::config::PipelineConfig;
use crate::error::PrepError;
use crate::fsutil;

/// A per-file transform driven by [`materialize`].
pub trait TreeTransform: Sync {
    /// Short name used in logs and reports.
    fn name(&self) -> &'static str;

    /// Whether a recognized image should be processed at all.
    fn accepts(&self, _path: &Path) -> bool {
        true
    }

    /// Whether the output root must be a different directory from the input
    /// root. Transforms that write under the source's own name set this.
    fn requires_distinct_output(&self) -> bool {
        false
    }

    /// Transforms `source`, writing into `out_dir`. Returns the files written.
    fn apply(&self, source: &Path, out_dir: &Path) -> Result<Vec<PathBuf>, PrepError>;
}

/// How a traversed file is treated.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EntryKind {
    Image,
    Ignored,
}

/// A file found while listing the input tree.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DirectoryEntry {
    pub path: PathBuf,
    /// Path relative to the input root.
    pub relative: PathBuf,
    pub kind: EntryKind,
}

impl DirectoryEntry {
    /// Directory under `output_root` that mirrors this entry's location.
    pub fn output_dir(&self, output_root: &Path) -> PathBuf {
        match self.relative.parent() {
            Some(parent) => output_root.join(parent),
            None => output_root.to_path_buf(),
        }
    }
}

/// Files found under a root, sorted by path.
#[derive(Clone, Debug, Default)]
pub struct TreeListing {
    pub entries: Vec<DirectoryEntry>,
    /// Subtrees that could not be read.
    pub unreadable: Vec<SkippedFile>,
}

/// Lists every file under `root`, classifying it by extension.
///
/// `exclude` names a directory to leave out (an output root nested inside
/// the input root).
pub fn list_tree(
    root: &Path,
    config: &PipelineConfig,
    exclude: Option<&Path>,
) -> Result<TreeListing, PrepError> {
    if !root.is_dir() {
        return Err(PrepError::InputRootMissing {
            path: root.to_path_buf(),
        });
    }

    let mut listing = TreeListing::default();
    let walker = WalkDir::new(root)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| exclude.map_or(true, |ex| e.path() != ex));

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(source) if source.depth() == 0 => {
                return Err(PrepError::Traverse {
                    path: root.to_path_buf(),
                    source,
                });
            }
            Err(source) => {
                let path = source.path().unwrap_or(root).to_path_buf();
                warn!("cannot read {}: {source}", path.display());
                listing.unreadable.push(SkippedFile {
                    path,
                    reason: source.to_string(),
                });
                continue;
            }
        };

        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path().to_path_buf();
        let relative = path.strip_prefix(root).unwrap_or(&path).to_path_buf();
        let kind = match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if config.is_recognized_extension(ext) => EntryKind::Image,
            _ => EntryKind::Ignored,
        };
        listing.entries.push(DirectoryEntry {
            path,
            relative,
            kind,
        });
    }

    Ok(listing)
}

/// Applies `transform` to every recognized image under `input_root`.
///
/// Both roots are resolved before they are compared, so `./raw` and `raw`
/// name the same tree. Returns `Err` only for structural problems (missing
/// input root, invalid configuration, an output root that would overwrite
/// the sources, no worker pool). Per-file failures end up in
/// [`BatchReport::skipped`].
pub fn materialize(
    input_root: &Path,
    output_root: &Path,
    config: &PipelineConfig,
    transform: &dyn TreeTransform,
) -> Result<BatchReport, PrepError> {
    config.validate()?;

    let resolved_input = fsutil::resolve_path(input_root)?;
    let resolved_output = fsutil::resolve_path(output_root)?;
    if resolved_input == resolved_output && transform.requires_distinct_output() {
        return Err(PrepError::InvalidConfig(format!(
            "{} output root must differ from the input root ({})",
            transform.name(),
            resolved_input.display()
        )));
    }

    // The walk yields paths spelled from `input_root`, so the excluded
    // directory is spelled the same way.
    let exclude = match resolved_output.strip_prefix(&resolved_input) {
        Ok(nested) if !nested.as_os_str().is_empty() => Some(input_root.join(nested)),
        _ => None,
    };
    let listing = list_tree(input_root, config, exclude.as_deref())?;

    let mut report = BatchReport::new(transform.name(), input_root, output_root);
    report.skipped.extend(listing.unreadable);

    let mut work = Vec::new();
    for entry in &listing.entries {
        match entry.kind {
            EntryKind::Ignored => {
                debug!("ignoring {}", entry.path.display());
                report.ignored += 1;
            }
            EntryKind::Image if !transform.accepts(&entry.path) => {
                debug!("excluding {}", entry.path.display());
                report.excluded += 1;
            }
            EntryKind::Image => work.push(entry),
        }
    }

    let total = work.len();
    info!(
        "{}: {} image(s) to process under {}",
        transform.name(),
        total,
        input_root.display()
    );

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(config.concurrency)
        .build()?;
    let done = AtomicUsize::new(0);

    let results: Vec<(&DirectoryEntry, Result<Vec<PathBuf>, PrepError>)> = pool.install(|| {
        work.par_iter()
            .map(|entry| {
                let result = transform.apply(&entry.path, &entry.output_dir(output_root));
                let n = done.fetch_add(1, Ordering::Relaxed) + 1;
                if config.progress_every > 0 && n % config.progress_every == 0 {
                    info!("{}: {n}/{total} files", transform.name());
                }
                (*entry, result)
            })
            .collect()
    });

    for (entry, result) in results {
        match result {
            Ok(outputs) => {
                report.processed += 1;
                report.outputs += outputs.len();
            }
            Err(e) => {
                warn!("skipping {}: {e}", entry.path.display());
                report.skipped.push(SkippedFile {
                    path: entry.path.clone(),
                    reason: e.to_string(),
                });
            }
        }
    }

    info!(
        "{}: {} processed, {} skipped, {} ignored",
        transform.name(),
        report.processed,
        report.skipped_count(),
        report.ignored
    );
    Ok(report)
}
