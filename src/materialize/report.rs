//! Summary of one tree materialization batch.

use serde::Serialize;
use std::fmt;
use std::path::PathBuf;

/// Counts and per-file failures of a batch run.
#[derive(Clone, Debug, Default, Serialize)]
pub struct BatchReport {
    /// Transform name (`letterbox`, `augment`).
    pub operation: String,
    pub input_root: PathBuf,
    pub output_root: PathBuf,
    /// Source images transformed successfully.
    pub processed: usize,
    /// Files written across all processed sources.
    pub outputs: usize,
    /// Files without a recognized image extension.
    pub ignored: usize,
    /// Recognized images the transform declined as sources.
    pub excluded: usize,
    pub skipped: Vec<SkippedFile>,
}

/// A file that failed and was left behind.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SkippedFile {
    pub path: PathBuf,
    pub reason: String,
}

impl BatchReport {
    /// An empty report for one run of `operation`.
    pub fn new(
        operation: impl Into<String>,
        input_root: impl Into<PathBuf>,
        output_root: impl Into<PathBuf>,
    ) -> Self {
        Self {
            operation: operation.into(),
            input_root: input_root.into(),
            output_root: output_root.into(),
            ..Default::default()
        }
    }

    /// Number of files that could not be processed.
    pub fn skipped_count(&self) -> usize {
        self.skipped.len()
    }
}

impl fmt::Display for BatchReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{}: {} -> {}",
            self.operation,
            self.input_root.display(),
            self.output_root.display()
        )?;
        writeln!(
            f,
            "  {} processed, {} skipped, {} ignored, {} excluded, {} file(s) written",
            self.processed,
            self.skipped.len(),
            self.ignored,
            self.excluded,
            self.outputs
        )?;

        if !self.skipped.is_empty() {
            writeln!(f)?;
            writeln!(f, "Skipped ({}):", self.skipped.len())?;
            for file in &self.skipped {
                writeln!(f, "  - {}: {}", file.path.display(), file.reason)?;
            }
        }
        Ok(())
    }
}
