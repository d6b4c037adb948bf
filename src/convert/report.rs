//! Reports produced by COCO to YOLO conversion.
//!
//! A [`ConversionReport`] describes one split; a [`DatasetReport`] collects
//! the outcome of every split requested in a run.

use serde::Serialize;
use std::fmt;
use std::path::PathBuf;

/// What happened while converting one split.
#[derive(Clone, Debug, Default, Serialize)]
pub struct ConversionReport {
    pub split: String,
    /// The annotation document that was read.
    pub source: PathBuf,
    pub counts: ConversionCounts,
    pub issues: Vec<ConversionIssue>,
}

impl ConversionReport {
    /// An empty report for `split`, read from `source`.
    pub fn new(split: impl Into<String>, source: impl Into<PathBuf>) -> Self {
        Self {
            split: split.into(),
            source: source.into(),
            ..Default::default()
        }
    }

    /// Records an issue.
    pub fn add(&mut self, issue: ConversionIssue) {
        self.issues.push(issue);
    }

    /// Number of warning-level issues.
    pub fn warning_count(&self) -> usize {
        self.issues
            .iter()
            .filter(|i| i.severity == ConversionSeverity::Warning)
            .count()
    }

    /// Number of info-level issues.
    pub fn info_count(&self) -> usize {
        self.issues
            .iter()
            .filter(|i| i.severity == ConversionSeverity::Info)
            .count()
    }

    /// Number of issues carrying `code`.
    pub fn count_code(&self, code: ConversionIssueCode) -> usize {
        self.issues.iter().filter(|i| i.code == code).count()
    }
}

impl fmt::Display for ConversionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let c = &self.counts;
        writeln!(
            f,
            "  {} images, {} categories, {} annotations",
            c.images, c.categories, c.annotations
        )?;
        writeln!(
            f,
            "  output: {} label files, {} images copied, {} images skipped",
            c.label_files, c.images_copied, c.images_skipped
        )?;
        if c.labels_removed > 0 {
            writeln!(f, "  removed {} stale label file(s)", c.labels_removed)?;
        }

        let warnings = self.warning_count();
        if warnings > 0 {
            writeln!(f)?;
            writeln!(f, "Warnings ({}):", warnings)?;
            for issue in self
                .issues
                .iter()
                .filter(|i| i.severity == ConversionSeverity::Warning)
            {
                writeln!(f, "  - {}", issue.message)?;
            }
        }

        let infos = self.info_count();
        if infos > 0 {
            writeln!(f)?;
            writeln!(f, "Notes ({}):", infos)?;
            for issue in self
                .issues
                .iter()
                .filter(|i| i.severity == ConversionSeverity::Info)
            {
                writeln!(f, "  - {}", issue.message)?;
            }
        }

        Ok(())
    }
}

/// Input and output counts for one split.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ConversionCounts {
    pub images: usize,
    /// Size of the dense class range.
    pub categories: usize,
    pub annotations: usize,
    pub label_files: usize,
    /// Label files from an earlier run whose image no longer has boxes.
    pub labels_removed: usize,
    pub images_copied: usize,
    pub images_skipped: usize,
}

#[derive(Clone, Debug, Serialize)]
pub struct ConversionIssue {
    pub severity: ConversionSeverity,
    pub code: ConversionIssueCode,
    pub message: String,
}

impl ConversionIssue {
    /// A warning-level issue.
    pub fn warning(code: ConversionIssueCode, message: impl Into<String>) -> Self {
        Self {
            severity: ConversionSeverity::Warning,
            code,
            message: message.into(),
        }
    }

    /// An info-level issue.
    pub fn info(code: ConversionIssueCode, message: impl Into<String>) -> Self {
        Self {
            severity: ConversionSeverity::Info,
            code,
            message: message.into(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversionSeverity {
    /// The output may not match what the training library expects.
    Warning,
    /// A note about what the run did.
    Info,
}

/// Stable issue codes; part of the JSON report schema.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversionIssueCode {
    /// A normalized value fell outside `(0, 1]` and was written unchanged.
    LabelOutOfRange,
    /// A source image could not be copied into the split.
    ImageCopyFailed,
    /// Two images share a base name; the later declaration wins.
    DuplicateBaseName,
    /// An existing `data.yaml` lists different class names than this split.
    ManifestClassMismatch,
    /// An existing `data.yaml` could not be read for comparison.
    ManifestUnreadable,
    /// This split wrote `data.yaml`.
    ManifestWritten,
}

/// Outcome of one requested split.
#[derive(Clone, Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SplitOutcome {
    Converted {
        report: ConversionReport,
    },
    /// No annotation document exists for the split.
    Skipped {
        split: String,
        source: PathBuf,
    },
    Failed {
        split: String,
        error: String,
    },
}

impl SplitOutcome {
    /// The split this outcome belongs to.
    pub fn split(&self) -> &str {
        match self {
            SplitOutcome::Converted { report } => &report.split,
            SplitOutcome::Skipped { split, .. } | SplitOutcome::Failed { split, .. } => split,
        }
    }
}

/// Outcome of every split in a conversion run, in processing order.
#[derive(Clone, Debug, Default, Serialize)]
pub struct DatasetReport {
    pub splits: Vec<SplitOutcome>,
}

impl DatasetReport {
    /// Names of the splits that failed, in processing order.
    pub fn failed_splits(&self) -> Vec<String> {
        self.splits
            .iter()
            .filter(|o| matches!(o, SplitOutcome::Failed { .. }))
            .map(|o| o.split().to_string())
            .collect()
    }

    /// Reports of the splits that converted.
    pub fn converted(&self) -> impl Iterator<Item = &ConversionReport> {
        self.splits.iter().filter_map(|o| match o {
            SplitOutcome::Converted { report } => Some(report),
            _ => None,
        })
    }

    /// The report for `split`, if it was converted.
    pub fn split_report(&self, split: &str) -> Option<&ConversionReport> {
        self.converted().find(|r| r.split == split)
    }
}

impl fmt::Display for DatasetReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, outcome) in self.splits.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            match outcome {
                SplitOutcome::Converted { report } => {
                    writeln!(f, "[{}] converted from {}", report.split, report.source.display())?;
                    write!(f, "{report}")?;
                }
                SplitOutcome::Skipped { split, source } => {
                    writeln!(f, "[{split}] skipped: {} not found", source.display())?;
                }
                SplitOutcome::Failed { split, error } => {
                    writeln!(f, "[{split}] FAILED: {error}")?;
                }
            }
        }
        Ok(())
    }
}
