//! Validation report types for structured error reporting.
//!
//! Reports can be printed for people (`Display`) or serialized to JSON for
//! scripts.

use serde::Serialize;
use std::fmt;

/// The result of validating an annotation document.
#[derive(Clone, Debug, Default, Serialize)]
pub struct ValidationReport {
    pub issues: Vec<ValidationIssue>,
}

impl ValidationReport {
    /// An empty report.
    pub fn new() -> Self {
        Self { issues: Vec::new() }
    }

    /// Records an issue.
    pub fn add(&mut self, issue: ValidationIssue) {
        self.issues.push(issue);
    }

    /// Number of error-level issues.
    pub fn error_count(&self) -> usize {
        self.issues
            .iter()
            .filter(|i| i.severity == Severity::Error)
            .count()
    }

    /// Number of warning-level issues.
    pub fn warning_count(&self) -> usize {
        self.issues
            .iter()
            .filter(|i| i.severity == Severity::Warning)
            .count()
    }

    /// Returns true if there are no errors.
    pub fn is_ok(&self) -> bool {
        self.error_count() == 0
    }

    /// Returns true if there are no issues at all.
    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }

    /// Whether any issue carries `code`.
    pub fn has_code(&self, code: IssueCode) -> bool {
        self.issues.iter().any(|i| i.code == code)
    }

    /// JSON form with counts, for `--output json`.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        #[derive(Serialize)]
        struct JsonReport<'a> {
            error_count: usize,
            warning_count: usize,
            issues: &'a [ValidationIssue],
        }

        serde_json::to_string_pretty(&JsonReport {
            error_count: self.error_count(),
            warning_count: self.warning_count(),
            issues: &self.issues,
        })
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.issues.is_empty() {
            return writeln!(f, "Validation passed: no issues found");
        }

        writeln!(
            f,
            "Validation completed with {} error(s) and {} warning(s):",
            self.error_count(),
            self.warning_count()
        )?;
        writeln!(f)?;

        for issue in &self.issues {
            writeln!(f, "  {}", issue)?;
        }

        Ok(())
    }
}

/// A single validation issue (error or warning).
#[derive(Clone, Debug, Serialize)]
pub struct ValidationIssue {
    pub severity: Severity,

    /// A stable code for the issue type.
    pub code: IssueCode,

    pub message: String,

    /// Where the issue occurred.
    pub context: IssueContext,
}

impl ValidationIssue {
    /// Creates an issue.
    pub fn new(
        severity: Severity,
        code: IssueCode,
        message: impl Into<String>,
        context: IssueContext,
    ) -> Self {
        Self {
            severity,
            code,
            message: message.into(),
            context,
        }
    }

    /// An error-level issue.
    pub fn error(code: IssueCode, message: impl Into<String>, context: IssueContext) -> Self {
        Self::new(Severity::Error, code, message, context)
    }

    /// A warning-level issue.
    pub fn warning(code: IssueCode, message: impl Into<String>, context: IssueContext) -> Self {
        Self::new(Severity::Warning, code, message, context)
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let severity = match self.severity {
            Severity::Error => "ERROR",
            Severity::Warning => "WARN ",
        };
        write!(
            f,
            "[{}] {:?} in {}: {}",
            severity, self.code, self.context, self.message
        )
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Conversion still works but the output may be wrong.
    Warning,
    /// Conversion of this document would fail or produce invalid labels.
    Error,
}

/// A stable code identifying the type of validation issue.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum IssueCode {
    // ID uniqueness
    DuplicateImageId,
    DuplicateAnnotationId,
    DuplicateCategoryId,

    // References
    MissingImageRef,
    MissingCategoryRef,

    // Images
    /// Zero width or height.
    InvalidImageDimensions,
    EmptyFileName,
    /// Two images flatten to the same output file name.
    DuplicateBaseName,
    /// `file_name` does not exist under the image root.
    ImageFileMissing,
    /// The header could not be read.
    ImageUnreadable,
    /// Declared size differs from the file on disk.
    ImageDimensionMismatch,

    // Categories
    /// No categories declared; no class map can be built.
    EmptyCategorySet,
    EmptyCategoryName,
    DuplicateCategoryName,

    // Bounding boxes
    /// NaN or infinite coordinates.
    BBoxNotFinite,
    /// Width or height is zero or negative.
    InvalidBBoxSize,
    BBoxOutOfBounds,
}

/// Where a validation issue occurred.
#[derive(Clone, Debug, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum IssueContext {
    Document,
    Image { id: u64 },
    /// `index` is the position in the document; `id` is present when the
    /// document carries annotation ids.
    Annotation { index: usize, id: Option<u64> },
    Category { id: u64 },
}

impl fmt::Display for IssueContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IssueContext::Document => write!(f, "document"),
            IssueContext::Image { id } => write!(f, "image {}", id),
            IssueContext::Annotation { id: Some(id), .. } => write!(f, "annotation {}", id),
            IssueContext::Annotation { index, id: None } => write!(f, "annotation #{}", index),
            IssueContext::Category { id } => write!(f, "category {}", id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn context_prefers_annotation_id() {
        let with_id = IssueContext::Annotation {
            index: 3,
            id: Some(40),
        };
        let without = IssueContext::Annotation { index: 3, id: None };
        assert_eq!(with_id.to_string(), "annotation 40");
        assert_eq!(without.to_string(), "annotation #3");
    }

    #[test]
    fn json_includes_counts_and_codes() {
        let mut report = ValidationReport::new();
        report.add(ValidationIssue::error(
            IssueCode::MissingImageRef,
            "References non-existent image 9",
            IssueContext::Annotation { index: 0, id: None },
        ));
        let json = report.to_json().unwrap();
        assert!(json.contains("\"error_count\": 1"), "{json}");
        assert!(json.contains("\"code\": \"MissingImageRef\""), "{json}");
        assert!(json.contains("\"kind\": \"annotation\""), "{json}");
    }
}
