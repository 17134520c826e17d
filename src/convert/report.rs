//! Structured record of what the YOLO -> COCO conversion kept and skipped.
//!
//! The converter skips rather than fails on a missing companion image or a
//! label line with the wrong field count. Each skip is recorded here with a
//! stable code so callers and tests can count them.

use serde::Serialize;
use std::fmt;

/// Summary of one conversion run.
#[derive(Clone, Debug, Default, Serialize)]
pub struct ConversionReport {
    /// Label files found in the labels directory.
    pub label_files: usize,
    /// Counts written to the output document.
    pub output: ConversionCounts,
    pub issues: Vec<ConversionIssue>,
}

impl ConversionReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, issue: ConversionIssue) {
        self.issues.push(issue);
    }

    pub fn warning_count(&self) -> usize {
        self.count_severity(ConversionSeverity::Warning)
    }

    pub fn info_count(&self) -> usize {
        self.count_severity(ConversionSeverity::Info)
    }

    /// Label files dropped because their image was not found.
    pub fn skipped_label_files(&self) -> usize {
        self.count_code(ConversionIssueCode::MissingCompanionImage)
    }

    /// Label lines dropped because they did not have exactly five fields.
    pub fn skipped_lines(&self) -> usize {
        self.count_code(ConversionIssueCode::MalformedLabelLine)
    }

    /// Returns true if any input was dropped.
    pub fn has_skips(&self) -> bool {
        self.warning_count() > 0
    }

    fn count_severity(&self, severity: ConversionSeverity) -> usize {
        self.issues.iter().filter(|i| i.severity == severity).count()
    }

    fn count_code(&self, code: ConversionIssueCode) -> usize {
        self.issues.iter().filter(|i| i.code == code).count()
    }
}

impl fmt::Display for ConversionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "  {} label files -> {} images, {} categories, {} annotations",
            self.label_files, self.output.images, self.output.categories, self.output.annotations
        )?;

        let sections = [
            ("Skipped", ConversionSeverity::Warning),
            ("Notes", ConversionSeverity::Info),
        ];
        for (title, severity) in sections {
            let count = self.count_severity(severity);
            if count == 0 {
                continue;
            }
            writeln!(f)?;
            writeln!(f, "{} ({}):", title, count)?;
            for issue in self.issues.iter().filter(|i| i.severity == severity) {
                writeln!(f, "  - {}", issue.message)?;
            }
        }

        Ok(())
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ConversionCounts {
    pub images: usize,
    pub categories: usize,
    pub annotations: usize,
}

#[derive(Clone, Debug, Serialize)]
pub struct ConversionIssue {
    pub severity: ConversionSeverity,
    pub code: ConversionIssueCode,
    pub message: String,
}

impl ConversionIssue {
    /// Input that was dropped from the output.
    pub fn warning(code: ConversionIssueCode, message: impl Into<String>) -> Self {
        Self {
            severity: ConversionSeverity::Warning,
            code,
            message: message.into(),
        }
    }

    /// A policy the converter applied that changes how the output reads.
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
    Warning,
    Info,
}

/// Stable issue codes. These appear in `--report json` output.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversionIssueCode {
    /// A label file had no image with the expected name; the file was skipped.
    MissingCompanionImage,
    /// A label line did not have exactly five fields; the line was skipped.
    MalformedLabelLine,
    /// YOLO class ids were discarded and every box mapped to one category.
    ClassIdsCollapsed,
    /// Skipped label files left gaps in the image id sequence.
    ImageIdGaps,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_report_has_no_skips() {
        let report = ConversionReport::new();
        assert!(!report.has_skips());
        assert_eq!(report.skipped_label_files(), 0);
        assert_eq!(report.skipped_lines(), 0);
    }

    #[test]
    fn skip_counters_track_codes() {
        let mut report = ConversionReport::new();
        report.add(ConversionIssue::warning(
            ConversionIssueCode::MissingCompanionImage,
            "a.txt: a.png not found",
        ));
        report.add(ConversionIssue::warning(
            ConversionIssueCode::MalformedLabelLine,
            "b.txt:2: 4 fields",
        ));
        report.add(ConversionIssue::warning(
            ConversionIssueCode::MalformedLabelLine,
            "b.txt:3: 6 fields",
        ));
        report.add(ConversionIssue::info(
            ConversionIssueCode::ClassIdsCollapsed,
            "class ids collapsed",
        ));

        assert!(report.has_skips());
        assert_eq!(report.skipped_label_files(), 1);
        assert_eq!(report.skipped_lines(), 2);
        assert_eq!(report.info_count(), 1);
    }

    #[test]
    fn display_lists_skips_and_notes() {
        let mut report = ConversionReport::new();
        report.label_files = 2;
        report.add(ConversionIssue::warning(
            ConversionIssueCode::MissingCompanionImage,
            "missing.txt: missing.png not found",
        ));
        let text = report.to_string();
        assert!(text.contains("2 label files"));
        assert!(text.contains("Skipped (1):"));
        assert!(!text.contains("Notes"));
    }

    #[test]
    fn report_serializes_codes_in_snake_case() {
        let mut report = ConversionReport::new();
        report.add(ConversionIssue::warning(
            ConversionIssueCode::MalformedLabelLine,
            "x",
        ));
        let json = serde_json::to_string(&report).unwrap();
        assert!(json.contains("\"code\":\"malformed_label_line\""));
        assert!(json.contains("\"severity\":\"warning\""));
    }
}
