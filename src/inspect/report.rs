//! Inspection report types and terminal formatting.

use serde::Serialize;
use std::fmt;

#[derive(Clone, Debug, Serialize)]
pub struct InspectReport {
    pub summary: InspectSummary,
    /// Every declared category plus any id only referenced by annotations.
    pub per_category: Vec<CategoryCount>,
    /// File names of images with no annotations.
    pub unannotated_images: Vec<String>,
    /// File names not found under the image directory; `None` when not checked.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub missing_files: Option<Vec<String>>,
}

#[derive(Clone, Debug, Default, Serialize)]
pub struct InspectSummary {
    pub images: usize,
    pub categories: usize,
    pub annotations: usize,
    pub crowd_annotations: usize,
    pub out_of_bounds_boxes: usize,
    /// Zero-area or inverted boxes.
    pub degenerate_boxes: usize,
}

#[derive(Clone, Debug, Serialize)]
pub struct CategoryCount {
    pub id: u64,
    pub name: String,
    pub annotations: usize,
}

impl fmt::Display for InspectReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = &self.summary;
        writeln!(f, "Summary")?;
        writeln!(f, "  Images:        {:>8}", format_number(s.images))?;
        writeln!(f, "  Categories:    {:>8}", format_number(s.categories))?;
        writeln!(f, "  Annotations:   {:>8}", format_number(s.annotations))?;
        writeln!(f, "  Crowd:         {:>8}", format_number(s.crowd_annotations))?;
        writeln!(f, "  Out of bounds: {:>8}", format_number(s.out_of_bounds_boxes))?;
        writeln!(f, "  Degenerate:    {:>8}", format_number(s.degenerate_boxes))?;
        writeln!(f)?;

        writeln!(f, "Annotations per category")?;
        if self.per_category.is_empty() {
            writeln!(f, "  (none)")?;
        }
        for cat in &self.per_category {
            writeln!(
                f,
                "  {:>4}  {:<20} {:>8}",
                cat.id,
                cat.name,
                format_number(cat.annotations)
            )?;
        }

        if !self.unannotated_images.is_empty() {
            writeln!(f)?;
            writeln!(
                f,
                "Images without annotations ({}):",
                self.unannotated_images.len()
            )?;
            for name in &self.unannotated_images {
                writeln!(f, "  - {name}")?;
            }
        }

        if let Some(missing) = self.missing_files.as_ref().filter(|m| !m.is_empty()) {
            writeln!(f)?;
            writeln!(f, "Missing image files ({}):", missing.len())?;
            for name in missing {
                writeln!(f, "  - {name}")?;
            }
        }
        Ok(())
    }
}

/// Formats a count with thousands separators.
fn format_number(n: usize) -> String {
    let s = n.to_string();
    let mut result = String::new();
    for (i, c) in s.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            result.push(',');
        }
        result.push(c);
    }
    result.chars().rev().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_thousands() {
        assert_eq!(format_number(7), "7");
        assert_eq!(format_number(1234567), "1,234,567");
    }

    #[test]
    fn display_lists_unannotated_images() {
        let report = InspectReport {
            summary: InspectSummary {
                images: 1,
                ..Default::default()
            },
            per_category: vec![],
            unannotated_images: vec!["b.png".to_string()],
            missing_files: None,
        };
        let text = report.to_string();
        assert!(text.contains("Images without annotations (1):"));
        assert!(text.contains("  - b.png"));
        assert!(!text.contains("Missing image files"));
    }
}
