//! YOLO label-file parsing.
//!
//! One label file per image; each non-empty line is
//! `<class_id> <x_center> <y_center> <width> <height>` with coordinates
//! normalized to the image extent.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use walkdir::WalkDir;

use crate::error::CocodetError;

pub(crate) const LABEL_EXTENSION: &str = "txt";

/// Largest YOLO class id accepted. Categories are numbered densely up to the
/// largest id seen, so an unbounded id would allocate that many categories.
pub const MAX_CLASS_ID: usize = u16::MAX as usize;

/// The five fields of one YOLO label line.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct YoloLabelRow {
    /// Parsed as a float the way the numeric fields are; see [`class_index`](Self::class_index).
    pub class_id: f64,
    pub cx: f64,
    pub cy: f64,
    pub w: f64,
    pub h: f64,
}

impl YoloLabelRow {
    /// The class id as a zero-based index, if it is a whole number in
    /// `0..=MAX_CLASS_ID`.
    pub fn class_index(&self) -> Option<usize> {
        let id = self.class_id;
        (id.is_finite() && id >= 0.0 && id.fract() == 0.0 && id <= MAX_CLASS_ID as f64)
            .then_some(id as usize)
    }
}

/// What a single label line turned out to be.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum LabelLine {
    /// Blank or whitespace only.
    Empty,
    Row(YoloLabelRow),
    /// Not exactly five fields; carries the number found.
    WrongFieldCount(usize),
}

/// Parses one label line.
///
/// A wrong field count is not an error here; the caller decides whether
/// to skip the line or fail. A field that is not a number is an error.
pub fn parse_label_line(
    line: &str,
    file_path: &Path,
    line_num: usize,
) -> Result<LabelLine, CocodetError> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Ok(LabelLine::Empty);
    }

    // Only the first six tokens are kept; the rest are counted, not stored.
    let mut rest = trimmed.split_whitespace();
    let tokens: Vec<&str> = rest.by_ref().take(6).collect();
    let fields = tokens.len() + rest.count();
    if fields != 5 {
        return Ok(LabelLine::WrongFieldCount(fields));
    }

    let parse = |raw: &str, name: &str| {
        raw.parse::<f64>().map_err(|_| CocodetError::LabelParse {
            path: file_path.to_path_buf(),
            line: line_num,
            message: format!("invalid {name} '{raw}'; expected a number"),
        })
    };

    Ok(LabelLine::Row(YoloLabelRow {
        class_id: parse(tokens[0], "class_id")?,
        cx: parse(tokens[1], "x_center")?,
        cy: parse(tokens[2], "y_center")?,
        w: parse(tokens[3], "width")?,
        h: parse(tokens[4], "height")?,
    }))
}

/// Lists `*.txt` files directly inside `labels_dir`, sorted by file name.
/// Symlinked label files are followed.
///
/// The sort order is what assigns image ids, so it must not depend on the
/// order the filesystem happens to return entries in.
pub fn collect_label_files(labels_dir: &Path) -> Result<Vec<PathBuf>, CocodetError> {
    if !labels_dir.is_dir() {
        return Err(CocodetError::LabelsDirInvalid {
            path: labels_dir.to_path_buf(),
            message: "not a directory".to_string(),
        });
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(labels_dir).min_depth(1).max_depth(1) {
        let entry = entry.map_err(|source| CocodetError::LabelsDirInvalid {
            path: labels_dir.to_path_buf(),
            message: format!("failed while listing directory: {source}"),
        })?;

        let is_label = entry
            .path()
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext == LABEL_EXTENSION);
        // `Path::is_file` follows symlinks; `DirEntry::file_type` does not.
        if is_label && entry.path().is_file() {
            files.push(entry.into_path());
        }
    }

    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(files)
}

#[derive(Debug, Deserialize)]
struct DataYaml {
    names: DataYamlNames,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum DataYamlNames {
    Sequence(Vec<String>),
    Mapping(BTreeMap<usize, String>),
}

/// Reads class names indexed by YOLO class id.
///
/// Accepts an Ultralytics `data.yaml` (`.yaml`/`.yml`, `names:` as a list or
/// an index map) or a `classes.txt` with one name per line.
pub fn read_class_names(path: &Path) -> Result<Vec<String>, CocodetError> {
    let data = fs::read_to_string(path).map_err(CocodetError::Io)?;
    let is_yaml = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml"));

    if is_yaml {
        class_names_from_yaml(&data, path)
    } else {
        class_names_from_lines(&data, path)
    }
}

fn class_names_from_yaml(data: &str, path: &Path) -> Result<Vec<String>, CocodetError> {
    let parsed: DataYaml =
        serde_yaml::from_str(data).map_err(|source| CocodetError::ClassNamesInvalid {
            path: path.to_path_buf(),
            message: source.to_string(),
        })?;

    Ok(match parsed.names {
        DataYamlNames::Sequence(names) => names,
        DataYamlNames::Mapping(mapping) => {
            if let Some(&max) = mapping.keys().next_back().filter(|&&max| max > MAX_CLASS_ID) {
                return Err(CocodetError::ClassNamesInvalid {
                    path: path.to_path_buf(),
                    message: format!("class index {max} exceeds {MAX_CLASS_ID}"),
                });
            }
            let len = mapping.keys().next_back().map_or(0, |max| max + 1);
            (0..len)
                .map(|index| match mapping.get(&index) {
                    Some(name) if !name.trim().is_empty() => name.clone(),
                    _ => format!("class_{index}"),
                })
                .collect()
        }
    })
}

/// Trailing blank lines are ignored; a blank line between names is an error.
fn class_names_from_lines(data: &str, path: &Path) -> Result<Vec<String>, CocodetError> {
    let lines: Vec<&str> = data.lines().collect();
    let used = lines
        .iter()
        .rposition(|line| !line.trim().is_empty())
        .map_or(0, |last| last + 1);

    lines[..used]
        .iter()
        .enumerate()
        .map(|(index, line)| {
            let name = line.trim();
            if name.is_empty() {
                Err(CocodetError::ClassNamesInvalid {
                    path: path.to_path_buf(),
                    message: format!("line {} is empty", index + 1),
                })
            } else {
                Ok(name.to_string())
            }
        })
        .collect()
}
