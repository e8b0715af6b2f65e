//! CSV snippet loader.
//!
//! Reads a headed CSV file into [`Snippet`]s. A load is all-or-nothing:
//! either every data row becomes a snippet or a [`DataError`] is returned.

use std::collections::{BTreeSet, HashMap};
use std::fs::File;
use std::io::Read;
use std::path::Path;

use caliper_core::{Snippet, SnippetMetadata};
use csv::{ReaderBuilder, StringRecord, Trim};
use serde::{Deserialize, Serialize};

use crate::error::DataError;

pub const COL_ID: &str = "id";
pub const COL_CATEGORY: &str = "category";
pub const COL_TEXT: &str = "snippet_text";
pub const COL_TOOLS: &str = "tools_required";
pub const COL_PPE: &str = "ppe_required";

/// Columns every input file must carry, in any order.
pub const REQUIRED_COLUMNS: [&str; 5] = [COL_ID, COL_CATEGORY, COL_TEXT, COL_TOOLS, COL_PPE];

/// Cell values treated as a missing id, compared case-insensitively.
const NULL_MARKERS: [&str; 8] = ["", "na", "n/a", "#n/a", "<na>", "nan", "null", "none"];

/// Options for reading the input file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoaderConfig {
    /// Field delimiter. Must be a single ASCII character.
    #[serde(default = "default_delimiter")]
    pub delimiter: char,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            delimiter: default_delimiter(),
        }
    }
}

fn default_delimiter() -> char {
    ','
}

/// Load every snippet from the CSV file at `path`.
pub fn load_snippets(path: &Path, config: &LoaderConfig) -> Result<Vec<Snippet>, DataError> {
    let file_label = path.display().to_string();
    if !path.exists() {
        return Err(DataError::NotFound { file: file_label });
    }

    let file = File::open(path).map_err(|e| DataError::Unreadable {
        file: file_label.clone(),
        line: None,
        reason: e.to_string(),
    })?;

    log::info!("Loading snippets from {}", file_label);
    read_snippets(file, &file_label, config)
}

/// Load snippets from any reader. `file_label` names the source in errors.
pub fn read_snippets<R: Read>(
    reader: R,
    file_label: &str,
    config: &LoaderConfig,
) -> Result<Vec<Snippet>, DataError> {
    let delimiter = delimiter_byte(config.delimiter).ok_or_else(|| DataError::Unreadable {
        file: file_label.to_string(),
        line: None,
        reason: format!("delimiter {:?} is not a single ASCII character", config.delimiter),
    })?;

    let mut csv_reader = ReaderBuilder::new()
        .delimiter(delimiter)
        .trim(Trim::All)
        .has_headers(true)
        .from_reader(reader);

    let headers = csv_reader
        .headers()
        .map_err(|e| unreadable(file_label, &e))?
        .clone();
    if headers.iter().all(str::is_empty) {
        return Err(DataError::Empty {
            file: file_label.to_string(),
        });
    }
    let columns = ColumnMap::from_headers(&headers, file_label)?;

    let mut snippets = Vec::new();
    let mut seen: HashMap<String, u64> = HashMap::new();

    for (i, result) in csv_reader.records().enumerate() {
        let record = result.map_err(|e| unreadable(file_label, &e))?;
        // Header is line 1, so the first data row is line 2.
        let line = record
            .position()
            .map_or(i as u64 + 2, csv::Position::line);

        let id = field(&record, columns.id);
        if is_null_marker(id) {
            return Err(DataError::NullId {
                file: file_label.to_string(),
                line,
            });
        }
        if seen.insert(id.to_string(), line).is_some() {
            return Err(DataError::DuplicateId {
                file: file_label.to_string(),
                id: id.to_string(),
                line,
            });
        }

        snippets.push(Snippet::new(
            id,
            field(&record, columns.text),
            SnippetMetadata::new(
                field(&record, columns.category),
                field(&record, columns.tools),
                field(&record, columns.ppe),
            ),
        ));
    }

    if snippets.is_empty() {
        return Err(DataError::Empty {
            file: file_label.to_string(),
        });
    }

    let categories: BTreeSet<&str> = snippets
        .iter()
        .map(|s| s.metadata.category.as_str())
        .collect();
    log::info!("Loaded {} snippets", snippets.len());
    log::info!(
        "Categories: {}",
        categories.into_iter().collect::<Vec<_>>().join(", ")
    );

    Ok(snippets)
}

/// Positions of the required columns within the header.
struct ColumnMap {
    id: usize,
    category: usize,
    text: usize,
    tools: usize,
    ppe: usize,
}

impl ColumnMap {
    fn from_headers(headers: &StringRecord, file_label: &str) -> Result<Self, DataError> {
        let names: Vec<&str> = headers
            .iter()
            .enumerate()
            .map(|(i, h)| if i == 0 { h.trim_start_matches('\u{feff}') } else { h })
            .collect();
        let position = |column: &str| names.iter().position(|h| *h == column);

        let missing: Vec<String> = REQUIRED_COLUMNS
            .iter()
            .filter(|c| position(**c).is_none())
            .map(|c| (*c).to_string())
            .collect();

        match (
            position(COL_ID),
            position(COL_CATEGORY),
            position(COL_TEXT),
            position(COL_TOOLS),
            position(COL_PPE),
        ) {
            (Some(id), Some(category), Some(text), Some(tools), Some(ppe)) => Ok(Self {
                id,
                category,
                text,
                tools,
                ppe,
            }),
            _ => Err(DataError::MissingColumns {
                file: file_label.to_string(),
                columns: missing,
            }),
        }
    }
}

fn field(record: &StringRecord, column: usize) -> &str {
    record.get(column).unwrap_or_default()
}

fn delimiter_byte(delimiter: char) -> Option<u8> {
    u8::try_from(delimiter).ok().filter(u8::is_ascii)
}

fn is_null_marker(value: &str) -> bool {
    NULL_MARKERS
        .iter()
        .any(|marker| value.eq_ignore_ascii_case(marker))
}

fn unreadable(file_label: &str, err: &csv::Error) -> DataError {
    DataError::Unreadable {
        file: file_label.to_string(),
        line: err.position().map(csv::Position::line),
        reason: err.to_string(),
    }
}
