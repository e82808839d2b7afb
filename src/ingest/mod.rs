#[cfg(test)]
mod tests;

use serde_json::Value;
use std::fs;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, warn};

/// Hard ceiling on upload size (100 MiB)
pub const MAX_FILE_SIZE_BYTES: u64 = 100 * 1024 * 1024;

/// Number of data rows kept in the mapping preview
pub const PREVIEW_ROWS: usize = 100;

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("unsupported file format: {0} (expected .csv, .tsv, .txt, or .json)")]
    UnsupportedFormat(String),

    #[error("file is too large: {size} bytes (limit {limit} bytes)")]
    SizeExceeded { size: u64, limit: u64 },

    #[error("file is empty")]
    EmptyFile,

    #[error("invalid JSON shape: {0}")]
    InvalidJsonShape(String),

    #[error("failed to read file: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Csv,
    Tsv,
    Json,
}

impl SourceFormat {
    /// Determine the format from a file name's extension. `.txt` is
    /// treated as tab-separated.
    #[inline]
    pub fn from_file_name(name: &str) -> Result<Self, UploadError> {
        let extension = name
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_lowercase())
            .unwrap_or_default();

        match extension.as_str() {
            "csv" => Ok(Self::Csv),
            "tsv" | "txt" => Ok(Self::Tsv),
            "json" => Ok(Self::Json),
            _ => Err(UploadError::UnsupportedFormat(name.to_string())),
        }
    }

    #[inline]
    pub fn delimiter(self) -> Option<u8> {
        match self {
            Self::Csv => Some(b','),
            Self::Tsv => Some(b'\t'),
            Self::Json => None,
        }
    }
}

impl std::fmt::Display for SourceFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Csv => f.write_str("csv"),
            Self::Tsv => f.write_str("tsv"),
            Self::Json => f.write_str("json"),
        }
    }
}

/// Uniform tabular shape produced from an upload.
///
/// `rows` may be capped to a preview; `total_rows` always reflects the
/// full dataset. Replaced wholesale on a new upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedFile {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
    pub total_rows: usize,
    pub format: SourceFormat,
}

impl ParsedFile {
    /// First data row, used for type sniffing during mapping suggestion
    #[inline]
    pub fn sample_row(&self) -> Option<&[String]> {
        self.rows.first().map(Vec::as_slice)
    }
}

/// Parse an upload for the mapping step, keeping only a preview of rows
#[inline]
pub fn parse_preview(
    path: &Path,
    max_bytes: u64,
    preview_rows: usize,
) -> Result<ParsedFile, UploadError> {
    parse_path(path, max_bytes, Some(preview_rows))
}

/// Re-parse the complete file for import. The mapping preview is not
/// reused; the import driver always reads the source from scratch.
#[inline]
pub fn parse_full(path: &Path, max_bytes: u64) -> Result<ParsedFile, UploadError> {
    parse_path(path, max_bytes, None)
}

fn parse_path(path: &Path, max_bytes: u64, cap: Option<usize>) -> Result<ParsedFile, UploadError> {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let format = SourceFormat::from_file_name(&name)?;

    let size = fs::metadata(path)?.len();
    if size > max_bytes {
        return Err(UploadError::SizeExceeded {
            size,
            limit: max_bytes,
        });
    }

    let text = fs::read_to_string(path)?;
    parse_text(&text, format, cap)
}

/// Parse already-read text in the given format
#[inline]
pub fn parse_text(
    text: &str,
    format: SourceFormat,
    cap: Option<usize>,
) -> Result<ParsedFile, UploadError> {
    if text.trim().is_empty() {
        return Err(UploadError::EmptyFile);
    }

    let parsed = match format {
        SourceFormat::Csv | SourceFormat::Tsv => parse_delimited(text, format, cap),
        SourceFormat::Json => parse_json(text, cap),
    }?;

    debug!(
        "Parsed {} upload: {} columns, {} rows",
        parsed.format,
        parsed.headers.len(),
        parsed.total_rows
    );

    Ok(parsed)
}

fn parse_delimited(
    text: &str,
    format: SourceFormat,
    cap: Option<usize>,
) -> Result<ParsedFile, UploadError> {
    let delimiter = format
        .delimiter()
        .unwrap_or_else(|| unreachable!("delimited formats always declare a delimiter"));

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes());

    let mut records: Vec<Vec<String>> = Vec::new();
    for (index, result) in reader.records().enumerate() {
        match result {
            Ok(record) => {
                let cells: Vec<String> = record.iter().map(str::to_string).collect();
                // Blank lines reduce to all-empty records after trimming.
                if cells.iter().all(String::is_empty) {
                    continue;
                }
                records.push(cells);
            }
            Err(e) => {
                warn!("Skipping malformed row {}: {}", index + 1, e);
            }
        }
    }

    if records.is_empty() {
        return Err(UploadError::EmptyFile);
    }

    let headers = records.remove(0);
    let total_rows = records.len();
    if let Some(cap) = cap {
        records.truncate(cap);
    }

    Ok(ParsedFile {
        headers,
        rows: records,
        total_rows,
        format,
    })
}

fn parse_json(text: &str, cap: Option<usize>) -> Result<ParsedFile, UploadError> {
    let value: Value =
        serde_json::from_str(text).map_err(|e| UploadError::InvalidJsonShape(e.to_string()))?;

    match value {
        Value::Array(items) => {
            if items.is_empty() {
                return Err(UploadError::InvalidJsonShape(
                    "array contains no elements".to_string(),
                ));
            }

            let objects: Vec<&serde_json::Map<String, Value>> = items
                .iter()
                .map(|item| {
                    item.as_object().ok_or_else(|| {
                        UploadError::InvalidJsonShape(
                            "array elements must be objects".to_string(),
                        )
                    })
                })
                .collect::<Result<_, _>>()?;

            let headers: Vec<String> = objects[0].keys().cloned().collect();
            let total_rows = objects.len();

            let rows = objects
                .iter()
                .take(cap.unwrap_or(usize::MAX))
                .map(|object| {
                    headers
                        .iter()
                        .map(|header| json_cell_to_string(object.get(header)))
                        .collect()
                })
                .collect();

            Ok(ParsedFile {
                headers,
                rows,
                total_rows,
                format: SourceFormat::Json,
            })
        }
        Value::Object(object) => {
            let headers: Vec<String> = object.keys().cloned().collect();
            let row: Vec<String> = headers
                .iter()
                .map(|header| json_cell_to_string(object.get(header)))
                .collect();

            let rows = if cap == Some(0) { Vec::new() } else { vec![row] };

            Ok(ParsedFile {
                headers,
                rows,
                total_rows: 1,
                format: SourceFormat::Json,
            })
        }
        other => Err(UploadError::InvalidJsonShape(format!(
            "top-level value must be an object or array, got {}",
            json_type_name(&other)
        ))),
    }
}

fn json_cell_to_string(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        // Objects, arrays, numbers, and bools keep their canonical JSON text.
        Some(other) => other.to_string(),
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Whether a raw cell value is an embedding literal: a JSON array that is
/// non-empty and all-numeric. Never panics; unparsable input is simply not
/// a vector literal.
#[inline]
pub fn is_vector_literal(value: &str) -> bool {
    match serde_json::from_str::<Value>(value) {
        Ok(Value::Array(items)) => !items.is_empty() && items.iter().all(Value::is_number),
        _ => false,
    }
}
