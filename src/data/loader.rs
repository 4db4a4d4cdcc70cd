use std::path::Path;

use anyhow::{bail, Context, Result};
use serde_json::Value as JsonValue;

use super::infer::parse_date;
use super::model::{CellValue, RawTable, SourceFormat, TableSnapshot};

/// Upload size cap (50 MB), checked before any parsing.
pub const MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;

const ALLOWED_EXTENSIONS: &[&str] = &["csv", "json"];

// ---------------------------------------------------------------------------
// Public entry-points
// ---------------------------------------------------------------------------

/// Build a snapshot from an uploaded byte payload. Dispatch by extension.
///
/// Supported formats:
/// * `.csv`  – header row with column names, one record per line
/// * `.json` – array of records, or an object with a `records`/`data` key
pub fn load_bytes(bytes: &[u8], file_name: &str) -> Result<TableSnapshot> {
    validate_upload(file_name, bytes.len())?;

    let ext = extension_of(file_name);
    let (raw, format) = match ext.as_str() {
        "csv" => (parse_csv(bytes, file_name)?, SourceFormat::Csv),
        "json" => (parse_json(bytes, file_name)?, SourceFormat::Json),
        other => bail!("Unsupported file extension: .{other}"),
    };

    let snapshot = TableSnapshot::from_raw(raw, format, file_name);
    log::info!(
        "Loaded '{}': {} rows, {} columns ({})",
        file_name,
        snapshot.len(),
        snapshot.column_count(),
        format
    );
    Ok(snapshot)
}

/// Load a snapshot from a file on disk.
pub fn load_file(path: &Path) -> Result<TableSnapshot> {
    let bytes = std::fs::read(path)
        .with_context(|| format!("reading {}", path.display()))?;
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("upload");
    load_bytes(&bytes, file_name)
}

/// Reject uploads with a missing/unsupported extension or an oversized
/// payload before any bytes are parsed.
pub fn validate_upload(file_name: &str, size_bytes: usize) -> Result<()> {
    if file_name.is_empty() {
        bail!("File name is required");
    }
    let ext = extension_of(file_name);
    if !ALLOWED_EXTENSIONS.contains(&ext.as_str()) {
        let allowed = ALLOWED_EXTENSIONS
            .iter()
            .map(|e| format!(".{e}"))
            .collect::<Vec<_>>()
            .join(", ");
        bail!("Invalid file type. Allowed types: {allowed}");
    }
    if size_bytes > MAX_UPLOAD_BYTES {
        bail!(
            "File size ({}) exceeds maximum limit ({})",
            crate::format::format_file_size(size_bytes as u64),
            crate::format::format_file_size(MAX_UPLOAD_BYTES as u64),
        );
    }
    Ok(())
}

fn extension_of(file_name: &str) -> String {
    file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default()
}

// ---------------------------------------------------------------------------
// CSV parser
// ---------------------------------------------------------------------------

fn parse_csv(bytes: &[u8], file_name: &str) -> Result<RawTable> {
    if bytes.is_empty() {
        bail!("CSV file '{file_name}' is empty");
    }

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(bytes);
    let columns: Vec<String> = reader
        .headers()
        .with_context(|| format!("reading CSV headers of '{file_name}'"))?
        .iter()
        .map(|h| h.to_string())
        .collect();

    let mut rows = Vec::new();
    for (row_no, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("CSV row {row_no} of '{file_name}'"))?;
        rows.push(record.iter().map(guess_cell).collect());
    }

    Ok(RawTable { columns, rows })
}

/// Type a CSV field. Dates are tried before integers so compact forms like
/// `20240101` come through as dates, matching the inference policy.
fn guess_cell(s: &str) -> CellValue {
    if s.is_empty() {
        return CellValue::Null;
    }
    if let Some(d) = parse_date(s) {
        return CellValue::Date(d);
    }
    if let Ok(i) = s.parse::<i64>() {
        return CellValue::Int(i);
    }
    if let Ok(f) = s.parse::<f64>() {
        if f.is_finite() {
            return CellValue::Float(f);
        }
    }
    if s == "true" || s == "false" {
        return CellValue::Bool(s == "true");
    }
    CellValue::Str(s.to_string())
}

// ---------------------------------------------------------------------------
// JSON parser
// ---------------------------------------------------------------------------

/// Accepted JSON shapes (records-oriented):
///
/// ```json
/// [ {"name": "Alice", "age": 25}, ... ]
/// {"records": [ ... ]}
/// {"data": [ ... ]}
/// {"name": "Alice", "age": 25}
/// ```
fn parse_json(bytes: &[u8], file_name: &str) -> Result<RawTable> {
    if bytes.is_empty() {
        bail!("JSON file '{file_name}' is empty");
    }

    let root: JsonValue = serde_json::from_slice(bytes)
        .with_context(|| format!("parsing JSON file '{file_name}'"))?;

    let records: Vec<&JsonValue> = match &root {
        JsonValue::Array(items) => items.iter().collect(),
        JsonValue::Object(obj) => {
            if let Some(inner) = obj.get("records").or_else(|| obj.get("data")) {
                inner
                    .as_array()
                    .with_context(|| {
                        format!("'records'/'data' in '{file_name}' is not an array")
                    })?
                    .iter()
                    .collect()
            } else {
                // A single object becomes a one-row table.
                vec![&root]
            }
        }
        _ => bail!("Unsupported JSON structure in file '{file_name}'"),
    };

    // Column order: first appearance across records.
    let mut columns: Vec<String> = Vec::new();
    for (i, record) in records.iter().enumerate() {
        let obj = record
            .as_object()
            .with_context(|| format!("Row {i} in '{file_name}' is not a JSON object"))?;
        for key in obj.keys() {
            if !columns.iter().any(|c| c == key) {
                columns.push(key.clone());
            }
        }
    }

    let rows: Vec<Vec<CellValue>> = records
        .iter()
        .map(|record| {
            let obj = record.as_object().expect("records checked above");
            columns
                .iter()
                .map(|col| obj.get(col).map_or(CellValue::Null, json_to_cell))
                .collect()
        })
        .collect();

    Ok(RawTable { columns, rows })
}

fn json_to_cell(value: &JsonValue) -> CellValue {
    match value {
        JsonValue::Null => CellValue::Null,
        JsonValue::Bool(b) => CellValue::Bool(*b),
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                CellValue::Int(i)
            } else if let Some(f) = n.as_f64() {
                CellValue::Float(f)
            } else {
                CellValue::Str(n.to_string())
            }
        }
        // Strings stay strings here; date columns are found by inference.
        JsonValue::String(s) => CellValue::Str(s.clone()),
        other => CellValue::Str(other.to_string()),
    }
}
