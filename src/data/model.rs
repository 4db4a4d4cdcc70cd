use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::infer::{infer_column_type, parse_date};

// ---------------------------------------------------------------------------
// CellValue – a single cell of the table
// ---------------------------------------------------------------------------

/// A dynamically-typed table cell.
/// Using `BTreeMap` / `BTreeSet` downstream so `CellValue` must be `Ord`.
///
/// Serialized untagged as the natural JSON scalar: `Null` becomes an explicit
/// JSON `null`, `Date` an ISO-8601 string. Variant order matters for
/// deserialization: `Str` comes before `Date` so incoming strings always land
/// as `Str`; date-typed columns are re-hydrated from `column_types` when a
/// [`StoredTable`] is turned back into a [`TableSnapshot`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Date(NaiveDate),
}

// -- Manual Eq/Ord so we can put CellValue in BTreeSet --

impl Eq for CellValue {}

impl PartialOrd for CellValue {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for CellValue {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        use CellValue::*;
        fn discriminant(v: &CellValue) -> u8 {
            match v {
                Null => 0,
                Bool(_) => 1,
                Int(_) => 2,
                Float(_) => 3,
                Str(_) => 4,
                Date(_) => 5,
            }
        }
        let da = discriminant(self);
        let db = discriminant(other);
        if da != db {
            return da.cmp(&db);
        }
        match (self, other) {
            (Null, Null) => std::cmp::Ordering::Equal,
            (Bool(a), Bool(b)) => a.cmp(b),
            (Int(a), Int(b)) => a.cmp(b),
            (Float(a), Float(b)) => a.total_cmp(b),
            (Str(a), Str(b)) => a.cmp(b),
            (Date(a), Date(b)) => a.cmp(b),
            _ => std::cmp::Ordering::Equal,
        }
    }
}

impl std::hash::Hash for CellValue {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            CellValue::Str(s) => s.hash(state),
            CellValue::Int(i) => i.hash(state),
            CellValue::Float(f) => f.to_bits().hash(state),
            CellValue::Bool(b) => b.hash(state),
            CellValue::Date(d) => d.hash(state),
            CellValue::Null => {}
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Str(s) => write!(f, "{s}"),
            CellValue::Int(i) => write!(f, "{i}"),
            CellValue::Float(v) => write!(f, "{v}"),
            CellValue::Bool(b) => write!(f, "{b}"),
            CellValue::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            CellValue::Null => Ok(()),
        }
    }
}

impl CellValue {
    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null)
    }

    /// Interpret the cell as a number for numeric predicates.
    /// Numeric-looking strings count: a column inferred `numeric` from text
    /// input keeps its cells as `Str`.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Float(v) => Some(*v),
            CellValue::Int(i) => Some(*i as f64),
            CellValue::Str(s) => s.trim().parse::<f64>().ok().filter(|v| v.is_finite()),
            _ => None,
        }
    }

    /// Interpret the cell as a calendar date for date predicates.
    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            CellValue::Date(d) => Some(*d),
            CellValue::Str(s) => parse_date(s),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// ColumnType & SourceFormat
// ---------------------------------------------------------------------------

/// Declared type of a column, fixed for the snapshot's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    Text,
    Numeric,
    Date,
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ColumnType::Text => "text",
            ColumnType::Numeric => "numeric",
            ColumnType::Date => "date",
        };
        write!(f, "{s}")
    }
}

/// Format tag of the file the snapshot was loaded from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceFormat {
    Csv,
    Json,
}

impl fmt::Display for SourceFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SourceFormat::Csv => "csv",
            SourceFormat::Json => "json",
        };
        write!(f, "{s}")
    }
}

// ---------------------------------------------------------------------------
// RawTable – untyped parser output
// ---------------------------------------------------------------------------

/// The raw two-dimensional table handed over by a file parser.
/// Column names may repeat and rows may be ragged; [`TableSnapshot::from_raw`]
/// normalizes both.
#[derive(Debug, Clone)]
pub struct RawTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<CellValue>>,
}

// ---------------------------------------------------------------------------
// TableSnapshot – the loaded dataset
// ---------------------------------------------------------------------------

/// One record: column name → cell value. Every row of a snapshot carries
/// exactly the keys in `columns`, with missing source values as `Null`.
pub type Row = BTreeMap<String, CellValue>;

/// The immutable in-memory copy of the loaded dataset plus inferred column
/// types. Created once per load and superseded wholesale by the next load;
/// filtering only ever reads from it.
#[derive(Debug, Clone, PartialEq)]
pub struct TableSnapshot {
    pub rows: Vec<Row>,
    /// Ordered unique column names (source order, duplicates suffixed).
    pub columns: Vec<String>,
    pub column_types: BTreeMap<String, ColumnType>,
    pub source_format: SourceFormat,
    pub source_name: String,
}

impl TableSnapshot {
    /// Build a snapshot from raw parser output: disambiguate duplicate
    /// column names (`_1`, `_2`, …), pad short rows with nulls, and infer a
    /// type for every column.
    pub fn from_raw(raw: RawTable, source_format: SourceFormat, source_name: &str) -> Self {
        let mut seen: BTreeMap<String, usize> = BTreeMap::new();
        let mut columns = Vec::with_capacity(raw.columns.len());
        for col in &raw.columns {
            match seen.get_mut(col) {
                None => {
                    seen.insert(col.clone(), 0);
                    columns.push(col.clone());
                }
                Some(n) => {
                    *n += 1;
                    columns.push(format!("{col}_{n}"));
                }
            }
        }

        let rows: Vec<Row> = raw
            .rows
            .into_iter()
            .map(|cells| {
                let mut cells = cells.into_iter();
                columns
                    .iter()
                    .map(|col| (col.clone(), cells.next().unwrap_or(CellValue::Null)))
                    .collect()
            })
            .collect();

        let column_types: BTreeMap<String, ColumnType> = columns
            .iter()
            .map(|col| {
                let ty = infer_column_type(rows.iter().map(|r| &r[col]));
                (col.clone(), ty)
            })
            .collect();

        let mut rows = rows;
        retype_date_columns(&mut rows, &column_types);

        TableSnapshot {
            rows,
            columns,
            column_types,
            source_format,
            source_name: source_name.to_string(),
        }
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the snapshot has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Number of columns.
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Declared type of a column, if it exists.
    pub fn column_type(&self, column: &str) -> Option<ColumnType> {
        self.column_types.get(column).copied()
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.column_types.contains_key(column)
    }
}

// ---------------------------------------------------------------------------
// StoredTable – the state-carrier record
// ---------------------------------------------------------------------------

/// Serializable snapshot record round-tripped through the external state
/// carrier between interactions. Cells serialize as plain JSON scalars with
/// nulls explicit; `column_types` lets [`StoredTable::into_snapshot`] restore
/// date cells from their ISO string form, so the round trip is exact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredTable {
    pub rows: Vec<Row>,
    pub columns: Vec<String>,
    pub column_types: BTreeMap<String, ColumnType>,
    pub row_count: usize,
    pub column_count: usize,
    pub source_format: SourceFormat,
    pub source_name: String,
}

impl From<&TableSnapshot> for StoredTable {
    fn from(snapshot: &TableSnapshot) -> Self {
        StoredTable {
            row_count: snapshot.len(),
            column_count: snapshot.column_count(),
            rows: snapshot.rows.clone(),
            columns: snapshot.columns.clone(),
            column_types: snapshot.column_types.clone(),
            source_format: snapshot.source_format,
            source_name: snapshot.source_name.clone(),
        }
    }
}

impl StoredTable {
    /// Rebuild the snapshot, re-typing string cells of date columns.
    pub fn into_snapshot(self) -> TableSnapshot {
        let mut rows = self.rows;
        retype_date_columns(&mut rows, &self.column_types);

        TableSnapshot {
            rows,
            columns: self.columns,
            column_types: self.column_types,
            source_format: self.source_format,
            source_name: self.source_name,
        }
    }
}

/// Normalize date-typed columns: parseable string cells become `Date` so a
/// snapshot is canonical regardless of whether it came from a parser or from
/// the state carrier. Unparseable strings are left alone (they never match a
/// date predicate).
fn retype_date_columns(rows: &mut [Row], column_types: &BTreeMap<String, ColumnType>) {
    let date_columns: Vec<&String> = column_types
        .iter()
        .filter(|(_, ty)| **ty == ColumnType::Date)
        .map(|(col, _)| col)
        .collect();

    for row in rows {
        for col in &date_columns {
            if let Some(cell @ CellValue::Str(_)) = row.get_mut(col.as_str()) {
                if let Some(date) = cell.as_date() {
                    *cell = CellValue::Date(date);
                }
            }
        }
    }
}
