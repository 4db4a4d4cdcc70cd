use chrono::{NaiveDate, NaiveDateTime};

use super::model::{CellValue, ColumnType};

// ---------------------------------------------------------------------------
// Column type inference
// ---------------------------------------------------------------------------

/// Date formats accepted by [`parse_date`], tried in order. Locale-agnostic:
/// the set is fixed, not read from the environment.
pub const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%d.%m.%Y", "%Y%m%d"];

const DATETIME_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"];

/// How many leading non-null values are examined by the date check.
/// Bounds inference cost on tall columns.
const SAMPLE_SIZE: usize = 10;

/// Parse a calendar date from text, accepting any of [`DATE_FORMATS`] or a
/// datetime whose date part is then kept.
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    for fmt in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return Some(d);
        }
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt.date());
        }
    }
    None
}

/// Classify a column from its values. Pure; runs once per column at load
/// time.
///
/// Order of checks:
/// 1. all-null or empty → `Text`
/// 2. every value already stored as a date → `Date`
/// 3. the first [`SAMPLE_SIZE`] non-null values all parse as dates → `Date`
/// 4. every non-null value is numeric (stored number or numeric string) →
///    `Numeric`
/// 5. otherwise `Text`
///
/// Date is deliberately tried before numeric so values like `"20240101"`
/// classify as dates rather than integers.
pub fn infer_column_type<'a, I>(values: I) -> ColumnType
where
    I: IntoIterator<Item = &'a CellValue>,
{
    let non_null: Vec<&CellValue> = values.into_iter().filter(|v| !v.is_null()).collect();
    if non_null.is_empty() {
        return ColumnType::Text;
    }

    if non_null.iter().all(|v| matches!(v, CellValue::Date(_))) {
        return ColumnType::Date;
    }

    let sample_is_dates = non_null
        .iter()
        .take(SAMPLE_SIZE)
        .all(|v| cell_parses_as_date(v));
    if sample_is_dates {
        return ColumnType::Date;
    }

    if non_null.iter().all(|v| v.as_f64().is_some()) {
        return ColumnType::Numeric;
    }

    ColumnType::Text
}

fn cell_parses_as_date(cell: &CellValue) -> bool {
    match cell {
        CellValue::Date(_) => true,
        CellValue::Str(s) => parse_date(s).is_some(),
        _ => false,
    }
}
