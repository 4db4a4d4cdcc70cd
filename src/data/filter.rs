use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::FilterError;

use super::infer::parse_date;
use super::model::{CellValue, ColumnType, TableSnapshot};

/// Hard cap on conditions per filter set.
pub const MAX_CONDITIONS: usize = 10;

// ---------------------------------------------------------------------------
// Operator vocabulary
// ---------------------------------------------------------------------------

/// Every operator a condition can name. Which ones are legal depends on the
/// column type; see [`is_valid_operator`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterOperator {
    Equals,
    Contains,
    StartsWith,
    EndsWith,
    GreaterThan,
    LessThan,
    Between,
    Before,
    After,
}

impl fmt::Display for FilterOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FilterOperator::Equals => "equals",
            FilterOperator::Contains => "contains",
            FilterOperator::StartsWith => "starts_with",
            FilterOperator::EndsWith => "ends_with",
            FilterOperator::GreaterThan => "greater_than",
            FilterOperator::LessThan => "less_than",
            FilterOperator::Between => "between",
            FilterOperator::Before => "before",
            FilterOperator::After => "after",
        };
        write!(f, "{s}")
    }
}

/// Operator/type compatibility table. Exhaustive and exclusive per type.
pub fn is_valid_operator(operator: FilterOperator, data_type: ColumnType) -> bool {
    use FilterOperator::*;
    match data_type {
        ColumnType::Text => matches!(operator, Equals | Contains | StartsWith | EndsWith),
        ColumnType::Numeric => matches!(operator, Equals | GreaterThan | LessThan | Between),
        ColumnType::Date => matches!(operator, Equals | Before | After | Between),
    }
}

// ---------------------------------------------------------------------------
// Raw condition input
// ---------------------------------------------------------------------------

/// Untyped user input for one condition, as it arrives from the interaction
/// surface: everything is still text at this point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawValue {
    /// One scalar value.
    Single(String),
    /// Multi-select for `equals`: match any member.
    Many(Vec<String>),
    /// `(min, max)` endpoints for `between`.
    Range(String, String),
}

/// A user-specified condition before validation and coercion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConditionSpec {
    pub column_name: String,
    pub operator: FilterOperator,
    pub value: RawValue,
    /// Declared type; defaults to the snapshot's type for the column.
    pub data_type: Option<ColumnType>,
}

// ---------------------------------------------------------------------------
// Typed predicates
// ---------------------------------------------------------------------------

/// `equals` target for text columns: a scalar or a multi-select set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TextMatch {
    One(String),
    AnyOf(Vec<String>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NumberMatch {
    One(f64),
    AnyOf(Vec<f64>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DateMatch {
    One(NaiveDate),
    AnyOf(Vec<NaiveDate>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "operator", content = "value", rename_all = "snake_case")]
pub enum TextPredicate {
    Equals(TextMatch),
    Contains(String),
    StartsWith(String),
    EndsWith(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "operator", content = "value", rename_all = "snake_case")]
pub enum NumericPredicate {
    Equals(NumberMatch),
    GreaterThan(f64),
    LessThan(f64),
    Between(f64, f64),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "operator", content = "value", rename_all = "snake_case")]
pub enum DatePredicate {
    Equals(DateMatch),
    Before(NaiveDate),
    After(NaiveDate),
    Between(NaiveDate, NaiveDate),
}

/// A validated, fully-coerced predicate. An operator/type mismatch cannot be
/// represented here; [`FilterCondition::build`] rejects it up front.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "data_type", rename_all = "lowercase")]
pub enum Predicate {
    Text(TextPredicate),
    Numeric(NumericPredicate),
    Date(DatePredicate),
}

impl Predicate {
    pub fn data_type(&self) -> ColumnType {
        match self {
            Predicate::Text(_) => ColumnType::Text,
            Predicate::Numeric(_) => ColumnType::Numeric,
            Predicate::Date(_) => ColumnType::Date,
        }
    }

    /// The operator token this predicate was built from.
    pub fn operator(&self) -> FilterOperator {
        use FilterOperator::*;
        match self {
            Predicate::Text(TextPredicate::Equals(_)) => Equals,
            Predicate::Text(TextPredicate::Contains(_)) => Contains,
            Predicate::Text(TextPredicate::StartsWith(_)) => StartsWith,
            Predicate::Text(TextPredicate::EndsWith(_)) => EndsWith,
            Predicate::Numeric(NumericPredicate::Equals(_)) => Equals,
            Predicate::Numeric(NumericPredicate::GreaterThan(_)) => GreaterThan,
            Predicate::Numeric(NumericPredicate::LessThan(_)) => LessThan,
            Predicate::Numeric(NumericPredicate::Between(..)) => Between,
            Predicate::Date(DatePredicate::Equals(_)) => Equals,
            Predicate::Date(DatePredicate::Before(_)) => Before,
            Predicate::Date(DatePredicate::After(_)) => After,
            Predicate::Date(DatePredicate::Between(..)) => Between,
        }
    }

    /// Whether a single cell satisfies the predicate. Null cells never match.
    pub fn matches(&self, cell: &CellValue) -> bool {
        if cell.is_null() {
            return false;
        }
        match self {
            Predicate::Text(p) => p.matches(&cell.to_string()),
            Predicate::Numeric(p) => cell.as_f64().is_some_and(|n| p.matches(n)),
            Predicate::Date(p) => cell.as_date().is_some_and(|d| p.matches(d)),
        }
    }
}

impl TextPredicate {
    fn matches(&self, cell: &str) -> bool {
        match self {
            // Exact equality; substring operators below are case-insensitive.
            TextPredicate::Equals(TextMatch::One(v)) => cell == v,
            TextPredicate::Equals(TextMatch::AnyOf(vs)) => vs.iter().any(|v| v == cell),
            TextPredicate::Contains(v) => cell.to_lowercase().contains(&v.to_lowercase()),
            TextPredicate::StartsWith(v) => cell.to_lowercase().starts_with(&v.to_lowercase()),
            TextPredicate::EndsWith(v) => cell.to_lowercase().ends_with(&v.to_lowercase()),
        }
    }
}

impl NumericPredicate {
    fn matches(&self, n: f64) -> bool {
        match self {
            NumericPredicate::Equals(NumberMatch::One(v)) => n == *v,
            NumericPredicate::Equals(NumberMatch::AnyOf(vs)) => vs.iter().any(|v| n == *v),
            NumericPredicate::GreaterThan(v) => n > *v,
            NumericPredicate::LessThan(v) => n < *v,
            NumericPredicate::Between(min, max) => *min <= n && n <= *max,
        }
    }
}

impl DatePredicate {
    fn matches(&self, d: NaiveDate) -> bool {
        match self {
            DatePredicate::Equals(DateMatch::One(v)) => d == *v,
            DatePredicate::Equals(DateMatch::AnyOf(vs)) => vs.contains(&d),
            DatePredicate::Before(v) => d < *v,
            DatePredicate::After(v) => d > *v,
            DatePredicate::Between(min, max) => *min <= d && d <= *max,
        }
    }
}

// ---------------------------------------------------------------------------
// FilterCondition – one validated predicate over one column
// ---------------------------------------------------------------------------

fn default_true() -> bool {
    true
}

/// One predicate over one column. Serializes to the flat
/// `{column_name, data_type, operator, value, is_active}` record the state
/// carrier expects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterCondition {
    pub column_name: String,
    #[serde(flatten)]
    pub predicate: Predicate,
    /// Reserved for selective disabling; currently always true.
    #[serde(default = "default_true")]
    pub is_active: bool,
}

impl FilterCondition {
    /// Validate and coerce a raw spec against a snapshot. The declared type
    /// falls back to the snapshot's type for the column, and to `text` when
    /// the column is unknown (evaluation then passes the condition through).
    pub fn build(spec: ConditionSpec, snapshot: &TableSnapshot) -> Result<Self, FilterError> {
        let data_type = spec
            .data_type
            .or_else(|| snapshot.column_type(&spec.column_name))
            .unwrap_or(ColumnType::Text);
        Self::with_type(spec, data_type)
    }

    /// Validate and coerce a raw spec with an explicit declared type.
    pub fn with_type(spec: ConditionSpec, data_type: ColumnType) -> Result<Self, FilterError> {
        if !is_valid_operator(spec.operator, data_type) {
            return Err(FilterError::InvalidOperator {
                operator: spec.operator,
                data_type,
            });
        }
        let predicate = match data_type {
            ColumnType::Text => Predicate::Text(build_text(spec.operator, spec.value)?),
            ColumnType::Numeric => Predicate::Numeric(build_numeric(spec.operator, spec.value)?),
            ColumnType::Date => Predicate::Date(build_date(spec.operator, spec.value)?),
        };
        Ok(FilterCondition {
            column_name: spec.column_name,
            predicate,
            is_active: true,
        })
    }
}

fn single(operator: FilterOperator, value: RawValue) -> Result<String, FilterError> {
    match value {
        RawValue::Single(s) => Ok(s),
        _ => Err(FilterError::InvalidValue {
            operator,
            expected: "a single value",
        }),
    }
}

fn range(operator: FilterOperator, value: RawValue) -> Result<(String, String), FilterError> {
    match value {
        RawValue::Range(min, max) => Ok((min, max)),
        _ => Err(FilterError::InvalidValue {
            operator,
            expected: "a (min, max) range",
        }),
    }
}

fn build_text(operator: FilterOperator, value: RawValue) -> Result<TextPredicate, FilterError> {
    use FilterOperator::*;
    match operator {
        Equals => match value {
            RawValue::Single(s) => Ok(TextPredicate::Equals(TextMatch::One(s))),
            RawValue::Many(vs) if vs.is_empty() => Err(FilterError::MissingValue),
            RawValue::Many(vs) => Ok(TextPredicate::Equals(TextMatch::AnyOf(vs))),
            RawValue::Range(..) => Err(FilterError::InvalidValue {
                operator,
                expected: "a single value or a value set",
            }),
        },
        Contains => Ok(TextPredicate::Contains(single(operator, value)?)),
        StartsWith => Ok(TextPredicate::StartsWith(single(operator, value)?)),
        EndsWith => Ok(TextPredicate::EndsWith(single(operator, value)?)),
        // `is_valid_operator` already excluded everything else.
        _ => unreachable!("operator {operator} is not a text operator"),
    }
}

fn parse_number(s: &str) -> Result<f64, FilterError> {
    s.trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| FilterError::InvalidNumeric(s.to_string()))
}

fn build_numeric(
    operator: FilterOperator,
    value: RawValue,
) -> Result<NumericPredicate, FilterError> {
    use FilterOperator::*;
    match operator {
        Equals => match value {
            RawValue::Single(s) => Ok(NumericPredicate::Equals(NumberMatch::One(parse_number(
                &s,
            )?))),
            RawValue::Many(vs) if vs.is_empty() => Err(FilterError::MissingValue),
            RawValue::Many(vs) => {
                let parsed = vs
                    .iter()
                    .map(|s| parse_number(s))
                    .collect::<Result<Vec<f64>, _>>()?;
                Ok(NumericPredicate::Equals(NumberMatch::AnyOf(parsed)))
            }
            RawValue::Range(..) => Err(FilterError::InvalidValue {
                operator,
                expected: "a single value or a value set",
            }),
        },
        GreaterThan => Ok(NumericPredicate::GreaterThan(parse_number(&single(
            operator, value,
        )?)?)),
        LessThan => Ok(NumericPredicate::LessThan(parse_number(&single(
            operator, value,
        )?)?)),
        Between => {
            let (min_raw, max_raw) = range(operator, value)?;
            let min = parse_number(&min_raw)?;
            let max = parse_number(&max_raw)?;
            if min > max {
                return Err(FilterError::InvalidRange {
                    min: min_raw,
                    max: max_raw,
                });
            }
            Ok(NumericPredicate::Between(min, max))
        }
        _ => unreachable!("operator {operator} is not a numeric operator"),
    }
}

fn parse_date_value(s: &str) -> Result<NaiveDate, FilterError> {
    parse_date(s).ok_or_else(|| FilterError::InvalidDate(s.to_string()))
}

fn build_date(operator: FilterOperator, value: RawValue) -> Result<DatePredicate, FilterError> {
    use FilterOperator::*;
    match operator {
        Equals => match value {
            RawValue::Single(s) => Ok(DatePredicate::Equals(DateMatch::One(parse_date_value(
                &s,
            )?))),
            RawValue::Many(vs) if vs.is_empty() => Err(FilterError::MissingValue),
            RawValue::Many(vs) => {
                let parsed = vs
                    .iter()
                    .map(|s| parse_date_value(s))
                    .collect::<Result<Vec<NaiveDate>, _>>()?;
                Ok(DatePredicate::Equals(DateMatch::AnyOf(parsed)))
            }
            RawValue::Range(..) => Err(FilterError::InvalidValue {
                operator,
                expected: "a single value or a value set",
            }),
        },
        Before => Ok(DatePredicate::Before(parse_date_value(&single(
            operator, value,
        )?)?)),
        After => Ok(DatePredicate::After(parse_date_value(&single(
            operator, value,
        )?)?)),
        Between => {
            let (min_raw, max_raw) = range(operator, value)?;
            let min = parse_date_value(&min_raw)?;
            let max = parse_date_value(&max_raw)?;
            if min > max {
                return Err(FilterError::InvalidRange {
                    min: min_raw,
                    max: max_raw,
                });
            }
            Ok(DatePredicate::Between(min, max))
        }
        _ => unreachable!("operator {operator} is not a date operator"),
    }
}

// ---------------------------------------------------------------------------
// Evaluation
// ---------------------------------------------------------------------------

/// Evaluate one condition against the snapshot, producing a boolean keep-mask
/// over its rows.
///
/// A condition naming a column absent from the snapshot is a pass-through:
/// the mask is all-true and the row set is unaffected.
pub fn evaluate(snapshot: &TableSnapshot, condition: &FilterCondition) -> Vec<bool> {
    if !snapshot.has_column(&condition.column_name) {
        return vec![true; snapshot.len()];
    }
    snapshot
        .rows
        .iter()
        .map(|row| {
            let cell = row.get(&condition.column_name).unwrap_or(&CellValue::Null);
            condition.predicate.matches(cell)
        })
        .collect()
}

// ---------------------------------------------------------------------------
// FilterSet – accumulated conditions plus the AND/OR combinator
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogicOp {
    #[default]
    And,
    Or,
}

impl fmt::Display for LogicOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogicOp::And => write!(f, "AND"),
            LogicOp::Or => write!(f, "OR"),
        }
    }
}

/// The accumulated filter state: at most one condition per column, at most
/// [`MAX_CONDITIONS`] total, combined under a single logic operator.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterSet {
    pub conditions: Vec<FilterCondition>,
    pub logic_operator: LogicOp,
    /// Row count of the last evaluation; `None` until something evaluated.
    /// Updated by operations that evaluate (apply / remove / clear), left
    /// stale by `add`, which never evaluates.
    pub result_count: Option<usize>,
}

impl FilterSet {
    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    pub fn len(&self) -> usize {
        self.conditions.len()
    }

    /// Append a condition, replacing any existing condition on the same
    /// column first. Rejects the add (leaving the set unchanged) once 10
    /// distinct columns are filtered.
    pub fn add(&mut self, condition: FilterCondition) -> Result<(), FilterError> {
        let mut conditions: Vec<FilterCondition> = self
            .conditions
            .iter()
            .filter(|c| c.column_name != condition.column_name)
            .cloned()
            .collect();
        if conditions.len() >= MAX_CONDITIONS {
            return Err(FilterError::TooManyConditions(MAX_CONDITIONS));
        }
        conditions.push(condition);
        self.conditions = conditions;
        Ok(())
    }

    /// Remove the condition at `index`; out-of-range indices are ignored.
    pub fn remove(&mut self, index: usize) -> Option<FilterCondition> {
        if index < self.conditions.len() {
            Some(self.conditions.remove(index))
        } else {
            None
        }
    }

    pub fn clear(&mut self) {
        self.conditions.clear();
        self.result_count = None;
    }

    /// Indices of rows passing the whole set. An empty set keeps every row.
    /// Per-condition masks are combined positionally under the logic
    /// operator; the condition limit is re-checked here defensively.
    pub fn apply(&self, snapshot: &TableSnapshot) -> Result<Vec<usize>, FilterError> {
        if self.conditions.len() > MAX_CONDITIONS {
            return Err(FilterError::TooManyConditions(MAX_CONDITIONS));
        }

        let active: Vec<&FilterCondition> =
            self.conditions.iter().filter(|c| c.is_active).collect();
        if active.is_empty() {
            return Ok((0..snapshot.len()).collect());
        }

        let mut combined = evaluate(snapshot, active[0]);
        for condition in &active[1..] {
            let mask = evaluate(snapshot, condition);
            for (acc, m) in combined.iter_mut().zip(mask) {
                *acc = match self.logic_operator {
                    LogicOp::And => *acc && m,
                    LogicOp::Or => *acc || m,
                };
            }
        }

        Ok(combined
            .iter()
            .enumerate()
            .filter(|(_, keep)| **keep)
            .map(|(i, _)| i)
            .collect())
    }
}
