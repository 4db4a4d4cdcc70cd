use thiserror::Error;

use crate::data::filter::FilterOperator;
use crate::data::model::ColumnType;

// ---------------------------------------------------------------------------
// Error taxonomy for condition construction and filter application
// ---------------------------------------------------------------------------

/// Errors raised while building or applying filter conditions.
///
/// All of these are recoverable at the interaction boundary: the previous
/// filter set and table view stay unchanged and the message is shown to the
/// user (see [`crate::state::SessionState`]).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FilterError {
    #[error("invalid operator '{operator}' for {data_type} column")]
    InvalidOperator {
        operator: FilterOperator,
        data_type: ColumnType,
    },

    #[error("operator '{operator}' expects {expected}")]
    InvalidValue {
        operator: FilterOperator,
        expected: &'static str,
    },

    #[error("invalid 'between' range: min value ({min}) must not exceed max value ({max})")]
    InvalidRange { min: String, max: String },

    #[error("a filter value is required")]
    MissingValue,

    #[error("invalid numeric value '{0}'")]
    InvalidNumeric(String),

    #[error("invalid date '{0}'")]
    InvalidDate(String),

    #[error("maximum {0} filter conditions allowed")]
    TooManyConditions(usize),
}

/// Coarse classification of a [`FilterError`], mirroring how the UI layer
/// groups messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Operator/type mismatch or an impossible range.
    Validation,
    /// A supplied value could not be converted to the declared type.
    Coercion,
    /// The condition limit was exceeded.
    Capacity,
}

impl FilterError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            FilterError::InvalidOperator { .. }
            | FilterError::InvalidValue { .. }
            | FilterError::InvalidRange { .. }
            | FilterError::MissingValue => ErrorKind::Validation,
            FilterError::InvalidNumeric(_) | FilterError::InvalidDate(_) => ErrorKind::Coercion,
            FilterError::TooManyConditions(_) => ErrorKind::Capacity,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn errors_classify_by_kind() {
        let err = FilterError::InvalidOperator {
            operator: FilterOperator::Contains,
            data_type: ColumnType::Numeric,
        };
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(
            err.to_string(),
            "invalid operator 'contains' for numeric column"
        );

        assert_eq!(
            FilterError::InvalidNumeric("abc".into()).kind(),
            ErrorKind::Coercion
        );
        assert_eq!(
            FilterError::InvalidDate("x".into()).kind(),
            ErrorKind::Coercion
        );
        assert_eq!(
            FilterError::TooManyConditions(10).kind(),
            ErrorKind::Capacity
        );
        assert_eq!(
            FilterError::TooManyConditions(10).to_string(),
            "maximum 10 filter conditions allowed"
        );
    }
}
