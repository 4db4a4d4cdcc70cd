//! Tabular filter engine.
//!
//! Load a delimited or JSON table into an immutable [`TableSnapshot`]
//! (column types inferred once at load), then narrow it with typed filter
//! conditions combined under AND/OR:
//!
//! ```
//! use flextable::{ConditionSpec, FilterOperator, RawValue, SessionState};
//!
//! let csv = "name,age\nAlice,25\nBob,30\n";
//! let snapshot = flextable::load_bytes(csv.as_bytes(), "people.csv").unwrap();
//!
//! let mut session = SessionState::default();
//! session.set_snapshot(snapshot);
//! session
//!     .add_condition(ConditionSpec {
//!         column_name: "age".into(),
//!         operator: FilterOperator::GreaterThan,
//!         value: RawValue::Single("27".into()),
//!         data_type: None,
//!     })
//!     .unwrap();
//! assert_eq!(session.apply_filters().unwrap(), 1);
//! ```
//!
//! Everything is synchronous and stateless between calls: each evaluation
//! receives the snapshot and filter set as explicit values, and both
//! round-trip losslessly through serde for the external state carrier.

pub mod data;
pub mod error;
pub mod format;
pub mod state;

pub use data::filter::{
    evaluate, is_valid_operator, ConditionSpec, DateMatch, DatePredicate, FilterCondition,
    FilterOperator, FilterSet, LogicOp, NumberMatch, NumericPredicate, Predicate, RawValue,
    TextMatch, TextPredicate, MAX_CONDITIONS,
};
pub use data::loader::{load_bytes, load_file, validate_upload, MAX_UPLOAD_BYTES};
pub use data::model::{
    CellValue, ColumnType, RawTable, Row, SourceFormat, StoredTable, TableSnapshot,
};
pub use error::{ErrorKind, FilterError};
pub use state::{FilterPhase, SessionState};
