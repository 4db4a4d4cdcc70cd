use crate::data::filter::{ConditionSpec, FilterCondition, FilterSet, LogicOp};
use crate::data::model::{CellValue, TableSnapshot};
use crate::error::FilterError;
use crate::format::format_row_count;

// ---------------------------------------------------------------------------
// Session state
// ---------------------------------------------------------------------------

/// Where the filter set sits in its lifecycle.
///
/// `Empty → (add) → Building → (apply) → Applied → (add) → Building …`;
/// remove and clear re-evaluate immediately, so they land in `Applied` or
/// `Empty`, never `Building`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FilterPhase {
    /// No conditions recorded.
    #[default]
    Empty,
    /// Conditions exist but the view has not been refreshed against them.
    Building,
    /// The visible rows reflect the current filter set.
    Applied,
}

/// One user session: the loaded snapshot, the accumulated filter set, and
/// the derived view state. Everything is explicit values — state is carried
/// between interactions by serializing the snapshot and filter set, never by
/// a process-wide store.
#[derive(Debug, Clone, Default)]
pub struct SessionState {
    /// Loaded dataset (None until a file is loaded).
    pub snapshot: Option<TableSnapshot>,

    /// Accumulated filter conditions plus the AND/OR combinator.
    pub filter_set: FilterSet,

    /// Indices of rows passing the current filters (cached).
    pub visible_indices: Vec<usize>,

    /// Columns currently shown, in snapshot order.
    pub visible_columns: Vec<String>,

    /// Status / error message for the interaction surface.
    pub status_message: Option<String>,

    pub phase: FilterPhase,
}

impl SessionState {
    /// Ingest a newly loaded snapshot; filters reset, all columns visible.
    pub fn set_snapshot(&mut self, snapshot: TableSnapshot) {
        self.filter_set = FilterSet::default();
        self.visible_indices = (0..snapshot.len()).collect();
        self.visible_columns = snapshot.columns.clone();
        self.phase = FilterPhase::Empty;
        self.status_message = None;
        self.snapshot = Some(snapshot);
    }

    /// Record a condition without evaluating it (multi-condition build-up).
    ///
    /// On any validation/coercion/capacity error the previous filter set and
    /// view are preserved unchanged and the error text becomes the status
    /// message.
    pub fn add_condition(&mut self, spec: ConditionSpec) -> Result<(), FilterError> {
        let Some(snapshot) = &self.snapshot else {
            self.status_message = Some("No data loaded. Please upload a file first.".to_string());
            return Ok(());
        };

        let condition = match FilterCondition::build(spec, snapshot) {
            Ok(condition) => condition,
            Err(e) => {
                log::warn!("Rejected filter condition: {e}");
                self.status_message = Some(e.to_string());
                return Err(e);
            }
        };
        let description = describe(&condition);

        if let Err(e) = self.filter_set.add(condition) {
            log::warn!("Rejected filter condition: {e}");
            self.status_message = Some(e.to_string());
            return Err(e);
        }

        self.phase = FilterPhase::Building;
        self.status_message = Some(format!(
            "Filter condition added: {description} ({} total)",
            self.filter_set.len()
        ));
        Ok(())
    }

    /// Evaluate the whole filter set and refresh the visible rows.
    pub fn apply_filters(&mut self) -> Result<usize, FilterError> {
        let Some(snapshot) = &self.snapshot else {
            self.status_message = Some("No data loaded. Please upload a file first.".to_string());
            return Ok(0);
        };

        let indices = match self.filter_set.apply(snapshot) {
            Ok(indices) => indices,
            Err(e) => {
                self.status_message = Some(e.to_string());
                return Err(e);
            }
        };

        let filtered = indices.len();
        log::info!(
            "Applied {} condition(s) with {} logic: {} / {} rows",
            self.filter_set.len(),
            self.filter_set.logic_operator,
            filtered,
            snapshot.len()
        );

        self.visible_indices = indices;
        self.filter_set.result_count = Some(filtered);
        self.phase = if self.filter_set.is_empty() {
            FilterPhase::Empty
        } else {
            FilterPhase::Applied
        };
        self.status_message = if filtered == 0 && !self.filter_set.is_empty() {
            Some("No results match the current filter(s).".to_string())
        } else {
            None
        };
        Ok(filtered)
    }

    /// Drop the condition at `index` and re-evaluate immediately; with no
    /// conditions left the full table is restored.
    pub fn remove_condition(&mut self, index: usize) -> Result<(), FilterError> {
        if self.filter_set.remove(index).is_none() {
            return Ok(());
        }
        self.apply_filters().map(|_| ())
    }

    /// Reset the filter set and show the full table again.
    pub fn clear_filters(&mut self) {
        self.filter_set.clear();
        if let Some(snapshot) = &self.snapshot {
            self.visible_indices = (0..snapshot.len()).collect();
            self.filter_set.result_count = Some(snapshot.len());
        } else {
            self.visible_indices.clear();
        }
        self.phase = FilterPhase::Empty;
        self.status_message = Some("All filters cleared.".to_string());
        log::info!("Cleared all filter conditions");
    }

    /// Switch the AND/OR combinator. The stored conditions are untouched;
    /// an applied view goes back to `Building` until the next apply.
    pub fn set_logic(&mut self, logic: LogicOp) {
        self.filter_set.logic_operator = logic;
        if self.phase == FilterPhase::Applied {
            self.phase = FilterPhase::Building;
        }
    }

    /// Restrict the visible columns. The selection is intersected with the
    /// snapshot's columns and kept in snapshot order; an empty selection
    /// means "all columns".
    pub fn set_visible_columns(&mut self, selection: &[String]) {
        let Some(snapshot) = &self.snapshot else {
            return;
        };
        self.visible_columns = if selection.is_empty() {
            snapshot.columns.clone()
        } else {
            snapshot
                .columns
                .iter()
                .filter(|c| selection.contains(c))
                .cloned()
                .collect()
        };
    }

    /// The current view for the display and export collaborators: visible
    /// column names in original order, and the filtered rows projected onto
    /// them.
    pub fn visible_view(&self) -> (Vec<String>, Vec<Vec<CellValue>>) {
        let Some(snapshot) = &self.snapshot else {
            return (Vec::new(), Vec::new());
        };
        let rows = self
            .visible_indices
            .iter()
            .filter_map(|&i| snapshot.rows.get(i))
            .map(|row| {
                self.visible_columns
                    .iter()
                    .map(|col| row.get(col).cloned().unwrap_or(CellValue::Null))
                    .collect()
            })
            .collect();
        (self.visible_columns.clone(), rows)
    }

    /// Row-count summary string for the display collaborator.
    pub fn row_count_summary(&self) -> String {
        let total = self.snapshot.as_ref().map_or(0, TableSnapshot::len);
        let filtered = match self.phase {
            FilterPhase::Applied => Some(self.visible_indices.len()),
            _ => None,
        };
        format_row_count(total, filtered)
    }

}

fn describe(condition: &FilterCondition) -> String {
    format!(
        "{} {}",
        condition.column_name,
        condition.predicate.operator()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::filter::{FilterOperator, RawValue};
    use crate::data::loader::load_bytes;

    fn session() -> SessionState {
        let csv = "name,age,city\n\
                   Alice,25,Tokyo\n\
                   Bob,30,Osaka\n\
                   Charlie,35,Tokyo";
        let snapshot = load_bytes(csv.as_bytes(), "people.csv").unwrap();
        let mut state = SessionState::default();
        state.set_snapshot(snapshot);
        state
    }

    fn spec(column: &str, operator: FilterOperator, value: RawValue) -> ConditionSpec {
        ConditionSpec {
            column_name: column.to_string(),
            operator,
            value,
            data_type: None,
        }
    }

    #[test]
    fn add_then_apply_walks_the_phase_machine() {
        let mut state = session();
        assert_eq!(state.phase, FilterPhase::Empty);

        state
            .add_condition(spec(
                "city",
                FilterOperator::Equals,
                RawValue::Single("Tokyo".into()),
            ))
            .unwrap();
        assert_eq!(state.phase, FilterPhase::Building);
        // Adding does not evaluate.
        assert_eq!(state.visible_indices, vec![0, 1, 2]);
        assert_eq!(state.filter_set.result_count, None);

        let n = state.apply_filters().unwrap();
        assert_eq!(n, 2);
        assert_eq!(state.phase, FilterPhase::Applied);
        assert_eq!(state.visible_indices, vec![0, 2]);
        assert_eq!(state.filter_set.result_count, Some(2));
    }

    #[test]
    fn errors_preserve_the_previous_filter_state() {
        let mut state = session();
        state
            .add_condition(spec(
                "city",
                FilterOperator::Equals,
                RawValue::Single("Tokyo".into()),
            ))
            .unwrap();
        state.apply_filters().unwrap();

        let err = state
            .add_condition(spec(
                "age",
                FilterOperator::GreaterThan,
                RawValue::Single("not a number".into()),
            ))
            .unwrap_err();
        assert_eq!(err, FilterError::InvalidNumeric("not a number".into()));
        assert_eq!(state.filter_set.len(), 1);
        assert_eq!(state.visible_indices, vec![0, 2]);
        assert!(state
            .status_message
            .as_deref()
            .unwrap()
            .contains("invalid numeric value"));
    }

    #[test]
    fn remove_reevaluates_and_empty_set_restores_all_rows() {
        let mut state = session();
        state
            .add_condition(spec(
                "city",
                FilterOperator::Equals,
                RawValue::Single("Tokyo".into()),
            ))
            .unwrap();
        state
            .add_condition(spec(
                "age",
                FilterOperator::LessThan,
                RawValue::Single("30".into()),
            ))
            .unwrap();
        state.apply_filters().unwrap();
        assert_eq!(state.visible_indices, vec![0]);

        state.remove_condition(1).unwrap();
        assert_eq!(state.visible_indices, vec![0, 2]);
        assert_eq!(state.phase, FilterPhase::Applied);

        state.remove_condition(0).unwrap();
        assert_eq!(state.visible_indices, vec![0, 1, 2]);
        assert_eq!(state.phase, FilterPhase::Empty);

        // Out-of-range removal is a no-op.
        state.remove_condition(5).unwrap();
        assert_eq!(state.visible_indices, vec![0, 1, 2]);
    }

    #[test]
    fn clear_resets_to_empty() {
        let mut state = session();
        state
            .add_condition(spec(
                "city",
                FilterOperator::Equals,
                RawValue::Single("Osaka".into()),
            ))
            .unwrap();
        state.apply_filters().unwrap();
        state.clear_filters();

        assert_eq!(state.phase, FilterPhase::Empty);
        assert!(state.filter_set.is_empty());
        assert_eq!(state.visible_indices, vec![0, 1, 2]);
        assert_eq!(state.filter_set.result_count, Some(3));
    }

    #[test]
    fn visible_view_projects_filtered_rows_onto_visible_columns() {
        let mut state = session();
        state.set_visible_columns(&["city".to_string(), "name".to_string()]);
        state
            .add_condition(spec(
                "age",
                FilterOperator::GreaterThan,
                RawValue::Single("27".into()),
            ))
            .unwrap();
        state.apply_filters().unwrap();

        let (columns, rows) = state.visible_view();
        // Snapshot order, not selection order.
        assert_eq!(columns, vec!["name", "city"]);
        assert_eq!(
            rows,
            vec![
                vec![CellValue::Str("Bob".into()), CellValue::Str("Osaka".into())],
                vec![
                    CellValue::Str("Charlie".into()),
                    CellValue::Str("Tokyo".into())
                ],
            ]
        );
    }

    #[test]
    fn row_count_summary_tracks_the_phase() {
        let mut state = session();
        assert_eq!(state.row_count_summary(), "Total rows: 3");

        state
            .add_condition(spec(
                "city",
                FilterOperator::Equals,
                RawValue::Single("Tokyo".into()),
            ))
            .unwrap();
        // Building: the view still shows all rows.
        assert_eq!(state.row_count_summary(), "Total rows: 3");

        state.apply_filters().unwrap();
        assert_eq!(state.row_count_summary(), "Filtered rows: 2 / 3");
    }

    #[test]
    fn operations_without_a_snapshot_set_a_status_message() {
        let mut state = SessionState::default();
        state
            .add_condition(spec(
                "city",
                FilterOperator::Equals,
                RawValue::Single("Tokyo".into()),
            ))
            .unwrap();
        assert!(state.status_message.as_deref().unwrap().contains("No data"));
        assert!(state.filter_set.is_empty());
        assert_eq!(state.apply_filters().unwrap(), 0);
    }

    #[test]
    fn changing_logic_invalidates_an_applied_view() {
        let mut state = session();
        state
            .add_condition(spec(
                "city",
                FilterOperator::Equals,
                RawValue::Single("Tokyo".into()),
            ))
            .unwrap();
        state.apply_filters().unwrap();
        assert_eq!(state.phase, FilterPhase::Applied);

        state.set_logic(LogicOp::Or);
        assert_eq!(state.phase, FilterPhase::Building);
    }
}
