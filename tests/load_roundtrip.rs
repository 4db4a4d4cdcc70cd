//! Upload-flow round trips: bytes → snapshot → stored record → snapshot.

use flextable::{load_bytes, CellValue, ColumnType, SourceFormat, StoredTable};

const MIXED_CSV: &str = "\
id,name,amount,signup_date,notes,name
1,Alice,1000.5,2024-01-10,first,AliceAlt
2,Bob,2000,2024-02-20,,BobAlt
3,,1500.75,2024-03-05,third,
";

#[test]
fn csv_snapshot_round_trips_exactly() {
    let snapshot = load_bytes(MIXED_CSV.as_bytes(), "mixed.csv").unwrap();

    // Duplicate `name` column disambiguated at load time.
    assert_eq!(
        snapshot.columns,
        vec!["id", "name", "amount", "signup_date", "notes", "name_1"]
    );
    assert_eq!(snapshot.column_type("signup_date"), Some(ColumnType::Date));
    assert_eq!(snapshot.column_type("amount"), Some(ColumnType::Numeric));
    assert_eq!(snapshot.rows[1]["notes"], CellValue::Null);

    let stored = StoredTable::from(&snapshot);
    assert_eq!(stored.row_count, 3);
    assert_eq!(stored.column_count, 6);

    let json = serde_json::to_string(&stored).unwrap();
    let restored: StoredTable = serde_json::from_str(&json).unwrap();
    assert_eq!(restored, stored);
    assert_eq!(restored.into_snapshot(), snapshot);
}

#[test]
fn nulls_survive_as_explicit_null_markers() {
    let snapshot = load_bytes(MIXED_CSV.as_bytes(), "mixed.csv").unwrap();
    let stored = StoredTable::from(&snapshot);
    let json = serde_json::to_value(&stored).unwrap();

    // Row 1 has an empty `notes` field: present as JSON null, not omitted.
    let row = &json["rows"][1];
    assert!(row.get("notes").is_some());
    assert!(row["notes"].is_null());
}

#[test]
fn json_snapshot_round_trips_exactly() {
    let payload = r#"[
        {"name": "Alice", "age": 25, "joined": "2024-01-10", "active": true},
        {"name": "Bob", "age": null, "joined": "2024-02-20", "active": false}
    ]"#;
    let snapshot = load_bytes(payload.as_bytes(), "people.json").unwrap();

    assert_eq!(snapshot.source_format, SourceFormat::Json);
    assert_eq!(snapshot.columns, vec!["name", "age", "joined", "active"]);
    // Date strings in a date-typed column are normalized to date cells.
    assert_eq!(snapshot.column_type("joined"), Some(ColumnType::Date));
    assert_eq!(
        snapshot.rows[0]["joined"],
        CellValue::Date(chrono::NaiveDate::from_ymd_opt(2024, 1, 10).unwrap())
    );
    assert_eq!(snapshot.rows[1]["age"], CellValue::Null);

    let stored = StoredTable::from(&snapshot);
    let json = serde_json::to_string(&stored).unwrap();
    let restored: StoredTable = serde_json::from_str(&json).unwrap();
    assert_eq!(restored.into_snapshot(), snapshot);
}

#[test]
fn filtered_rows_reserialize_identically() {
    let snapshot = load_bytes(MIXED_CSV.as_bytes(), "mixed.csv").unwrap();
    let stored = StoredTable::from(&snapshot);
    let first_pass = serde_json::to_value(&stored.rows).unwrap();

    // Round-trip the rows and serialize again: every cell identical.
    let rows: Vec<flextable::Row> = serde_json::from_value(first_pass.clone()).unwrap();
    let second_pass = serde_json::to_value(&rows).unwrap();
    assert_eq!(first_pass, second_pass);
}
