use folio_core::ReportError;
use folio_docs::xlsx::{Cell, build_sheet, export};
use folio_docs::*;
use serde_json::json;

fn records() -> Vec<Record> {
    vec![
        Record::from_json(json!({"name": "Ali", "count": 3, "active": true})).unwrap(),
        Record::from_json(json!({"name": "Zeynep", "count": 1.5})).unwrap(),
        Record::from_json(json!({"name": "Can"})).unwrap(),
    ]
}

#[test]
fn one_row_per_record() {
    let columns: Vec<ColumnDefinition> = vec![
        ColumnDefinition::new("name", "İsim"),
        ColumnDefinition::new("count", "Adet"),
        ColumnDefinition::new("active", "Aktif"),
    ];
    let sheet = build_sheet(&records(), &columns).unwrap();
    assert_eq!(sheet.headers, vec!["İsim", "Adet", "Aktif"]);
    assert_eq!(sheet.rows.len(), records().len());
    assert_eq!(sheet.rows[1][1], Cell::Number(1.5));
    assert_eq!(sheet.rows[0][2].as_text(), "true");
    assert_eq!(sheet.rows[2][1], Cell::Text(String::new()));
}

#[test]
fn export_goes_through_sink_once() {
    let sink = MemorySink::new();
    let columns: Vec<ColumnDefinition> = vec![ColumnDefinition::new("name", "Name")];
    let saved = export(&records(), &columns, "Uyeler", &sink).unwrap();
    assert_eq!(saved.file_name, "Uyeler.xlsx");
    assert_eq!(sink.len(), 1);
}

#[test]
fn empty_schema_is_configuration_error() {
    let sink = MemorySink::new();
    let err = export(&records(), &[], "x", &sink).unwrap_err();
    assert!(matches!(err, ReportError::Configuration(_)));
    assert!(sink.is_empty());
}

#[test]
fn summarized_groups_export_as_rows() {
    let raw = vec![
        Record::from_json(json!({"memberId": "m1", "amount": 10, "note": "a"})).unwrap(),
        Record::from_json(json!({"memberId": "m2", "amount": 4, "note": "x"})).unwrap(),
        Record::from_json(json!({"memberId": "m1", "amount": 5, "note": "b"})).unwrap(),
    ];
    let groups = group_by_correlation_key(raw, |r| r.display("memberId"));
    let summaries = Summarizer::new(SummaryPlan::new()).summarize_groups(&groups, "memberId");

    let columns: Vec<ColumnDefinition> = vec![
        ColumnDefinition::new("memberId", "Üye"),
        ColumnDefinition::new("amount", "Tutar"),
        ColumnDefinition::new("note", "Not"),
    ];
    let sheet = build_sheet(&summaries, &columns).unwrap();
    assert_eq!(sheet.rows.len(), 2);
    assert_eq!(sheet.rows[0][0], Cell::Text("m1".into()));
    assert_eq!(sheet.rows[0][1], Cell::Number(15.0));
    assert_eq!(sheet.rows[0][2], Cell::Text("a - b".into()));
}
