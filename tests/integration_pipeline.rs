//! Integration tests for the full load, run, export workflow
//!
//! These tests run complete pipelines on fixture files and verify the
//! end-to-end results.

use tablesift::error::SiftError;
use tablesift::export::{ExportFormat, export, export_to_path, to_record_format, to_row_format};
use tablesift::pipeline::{
    AggregateFunction, AggregationRule, FilterOperator, FilterRule, GroupSpec, PipelineConfig,
    SortRule, Stage, run, run_with_report,
};
use tablesift::session::Session;
use tablesift::table::{CellValue, Column, LoadOptions, SemanticType, Table, load_csv_path};

fn employees() -> Table {
    load_csv_path("testdata/employees.csv", &LoadOptions::default())
        .expect("employees fixture should load")
}

#[test]
fn test_employees_schema() {
    let table = employees();
    assert_eq!(table.row_count(), 10, "Should have 10 rows");
    assert_eq!(
        table.schema(),
        vec![
            ("id".to_owned(), SemanticType::Int64),
            ("name".to_owned(), SemanticType::Text),
            ("age".to_owned(), SemanticType::Int64),
            ("email".to_owned(), SemanticType::Text),
            ("salary".to_owned(), SemanticType::Float64),
            ("department".to_owned(), SemanticType::Text),
            ("remote".to_owned(), SemanticType::Bool),
        ]
    );
    assert_eq!(table.cell(6, "salary"), Some(&CellValue::Null));
}

#[test]
fn test_engineering_report_from_file() {
    let config = PipelineConfig::from_file("testdata/engineering_report.json")
        .expect("fixture config should decode");
    let result = run(&employees(), &config).unwrap();

    let csv = String::from_utf8(to_row_format(&result).unwrap()).unwrap();
    assert_eq!(
        csv,
        "name,age,salary,department\n\
         Carla Diaz,45,98000.0,Engineering\n\
         Iris Jones,42,91000.0,Engineering\n\
         Eve Foster,39,83000.0,Engineering\n"
    );
}

#[test]
fn test_null_grouping_fixture_decodes_to_disabled() {
    let config = PipelineConfig::from_file("testdata/sorted_by_department.json").unwrap();
    assert!(!config.grouping.enabled);
    assert_eq!(config.sorting, vec![SortRule::asc("department")]);

    let result = run(&employees(), &config).unwrap();
    let first = result.cell(0, "department").map(ToString::to_string);
    let last = result.cell(9, "department").map(ToString::to_string);
    assert_eq!(first.as_deref(), Some("Engineering"));
    assert_eq!(last.as_deref(), Some("Support"));
}

#[test]
fn test_department_summary() {
    let config = PipelineConfig {
        grouping: GroupSpec::by(["department"]),
        aggregations: vec![
            AggregationRule::new("salary", AggregateFunction::Count),
            AggregationRule::new("salary", AggregateFunction::Mean),
            AggregationRule::new("age", AggregateFunction::Max),
            AggregationRule::new("remote", AggregateFunction::Sum),
        ],
        ..PipelineConfig::default()
    };
    let (result, report) = run_with_report(&employees(), &config).unwrap();

    assert_eq!(report.stages_applied, vec![Stage::Aggregate]);
    assert_eq!(
        result.column_names(),
        vec!["department", "salary_count", "salary_mean", "age_max", "remote_sum"]
    );

    let departments: Vec<String> = result
        .column("department")
        .unwrap()
        .values()
        .iter()
        .map(ToString::to_string)
        .collect();
    assert_eq!(departments, vec!["Engineering", "Sales", "Support"]);

    assert_eq!(result.cell(0, "salary_count"), Some(&CellValue::Int64(4)));
    assert_eq!(result.cell(2, "salary_count"), Some(&CellValue::Int64(2)));
    assert_eq!(result.cell(0, "salary_mean"), Some(&CellValue::Float64(86_000.125)));
    assert_eq!(result.cell(2, "salary_mean"), Some(&CellValue::Float64(45_000.0)));
    assert_eq!(result.cell(0, "age_max"), Some(&CellValue::Int64(45)));
    assert_eq!(result.cell(1, "remote_sum"), Some(&CellValue::Int64(1)));
}

#[test]
fn test_missing_values_grouping() {
    let table = load_csv_path("testdata/missing_values.csv", &LoadOptions::default()).unwrap();
    assert_eq!(
        table.column("units").map(|c| c.kind()),
        Some(SemanticType::Int64)
    );

    let config = PipelineConfig {
        grouping: GroupSpec::by(["region"]),
        aggregations: vec![
            AggregationRule::new("units", AggregateFunction::Sum),
            AggregationRule::new("price", AggregateFunction::Min),
        ],
        ..PipelineConfig::default()
    };
    let result = run(&table, &config).unwrap();

    let records: serde_json::Value =
        serde_json::from_slice(&to_record_format(&result).unwrap()).unwrap();
    assert_eq!(
        records,
        serde_json::json!([
            {"region": "north", "units_sum": 14, "price_min": 1.1},
            {"region": "south", "units_sum": 8, "price_min": 0.99},
            {"region": "east", "units_sum": 0, "price_min": 1.3}
        ])
    );
}

#[test]
fn test_isnull_filter_exports_null() {
    let config = PipelineConfig {
        selected_columns: vec!["name".to_owned(), "salary".to_owned()],
        filters: vec![FilterRule::new("salary", FilterOperator::IsNull, "")],
        ..PipelineConfig::default()
    };
    let result = run(&employees(), &config).unwrap();
    let records: serde_json::Value =
        serde_json::from_slice(&export(&result, ExportFormat::Json).unwrap()).unwrap();
    assert_eq!(
        records,
        serde_json::json!([{"name": "Gina Hall", "salary": null}])
    );
}

#[test]
fn test_filter_matching_nothing_exports_header_and_empty_array() {
    let config = PipelineConfig {
        selected_columns: vec!["id".to_owned(), "name".to_owned()],
        filters: vec![FilterRule::new("department", FilterOperator::Eq, "Legal")],
        ..PipelineConfig::default()
    };
    let result = run(&employees(), &config).unwrap();
    assert!(result.is_empty());
    assert!(result.columns().iter().all(Column::is_empty));
    assert_eq!(to_row_format(&result).unwrap(), b"id,name\n");
    assert_eq!(to_record_format(&result).unwrap(), b"[]");
}

#[test]
fn test_unknown_column_is_reported() {
    let config = PipelineConfig {
        filters: vec![FilterRule::new("bonus", FilterOperator::Gt, "0")],
        ..PipelineConfig::default()
    };
    let err = run(&employees(), &config).unwrap_err();
    assert!(
        matches!(&err, SiftError::Execution { stage: Stage::Filter, column, .. } if column == "bonus"),
        "unexpected error: {err}"
    );
}

#[test]
fn test_unbalanced_regex_aborts_run() {
    let table = Table::from_raw(
        vec!["fruit".to_owned()],
        vec![vec!["apple".to_owned()], vec!["zzy".to_owned()]],
        &LoadOptions::default(),
    )
    .unwrap();
    let config = PipelineConfig {
        filters: vec![FilterRule::new("fruit", FilterOperator::Regex, "x)|(?:y")],
        ..PipelineConfig::default()
    };
    assert!(matches!(run(&table, &config), Err(SiftError::Config(_))));
}

#[test]
fn test_session_workflow() {
    let mut session = Session::new();
    let message = session
        .load_csv(
            std::fs::File::open("testdata/employees.csv").unwrap(),
            &LoadOptions::default(),
        )
        .unwrap();
    assert_eq!(message, "Loaded 10 rows and 7 columns");

    let json = std::fs::read_to_string("testdata/engineering_report.json").unwrap();
    session.load_config_json(&json).unwrap();
    assert_eq!(session.process().unwrap().row_count(), 3);

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("report.csv");
    export_to_path(session.result().unwrap(), ExportFormat::Csv, &path).unwrap();
    let written = std::fs::read(&path).unwrap();
    assert_eq!(written, session.export(ExportFormat::Csv).unwrap());
    assert_eq!(session.history().len(), 1);
}
