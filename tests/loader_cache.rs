use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use arrow::array::{ArrayRef, Float64Array, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;

use brfss_dashboard::data::error::LoadError;
use brfss_dashboard::data::export::to_csv;
use brfss_dashboard::data::filter::apply;
use brfss_dashboard::data::loader::{DatasetLoader, LoadOptions};
use brfss_dashboard::data::model::Value;
use brfss_dashboard::data::schema::Column;
use brfss_dashboard::data::selection::{Choice, FilterOptions};
use tempfile::TempDir;

const SAMPLE: &str = "\
Class,Topic,AgeGroup,DemographicCategory,Demographic,YearStart,YearEnd,Data_Value,LocationAbbr,Geolocation
Mental Health,Frequent mental distress,Overall,Sex,Female,2015,2015,10,NY,POINT (-73.9 40.7)
Cognitive Decline,Subjective cognitive decline,50-64 years,Sex,Male,2016,2017,20,CA,invalid
Nutrition,Obesity,50-64 years,Sex,Male,2016,2017,40,CA,
";

fn write(dir: &TempDir, name: &str, contents: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, contents).unwrap();
    path
}

#[test]
fn repeated_loads_return_the_cached_table() {
    let dir = TempDir::new().unwrap();
    let path = write(&dir, "survey.csv", SAMPLE);
    let mut loader = DatasetLoader::default();

    let first = loader.load(&path).unwrap();
    // Changing the file does not matter once the path is cached.
    fs::write(&path, "Class\n").unwrap();
    let second = loader.load(&path).unwrap();
    assert!(Arc::ptr_eq(&first, &second));
    assert!(loader.is_cached(&path));

    let reloaded = loader.reload(&path).unwrap();
    assert!(!Arc::ptr_eq(&first, &reloaded));
    assert_eq!(reloaded.headers(), ["Class"]);

    assert!(loader.invalidate(&path));
    assert!(!loader.invalidate(&path));
    assert!(!loader.is_cached(&path));
}

#[test]
fn clear_forgets_every_path() {
    let dir = TempDir::new().unwrap();
    let a = write(&dir, "a.csv", SAMPLE);
    let b = write(&dir, "b.csv", SAMPLE);
    let mut loader = DatasetLoader::default();
    loader.load(&a).unwrap();
    loader.load(&b).unwrap();

    loader.clear();
    assert!(!loader.is_cached(&a));
    assert!(!loader.is_cached(&b));
}

#[test]
fn load_normalizes_once() {
    let dir = TempDir::new().unwrap();
    let path = write(&dir, "survey.csv", SAMPLE);
    let table = DatasetLoader::default().load(&path).unwrap();

    // Nutrition is outside the default class allow-list.
    assert_eq!(table.len(), 2);
    let ages: Vec<_> = table.column(Column::AgeGroup).unwrap().collect();
    assert_eq!(ages[0], &Value::Text("Overall (Aggregate)".into()));

    let lat = table.schema().require(Column::Latitude).unwrap();
    let lon = table.schema().require(Column::Longitude).unwrap();
    assert_eq!(table.value(0, lat), &Value::Float(40.7));
    assert_eq!(table.value(0, lon), &Value::Float(-73.9));
    assert_eq!(table.value(1, lat), &Value::Null);
}

#[test]
fn raw_options_keep_the_file_as_is() {
    let dir = TempDir::new().unwrap();
    let path = write(&dir, "survey.csv", SAMPLE);
    let table = DatasetLoader::new(LoadOptions::raw()).load(&path).unwrap();
    assert_eq!(table.len(), 3);
    assert!(!table.schema().capabilities().coordinates);
}

#[test]
fn tab_separated_and_json_inputs() {
    let dir = TempDir::new().unwrap();
    let tsv = write(&dir, "survey.tsv", &SAMPLE.replace(',', "\t"));
    let json = write(
        &dir,
        "survey.json",
        r#"[
            {"Class": "Mental Health", "YearStart": 2015, "YearEnd": 2015, "Data_Value": 10.5},
            {"Class": "Cognitive Decline", "YearStart": 2016, "YearEnd": 2016, "Data_Value": null}
        ]"#,
    );
    let mut loader = DatasetLoader::new(LoadOptions::raw());

    assert_eq!(loader.load(&tsv).unwrap().len(), 3);
    let table = loader.load(&json).unwrap();
    let mut headers = table.headers().to_vec();
    headers.sort();
    assert_eq!(headers, ["Class", "Data_Value", "YearEnd", "YearStart"]);
    assert_eq!(table.numeric(Column::DataValue).unwrap(), vec![10.5]);
}

#[test]
fn parquet_columns_keep_their_types() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("survey.parquet");

    let columns: Vec<ArrayRef> = vec![
        Arc::new(StringArray::from(vec![Some("Mental Health"), Some("Cognitive Decline")])),
        Arc::new(Int64Array::from(vec![2015, 2016])),
        Arc::new(Float64Array::from(vec![Some(12.5), None])),
    ];
    let schema = Arc::new(Schema::new(vec![
        Field::new("Class", DataType::Utf8, true),
        Field::new("YearStart", DataType::Int64, false),
        Field::new("Data_Value", DataType::Float64, true),
    ]));
    let batch = RecordBatch::try_new(schema.clone(), columns).unwrap();
    let mut writer = ArrowWriter::try_new(fs::File::create(&path).unwrap(), schema, None).unwrap();
    writer.write(&batch).unwrap();
    writer.close().unwrap();

    let table = DatasetLoader::new(LoadOptions::raw()).load(&path).unwrap();
    assert_eq!(table.headers(), ["Class", "YearStart", "Data_Value"]);
    assert_eq!(table.value(0, 0), &Value::Text("Mental Health".into()));
    assert_eq!(table.value(1, 1), &Value::Integer(2016));
    assert_eq!(table.value(0, 2), &Value::Float(12.5));
    assert_eq!(table.value(1, 2), &Value::Null);
}

#[test]
fn missing_and_malformed_files_are_load_errors() {
    let dir = TempDir::new().unwrap();
    let mut loader = DatasetLoader::default();

    let missing = dir.path().join("nope.csv");
    assert!(matches!(loader.load(&missing), Err(LoadError::Io { .. })));

    let ragged = write(&dir, "ragged.csv", "a,b\n1,2,3\n");
    assert!(matches!(loader.load(&ragged), Err(LoadError::Csv { .. })));

    let empty = write(&dir, "empty.csv", "");
    assert!(matches!(loader.load(&empty), Err(LoadError::Malformed { .. })));

    let not_array = write(&dir, "object.json", r#"{"Class": "Mental Health"}"#);
    assert!(matches!(loader.load(&not_array), Err(LoadError::Malformed { .. })));

    let broken = write(&dir, "broken.parquet", "definitely not parquet");
    assert!(matches!(loader.load(&broken), Err(LoadError::Parquet { .. })));

    assert!(!loader.is_cached(&ragged));
}

#[test]
fn load_filter_export_pipeline() {
    let dir = TempDir::new().unwrap();
    let path = write(&dir, "survey.csv", SAMPLE);
    let table = DatasetLoader::default().load(&path).unwrap();

    let options = FilterOptions::from_table(&table).unwrap();
    let mut selection = options.default_selection();
    selection.age_group = Choice::Only("50-64 years".into());
    selection.validate(&options).unwrap();

    let view = apply(&table, &selection).unwrap();
    assert_eq!(view.len(), 1);

    let csv = String::from_utf8(to_csv(&view).unwrap()).unwrap();
    let mut lines = csv.lines();
    assert_eq!(
        lines.next(),
        Some(
            "Class,Topic,AgeGroup,DemographicCategory,Demographic,YearStart,YearEnd,\
             Data_Value,LocationAbbr,Geolocation,Latitude,Longitude"
        )
    );
    assert_eq!(
        lines.next(),
        Some(
            "Cognitive Decline,Subjective cognitive decline,50-64 years,Sex,Male,\
             2016,2017,20,CA,invalid,,"
        )
    );
    assert_eq!(lines.next(), None);
}
