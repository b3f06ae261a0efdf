use std::collections::HashMap;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use arrow::array::{Array, AsArray};
use arrow::datatypes::{DataType, Float32Type, Float64Type, Int16Type, Int32Type, Int64Type};
use arrow::util::display::array_value_to_string;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde::Deserialize;
use serde_json::Value as JsonValue;

use super::error::LoadError;
use super::geo;
use super::model::{Row, Table, Value};
use super::schema::Column;

// ---------------------------------------------------------------------------
// Load options – normalization applied once per load
// ---------------------------------------------------------------------------

/// Replace one categorical value with another in a given column.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Relabel {
    pub column: Column,
    pub from: String,
    pub to: String,
}

/// Normalization performed right after parsing, before caching.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct LoadOptions {
    pub relabel: Vec<Relabel>,
    /// Rows whose `Class` is not listed are dropped. Empty keeps every row.
    pub class_allow_list: Vec<String>,
    /// Parse `Geolocation` into `Latitude`/`Longitude` at load time.
    pub derive_coordinates: bool,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            relabel: vec![Relabel {
                column: Column::AgeGroup,
                from: "Overall".to_string(),
                to: "Overall (Aggregate)".to_string(),
            }],
            class_allow_list: vec![
                "Mental Health".to_string(),
                "Cognitive Decline".to_string(),
                "Smoking and Alcohol Use".to_string(),
            ],
            derive_coordinates: true,
        }
    }
}

impl LoadOptions {
    /// Options that keep the file exactly as parsed.
    pub fn raw() -> Self {
        Self {
            relabel: Vec::new(),
            class_allow_list: Vec::new(),
            derive_coordinates: false,
        }
    }
}

// ---------------------------------------------------------------------------
// DatasetLoader – path-keyed cache of loaded tables
// ---------------------------------------------------------------------------

/// Loads survey extracts and keeps each one for the life of the loader.
///
/// Repeated loads of the same path return the same `Arc` without touching
/// the file again. The cache is only ever emptied explicitly.
#[derive(Debug, Default)]
pub struct DatasetLoader {
    options: LoadOptions,
    cache: HashMap<PathBuf, Arc<Table>>,
}

impl DatasetLoader {
    pub fn new(options: LoadOptions) -> Self {
        Self {
            options,
            cache: HashMap::new(),
        }
    }

    pub fn options(&self) -> &LoadOptions {
        &self.options
    }

    /// Load and normalize `path`, or return the cached table.
    pub fn load(&mut self, path: impl AsRef<Path>) -> Result<Arc<Table>, LoadError> {
        let key = cache_key(path.as_ref());
        if let Some(table) = self.cache.get(&key) {
            log::debug!("cache hit for {}", key.display());
            return Ok(Arc::clone(table));
        }

        let raw = load_file(path.as_ref())?;
        let table = Arc::new(normalize(raw, &self.options));
        log::info!(
            "Loaded {} rows with columns {:?} from {}",
            table.len(),
            table.headers(),
            key.display()
        );
        self.cache.insert(key, Arc::clone(&table));
        Ok(table)
    }

    /// Drop the cached table for `path`. Returns whether one was cached.
    pub fn invalidate(&mut self, path: impl AsRef<Path>) -> bool {
        self.cache.remove(&cache_key(path.as_ref())).is_some()
    }

    /// Re-read `path` from disk, replacing any cached copy.
    pub fn reload(&mut self, path: impl AsRef<Path>) -> Result<Arc<Table>, LoadError> {
        self.invalidate(path.as_ref());
        self.load(path)
    }

    pub fn is_cached(&self, path: impl AsRef<Path>) -> bool {
        self.cache.contains_key(&cache_key(path.as_ref()))
    }

    pub fn clear(&mut self) {
        self.cache.clear();
    }
}

fn cache_key(path: &Path) -> PathBuf {
    std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}

// ---------------------------------------------------------------------------
// Normalization
// ---------------------------------------------------------------------------

/// Apply relabel rules, the class allow-list and coordinate derivation.
///
/// Rules whose column is absent are skipped; the missing column surfaces
/// later, when a filter or reducer needs it.
pub fn normalize(table: Table, options: &LoadOptions) -> Table {
    let mut table = table;

    for rule in &options.relabel {
        let Some(idx) = table.schema().position(rule.column) else {
            log::warn!(
                "relabel skipped: column `{}` not present",
                rule.column.header()
            );
            continue;
        };
        let rows = table
            .rows()
            .iter()
            .map(|row| {
                let mut row = row.clone();
                if row[idx].matches_label(&rule.from) {
                    row[idx] = Value::Text(rule.to.clone());
                }
                row
            })
            .collect();
        table = Table::from_parts(Arc::new(table.schema().clone()), rows);
    }

    if !options.class_allow_list.is_empty() {
        match table.schema().position(Column::Class) {
            Some(idx) => {
                table = table.retain_rows(|row| {
                    options
                        .class_allow_list
                        .iter()
                        .any(|class| row[idx].matches_label(class))
                });
            }
            None => log::warn!("class allow-list skipped: column `Class` not present"),
        }
    }

    if options.derive_coordinates && table.schema().capabilities().geolocation {
        table = geo::geocoordinate_parse(&table).unwrap_or(table);
    }

    table
}

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Parse a survey extract without normalizing it.  Dispatch by extension.
///
/// Supported formats:
/// * `.csv`        – comma-delimited with a header row
/// * `.tsv`/`.tab` – tab-delimited with a header row
/// * `.json`       – `[{ "Class": ..., "Data_Value": ... }, ...]`
/// * `.parquet`    – flat columns of strings, integers and floats
pub fn load_file(path: &Path) -> Result<Table, LoadError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    match ext.as_str() {
        "csv" => load_delimited(path, b','),
        "tsv" | "tab" => load_delimited(path, b'\t'),
        "json" => load_json(path),
        "parquet" | "pq" => load_parquet(path),
        other => Err(LoadError::UnsupportedFormat(other.to_string())),
    }
}

// ---------------------------------------------------------------------------
// Delimited loader
// ---------------------------------------------------------------------------

fn load_delimited(path: &Path, delimiter: u8) -> Result<Table, LoadError> {
    let file = std::fs::File::open(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    match read_delimited(file, delimiter) {
        Ok(Some(table)) => Ok(table),
        Ok(None) => Err(LoadError::Malformed {
            path: path.to_path_buf(),
            message: "no header row".to_string(),
        }),
        Err(source) => Err(LoadError::Csv {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Read a delimited stream with a header row.
///
/// Returns `Ok(None)` when the stream has no header row at all. Rows with a
/// different number of fields than the header are a parse error.
pub fn read_delimited<R: Read>(reader: R, delimiter: u8) -> Result<Option<Table>, csv::Error> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .from_reader(reader);
    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();
    if headers.is_empty() {
        return Ok(None);
    }

    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result?;
        let row: Row = record.iter().map(Value::parse).collect();
        rows.push(row);
    }
    Ok(Some(Table::new(headers, rows)))
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Expected JSON schema (records-oriented, `df.to_json(orient='records')`):
///
/// ```json
/// [
///   { "Class": "Mental Health", "YearStart": 2015, "Data_Value": 12.1 },
///   ...
/// ]
/// ```
///
/// Headers are the union of all keys, in order of first appearance.
fn load_json(path: &Path) -> Result<Table, LoadError> {
    let text = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let root: JsonValue = serde_json::from_str(&text).map_err(|source| LoadError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    let malformed = |message: String| LoadError::Malformed {
        path: path.to_path_buf(),
        message,
    };

    let records = root
        .as_array()
        .ok_or_else(|| malformed("expected top-level JSON array".to_string()))?;

    let mut headers: Vec<String> = Vec::new();
    let mut objects = Vec::with_capacity(records.len());
    for (i, rec) in records.iter().enumerate() {
        let obj = rec
            .as_object()
            .ok_or_else(|| malformed(format!("row {i} is not a JSON object")))?;
        for key in obj.keys() {
            if !headers.contains(key) {
                headers.push(key.clone());
            }
        }
        objects.push(obj);
    }

    let rows = objects
        .iter()
        .map(|obj| {
            headers
                .iter()
                .map(|h| obj.get(h).map(json_to_value).unwrap_or(Value::Null))
                .collect()
        })
        .collect();

    Ok(Table::new(headers, rows))
}

fn json_to_value(val: &JsonValue) -> Value {
    match val {
        JsonValue::String(s) => Value::parse(s),
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::Integer(i)
            } else if let Some(f) = n.as_f64() {
                Value::Float(f)
            } else {
                Value::Text(n.to_string())
            }
        }
        JsonValue::Null => Value::Null,
        other => Value::Text(other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet file with one flat column per survey field.
///
/// Works with files written by both **Pandas** (`df.to_parquet()`) and
/// **Polars** (`df.write_parquet()`).
fn load_parquet(path: &Path) -> Result<Table, LoadError> {
    let parquet_err = |source| LoadError::Parquet {
        path: path.to_path_buf(),
        source,
    };
    let file = std::fs::File::open(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file).map_err(parquet_err)?;
    let headers: Vec<String> = builder
        .schema()
        .fields()
        .iter()
        .map(|f| f.name().clone())
        .collect();
    let reader = builder.build().map_err(parquet_err)?;

    let mut rows = Vec::new();
    for batch_result in reader {
        let batch = batch_result.map_err(|source| LoadError::Arrow {
            path: path.to_path_buf(),
            source,
        })?;
        for row in 0..batch.num_rows() {
            let cells: Row = batch
                .columns()
                .iter()
                .map(|col| extract_value(col.as_ref(), row))
                .collect();
            rows.push(cells);
        }
    }

    Ok(Table::new(headers, rows))
}

/// Extract a single cell from an Arrow column at a given row.
fn extract_value(col: &dyn Array, row: usize) -> Value {
    if col.is_null(row) {
        return Value::Null;
    }
    match col.data_type() {
        DataType::Utf8 => Value::parse(col.as_string::<i32>().value(row)),
        DataType::LargeUtf8 => Value::parse(col.as_string::<i64>().value(row)),
        DataType::Int16 => Value::Integer(col.as_primitive::<Int16Type>().value(row) as i64),
        DataType::Int32 => Value::Integer(col.as_primitive::<Int32Type>().value(row) as i64),
        DataType::Int64 => Value::Integer(col.as_primitive::<Int64Type>().value(row)),
        DataType::Float32 => float_value(col.as_primitive::<Float32Type>().value(row) as f64),
        DataType::Float64 => float_value(col.as_primitive::<Float64Type>().value(row)),
        _ => match array_value_to_string(col, row) {
            Ok(s) => Value::parse(&s),
            Err(_) => Value::Null,
        },
    }
}

fn float_value(v: f64) -> Value {
    if v.is_finite() {
        Value::Float(v)
    } else {
        Value::Null
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn read(text: &str) -> Table {
        read_delimited(text.as_bytes(), b',').unwrap().unwrap()
    }

    #[test]
    fn reads_header_and_typed_cells() {
        let t = read("Class,YearStart,Data_Value\nMental Health,2015,12.5\nCognitive Decline,2016,\n");
        assert_eq!(t.headers(), ["Class", "YearStart", "Data_Value"]);
        assert_eq!(t.len(), 2);
        assert_eq!(t.value(0, 1), &Value::Integer(2015));
        assert_eq!(t.value(1, 2), &Value::Null);
    }

    #[test]
    fn ragged_rows_are_an_error() {
        assert!(read_delimited("a,b\n1,2,3\n".as_bytes(), b',').is_err());
    }

    #[test]
    fn empty_input_has_no_header() {
        assert!(read_delimited("".as_bytes(), b',').unwrap().is_none());
    }

    #[test]
    fn normalize_relabels_and_restricts_classes() {
        let t = read(
            "Class,AgeGroup\n\
             Mental Health,Overall\n\
             Nutrition,Overall\n\
             Cognitive Decline,50-64 years\n",
        );
        let t = normalize(t, &LoadOptions::default());
        assert_eq!(t.len(), 2);
        assert_eq!(t.value(0, 1), &Value::Text("Overall (Aggregate)".into()));
        assert_eq!(t.value(1, 1), &Value::Text("50-64 years".into()));
    }

    #[test]
    fn normalize_skips_rules_for_absent_columns() {
        let t = read("Topic,Data_Value\nA,1\n");
        let t = normalize(t, &LoadOptions::default());
        assert_eq!(t.len(), 1);
    }

    #[test]
    fn normalize_derives_coordinates() {
        let t = read("Class,Geolocation\nMental Health,POINT (-73.9 40.7)\n");
        let t = normalize(t, &LoadOptions::default());
        assert!(t.schema().capabilities().coordinates);
    }

    #[test]
    fn unknown_extension_is_rejected() {
        let err = load_file(Path::new("survey.xlsx")).unwrap_err();
        assert!(matches!(err, LoadError::UnsupportedFormat(ext) if ext == "xlsx"));
    }
}
