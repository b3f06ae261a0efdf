use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use super::error::SchemaError;
use super::schema::{Column, Schema};

// ---------------------------------------------------------------------------
// Value – a single cell
// ---------------------------------------------------------------------------

/// A dynamically-typed cell mirroring the dtypes a CSV reader infers.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Text(String),
    Integer(i64),
    Float(f64),
    Null,
}

/// Tokens read as missing, matching what pandas treats as NA by default.
const NA_TOKENS: [&str; 6] = ["NA", "N/A", "NaN", "nan", "null", "NULL"];

impl Value {
    /// Infer the type of a raw text field: integer, then float, else text.
    pub fn parse(raw: &str) -> Value {
        let s = raw.trim();
        if s.is_empty() || NA_TOKENS.contains(&s) {
            return Value::Null;
        }
        if let Ok(i) = s.parse::<i64>() {
            return Value::Integer(i);
        }
        if let Ok(f) = s.parse::<f64>() {
            if f.is_finite() {
                return Value::Float(f);
            }
        }
        Value::Text(s.to_string())
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Numeric view of the cell, if it has one.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(v) => Some(*v),
            Value::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    /// Whole-number view of the cell (years are sometimes written `2015.0`).
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            Value::Float(v) if v.fract() == 0.0 => Some(*v as i64),
            _ => None,
        }
    }

    /// Categorical label of the cell; `None` when missing.
    pub fn label(&self) -> Option<String> {
        match self {
            Value::Null => None,
            Value::Text(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Whether the cell's label equals `label` without allocating for text.
    pub fn matches_label(&self, label: &str) -> bool {
        match self {
            Value::Text(s) => s == label,
            Value::Null => false,
            other => other.to_string() == label,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Text(s) => write!(f, "{s}"),
            Value::Integer(i) => write!(f, "{i}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::Null => Ok(()),
        }
    }
}

// ---------------------------------------------------------------------------
// Table – the loaded dataset and every filtered view of it
// ---------------------------------------------------------------------------

/// One record, aligned with the table's headers.
pub type Row = Vec<Value>;

/// Rows plus the schema they share.
///
/// The loaded dataset and every filtered view are both `Table`s, so a view
/// can be filtered again or exported exactly like the source.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    schema: Arc<Schema>,
    rows: Vec<Row>,
}

impl Table {
    /// Build a table, padding short rows with `Null` and truncating long ones.
    pub fn new(headers: Vec<String>, rows: Vec<Row>) -> Self {
        Self::from_parts(Arc::new(Schema::from_headers(headers)), rows)
    }

    pub fn from_parts(schema: Arc<Schema>, mut rows: Vec<Row>) -> Self {
        let width = schema.width();
        for row in &mut rows {
            row.resize(width, Value::Null);
        }
        Table { schema, rows }
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn headers(&self) -> &[String] {
        self.schema.headers()
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Cell at `row`, column position `col`.
    pub fn value(&self, row: usize, col: usize) -> &Value {
        &self.rows[row][col]
    }

    /// Every cell of the column with `role`, in row order.
    pub fn column(&self, role: Column) -> Result<impl Iterator<Item = &Value> + '_, SchemaError> {
        let idx = self.schema.require(role)?;
        Ok(self.rows.iter().map(move |row| &row[idx]))
    }

    /// Numeric cells of `role`, missing and non-numeric cells skipped.
    pub fn numeric(&self, role: Column) -> Result<Vec<f64>, SchemaError> {
        Ok(self.column(role)?.filter_map(Value::as_f64).collect())
    }

    /// Sorted distinct labels of `role`, missing cells skipped.
    pub fn distinct_labels(&self, role: Column) -> Result<BTreeSet<String>, SchemaError> {
        Ok(self.column(role)?.filter_map(Value::label).collect())
    }

    /// New table holding the rows at `indices`, in that order.
    pub fn select(&self, indices: &[usize]) -> Table {
        Table {
            schema: Arc::clone(&self.schema),
            rows: indices.iter().map(|&i| self.rows[i].clone()).collect(),
        }
    }

    /// Keep only rows for which `keep` returns true.
    pub fn retain_rows<F: FnMut(&Row) -> bool>(&self, mut keep: F) -> Table {
        Table {
            schema: Arc::clone(&self.schema),
            rows: self.rows.iter().filter(|r| keep(r)).cloned().collect(),
        }
    }

    /// Table with the column `header` set to `values`, appended when new.
    ///
    /// `values` must hold one entry per row.
    pub fn with_column(&self, header: &str, values: Vec<Value>) -> Table {
        debug_assert_eq!(values.len(), self.rows.len());
        let (schema, idx) = self.schema.with_header(header);
        let width = schema.width();
        let rows = self
            .rows
            .iter()
            .zip(values)
            .map(|(row, value)| {
                let mut row = row.clone();
                row.resize(width, Value::Null);
                row[idx] = value;
                row
            })
            .collect();
        Table {
            schema: Arc::new(schema),
            rows,
        }
    }
}
