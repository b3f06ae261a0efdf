use std::path::PathBuf;

use thiserror::Error;

/// Failure to turn a source file into a [`Table`](super::model::Table).
///
/// Loading is all-or-nothing: no partial dataset is ever returned.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse delimited file {}: {source}", path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
    #[error("failed to parse JSON file {}: {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to read parquet file {}: {source}", path.display())]
    Parquet {
        path: PathBuf,
        #[source]
        source: parquet::errors::ParquetError,
    },
    #[error("failed to decode record batch in {}: {source}", path.display())]
    Arrow {
        path: PathBuf,
        #[source]
        source: arrow::error::ArrowError,
    },
    #[error("{}: {message}", path.display())]
    Malformed { path: PathBuf, message: String },
    #[error("unsupported file extension: .{0}")]
    UnsupportedFormat(String),
}

/// A column role needed by a filter or reducer is absent from the table.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    #[error("missing column `{0}`")]
    MissingColumn(&'static str),
    #[error("missing topic column (expected `Topic` or `Question`)")]
    NoTopicColumn,
}
