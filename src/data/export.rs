use std::path::Path;

use thiserror::Error;

use super::model::Table;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Serialize every column and row of `view` as CSV, header first.
/// Missing values become empty fields.
pub fn to_csv(view: &Table) -> Result<Vec<u8>, ExportError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(view.headers())?;
    for row in view.rows() {
        writer.write_record(row.iter().map(|v| v.to_string()))?;
    }
    writer
        .into_inner()
        .map_err(|e| ExportError::Io(e.into_error()))
}

/// Write [`to_csv`] output to `path`.
pub fn write_csv(view: &Table, path: &Path) -> Result<(), ExportError> {
    let bytes = to_csv(view)?;
    std::fs::write(path, bytes)?;
    log::info!("Exported {} rows to {}", view.len(), path.display());
    Ok(())
}
