use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;

use crate::config::DashboardConfig;
use crate::data::error::{LoadError, SchemaError};
use crate::data::export::{self, ExportError};
use crate::data::filter::FilterEngine;
use crate::data::loader::DatasetLoader;
use crate::data::model::Table;
use crate::data::selection::{
    Choice, FilterOptions, Selection, SelectionError, ALL_AGE_GROUPS, ALL_DEMOGRAPHICS,
};
use crate::data::summary::Summary;

#[derive(Debug, Error)]
pub enum StateError {
    #[error(transparent)]
    Load(#[from] LoadError),
    #[error(transparent)]
    Schema(#[from] SchemaError),
    #[error(transparent)]
    Selection(#[from] SelectionError),
    #[error(transparent)]
    Export(#[from] ExportError),
    #[error("no dataset loaded")]
    NoDataset,
}

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full dashboard state, independent of rendering.
///
/// Every selection change recomputes `view` and `summary` from scratch.
pub struct AppState {
    pub config: DashboardConfig,
    loader: DatasetLoader,
    engine: FilterEngine,

    /// Loaded dataset (None until a file is opened).
    pub dataset: Option<Arc<Table>>,
    pub source_path: Option<PathBuf>,

    /// Values offered by the filter widgets.
    pub options: FilterOptions,
    pub selection: Selection,

    /// Rows passing the current selection.
    pub view: Option<Table>,
    pub summary: Option<Summary>,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(DashboardConfig::default())
    }
}

impl AppState {
    pub fn new(config: DashboardConfig) -> Self {
        Self {
            loader: DatasetLoader::new(config.loader.clone()),
            engine: config.filter,
            config,
            dataset: None,
            source_path: None,
            options: FilterOptions::default(),
            selection: Selection::default(),
            view: None,
            summary: None,
            status_message: None,
        }
    }

    /// Open `path` (cached after the first time) and reset the filters.
    ///
    /// On failure the previously opened dataset stays in place.
    pub fn open(&mut self, path: &Path) -> Result<(), StateError> {
        let result = self.loader.load(path);
        let dataset = self.record(result)?;
        self.switch_to(dataset, Some(path.to_path_buf()))
    }

    /// Re-read the current file from disk.
    pub fn reload(&mut self) -> Result<(), StateError> {
        let path = self.source_path.clone().ok_or(StateError::NoDataset)?;
        let result = self.loader.reload(&path);
        let dataset = self.record(result)?;
        self.switch_to(dataset, Some(path))
    }

    /// Show an in-memory dataset that has no file behind it.
    pub fn set_dataset(&mut self, dataset: Arc<Table>) -> Result<(), StateError> {
        self.switch_to(dataset, None)
    }

    /// Recompute the filtered view and every aggregate.
    pub fn refilter(&mut self) -> Result<(), StateError> {
        let Some(dataset) = self.dataset.clone() else {
            return Err(StateError::NoDataset);
        };
        let computed = self.compute(&dataset, &self.selection);
        match self.record(computed) {
            Ok((view, summary)) => {
                self.view = Some(view);
                self.summary = Some(summary);
                Ok(())
            }
            Err(e) => {
                self.view = None;
                self.summary = None;
                Err(e)
            }
        }
    }

    /// Replace the session with `dataset`, or change nothing if its options,
    /// view or summary cannot be built.
    fn switch_to(&mut self, dataset: Arc<Table>, source: Option<PathBuf>) -> Result<(), StateError> {
        let prepared = FilterOptions::from_table(&dataset).and_then(|options| {
            let selection = options.default_selection();
            let (view, summary) = self.compute(&dataset, &selection)?;
            Ok((options, selection, view, summary))
        });
        let (options, selection, view, summary) = self.record(prepared)?;

        self.dataset = Some(dataset);
        self.source_path = source;
        self.options = options;
        self.selection = selection;
        self.view = Some(view);
        self.summary = Some(summary);
        self.status_message = None;
        Ok(())
    }

    fn compute(&self, dataset: &Table, selection: &Selection) -> Result<(Table, Summary), SchemaError> {
        let view = self.engine.apply(dataset, selection)?;
        let summary = Summary::compute(&view, &self.config.summary)?;
        Ok((view, summary))
    }

    pub fn set_age_group(&mut self, label: &str) -> Result<(), StateError> {
        self.update(|s| s.age_group = Choice::from_label(label, ALL_AGE_GROUPS))
    }

    pub fn set_demographic(&mut self, label: &str) -> Result<(), StateError> {
        self.update(|s| s.demographic = Choice::from_label(label, ALL_DEMOGRAPHICS))
    }

    /// Add `topic` to the topic filter, or remove it if already chosen.
    pub fn toggle_topic(&mut self, topic: &str) -> Result<(), StateError> {
        self.update(|s| {
            if !s.topics.remove(topic) {
                s.topics.insert(topic.to_string());
            }
        })
    }

    pub fn clear_topics(&mut self) -> Result<(), StateError> {
        self.update(|s| s.topics.clear())
    }

    pub fn set_year_range(&mut self, lo: i64, hi: i64) -> Result<(), StateError> {
        self.update(|s| s.year_range = (lo, hi))
    }

    pub fn set_cap_outliers(&mut self, cap: bool) -> Result<(), StateError> {
        self.update(|s| s.cap_outliers = cap)
    }

    pub fn reset_filters(&mut self) -> Result<(), StateError> {
        let defaults = self.options.default_selection();
        self.update(|s| *s = defaults)
    }

    /// Write the current view to `path` as CSV.
    pub fn export_csv(&mut self, path: &Path) -> Result<(), StateError> {
        let Some(view) = &self.view else {
            return Err(StateError::NoDataset);
        };
        let result = export::write_csv(view, path);
        self.record(result)
    }

    /// Apply `change` to a copy of the selection and keep it only if valid.
    fn update<F: FnOnce(&mut Selection)>(&mut self, change: F) -> Result<(), StateError> {
        let mut next = self.selection.clone();
        change(&mut next);
        let valid = next.validate(&self.options);
        self.record(valid)?;
        self.selection = next;
        self.refilter()
    }

    /// Log a failure and surface it in the status line.
    fn record<T, E: Into<StateError>>(&mut self, result: Result<T, E>) -> Result<T, StateError> {
        result.map_err(|e| {
            let e = e.into();
            log::error!("{e}");
            self.status_message = Some(format!("Error: {e}"));
            e
        })
    }
}
