use std::collections::BTreeSet;

use thiserror::Error;

use super::error::SchemaError;
use super::model::{Table, Value};
use super::schema::Column;

/// Widget label meaning "no age-group restriction".
pub const ALL_AGE_GROUPS: &str = "All Age Groups";
/// Widget label meaning "no demographic restriction".
pub const ALL_DEMOGRAPHICS: &str = "All";

// ---------------------------------------------------------------------------
// Choice – a single-valued filter dimension
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Choice {
    #[default]
    All,
    Only(String),
}

impl Choice {
    /// Map a widget label to a choice; `sentinel` means [`Choice::All`].
    pub fn from_label(label: &str, sentinel: &str) -> Choice {
        if label == sentinel {
            Choice::All
        } else {
            Choice::Only(label.to_string())
        }
    }

    /// Widget label of the choice, using `sentinel` for [`Choice::All`].
    pub fn label<'a>(&'a self, sentinel: &'a str) -> &'a str {
        match self {
            Choice::All => sentinel,
            Choice::Only(s) => s,
        }
    }
}

// ---------------------------------------------------------------------------
// Selection – the user's current filter state
// ---------------------------------------------------------------------------

/// Everything the user has chosen in the filter panel.
///
/// An empty `topics` set means "every topic", not "no topic".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub age_group: Choice,
    pub demographic: Choice,
    pub topics: BTreeSet<String>,
    /// Inclusive `(lo, hi)` bounds on each row's own `YearStart..=YearEnd`.
    pub year_range: (i64, i64),
    pub cap_outliers: bool,
}

impl Default for Selection {
    fn default() -> Self {
        Self {
            age_group: Choice::All,
            demographic: Choice::All,
            topics: BTreeSet::new(),
            year_range: (i64::MIN, i64::MAX),
            cap_outliers: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectionError {
    #[error("unknown age group `{0}`")]
    UnknownAgeGroup(String),
    #[error("unknown demographic `{0}`")]
    UnknownDemographic(String),
    #[error("unknown topic `{0}`")]
    UnknownTopic(String),
    #[error("year range {lo}..={hi} is inverted")]
    InvertedYearRange { lo: i64, hi: i64 },
}

impl Selection {
    /// Check every chosen value against what the dataset offers.
    pub fn validate(&self, options: &FilterOptions) -> Result<(), SelectionError> {
        if let Choice::Only(age) = &self.age_group {
            if !options.age_groups.contains(age) {
                return Err(SelectionError::UnknownAgeGroup(age.clone()));
            }
        }
        if let Choice::Only(demo) = &self.demographic {
            if !options.demographics.contains(demo) {
                return Err(SelectionError::UnknownDemographic(demo.clone()));
            }
        }
        if let Some(topic) = self.topics.iter().find(|t| !options.topics.contains(*t)) {
            return Err(SelectionError::UnknownTopic(topic.clone()));
        }
        let (lo, hi) = self.year_range;
        if lo > hi {
            return Err(SelectionError::InvertedYearRange { lo, hi });
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// FilterOptions – the dimensions offered by a loaded dataset
// ---------------------------------------------------------------------------

/// Distinct values available for each filter widget.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterOptions {
    pub age_groups: Vec<String>,
    pub demographics: Vec<String>,
    /// Distinct `Class` values; the topic filter works on this column.
    pub topics: Vec<String>,
    /// `(min YearStart, max YearEnd)`, `None` when the table has no years.
    pub years: Option<(i64, i64)>,
}

impl FilterOptions {
    pub fn from_table(table: &Table) -> Result<Self, SchemaError> {
        let min_start = table.column(Column::YearStart)?.filter_map(Value::as_i64).min();
        let max_end = table.column(Column::YearEnd)?.filter_map(Value::as_i64).max();
        Ok(Self {
            age_groups: table.distinct_labels(Column::AgeGroup)?.into_iter().collect(),
            demographics: table
                .distinct_labels(Column::Demographic)?
                .into_iter()
                .map(|d| d.trim().to_string())
                .collect::<BTreeSet<_>>()
                .into_iter()
                .collect(),
            topics: table.distinct_labels(Column::Class)?.into_iter().collect(),
            years: min_start.zip(max_end),
        })
    }

    /// Age-group widget entries, sentinel first.
    pub fn age_group_choices(&self) -> Vec<String> {
        std::iter::once(ALL_AGE_GROUPS.to_string())
            .chain(self.age_groups.iter().cloned())
            .collect()
    }

    /// Demographic widget entries, sentinel first.
    pub fn demographic_choices(&self) -> Vec<String> {
        std::iter::once(ALL_DEMOGRAPHICS.to_string())
            .chain(self.demographics.iter().cloned())
            .collect()
    }

    /// Selection with nothing restricted and the full year span.
    pub fn default_selection(&self) -> Selection {
        Selection {
            year_range: self.years.unwrap_or((i64::MIN, i64::MAX)),
            ..Selection::default()
        }
    }
}
