use serde::Deserialize;

use super::error::SchemaError;
use super::metrics::quantile;
use super::model::{Row, Table};
use super::schema::Column;
use super::selection::{Choice, Selection};

// ---------------------------------------------------------------------------
// Outlier capping settings
// ---------------------------------------------------------------------------

/// Which per-row measure outlier capping compares against the threshold.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutlierMeasure {
    /// Confidence-interval width when the table has both limits, else
    /// `Data_Value`.
    #[default]
    Auto,
    /// `Data_Value` itself.
    Value,
    /// `|High_Confidence_Limit - Low_Confidence_Limit|`. Capping is skipped
    /// for tables without both limits.
    ConfidenceWidth,
}

/// Applies a [`Selection`] to a table.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct FilterEngine {
    pub outlier_measure: OutlierMeasure,
    /// Quantile above which rows count as outliers.
    pub outlier_quantile: f64,
}

impl Default for FilterEngine {
    fn default() -> Self {
        Self {
            outlier_measure: OutlierMeasure::Auto,
            outlier_quantile: 0.99,
        }
    }
}

/// Filter `table` with the default engine settings.
pub fn apply(table: &Table, selection: &Selection) -> Result<Table, SchemaError> {
    FilterEngine::default().apply(table, selection)
}

impl FilterEngine {
    /// Return the rows of `table` that pass every active predicate.
    ///
    /// Predicates narrow the surviving row set one after another:
    /// * age group / demographic – equality, skipped for [`Choice::All`]
    /// * topics – `Class` membership, skipped when the set is empty
    /// * years – the row's own `YearStart..=YearEnd` lies inside the range
    /// * outliers – measure at or below the quantile of the survivors so far
    pub fn apply(&self, table: &Table, selection: &Selection) -> Result<Table, SchemaError> {
        let schema = table.schema();
        let mut keep: Vec<usize> = (0..table.len()).collect();

        if let Choice::Only(age) = &selection.age_group {
            let idx = schema.require(Column::AgeGroup)?;
            keep.retain(|&i| table.value(i, idx).matches_label(age));
        }

        if let Choice::Only(demo) = &selection.demographic {
            let idx = schema.require(Column::Demographic)?;
            keep.retain(|&i| table.value(i, idx).matches_label(demo));
        }

        if !selection.topics.is_empty() {
            let idx = schema.require(Column::Class)?;
            keep.retain(|&i| {
                table
                    .value(i, idx)
                    .label()
                    .is_some_and(|class| selection.topics.contains(&class))
            });
        }

        let start = schema.require(Column::YearStart)?;
        let end = schema.require(Column::YearEnd)?;
        let (lo, hi) = selection.year_range;
        keep.retain(|&i| {
            let row = &table.rows()[i];
            match (row[start].as_f64(), row[end].as_f64()) {
                (Some(s), Some(e)) => s >= lo as f64 && e <= hi as f64,
                _ => false,
            }
        });

        if selection.cap_outliers {
            keep = self.cap_outliers(table, keep)?;
        }

        log::debug!("filter kept {} of {} rows", keep.len(), table.len());
        Ok(table.select(&keep))
    }

    /// The concrete measure capping uses on `table`.
    pub fn resolve_measure(&self, table: &Table) -> OutlierMeasure {
        match self.outlier_measure {
            OutlierMeasure::Auto if table.schema().capabilities().confidence_interval => {
                OutlierMeasure::ConfidenceWidth
            }
            OutlierMeasure::Auto => OutlierMeasure::Value,
            measure => measure,
        }
    }

    fn cap_outliers(&self, table: &Table, keep: Vec<usize>) -> Result<Vec<usize>, SchemaError> {
        let schema = table.schema();
        let measure: Box<dyn Fn(&Row) -> Option<f64>> = match self.resolve_measure(table) {
            OutlierMeasure::ConfidenceWidth => {
                if !schema.capabilities().confidence_interval {
                    log::debug!("outlier capping skipped: no confidence interval columns");
                    return Ok(keep);
                }
                let low = schema.require(Column::LowConfidenceLimit)?;
                let high = schema.require(Column::HighConfidenceLimit)?;
                Box::new(move |row: &Row| Some((row[high].as_f64()? - row[low].as_f64()?).abs()))
            }
            // `Auto` is resolved above; only `Value` reaches here.
            OutlierMeasure::Auto | OutlierMeasure::Value => {
                let idx = schema.require(Column::DataValue)?;
                Box::new(move |row: &Row| row[idx].as_f64())
            }
        };

        let rows = table.rows();
        let values: Vec<f64> = keep.iter().filter_map(|&i| measure(&rows[i])).collect();
        let Some(cap) = quantile(&values, self.outlier_quantile) else {
            // No measurable rows survive a comparison against a threshold.
            return Ok(Vec::new());
        };
        log::debug!("outlier cap at {cap}");
        Ok(keep
            .into_iter()
            .filter(|&i| measure(&rows[i]).is_some_and(|v| v <= cap))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::*;
    use crate::data::model::Value;

    fn table(rows: &[(&str, &str, i64, i64, Option<f64>)]) -> Table {
        let headers = ["Class", "AgeGroup", "YearStart", "YearEnd", "Data_Value"]
            .iter()
            .map(|h| h.to_string())
            .collect();
        let rows = rows
            .iter()
            .map(|(class, age, start, end, value)| {
                vec![
                    Value::Text(class.to_string()),
                    Value::Text(age.to_string()),
                    Value::Integer(*start),
                    Value::Integer(*end),
                    value.map(Value::Float).unwrap_or(Value::Null),
                ]
            })
            .collect();
        Table::new(headers, rows)
    }

    #[test]
    fn year_range_requires_containment_not_overlap() {
        let t = table(&[
            ("A", "x", 2015, 2015, Some(10.0)),
            ("B", "x", 2014, 2016, Some(20.0)),
            ("C", "x", 2016, 2018, Some(30.0)),
        ]);
        let s = Selection {
            year_range: (2015, 2017),
            ..Selection::default()
        };
        let out = apply(&t, &s).unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out.value(0, 0), &Value::Text("A".into()));
    }

    #[test]
    fn empty_topic_set_is_unrestricted() {
        let t = table(&[
            ("A", "x", 2015, 2015, Some(1.0)),
            ("B", "x", 2015, 2015, Some(2.0)),
        ]);
        assert_eq!(apply(&t, &Selection::default()).unwrap().len(), 2);

        let s = Selection {
            topics: BTreeSet::from(["B".to_string()]),
            ..Selection::default()
        };
        let out = apply(&t, &s).unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out.value(0, 0), &Value::Text("B".into()));
    }

    #[test]
    fn age_group_filter_matches_exactly() {
        let t = table(&[
            ("A", "50-64 years", 2015, 2015, Some(1.0)),
            ("A", "65 years or older", 2015, 2015, Some(2.0)),
        ]);
        let s = Selection {
            age_group: Choice::Only("65 years or older".into()),
            ..Selection::default()
        };
        assert_eq!(apply(&t, &s).unwrap().len(), 1);
    }

    #[test]
    fn capping_uses_quantile_of_filtered_rows() {
        let mut rows: Vec<(&str, &str, i64, i64, Option<f64>)> = (1..=100)
            .map(|v| ("A", "x", 2015, 2015, Some(v as f64)))
            .collect();
        // Out of the year range, so it must not influence the threshold.
        rows.push(("A", "x", 2030, 2030, Some(1_000.0)));
        let t = table(&rows);
        let s = Selection {
            year_range: (2015, 2020),
            cap_outliers: true,
            ..Selection::default()
        };
        let out = apply(&t, &s).unwrap();
        // p99 of 1..=100 is 99.01, so only 100 is dropped.
        assert_eq!(out.len(), 99);
    }

    #[test]
    fn capping_drops_rows_without_a_value() {
        let t = table(&[
            ("A", "x", 2015, 2015, Some(1.0)),
            ("A", "x", 2015, 2015, None),
        ]);
        let s = Selection {
            cap_outliers: true,
            ..Selection::default()
        };
        assert_eq!(apply(&t, &s).unwrap().len(), 1);
    }

    #[test]
    fn confidence_width_capping_without_limits_is_a_no_op() {
        let t = table(&[
            ("A", "x", 2015, 2015, Some(1.0)),
            ("A", "x", 2015, 2015, Some(500.0)),
        ]);
        let engine = FilterEngine {
            outlier_measure: OutlierMeasure::ConfidenceWidth,
            ..FilterEngine::default()
        };
        let s = Selection {
            cap_outliers: true,
            ..Selection::default()
        };
        assert_eq!(engine.apply(&t, &s).unwrap().len(), 2);
    }

    #[test]
    fn confidence_width_capping_drops_widest_interval() {
        let headers = ["YearStart", "YearEnd", "Low_Confidence_Limit", "High_Confidence_Limit"]
            .iter()
            .map(|h| h.to_string())
            .collect();
        let rows = (0..100)
            .map(|i| {
                let width = if i == 99 { 90.0 } else { 1.0 };
                vec![
                    Value::Integer(2015),
                    Value::Integer(2015),
                    Value::Float(10.0),
                    Value::Float(10.0 + width),
                ]
            })
            .collect();
        let t = Table::new(headers, rows);
        let engine = FilterEngine {
            outlier_measure: OutlierMeasure::ConfidenceWidth,
            ..FilterEngine::default()
        };
        let s = Selection {
            cap_outliers: true,
            ..Selection::default()
        };
        assert_eq!(engine.apply(&t, &s).unwrap().len(), 99);
    }

    #[test]
    fn default_measure_follows_confidence_interval_capability() {
        let engine = FilterEngine::default();
        assert_eq!(engine.outlier_measure, OutlierMeasure::Auto);

        let plain = table(&[("A", "x", 2015, 2015, Some(1.0))]);
        assert_eq!(engine.resolve_measure(&plain), OutlierMeasure::Value);

        // Values are flat, widths are not: only the wide interval is capped.
        let headers = [
            "YearStart",
            "YearEnd",
            "Data_Value",
            "Low_Confidence_Limit",
            "High_Confidence_Limit",
        ]
        .iter()
        .map(|h| h.to_string())
        .collect();
        let rows = (0..100)
            .map(|i| {
                let (value, width) = if i == 0 { (1.0, 90.0) } else { (50.0, 1.0) };
                vec![
                    Value::Integer(2015),
                    Value::Integer(2015),
                    Value::Float(value),
                    Value::Float(10.0),
                    Value::Float(10.0 + width),
                ]
            })
            .collect();
        let t = Table::new(headers, rows);
        assert_eq!(engine.resolve_measure(&t), OutlierMeasure::ConfidenceWidth);

        let s = Selection {
            cap_outliers: true,
            ..Selection::default()
        };
        let out = engine.apply(&t, &s).unwrap();
        assert_eq!(out.len(), 99);
        assert!(out.rows().iter().all(|row| row[2] == Value::Float(50.0)));
    }

    #[test]
    fn active_predicate_on_missing_column_is_a_schema_error() {
        let t = table(&[("A", "x", 2015, 2015, Some(1.0))]);
        let s = Selection {
            demographic: Choice::Only("Female".into()),
            ..Selection::default()
        };
        assert_eq!(
            apply(&t, &s),
            Err(SchemaError::MissingColumn("Demographic"))
        );
    }
}
