use serde::Deserialize;

use super::error::SchemaError;
use super::geo::{self, Coordinate};
use super::metrics::{self, LocationShare, Subpopulation, Tendency, YearlyTrend};
use super::model::Table;
use super::schema::Column;

/// Which aggregates the dashboard computes beyond the fixed ones.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SummarySettings {
    pub correlation_a: Subpopulation,
    pub correlation_b: Subpopulation,
    /// `DemographicCategory` values that get their own distribution chart.
    pub demographic_categories: Vec<String>,
}

impl Default for SummarySettings {
    fn default() -> Self {
        Self {
            correlation_a: Subpopulation::class_in(["Smoking and Alcohol Use"]),
            correlation_b: Subpopulation::class_in(["Mental Health", "Cognitive Decline"]),
            demographic_categories: vec!["Sex".to_string(), "Race/Ethnicity".to_string()],
        }
    }
}

/// A located row for the map, labelled with its class.
#[derive(Debug, Clone, PartialEq)]
pub struct MapPoint {
    pub coordinate: Coordinate,
    pub class: Option<String>,
}

/// Everything the dashboard displays for one filtered view.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Summary {
    pub total_rows: usize,
    pub median_value: Option<f64>,
    pub mean_value: Option<f64>,
    pub most_common_class: String,
    /// Topic (or question) with the highest mean value.
    pub top_topic: Option<(String, f64)>,
    pub year_histogram: Vec<(i64, usize)>,
    /// Median value per age group, highest first.
    pub median_by_age: Vec<(String, f64)>,
    /// Rows per age group, smallest first.
    pub count_by_age: Vec<(String, usize)>,
    pub trend: YearlyTrend,
    /// `(category, counts)` per configured demographic category.
    pub demographics: Vec<(String, Vec<(String, usize)>)>,
    pub locations: Vec<LocationShare>,
    pub map_points: Vec<MapPoint>,
    pub correlation: Option<f64>,
}

impl Summary {
    pub fn compute(view: &Table, settings: &SummarySettings) -> Result<Self, SchemaError> {
        let caps = view.schema().capabilities();

        let top_topic = match caps.topic {
            Some(topic) => {
                metrics::top_group(&metrics::group_mean(view, topic, Column::DataValue)?)
            }
            None => None,
        };

        let mut median_by_age = metrics::group_median(view, Column::AgeGroup, Column::DataValue)?;
        median_by_age.sort_by(|a, b| b.1.total_cmp(&a.1));

        let mut count_by_age = metrics::value_counts(view, Column::AgeGroup)?;
        count_by_age.sort_by_key(|(_, n)| *n);

        let demographics = if view.schema().has(Column::DemographicCategory) {
            settings
                .demographic_categories
                .iter()
                .map(|category| {
                    metrics::demographic_distribution(view, category, Column::Demographic)
                        .map(|counts| (category.clone(), counts))
                })
                .collect::<Result<Vec<_>, _>>()?
        } else {
            Vec::new()
        };

        let locations = if caps.location {
            metrics::geo_distribution(view, Column::LocationAbbr)?
        } else {
            Vec::new()
        };

        let class_idx = view.schema().position(Column::Class);
        let map_points = geo::coordinates(view)
            .into_iter()
            .map(|(row, coordinate)| MapPoint {
                coordinate,
                class: class_idx.and_then(|c| view.value(row, c).label()),
            })
            .collect();

        Ok(Summary {
            total_rows: metrics::count(view),
            median_value: metrics::central_tendency(view, Column::DataValue, Tendency::Median)?,
            mean_value: metrics::central_tendency(view, Column::DataValue, Tendency::Mean)?,
            most_common_class: metrics::mode_label(view, Column::Class)?,
            top_topic,
            year_histogram: metrics::year_counts(view, Column::YearEnd)?,
            median_by_age,
            count_by_age,
            trend: metrics::yearly_trend(view, Column::YearEnd, Column::DataValue)?,
            demographics,
            locations,
            map_points,
            correlation: metrics::paired_correlation(
                view,
                &settings.correlation_a,
                &settings.correlation_b,
                Column::DataValue,
            )?,
        })
    }
}
