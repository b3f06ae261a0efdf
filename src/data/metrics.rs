//! Descriptive reducers over a filtered view.
//!
//! Every function here is pure and total over the empty view: empty input
//! yields `None`, an empty vector or [`PLACEHOLDER`], never an error. The
//! only error is a [`SchemaError`] for a column the table does not have.

use std::collections::{BTreeMap, BTreeSet};

use serde::Deserialize;

use super::error::SchemaError;
use super::model::{Table, Value};
use super::schema::Column;

/// Shown in place of a statistic that has no data.
pub const PLACEHOLDER: &str = "—";

// ---------------------------------------------------------------------------
// Plain numeric helpers
// ---------------------------------------------------------------------------

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

pub fn median(values: &[f64]) -> Option<f64> {
    quantile(values, 0.5)
}

/// Quantile `q` in `[0, 1]` with linear interpolation between closest ranks.
pub fn quantile(values: &[f64], q: f64) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);

    let pos = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64))
}

/// Pearson correlation of two equal-length samples.
///
/// `None` for fewer than two pairs or a constant sample.
pub fn pearson(xs: &[f64], ys: &[f64]) -> Option<f64> {
    let n = xs.len().min(ys.len());
    if n < 2 {
        return None;
    }
    let (xs, ys) = (&xs[..n], &ys[..n]);
    let mx = mean(xs)?;
    let my = mean(ys)?;

    let mut cov = 0.0;
    let mut vx = 0.0;
    let mut vy = 0.0;
    for (x, y) in xs.iter().zip(ys) {
        let dx = x - mx;
        let dy = y - my;
        cov += dx * dy;
        vx += dx * dx;
        vy += dy * dy;
    }
    if vx == 0.0 || vy == 0.0 {
        return None;
    }
    Some((cov / (vx.sqrt() * vy.sqrt())).clamp(-1.0, 1.0))
}

// ---------------------------------------------------------------------------
// Scalars
// ---------------------------------------------------------------------------

pub fn count(view: &Table) -> usize {
    view.len()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tendency {
    Mean,
    Median,
}

/// Mean or median of a numeric column, `None` when it has no numbers.
pub fn central_tendency(
    view: &Table,
    column: Column,
    tendency: Tendency,
) -> Result<Option<f64>, SchemaError> {
    let values = view.numeric(column)?;
    Ok(match tendency {
        Tendency::Mean => mean(&values),
        Tendency::Median => median(&values),
    })
}

/// Most frequent non-missing label of `column`.
///
/// Ties go to the lexicographically smallest label; [`PLACEHOLDER`] when the
/// column has no values.
pub fn mode_label(view: &Table, column: Column) -> Result<String, SchemaError> {
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    for label in view.column(column)?.filter_map(Value::label) {
        *counts.entry(label).or_default() += 1;
    }
    let mut best: Option<(String, usize)> = None;
    for (label, n) in counts {
        if best.as_ref().map_or(true, |(_, m)| n > *m) {
            best = Some((label, n));
        }
    }
    Ok(best
        .map(|(label, _)| label)
        .unwrap_or_else(|| PLACEHOLDER.to_string()))
}

// ---------------------------------------------------------------------------
// Group-bys
// ---------------------------------------------------------------------------

/// Numeric values of `value` grouped by the label of `group`, ordered by
/// label. Rows with a missing group or value are skipped.
fn grouped(
    view: &Table,
    group: Column,
    value: Column,
) -> Result<BTreeMap<String, Vec<f64>>, SchemaError> {
    let g = view.schema().require(group)?;
    let v = view.schema().require(value)?;
    let mut groups: BTreeMap<String, Vec<f64>> = BTreeMap::new();
    for row in view.rows() {
        if let (Some(label), Some(x)) = (row[g].label(), row[v].as_f64()) {
            groups.entry(label).or_default().push(x);
        }
    }
    Ok(groups)
}

/// Mean of `value` per `group` label, ordered by label.
pub fn group_mean(
    view: &Table,
    group: Column,
    value: Column,
) -> Result<Vec<(String, f64)>, SchemaError> {
    Ok(grouped(view, group, value)?
        .into_iter()
        .filter_map(|(label, xs)| Some((label, mean(&xs)?)))
        .collect())
}

/// Median of `value` per `group` label, ordered by label.
pub fn group_median(
    view: &Table,
    group: Column,
    value: Column,
) -> Result<Vec<(String, f64)>, SchemaError> {
    Ok(grouped(view, group, value)?
        .into_iter()
        .filter_map(|(label, xs)| Some((label, median(&xs)?)))
        .collect())
}

/// Group with the largest value; the first one wins a tie.
pub fn top_group(groups: &[(String, f64)]) -> Option<(String, f64)> {
    let mut best: Option<&(String, f64)> = None;
    for entry in groups {
        if best.map_or(true, |b| entry.1 > b.1) {
            best = Some(entry);
        }
    }
    best.cloned()
}

/// Per-year means plus the mean over the whole view.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct YearlyTrend {
    /// One point per distinct year, ascending.
    pub points: Vec<(i64, f64)>,
    /// Reference line: mean of every value in the view, not of the points.
    pub overall_mean: Option<f64>,
}

pub fn yearly_trend(view: &Table, year: Column, value: Column) -> Result<YearlyTrend, SchemaError> {
    let y = view.schema().require(year)?;
    let v = view.schema().require(value)?;
    let mut by_year: BTreeMap<i64, Vec<f64>> = BTreeMap::new();
    let mut all = Vec::new();
    for row in view.rows() {
        let Some(x) = row[v].as_f64() else { continue };
        all.push(x);
        if let Some(yr) = row[y].as_i64() {
            by_year.entry(yr).or_default().push(x);
        }
    }
    Ok(YearlyTrend {
        points: by_year
            .into_iter()
            .filter_map(|(yr, xs)| Some((yr, mean(&xs)?)))
            .collect(),
        overall_mean: mean(&all),
    })
}

// ---------------------------------------------------------------------------
// Counts
// ---------------------------------------------------------------------------

/// Count labels, most frequent first; equal counts stay in label order.
fn ranked_counts<'a>(labels: impl Iterator<Item = &'a Value>) -> Vec<(String, usize)> {
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    for label in labels.filter_map(Value::label) {
        *counts.entry(label).or_default() += 1;
    }
    let mut ranked: Vec<(String, usize)> = counts.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1));
    ranked
}

/// Occurrences of each label of `column`, most frequent first.
pub fn value_counts(view: &Table, column: Column) -> Result<Vec<(String, usize)>, SchemaError> {
    Ok(ranked_counts(view.column(column)?))
}

/// Rows per whole-number year, ascending by year.
pub fn year_counts(view: &Table, column: Column) -> Result<Vec<(i64, usize)>, SchemaError> {
    let mut counts: BTreeMap<i64, usize> = BTreeMap::new();
    for yr in view.column(column)?.filter_map(Value::as_i64) {
        *counts.entry(yr).or_default() += 1;
    }
    Ok(counts.into_iter().collect())
}

/// Counts of `group` labels among rows whose `DemographicCategory` equals
/// `category`, most frequent first; ties in label order.
pub fn demographic_distribution(
    view: &Table,
    category: &str,
    group: Column,
) -> Result<Vec<(String, usize)>, SchemaError> {
    let c = view.schema().require(Column::DemographicCategory)?;
    let g = view.schema().require(group)?;
    Ok(ranked_counts(
        view.rows()
            .iter()
            .filter(|row| row[c].matches_label(category))
            .map(|row| &row[g]),
    ))
}

#[derive(Debug, Clone, PartialEq)]
pub struct LocationShare {
    pub location: String,
    pub count: usize,
    /// Share of the view's located rows, `0..=100`.
    pub percent: f64,
}

/// Rows per location code with their percentage of the total, ordered by
/// location code.
pub fn geo_distribution(view: &Table, location: Column) -> Result<Vec<LocationShare>, SchemaError> {
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    for code in view.column(location)?.filter_map(Value::label) {
        *counts.entry(code).or_default() += 1;
    }
    let total: usize = counts.values().sum();
    Ok(counts
        .into_iter()
        .map(|(location, count)| LocationShare {
            location,
            count,
            percent: 100.0 * count as f64 / total as f64,
        })
        .collect())
}

// ---------------------------------------------------------------------------
// Paired correlation
// ---------------------------------------------------------------------------

/// Rows whose `column` label is one of `values`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Subpopulation {
    #[serde(default = "default_partition_column")]
    pub column: Column,
    pub values: BTreeSet<String>,
}

fn default_partition_column() -> Column {
    Column::Class
}

impl Subpopulation {
    pub fn class_in<I, S>(classes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            column: Column::Class,
            values: classes.into_iter().map(Into::into).collect(),
        }
    }

    fn matches(&self, value: &Value) -> bool {
        value.label().is_some_and(|l| self.values.contains(&l))
    }
}

/// Pearson correlation between the `value` sequences of two subpopulations.
///
/// Each side drops its missing values independently, then both are cut to
/// the shorter length and paired by position. Rows are not joined on any
/// key, so the pairing only means something when both sides come out in a
/// corresponding order. `None` when either side is empty or the coefficient
/// is undefined.
pub fn paired_correlation(
    view: &Table,
    a: &Subpopulation,
    b: &Subpopulation,
    value: Column,
) -> Result<Option<f64>, SchemaError> {
    let v = view.schema().require(value)?;
    let side = |sub: &Subpopulation| -> Result<Vec<f64>, SchemaError> {
        let p = view.schema().require(sub.column)?;
        Ok(view
            .rows()
            .iter()
            .filter(|row| sub.matches(&row[p]))
            .filter_map(|row| row[v].as_f64())
            .collect())
    };
    let xs = side(a)?;
    let ys = side(b)?;
    if xs.is_empty() || ys.is_empty() {
        return Ok(None);
    }
    Ok(pearson(&xs, &ys))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> Value {
        Value::Text(s.to_string())
    }

    fn survey(rows: Vec<Vec<Value>>) -> Table {
        let headers = [
            "Class",
            "Topic",
            "DemographicCategory",
            "Demographic",
            "YearEnd",
            "Data_Value",
            "LocationAbbr",
        ]
        .iter()
        .map(|h| h.to_string())
        .collect();
        Table::new(headers, rows)
    }

    fn row(class: &str, topic: &str, cat: &str, demo: &str, year: i64, v: Option<f64>, loc: &str) -> Vec<Value> {
        vec![
            text(class),
            text(topic),
            text(cat),
            text(demo),
            Value::Integer(year),
            v.map(Value::Float).unwrap_or(Value::Null),
            text(loc),
        ]
    }

    fn empty() -> Table {
        survey(Vec::new())
    }

    #[test]
    fn quantile_interpolates_linearly() {
        let xs: Vec<f64> = (1..=100).map(f64::from).collect();
        let q = quantile(&xs, 0.99).unwrap();
        assert!((q - 99.01).abs() < 1e-9);
        assert_eq!(median(&[3.0, 1.0, 2.0, 4.0]), Some(2.5));
        assert_eq!(quantile(&[], 0.5), None);
    }

    #[test]
    fn reducers_degrade_on_empty_view() {
        let t = empty();
        assert_eq!(count(&t), 0);
        assert_eq!(central_tendency(&t, Column::DataValue, Tendency::Median), Ok(None));
        assert_eq!(mode_label(&t, Column::Class).unwrap(), PLACEHOLDER);
        assert!(group_mean(&t, Column::Topic, Column::DataValue).unwrap().is_empty());
        assert_eq!(
            yearly_trend(&t, Column::YearEnd, Column::DataValue).unwrap(),
            YearlyTrend::default()
        );
        assert!(demographic_distribution(&t, "Sex", Column::Demographic).unwrap().is_empty());
        assert!(geo_distribution(&t, Column::LocationAbbr).unwrap().is_empty());
        let a = Subpopulation::class_in(["A"]);
        assert_eq!(paired_correlation(&t, &a, &a, Column::DataValue), Ok(None));
    }

    #[test]
    fn yearly_trend_matches_two_row_example() {
        let t = survey(vec![
            row("C", "A", "Sex", "Male", 2015, Some(10.0), "NY"),
            row("C", "B", "Sex", "Male", 2020, Some(20.0), "NY"),
        ]);
        let trend = yearly_trend(&t, Column::YearEnd, Column::DataValue).unwrap();
        assert_eq!(trend.points, vec![(2015, 10.0), (2020, 20.0)]);
        assert_eq!(trend.overall_mean, Some(15.0));
    }

    #[test]
    fn mode_prefers_smallest_label_on_tie() {
        let t = survey(vec![
            row("Mental Health", "A", "Sex", "Male", 2015, None, "NY"),
            row("Cognitive Decline", "A", "Sex", "Male", 2015, None, "NY"),
        ]);
        assert_eq!(mode_label(&t, Column::Class).unwrap(), "Cognitive Decline");
    }

    #[test]
    fn group_mean_and_top_group() {
        let t = survey(vec![
            row("C", "B", "Sex", "Male", 2015, Some(4.0), "NY"),
            row("C", "A", "Sex", "Male", 2015, Some(2.0), "NY"),
            row("C", "A", "Sex", "Male", 2015, Some(8.0), "NY"),
            row("C", "Z", "Sex", "Male", 2015, None, "NY"),
        ]);
        let groups = group_mean(&t, Column::Topic, Column::DataValue).unwrap();
        assert_eq!(groups, vec![("A".to_string(), 5.0), ("B".to_string(), 4.0)]);
        assert_eq!(top_group(&groups), Some(("A".to_string(), 5.0)));
        assert_eq!(top_group(&[]), None);
    }

    #[test]
    fn demographic_distribution_restricts_to_category() {
        let t = survey(vec![
            row("C", "A", "Race/Ethnicity", "Hispanic", 2015, Some(1.0), "NY"),
            row("C", "A", "Sex", "Male", 2015, Some(1.0), "NY"),
            row("C", "A", "Sex", "Female", 2015, Some(1.0), "NY"),
            row("C", "A", "Sex", "Female", 2015, Some(1.0), "NY"),
            row("C", "A", "Race/Ethnicity", "Hispanic", 2015, Some(1.0), "NY"),
            row("C", "A", "Race/Ethnicity", "Hispanic", 2015, Some(1.0), "NY"),
        ]);
        let dist = demographic_distribution(&t, "Sex", Column::Demographic).unwrap();
        assert_eq!(dist, vec![("Female".to_string(), 2), ("Male".to_string(), 1)]);
    }

    #[test]
    fn value_counts_break_ties_by_label() {
        let t = survey(vec![
            row("B", "A", "Sex", "Male", 2015, None, "NY"),
            row("A", "A", "Sex", "Male", 2015, None, "NY"),
            row("C", "A", "Sex", "Male", 2015, None, "NY"),
            row("C", "A", "Sex", "Male", 2015, None, "NY"),
        ]);
        let counts = value_counts(&t, Column::Class).unwrap();
        assert_eq!(
            counts,
            vec![("C".to_string(), 2), ("A".to_string(), 1), ("B".to_string(), 1)]
        );
    }

    #[test]
    fn demographic_ties_follow_label_order() {
        let t = survey(vec![
            row("C", "A", "Sex", "Male", 2015, None, "NY"),
            row("C", "A", "Sex", "Female", 2015, None, "NY"),
        ]);
        let dist = demographic_distribution(&t, "Sex", Column::Demographic).unwrap();
        assert_eq!(dist, vec![("Female".to_string(), 1), ("Male".to_string(), 1)]);
    }

    #[test]
    fn geo_distribution_reports_percentages() {
        let t = survey(vec![
            row("C", "A", "Sex", "Male", 2015, None, "NY"),
            row("C", "A", "Sex", "Male", 2015, None, "CA"),
            row("C", "A", "Sex", "Male", 2015, None, "NY"),
            row("C", "A", "Sex", "Male", 2015, None, "NY"),
        ]);
        let shares = geo_distribution(&t, Column::LocationAbbr).unwrap();
        assert_eq!(shares.len(), 2);
        assert_eq!(shares[0].location, "CA");
        assert_eq!(shares[0].percent, 25.0);
        assert_eq!(shares[1].count, 3);
    }

    #[test]
    fn paired_correlation_truncates_to_shorter_side() {
        let t = survey(vec![
            row("Smoking and Alcohol Use", "A", "Sex", "Male", 2015, Some(1.0), "NY"),
            row("Mental Health", "A", "Sex", "Male", 2015, Some(10.0), "NY"),
            row("Smoking and Alcohol Use", "A", "Sex", "Male", 2015, Some(2.0), "NY"),
            row("Cognitive Decline", "A", "Sex", "Male", 2015, Some(20.0), "NY"),
            row("Smoking and Alcohol Use", "A", "Sex", "Male", 2015, None, "NY"),
            row("Smoking and Alcohol Use", "A", "Sex", "Male", 2015, Some(3.0), "NY"),
            row("Mental Health", "A", "Sex", "Male", 2015, Some(30.0), "NY"),
            row("Smoking and Alcohol Use", "A", "Sex", "Male", 2015, Some(-50.0), "NY"),
        ]);
        let a = Subpopulation::class_in(["Smoking and Alcohol Use"]);
        let b = Subpopulation::class_in(["Mental Health", "Cognitive Decline"]);
        // a = [1, 2, 3, -50] is cut to [1, 2, 3]; b = [10, 20, 30].
        let r = paired_correlation(&t, &a, &b, Column::DataValue).unwrap().unwrap();
        assert!((r - 1.0).abs() < 1e-12);
    }

    #[test]
    fn paired_correlation_empty_side_is_none() {
        let t = survey(vec![row("Mental Health", "A", "Sex", "Male", 2015, Some(1.0), "NY")]);
        let a = Subpopulation::class_in(["Smoking and Alcohol Use"]);
        let b = Subpopulation::class_in(["Mental Health"]);
        assert_eq!(paired_correlation(&t, &a, &b, Column::DataValue), Ok(None));
    }

    #[test]
    fn pearson_is_undefined_for_constant_input() {
        assert_eq!(pearson(&[1.0, 1.0], &[2.0, 3.0]), None);
        let r = pearson(&[1.0, 2.0, 3.0], &[3.0, 2.0, 1.0]).unwrap();
        assert!((r + 1.0).abs() < 1e-12);
    }
}
