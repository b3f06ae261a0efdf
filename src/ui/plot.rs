use eframe::egui::{Color32, Ui};
use egui_plot::{Bar, BarChart, HLine, Legend, Line, Plot, PlotPoints, Points};

use brfss_dashboard::data::summary::Summary;

use crate::color::{generate_palette, ColorMap};

fn no_rows(ui: &mut Ui) {
    ui.label("No rows match your filters.");
}

/// Bars for categorical counts or values, one colour per bar, labelled by
/// category on hover.
fn category_bars<'a>(items: impl Iterator<Item = (&'a str, f64)>, horizontal: bool) -> BarChart {
    let items: Vec<(&str, f64)> = items.collect();
    let palette = generate_palette(items.len());
    let bars = items
        .into_iter()
        .zip(palette)
        .enumerate()
        .map(|(i, ((label, value), color))| {
            Bar::new(i as f64, value).name(label).fill(color)
        })
        .collect();
    let chart = BarChart::new(bars).width(0.7);
    if horizontal {
        chart.horizontal()
    } else {
        chart
    }
}

// ---------------------------------------------------------------------------
// Distribution tab
// ---------------------------------------------------------------------------

/// Histogram of `YearEnd`: rows per reporting year.
pub fn year_histogram(ui: &mut Ui, summary: &Summary) {
    ui.heading("Count of Topic Data by Year");
    if summary.year_histogram.is_empty() {
        no_rows(ui);
        return;
    }
    let bars = summary
        .year_histogram
        .iter()
        .map(|&(year, n)| Bar::new(year as f64, n as f64).name(year.to_string()))
        .collect();
    Plot::new("year_histogram")
        .x_axis_label("YearEnd")
        .y_axis_label("count")
        .allow_scroll(false)
        .show(ui, |plot_ui| {
            plot_ui.bar_chart(BarChart::new(bars).color(Color32::LIGHT_BLUE).width(0.8));
        });
}

// ---------------------------------------------------------------------------
// By-age tab
// ---------------------------------------------------------------------------

/// Median value per age group (highest first) and row count per age group.
pub fn by_age(ui: &mut Ui, summary: &Summary) {
    if summary.count_by_age.is_empty() {
        no_rows(ui);
        return;
    }
    let half = (ui.available_height() / 2.0 - 30.0).max(120.0);

    ui.heading("Data Value by Age Group");
    let medians = category_bars(
        summary.median_by_age.iter().map(|(g, v)| (g.as_str(), *v)),
        false,
    );
    Plot::new("median_by_age")
        .height(half)
        .y_axis_label("median Data_Value")
        .show(ui, |plot_ui| plot_ui.bar_chart(medians));

    ui.heading("Count by Age Group");
    let counts = category_bars(
        summary.count_by_age.iter().map(|(g, n)| (g.as_str(), *n as f64)),
        true,
    );
    Plot::new("count_by_age")
        .height(half)
        .x_axis_label("rows")
        .show(ui, |plot_ui| plot_ui.bar_chart(counts));
}

// ---------------------------------------------------------------------------
// Trend tab
// ---------------------------------------------------------------------------

/// Mean value per year with the overall mean as a reference line.
pub fn yearly_trend(ui: &mut Ui, summary: &Summary) {
    ui.heading("Average Data Value by Year");
    let trend = &summary.trend;
    if trend.points.is_empty() {
        no_rows(ui);
        return;
    }
    let points: PlotPoints = trend
        .points
        .iter()
        .map(|&(year, mean)| [year as f64, mean])
        .collect();

    Plot::new("yearly_trend")
        .legend(Legend::default())
        .x_axis_label("YearEnd")
        .y_axis_label("mean Data_Value")
        .show(ui, |plot_ui| {
            plot_ui.line(Line::new(points).name("yearly mean").width(2.0));
            if let Some(mean) = trend.overall_mean {
                plot_ui.hline(
                    HLine::new(mean)
                        .name(format!("overall mean {mean:.2}"))
                        .color(Color32::GRAY),
                );
            }
        });
}

// ---------------------------------------------------------------------------
// Demographics tab
// ---------------------------------------------------------------------------

/// One bar chart per configured demographic category.
pub fn demographics(ui: &mut Ui, summary: &Summary) {
    let shown: Vec<_> = summary
        .demographics
        .iter()
        .filter(|(_, counts)| !counts.is_empty())
        .collect();
    if shown.is_empty() {
        no_rows(ui);
        return;
    }
    let height = (ui.available_height() / shown.len() as f32 - 30.0).max(120.0);
    for (category, counts) in shown {
        ui.heading(format!("Rows by {category}"));
        let chart = category_bars(counts.iter().map(|(g, n)| (g.as_str(), *n as f64)), true);
        Plot::new(format!("demographic_{category}"))
            .height(height)
            .x_axis_label("rows")
            .show(ui, |plot_ui| plot_ui.bar_chart(chart));
    }
}

// ---------------------------------------------------------------------------
// Map tab
// ---------------------------------------------------------------------------

/// Located rows as a lon/lat scatter coloured by class, plus location shares.
pub fn map(ui: &mut Ui, summary: &Summary, class_colors: &ColorMap) {
    ui.heading("Survey Locations");
    if summary.map_points.is_empty() {
        ui.label("No geolocated rows in the current view.");
    } else {
        let height = (ui.available_height() - 160.0).max(200.0);
        Plot::new("map")
            .legend(Legend::default())
            .data_aspect(1.0)
            .height(height)
            .x_axis_label("longitude")
            .y_axis_label("latitude")
            .show(ui, |plot_ui| {
                for (class, color) in class_colors.legend_entries() {
                    let points: PlotPoints = summary
                        .map_points
                        .iter()
                        .filter(|p| p.class.as_deref() == Some(class))
                        .map(|p| [p.coordinate.longitude, p.coordinate.latitude])
                        .collect();
                    plot_ui.points(Points::new(points).name(class).color(color).radius(3.0));
                }
                let other: PlotPoints = summary
                    .map_points
                    .iter()
                    .filter(|p| !class_colors.is_known(p.class.as_deref()))
                    .map(|p| [p.coordinate.longitude, p.coordinate.latitude])
                    .collect();
                plot_ui.points(Points::new(other).color(class_colors.color_for(None)).radius(3.0));
            });
    }

    if !summary.locations.is_empty() {
        ui.strong("Share of rows by location");
        ui.horizontal_wrapped(|ui| {
            for share in &summary.locations {
                ui.label(format!(
                    "{} {} ({:.1}%)",
                    share.location, share.count, share.percent
                ));
            }
        });
    }
}
