use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};
use egui_extras::{Column as TableColumn, TableBuilder};

use brfss_dashboard::data::metrics::PLACEHOLDER;
use brfss_dashboard::data::selection::{ALL_AGE_GROUPS, ALL_DEMOGRAPHICS};
use brfss_dashboard::data::summary::Summary;
use brfss_dashboard::state::AppState;

// ---------------------------------------------------------------------------
// Left side panel – filter widgets
// ---------------------------------------------------------------------------

/// Render the left filter panel.
///
/// Widgets edit copies of the selection; each change goes through the
/// state setters, which validate it and recompute the view.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Filters");
    ui.separator();

    if state.dataset.is_none() {
        ui.label("No dataset loaded.");
        return;
    }

    let options = state.options.clone();
    let selection = state.selection.clone();

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            // ---- Age group ----
            ui.strong("Age Group");
            let current = selection.age_group.label(ALL_AGE_GROUPS).to_string();
            egui::ComboBox::from_id_salt("age_group")
                .selected_text(&current)
                .width(ui.available_width())
                .show_ui(ui, |ui: &mut Ui| {
                    for label in options.age_group_choices() {
                        if ui.selectable_label(current == label, &label).clicked() {
                            let _ = state.set_age_group(&label);
                        }
                    }
                });
            ui.add_space(6.0);

            // ---- Demographic ----
            ui.strong("Sex/Ethnicity");
            let current = selection.demographic.label(ALL_DEMOGRAPHICS).to_string();
            egui::ComboBox::from_id_salt("demographic")
                .selected_text(&current)
                .width(ui.available_width())
                .show_ui(ui, |ui: &mut Ui| {
                    for label in options.demographic_choices() {
                        if ui.selectable_label(current == label, &label).clicked() {
                            let _ = state.set_demographic(&label);
                        }
                    }
                });
            ui.add_space(6.0);

            // ---- Topics (multi-select) ----
            let header = format!(
                "Topic  ({}/{})",
                selection.topics.len(),
                options.topics.len()
            );
            egui::CollapsingHeader::new(RichText::new(header).strong())
                .id_salt("topics")
                .default_open(true)
                .show(ui, |ui: &mut Ui| {
                    if ui.small_button("Clear").clicked() {
                        let _ = state.clear_topics();
                    }
                    for topic in &options.topics {
                        let mut checked = selection.topics.contains(topic);
                        if ui.checkbox(&mut checked, topic).changed() {
                            let _ = state.toggle_topic(topic);
                        }
                    }
                    if selection.topics.is_empty() {
                        ui.weak("No topic chosen: showing all topics.");
                    }
                });
            ui.add_space(6.0);

            // ---- Year range ----
            if let Some((min, max)) = options.years {
                ui.strong("Year Range");
                let (mut lo, mut hi) = selection.year_range;
                let lo_changed = ui
                    .add(egui::Slider::new(&mut lo, min..=max).text("from"))
                    .changed();
                let hi_changed = ui
                    .add(egui::Slider::new(&mut hi, min..=max).text("to"))
                    .changed();
                if lo_changed || hi_changed {
                    // Keep the range ordered while dragging.
                    if lo_changed && lo > hi {
                        hi = lo;
                    } else if hi_changed && hi < lo {
                        lo = hi;
                    }
                    let _ = state.set_year_range(lo, hi);
                }
                ui.add_space(6.0);
            }

            // ---- Outlier capping ----
            let mut cap = selection.cap_outliers;
            if ui.checkbox(&mut cap, "Cap extreme data values").changed() {
                let _ = state.set_cap_outliers(cap);
            }

            ui.separator();
            if ui.button("Reset filters").clicked() {
                let _ = state.reset_filters();
            }
        });
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar. Returns whether a new dataset was loaded.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) -> bool {
    let mut loaded = false;
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open…").clicked() {
                loaded = open_file_dialog(state);
                ui.close_menu();
            }
            if ui
                .add_enabled(state.source_path.is_some(), egui::Button::new("Reload"))
                .clicked()
            {
                loaded = state.reload().is_ok();
                ui.close_menu();
            }
            if ui
                .add_enabled(state.view.is_some(), egui::Button::new("Export filtered CSV…"))
                .clicked()
            {
                save_file_dialog(state);
                ui.close_menu();
            }
        });

        ui.separator();

        if let (Some(ds), Some(view)) = (&state.dataset, &state.view) {
            ui.label(format!("{} rows loaded, {} visible", ds.len(), view.len()));
        }

        if let Some(msg) = &state.status_message {
            ui.separator();
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
    loaded
}

// ---------------------------------------------------------------------------
// Header metrics
// ---------------------------------------------------------------------------

fn metric(ui: &mut Ui, title: &str, value: String) {
    ui.vertical(|ui: &mut Ui| {
        ui.weak(title);
        ui.label(RichText::new(value).size(22.0).strong());
    });
}

fn format_number(value: Option<f64>) -> String {
    value.map_or_else(|| PLACEHOLDER.to_string(), |v| format!("{v:.2}"))
}

/// Render the KPI row above the tabs.
pub fn header_metrics(ui: &mut Ui, summary: &Summary) {
    ui.columns(5, |cols| {
        metric(&mut cols[0], "Total Questions", summary.total_rows.to_string());
        metric(&mut cols[1], "Median Values", format_number(summary.median_value));
        metric(&mut cols[2], "Most common topic", summary.most_common_class.clone());
        let top = summary
            .top_topic
            .as_ref()
            .map_or_else(|| PLACEHOLDER.to_string(), |(t, v)| format!("{t} ({v:.1})"));
        metric(&mut cols[3], "Highest average topic", top);
        metric(&mut cols[4], "Smoking vs. mental health r", format_number(summary.correlation));
    });
}

// ---------------------------------------------------------------------------
// Data tab – filtered rows and download
// ---------------------------------------------------------------------------

/// Render the filtered rows with a download button.
pub fn data_table(ui: &mut Ui, state: &mut AppState) {
    if ui.button("Download the filtered rows").clicked() {
        save_file_dialog(state);
    }
    ui.add_space(4.0);

    let Some(view) = &state.view else {
        return;
    };
    if view.is_empty() {
        ui.label("No rows match your filters.");
        return;
    }

    ScrollArea::horizontal().show(ui, |ui: &mut Ui| {
        TableBuilder::new(ui)
            .striped(true)
            .resizable(true)
            .columns(TableColumn::auto().at_least(60.0), view.headers().len())
            .header(20.0, |mut header| {
                for name in view.headers() {
                    header.col(|ui| {
                        ui.strong(name);
                    });
                }
            })
            .body(|body| {
                body.rows(18.0, view.len(), |mut row| {
                    let cells = &view.rows()[row.index()];
                    for cell in cells {
                        row.col(|ui| {
                            ui.label(cell.to_string());
                        });
                    }
                });
            });
    });
}

// ---------------------------------------------------------------------------
// File dialogs
// ---------------------------------------------------------------------------

/// Ask for a survey extract and open it. Returns whether it loaded.
pub fn open_file_dialog(state: &mut AppState) -> bool {
    let file = rfd::FileDialog::new()
        .set_title("Open survey extract")
        .add_filter("Supported files", &["csv", "tsv", "tab", "json", "parquet", "pq"])
        .add_filter("CSV", &["csv"])
        .add_filter("TSV", &["tsv", "tab"])
        .add_filter("JSON", &["json"])
        .add_filter("Parquet", &["parquet", "pq"])
        .pick_file();

    match file {
        Some(path) => state.open(&path).is_ok(),
        None => false,
    }
}

/// Ask for a destination and export the filtered rows there.
pub fn save_file_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Download the filtered rows")
        .set_file_name("filtered_data.csv")
        .add_filter("CSV", &["csv"])
        .save_file();

    if let Some(path) = file {
        // Failures are logged and shown in the status line by the state.
        let _ = state.export_csv(&path);
    }
}
