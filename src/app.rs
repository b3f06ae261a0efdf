use eframe::egui;

use brfss_dashboard::state::AppState;

use crate::color::ColorMap;
use crate::ui::{panels, plot};

/// Body tabs, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    Distribution,
    ByAge,
    Trend,
    Demographics,
    Map,
    Data,
}

impl Tab {
    pub const ALL: [Tab; 6] = [
        Tab::Distribution,
        Tab::ByAge,
        Tab::Trend,
        Tab::Demographics,
        Tab::Map,
        Tab::Data,
    ];

    pub fn title(self) -> &'static str {
        match self {
            Tab::Distribution => "Distribution",
            Tab::ByAge => "By Age",
            Tab::Trend => "Trend",
            Tab::Demographics => "Demographics",
            Tab::Map => "Map",
            Tab::Data => "Data",
        }
    }
}

// ---------------------------------------------------------------------------
// eframe App implementation
// ---------------------------------------------------------------------------

pub struct DashboardApp {
    pub state: AppState,
    pub tab: Tab,
    /// Colours per survey class, rebuilt when the dataset changes.
    pub class_colors: ColorMap,
}

impl DashboardApp {
    pub fn new(state: AppState) -> Self {
        let class_colors = ColorMap::new(&state.options.topics);
        Self {
            state,
            tab: Tab::Distribution,
            class_colors,
        }
    }
}

impl eframe::App for DashboardApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // ---- Top panel: menu bar ----
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            if panels::top_bar(ui, &mut self.state) {
                self.class_colors = ColorMap::new(&self.state.options.topics);
            }
        });

        // ---- Left side panel: filters ----
        egui::SidePanel::left("filter_panel")
            .default_width(240.0)
            .resizable(true)
            .show(ctx, |ui| {
                panels::side_panel(ui, &mut self.state);
            });

        // ---- Central panel: metrics + tabs ----
        egui::CentralPanel::default().show(ctx, |ui| {
            ui.heading("CDC Alzheimer's Disease and Healthy Aging Dashboard");
            ui.label(
                "Data from the Behavioral Risk Factor Surveillance System (BRFSS), 2015-2022.",
            );
            ui.separator();

            let Some(summary) = &self.state.summary else {
                ui.centered_and_justified(|ui| {
                    ui.heading("Open a survey extract to begin  (File → Open…)");
                });
                return;
            };
            panels::header_metrics(ui, summary);
            ui.separator();

            ui.horizontal(|ui| {
                for tab in Tab::ALL {
                    ui.selectable_value(&mut self.tab, tab, tab.title());
                }
            });
            ui.separator();

            match self.tab {
                Tab::Distribution => plot::year_histogram(ui, summary),
                Tab::ByAge => plot::by_age(ui, summary),
                Tab::Trend => plot::yearly_trend(ui, summary),
                Tab::Demographics => plot::demographics(ui, summary),
                Tab::Map => plot::map(ui, summary, &self.class_colors),
                Tab::Data => panels::data_table(ui, &mut self.state),
            }
        });
    }
}
