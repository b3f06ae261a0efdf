mod app;
mod color;
mod ui;

use app::DashboardApp;
use brfss_dashboard::config::DashboardConfig;
use brfss_dashboard::state::AppState;
use eframe::egui;

fn main() -> eframe::Result {
    env_logger::init();

    let config = DashboardConfig::load().unwrap_or_else(|e| {
        log::error!("Falling back to default config: {e:#}");
        DashboardConfig::default()
    });

    let mut state = AppState::new(config);
    let data_path = state.config.data_path.clone();
    if data_path.exists() {
        // Failures are already logged and shown in the status line.
        let _ = state.open(&data_path);
    } else {
        log::info!("{} not found; open a file from the File menu", data_path.display());
    }

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 860.0])
            .with_min_inner_size([720.0, 480.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Alzheimer's Disease & Healthy Aging Dashboard",
        options,
        Box::new(|_cc| Ok(Box::new(DashboardApp::new(state)))),
    )
}
