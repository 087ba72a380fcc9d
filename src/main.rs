mod app;
mod color;
mod config;
mod data;
mod state;
mod ui;

use app::RustyDashboardApp;
use config::DashboardConfig;
use eframe::egui;

fn main() -> eframe::Result {
    env_logger::init();

    let config = DashboardConfig::discover();

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 860.0])
            .with_min_inner_size([700.0, 450.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Rusty Dashboard – Data Explorer",
        options,
        Box::new(|_cc| Ok(Box::new(RustyDashboardApp::new(config)))),
    )
}
