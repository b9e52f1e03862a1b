mod app;
mod color;
mod config;
mod data;
mod error;
mod estimator;
mod geocode;
mod state;
mod ui;

use app::HousePricesApp;
use clap::Parser;
use config::Args;
use eframe::egui;
use state::AppState;

fn main() -> eframe::Result {
    env_logger::init();
    let args = Args::parse();

    let mut state = AppState::new(&args);
    if let Some(path) = &args.dataset {
        match data::loader::load_file(path) {
            Ok(dataset) => state.set_dataset(dataset),
            Err(e) => {
                log::error!("Failed to load {}: {e:#}", path.display());
                state.status_message = Some(format!("Error: {e:#}"));
            }
        }
    }

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1400.0, 900.0])
            .with_min_inner_size([800.0, 500.0]),
        ..Default::default()
    };

    eframe::run_native(
        "US College House Prices Dashboard",
        options,
        Box::new(move |_cc| Ok(Box::new(HousePricesApp::new(state)))),
    )
}
