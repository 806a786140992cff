//! Covidash - COVID-19 India Data Dashboard
//!
//! A Rust application for exploring Indian COVID-19 case, testing and
//! hospital-capacity data, with an ARIMA forecast of daily confirmed cases.

mod charts;
mod data;
mod forecast;
mod gui;

use eframe::egui;
use gui::CovidashApp;
use tracing_subscriber::EnvFilter;

fn main() -> eframe::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Configure native options
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1400.0, 800.0])
            .with_min_inner_size([1200.0, 700.0])
            .with_title("Covidash"),
        ..Default::default()
    };

    // Run the application
    eframe::run_native(
        "Covidash",
        options,
        Box::new(|cc| Ok(Box::new(CovidashApp::new(cc)))),
    )
}
