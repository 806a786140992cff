//! Covidash Main Application
//! Main window with control panel and section viewer. CSV loading and ARIMA
//! fitting run on background threads and report back over channels so the UI
//! never blocks on disk or on a slow model fit.

use egui::SidePanel;
use polars::prelude::DataFrame;
use std::collections::HashMap;
use std::sync::mpsc::{channel, Receiver, Sender};
use std::thread;
use tracing::{error, info};

use crate::data::{DataStore, Dataset};
use crate::forecast::{self, ArimaOrder, DailySeries};
use crate::gui::control_panel::{ControlPanel, ControlPanelAction, Section, UserSettings};
use crate::gui::section_viewer::{ForecastPane, ForecastView, SectionViewer};

/// CSV loading result from background thread
enum LoadResult {
    Progress(String),
    Complete(Vec<(Dataset, DataFrame)>),
    Error(String),
}

/// Forecast fitting result from background thread
enum FitResult {
    Complete(Box<ForecastView>),
    Error(String),
}

/// Main application window.
pub struct CovidashApp {
    store: DataStore,
    control_panel: ControlPanel,

    // Async CSV loading
    load_rx: Option<Receiver<LoadResult>>,
    is_loading: bool,

    // Async forecast fitting, memoized per horizon until the data reloads
    fit_rx: Option<Receiver<FitResult>>,
    fitting_horizon: Option<usize>,
    forecasts: HashMap<usize, ForecastView>,
    forecast_error: Option<String>,
}

impl CovidashApp {
    pub fn new(cc: &eframe::CreationContext<'_>) -> Self {
        let settings: UserSettings = cc
            .storage
            .and_then(|storage| eframe::get_value(storage, eframe::APP_KEY))
            .unwrap_or_default();

        let store = DataStore::new(settings.data_dir.clone());
        let mut app = Self {
            store,
            control_panel: ControlPanel::new(settings),
            load_rx: None,
            is_loading: false,
            fit_rx: None,
            fitting_horizon: None,
            forecasts: HashMap::new(),
            forecast_error: None,
        };
        app.start_loading();
        app
    }

    /// Pick a new data directory with the system folder dialog.
    fn handle_browse(&mut self) {
        if self.is_loading {
            return;
        }
        if let Some(dir) = rfd::FileDialog::new().pick_folder() {
            self.control_panel.settings.data_dir = dir.clone();
            self.store.set_dir(dir);
            self.start_loading();
        }
    }

    fn handle_reload(&mut self) {
        if self.is_loading {
            return;
        }
        self.store.invalidate();
        self.start_loading();
    }

    /// Warm the store from a background thread.
    fn start_loading(&mut self) {
        self.forecasts.clear();
        self.forecast_error = None;
        self.is_loading = true;
        self.control_panel.set_progress(5.0, "Loading CSV files...");

        let (tx, rx) = channel();
        self.load_rx = Some(rx);
        let dir = self.store.dir().to_path_buf();

        thread::spawn(move || {
            let _ = tx.send(LoadResult::Progress("Reading CSV files...".to_string()));
            match DataStore::load_all(&dir) {
                Ok(tables) => {
                    let _ = tx.send(LoadResult::Complete(tables));
                }
                Err(e) => {
                    let _ = tx.send(LoadResult::Error(e.to_string()));
                }
            }
        });
    }

    fn check_load_results(&mut self) {
        let Some(rx) = self.load_rx.take() else {
            return;
        };
        let mut keep_receiver = true;

        while let Ok(result) = rx.try_recv() {
            match result {
                LoadResult::Progress(status) => {
                    self.control_panel.set_progress(20.0, &status);
                }
                LoadResult::Complete(tables) => {
                    let total_rows: usize = tables.iter().map(|(_, df)| df.height()).sum();
                    self.store.install(tables);
                    self.control_panel
                        .set_progress(100.0, &format!("Datasets loaded ({total_rows} rows)"));
                    self.is_loading = false;
                    keep_receiver = false;
                }
                LoadResult::Error(e) => {
                    // Individual sections re-surface the error; the store
                    // serves whatever files were readable on direct access.
                    error!("dataset load failed: {e}");
                    self.control_panel.set_progress(0.0, &format!("Error: {e}"));
                    self.is_loading = false;
                    keep_receiver = false;
                }
            }
        }

        if keep_receiver {
            self.load_rx = Some(rx);
        }
    }

    /// Kick off an ARIMA fit for the current horizon if no result is memoized.
    fn ensure_forecast(&mut self) {
        let horizon = self.control_panel.settings.horizon;
        if self.is_loading
            || self.fitting_horizon.is_some()
            || self.forecasts.contains_key(&horizon)
            || self.forecast_error.is_some()
        {
            return;
        }

        let cases = match self.store.get(Dataset::CaseTimeSeries) {
            Ok(df) => df.clone(),
            Err(e) => {
                self.forecast_error = Some(e.to_string());
                return;
            }
        };

        let (tx, rx) = channel();
        self.fit_rx = Some(rx);
        self.fitting_horizon = Some(horizon);
        self.control_panel
            .set_progress(30.0, "Training ARIMA model...");

        thread::spawn(move || Self::run_fit(tx, cases, horizon));
    }

    /// Fit and forecast (called from background thread).
    fn run_fit(tx: Sender<FitResult>, cases: DataFrame, horizon: usize) {
        let started = std::time::Instant::now();
        let result: anyhow::Result<ForecastView> = (|| {
            let series = DailySeries::from_case_table(&cases)?;
            let model = forecast::fit(series.values(), ArimaOrder::default())?;
            let forecast = model.forecast(horizon)?;
            Ok(ForecastView::build(&series, &forecast, horizon))
        })();

        match result {
            Ok(view) => {
                info!(horizon, elapsed_ms = started.elapsed().as_millis() as u64, "forecast ready");
                let _ = tx.send(FitResult::Complete(Box::new(view)));
            }
            Err(e) => {
                error!("forecast failed: {e}");
                let _ = tx.send(FitResult::Error(e.to_string()));
            }
        }
    }

    fn check_fit_results(&mut self) {
        let Some(rx) = self.fit_rx.take() else {
            return;
        };
        let mut keep_receiver = true;

        while let Ok(result) = rx.try_recv() {
            match result {
                FitResult::Complete(view) => {
                    self.control_panel
                        .set_progress(100.0, &format!("Forecast ready ({} days)", view.horizon));
                    self.forecasts.insert(view.horizon, *view);
                    self.fitting_horizon = None;
                    keep_receiver = false;
                }
                FitResult::Error(e) => {
                    self.control_panel.set_progress(0.0, &format!("Error: {e}"));
                    self.forecast_error = Some(e);
                    self.fitting_horizon = None;
                    keep_receiver = false;
                }
            }
        }

        if keep_receiver {
            self.fit_rx = Some(rx);
        }
    }

}

impl eframe::App for CovidashApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // Check for background results
        self.check_load_results();
        self.check_fit_results();

        if self.control_panel.settings.section == Section::Forecast {
            self.ensure_forecast();
        }

        // Request repaint while background work is running
        if self.is_loading || self.fitting_horizon.is_some() {
            ctx.request_repaint();
        }

        // Left panel - Control Panel
        SidePanel::left("control_panel")
            .min_width(280.0)
            .max_width(340.0)
            .show(ctx, |ui| {
                egui::ScrollArea::vertical().show(ui, |ui| {
                    let action = self.control_panel.show(ui);
                    match action {
                        ControlPanelAction::BrowseDataDir => self.handle_browse(),
                        ControlPanelAction::Reload => self.handle_reload(),
                        ControlPanelAction::None => {}
                    }
                });
            });

        // Central panel - Section Viewer
        let settings = self.control_panel.settings.clone();
        let pane = if let Some(view) = self.forecasts.get(&settings.horizon) {
            ForecastPane::Ready(view)
        } else if let Some(error) = self.forecast_error.as_deref() {
            ForecastPane::Failed(error)
        } else {
            ForecastPane::Running
        };
        let store = &mut self.store;
        let is_loading = self.is_loading;
        egui::CentralPanel::default().show(ctx, |ui| {
            if is_loading {
                ui.centered_and_justified(|ui| {
                    ui.label(egui::RichText::new("Loading datasets...").size(16.0));
                });
                return;
            }
            SectionViewer::show(ui, store, &settings, pane);
        });
    }

    fn save(&mut self, storage: &mut dyn eframe::Storage) {
        eframe::set_value(storage, eframe::APP_KEY, &self.control_panel.settings);
    }
}
