//! Section Viewer Widget
//! Central panel: draws the charts of the currently selected section, or an
//! error label when a view cannot be built. A failure in one section never
//! affects the others.

use egui::{Color32, RichText, ScrollArea};
use polars::prelude::DataFrame;

use crate::charts::{ChartPlotter, CASES_COLOR, POSITIVITY_COLOR, STRESS_COLOR, TESTING_COLOR};
use crate::data::{
    self, DataStore, Dataset, COL_CASES_PER_BED, COL_CONFIRMED, COL_DAILY_CONFIRMED, COL_DATE,
    COL_FATALITY_RATE, COL_POSITIVE_RATIO, COL_RECOVERY_RATE, COL_SAMPLES_TESTED, COL_STATE,
};
use crate::forecast::{DailySeries, Forecast};
use crate::gui::control_panel::{Section, UserSettings};

/// Plot-ready forecast overlay, built once per (data load, horizon).
#[derive(Clone)]
pub struct ForecastView {
    pub horizon: usize,
    pub history: Vec<[f64; 2]>,
    pub mean: Vec<[f64; 2]>,
    /// Confidence band polygon: lower bound path, then upper bound reversed.
    pub band: Vec<[f64; 2]>,
}

impl ForecastView {
    pub fn build(series: &DailySeries, forecast: &Forecast, horizon: usize) -> Self {
        let mean = series.future_points(&forecast.mean);
        let lower = series.future_points(&forecast.lower);
        let upper = series.future_points(&forecast.upper);

        let mut band = lower;
        band.extend(upper.into_iter().rev());

        Self {
            horizon,
            history: series.observed_points(),
            mean,
            band,
        }
    }
}

/// What the forecast section currently has to show.
pub enum ForecastPane<'a> {
    Running,
    Ready(&'a ForecastView),
    Failed(&'a str),
}

/// Central chart area.
pub struct SectionViewer;

impl SectionViewer {
    /// Draw the selected section.
    pub fn show(
        ui: &mut egui::Ui,
        store: &mut DataStore,
        settings: &UserSettings,
        forecast: ForecastPane<'_>,
    ) {
        ScrollArea::vertical().auto_shrink([false, false]).show(ui, |ui| {
            match settings.section {
                Section::NationalTrend => Self::show_national_trend(ui, store),
                Section::StateWise => Self::show_state_wise(ui, store, settings.top_n),
                Section::Testing => Self::show_testing(ui, store),
                Section::Capacity => Self::show_capacity(ui, store),
                Section::Forecast => Self::show_forecast(ui, forecast),
            }
        });
    }

    fn section_title(ui: &mut egui::Ui, title: &str) {
        ui.add_space(5.0);
        ui.label(RichText::new(title).size(18.0).strong());
        ui.add_space(8.0);
    }

    fn show_error(ui: &mut egui::Ui, error: &str) {
        ui.add_space(10.0);
        ui.label(
            RichText::new(format!("Error: {error}"))
                .size(13.0)
                .color(Color32::from_rgb(220, 53, 69)),
        );
    }

    fn show_national_trend(ui: &mut egui::Ui, store: &mut DataStore) {
        Self::section_title(ui, "Daily Confirmed COVID-19 Cases in India");

        let result = store
            .get(Dataset::CaseTimeSeries)
            .map_err(|e| e.to_string())
            .and_then(|df| national_trend_data(df).map_err(|e| e.to_string()));

        match result {
            Ok((points, range)) => {
                ChartPlotter::draw_time_series(
                    ui,
                    "national_trend",
                    "Daily Confirmed Cases",
                    points,
                    CASES_COLOR,
                );
                ui.add_space(6.0);
                ui.label(
                    RichText::new(format!("Records from {range}"))
                        .size(12.0)
                        .color(Color32::GRAY),
                );
                ui.label(
                    RichText::new("Peaks correspond to major COVID-19 waves in India.")
                        .size(12.0)
                        .color(Color32::GRAY),
                );
            }
            Err(e) => Self::show_error(ui, &e),
        }
    }

    fn show_state_wise(ui: &mut egui::Ui, store: &mut DataStore, top_n: usize) {
        Self::section_title(ui, "State-wise COVID-19 Impact");

        let result = store
            .get(Dataset::StateWise)
            .map_err(|e| e.to_string())
            .and_then(|df| state_wise_data(df, top_n).map_err(|e| e.to_string()));

        match result {
            Ok(view) => {
                ChartPlotter::draw_labeled_bars(
                    ui,
                    "top_states",
                    &format!("Top {top_n} States by Confirmed Cases"),
                    &view.states,
                    &view.confirmed,
                    CASES_COLOR,
                );

                ui.add_space(10.0);
                ui.label(
                    RichText::new("Recovery vs Fatality Rate (Top States)")
                        .size(14.0)
                        .strong(),
                );
                ChartPlotter::draw_rate_lines(
                    ui,
                    "state_rates",
                    &view.states,
                    &view.recovery,
                    &view.fatality,
                );
            }
            Err(e) => Self::show_error(ui, &e),
        }
    }

    fn show_testing(ui: &mut egui::Ui, store: &mut DataStore) {
        Self::section_title(ui, "Testing Growth Over Time");

        let result = store
            .get(Dataset::Testing)
            .map_err(|e| e.to_string())
            .and_then(|df| testing_data(df).map_err(|e| e.to_string()));

        match result {
            Ok((samples, positivity)) => {
                ChartPlotter::draw_time_series(
                    ui,
                    "samples_tested",
                    "Total Samples Tested",
                    samples,
                    TESTING_COLOR,
                );

                ui.add_space(10.0);
                ui.label(RichText::new("Positivity Ratio Trend").size(14.0).strong());
                ChartPlotter::draw_time_series(
                    ui,
                    "positive_ratio",
                    "Positivity Ratio (%)",
                    positivity,
                    POSITIVITY_COLOR,
                );
                ui.add_space(6.0);
                ui.label(
                    RichText::new(
                        "Higher positivity spikes show major waves and periods of under-testing.",
                    )
                    .size(12.0)
                    .color(Color32::GRAY),
                );
            }
            Err(e) => Self::show_error(ui, &e),
        }
    }

    fn show_capacity(ui: &mut egui::Ui, store: &mut DataStore) {
        Self::section_title(ui, "COVID-19 Burden vs Public Hospital Beds");

        let states = match store.get(Dataset::StateWise) {
            Ok(df) => df.clone(),
            Err(e) => return Self::show_error(ui, &e.to_string()),
        };
        let result = store
            .get(Dataset::HospitalBeds)
            .map_err(|e| e.to_string())
            .and_then(|beds| capacity_data(&states, beds).map_err(|e| e.to_string()));

        match result {
            Ok((labels, ratios)) => {
                ChartPlotter::draw_labeled_bars(
                    ui,
                    "cases_per_bed",
                    "Cases per Bed (Higher = More Stress)",
                    &labels,
                    &ratios,
                    STRESS_COLOR,
                );
                ui.add_space(6.0);
                ui.label(
                    RichText::new("Higher cases-per-bed indicate more strain on healthcare capacity.")
                        .size(12.0)
                        .color(Color32::GRAY),
                );
            }
            Err(e) => Self::show_error(ui, &e),
        }
    }

    fn show_forecast(ui: &mut egui::Ui, forecast: ForecastPane<'_>) {
        Self::section_title(ui, "ARIMA-based Forecast of Daily Cases");

        match forecast {
            ForecastPane::Running => {
                ui.add_space(10.0);
                ui.horizontal(|ui| {
                    ui.spinner();
                    ui.label("Training ARIMA model...");
                });
            }
            ForecastPane::Ready(view) => {
                ChartPlotter::draw_forecast(
                    ui,
                    "forecast",
                    view.history.clone(),
                    view.mean.clone(),
                    view.band.clone(),
                );
                ui.add_space(6.0);
                ui.label(
                    RichText::new(format!(
                        "Forecast of daily confirmed cases for the next {} days. \
                         The model is statistical and based on historical trends only.",
                        view.horizon
                    ))
                    .size(12.0)
                    .color(Color32::GRAY),
                );
            }
            ForecastPane::Failed(error) => Self::show_error(ui, error),
        }
    }
}

struct StateWiseView {
    states: Vec<String>,
    confirmed: Vec<f64>,
    recovery: Vec<Option<f64>>,
    fatality: Vec<Option<f64>>,
}

fn national_trend_data(df: &DataFrame) -> Result<(Vec<[f64; 2]>, String), data::DataError> {
    let points = data::date_points(df, COL_DATE, COL_DAILY_CONFIRMED)?;
    let range = match (points.first(), points.last()) {
        (Some(first), Some(last)) => {
            format!(
                "{} to {}",
                epoch_day_label(first[0]),
                epoch_day_label(last[0])
            )
        }
        _ => "an empty dataset".to_string(),
    };
    Ok((points, range))
}

fn epoch_day_label(day: f64) -> String {
    let date = chrono::NaiveDate::default() + chrono::Duration::days(day as i64);
    date.format("%Y-%m-%d").to_string()
}

fn state_wise_data(df: &DataFrame, top_n: usize) -> Result<StateWiseView, data::DataError> {
    let rates = data::state_rates(df)?;
    let top = data::top_n_by(&rates, COL_CONFIRMED, top_n)?;

    Ok(StateWiseView {
        states: data::string_values(&top, COL_STATE)?,
        confirmed: data::f64_values(&top, COL_CONFIRMED)?
            .into_iter()
            .map(|v| v.unwrap_or(0.0))
            .collect(),
        recovery: data::f64_values(&top, COL_RECOVERY_RATE)?,
        fatality: data::f64_values(&top, COL_FATALITY_RATE)?,
    })
}

type TestingPoints = (Vec<[f64; 2]>, Vec<[f64; 2]>);

fn testing_data(df: &DataFrame) -> Result<TestingPoints, data::DataError> {
    let samples = data::date_points(df, COL_DATE, COL_SAMPLES_TESTED)?;
    let positivity = data::date_points(df, COL_DATE, COL_POSITIVE_RATIO)?;
    Ok((samples, positivity))
}

fn capacity_data(
    states: &DataFrame,
    beds: &DataFrame,
) -> Result<(Vec<String>, Vec<f64>), data::DataError> {
    let health = data::health_view(states, beds)?;
    let top = data::top_n_by(&health, COL_CASES_PER_BED, 10)?;
    let labels = data::string_values(&top, COL_STATE)?;
    let ratios = data::f64_values(&top, COL_CASES_PER_BED)?
        .into_iter()
        .map(|v| v.unwrap_or(0.0))
        .collect();
    Ok((labels, ratios))
}
