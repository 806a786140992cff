//! Chart Plotter Module
//! Creates the dashboard's interactive visualizations using egui_plot.

use chrono::{Duration, NaiveDate};
use egui::Color32;
use egui_plot::{Bar, BarChart, Legend, Line, LineStyle, Plot, PlotPoints, Points, Polygon};

/// Section color scheme.
pub const CASES_COLOR: Color32 = Color32::from_rgb(52, 152, 219); // Blue
pub const RECOVERY_COLOR: Color32 = Color32::from_rgb(46, 204, 113); // Green
pub const FATALITY_COLOR: Color32 = Color32::from_rgb(231, 76, 60); // Red
pub const TESTING_COLOR: Color32 = Color32::from_rgb(155, 89, 182); // Purple
pub const POSITIVITY_COLOR: Color32 = Color32::from_rgb(231, 76, 60); // Red
pub const STRESS_COLOR: Color32 = Color32::from_rgb(243, 156, 18); // Orange
pub const FORECAST_COLOR: Color32 = Color32::from_rgb(26, 188, 156); // Teal

const CHART_HEIGHT: f32 = 380.0;

/// Label an epoch-day x coordinate as a calendar date.
fn date_label(value: f64) -> String {
    let date = NaiveDate::default() + Duration::days(value.round() as i64);
    date.format("%d %b %Y").to_string()
}

/// Builds the per-section charts.
pub struct ChartPlotter;

impl ChartPlotter {
    /// Line chart over calendar time. X values are days since the Unix epoch.
    pub fn draw_time_series(
        ui: &mut egui::Ui,
        id: &str,
        y_label: &str,
        points: Vec<[f64; 2]>,
        color: Color32,
    ) {
        Plot::new(id.to_string())
            .height(CHART_HEIGHT)
            .allow_scroll(false)
            .x_axis_label("Date")
            .y_axis_label(y_label.to_string())
            .x_axis_formatter(|mark, _range| date_label(mark.value))
            .show(ui, |plot_ui| {
                plot_ui.line(
                    Line::new(PlotPoints::from(points))
                        .color(color)
                        .width(1.5)
                        .name(y_label),
                );
            });
    }

    /// Bar chart over named categories (states), one bar per label.
    pub fn draw_labeled_bars(
        ui: &mut egui::Ui,
        id: &str,
        y_label: &str,
        labels: &[String],
        values: &[f64],
        color: Color32,
    ) {
        let bars: Vec<Bar> = values
            .iter()
            .enumerate()
            .map(|(i, &v)| Bar::new(i as f64, v).width(0.6).fill(color))
            .collect();

        let x_labels = labels.to_vec();
        Plot::new(id.to_string())
            .height(CHART_HEIGHT)
            .allow_scroll(false)
            .y_axis_label(y_label.to_string())
            .x_axis_formatter(move |mark, _range| {
                let idx = mark.value.round() as usize;
                if (mark.value - idx as f64).abs() < 1e-6 && idx < x_labels.len() {
                    x_labels[idx].clone()
                } else {
                    String::new()
                }
            })
            .show(ui, |plot_ui| {
                plot_ui.bar_chart(BarChart::new(bars).name(y_label));
            });
    }

    /// Recovery vs fatality rate lines across states. Missing rates leave a
    /// gap instead of plotting a fake zero.
    pub fn draw_rate_lines(
        ui: &mut egui::Ui,
        id: &str,
        labels: &[String],
        recovery: &[Option<f64>],
        fatality: &[Option<f64>],
    ) {
        let recovery_pts: Vec<[f64; 2]> = points_with_gaps(recovery);
        let fatality_pts: Vec<[f64; 2]> = points_with_gaps(fatality);

        let x_labels = labels.to_vec();
        Plot::new(id.to_string())
            .height(CHART_HEIGHT)
            .allow_scroll(false)
            .legend(Legend::default())
            .y_axis_label("Rate (%)")
            .x_axis_formatter(move |mark, _range| {
                let idx = mark.value.round() as usize;
                if (mark.value - idx as f64).abs() < 1e-6 && idx < x_labels.len() {
                    x_labels[idx].clone()
                } else {
                    String::new()
                }
            })
            .show(ui, |plot_ui| {
                plot_ui.line(
                    Line::new(PlotPoints::from(recovery_pts.clone()))
                        .color(RECOVERY_COLOR)
                        .width(1.5)
                        .name("Recovery Rate (%)"),
                );
                plot_ui.points(
                    Points::new(PlotPoints::from(recovery_pts))
                        .radius(3.0)
                        .color(RECOVERY_COLOR),
                );
                plot_ui.line(
                    Line::new(PlotPoints::from(fatality_pts.clone()))
                        .color(FATALITY_COLOR)
                        .width(1.5)
                        .style(LineStyle::dashed_loose())
                        .name("Fatality Rate (%)"),
                );
                plot_ui.points(
                    Points::new(PlotPoints::from(fatality_pts))
                        .radius(3.0)
                        .color(FATALITY_COLOR),
                );
            });
    }

    /// Forecast chart: observed history, dashed forecast mean, shaded
    /// confidence band.
    pub fn draw_forecast(
        ui: &mut egui::Ui,
        id: &str,
        history: Vec<[f64; 2]>,
        mean: Vec<[f64; 2]>,
        band: Vec<[f64; 2]>,
    ) {
        Plot::new(id.to_string())
            .height(CHART_HEIGHT)
            .allow_scroll(false)
            .legend(Legend::default())
            .x_axis_label("Date")
            .y_axis_label("Daily Confirmed Cases")
            .x_axis_formatter(|mark, _range| date_label(mark.value))
            .show(ui, |plot_ui| {
                plot_ui.polygon(
                    Polygon::new(PlotPoints::from(band))
                        .fill_color(FORECAST_COLOR.gamma_multiply(0.25))
                        .stroke(egui::Stroke::NONE)
                        .name("95% interval"),
                );
                plot_ui.line(
                    Line::new(PlotPoints::from(history))
                        .color(CASES_COLOR)
                        .width(1.5)
                        .name("Historical"),
                );
                plot_ui.line(
                    Line::new(PlotPoints::from(mean))
                        .color(FORECAST_COLOR)
                        .width(2.0)
                        .style(LineStyle::dashed_loose())
                        .name("Forecast"),
                );
            });
    }
}

/// Index the present values against their position, leaving gaps for `None`.
fn points_with_gaps(values: &[Option<f64>]) -> Vec<[f64; 2]> {
    values
        .iter()
        .enumerate()
        .filter_map(|(i, v)| v.map(|v| [i as f64, v]))
        .collect()
}
