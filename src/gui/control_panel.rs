//! Control Panel Widget
//! Left side panel: section selection, data directory, view options, status.

use egui::{Color32, RichText};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::forecast::{DEFAULT_HORIZON, MAX_HORIZON, MIN_HORIZON};

/// The five dashboard sections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Section {
    NationalTrend,
    StateWise,
    Testing,
    Capacity,
    Forecast,
}

impl Section {
    pub const ALL: [Section; 5] = [
        Section::NationalTrend,
        Section::StateWise,
        Section::Testing,
        Section::Capacity,
        Section::Forecast,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Section::NationalTrend => "National Trend",
            Section::StateWise => "State-wise Analysis",
            Section::Testing => "Testing & Positivity",
            Section::Capacity => "Healthcare Capacity",
            Section::Forecast => "Forecast (ARIMA)",
        }
    }
}

/// User settings, persisted across sessions via eframe storage.
#[derive(Clone, Serialize, Deserialize)]
pub struct UserSettings {
    pub data_dir: PathBuf,
    pub section: Section,
    pub top_n: usize,
    pub horizon: usize,
}

impl Default for UserSettings {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            section: Section::NationalTrend,
            top_n: 10,
            horizon: DEFAULT_HORIZON,
        }
    }
}

/// Left side control panel.
pub struct ControlPanel {
    pub settings: UserSettings,
    pub progress: f32,
    pub status: String,
}

impl ControlPanel {
    pub fn new(settings: UserSettings) -> Self {
        Self {
            settings,
            progress: 0.0,
            status: "Ready".to_string(),
        }
    }

    /// Draw the control panel
    pub fn show(&mut self, ui: &mut egui::Ui) -> ControlPanelAction {
        let mut action = ControlPanelAction::None;

        // Title
        ui.vertical_centered(|ui| {
            ui.add_space(5.0);
            ui.label(
                RichText::new("🇮🇳 Covidash")
                    .size(22.0)
                    .color(Color32::from_rgb(100, 149, 237)),
            );
            ui.label(
                RichText::new("COVID-19 India Analysis & Forecasting")
                    .size(11.0)
                    .color(Color32::GRAY),
            );
        });
        ui.add_space(10.0);
        ui.separator();
        ui.add_space(5.0);

        // ===== Data Source Section =====
        ui.label(RichText::new("📁 Data Source").size(14.0).strong());
        ui.add_space(5.0);

        egui::Frame::none()
            .fill(ui.visuals().widgets.noninteractive.bg_fill)
            .rounding(5.0)
            .inner_margin(8.0)
            .show(ui, |ui| {
                ui.horizontal(|ui| {
                    let dir_text = self.settings.data_dir.display().to_string();
                    ui.label(RichText::new(dir_text).size(12.0));
                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        if ui.button("📂 Browse").clicked() {
                            action = ControlPanelAction::BrowseDataDir;
                        }
                    });
                });
            });

        ui.add_space(5.0);
        if ui.small_button("⟲ Reload data").clicked() {
            action = ControlPanelAction::Reload;
        }

        ui.add_space(15.0);
        ui.separator();
        ui.add_space(10.0);

        // ===== Section Selection =====
        ui.label(RichText::new("📊 Select a section").size(14.0).strong());
        ui.add_space(5.0);

        for section in Section::ALL {
            ui.radio_value(&mut self.settings.section, section, section.label());
        }

        ui.add_space(15.0);
        ui.separator();
        ui.add_space(10.0);

        // ===== View Options =====
        ui.label(RichText::new("🔧 View Options").size(14.0).strong());
        ui.add_space(8.0);

        match self.settings.section {
            Section::StateWise => {
                ui.add(
                    egui::Slider::new(&mut self.settings.top_n, 5..=20)
                        .text("Top N states by confirmed cases"),
                );
            }
            Section::Forecast => {
                ui.add(
                    egui::Slider::new(&mut self.settings.horizon, MIN_HORIZON..=MAX_HORIZON)
                        .text("Days to forecast"),
                );
            }
            _ => {
                ui.label(
                    RichText::new("No options for this section")
                        .size(11.0)
                        .color(Color32::GRAY),
                );
            }
        }

        ui.add_space(15.0);
        ui.separator();
        ui.add_space(10.0);

        // ===== Progress Section =====
        ui.add(
            egui::ProgressBar::new(self.progress / 100.0)
                .show_percentage()
                .animate(self.progress > 0.0 && self.progress < 100.0),
        );

        ui.add_space(5.0);

        let status_color = if self.status.contains("Error") {
            Color32::from_rgb(220, 53, 69)
        } else if self.status.contains("ready") || self.status.contains("loaded") {
            Color32::from_rgb(40, 167, 69)
        } else {
            Color32::GRAY
        };
        ui.label(RichText::new(&self.status).size(11.0).color(status_color));

        action
    }

    /// Set progress and status
    pub fn set_progress(&mut self, progress: f32, status: &str) {
        self.progress = progress;
        self.status = status.to_string();
    }
}

/// Actions triggered by control panel
#[derive(Debug, Clone, PartialEq)]
pub enum ControlPanelAction {
    None,
    BrowseDataDir,
    Reload,
}
