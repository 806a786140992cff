//! GUI module - User interface components

mod app;
mod control_panel;
mod section_viewer;

pub use app::CovidashApp;
pub use control_panel::{ControlPanel, ControlPanelAction, Section, UserSettings};
pub use section_viewer::{ForecastPane, ForecastView, SectionViewer};
