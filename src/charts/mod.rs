//! Charts module - interactive chart builders

mod plotter;

pub use plotter::{ChartPlotter, CASES_COLOR, POSITIVITY_COLOR, STRESS_COLOR, TESTING_COLOR};
