//! Forecast module - daily series preparation and ARIMA forecasting

mod arima;
mod ols;
mod series;

pub use arima::{fit, ArimaModel, ArimaOrder, Forecast, ForecastError};
pub use series::DailySeries;

/// Bounds on the user-selectable forecast horizon, in days.
pub const MIN_HORIZON: usize = 7;
pub const MAX_HORIZON: usize = 60;
pub const DEFAULT_HORIZON: usize = 30;
