//! Data module - CSV loading, caching and derived views

mod loader;
mod store;
mod views;

pub use loader::{
    load_case_timeseries, load_hospital_beds, load_state_wise, load_testing, DataError, COL_BEDS,
    COL_CONFIRMED, COL_DAILY_CONFIRMED, COL_DATE, COL_DEATHS, COL_POSITIVE_RATIO, COL_RECOVERED,
    COL_SAMPLES_TESTED, COL_STATE, COL_TOTAL_POSITIVE,
};
pub use store::{DataStore, Dataset};
pub use views::{
    date_points, f64_values, health_view, state_rates, string_values, top_n_by,
    COL_CASES_PER_BED, COL_FATALITY_RATE, COL_RECOVERY_RATE,
};
