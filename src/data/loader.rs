//! CSV Dataset Loaders
//! One loader per input file, built on Polars. Each loader normalizes the
//! schema at the boundary (canonical column names, parsed dates, numeric
//! coercion) so downstream code only sees canonical columns.
//!
//! Failure policy: malformed individual values become null (or are dropped
//! for unparseable dates); a missing file or missing required column is a
//! hard error.

use polars::prelude::*;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Canonical column names after loading.
pub const COL_DATE: &str = "Date";
pub const COL_DAILY_CONFIRMED: &str = "Daily Confirmed";
pub const COL_STATE: &str = "State";
pub const COL_CONFIRMED: &str = "Confirmed";
pub const COL_RECOVERED: &str = "Recovered";
pub const COL_DEATHS: &str = "Deaths";
pub const COL_SAMPLES_TESTED: &str = "totalSamplesTested";
pub const COL_TOTAL_POSITIVE: &str = "totalPositiveCases";
pub const COL_POSITIVE_RATIO: &str = "positive_ratio";
pub const COL_BEDS: &str = "NumPublicBeds_HMIS";

/// Source column that some dataset versions use instead of `State`.
const COL_STATE_UT: &str = "State/UT";
/// Source column holding the testing report date (day-first format).
const COL_TESTING_DAY: &str = "day";

#[derive(Error, Debug)]
pub enum DataError {
    #[error("Failed to load CSV: {0}")]
    Csv(#[from] PolarsError),
    #[error("Input file not found: {0}")]
    FileNotFound(String),
    #[error("Column '{column}' is missing from {file}")]
    MissingColumn { column: String, file: String },
    #[error("No usable rows in {0}")]
    Empty(String),
}

/// Read a CSV file into a DataFrame with lenient parsing.
fn read_csv(path: &Path) -> Result<DataFrame, DataError> {
    if !path.is_file() {
        return Err(DataError::FileNotFound(path.display().to_string()));
    }

    let df = LazyCsvReader::new(path)
        .with_infer_schema_length(Some(10000))
        .with_ignore_errors(true)
        .finish()?
        .collect()?;
    Ok(df)
}

fn file_label(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}

fn require_column(df: &DataFrame, column: &str, path: &Path) -> Result<(), DataError> {
    if df.get_column_names().iter().any(|c| c.as_str() == column) {
        Ok(())
    } else {
        Err(DataError::MissingColumn {
            column: column.to_string(),
            file: file_label(path),
        })
    }
}

fn has_column(df: &DataFrame, column: &str) -> bool {
    df.get_column_names().iter().any(|c| c.as_str() == column)
}

/// Rename `State/UT` to `State` when present (schema drift between dataset versions).
fn normalize_state_column(df: &mut DataFrame) -> Result<(), DataError> {
    if has_column(df, COL_STATE_UT) {
        df.rename(COL_STATE_UT, COL_STATE.into())?;
    }
    Ok(())
}

/// Coerce a column to Float64 in place. Values that fail to parse become null.
fn coerce_numeric(df: &mut DataFrame, column: &str) -> Result<(), DataError> {
    let casted = df.column(column)?.cast(&DataType::Float64)?;
    df.with_column(casted)?;
    Ok(())
}

/// Coerce a column to Float64 only if it exists; absent columns are left to
/// downstream required-column checks.
fn coerce_numeric_if_present(df: &mut DataFrame, column: &str) -> Result<(), DataError> {
    if has_column(df, column) {
        coerce_numeric(df, column)?;
    }
    Ok(())
}

fn strptime(format: &str) -> StrptimeOptions {
    StrptimeOptions {
        format: Some(format.into()),
        strict: false,
        exact: true,
        cache: true,
    }
}

/// Parse a string column into a Date column named `target`, drop rows where
/// parsing failed and sort ascending by date.
fn parse_date_and_sort(
    df: DataFrame,
    source: &str,
    target: &str,
    format: &str,
) -> Result<DataFrame, DataError> {
    let before = df.height();
    let out = df
        .lazy()
        .with_column(
            col(source)
                .cast(DataType::String)
                .str()
                .to_date(strptime(format))
                .alias(target),
        )
        .filter(col(target).is_not_null())
        .sort([target], SortMultipleOptions::default())
        .collect()?;
    let dropped = before - out.height();
    if dropped > 0 {
        warn!(kept = out.height(), dropped, "dropped rows with unparseable '{source}' dates");
    } else {
        debug!(kept = out.height(), "parsed date column '{source}'");
    }
    Ok(out)
}

/// Load the national case time series: `Date` + `Daily Confirmed`.
///
/// Rows with unparseable dates are dropped; unparseable counts become 0.
pub fn load_case_timeseries(path: &Path) -> Result<DataFrame, DataError> {
    let df = read_csv(path)?;
    require_column(&df, COL_DATE, path)?;
    require_column(&df, COL_DAILY_CONFIRMED, path)?;

    let mut df = parse_date_and_sort(df, COL_DATE, COL_DATE, "%Y-%m-%d")?;
    coerce_numeric(&mut df, COL_DAILY_CONFIRMED)?;
    let filled = df
        .column(COL_DAILY_CONFIRMED)?
        .as_materialized_series()
        .fill_null(FillNullStrategy::Zero)?;
    df.with_column(filled)?;

    if df.height() == 0 {
        return Err(DataError::Empty(file_label(path)));
    }
    info!(rows = df.height(), "loaded case time series");
    Ok(df)
}

/// Load the state-wise table: `State` (normalized) plus confirmed / recovered /
/// death counts coerced to numeric where present.
pub fn load_state_wise(path: &Path) -> Result<DataFrame, DataError> {
    let mut df = read_csv(path)?;
    normalize_state_column(&mut df)?;
    require_column(&df, COL_STATE, path)?;

    for column in [COL_CONFIRMED, COL_RECOVERED, COL_DEATHS] {
        coerce_numeric_if_present(&mut df, column)?;
    }
    info!(rows = df.height(), "loaded state-wise table");
    Ok(df)
}

/// Load the ICMR testing table. The source `day` column is day-first.
pub fn load_testing(path: &Path) -> Result<DataFrame, DataError> {
    let df = read_csv(path)?;
    require_column(&df, COL_TESTING_DAY, path)?;

    let mut df = parse_date_and_sort(df, COL_TESTING_DAY, COL_DATE, "%d/%m/%Y")?;
    for column in [COL_SAMPLES_TESTED, COL_TOTAL_POSITIVE, COL_POSITIVE_RATIO] {
        coerce_numeric_if_present(&mut df, column)?;
    }

    if df.height() == 0 {
        return Err(DataError::Empty(file_label(path)));
    }
    info!(rows = df.height(), "loaded testing table");
    Ok(df)
}

/// Load the hospital beds table: `State` (normalized) + public bed counts.
pub fn load_hospital_beds(path: &Path) -> Result<DataFrame, DataError> {
    let mut df = read_csv(path)?;
    normalize_state_column(&mut df)?;
    require_column(&df, COL_STATE, path)?;
    require_column(&df, COL_BEDS, path)?;
    coerce_numeric(&mut df, COL_BEDS)?;
    info!(rows = df.height(), "loaded hospital beds table");
    Ok(df)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_csv(dir: &tempfile::TempDir, name: &str, content: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(content.as_bytes()).unwrap();
        path
    }

    #[test]
    fn case_timeseries_drops_unparseable_dates() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_csv(
            &dir,
            "case_time_series.csv",
            "Date,Daily Confirmed\n2020-01-30,3\nnot-a-date,5\n2020-02-01,1\n",
        );

        let df = load_case_timeseries(&path).unwrap();
        assert_eq!(df.height(), 2);

        let counts: Vec<f64> = df
            .column(COL_DAILY_CONFIRMED)
            .unwrap()
            .f64()
            .unwrap()
            .into_iter()
            .flatten()
            .collect();
        assert_eq!(counts, vec![3.0, 1.0]);
    }

    #[test]
    fn case_timeseries_sorts_by_date_and_zero_fills_bad_counts() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_csv(
            &dir,
            "case_time_series.csv",
            "Date,Daily Confirmed\n2020-02-01,7\n2020-01-30,bad\n2020-01-31,2\n",
        );

        let df = load_case_timeseries(&path).unwrap();
        let days: Vec<i32> = df
            .column(COL_DATE)
            .unwrap()
            .cast(&DataType::Int32)
            .unwrap()
            .as_materialized_series()
            .i32()
            .unwrap()
            .into_iter()
            .flatten()
            .collect();
        let mut sorted = days.clone();
        sorted.sort_unstable();
        assert_eq!(days, sorted);

        // The malformed count survives as zero; the row itself is kept.
        let counts: Vec<f64> = df
            .column(COL_DAILY_CONFIRMED)
            .unwrap()
            .f64()
            .unwrap()
            .into_iter()
            .flatten()
            .collect();
        assert_eq!(counts, vec![0.0, 2.0, 7.0]);
    }

    #[test]
    fn state_wise_normalizes_state_ut_and_coerces_counts() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_csv(
            &dir,
            "state_wise.csv",
            "State/UT,Confirmed,Recovered,Deaths\nKerala,100,90,x\nTotal,500,400,20\n",
        );

        let df = load_state_wise(&path).unwrap();
        assert!(df.column(COL_STATE).is_ok());
        assert!(df.column("State/UT").is_err());

        let deaths = df.column(COL_DEATHS).unwrap().f64().unwrap();
        assert!(deaths.get(0).is_none());
        assert_eq!(deaths.get(1), Some(20.0));
    }

    #[test]
    fn testing_parses_day_first_dates() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_csv(
            &dir,
            "ICMR_Testing_Data.csv",
            "day,totalSamplesTested,totalPositiveCases,positive_ratio\n\
             14/03/2020,1000,20,2.0\n13/03/2020,900,15,1.7\n??,5,1,20.0\n",
        );

        let df = load_testing(&path).unwrap();
        assert_eq!(df.height(), 2);

        let days: Vec<i32> = df
            .column(COL_DATE)
            .unwrap()
            .cast(&DataType::Int32)
            .unwrap()
            .as_materialized_series()
            .i32()
            .unwrap()
            .into_iter()
            .flatten()
            .collect();
        // 13 March 2020 must come first.
        assert!(days[0] < days[1]);
    }

    #[test]
    fn missing_file_is_a_hard_error() {
        let err = load_case_timeseries(Path::new("/nonexistent/case.csv")).unwrap_err();
        assert!(matches!(err, DataError::FileNotFound(_)));
    }

    #[test]
    fn missing_required_column_is_a_hard_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_csv(&dir, "beds.csv", "State,SomethingElse\nKerala,1\n");
        let err = load_hospital_beds(&path).unwrap_err();
        assert!(matches!(err, DataError::MissingColumn { .. }));
    }
}
