//! Daily Series
//! The model input: case counts reindexed onto a strict daily calendar grid,
//! gaps filled with zero. Dates are carried as `chrono::NaiveDate`; for
//! plotting, the x coordinate is days since the Unix epoch.

use chrono::{Duration, NaiveDate};
use polars::prelude::*;

use crate::data::{DataError, COL_DAILY_CONFIRMED, COL_DATE};

/// A regularly spaced daily time series.
#[derive(Debug, Clone)]
pub struct DailySeries {
    start: NaiveDate,
    values: Vec<f64>,
}

impl DailySeries {
    /// Build the daily confirmed-case series from the loaded case table.
    ///
    /// The table is already date-sorted with nulls dropped; any calendar days
    /// absent from the table become zero-count days.
    pub fn from_case_table(df: &DataFrame) -> Result<Self, DataError> {
        let days = df.column(COL_DATE)?.cast(&DataType::Int32)?;
        let days = days.as_materialized_series().i32()?;
        let counts = df.column(COL_DAILY_CONFIRMED)?.cast(&DataType::Float64)?;
        let counts = counts.f64()?;

        let mut rows: Vec<(i32, f64)> = Vec::with_capacity(df.height());
        for (day, count) in days.into_iter().zip(counts.into_iter()) {
            if let (Some(day), Some(count)) = (day, count) {
                rows.push((day, count));
            }
        }
        if rows.is_empty() {
            return Err(DataError::Empty("case time series".to_string()));
        }

        let first = rows[0].0;
        let last = rows[rows.len() - 1].0;
        let mut values = vec![0.0; (last - first) as usize + 1];
        for (day, count) in rows {
            values[(day - first) as usize] = count;
        }

        // NaiveDate::default() is 1970-01-01, the same epoch Polars dates use.
        let start = NaiveDate::default() + Duration::days(first as i64);
        Ok(Self { start, values })
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn start_date(&self) -> NaiveDate {
        self.start
    }

    pub fn last_date(&self) -> NaiveDate {
        self.start + Duration::days(self.values.len() as i64 - 1)
    }

    /// The `horizon` consecutive calendar days immediately after the last
    /// observed day.
    pub fn future_dates(&self, horizon: usize) -> Vec<NaiveDate> {
        let last = self.last_date();
        (1..=horizon as i64)
            .map(|k| last + Duration::days(k))
            .collect()
    }

    /// Days since the Unix epoch, as the plot x coordinate.
    pub fn day_number(date: NaiveDate) -> f64 {
        (date - NaiveDate::default()).num_days() as f64
    }

    /// Observed (x, y) points for plotting.
    pub fn observed_points(&self) -> Vec<[f64; 2]> {
        let first = Self::day_number(self.start);
        self.values
            .iter()
            .enumerate()
            .map(|(i, &v)| [first + i as f64, v])
            .collect()
    }

    /// Pair forecast values with the future days after the last observation.
    pub fn future_points(&self, values: &[f64]) -> Vec<[f64; 2]> {
        let last = Self::day_number(self.last_date());
        values
            .iter()
            .enumerate()
            .map(|(i, &v)| [last + (i + 1) as f64, v])
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn case_table(rows: &[(&str, f64)]) -> DataFrame {
        let dates: Vec<&str> = rows.iter().map(|(d, _)| *d).collect();
        let counts: Vec<f64> = rows.iter().map(|(_, c)| *c).collect();
        DataFrame::new(vec![
            Column::new(COL_DATE.into(), dates),
            Column::new(COL_DAILY_CONFIRMED.into(), counts),
        ])
        .unwrap()
        .lazy()
        .with_column(col(COL_DATE).str().to_date(StrptimeOptions {
            format: Some("%Y-%m-%d".into()),
            strict: false,
            exact: true,
            cache: true,
        }))
        .collect()
        .unwrap()
    }

    #[test]
    fn gaps_are_filled_with_zero() {
        let df = case_table(&[("2020-01-30", 3.0), ("2020-02-02", 5.0)]);
        let series = DailySeries::from_case_table(&df).unwrap();
        assert_eq!(series.values(), &[3.0, 0.0, 0.0, 5.0]);
        assert_eq!(
            series.start_date(),
            NaiveDate::from_ymd_opt(2020, 1, 30).unwrap()
        );
        assert_eq!(
            series.last_date(),
            NaiveDate::from_ymd_opt(2020, 2, 2).unwrap()
        );
    }

    #[test]
    fn future_dates_are_consecutive_after_last_observation() {
        let df = case_table(&[("2020-01-30", 3.0), ("2020-01-31", 4.0)]);
        let series = DailySeries::from_case_table(&df).unwrap();

        let future = series.future_dates(3);
        assert_eq!(
            future,
            vec![
                NaiveDate::from_ymd_opt(2020, 2, 1).unwrap(),
                NaiveDate::from_ymd_opt(2020, 2, 2).unwrap(),
                NaiveDate::from_ymd_opt(2020, 2, 3).unwrap(),
            ]
        );
    }

    #[test]
    fn plot_points_share_the_epoch_day_axis() {
        let df = case_table(&[("1970-01-01", 1.0), ("1970-01-02", 2.0)]);
        let series = DailySeries::from_case_table(&df).unwrap();

        assert_eq!(series.observed_points(), vec![[0.0, 1.0], [1.0, 2.0]]);
        assert_eq!(series.future_points(&[9.0]), vec![[2.0, 9.0]]);
    }

    #[test]
    fn empty_table_is_an_error() {
        let df = case_table(&[]);
        assert!(DailySeries::from_case_table(&df).is_err());
    }
}
