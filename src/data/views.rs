//! Derived Views
//! Joins, filters and ratio columns computed from the loaded tables, plus the
//! row-extraction helpers the chart layer consumes.

use polars::prelude::*;

use super::loader::{
    DataError, COL_BEDS, COL_CONFIRMED, COL_DEATHS, COL_RECOVERED, COL_STATE,
};

pub const COL_RECOVERY_RATE: &str = "Recovery Rate";
pub const COL_FATALITY_RATE: &str = "Fatality Rate";
pub const COL_CASES_PER_BED: &str = "CasesPerBed";

/// Label of the aggregate row in the state-wise table.
const TOTAL_ROW: &str = "Total";

fn require_column(df: &DataFrame, column: &str, what: &str) -> Result<(), DataError> {
    if df.get_column_names().iter().any(|c| c.as_str() == column) {
        Ok(())
    } else {
        Err(DataError::MissingColumn {
            column: column.to_string(),
            file: what.to_string(),
        })
    }
}

/// Percentage of `numerator` over `Confirmed`, null when `Confirmed` is null
/// or zero. A zero-confirmed state must never show up as an infinite or zero
/// rate.
fn pct_of_confirmed(numerator: &str) -> Expr {
    when(col(COL_CONFIRMED).gt(lit(0.0)))
        .then(col(numerator) / col(COL_CONFIRMED) * lit(100.0))
        .otherwise(lit(Null {}))
}

/// State-wise table without the aggregate `Total` row, with recovery and
/// fatality rate columns (percent) appended.
pub fn state_rates(states: &DataFrame) -> Result<DataFrame, DataError> {
    for column in [COL_STATE, COL_CONFIRMED, COL_RECOVERED, COL_DEATHS] {
        require_column(states, column, "state-wise table")?;
    }

    let out = states
        .clone()
        .lazy()
        .filter(col(COL_STATE).neq(lit(TOTAL_ROW)))
        .with_columns([
            pct_of_confirmed(COL_RECOVERED).alias(COL_RECOVERY_RATE),
            pct_of_confirmed(COL_DEATHS).alias(COL_FATALITY_RATE),
        ])
        .collect()?;
    Ok(out)
}

/// Inner join of the state-wise table (minus `Total`) with hospital beds,
/// plus a `CasesPerBed` column. States missing bed data, with unknown bed
/// counts, or with no public beds are excluded.
pub fn health_view(states: &DataFrame, beds: &DataFrame) -> Result<DataFrame, DataError> {
    require_column(states, COL_STATE, "state-wise table")?;
    require_column(states, COL_CONFIRMED, "state-wise table")?;
    require_column(beds, COL_STATE, "hospital beds table")?;
    require_column(beds, COL_BEDS, "hospital beds table")?;

    let out = states
        .clone()
        .lazy()
        .filter(col(COL_STATE).neq(lit(TOTAL_ROW)))
        .join(
            beds.clone().lazy(),
            [col(COL_STATE)],
            [col(COL_STATE)],
            JoinArgs::new(JoinType::Inner),
        )
        .filter(col(COL_BEDS).gt(lit(0.0)))
        .with_column((col(COL_CONFIRMED) / col(COL_BEDS)).alias(COL_CASES_PER_BED))
        .drop_nulls(Some(vec![col(COL_CASES_PER_BED)]))
        .collect()?;
    Ok(out)
}

/// Top `n` rows ranked descending on `column`. Null-valued rows never rank.
pub fn top_n_by(df: &DataFrame, column: &str, n: usize) -> Result<DataFrame, DataError> {
    let out = df
        .clone()
        .lazy()
        .drop_nulls(Some(vec![col(column)]))
        .sort(
            [column],
            SortMultipleOptions::default().with_order_descending(true),
        )
        .limit(n as IdxSize)
        .collect()?;
    Ok(out)
}

/// Extract a string column as owned values (nulls skipped).
pub fn string_values(df: &DataFrame, column: &str) -> Result<Vec<String>, DataError> {
    let casted = df.column(column)?.cast(&DataType::String)?;
    let ca = casted.as_materialized_series().str()?;
    Ok(ca.into_iter().flatten().map(|s| s.to_string()).collect())
}

/// Extract a numeric column, preserving nulls as `None`.
pub fn f64_values(df: &DataFrame, column: &str) -> Result<Vec<Option<f64>>, DataError> {
    let ca = df.column(column)?.cast(&DataType::Float64)?;
    let ca = ca.f64()?;
    Ok(ca.into_iter().collect())
}

/// Extract (date, value) pairs for plotting, x as days since the Unix epoch.
/// Rows where either side is null are skipped.
pub fn date_points(
    df: &DataFrame,
    date_column: &str,
    value_column: &str,
) -> Result<Vec<[f64; 2]>, DataError> {
    let days = df.column(date_column)?.cast(&DataType::Int32)?;
    let days = days.as_materialized_series().i32()?;
    let values = df.column(value_column)?.cast(&DataType::Float64)?;
    let values = values.f64()?;

    let mut points = Vec::with_capacity(df.height());
    for (day, value) in days.into_iter().zip(values.into_iter()) {
        if let (Some(day), Some(value)) = (day, value) {
            points.push([day as f64, value]);
        }
    }
    Ok(points)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state_table() -> DataFrame {
        DataFrame::new(vec![
            Column::new(
                COL_STATE.into(),
                &["Maharashtra", "Kerala", "Goa", "Total"],
            ),
            Column::new(COL_CONFIRMED.into(), &[1000.0, 400.0, 0.0, 1400.0]),
            Column::new(COL_RECOVERED.into(), &[800.0, 390.0, 0.0, 1190.0]),
            Column::new(COL_DEATHS.into(), &[50.0, 2.0, 0.0, 52.0]),
        ])
        .unwrap()
    }

    fn beds_table() -> DataFrame {
        DataFrame::new(vec![
            Column::new(COL_STATE.into(), &["Maharashtra", "Kerala", "Sikkim"]),
            Column::new(COL_BEDS.into(), &[Some(500.0), Some(0.0), None]),
        ])
        .unwrap()
    }

    #[test]
    fn state_rates_excludes_total_row() {
        let rates = state_rates(&state_table()).unwrap();
        let states = string_values(&rates, COL_STATE).unwrap();
        assert!(!states.iter().any(|s| s == "Total"));
        assert_eq!(rates.height(), 3);
    }

    #[test]
    fn state_rates_computes_percentages() {
        let rates = state_rates(&state_table()).unwrap();
        let recovery = f64_values(&rates, COL_RECOVERY_RATE).unwrap();
        let fatality = f64_values(&rates, COL_FATALITY_RATE).unwrap();
        assert!((recovery[0].unwrap() - 80.0).abs() < 1e-9);
        assert!((fatality[0].unwrap() - 5.0).abs() < 1e-9);
        assert!((recovery[1].unwrap() - 97.5).abs() < 1e-9);
    }

    #[test]
    fn zero_confirmed_state_has_null_rate_and_never_ranks() {
        let rates = state_rates(&state_table()).unwrap();
        let recovery = f64_values(&rates, COL_RECOVERY_RATE).unwrap();
        // Goa has Confirmed = 0: its rate must be missing, not 0 or infinite.
        assert_eq!(recovery[2], None);

        let ranked = top_n_by(&rates, COL_RECOVERY_RATE, 10).unwrap();
        let states = string_values(&ranked, COL_STATE).unwrap();
        assert!(!states.iter().any(|s| s == "Goa"));
    }

    #[test]
    fn health_view_joins_and_computes_cases_per_bed() {
        let health = health_view(&state_table(), &beds_table()).unwrap();
        // Kerala (0 beds), Sikkim (null beds), Goa (no beds row) and Total
        // are all excluded.
        assert_eq!(health.height(), 1);

        let states = string_values(&health, COL_STATE).unwrap();
        assert_eq!(states, vec!["Maharashtra".to_string()]);

        let ratio = f64_values(&health, COL_CASES_PER_BED).unwrap();
        let beds = f64_values(&health, COL_BEDS).unwrap();
        assert!(beds[0].unwrap() > 0.0);
        assert!((ratio[0].unwrap() - 1000.0 / 500.0).abs() < 1e-12);
    }

    #[test]
    fn health_view_requires_confirmed_column() {
        let no_confirmed = DataFrame::new(vec![Column::new(
            COL_STATE.into(),
            &["Kerala"],
        )])
        .unwrap();
        let err = health_view(&no_confirmed, &beds_table()).unwrap_err();
        assert!(matches!(err, DataError::MissingColumn { .. }));
    }

    #[test]
    fn top_n_limits_and_sorts_descending() {
        let rates = state_rates(&state_table()).unwrap();
        let top = top_n_by(&rates, COL_CONFIRMED, 2).unwrap();
        let states = string_values(&top, COL_STATE).unwrap();
        assert_eq!(
            states,
            vec!["Maharashtra".to_string(), "Kerala".to_string()]
        );
    }
}
