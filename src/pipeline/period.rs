//! Reporting period of an export

use polars::prelude::*;
use serde::Serialize;

use super::columns::string_values;
use super::error::Result;

pub const START_DATE: &str = "start_date";
pub const END_DATE: &str = "end_date";

/// Start and end of the period an export covers, as written in the file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DatasetPeriod {
    pub start: String,
    pub end: String,
}

fn first_present(df: &DataFrame, column: &str) -> Result<Option<String>> {
    Ok(string_values(df, column, "reporting period")?
        .into_iter()
        .flatten()
        .next())
}

/// First non-null `start_date` and `end_date`, if both columns carry a value.
pub fn dataset_period(df: &DataFrame) -> Result<Option<DatasetPeriod>> {
    if df.column(START_DATE).is_err() || df.column(END_DATE).is_err() {
        return Ok(None);
    }

    let start = first_present(df, START_DATE)?;
    let end = first_present(df, END_DATE)?;

    Ok(start.zip(end).map(|(start, end)| DatasetPeriod { start, end }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_period_skips_nulls() {
        let df = df! {
            "start_date" => [None, Some("2024-01-01")],
            "end_date" => [Some("2024-01-31"), None],
        }
        .unwrap();

        let period = dataset_period(&df).unwrap().unwrap();
        assert_eq!(period.start, "2024-01-01");
        assert_eq!(period.end, "2024-01-31");
    }

    #[test]
    fn test_period_missing_columns() {
        let df = df! { "start_date" => ["2024-01-01"] }.unwrap();
        assert_eq!(dataset_period(&df).unwrap(), None);
    }
}
