//! Typed access to table columns

use polars::prelude::*;

use super::error::{PipelineError, Result};

/// Column values as floats; unparseable entries become null.
pub fn f64_values(df: &DataFrame, name: &str, context: &str) -> Result<Vec<Option<f64>>> {
    let column = df
        .column(name)
        .map_err(|_| PipelineError::missing_column(name, context))?;
    let cast = column.cast(&DataType::Float64)?;
    Ok(cast.f64()?.into_iter().collect())
}

/// Column values as text.
pub fn string_values(df: &DataFrame, name: &str, context: &str) -> Result<Vec<Option<String>>> {
    let column = df
        .column(name)
        .map_err(|_| PipelineError::missing_column(name, context))?;
    let cast = column.cast(&DataType::String)?;
    Ok(cast
        .str()?
        .into_iter()
        .map(|v| v.map(|s| s.to_string()))
        .collect())
}

/// Build a count column, as Int64 when every value is integral.
pub fn count_column(name: &str, values: &[Option<f64>]) -> Column {
    let integral = values.iter().flatten().all(|v| v.fract() == 0.0 && v.abs() < i64::MAX as f64);
    if integral {
        let ints: Vec<Option<i64>> = values.iter().map(|v| v.map(|x| x as i64)).collect();
        Column::new(name.into(), ints)
    } else {
        Column::new(name.into(), values.to_vec())
    }
}

/// Drop every column that holds only nulls.
///
/// An empty table keeps its columns so exports still carry a header.
pub fn drop_all_null_columns(df: DataFrame) -> Result<DataFrame> {
    if df.height() == 0 {
        return Ok(df);
    }

    let keep: Vec<PlSmallStr> = df
        .get_columns()
        .iter()
        .filter(|c| c.null_count() < c.len())
        .map(|c| c.name().clone())
        .collect();

    Ok(df.select(keep)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_f64_values_from_text() {
        let df = df! { "uniques" => [Some("10"), None, Some("x"), Some("2.5")] }.unwrap();
        let values = f64_values(&df, "uniques", "test").unwrap();
        assert_eq!(values, vec![Some(10.0), None, None, Some(2.5)]);
    }

    #[test]
    fn test_f64_values_missing_column() {
        let df = df! { "a" => [1i32] }.unwrap();
        let err = f64_values(&df, "uniques", "test").unwrap_err();
        assert!(matches!(err, PipelineError::MissingColumn { .. }));
    }

    #[test]
    fn test_count_column_integral() {
        let column = count_column("impressions", &[Some(100.0), None]);
        assert_eq!(column.dtype(), &DataType::Int64);
        let column = count_column("impressions", &[Some(1.5)]);
        assert_eq!(column.dtype(), &DataType::Float64);
    }

    #[test]
    fn test_drop_all_null_columns() {
        let df = df! {
            "location_id" => ["1", "2"],
            "home" => [None::<&str>, None],
        }
        .unwrap();
        let df = drop_all_null_columns(df).unwrap();
        assert_eq!(df.get_column_names(), &["location_id"]);
    }
}
