//! Location transform: select site rows, normalize ids, join with the site table
//!
//! The output is one row per joined site with coordinates and the average
//! exposure frequency (`frequencia = impressions / uniques`).

use std::cmp::Ordering;
use std::collections::{BTreeSet, HashMap};

use polars::prelude::*;
use serde::Serialize;

use super::columns::{count_column, drop_all_null_columns, f64_values, string_values};
use super::convention::{ColumnConvention, IMPRESSIONS, UNIQUES};
use super::error::{PipelineError, Result};
use super::loader::{LATITUDE, LONGITUDE};
use super::normalize::{normalize_location_id, IdRule};
use super::selector::{select_kind, RecordKind};

/// Name of the derived frequency column.
pub const FREQUENCIA: &str = "frequencia";
/// Join key column on both sides.
pub const LOCATION_ID: &str = "location_id";

/// Library-side knobs of the transform.
#[derive(Debug, Clone, Copy, Default)]
pub struct TransformOptions {
    pub id_rule: IdRule,
}

/// One site row after the join.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JoinedRecord {
    pub location_id: String,
    pub impressions: Option<f64>,
    pub uniques: Option<f64>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub frequencia: Option<f64>,
}

/// Row counts around the inner join, so silently dropped sites can be traced.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct JoinStats {
    /// Location-kind rows selected from the raw table.
    pub location_rows: usize,
    /// Rows in the site reference table.
    pub reference_rows: usize,
    /// Rows in the joined output.
    pub joined_rows: usize,
    /// Location rows whose key found no site.
    pub unmatched_rows: usize,
    /// Distinct raw identifiers of the unmatched rows.
    pub unmatched_ids: Vec<String>,
}

/// Result of `transform`.
#[derive(Debug, Clone)]
pub struct TransformOutput {
    pub convention: &'static ColumnConvention,
    pub records: Vec<JoinedRecord>,
    /// `records` as a table, with all-null columns removed.
    pub table: DataFrame,
    pub stats: JoinStats,
}

/// Frequency of one site; undefined when reach is zero or a count is missing.
pub fn frequency(impressions: Option<f64>, uniques: Option<f64>) -> Option<f64> {
    match (impressions, uniques) {
        (Some(i), Some(u)) if u != 0.0 => Some(i / u),
        _ => None,
    }
}

/// Column names of a table as owned strings.
pub fn column_names(df: &DataFrame) -> Vec<String> {
    df.get_column_names().iter().map(|s| s.to_string()).collect()
}

/// Detect the convention and check the columns the transform cannot do without.
fn detect_convention(raw: &DataFrame) -> Result<&'static ColumnConvention> {
    let names = column_names(raw);
    let convention = ColumnConvention::resolve(&names)?;

    for required in [IMPRESSIONS, UNIQUES] {
        if !names.iter().any(|n| n == required) {
            return Err(PipelineError::missing_column(required, convention.to_string()));
        }
    }

    Ok(convention)
}

/// Descending by value, nulls last, ties keep input order.
fn descending_order(values: &[Option<f64>]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..values.len()).collect();
    order.sort_by(|&a, &b| match (values[a], values[b]) {
        (Some(x), Some(y)) => y.total_cmp(&x),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });
    order
}

type SiteIndex = HashMap<String, Vec<(Option<f64>, Option<f64>)>>;

/// Index the reference table by `location_id`, keeping duplicate ids in file order.
fn index_reference(reference: &DataFrame) -> Result<SiteIndex> {
    let context = "site reference table";
    let ids = string_values(reference, LOCATION_ID, context)?;
    let latitudes = f64_values(reference, LATITUDE, context)?;
    let longitudes = f64_values(reference, LONGITUDE, context)?;

    let mut index: SiteIndex = HashMap::new();
    for ((id, lat), lon) in ids.into_iter().zip(latitudes).zip(longitudes) {
        if let Some(id) = id {
            index.entry(id).or_default().push((lat, lon));
        }
    }
    Ok(index)
}

/// Build the output table from joined records.
pub fn records_to_frame(records: &[JoinedRecord]) -> Result<DataFrame> {
    let ids: Vec<&str> = records.iter().map(|r| r.location_id.as_str()).collect();
    let impressions: Vec<Option<f64>> = records.iter().map(|r| r.impressions).collect();
    let uniques: Vec<Option<f64>> = records.iter().map(|r| r.uniques).collect();
    let latitudes: Vec<Option<f64>> = records.iter().map(|r| r.latitude).collect();
    let longitudes: Vec<Option<f64>> = records.iter().map(|r| r.longitude).collect();
    let frequencies: Vec<Option<f64>> = records.iter().map(|r| r.frequencia).collect();

    let df = DataFrame::new(vec![
        Column::new(LOCATION_ID.into(), ids),
        count_column(IMPRESSIONS, &impressions),
        count_column(UNIQUES, &uniques),
        Column::new(LATITUDE.into(), latitudes),
        Column::new(LONGITUDE.into(), longitudes),
        Column::new(FREQUENCIA.into(), frequencies),
    ])?;

    drop_all_null_columns(df)
}

/// Select location rows, sort them by impressions, normalize their ids and
/// inner-join them with the site table.
///
/// `reference` must already carry `location_id`, `latitude` and `longitude`
/// (see `prepare_reference`). Rows without a matching site are dropped and
/// counted in `JoinStats`.
pub fn transform(raw: &DataFrame, reference: &DataFrame, options: &TransformOptions) -> Result<TransformOutput> {
    let convention = detect_convention(raw)?;
    let locations = select_kind(raw, convention, RecordKind::Location)?;

    let context = convention.to_string();
    let raw_ids = string_values(&locations, convention.location_id, &context)?;
    let impressions = f64_values(&locations, IMPRESSIONS, &context)?;
    let uniques = f64_values(&locations, UNIQUES, &context)?;

    let sites = index_reference(reference)?;

    let mut records = Vec::new();
    let mut unmatched_rows = 0;
    let mut unmatched_ids = BTreeSet::new();

    for idx in descending_order(&impressions) {
        let raw_id = raw_ids[idx].as_deref();
        let key = raw_id.and_then(|id| normalize_location_id(id, options.id_rule));

        match key.as_ref().and_then(|k| sites.get(k)) {
            Some(matches) => {
                for (latitude, longitude) in matches {
                    records.push(JoinedRecord {
                        location_id: key.clone().unwrap_or_default(),
                        impressions: impressions[idx],
                        uniques: uniques[idx],
                        latitude: *latitude,
                        longitude: *longitude,
                        frequencia: frequency(impressions[idx], uniques[idx]),
                    });
                }
            }
            None => {
                unmatched_rows += 1;
                unmatched_ids.insert(raw_id.unwrap_or("<null>").to_string());
            }
        }
    }

    let stats = JoinStats {
        location_rows: locations.height(),
        reference_rows: reference.height(),
        joined_rows: records.len(),
        unmatched_rows,
        unmatched_ids: unmatched_ids.into_iter().collect(),
    };
    let table = records_to_frame(&records)?;

    Ok(TransformOutput {
        convention,
        records,
        table,
        stats,
    })
}

/// Per-day site rows with normalized ids, sorted by site then date.
///
/// Rows whose id yields no key are left out.
pub fn date_series(raw: &DataFrame, options: &TransformOptions) -> Result<DataFrame> {
    let convention = detect_convention(raw)?;
    let rows = select_kind(raw, convention, RecordKind::DateSeries)?;

    let context = convention.to_string();
    let raw_ids = string_values(&rows, convention.location_id, &context)?;
    let dates = string_values(&rows, convention.date, &context)?;
    let impressions = f64_values(&rows, IMPRESSIONS, &context)?;
    let uniques = f64_values(&rows, UNIQUES, &context)?;

    let mut entries: Vec<(String, String, Option<f64>, Option<f64>)> = raw_ids
        .iter()
        .enumerate()
        .filter_map(|(idx, raw_id)| {
            let key = raw_id
                .as_deref()
                .and_then(|id| normalize_location_id(id, options.id_rule))?;
            Some((
                key,
                dates[idx].clone().unwrap_or_default(),
                impressions[idx],
                uniques[idx],
            ))
        })
        .collect();
    entries.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.cmp(&b.1)));

    let ids: Vec<&str> = entries.iter().map(|e| e.0.as_str()).collect();
    let days: Vec<&str> = entries.iter().map(|e| e.1.as_str()).collect();
    let impressions: Vec<Option<f64>> = entries.iter().map(|e| e.2).collect();
    let uniques: Vec<Option<f64>> = entries.iter().map(|e| e.3).collect();

    Ok(DataFrame::new(vec![
        Column::new(LOCATION_ID.into(), ids),
        Column::new(convention.date.into(), days),
        count_column(IMPRESSIONS, &impressions),
        count_column(UNIQUES, &uniques),
    ])?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frequency_guards_zero_reach() {
        assert_eq!(frequency(Some(100.0), Some(20.0)), Some(5.0));
        assert_eq!(frequency(Some(100.0), Some(0.0)), None);
        assert_eq!(frequency(None, Some(3.0)), None);
    }

    #[test]
    fn test_descending_order_is_stable_with_nulls_last() {
        let values = [Some(5.0), None, Some(9.0), Some(5.0)];
        assert_eq!(descending_order(&values), vec![2, 0, 3, 1]);
    }

    #[test]
    fn test_missing_metric_column_is_reported() {
        let mut columns: Vec<Column> = crate::pipeline::CONVENTION_B
            .required_columns()
            .into_iter()
            .map(|name| Column::new(name.into(), [None::<&str>]))
            .collect();
        columns.push(Column::new(IMPRESSIONS.into(), ["10"]));
        let raw = DataFrame::new(columns).unwrap();
        let reference = df! {
            "location_id" => ["1"],
            "latitude" => [0.0f64],
            "longitude" => [0.0f64],
        }
        .unwrap();

        let err = transform(&raw, &reference, &TransformOptions::default()).unwrap_err();
        assert!(matches!(err, PipelineError::MissingColumn { column, .. } if column == "uniques"));
    }
}
