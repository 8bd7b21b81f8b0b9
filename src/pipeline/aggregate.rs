//! Percentage-of-total reach breakdowns by social class, gender and age
//!
//! Breakdowns are computed from the raw table, never from the joined site
//! table: the breakdown rows and the totals row are separate record kinds.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

use polars::prelude::*;
use serde::Serialize;

use super::columns::{f64_values, string_values};
use super::convention::{ColumnConvention, IMPRESSIONS, UNIQUES};
use super::error::{PipelineError, Result};
use super::selector::{select_kind, RecordKind};
use super::transform::column_names;

/// Display labels for age bucket codes.
const AGE_LABELS: [(i64, &str); 7] = [
    (20, "20-29"),
    (30, "30-39"),
    (40, "40-49"),
    (50, "50-59"),
    (60, "60-69"),
    (70, "70-79"),
    (80, "80+"),
];

/// Display labels for gender codes.
const GENDER_LABELS: [(&str, &str); 2] = [("F", "Feminino"), ("M", "Masculino")];

/// A demographic dimension with a reach breakdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    SocialClass,
    Gender,
    Age,
}

impl Dimension {
    pub const ALL: [Dimension; 3] = [Dimension::SocialClass, Dimension::Gender, Dimension::Age];

    /// Record kind carrying this dimension's breakdown rows.
    pub fn record_kind(self) -> RecordKind {
        match self {
            Dimension::SocialClass => RecordKind::ClassBreakdown,
            Dimension::Gender | Dimension::Age => RecordKind::GenderAgeBreakdown,
        }
    }

    /// Physical category column under a convention.
    pub fn column(self, convention: &ColumnConvention) -> &'static str {
        match self {
            Dimension::SocialClass => convention.social_class,
            Dimension::Gender => convention.gender,
            Dimension::Age => convention.age,
        }
    }

    /// Human-readable label for a raw category code.
    pub fn label(self, code: &str) -> String {
        match self {
            Dimension::SocialClass => code.to_string(),
            Dimension::Gender => gender_label(code),
            Dimension::Age => age_label(code),
        }
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dimension::SocialClass => write!(f, "class"),
            Dimension::Gender => write!(f, "gender"),
            Dimension::Age => write!(f, "age"),
        }
    }
}

fn integral_code(code: &str) -> Option<i64> {
    let value: f64 = code.trim().parse().ok()?;
    (value.fract() == 0.0).then_some(value as i64)
}

/// "20" → "20-29", ..., "80" → "80+"; other codes pass through.
pub fn age_label(code: &str) -> String {
    integral_code(code)
        .and_then(|n| AGE_LABELS.iter().find(|(k, _)| *k == n))
        .map(|(_, label)| label.to_string())
        .unwrap_or_else(|| code.to_string())
}

/// "F" → "Feminino", "M" → "Masculino"; other codes pass through.
pub fn gender_label(code: &str) -> String {
    GENDER_LABELS
        .iter()
        .find(|(k, _)| *k == code)
        .map(|(_, label)| label.to_string())
        .unwrap_or_else(|| code.to_string())
}

/// Grand totals from the totals-kind rows.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ReachTotals {
    /// Sum of `uniques`.
    pub reach: f64,
    /// Sum of `impressions`.
    pub impacts: f64,
}

/// Reach attributed to one category value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryShare {
    pub category: String,
    pub label: String,
    pub uniques: f64,
    pub percentage: f64,
}

/// Reach breakdown of one dimension, ordered by category code.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Breakdown {
    pub dimension: Dimension,
    pub shares: Vec<CategoryShare>,
}

impl Breakdown {
    /// Look up a category by raw code or by display label.
    pub fn share(&self, key: &str) -> Option<&CategoryShare> {
        self.shares
            .iter()
            .find(|s| s.category == key || s.label == key)
    }

    /// Label → percentage map for display.
    pub fn percentages(&self) -> BTreeMap<String, f64> {
        self.shares
            .iter()
            .map(|s| (s.label.clone(), s.percentage))
            .collect()
    }

    pub fn labels(&self) -> Vec<String> {
        self.shares.iter().map(|s| s.label.clone()).collect()
    }
}

/// All three breakdowns plus the totals they are relative to.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReachBreakdowns {
    pub totals: ReachTotals,
    pub social_class: Breakdown,
    pub gender: Breakdown,
    pub age: Breakdown,
}

impl ReachBreakdowns {
    pub fn get(&self, dimension: Dimension) -> &Breakdown {
        match dimension {
            Dimension::SocialClass => &self.social_class,
            Dimension::Gender => &self.gender,
            Dimension::Age => &self.age,
        }
    }
}

fn sum_present(values: &[Option<f64>]) -> f64 {
    values.iter().flatten().sum()
}

/// Sum `uniques` and `impressions` over the totals rows.
///
/// Fails with `NoReachData` when the reach sum is zero, including when the
/// table has no totals row at all.
pub fn reach_totals(raw: &DataFrame, convention: &ColumnConvention) -> Result<ReachTotals> {
    let totals = select_kind(raw, convention, RecordKind::Totals)?;
    let context = convention.to_string();

    let reach = sum_present(&f64_values(&totals, UNIQUES, &context)?);
    let impacts = sum_present(&f64_values(&totals, IMPRESSIONS, &context)?);

    if reach == 0.0 {
        return Err(PipelineError::NoReachData);
    }

    Ok(ReachTotals { reach, impacts })
}

/// Numeric codes first in numeric order, then text codes alphabetically.
fn compare_codes(a: &str, b: &str) -> Ordering {
    match (a.trim().parse::<f64>().ok(), b.trim().parse::<f64>().ok()) {
        (Some(x), Some(y)) => x.total_cmp(&y).then_with(|| a.cmp(b)),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.cmp(b),
    }
}

/// Sum of `uniques` per category value of `column` over `rows`.
pub fn category_uniques(rows: &DataFrame, column: &str, context: &str) -> Result<Vec<(String, f64)>> {
    let categories = string_values(rows, column, context)?;
    let uniques = f64_values(rows, UNIQUES, context)?;

    let mut sums: BTreeMap<String, f64> = BTreeMap::new();
    for (category, value) in categories.into_iter().zip(uniques) {
        if let Some(category) = category {
            *sums.entry(category).or_insert(0.0) += value.unwrap_or(0.0);
        }
    }

    let mut sums: Vec<(String, f64)> = sums.into_iter().collect();
    sums.sort_by(|a, b| compare_codes(&a.0, &b.0));
    Ok(sums)
}

/// Breakdown of one dimension relative to `total_reach`.
pub fn dimension_breakdown(
    raw: &DataFrame,
    convention: &ColumnConvention,
    dimension: Dimension,
    total_reach: f64,
) -> Result<Breakdown> {
    if total_reach == 0.0 {
        return Err(PipelineError::NoReachData);
    }

    let rows = select_kind(raw, convention, dimension.record_kind())?;
    if rows.height() == 0 {
        return Ok(Breakdown {
            dimension,
            shares: Vec::new(),
        });
    }

    let shares = category_uniques(&rows, dimension.column(convention), &convention.to_string())?
        .into_iter()
        .map(|(category, uniques)| CategoryShare {
            label: dimension.label(&category),
            percentage: uniques / total_reach * 100.0,
            category,
            uniques,
        })
        .collect();

    Ok(Breakdown { dimension, shares })
}

/// Compute the class, gender and age breakdowns of a raw table.
pub fn aggregate(raw: &DataFrame) -> Result<ReachBreakdowns> {
    let names = column_names(raw);
    let convention = ColumnConvention::resolve(&names)?;
    let totals = reach_totals(raw, convention)?;

    Ok(ReachBreakdowns {
        totals,
        social_class: dimension_breakdown(raw, convention, Dimension::SocialClass, totals.reach)?,
        gender: dimension_breakdown(raw, convention, Dimension::Gender, totals.reach)?,
        age: dimension_breakdown(raw, convention, Dimension::Age, totals.reach)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_age_labels() {
        assert_eq!(age_label("20"), "20-29");
        assert_eq!(age_label("80.0"), "80+");
        assert_eq!(age_label("15"), "15");
        assert_eq!(age_label("unknown"), "unknown");
    }

    #[test]
    fn test_gender_labels() {
        assert_eq!(gender_label("F"), "Feminino");
        assert_eq!(gender_label("M"), "Masculino");
        assert_eq!(gender_label("X"), "X");
    }

    #[test]
    fn test_category_codes_sort_numerically() {
        let rows = df! {
            "age" => ["80", "20", "100"],
            "uniques" => ["1", "2", "3"],
        }
        .unwrap();
        let sums = category_uniques(&rows, "age", "test").unwrap();
        let codes: Vec<&str> = sums.iter().map(|(c, _)| c.as_str()).collect();
        assert_eq!(codes, vec!["20", "80", "100"]);
    }

    #[test]
    fn test_zero_reach_is_rejected() {
        let rows = df! { "class" => ["A"], "uniques" => ["1"] }.unwrap();
        let err = dimension_breakdown(&rows, &crate::pipeline::CONVENTION_A, Dimension::SocialClass, 0.0)
            .unwrap_err();
        assert!(matches!(err, PipelineError::NoReachData));
    }
}
