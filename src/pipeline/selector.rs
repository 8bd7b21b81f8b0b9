//! Row selection by column nullability
//!
//! A raw export mixes several record kinds in one wide table; which kind a row
//! is follows only from which control columns are null. Each kind is a
//! `NullPattern` over the nine control columns and one generic evaluator turns
//! a pattern into a boolean mask.

use std::fmt;

use polars::prelude::*;

use super::convention::{ColumnConvention, ControlColumn};
use super::error::Result;

/// The record kinds encoded in a raw impressions table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordKind {
    /// One row per tracked site, aggregated over the whole period.
    Location,
    /// One row per social-class bucket.
    ClassBreakdown,
    /// One row per (gender, age bucket) pair.
    GenderAgeBreakdown,
    /// Grand totals: every control column null.
    Totals,
    /// One row per (site, day).
    DateSeries,
}

impl RecordKind {
    pub const ALL: [RecordKind; 5] = [
        RecordKind::Location,
        RecordKind::ClassBreakdown,
        RecordKind::GenderAgeBreakdown,
        RecordKind::Totals,
        RecordKind::DateSeries,
    ];

    /// Control columns that must be non-null; all others must be null.
    fn present_columns(self) -> &'static [ControlColumn] {
        match self {
            RecordKind::Location => &[ControlColumn::LocationId],
            RecordKind::ClassBreakdown => &[ControlColumn::SocialClass],
            RecordKind::GenderAgeBreakdown => &[ControlColumn::Gender, ControlColumn::Age],
            RecordKind::Totals => &[],
            RecordKind::DateSeries => &[ControlColumn::LocationId, ControlColumn::Date],
        }
    }

    /// Null / non-null requirements for this kind.
    pub fn pattern(self) -> NullPattern {
        let present = self.present_columns();
        NullPattern {
            non_null: present.to_vec(),
            null: ControlColumn::ALL
                .into_iter()
                .filter(|c| !present.contains(c))
                .collect(),
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RecordKind::Location => "location",
            RecordKind::ClassBreakdown => "class breakdown",
            RecordKind::GenderAgeBreakdown => "gender/age breakdown",
            RecordKind::Totals => "totals",
            RecordKind::DateSeries => "date series",
        };
        write!(f, "{}", name)
    }
}

/// Which logical columns must be null and which must be present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NullPattern {
    pub null: Vec<ControlColumn>,
    pub non_null: Vec<ControlColumn>,
}

impl NullPattern {
    /// Resolve to physical column names through a convention.
    pub fn resolve(&self, convention: &ColumnConvention) -> (Vec<&'static str>, Vec<&'static str>) {
        (
            self.null.iter().map(|c| convention.column(*c)).collect(),
            self.non_null.iter().map(|c| convention.column(*c)).collect(),
        )
    }
}

/// Build the row mask for a set of null / non-null requirements.
///
/// A requirement on a column that does not exist can never hold, so the mask
/// is all-false in that case.
pub fn null_pattern_mask(df: &DataFrame, null_columns: &[&str], non_null_columns: &[&str]) -> BooleanChunked {
    let height = df.height();
    let mut mask = BooleanChunked::full("mask".into(), true, height);

    for name in null_columns {
        match df.column(name) {
            Ok(column) => mask = &mask & &column.is_null(),
            Err(_) => return BooleanChunked::full("mask".into(), false, height),
        }
    }
    for name in non_null_columns {
        match df.column(name) {
            Ok(column) => mask = &mask & &column.is_not_null(),
            Err(_) => return BooleanChunked::full("mask".into(), false, height),
        }
    }

    mask
}

/// Rows satisfying the given null / non-null requirements, in original order.
pub fn select_rows(df: &DataFrame, null_columns: &[&str], non_null_columns: &[&str]) -> Result<DataFrame> {
    let mask = null_pattern_mask(df, null_columns, non_null_columns);
    Ok(df.filter(&mask)?)
}

/// Mask of the rows belonging to `kind` under `convention`.
pub fn kind_mask(df: &DataFrame, convention: &ColumnConvention, kind: RecordKind) -> BooleanChunked {
    let (null, non_null) = kind.pattern().resolve(convention);
    null_pattern_mask(df, &null, &non_null)
}

/// Rows belonging to `kind` under `convention`.
pub fn select_kind(df: &DataFrame, convention: &ColumnConvention, kind: RecordKind) -> Result<DataFrame> {
    let (null, non_null) = kind.pattern().resolve(convention);
    select_rows(df, &null, &non_null)
}

/// Tag every raw row with its record kind, `None` for rows of no known kind.
pub fn classify_rows(df: &DataFrame, convention: &ColumnConvention) -> Vec<Option<RecordKind>> {
    let mut kinds = vec![None; df.height()];

    for kind in RecordKind::ALL {
        let mask = kind_mask(df, convention, kind);
        for (idx, hit) in (&mask).into_iter().enumerate() {
            if hit == Some(true) && kinds[idx].is_none() {
                kinds[idx] = Some(kind);
            }
        }
    }

    kinds
}

/// Number of rows per record kind, plus the count of unclassified rows.
pub fn count_kinds(kinds: &[Option<RecordKind>]) -> (Vec<(RecordKind, usize)>, usize) {
    let counts = RecordKind::ALL
        .into_iter()
        .map(|kind| (kind, kinds.iter().filter(|k| **k == Some(kind)).count()))
        .collect();
    let unclassified = kinds.iter().filter(|k| k.is_none()).count();
    (counts, unclassified)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::convention::CONVENTION_A;

    #[test]
    fn test_patterns_cover_all_control_columns() {
        for kind in RecordKind::ALL {
            let pattern = kind.pattern();
            assert_eq!(pattern.null.len() + pattern.non_null.len(), 9, "{}", kind);
        }
    }

    #[test]
    fn test_missing_column_makes_pattern_unsatisfiable() {
        let df = df! {
            "location_id" => [Some("A1"), None],
        }
        .unwrap();

        let mask = null_pattern_mask(&df, &["class"], &["location_id"]);
        assert_eq!(mask.sum(), Some(0));

        let selected = select_kind(&df, &CONVENTION_A, RecordKind::Location).unwrap();
        assert_eq!(selected.height(), 0);
    }

    #[test]
    fn test_count_kinds() {
        let kinds = vec![Some(RecordKind::Totals), None, Some(RecordKind::Totals)];
        let (counts, unclassified) = count_kinds(&kinds);
        assert_eq!(unclassified, 1);
        assert!(counts.contains(&(RecordKind::Totals, 2)));
        assert!(counts.contains(&(RecordKind::Location, 0)));
    }
}
