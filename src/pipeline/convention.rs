//! Column naming conventions
//!
//! Impression exports come in two flavours that name the same demographic
//! columns differently. The convention is detected once per table and every
//! later column access goes through it.

use std::fmt;

use super::error::{PipelineError, Result};

/// Column holding the impression (impact) count.
pub const IMPRESSIONS: &str = "impressions";
/// Column holding the distinct-reach count.
pub const UNIQUES: &str = "uniques";

/// The nine columns whose nullability decides what a raw row describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ControlColumn {
    LocationId,
    SocialClass,
    Gender,
    Country,
    Date,
    Age,
    ImpressionHour,
    NumTotalImpressions,
    Residence,
}

impl ControlColumn {
    pub const ALL: [ControlColumn; 9] = [
        ControlColumn::SocialClass,
        ControlColumn::LocationId,
        ControlColumn::Gender,
        ControlColumn::Country,
        ControlColumn::Date,
        ControlColumn::Age,
        ControlColumn::ImpressionHour,
        ControlColumn::NumTotalImpressions,
        ControlColumn::Residence,
    ];
}

/// Mapping from logical control columns to the physical names of one export flavour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnConvention {
    pub name: &'static str,
    pub social_class: &'static str,
    pub location_id: &'static str,
    pub gender: &'static str,
    pub country: &'static str,
    pub date: &'static str,
    pub age: &'static str,
    pub impression_hour: &'static str,
    pub num_total_impressions: &'static str,
    pub residence: &'static str,
}

/// `class` / `gender_group` / `country` / `age_group` / `home`
pub const CONVENTION_A: ColumnConvention = ColumnConvention {
    name: "A",
    social_class: "class",
    location_id: "location_id",
    gender: "gender_group",
    country: "country",
    date: "date",
    age: "age_group",
    impression_hour: "impression_hour",
    num_total_impressions: "num_total_impressions",
    residence: "home",
};

/// `social_class` / `gender` / `nationality` / `age` / `residence_name`
pub const CONVENTION_B: ColumnConvention = ColumnConvention {
    name: "B",
    social_class: "social_class",
    location_id: "location_id",
    gender: "gender",
    country: "nationality",
    date: "date",
    age: "age",
    impression_hour: "impression_hour",
    num_total_impressions: "num_total_impressions",
    residence: "residence_name",
};

impl ColumnConvention {
    /// Pick the convention for a set of column names.
    ///
    /// Convention A wins only when all nine of its columns are present;
    /// anything else falls back to convention B without further checks.
    pub fn detect<S: AsRef<str>>(columns: &[S]) -> &'static ColumnConvention {
        if CONVENTION_A.missing_columns(columns).is_empty() {
            &CONVENTION_A
        } else {
            &CONVENTION_B
        }
    }

    /// Pick the convention and require all nine of its control columns.
    ///
    /// A table that completes neither convention fails with `MissingColumn`
    /// naming the first convention B column it lacks.
    pub fn resolve<S: AsRef<str>>(columns: &[S]) -> Result<&'static ColumnConvention> {
        let convention = Self::detect(columns);
        let missing = convention.missing_columns(columns);

        match missing.first() {
            None => Ok(convention),
            Some(first) => Err(PipelineError::missing_column(
                first,
                format!(
                    "neither convention A nor B is complete; missing {}",
                    missing.join(", ")
                ),
            )),
        }
    }

    /// Physical column name for a logical control column.
    pub fn column(&self, control: ControlColumn) -> &'static str {
        match control {
            ControlColumn::LocationId => self.location_id,
            ControlColumn::SocialClass => self.social_class,
            ControlColumn::Gender => self.gender,
            ControlColumn::Country => self.country,
            ControlColumn::Date => self.date,
            ControlColumn::Age => self.age,
            ControlColumn::ImpressionHour => self.impression_hour,
            ControlColumn::NumTotalImpressions => self.num_total_impressions,
            ControlColumn::Residence => self.residence,
        }
    }

    /// The nine physical column names this convention requires.
    pub fn required_columns(&self) -> [&'static str; 9] {
        ControlColumn::ALL.map(|c| self.column(c))
    }

    /// Required columns absent from `columns`, in declaration order.
    pub fn missing_columns<S: AsRef<str>>(&self, columns: &[S]) -> Vec<&'static str> {
        self.required_columns()
            .into_iter()
            .filter(|required| !columns.iter().any(|c| c.as_ref() == *required))
            .collect()
    }
}

impl fmt::Display for ColumnConvention {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "convention {} ({}, {}, {}, {}, {})",
            self.name, self.social_class, self.gender, self.country, self.age, self.residence
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_convention_a() {
        let cols = CONVENTION_A.required_columns();
        assert_eq!(ColumnConvention::detect(&cols), &CONVENTION_A);
    }

    #[test]
    fn test_detect_falls_back_when_any_a_column_missing() {
        for skip in 0..9 {
            let cols: Vec<&str> = CONVENTION_A
                .required_columns()
                .into_iter()
                .enumerate()
                .filter(|(i, _)| *i != skip)
                .map(|(_, c)| c)
                .collect();
            assert_eq!(ColumnConvention::detect(&cols), &CONVENTION_B);
        }
    }

    #[test]
    fn test_resolve_rejects_incomplete_tables() {
        let cols: Vec<&str> = CONVENTION_A
            .required_columns()
            .into_iter()
            .filter(|c| *c != "home")
            .collect();
        let err = ColumnConvention::resolve(&cols).unwrap_err();
        assert!(matches!(err, PipelineError::MissingColumn { ref column, .. } if column == "social_class"));

        let cols = CONVENTION_B.required_columns();
        assert_eq!(ColumnConvention::resolve(&cols).unwrap(), &CONVENTION_B);
    }

    #[test]
    fn test_column_lookup_b() {
        assert_eq!(CONVENTION_B.column(ControlColumn::Residence), "residence_name");
        assert_eq!(CONVENTION_B.column(ControlColumn::Country), "nationality");
    }
}
