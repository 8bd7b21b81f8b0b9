//! Target composition and reach-in-target estimates
//!
//! The composition multiplies the marginal class, gender and age shares of the
//! selected categories. This treats the three dimensions as independent within
//! the audience; it is an approximation, not a joint distribution.

use serde::Serialize;

use super::aggregate::{Breakdown, Dimension, ReachBreakdowns};
use super::error::{PipelineError, Result};

/// Categories chosen by the user in each dimension, by code or label.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TargetSelection {
    pub social_classes: Vec<String>,
    pub genders: Vec<String>,
    pub ages: Vec<String>,
}

impl TargetSelection {
    pub fn get(&self, dimension: Dimension) -> &[String] {
        match dimension {
            Dimension::SocialClass => &self.social_classes,
            Dimension::Gender => &self.genders,
            Dimension::Age => &self.ages,
        }
    }
}

/// Composition of a target and its projection onto total reach and impacts.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Composition {
    /// Summed percentage of the selected classes.
    pub class_share: f64,
    /// Summed percentage of the selected genders.
    pub gender_share: f64,
    /// Summed percentage of the selected age buckets.
    pub age_share: f64,
    /// Estimated percentage of total reach inside the target.
    pub composition: f64,
    pub reach_in_target: f64,
    pub impacts_in_target: f64,
}

/// class% × gender% × age% / 10000, in percent.
pub fn composition_percentage(class_share: f64, gender_share: f64, age_share: f64) -> f64 {
    class_share * gender_share * age_share / 10_000.0
}

/// Sum of the percentages of the selected categories.
///
/// An empty selection contributes zero. A key matching no category is an error.
pub fn selected_share(breakdown: &Breakdown, selected: &[String]) -> Result<f64> {
    let mut total = 0.0;
    for key in selected {
        let share = breakdown
            .share(key)
            .ok_or_else(|| PipelineError::UnknownCategory {
                dimension: breakdown.dimension.to_string(),
                value: key.clone(),
                available: breakdown.labels().join(", "),
            })?;
        total += share.percentage;
    }
    Ok(total)
}

/// Composition of `selection` against the breakdowns and their totals.
pub fn compose(breakdowns: &ReachBreakdowns, selection: &TargetSelection) -> Result<Composition> {
    let class_share = selected_share(&breakdowns.social_class, &selection.social_classes)?;
    let gender_share = selected_share(&breakdowns.gender, &selection.genders)?;
    let age_share = selected_share(&breakdowns.age, &selection.ages)?;

    let composition = composition_percentage(class_share, gender_share, age_share);

    Ok(Composition {
        class_share,
        gender_share,
        age_share,
        composition,
        reach_in_target: composition / 100.0 * breakdowns.totals.reach,
        impacts_in_target: composition / 100.0 * breakdowns.totals.impacts,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::aggregate::{CategoryShare, ReachTotals};

    fn breakdown(dimension: Dimension, entries: &[(&str, &str, f64)]) -> Breakdown {
        Breakdown {
            dimension,
            shares: entries
                .iter()
                .map(|(category, label, percentage)| CategoryShare {
                    category: category.to_string(),
                    label: label.to_string(),
                    uniques: 0.0,
                    percentage: *percentage,
                })
                .collect(),
        }
    }

    fn sample() -> ReachBreakdowns {
        ReachBreakdowns {
            totals: ReachTotals {
                reach: 1000.0,
                impacts: 5000.0,
            },
            social_class: breakdown(Dimension::SocialClass, &[("A", "A", 20.0), ("B", "B", 30.0)]),
            gender: breakdown(Dimension::Gender, &[("F", "Feminino", 60.0), ("M", "Masculino", 40.0)]),
            age: breakdown(Dimension::Age, &[("20", "20-29", 25.0), ("30", "30-39", 15.0)]),
        }
    }

    #[test]
    fn test_composition_formula() {
        assert!((composition_percentage(50.0, 60.0, 40.0) - 12.0).abs() < 1e-9);
    }

    #[test]
    fn test_compose_by_code_and_label() {
        let selection = TargetSelection {
            social_classes: vec!["A".into(), "B".into()],
            genders: vec!["Feminino".into()],
            ages: vec!["20".into(), "30-39".into()],
        };
        let result = compose(&sample(), &selection).unwrap();

        assert!((result.composition - 12.0).abs() < 1e-9);
        assert!((result.reach_in_target - 120.0).abs() < 1e-9);
        assert!((result.impacts_in_target - 600.0).abs() < 1e-9);
    }

    #[test]
    fn test_empty_dimension_gives_zero() {
        let selection = TargetSelection {
            social_classes: vec!["A".into()],
            genders: vec![],
            ages: vec!["20".into()],
        };
        let result = compose(&sample(), &selection).unwrap();
        assert_eq!(result.composition, 0.0);
        assert_eq!(result.reach_in_target, 0.0);
    }

    #[test]
    fn test_unknown_category_is_reported() {
        let selection = TargetSelection {
            social_classes: vec!["Z".into()],
            ..Default::default()
        };
        let err = compose(&sample(), &selection).unwrap_err();
        assert!(err.to_string().contains("'Z'"));
    }
}
