//! Location identifier normalization
//!
//! Raw exports carry site codes with prefixes and suffixes around the numeric
//! site id ("LOC00123"). The join key is the numeric part; two extraction rules
//! are supported because exports disagree on the canonical form.

use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use polars::prelude::*;
use regex::Regex;

use super::error::Result;

/// Length of a canonical site code under `IdRule::FiveDigitSite`.
pub const SITE_CODE_LEN: usize = 5;

fn digit_runs() -> &'static Regex {
    static DIGITS: OnceLock<Regex> = OnceLock::new();
    DIGITS.get_or_init(|| Regex::new(r"[0-9]+").expect("digit pattern is valid"))
}

/// How the join key is extracted from a raw `location_id`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IdRule {
    /// First contiguous run of digits; no digits gives no key.
    #[default]
    FirstDigitRun,
    /// All digit runs concatenated, accepted only at exactly five digits;
    /// otherwise the raw value is kept as is.
    FiveDigitSite,
}

impl fmt::Display for IdRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IdRule::FirstDigitRun => write!(f, "first-run"),
            IdRule::FiveDigitSite => write!(f, "five-digit"),
        }
    }
}

impl FromStr for IdRule {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "first-run" | "first" => Ok(IdRule::FirstDigitRun),
            "five-digit" | "five" => Ok(IdRule::FiveDigitSite),
            other => Err(format!(
                "Unknown id rule '{}'. Use 'first-run' or 'five-digit'",
                other
            )),
        }
    }
}

/// Extract the join key from one raw identifier.
pub fn normalize_location_id(raw: &str, rule: IdRule) -> Option<String> {
    match rule {
        IdRule::FirstDigitRun => digit_runs().find(raw).map(|m| m.as_str().to_string()),
        IdRule::FiveDigitSite => {
            let digits: String = digit_runs().find_iter(raw).map(|m| m.as_str()).collect();
            if digits.len() == SITE_CODE_LEN {
                Some(digits)
            } else {
                Some(raw.to_string())
            }
        }
    }
}

/// Normalize a whole identifier column, coercing it to text first.
pub fn normalize_id_column(column: &Column, rule: IdRule) -> Result<Column> {
    let text = column.cast(&DataType::String)?;
    let normalized: StringChunked = text
        .str()?
        .into_iter()
        .map(|value| value.and_then(|raw| normalize_location_id(raw, rule)))
        .collect();

    Ok(normalized.with_name(column.name().clone()).into_column())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_run_strips_prefix() {
        assert_eq!(
            normalize_location_id("LOC00123", IdRule::FirstDigitRun),
            Some("00123".to_string())
        );
    }

    #[test]
    fn test_first_run_takes_first_match_only() {
        assert_eq!(
            normalize_location_id("SP-123-X45", IdRule::FirstDigitRun),
            Some("123".to_string())
        );
    }

    #[test]
    fn test_first_run_without_digits_is_none() {
        assert_eq!(normalize_location_id("ABC", IdRule::FirstDigitRun), None);
    }

    #[test]
    fn test_five_digit_concatenates_runs() {
        assert_eq!(
            normalize_location_id("SP-123-X45", IdRule::FiveDigitSite),
            Some("12345".to_string())
        );
    }

    #[test]
    fn test_five_digit_passes_through_other_lengths() {
        assert_eq!(
            normalize_location_id("LOC-1234", IdRule::FiveDigitSite),
            Some("LOC-1234".to_string())
        );
        assert_eq!(
            normalize_location_id("ABC", IdRule::FiveDigitSite),
            Some("ABC".to_string())
        );
    }

    #[test]
    fn test_id_rule_parsing() {
        assert_eq!("first-run".parse::<IdRule>().unwrap(), IdRule::FirstDigitRun);
        assert_eq!("FIVE-DIGIT".parse::<IdRule>().unwrap(), IdRule::FiveDigitSite);
        assert!("longest".parse::<IdRule>().is_err());
    }

    #[test]
    fn test_normalize_numeric_column() {
        let column = Column::new("location_id".into(), [Some(123i64), None, Some(45678)]);
        let normalized = normalize_id_column(&column, IdRule::FirstDigitRun).unwrap();
        let values: Vec<Option<&str>> = normalized.str().unwrap().into_iter().collect();
        assert_eq!(values, vec![Some("123"), None, Some("45678")]);
        assert_eq!(normalized.name().as_str(), "location_id");
    }
}
