use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// How a sampling budget is spread across the documents in scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CoverageMode {
    /// Same quota for every document, favouring diversity.
    EqualPerDocument,
    /// Quotas proportional to each document's chunk count.
    ProportionalToSize,
    /// Semantic similarity to a query. Declared but not supported.
    Focused,
}

impl fmt::Display for CoverageMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CoverageMode::EqualPerDocument => write!(f, "EQUAL_PER_DOCUMENT"),
            CoverageMode::ProportionalToSize => write!(f, "PROPORTIONAL_TO_SIZE"),
            CoverageMode::Focused => write!(f, "FOCUSED"),
        }
    }
}

impl FromStr for CoverageMode {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().replace('-', "_").as_str() {
            "EQUAL_PER_DOCUMENT" | "EQUAL" => Ok(CoverageMode::EqualPerDocument),
            "PROPORTIONAL_TO_SIZE" | "PROPORTIONAL" => Ok(CoverageMode::ProportionalToSize),
            "FOCUSED" => Ok(CoverageMode::Focused),
            _ => Err(CoreError::UnknownCoverageMode(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_names_and_aliases() {
        assert_eq!(
            "equal-per-document".parse::<CoverageMode>().unwrap(),
            CoverageMode::EqualPerDocument
        );
        assert_eq!(
            "PROPORTIONAL".parse::<CoverageMode>().unwrap(),
            CoverageMode::ProportionalToSize
        );
        assert_eq!("focused".parse::<CoverageMode>().unwrap(), CoverageMode::Focused);
        assert!("nearest".parse::<CoverageMode>().is_err());
    }

    #[test]
    fn display_round_trips_through_serde_name() {
        for mode in [
            CoverageMode::EqualPerDocument,
            CoverageMode::ProportionalToSize,
            CoverageMode::Focused,
        ] {
            let json = serde_json::to_string(&mode).unwrap();
            assert_eq!(json, format!("\"{mode}\""));
            assert_eq!(mode.to_string().parse::<CoverageMode>().unwrap(), mode);
        }
    }
}
