//! Closed label sets for discrepancies: severity (ordered) and category.
//!
//! The model is asked to restrict itself to these labels but nothing on the
//! wire enforces it, so both enums carry an `Other` arm that keeps unknown
//! labels verbatim. Serialising an `Other` value writes back exactly what was
//! read.
//!
//! # Severity ordering
//!
//! `Low < Medium < High < Critical`. Unknown labels rank below `Low` and
//! compare among themselves alphabetically, so sorting is total and stable.

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

/// How serious a discrepancy is for the deal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
    /// A label outside the documented scale, kept as produced.
    Other(String),
}

impl Severity {
    /// The documented scale, least severe first.
    pub const SCALE: [Severity; 4] = [
        Severity::Low,
        Severity::Medium,
        Severity::High,
        Severity::Critical,
    ];

    pub fn as_str(&self) -> &str {
        match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
            Self::Critical => "Critical",
            Self::Other(s) => s,
        }
    }

    /// Position on the scale. `Other` sits below `Low`.
    pub fn rank(&self) -> u8 {
        match self {
            Self::Other(_) => 0,
            Self::Low => 1,
            Self::Medium => 2,
            Self::High => 3,
            Self::Critical => 4,
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, Self::Other(_))
    }
}

impl From<String> for Severity {
    fn from(s: String) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Self::Low,
            "medium" => Self::Medium,
            "high" => Self::High,
            "critical" => Self::Critical,
            _ => Self::Other(s),
        }
    }
}

impl From<&str> for Severity {
    fn from(s: &str) -> Self {
        Self::from(s.to_string())
    }
}

impl From<Severity> for String {
    fn from(s: Severity) -> Self {
        match s {
            Severity::Other(raw) => raw,
            known => known.as_str().to_string(),
        }
    }
}

impl Ord for Severity {
    fn cmp(&self, other: &Self) -> Ordering {
        self.rank()
            .cmp(&other.rank())
            .then_with(|| match (self, other) {
                (Self::Other(a), Self::Other(b)) => a.cmp(b),
                _ => Ordering::Equal,
            })
    }
}

impl PartialOrd for Severity {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which part of the deal narrative a discrepancy belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Category {
    FinancialProjections,
    MarketSizing,
    RiskDisclosures,
    Operational,
    Legal,
    /// A label outside the documented set, kept as produced.
    Other(String),
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::FinancialProjections,
        Category::MarketSizing,
        Category::RiskDisclosures,
        Category::Operational,
        Category::Legal,
    ];

    pub fn as_str(&self) -> &str {
        match self {
            Self::FinancialProjections => "Financial Projections",
            Self::MarketSizing => "Market Sizing",
            Self::RiskDisclosures => "Risk Disclosures",
            Self::Operational => "Operational",
            Self::Legal => "Legal",
            Self::Other(s) => s,
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, Self::Other(_))
    }
}

impl From<String> for Category {
    fn from(s: String) -> Self {
        Category::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(s.trim()))
            .unwrap_or(Self::Other(s))
    }
}

impl From<&str> for Category {
    fn from(s: &str) -> Self {
        Self::from(s.to_string())
    }
}

impl From<Category> for String {
    fn from(c: Category) -> Self {
        match c {
            Category::Other(raw) => raw,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scale_is_ascending() {
        for pair in Severity::SCALE.windows(2) {
            assert!(pair[0] < pair[1], "{:?} should rank below {:?}", pair[0], pair[1]);
        }
    }

    #[test]
    fn unknown_severity_ranks_below_low() {
        let other = Severity::from("Catastrophic");
        assert_eq!(other, Severity::Other("Catastrophic".into()));
        assert!(other < Severity::Low);
        assert!(!other.is_known());
    }

    #[test]
    fn severity_parse_is_case_insensitive() {
        assert_eq!(Severity::from("critical"), Severity::Critical);
        assert_eq!(Severity::from(" HIGH "), Severity::High);
        assert_eq!(Severity::from("Medium"), Severity::Medium);
    }

    #[test]
    fn severity_serialises_as_label() {
        let json = serde_json::to_string(&Severity::Critical).unwrap();
        assert_eq!(json, "\"Critical\"");
        let parsed: Severity = serde_json::from_str("\"Low\"").unwrap();
        assert_eq!(parsed, Severity::Low);
    }

    #[test]
    fn unknown_labels_survive_serialisation() {
        let sev: Severity = serde_json::from_str("\"Severe-ish\"").unwrap();
        assert_eq!(serde_json::to_string(&sev).unwrap(), "\"Severe-ish\"");

        let cat: Category = serde_json::from_str("\"Tax\"").unwrap();
        assert_eq!(cat, Category::Other("Tax".into()));
        assert_eq!(serde_json::to_string(&cat).unwrap(), "\"Tax\"");
    }

    #[test]
    fn category_labels_match_documented_set() {
        assert_eq!(
            Category::from("Financial Projections"),
            Category::FinancialProjections
        );
        assert_eq!(Category::from("market sizing"), Category::MarketSizing);
        assert_eq!(Category::from("Risk Disclosures"), Category::RiskDisclosures);
        assert_eq!(Category::from("Operational"), Category::Operational);
        assert_eq!(Category::from("Legal"), Category::Legal);
        assert!(Category::ALL.iter().all(Category::is_known));
    }

    #[test]
    fn other_severities_sort_alphabetically() {
        let mut v = vec![
            Severity::from("zeta"),
            Severity::High,
            Severity::from("alpha"),
            Severity::Low,
        ];
        v.sort();
        assert_eq!(
            v,
            vec![
                Severity::Other("alpha".into()),
                Severity::Other("zeta".into()),
                Severity::Low,
                Severity::High,
            ]
        );
    }
}
