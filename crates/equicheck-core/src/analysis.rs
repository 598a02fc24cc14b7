//! The analysis record produced by one buy-side vs sell-side comparison.
//!
//! JSON field names are camelCase. The same shape is used for the model's
//! output (minus the locally synthesised fields), local storage, and the
//! remote document store.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

use crate::severity::{Category, Severity};

/// Inclusive bounds for `riskScore` and `agreementScore`.
pub const SCORE_RANGE: std::ops::RangeInclusive<i64> = 0..=100;

/// One identified mismatch between the buy-side and sell-side documents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Discrepancy {
    pub category: Category,
    pub topic: String,
    pub buy_side_claim: String,
    pub sell_side_claim: String,
    pub severity: Severity,
    pub reasoning: String,
}

/// The fields the model produces. Everything in [`AnalysisResult`] except the
/// identifier, timestamp, and file names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisFindings {
    pub executive_summary: String,
    #[serde(deserialize_with = "rounded_score")]
    pub risk_score: i64,
    #[serde(deserialize_with = "rounded_score")]
    pub agreement_score: i64,
    pub strategic_alignment: String,
    pub key_risks: Vec<String>,
    pub discrepancies: Vec<Discrepancy>,
}

/// The complete structured output of one document comparison.
///
/// Created whole and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub id: String,
    /// Milliseconds since the Unix epoch.
    pub timestamp: i64,
    pub buy_side_file_name: String,
    pub sell_side_file_name: String,
    pub executive_summary: String,
    #[serde(deserialize_with = "rounded_score")]
    pub risk_score: i64,
    #[serde(deserialize_with = "rounded_score")]
    pub agreement_score: i64,
    pub strategic_alignment: String,
    pub key_risks: Vec<String>,
    pub discrepancies: Vec<Discrepancy>,
}

/// A non-fatal breach of the output contract.
///
/// Results are accepted as produced; violations are reported so callers can
/// log or flag them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContractViolation {
    ScoreOutOfRange { field: &'static str, value: i64 },
    UnknownCategory { index: usize, label: String },
    UnknownSeverity { index: usize, label: String },
}

impl fmt::Display for ContractViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ScoreOutOfRange { field, value } => {
                write!(f, "{field} = {value} is outside 0..=100")
            }
            Self::UnknownCategory { index, label } => {
                write!(f, "discrepancy {index}: unknown category {label:?}")
            }
            Self::UnknownSeverity { index, label } => {
                write!(f, "discrepancy {index}: unknown severity {label:?}")
            }
        }
    }
}

impl AnalysisResult {
    /// Assemble a result from model findings plus locally synthesised fields.
    pub fn assemble(
        id: String,
        timestamp: i64,
        buy_side_file_name: &str,
        sell_side_file_name: &str,
        findings: AnalysisFindings,
    ) -> Self {
        Self {
            id,
            timestamp,
            buy_side_file_name: buy_side_file_name.to_string(),
            sell_side_file_name: sell_side_file_name.to_string(),
            executive_summary: findings.executive_summary,
            risk_score: findings.risk_score,
            agreement_score: findings.agreement_score,
            strategic_alignment: findings.strategic_alignment,
            key_risks: findings.key_risks,
            discrepancies: findings.discrepancies,
        }
    }

    /// First 8 characters of the id, used in report file names.
    pub fn short_id(&self) -> &str {
        match self.id.char_indices().nth(8) {
            Some((end, _)) => &self.id[..end],
            None => &self.id,
        }
    }

    /// Discrepancy count per severity label, most severe first.
    pub fn severity_counts(&self) -> Vec<(Severity, usize)> {
        let mut counts: BTreeMap<Severity, usize> = BTreeMap::new();
        for d in &self.discrepancies {
            *counts.entry(d.severity.clone()).or_default() += 1;
        }
        counts.into_iter().rev().collect()
    }

    /// Discrepancies ordered most severe first; stable within a severity.
    pub fn discrepancies_by_severity(&self) -> Vec<&Discrepancy> {
        let mut sorted: Vec<&Discrepancy> = self.discrepancies.iter().collect();
        sorted.sort_by(|a, b| b.severity.cmp(&a.severity));
        sorted
    }

    /// Check the documented constraints the parser does not enforce.
    pub fn contract_violations(&self) -> Vec<ContractViolation> {
        let mut out = Vec::new();
        for (field, value) in [
            ("riskScore", self.risk_score),
            ("agreementScore", self.agreement_score),
        ] {
            if !SCORE_RANGE.contains(&value) {
                out.push(ContractViolation::ScoreOutOfRange { field, value });
            }
        }
        for (index, d) in self.discrepancies.iter().enumerate() {
            if let Category::Other(label) = &d.category {
                out.push(ContractViolation::UnknownCategory {
                    index,
                    label: label.clone(),
                });
            }
            if let Severity::Other(label) = &d.severity {
                out.push(ContractViolation::UnknownSeverity {
                    index,
                    label: label.clone(),
                });
            }
        }
        out
    }
}

/// Accept any JSON number for a score and round it to the nearest integer.
///
/// The schema declares scores as `NUMBER`, so the model may emit `72.5`.
fn rounded_score<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = f64::deserialize(deserializer)?;
    Ok(value.round() as i64)
}
