//! Compliance evaluation against configurable standard thresholds.
//!
//! Thresholds live in an explicit [`RuleTable`] rather than inline at call
//! sites, so a deployment can load its own table (the struct round-trips
//! through serde) without touching evaluation code.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// One standard and the minimum score required to pass it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComplianceRule {
    /// Standard identifier (e.g. `NCC 2025`, `NABERS`).
    pub standard: String,
    pub min_score: f64,
}

/// The verdict for one standard.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComplianceResult {
    pub standard: String,
    /// The evaluated score, if one was supplied for this standard.
    pub score: Option<f64>,
    pub min_score: f64,
    pub compliant: bool,
}

/// An ordered set of compliance rules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleTable {
    rules: Vec<ComplianceRule>,
}

impl Default for RuleTable {
    /// The thresholds the hosted platform ships with.
    fn default() -> Self {
        Self::new(vec![
            ComplianceRule {
                standard: "NCC 2025".into(),
                min_score: 60.0,
            },
            ComplianceRule {
                standard: "NABERS".into(),
                min_score: 70.0,
            },
            ComplianceRule {
                standard: "Green Star".into(),
                min_score: 75.0,
            },
            ComplianceRule {
                standard: "LEED".into(),
                min_score: 65.0,
            },
        ])
    }
}

impl RuleTable {
    #[must_use]
    pub fn new(rules: Vec<ComplianceRule>) -> Self {
        Self { rules }
    }

    #[must_use]
    pub fn rules(&self) -> &[ComplianceRule] {
        &self.rules
    }

    /// Evaluate `scores` (keyed by standard) against every rule in the table.
    ///
    /// A standard with no score is reported as non-compliant with `score: None`;
    /// scores for standards not in the table are ignored.
    #[must_use]
    pub fn evaluate(&self, scores: &HashMap<String, f64>) -> Vec<ComplianceResult> {
        self.rules
            .iter()
            .map(|rule| {
                let score = scores.get(&rule.standard).copied();
                ComplianceResult {
                    standard: rule.standard.clone(),
                    score,
                    min_score: rule.min_score,
                    compliant: score.is_some_and(|s| s >= rule.min_score),
                }
            })
            .collect()
    }
}
