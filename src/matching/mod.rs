//! Match strategies producing precision/recall for one comparison.
//!
//! Every strategy compares a *reference* side (recall denominator) with a
//! *candidate* side (precision denominator) and reports which items on each
//! side found no partner.

mod approximate;
mod assignment;
mod one_vs_all;
mod strict;

pub use approximate::{approximate_match, ApproximateWindow};
pub use assignment::max_pairing;
pub use one_vs_all::{contains_match, one_vs_all_match};
pub use strict::strict_match;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::{AgreementError, PrecisionRecall};

/// Matching strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchType {
    Strict,
    Approximate,
    #[serde(rename = "one_all")]
    OneVsAll,
}

impl MatchType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchType::Strict => "strict",
            MatchType::Approximate => "approximate",
            MatchType::OneVsAll => "one_all",
        }
    }

    /// Whether tables of this type compare annotators pairwise.
    pub fn is_pairwise(&self) -> bool {
        !matches!(self, MatchType::OneVsAll)
    }
}

impl FromStr for MatchType {
    type Err = AgreementError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "strict" => Ok(MatchType::Strict),
            "approximate" | "approx" => Ok(MatchType::Approximate),
            "one_all" | "one_vs_all" => Ok(MatchType::OneVsAll),
            _ => Err(AgreementError::InvalidMatchType(s.to_string())),
        }
    }
}

impl fmt::Display for MatchType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which disagreements to report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorType {
    #[serde(rename = "false_neg")]
    FalseNegative,
    #[serde(rename = "false_pos")]
    FalsePositive,
    Both,
}

impl FromStr for ErrorType {
    type Err = AgreementError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "false_neg" | "false_negative" => Ok(ErrorType::FalseNegative),
            "false_pos" | "false_positive" => Ok(ErrorType::FalsePositive),
            "both" => Ok(ErrorType::Both),
            _ => Err(AgreementError::InvalidErrorType(s.to_string())),
        }
    }
}

/// Result of one comparison.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MatchOutcome {
    pub scores: PrecisionRecall,
    pub matches: usize,
    /// Indices of reference items without a partner.
    pub unmatched_reference: Vec<usize>,
    /// Indices of candidate items without a partner.
    pub unmatched_candidate: Vec<usize>,
}

/// Indices whose flag is still unset.
pub(crate) fn unmatched(taken: &[bool]) -> Vec<usize> {
    taken
        .iter()
        .enumerate()
        .filter(|(_, t)| !**t)
        .map(|(i, _)| i)
        .collect()
}
