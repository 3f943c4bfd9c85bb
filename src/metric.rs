//! Precision, recall and F1 with an explicit "undefined" state.
//!
//! A metric whose denominator is zero or meaningless is [`Metric::Undefined`],
//! which is distinct from `0.0` and propagates through [`f1`].

use serde::{Deserialize, Serialize};
use std::fmt;

/// A score that may be undefined.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "Option<f64>", into = "Option<f64>")]
pub enum Metric {
    #[default]
    Undefined,
    Value(f64),
}

impl Metric {
    /// `numerator / denominator`, undefined for a zero denominator.
    pub fn ratio(numerator: usize, denominator: usize) -> Self {
        if denominator == 0 {
            Metric::Undefined
        } else {
            Metric::Value(numerator as f64 / denominator as f64)
        }
    }

    /// `numerator / denominator`, `0.0` for a zero denominator.
    pub fn ratio_or_zero(numerator: usize, denominator: usize) -> Self {
        if denominator == 0 {
            Metric::Value(0.0)
        } else {
            Metric::Value(numerator as f64 / denominator as f64)
        }
    }

    pub fn value(self) -> Option<f64> {
        match self {
            Metric::Undefined => None,
            Metric::Value(v) => Some(v),
        }
    }

    pub fn is_defined(self) -> bool {
        matches!(self, Metric::Value(_))
    }

    pub fn round(self, decimals: u32) -> Self {
        match self {
            Metric::Undefined => Metric::Undefined,
            Metric::Value(v) => Metric::Value(round_to(v, decimals)),
        }
    }

    /// Mean of the defined values, undefined if there are none.
    pub fn mean<I: IntoIterator<Item = Metric>>(values: I) -> Self {
        let (sum, count) = values
            .into_iter()
            .filter_map(Metric::value)
            .fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
        if count == 0 {
            Metric::Undefined
        } else {
            Metric::Value(sum / count as f64)
        }
    }
}

impl From<Option<f64>> for Metric {
    fn from(value: Option<f64>) -> Self {
        match value {
            Some(v) if !v.is_nan() => Metric::Value(v),
            _ => Metric::Undefined,
        }
    }
}

impl From<Metric> for Option<f64> {
    fn from(metric: Metric) -> Self {
        metric.value()
    }
}

impl From<f64> for Metric {
    fn from(value: f64) -> Self {
        Metric::from(Some(value))
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Metric::Undefined => f.pad("-"),
            Metric::Value(v) => fmt::Display::fmt(v, f),
        }
    }
}

/// Round half away from zero to `decimals` places.
pub fn round_to(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (value * factor).round() / factor
}

/// Harmonic mean of precision and recall.
///
/// `0.0` when both are zero, undefined when either is undefined.
pub fn f1(precision: Metric, recall: Metric) -> Metric {
    match (precision, recall) {
        (Metric::Value(p), Metric::Value(r)) => {
            if p + r > 0.0 {
                Metric::Value(2.0 * p * r / (p + r))
            } else {
                Metric::Value(0.0)
            }
        }
        _ => Metric::Undefined,
    }
}

/// Precision and recall of one comparison.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PrecisionRecall {
    pub precision: Metric,
    pub recall: Metric,
}

impl PrecisionRecall {
    pub fn new(precision: Metric, recall: Metric) -> Self {
        Self { precision, recall }
    }

    pub fn undefined() -> Self {
        Self::default()
    }

    pub fn f1(&self) -> Metric {
        f1(self.precision, self.recall)
    }

    /// Precision and recall swapped.
    pub fn mirrored(&self) -> Self {
        Self {
            precision: self.recall,
            recall: self.precision,
        }
    }
}

/// One table cell: F1, precision and recall.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Scores {
    pub fscore: Metric,
    pub precision: Metric,
    pub recall: Metric,
}

impl Scores {
    /// F1 from unrounded precision/recall, then everything rounded.
    pub fn from_pr(pr: PrecisionRecall, decimals: u32) -> Self {
        Self {
            fscore: pr.f1().round(decimals),
            precision: pr.precision.round(decimals),
            recall: pr.recall.round(decimals),
        }
    }

    pub fn undefined() -> Self {
        Self::default()
    }

    pub fn is_undefined(&self) -> bool {
        !self.fscore.is_defined() && !self.precision.is_defined() && !self.recall.is_defined()
    }
}
