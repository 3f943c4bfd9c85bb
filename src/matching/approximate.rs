use super::{max_pairing, unmatched, MatchOutcome};
use crate::{Metric, PrecisionRecall, Span, SpanInstance};

/// Tolerance window for approximate matching.
///
/// A fragment `outer` covers `inner` when `inner` starts inside
/// `[outer.begin - tolerance, outer.end)` and ends inside
/// `[outer.begin, outer.end + tolerance)`. The upper edge opens to
/// `text_len + 1` once it would reach the end of the text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ApproximateWindow {
    tolerance: usize,
    text_len: usize,
}

impl ApproximateWindow {
    /// Tolerance is the document's mean word length plus `adjustment`,
    /// clamped at zero.
    pub fn new(mean_word_length: usize, adjustment: i32, text_len: usize) -> Self {
        let tolerance = (mean_word_length as i64 + i64::from(adjustment)).max(0) as usize;
        Self { tolerance, text_len }
    }

    pub fn tolerance(&self) -> usize {
        self.tolerance
    }

    fn covers(&self, outer: Span, inner: Span) -> bool {
        let lower = outer.begin.saturating_sub(self.tolerance);
        let upper = if outer.end + self.tolerance < self.text_len {
            outer.end + self.tolerance
        } else {
            self.text_len + 1
        };
        (lower..outer.end).contains(&inner.begin) && (outer.begin..upper).contains(&inner.end)
    }

    /// Symmetric window test.
    pub fn matches(&self, a: Span, b: Span) -> bool {
        self.covers(a, b) || self.covers(b, a)
    }

    fn matches_instances(&self, a: &SpanInstance, b: &SpanInstance) -> bool {
        a.fragments()
            .iter()
            .any(|&fa| b.fragments().iter().any(|&fb| self.matches(fa, fb)))
    }
}

/// Fuzzy agreement: instances pair up one-to-one when any of their
/// fragments fall within each other's tolerance window. The pairing is a
/// maximum matching, so the count does not depend on input order.
///
/// Empty sides score `0.0` rather than undefined.
pub fn approximate_match(
    reference: &[&SpanInstance],
    candidate: &[&SpanInstance],
    window: &ApproximateWindow,
) -> MatchOutcome {
    let pairs = max_pairing(reference.len(), candidate.len(), |i, j| {
        window.matches_instances(reference[i], candidate[j])
    });
    let matches = pairs.len();
    let mut reference_taken = vec![false; reference.len()];
    let mut candidate_taken = vec![false; candidate.len()];
    for &(i, j) in &pairs {
        reference_taken[i] = true;
        candidate_taken[j] = true;
    }

    MatchOutcome {
        scores: PrecisionRecall::new(
            Metric::ratio_or_zero(matches, candidate.len()),
            Metric::ratio_or_zero(matches, reference.len()),
        ),
        matches,
        unmatched_reference: unmatched(&reference_taken),
        unmatched_candidate: unmatched(&candidate_taken),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inst(id: &str, b: usize, e: usize) -> SpanInstance {
        SpanInstance::new(id, "Dose", vec![Span::new(b, e)], "")
    }

    #[test]
    fn test_window_bounds() {
        let window = ApproximateWindow::new(3, 0, 100);
        assert!(window.matches(Span::new(10, 20), Span::new(7, 22)));
        assert!(!window.matches(Span::new(10, 20), Span::new(6, 16)));
        assert!(!window.matches(Span::new(10, 20), Span::new(14, 24)));
        // symmetric
        assert!(window.matches(Span::new(12, 15), Span::new(10, 20)));
    }

    #[test]
    fn test_window_opens_at_text_end() {
        let window = ApproximateWindow::new(2, 0, 20);
        assert!(window.matches(Span::new(15, 19), Span::new(15, 20)));
        let tight = ApproximateWindow::new(0, 0, 20);
        assert!(tight.matches(Span::new(15, 20), Span::new(15, 20)));
        assert!(!tight.matches(Span::new(15, 19), Span::new(16, 30)));
    }

    #[test]
    fn test_adjustment_moves_tolerance() {
        assert_eq!(ApproximateWindow::new(4, 2, 50).tolerance(), 6);
        assert_eq!(ApproximateWindow::new(4, -1, 50).tolerance(), 3);
    }

    #[test]
    fn test_negative_adjustment_clamps_to_zero() {
        let window = ApproximateWindow::new(3, -5, 100);
        assert_eq!(window.tolerance(), 0);
        assert!(window.matches(Span::new(10, 20), Span::new(12, 15)));
        assert!(!window.matches(Span::new(10, 20), Span::new(9, 20)));
    }

    #[test]
    fn test_pairing_ignores_input_order() {
        // the wide T1 could take C1, which only T2 can use
        let window = ApproximateWindow::new(2, 0, 100);
        let reference = vec![inst("T1", 10, 30), inst("T2", 12, 15)];
        let candidate = vec![inst("C1", 12, 15), inst("C2", 24, 28)];
        let reference: Vec<&SpanInstance> = reference.iter().collect();
        let candidate: Vec<&SpanInstance> = candidate.iter().collect();
        let reversed_reference: Vec<&SpanInstance> = reference.iter().rev().copied().collect();
        let reversed_candidate: Vec<&SpanInstance> = candidate.iter().rev().copied().collect();

        let forward = approximate_match(&reference, &candidate, &window);
        let reversed = approximate_match(&reversed_reference, &reversed_candidate, &window);
        assert_eq!(forward.matches, 2);
        assert_eq!(reversed.matches, 2);
        assert_eq!(forward.scores, reversed.scores);
        assert!(forward.unmatched_reference.is_empty());
    }

    #[test]
    fn test_one_to_one_pairing() {
        let window = ApproximateWindow::new(3, 0, 100);
        let a = vec![inst("T1", 10, 15)];
        let b = vec![inst("T1", 10, 14), inst("T2", 11, 15)];
        let a: Vec<&SpanInstance> = a.iter().collect();
        let b: Vec<&SpanInstance> = b.iter().collect();

        let outcome = approximate_match(&a, &b, &window);
        assert_eq!(outcome.matches, 1);
        assert_eq!(outcome.scores.recall, Metric::Value(1.0));
        assert_eq!(outcome.scores.precision, Metric::Value(0.5));
        assert_eq!(outcome.unmatched_candidate.len(), 1);
    }

    #[test]
    fn test_empty_sides_score_zero() {
        let window = ApproximateWindow::new(3, 0, 100);
        let outcome = approximate_match(&[], &[], &window);
        assert_eq!(outcome.scores, PrecisionRecall::new(Metric::Value(0.0), Metric::Value(0.0)));
    }
}
