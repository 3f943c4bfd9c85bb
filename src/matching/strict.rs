use std::collections::BTreeSet;

use super::MatchOutcome;
use crate::{Metric, PrecisionRecall, Span, SpanInstance};

/// Exact agreement: an instance matches when the other side has an instance
/// with the identical fragment list.
///
/// Recall is undefined without reference instances. Precision is `0.0` when
/// only the candidate side is empty and undefined when both are.
pub fn strict_match(reference: &[&SpanInstance], candidate: &[&SpanInstance]) -> MatchOutcome {
    let t1: BTreeSet<&[Span]> = reference.iter().map(|inst| inst.fragments()).collect();
    let t2: BTreeSet<&[Span]> = candidate.iter().map(|inst| inst.fragments()).collect();
    let common = t1.intersection(&t2).count();

    let recall = Metric::ratio(common, t1.len());
    let precision = if t1.is_empty() && t2.is_empty() {
        Metric::Undefined
    } else {
        Metric::ratio_or_zero(common, t2.len())
    };

    MatchOutcome {
        scores: PrecisionRecall::new(precision, recall),
        matches: common,
        unmatched_reference: unmatched(reference, &t2),
        unmatched_candidate: unmatched(candidate, &t1),
    }
}

fn unmatched(side: &[&SpanInstance], other: &BTreeSet<&[Span]>) -> Vec<usize> {
    side.iter()
        .enumerate()
        .filter(|(_, inst)| !other.contains(inst.fragments()))
        .map(|(i, _)| i)
        .collect()
}
