use std::sync::Arc;

use super::{max_pairing, unmatched, MatchOutcome};
use crate::{Centroid, Metric, Plateau, PrecisionRecall};

/// Containment test between one annotation and an aggregate centroid.
///
/// The annotation's own extent must cover the aggregate's local maximum,
/// and must itself stay inside the aggregate's extent.
pub fn contains_match(individual_extent: Plateau, aggregate_heart: Plateau, aggregate_extent: Plateau) -> bool {
    individual_extent.contains_interval(&aggregate_heart) && aggregate_extent.contains_interval(&individual_extent)
}

/// Match one annotator's centroids (`individual`) against centroids of the
/// remaining annotators combined (`aggregate`).
///
/// Individual extents are taken at boundary 0; aggregate extents at
/// `boundary`. Each centroid on either side matches at most once, and the
/// pairing is maximal whatever the order of either side.
pub fn one_vs_all_match(individual: &[Arc<Centroid>], aggregate: &[Arc<Centroid>], boundary: u32) -> MatchOutcome {
    let individual_extents: Vec<Plateau> = individual.iter().map(|c| c.extent(0)).collect();
    let aggregate_bounds: Vec<(Plateau, Plateau)> = aggregate
        .iter()
        .map(|c| (c.local_maximum(), c.extent(boundary)))
        .collect();
    let pairs = max_pairing(aggregate.len(), individual.len(), |i, j| {
        let (heart, extent) = aggregate_bounds[i];
        contains_match(individual_extents[j], heart, extent)
    });
    let matches = pairs.len();
    let mut aggregate_taken = vec![false; aggregate.len()];
    let mut individual_taken = vec![false; individual.len()];
    for &(i, j) in &pairs {
        aggregate_taken[i] = true;
        individual_taken[j] = true;
    }

    let scores = if !aggregate.is_empty() {
        PrecisionRecall::new(
            Metric::ratio_or_zero(matches, individual.len()),
            Metric::ratio(matches, aggregate.len()),
        )
    } else if !individual.is_empty() {
        PrecisionRecall::new(Metric::Value(0.0), Metric::Undefined)
    } else {
        PrecisionRecall::undefined()
    };

    MatchOutcome {
        scores,
        matches,
        unmatched_reference: unmatched(&aggregate_taken),
        unmatched_candidate: unmatched(&individual_taken),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::OccurrenceArray;

    fn centroid(len: usize, covered: &[(usize, usize, u32)]) -> Arc<Centroid> {
        let mut counts = vec![0u32; len];
        for &(b, e, n) in covered {
            for cell in &mut counts[b..=e] {
                *cell += n;
            }
        }
        let plateau = crate::find_plateaus(&counts)[0];
        Arc::new(Centroid::new("Med", plateau, vec![0], Arc::new(OccurrenceArray::new(counts, false)), ""))
    }

    fn aggregate() -> Arc<Centroid> {
        // heart [10, 15], extent [9, 16] at boundary 0
        let c = centroid(25, &[(9, 16, 1), (10, 15, 1)]);
        assert_eq!(c.local_maximum(), Plateau::new(10, 15));
        assert_eq!(c.extent(0), Plateau::new(9, 16));
        c
    }

    #[test]
    fn test_containment_predicate() {
        let heart = Plateau::new(10, 15);
        let extent = Plateau::new(9, 16);
        assert!(!contains_match(Plateau::new(8, 18), heart, extent));
        assert!(contains_match(Plateau::new(9, 15), heart, extent));
        assert!(!contains_match(Plateau::new(11, 15), heart, extent));
    }

    #[test]
    fn test_overwide_annotation_fails() {
        let outcome = one_vs_all_match(&[centroid(25, &[(8, 18, 1)])], &[aggregate()], 0);
        assert_eq!(outcome.matches, 0);
        assert_eq!(outcome.scores, PrecisionRecall::new(Metric::Value(0.0), Metric::Value(0.0)));
        assert_eq!(outcome.unmatched_reference, vec![0]);
        assert_eq!(outcome.unmatched_candidate, vec![0]);
    }

    #[test]
    fn test_contained_annotation_matches() {
        let outcome = one_vs_all_match(&[centroid(25, &[(9, 15, 1)])], &[aggregate()], 0);
        assert_eq!(outcome.matches, 1);
        assert_eq!(outcome.scores, PrecisionRecall::new(Metric::Value(1.0), Metric::Value(1.0)));
        assert!(outcome.unmatched_reference.is_empty());
    }

    #[test]
    fn test_annotation_matches_once() {
        let one = centroid(25, &[(9, 15, 1)]);
        let outcome = one_vs_all_match(&[one], &[aggregate(), aggregate()], 0);
        assert_eq!(outcome.matches, 1);
        assert_eq!(outcome.scores.recall, Metric::Value(0.5));
        assert_eq!(outcome.unmatched_reference, vec![1]);
    }

    #[test]
    fn test_pairing_ignores_order() {
        // hearts [10, 12] and [14, 16], both extents [8, 20]
        let first = centroid(30, &[(8, 20, 1), (10, 12, 1)]);
        let mut counts = vec![0u32; 30];
        for (i, cell) in counts.iter_mut().enumerate() {
            *cell = match i {
                14..=16 => 2,
                8..=20 => 1,
                _ => 0,
            };
        }
        let second = Arc::new(Centroid::new(
            "Med",
            Plateau::new(14, 16),
            vec![0],
            Arc::new(OccurrenceArray::new(counts, false)),
            "",
        ));
        assert_eq!(second.extent(0), Plateau::new(8, 20));

        // the wide annotation fits both aggregates, the narrow one only the first
        let wide = centroid(30, &[(10, 16, 1)]);
        let narrow = centroid(30, &[(10, 12, 1)]);
        let aggregates = [first, second];
        let forward = one_vs_all_match(&[Arc::clone(&wide), Arc::clone(&narrow)], &aggregates, 0);
        let reversed = one_vs_all_match(&[narrow, wide], &aggregates, 0);
        assert_eq!(forward.matches, 2);
        assert_eq!(reversed.matches, 2);
        assert_eq!(forward.scores, reversed.scores);
    }

    #[test]
    fn test_empty_sides() {
        let one = centroid(25, &[(9, 15, 1)]);
        let no_aggregate = one_vs_all_match(&[one], &[], 0);
        assert_eq!(no_aggregate.scores, PrecisionRecall::new(Metric::Value(0.0), Metric::Undefined));

        let nothing = one_vs_all_match(&[], &[], 0);
        assert_eq!(nothing.scores, PrecisionRecall::undefined());

        let no_individual = one_vs_all_match(&[], &[aggregate()], 0);
        assert_eq!(no_individual.scores, PrecisionRecall::new(Metric::Value(0.0), Metric::Value(0.0)));
    }
}
