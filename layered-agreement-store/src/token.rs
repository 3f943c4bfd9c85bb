//! Agreement on span containment within a sentence.
//!
//! Two rows agree when they share a sentence and one contains the other. Each
//! row is matched at most once, and the pairing is a largest one, so it does
//! not depend on row order. Rows that shared a
//! sentence with the other annotator but stayed unmatched are
//! false-same-sentence errors; rows that never did are false-other errors.

use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use serde::Serialize;

use layered_agreement::matching::max_pairing;

use crate::instance::{annotator_pairs, macro_fscore, normalize_annotators, PairKey, DEFAULT_DECIMALS};
use crate::{AnnotationStore, PairQuery, RowKey, StoreResult};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TokenCounts {
    pub true_positives: usize,
    pub false_same_sentence: usize,
    pub false_other: usize,
}

impl TokenCounts {
    pub fn errors(&self) -> usize {
        self.false_same_sentence + self.false_other
    }
}

impl std::ops::AddAssign for TokenCounts {
    fn add_assign(&mut self, other: Self) {
        self.true_positives += other.true_positives;
        self.false_same_sentence += other.false_same_sentence;
        self.false_other += other.false_other;
    }
}

pub struct TokenAgreement<S> {
    annotators: Vec<String>,
    store: Arc<S>,
    decimals: u32,
    pairs: Mutex<HashMap<PairKey, TokenCounts>>,
}

impl<S: AnnotationStore> TokenAgreement<S> {
    pub fn new(annotators: impl IntoIterator<Item = impl Into<String>>, store: Arc<S>) -> Self {
        Self {
            annotators: normalize_annotators(annotators),
            store,
            decimals: DEFAULT_DECIMALS,
            pairs: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_decimals(mut self, decimals: u32) -> Self {
        self.decimals = decimals;
        self
    }

    pub fn annotators(&self) -> &[String] {
        &self.annotators
    }

    /// Counts of one annotator pair, computed once per document and label set.
    pub fn pair_counts(&self, query: &PairQuery<'_>) -> StoreResult<TokenCounts> {
        let key = PairKey::new(query);
        let mut cache = self.pairs.lock();
        if let Some(counts) = cache.get(&key) {
            return Ok(*counts);
        }

        let pairs = self.store.same_sentence_pairs(query)?;
        let mut compared: HashSet<RowKey> = HashSet::new();
        let mut firsts: Vec<RowKey> = Vec::new();
        let mut seconds: Vec<RowKey> = Vec::new();
        let mut contained: HashSet<(usize, usize)> = HashSet::new();
        for pair in &pairs {
            let first = position_or_push(&mut firsts, pair.first.key());
            let second = position_or_push(&mut seconds, pair.second.key());
            if pair.contained {
                contained.insert((first, second));
            }
        }
        compared.extend(firsts.iter().cloned());
        compared.extend(seconds.iter().cloned());

        let mut matched: HashSet<RowKey> = HashSet::new();
        let mut counts = TokenCounts::default();
        for (first, second) in max_pairing(firsts.len(), seconds.len(), |f, s| contained.contains(&(f, s))) {
            counts.true_positives += 1;
            matched.insert(firsts[first].clone());
            matched.insert(seconds[second].clone());
        }

        for row in self.store.rows(query)? {
            let key = row.key();
            if matched.contains(&key) {
                continue;
            }
            if compared.contains(&key) {
                counts.false_same_sentence += 1;
            } else {
                counts.false_other += 1;
            }
        }
        log::debug!(
            "token agreement {}/{} in document {}: {:?}",
            query.first,
            query.second,
            query.document,
            counts
        );
        cache.insert(key, counts);
        Ok(counts)
    }

    /// Counts summed over every annotator pair.
    pub fn counts(&self, labels: &[String], document: &str) -> StoreResult<TokenCounts> {
        let mut counts = TokenCounts::default();
        for (first, second) in annotator_pairs(&self.annotators) {
            counts += self.pair_counts(&PairQuery::new(document, labels, first, second)?)?;
        }
        Ok(counts)
    }

    pub fn true_positives(&self, labels: &[String], document: &str) -> StoreResult<usize> {
        Ok(self.counts(labels, document)?.true_positives)
    }

    pub fn false_same_sentence(&self, labels: &[String], document: &str) -> StoreResult<usize> {
        Ok(self.counts(labels, document)?.false_same_sentence)
    }

    pub fn false_other(&self, labels: &[String], document: &str) -> StoreResult<usize> {
        Ok(self.counts(labels, document)?.false_other)
    }

    pub fn agreement_fscore(&self, labels: &[String], document: &str) -> StoreResult<f64> {
        if self.annotators.is_empty() {
            return Ok(0.0);
        }
        let counts = self.counts(labels, document)?;
        Ok(macro_fscore(
            counts.true_positives,
            counts.errors(),
            self.annotators.len(),
            self.decimals,
        ))
    }
}

fn position_or_push(keys: &mut Vec<RowKey>, key: RowKey) -> usize {
    match keys.iter().position(|k| *k == key) {
        Some(at) => at,
        None => {
            keys.push(key);
            keys.len() - 1
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{AnnotationRow, MemoryStore, SqliteStore};

    fn row(annotator: &str, id: &str, begin: usize, end: usize, sentence: i64) -> AnnotationRow {
        AnnotationRow {
            id: id.into(),
            annotator: annotator.into(),
            begin,
            end,
            text: String::new(),
            sentence,
            document: "2".into(),
            label: "Medication".into(),
        }
    }

    /// Sentence 0: A's [0, 9) contains B's [2, 5) and B's [4, 8), only one
    /// can match. Sentence 1: A and B overlap without containment. Sentence 2:
    /// only A.
    fn rows() -> Vec<AnnotationRow> {
        vec![
            row("A", "T1", 0, 9, 0),
            row("B", "T1", 2, 5, 0),
            row("B", "T2", 4, 8, 0),
            row("A", "T2", 20, 26, 1),
            row("B", "T3", 24, 30, 1),
            row("A", "T3", 40, 44, 2),
        ]
    }

    fn labels() -> Vec<String> {
        vec!["Medication".to_string()]
    }

    #[test]
    fn test_containment_counts() {
        let agreement = TokenAgreement::new(["A", "B"], Arc::new(MemoryStore::from_rows(rows())));
        let counts = agreement.counts(&labels(), "2").unwrap();
        assert_eq!(
            counts,
            TokenCounts {
                true_positives: 1,
                false_same_sentence: 3,
                false_other: 1,
            }
        );
        // 2 / (2 + 4) / 2
        assert_eq!(agreement.agreement_fscore(&labels(), "2").unwrap(), 0.167);
    }

    #[test]
    fn test_sqlite_store_agrees() {
        let store = SqliteStore::open_in_memory(Default::default()).unwrap();
        for row in rows() {
            store.insert(&row).unwrap();
        }
        let agreement = TokenAgreement::new(["A", "B"], Arc::new(store));
        assert_eq!(agreement.true_positives(&labels(), "2").unwrap(), 1);
        assert_eq!(agreement.false_same_sentence(&labels(), "2").unwrap(), 3);
        assert_eq!(agreement.false_other(&labels(), "2").unwrap(), 1);
    }

    #[test]
    fn test_pairing_does_not_follow_row_order() {
        // A's T1 contains both of B's rows, A's T2 only B's T1. Taking A's T1
        // first with B's T1 would strand A's T2.
        let rows = vec![
            row("A", "T1", 0, 20, 0),
            row("A", "T2", 1, 6, 0),
            row("B", "T1", 2, 5, 0),
            row("B", "T2", 8, 12, 0),
        ];
        let mut reversed = rows.clone();
        reversed.reverse();
        for rows in [rows, reversed] {
            let agreement = TokenAgreement::new(["A", "B"], Arc::new(MemoryStore::from_rows(rows)));
            let counts = agreement.counts(&labels(), "2").unwrap();
            assert_eq!(counts.true_positives, 2);
            assert_eq!(counts.errors(), 0);
        }
    }

    #[test]
    fn test_exact_match_is_containment() {
        let store = MemoryStore::from_rows(vec![row("A", "T1", 0, 9, 0), row("B", "T1", 0, 9, 0)]);
        let agreement = TokenAgreement::new(["A", "B"], Arc::new(store));
        assert_eq!(agreement.agreement_fscore(&labels(), "2").unwrap(), 0.5);
    }

    #[test]
    fn test_no_annotators_scores_zero() {
        let agreement = TokenAgreement::new(Vec::<String>::new(), Arc::new(MemoryStore::new()));
        assert_eq!(agreement.agreement_fscore(&labels(), "2").unwrap(), 0.0);
    }
}
