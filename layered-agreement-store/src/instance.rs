//! Agreement on exact span boundaries.
//!
//! For every unordered pair of annotators `(first, second)` the store groups
//! their rows by `(begin, end, sentence)`. A group both annotators share is a
//! true positive; a group only `first` produced is a false negative, one only
//! `second` produced a false positive.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

use layered_agreement::round_to;
use serde::Serialize;

use crate::{AnnotationStore, InstanceGroup, PairQuery, StoreResult};

/// Decimal places of [`InstanceAgreement::agreement_fscore`] unless configured.
pub const DEFAULT_DECIMALS: u32 = 3;

/// Cache key of one annotator pair's query.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) struct PairKey {
    document: String,
    first: String,
    second: String,
    labels: Vec<String>,
}

impl PairKey {
    pub(crate) fn new(query: &PairQuery<'_>) -> Self {
        let mut labels = query.labels.to_vec();
        labels.sort();
        labels.dedup();
        Self {
            document: query.document.to_string(),
            first: query.first.to_string(),
            second: query.second.to_string(),
            labels,
        }
    }
}

/// Sorted, deduplicated annotators and their unordered pairs.
pub(crate) fn annotator_pairs(annotators: &[String]) -> Vec<(&str, &str)> {
    let mut pairs = Vec::new();
    for (i, first) in annotators.iter().enumerate() {
        for second in &annotators[i + 1..] {
            pairs.push((first.as_str(), second.as_str()));
        }
    }
    pairs
}

pub(crate) fn normalize_annotators(annotators: impl IntoIterator<Item = impl Into<String>>) -> Vec<String> {
    let mut annotators: Vec<String> = annotators.into_iter().map(Into::into).collect();
    annotators.sort();
    annotators.dedup();
    annotators
}

/// `2·tp / (2·tp + errors) / annotators`, or 0.0 when either denominator is zero.
pub(crate) fn macro_fscore(true_positives: usize, errors: usize, annotators: usize, decimals: u32) -> f64 {
    let denominator = 2 * true_positives + errors;
    if annotators == 0 || denominator == 0 {
        return 0.0;
    }
    let score = (2 * true_positives) as f64 / denominator as f64 / annotators as f64;
    round_to(score, decimals)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct InstanceCounts {
    pub true_positives: usize,
    pub false_positives: usize,
    pub false_negatives: usize,
}

impl InstanceCounts {
    fn add_group(&mut self, group: &InstanceGroup, first: &str, second: &str) {
        match group.annotators.as_slice() {
            [_, _] => self.true_positives += 1,
            [only] if only == second => self.false_positives += 1,
            [only] if only == first => self.false_negatives += 1,
            _ => {}
        }
    }
}

pub struct InstanceAgreement<S> {
    annotators: Vec<String>,
    store: Arc<S>,
    decimals: u32,
    groups: Mutex<HashMap<PairKey, Arc<Vec<InstanceGroup>>>>,
}

impl<S: AnnotationStore> InstanceAgreement<S> {
    pub fn new(annotators: impl IntoIterator<Item = impl Into<String>>, store: Arc<S>) -> Self {
        Self {
            annotators: normalize_annotators(annotators),
            store,
            decimals: DEFAULT_DECIMALS,
            groups: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_decimals(mut self, decimals: u32) -> Self {
        self.decimals = decimals;
        self
    }

    pub fn annotators(&self) -> &[String] {
        &self.annotators
    }

    /// Groups of one pair, queried once per document and label set.
    pub fn groups(&self, query: &PairQuery<'_>) -> StoreResult<Arc<Vec<InstanceGroup>>> {
        let key = PairKey::new(query);
        let mut cache = self.groups.lock();
        if let Some(groups) = cache.get(&key) {
            return Ok(Arc::clone(groups));
        }
        log::debug!(
            "querying instance groups for {}/{} in document {}",
            query.first,
            query.second,
            query.document
        );
        let groups = Arc::new(self.store.instance_groups(query)?);
        cache.insert(key, Arc::clone(&groups));
        Ok(groups)
    }

    /// Counts summed over every annotator pair.
    pub fn counts(&self, labels: &[String], document: &str) -> StoreResult<InstanceCounts> {
        let mut counts = InstanceCounts::default();
        for (first, second) in annotator_pairs(&self.annotators) {
            let query = PairQuery::new(document, labels, first, second)?;
            for group in self.groups(&query)?.iter() {
                counts.add_group(group, first, second);
            }
        }
        Ok(counts)
    }

    pub fn true_positives(&self, labels: &[String], document: &str) -> StoreResult<usize> {
        Ok(self.counts(labels, document)?.true_positives)
    }

    pub fn false_positives(&self, labels: &[String], document: &str) -> StoreResult<usize> {
        Ok(self.counts(labels, document)?.false_positives)
    }

    pub fn false_negatives(&self, labels: &[String], document: &str) -> StoreResult<usize> {
        Ok(self.counts(labels, document)?.false_negatives)
    }

    /// F-score over all pairs, divided by the number of annotators.
    pub fn agreement_fscore(&self, labels: &[String], document: &str) -> StoreResult<f64> {
        if self.annotators.is_empty() {
            return Ok(0.0);
        }
        let counts = self.counts(labels, document)?;
        Ok(macro_fscore(
            counts.true_positives,
            counts.false_negatives + counts.false_positives,
            self.annotators.len(),
            self.decimals,
        ))
    }
}
