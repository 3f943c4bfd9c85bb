//! The query surface agreement needs from an annotation store.

use serde::{Deserialize, Serialize};

use crate::{StoreError, StoreResult};

/// One persisted annotation. `begin` and `end` are char offsets into the document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnotationRow {
    pub id: String,
    pub annotator: String,
    pub begin: usize,
    pub end: usize,
    pub text: String,
    pub sentence: i64,
    pub document: String,
    pub label: String,
}

impl AnnotationRow {
    /// Rows are identified per annotator, ids repeat across annotators.
    pub fn key(&self) -> RowKey {
        RowKey {
            annotator: self.annotator.clone(),
            id: self.id.clone(),
        }
    }

    pub fn contains(&self, other: &AnnotationRow) -> bool {
        self.begin <= other.begin && other.end <= self.end
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RowKey {
    pub annotator: String,
    pub id: String,
}

/// Rows of two annotators in one document, restricted to some labels.
#[derive(Debug, Clone, Copy)]
pub struct PairQuery<'a> {
    pub document: &'a str,
    pub labels: &'a [String],
    pub first: &'a str,
    pub second: &'a str,
}

impl<'a> PairQuery<'a> {
    pub fn new(document: &'a str, labels: &'a [String], first: &'a str, second: &'a str) -> StoreResult<Self> {
        if labels.is_empty() {
            return Err(StoreError::EmptyTypeFilter);
        }
        Ok(Self {
            document,
            labels,
            first,
            second,
        })
    }

    pub fn selects(&self, row: &AnnotationRow) -> bool {
        row.document == self.document
            && (row.annotator == self.first || row.annotator == self.second)
            && self.labels.iter().any(|l| *l == row.label)
    }
}

/// Rows sharing `(begin, end, sentence)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InstanceGroup {
    pub begin: usize,
    pub end: usize,
    pub sentence: i64,
    /// Distinct annotators, sorted.
    pub annotators: Vec<String>,
    pub rows: usize,
}

/// A row of the first annotator and a row of the second in the same sentence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentencePair {
    pub sentence: i64,
    pub first: AnnotationRow,
    pub second: AnnotationRow,
    /// One span lies inside the other.
    pub contained: bool,
}

/// A queryable source of annotation rows. Read-only from the agreement side.
pub trait AnnotationStore {
    /// Rows selected by `query`, ordered by `(begin, end, annotator, id)`.
    fn rows(&self, query: &PairQuery<'_>) -> StoreResult<Vec<AnnotationRow>>;

    /// Selected rows grouped by `(begin, end, sentence)`, in that order.
    fn instance_groups(&self, query: &PairQuery<'_>) -> StoreResult<Vec<InstanceGroup>>;

    /// Every first/second row pair sharing a sentence, ordered by the first
    /// row's then the second row's `(begin, end)`.
    fn same_sentence_pairs(&self, query: &PairQuery<'_>) -> StoreResult<Vec<SentencePair>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_labels_rejected() {
        let err = PairQuery::new("2", &[], "0", "1").unwrap_err();
        assert!(matches!(err, StoreError::EmptyTypeFilter));
    }
}
