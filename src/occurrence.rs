//! Per-character agreement counts.
//!
//! For every label the matrix keeps one row per annotator: cell `i` counts
//! how many of that annotator's fragments cover character `i`. Occurrence
//! arrays sum those rows over an annotator subset.

use log::{debug, warn};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

use crate::{AgreementResult, AnnotatedDocument};

/// Number of annotators (within a subset) covering each character.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OccurrenceArray {
    counts: Vec<u32>,
    stripped: bool,
}

impl OccurrenceArray {
    pub fn new(counts: Vec<u32>, stripped: bool) -> Self {
        Self { counts, stripped }
    }

    pub fn counts(&self) -> &[u32] {
        &self.counts
    }

    pub fn get(&self, pos: usize) -> Option<u32> {
        self.counts.get(pos).copied()
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Whether whitespace positions were excised.
    pub fn is_stripped(&self) -> bool {
        self.stripped
    }

    pub fn max(&self) -> u32 {
        self.counts.iter().copied().max().unwrap_or(0)
    }
}

/// Per-annotator coverage rows for one label.
#[derive(Debug, Clone)]
pub struct LabelMatrix {
    rows: Vec<Vec<u32>>,
}

impl LabelMatrix {
    pub fn row(&self, annotator: usize) -> Option<&[u32]> {
        self.rows.get(annotator).map(Vec::as_slice)
    }

    /// Column sums over `subset`. Indices must already be validated.
    fn sum(&self, subset: &[usize], len: usize) -> Vec<u32> {
        let mut total = vec![0u32; len];
        for &annotator in subset {
            for (cell, value) in total.iter_mut().zip(self.rows[annotator].iter()) {
                *cell += *value;
            }
        }
        total
    }
}

/// Builds and caches label matrices for a document.
pub struct AgreementMatrix {
    document: Arc<AnnotatedDocument>,
    labels: Mutex<HashMap<String, Arc<LabelMatrix>>>,
}

impl AgreementMatrix {
    pub fn new(document: Arc<AnnotatedDocument>) -> Self {
        Self {
            document,
            labels: Mutex::new(HashMap::new()),
        }
    }

    pub fn document(&self) -> &Arc<AnnotatedDocument> {
        &self.document
    }

    /// The coverage rows for `label`, built on first use.
    pub fn label_matrix(&self, label: &str) -> Arc<LabelMatrix> {
        let mut labels = self.labels.lock();
        if let Some(matrix) = labels.get(label) {
            return Arc::clone(matrix);
        }
        debug!("building occurrence matrix for label {} in document {}", label, self.document.id());
        let matrix = Arc::new(self.build(label));
        labels.insert(label.to_string(), Arc::clone(&matrix));
        matrix
    }

    fn build(&self, label: &str) -> LabelMatrix {
        let len = self.document.char_len();
        let annotators = self.document.annotators();
        let rows = (0..annotators.len())
            .map(|annotator| {
                let mut row = vec![0u32; len];
                let Some(index) = self.document.spans(annotator) else {
                    return row;
                };
                for inst in index.by_label(label) {
                    for fragment in inst.fragments() {
                        if fragment.end > len {
                            warn!(
                                "span {}..{} of {} exceeds document {} ({} chars); clamping",
                                fragment.begin,
                                fragment.end,
                                inst.id,
                                self.document.id(),
                                len
                            );
                        }
                        for cell in row.iter_mut().take(fragment.end.min(len)).skip(fragment.begin) {
                            *cell += 1;
                        }
                    }
                }
                row
            })
            .collect();
        LabelMatrix { rows }
    }

    /// Occurrence counts of `label` summed over `subset`.
    ///
    /// Fails with `IndexOutOfRange` if the subset names an unknown annotator.
    pub fn occurrence_array(
        &self,
        label: &str,
        subset: &[usize],
        strip_whitespace: bool,
    ) -> AgreementResult<OccurrenceArray> {
        self.document.annotators().check_indices(subset)?;
        let counts = self.label_matrix(label).sum(subset, self.document.char_len());
        Ok(if strip_whitespace {
            OccurrenceArray::new(self.document.whitespace_mask().strip(&counts), true)
        } else {
            OccurrenceArray::new(counts, false)
        })
    }

    /// Occurrence counts of `label` over every annotator.
    pub fn occurrence_array_all(&self, label: &str, strip_whitespace: bool) -> OccurrenceArray {
        let all: Vec<usize> = (0..self.document.annotators().len()).collect();
        let counts = self.label_matrix(label).sum(&all, self.document.char_len());
        if strip_whitespace {
            OccurrenceArray::new(self.document.whitespace_mask().strip(&counts), true)
        } else {
            OccurrenceArray::new(counts, false)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{AgreementError, Span, SpanIndex, SpanInstance};
    use std::collections::BTreeMap;

    fn doc() -> Arc<AnnotatedDocument> {
        let text = "ab cd ef";
        let mut annotations = BTreeMap::new();
        annotations.insert(
            "a".to_string(),
            SpanIndex::from_instances(vec![
                SpanInstance::new("T1", "Med", vec![Span::new(0, 5)], "ab cd"),
                SpanInstance::new("T2", "Dose", vec![Span::new(6, 8)], "ef"),
            ]),
        );
        annotations.insert(
            "b".to_string(),
            SpanIndex::from_instances(vec![SpanInstance::new(
                "T1",
                "Med",
                vec![Span::new(0, 2), Span::new(6, 8)],
                "ab ef",
            )]),
        );
        Arc::new(AnnotatedDocument::with_annotations("d", text, annotations))
    }

    #[test]
    fn test_occurrence_counts() {
        let matrix = AgreementMatrix::new(doc());
        let array = matrix.occurrence_array("Med", &[0, 1], false).unwrap();
        assert_eq!(array.counts(), &[2, 2, 1, 1, 1, 0, 1, 1]);
        assert!(!array.is_stripped());
    }

    #[test]
    fn test_occurrence_counts_stripped() {
        let matrix = AgreementMatrix::new(doc());
        let array = matrix.occurrence_array("Med", &[0, 1], true).unwrap();
        assert_eq!(array.counts(), &[2, 2, 1, 1, 1, 1]);
        assert_eq!(array.max(), 2);
    }

    #[test]
    fn test_subset_order_is_irrelevant() {
        let matrix = AgreementMatrix::new(doc());
        let ab = matrix.occurrence_array("Med", &[0, 1], true).unwrap();
        let ba = matrix.occurrence_array("Med", &[1, 0], true).unwrap();
        assert_eq!(ab, ba);
        assert_eq!(matrix.occurrence_array_all("Med", true), ab);
    }

    #[test]
    fn test_subset_out_of_range() {
        let matrix = AgreementMatrix::new(doc());
        let err = matrix.occurrence_array("Med", &[0, 2], true).unwrap_err();
        assert!(matches!(err, AgreementError::IndexOutOfRange { index: 2, max: 1 }));
    }

    #[test]
    fn test_spans_past_document_end_are_clamped() {
        let mut annotations = BTreeMap::new();
        annotations.insert(
            "a".to_string(),
            SpanIndex::from_instances(vec![SpanInstance::new("T1", "Med", vec![Span::new(2, 40)], "")]),
        );
        let doc = Arc::new(AnnotatedDocument::with_annotations("d", "abcd", annotations));
        let matrix = AgreementMatrix::new(doc);
        assert_eq!(matrix.occurrence_array("Med", &[0], false).unwrap().counts(), &[0, 0, 1, 1]);
    }

    #[test]
    fn test_unknown_label_is_all_zero() {
        let matrix = AgreementMatrix::new(doc());
        let array = matrix.occurrence_array("Reason", &[0, 1], false).unwrap();
        assert_eq!(array.max(), 0);
        assert_eq!(array.len(), 8);
    }
}
