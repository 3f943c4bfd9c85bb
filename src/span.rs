//! Labeled character spans and per-annotator span collections.
//!
//! Offsets are character (Unicode scalar) indices into the shared document
//! text. A [`Span`] is half-open when painted into occurrence arrays.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::{AgreementError, AgreementResult};

/// A single `[begin, end)` fragment of an annotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Span {
    pub begin: usize,
    pub end: usize,
}

impl Span {
    /// Create a span. Reversed offsets are logged and swapped.
    pub fn new(begin: usize, end: usize) -> Self {
        if begin <= end {
            Self { begin, end }
        } else {
            log::warn!("reversed span offsets {}..{}; swapping", begin, end);
            Self {
                begin: end,
                end: begin,
            }
        }
    }

    pub fn len(&self) -> usize {
        self.end - self.begin
    }

    pub fn is_empty(&self) -> bool {
        self.begin == self.end
    }

    /// Whether `other` lies completely inside this span.
    pub fn contains_span(&self, other: &Span) -> bool {
        self.begin <= other.begin && other.end <= self.end
    }

    pub fn overlaps(&self, other: &Span) -> bool {
        self.begin < other.end && other.begin < self.end
    }
}

/// Sort fragments and merge those that overlap or are separated by at most
/// one character.
pub fn merge_fragments(fragments: impl IntoIterator<Item = Span>) -> Vec<Span> {
    let mut sorted: Vec<Span> = fragments.into_iter().collect();
    sorted.sort();

    let mut merged: Vec<Span> = Vec::with_capacity(sorted.len());
    for fragment in sorted {
        match merged.last_mut() {
            Some(last) if fragment.begin <= last.end + 1 => {
                last.end = last.end.max(fragment.end);
            }
            _ => merged.push(fragment),
        }
    }
    merged
}

/// One logical annotation: a label over one or more fragments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpanInstance {
    pub id: String,
    pub label: String,
    fragments: Vec<Span>,
    pub text: String,
}

impl SpanInstance {
    /// Fragments are normalized on construction (see [`merge_fragments`]).
    pub fn new(
        id: impl Into<String>,
        label: impl Into<String>,
        fragments: impl IntoIterator<Item = Span>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            fragments: merge_fragments(fragments),
            text: text.into(),
        }
    }

    pub fn fragments(&self) -> &[Span] {
        &self.fragments
    }

    /// Start of the first fragment.
    pub fn begin(&self) -> usize {
        self.fragments.first().map_or(0, |f| f.begin)
    }

    /// End of the last fragment.
    pub fn end(&self) -> usize {
        self.fragments.last().map_or(0, |f| f.end)
    }
}

/// All span instances one annotator produced for a document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpanIndex {
    instances: Vec<SpanInstance>,
}

impl SpanIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_instances(instances: Vec<SpanInstance>) -> Self {
        Self { instances }
    }

    pub fn push(&mut self, instance: SpanInstance) {
        self.instances.push(instance);
    }

    /// All instances carrying `label`, in insertion order.
    pub fn by_label<'a>(&'a self, label: &'a str) -> impl Iterator<Item = &'a SpanInstance> + 'a {
        self.instances.iter().filter(move |inst| inst.label == label)
    }

    /// Number of instances per label.
    pub fn label_counts(&self) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for inst in &self.instances {
            *counts.entry(inst.label.clone()).or_insert(0) += 1;
        }
        counts
    }

    pub fn get(&self, id: &str) -> Option<&SpanInstance> {
        self.instances.iter().find(|inst| inst.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &SpanInstance> {
        self.instances.iter()
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }
}

/// Sorted, deduplicated annotator identifiers.
///
/// Order only provides stable indexing into matrices and tables.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AnnotatorSet {
    names: Vec<String>,
}

impl AnnotatorSet {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut names: Vec<String> = names.into_iter().map(Into::into).collect();
        names.sort();
        names.dedup();
        Self { names }
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.names.binary_search_by(|n| n.as_str().cmp(name)).ok()
    }

    pub fn name(&self, index: usize) -> Option<&str> {
        self.names.get(index).map(String::as_str)
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    /// Every index except `index`.
    pub fn others(&self, index: usize) -> Vec<usize> {
        (0..self.names.len()).filter(|&i| i != index).collect()
    }

    /// Fail with [`AgreementError::IndexOutOfRange`] if any index is unknown.
    pub fn check_indices(&self, indices: &[usize]) -> AgreementResult<()> {
        match indices.iter().copied().max() {
            Some(index) if index >= self.names.len() => Err(AgreementError::IndexOutOfRange {
                index,
                max: self.names.len().saturating_sub(1),
            }),
            _ => Ok(()),
        }
    }

    /// Unordered pairs `(i, j)` with `i < j`.
    pub fn pairs(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        let n = self.names.len();
        (0..n).flat_map(move |i| ((i + 1)..n).map(move |j| (i, j)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_adjacent_fragments() {
        let merged = merge_fragments(vec![Span::new(2505, 2509), Span::new(2493, 2504)]);
        assert_eq!(merged, vec![Span::new(2493, 2509)]);
    }

    #[test]
    fn test_merge_keeps_distant_fragments() {
        let merged = merge_fragments(vec![Span::new(0, 4), Span::new(6, 9), Span::new(10, 12)]);
        assert_eq!(merged, vec![Span::new(0, 4), Span::new(6, 12)]);
    }

    #[test]
    fn test_merge_overlapping_fragments() {
        let merged = merge_fragments(vec![Span::new(0, 5), Span::new(3, 8)]);
        assert_eq!(merged, vec![Span::new(0, 8)]);
    }

    #[test]
    fn test_reversed_span_is_normalized() {
        let span = Span::new(9, 3);
        assert_eq!((span.begin, span.end), (3, 9));
        assert_eq!(span.len(), 6);
        assert!(Span::new(4, 4).is_empty());
    }

    #[test]
    fn test_span_index_by_label() {
        let index = SpanIndex::from_instances(vec![
            SpanInstance::new("T1", "Medication", vec![Span::new(0, 8)], "Daraprim"),
            SpanInstance::new("T2", "Dose", vec![Span::new(9, 14)], "25 mg"),
            SpanInstance::new("T3", "Medication", vec![Span::new(20, 27)], "Aspirin"),
        ]);
        let ids: Vec<_> = index.by_label("Medication").map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["T1", "T3"]);
        assert_eq!(index.label_counts().get("Dose"), Some(&1));
        assert_eq!(index.get("T2").map(|i| i.begin()), Some(9));
    }

    #[test]
    fn test_annotator_set_sorted_and_deduplicated() {
        let set = AnnotatorSet::new(vec!["b", "a", "c", "a"]);
        assert_eq!(set.names(), &["a", "b", "c"]);
        assert_eq!(set.index_of("c"), Some(2));
        assert_eq!(set.index_of("z"), None);
        assert_eq!(set.others(1), vec![0, 2]);
        assert_eq!(set.pairs().collect::<Vec<_>>(), vec![(0, 1), (0, 2), (1, 2)]);
    }

    #[test]
    fn test_check_indices() {
        let set = AnnotatorSet::new(vec!["a", "b"]);
        assert!(set.check_indices(&[0, 1]).is_ok());
        assert!(set.check_indices(&[]).is_ok());
        match set.check_indices(&[0, 2]) {
            Err(AgreementError::IndexOutOfRange { index, max }) => {
                assert_eq!((index, max), (2, 1));
            }
            other => panic!("unexpected: {:?}", other),
        }
    }
}
