//! Document-level abstraction shared by all annotators.
//!
//! An [`AnnotatedDocument`] owns the source text and one [`SpanIndex`] per
//! annotator. Whitespace-stripped views are computed once and reused for
//! every label.

use once_cell::sync::OnceCell;
use serde::Serialize;
use std::collections::BTreeMap;

use crate::sentence::SentenceSplitter;
use crate::{AgreementError, AgreementResult, AnnotatorSet, Span, SpanIndex};

/// Boolean mask over document characters marking whitespace positions.
///
/// Maps between document offsets and offsets in the whitespace-stripped text.
#[derive(Debug, Clone)]
pub struct WhitespaceMask {
    is_whitespace: Vec<bool>,
    /// Stripped index -> document index.
    kept: Vec<usize>,
}

impl WhitespaceMask {
    pub fn from_text(text: &str) -> Self {
        let is_whitespace: Vec<bool> = text.chars().map(char::is_whitespace).collect();
        let kept = is_whitespace
            .iter()
            .enumerate()
            .filter(|(_, ws)| !**ws)
            .map(|(pos, _)| pos)
            .collect();
        Self { is_whitespace, kept }
    }

    /// Drop every whitespace position from `values`.
    ///
    /// `values` must be aligned with the document characters.
    pub fn strip<T: Copy>(&self, values: &[T]) -> Vec<T> {
        values
            .iter()
            .zip(self.is_whitespace.iter())
            .filter(|(_, ws)| !**ws)
            .map(|(v, _)| *v)
            .collect()
    }

    /// Document offset of a position in the stripped text.
    pub fn to_document_offset(&self, stripped: usize) -> Option<usize> {
        self.kept.get(stripped).copied()
    }

    pub fn stripped_len(&self) -> usize {
        self.kept.len()
    }

    pub fn len(&self) -> usize {
        self.is_whitespace.len()
    }

    pub fn is_empty(&self) -> bool {
        self.is_whitespace.is_empty()
    }
}

/// The same source text annotated independently by several annotators.
pub struct AnnotatedDocument {
    id: String,
    text: String,
    char_len: usize,
    annotators: AnnotatorSet,
    /// Aligned with `annotators`.
    indices: Vec<SpanIndex>,
    whitespace_mask: OnceCell<WhitespaceMask>,
    stripped_text: OnceCell<String>,
}

impl std::fmt::Debug for AnnotatedDocument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnnotatedDocument")
            .field("id", &self.id)
            .field("char_len", &self.char_len)
            .field("annotators", &self.annotators.names())
            .finish()
    }
}

impl AnnotatedDocument {
    /// Create a document without annotators.
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        let text = text.into();
        Self {
            id: id.into(),
            char_len: text.chars().count(),
            text,
            annotators: AnnotatorSet::default(),
            indices: Vec::new(),
            whitespace_mask: OnceCell::new(),
            stripped_text: OnceCell::new(),
        }
    }

    /// Create a document from per-annotator span indices.
    pub fn with_annotations(
        id: impl Into<String>,
        text: impl Into<String>,
        annotations: BTreeMap<String, SpanIndex>,
    ) -> Self {
        let mut doc = Self::new(id, text);
        doc.annotators = AnnotatorSet::new(annotations.keys().cloned());
        doc.indices = annotations.into_values().collect();
        doc
    }

    /// Register an annotator, replacing an existing index of the same name.
    pub fn add_annotator(&mut self, name: impl Into<String>, index: SpanIndex) {
        let name = name.into();
        if let Some(pos) = self.annotators.index_of(&name) {
            self.indices[pos] = index;
            return;
        }
        let mut all: BTreeMap<String, SpanIndex> = self
            .annotators
            .names()
            .iter()
            .cloned()
            .zip(std::mem::take(&mut self.indices))
            .collect();
        all.insert(name, index);
        self.annotators = AnnotatorSet::new(all.keys().cloned());
        self.indices = all.into_values().collect();
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Document text, optionally with every whitespace character removed.
    pub fn text(&self, strip_whitespace: bool) -> &str {
        if strip_whitespace {
            self.stripped_text
                .get_or_init(|| self.text.chars().filter(|c| !c.is_whitespace()).collect())
        } else {
            &self.text
        }
    }

    /// Length of the document in characters.
    pub fn char_len(&self) -> usize {
        self.char_len
    }

    pub fn whitespace_mask(&self) -> &WhitespaceMask {
        self.whitespace_mask
            .get_or_init(|| WhitespaceMask::from_text(&self.text))
    }

    pub fn annotators(&self) -> &AnnotatorSet {
        &self.annotators
    }

    pub fn spans(&self, annotator: usize) -> Option<&SpanIndex> {
        self.indices.get(annotator)
    }

    pub fn spans_of(&self, name: &str) -> AgreementResult<&SpanIndex> {
        self.annotators
            .index_of(name)
            .map(|i| &self.indices[i])
            .ok_or_else(|| AgreementError::UnknownAnnotator(name.to_string()))
    }

    /// Characters in `span`, clamped to the document.
    pub fn slice(&self, span: Span) -> String {
        self.text
            .chars()
            .skip(span.begin)
            .take(span.end.min(self.char_len).saturating_sub(span.begin))
            .collect()
    }

    /// Average word length: non-whitespace characters over whitespace-separated words, rounded
    /// half to even.
    pub fn mean_word_length(&self) -> usize {
        let words = self.text.split_whitespace().count();
        if words == 0 {
            return 0;
        }
        let letters = self.text.chars().filter(|c| !c.is_whitespace()).count();
        (letters as f64 / words as f64).round_ties_even() as usize
    }

    /// Label counts summed over all annotators.
    pub fn label_counts(&self) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for index in &self.indices {
            for (label, n) in index.label_counts() {
                *counts.entry(label).or_insert(0) += n;
            }
        }
        counts
    }

    /// Every label any annotator used, sorted.
    pub fn labels(&self) -> Vec<String> {
        self.label_counts().into_keys().collect()
    }

    /// Whether any annotator used `label`.
    pub fn has_label(&self, label: &str) -> bool {
        self.indices.iter().any(|idx| idx.by_label(label).next().is_some())
    }

    pub fn annotator_label_counts(&self, name: &str) -> AgreementResult<BTreeMap<String, usize>> {
        Ok(self.spans_of(name)?.label_counts())
    }

    /// Distinct `(text, fragments)` annotations of `label` and who produced them.
    pub fn label_inventory(&self, label: &str) -> BTreeMap<LabelEntry, Vec<String>> {
        let mut inventory: BTreeMap<LabelEntry, Vec<String>> = BTreeMap::new();
        for (name, index) in self.annotators.iter().zip(self.indices.iter()) {
            for inst in index.by_label(label) {
                let key = LabelEntry {
                    text: inst.text.clone(),
                    fragments: inst.fragments().to_vec(),
                };
                inventory.entry(key).or_default().push(name.to_string());
            }
        }
        inventory
    }

    /// Sentences containing at least one fragment start, with every annotator's
    /// annotations expressed relative to the sentence.
    pub fn sentence_comparisons(&self, splitter: &dyn SentenceSplitter) -> Vec<SentenceComparison> {
        let mut comparisons = Vec::new();
        for (index, (begin, end)) in splitter.split(&self.text).into_iter().enumerate() {
            let mut annotations: BTreeMap<String, Vec<SentenceAnnotation>> = self
                .annotators
                .iter()
                .map(|name| (name.to_string(), Vec::new()))
                .collect();
            let mut contains_annotation = false;

            for (name, spans) in self.annotators.iter().zip(self.indices.iter()) {
                let mut found: Vec<SentenceAnnotation> = Vec::new();
                for inst in spans.iter() {
                    for fragment in inst.fragments() {
                        if begin <= fragment.begin && fragment.begin <= end {
                            contains_annotation = true;
                            found.push(SentenceAnnotation {
                                id: inst.id.clone(),
                                label: inst.label.clone(),
                                span: Span::new(fragment.begin - begin, fragment.end - begin),
                            });
                        }
                    }
                }
                found.sort_by_key(|a| (a.span, a.id.clone()));
                if let Some(list) = annotations.get_mut(name) {
                    *list = found;
                }
            }

            if contains_annotation {
                comparisons.push(SentenceComparison {
                    index,
                    begin,
                    end,
                    text: self.slice(Span::new(begin, end)),
                    annotations,
                });
            }
        }
        comparisons
    }
}

/// Key of [`AnnotatedDocument::label_inventory`].
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct LabelEntry {
    pub text: String,
    pub fragments: Vec<Span>,
}

/// An annotation fragment positioned relative to its sentence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SentenceAnnotation {
    pub id: String,
    pub label: String,
    pub span: Span,
}

/// One sentence and what each annotator marked inside it.
#[derive(Debug, Clone, Serialize)]
pub struct SentenceComparison {
    pub index: usize,
    pub begin: usize,
    pub end: usize,
    pub text: String,
    pub annotations: BTreeMap<String, Vec<SentenceAnnotation>>,
}
