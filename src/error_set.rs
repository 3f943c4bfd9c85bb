//! Disagreements recorded while scoring: the annotations and centroids
//! behind false positives and false negatives.

use serde::Serialize;
use std::collections::BTreeSet;

use crate::{AnnotatedDocument, Centroid, ErrorType, Plateau, Span, SpanInstance};

/// False negative or false positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    FalseNegative,
    FalsePositive,
}

impl ErrorKind {
    pub fn selected_by(&self, error_type: ErrorType) -> bool {
        match error_type {
            ErrorType::Both => true,
            ErrorType::FalseNegative => *self == ErrorKind::FalseNegative,
            ErrorType::FalsePositive => *self == ErrorKind::FalsePositive,
        }
    }
}

/// Where a disagreement sits in the document.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorLocation {
    /// A whole annotation instance, in document offsets.
    Fragments(Vec<Span>),
    /// A centroid, in occurrence-array positions, plus the document span
    /// its extent covers.
    Centroid {
        local_maximum: Plateau,
        extent: Plateau,
        document: Span,
    },
}

/// One unmatched annotation or centroid.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ErrorEntry {
    pub kind: ErrorKind,
    pub label: String,
    pub location: ErrorLocation,
    /// Annotators that produced the unmatched item.
    pub owners: Vec<String>,
    /// Annotators it was compared against.
    pub against: Vec<String>,
    pub text: String,
}

impl ErrorEntry {
    pub fn from_instance(kind: ErrorKind, instance: &SpanInstance, owner: &str, against: &str) -> Self {
        Self {
            kind,
            label: instance.label.clone(),
            location: ErrorLocation::Fragments(instance.fragments().to_vec()),
            owners: vec![owner.to_string()],
            against: vec![against.to_string()],
            text: instance.text.clone(),
        }
    }

    pub fn from_centroid(
        kind: ErrorKind,
        centroid: &Centroid,
        boundary: u32,
        document: &AnnotatedDocument,
        against: Vec<String>,
    ) -> Self {
        let extent = centroid.extent(boundary);
        let owners = centroid
            .annotators()
            .iter()
            .filter_map(|&i| document.annotators().name(i))
            .map(str::to_string)
            .collect();
        let location = ErrorLocation::Centroid {
            local_maximum: centroid.local_maximum(),
            extent,
            document: document_span(extent, centroid.distribution().is_stripped(), document),
        };
        Self {
            kind,
            label: centroid.label().to_string(),
            location,
            owners,
            against,
            text: centroid.text().to_string(),
        }
    }

    /// Keep false positives produced by `focus` and false negatives scored
    /// against `focus`.
    pub fn involves(&self, focus: &str) -> bool {
        match self.kind {
            ErrorKind::FalsePositive => self.owners.iter().any(|o| o == focus),
            ErrorKind::FalseNegative => self.against.iter().any(|a| a == focus),
        }
    }
}

/// Map a closed interval of (possibly stripped) positions to a half-open
/// document span.
fn document_span(extent: Plateau, stripped: bool, document: &AnnotatedDocument) -> Span {
    if !stripped {
        return Span::new(extent.start, extent.end + 1);
    }
    let mask = document.whitespace_mask();
    match (mask.to_document_offset(extent.start), mask.to_document_offset(extent.end)) {
        (Some(begin), Some(end)) => Span::new(begin, end + 1),
        _ => Span::new(extent.start, extent.end + 1),
    }
}

/// Disagreements of one score table.
pub type ErrorSet = BTreeSet<ErrorEntry>;

/// Select entries by kind and optional focus annotator.
pub fn filter_errors<'a>(
    errors: &'a ErrorSet,
    error_type: ErrorType,
    focus: Option<&'a str>,
) -> impl Iterator<Item = &'a ErrorEntry> + 'a {
    errors
        .iter()
        .filter(move |e| e.kind.selected_by(error_type))
        .filter(move |e| focus.map_or(true, |f| e.involves(f)))
}
