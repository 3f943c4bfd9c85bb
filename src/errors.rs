//! Error types for agreement computation.
//!
//! Degenerate inputs (no annotators, no spans for a label) are not errors;
//! they surface as [`Metric::Undefined`](crate::Metric::Undefined) or `0.0`.

use thiserror::Error;

/// Errors that can occur while ingesting annotations or computing agreement.
#[derive(Debug, Error)]
pub enum AgreementError {
    /// An unrecognized match strategy was requested.
    #[error("invalid match type `{0}`; expected one of: strict, approximate, one_all")]
    InvalidMatchType(String),

    /// An unrecognized error category was requested.
    #[error("invalid error type `{0}`; expected one of: false_neg, false_pos, both")]
    InvalidErrorType(String),

    /// An annotator-subset index exceeds the registered annotator count.
    #[error("annotator index {index} is out of range; {max} is the largest allowed index")]
    IndexOutOfRange { index: usize, max: usize },

    /// An annotator name is not part of the document's annotator set.
    #[error("unknown annotator `{0}`")]
    UnknownAnnotator(String),

    /// Error parsing annotation input.
    #[error("parse error at line {line}: {message}")]
    Parse { line: usize, message: String },

    /// Error loading an input file.
    #[error("failed to load {path}: {message}")]
    Load { path: String, message: String },

    /// Configuration rejected during validation.
    #[error("invalid configuration: {0}")]
    Config(String),
}

/// Result type for agreement operations.
pub type AgreementResult<T> = Result<T, AgreementError>;
