//! Inter-annotator agreement over span annotations.
//!
//! Several annotators mark labeled character spans on the same text. This
//! crate measures how well they agree:
//!
//! - [`AgreementMatrix`] counts, per character, how many annotators in a
//!   subset cover it with a label ([`OccurrenceArray`]).
//! - [`CentroidExtractor`] finds local maxima in those counts and grows
//!   noise-tolerant extents around them ([`Centroid`]).
//! - [`matching`] scores pairs of annotators strictly, approximately, or
//!   one annotator against the centroids of all others.
//! - [`AgreementAggregator`] memoizes [`AgreementScoreTable`]s and their
//!   [`ErrorSet`]s per document; [`BatchComparison`] averages tables across
//!   documents.
//!
//! Undefined precision or recall is a value ([`Metric::Undefined`]), not an
//! error.
//!
//! ```
//! use layered_agreement::{AgreementAggregator, AgreementConfig, MatchType, parse_fixture};
//! use std::sync::Arc;
//!
//! let doc = parse_fixture(r#"
//! id = "01"
//! text = "Take Aspirin daily."
//!
//! [[annotators]]
//! name = "a"
//! brat = "T1\tMedication 5 12\tAspirin\n"
//!
//! [[annotators]]
//! name = "b"
//! brat = "T1\tMedication 5 18\tAspirin daily\n"
//! "#).unwrap();
//!
//! let aggregator = AgreementAggregator::new(Arc::new(doc), AgreementConfig::default()).unwrap();
//! let table = aggregator
//!     .score_table("Medication", MatchType::Approximate, 0, 0)
//!     .unwrap()
//!     .unwrap();
//! println!("{}", table);
//! ```

mod aggregator;
mod batch;
mod brat;
mod centroid;
mod config;
mod display;
mod document;
mod error_set;
mod errors;
mod fixture;
pub mod matching;
mod metric;
mod occurrence;
mod sentence;
mod span;
mod table;


pub use aggregator::{AgreementAggregator, ScoreEntry, ScoreKey};
pub use batch::BatchComparison;
pub use brat::{load_brat, parse_brat};
pub use centroid::{
    find_plateaus, grow_boundary, BoundaryProfile, Centroid, CentroidExtractor, CentroidView, Checkpoint, Direction,
    Plateau,
};
pub use config::{AgreementConfig, MAX_DECIMALS};
pub use display::CentroidDisplay;
pub use document::{AnnotatedDocument, LabelEntry, SentenceAnnotation, SentenceComparison, WhitespaceMask};
pub use error_set::{filter_errors, ErrorEntry, ErrorKind, ErrorLocation, ErrorSet};
pub use errors::{AgreementError, AgreementResult};
pub use fixture::{load_all_fixtures, load_fixture, parse_fixture, AnnotatorFixture, DocumentFixture, SpanFixture};
pub use matching::{ErrorType, MatchOutcome, MatchType};
pub use metric::{f1, round_to, Metric, PrecisionRecall, Scores};
pub use occurrence::{AgreementMatrix, LabelMatrix, OccurrenceArray};
pub use sentence::{SentenceSplitter, UnicodeSentenceSplitter};
pub use span::{merge_fragments, AnnotatorSet, Span, SpanIndex, SpanInstance};
pub use table::{AgreementScoreTable, Column};
