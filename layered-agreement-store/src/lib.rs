//! Instance and token agreement computed against an annotation store.
//!
//! Unlike the centroid-based scores of `layered-agreement`, these scores are
//! counted from rows of a relational annotation table. [`InstanceAgreement`]
//! requires identical `(begin, end, sentence)`; [`TokenAgreement`] accepts
//! containment within a sentence. Both sum counts over every annotator pair
//! and report `2·tp / (2·tp + errors) / annotators`.
//!
//! ```
//! use layered_agreement_store::{AnnotationRow, InstanceAgreement, MemoryStore};
//! use std::sync::Arc;
//!
//! let row = |annotator: &str, begin, end| AnnotationRow {
//!     id: "T1".into(),
//!     annotator: annotator.into(),
//!     begin,
//!     end,
//!     text: String::new(),
//!     sentence: 0,
//!     document: "2".into(),
//!     label: "Medication".into(),
//! };
//! let store = MemoryStore::from_rows(vec![row("0", 4, 9), row("1", 4, 9)]);
//! let agreement = InstanceAgreement::new(["0", "1"], Arc::new(store));
//! let labels = vec!["Medication".to_string()];
//! assert_eq!(agreement.agreement_fscore(&labels, "2").unwrap(), 0.5);
//! ```

mod config;
mod errors;
mod instance;
mod memory;
mod sqlite;
mod store;
mod token;

pub use config::AnnotationTableConfig;
pub use errors::{StoreError, StoreResult};
pub use instance::{InstanceAgreement, InstanceCounts, DEFAULT_DECIMALS};
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;
pub use store::{AnnotationRow, AnnotationStore, InstanceGroup, PairQuery, RowKey, SentencePair};
pub use token::{TokenAgreement, TokenCounts};
