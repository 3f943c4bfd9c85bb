//! Names of the annotation table and its columns.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::{StoreError, StoreResult};

static IDENTIFIER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("Invalid identifier regex"));

/// Where annotations live in the relational store.
///
/// Every name is spliced into SQL, so each one must be a plain identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnnotationTableConfig {
    pub table: String,
    pub id: String,
    pub annotator: String,
    pub begin: String,
    pub end: String,
    pub text: String,
    pub sentence: String,
    pub document: String,
    pub label: String,
}

impl Default for AnnotationTableConfig {
    fn default() -> Self {
        Self {
            table: "entities".into(),
            id: "id".into(),
            annotator: "annotator".into(),
            begin: "begin".into(),
            end: "end".into(),
            text: "text".into(),
            sentence: "sentence".into(),
            document: "document".into(),
            label: "type".into(),
        }
    }
}

impl AnnotationTableConfig {
    pub fn with_table(mut self, table: impl Into<String>) -> Self {
        self.table = table.into();
        self
    }

    pub fn with_label_column(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    fn names(&self) -> [(&'static str, &str); 9] {
        [
            ("table", self.table.as_str()),
            ("id", self.id.as_str()),
            ("annotator", self.annotator.as_str()),
            ("begin", self.begin.as_str()),
            ("end", self.end.as_str()),
            ("text", self.text.as_str()),
            ("sentence", self.sentence.as_str()),
            ("document", self.document.as_str()),
            ("label", self.label.as_str()),
        ]
    }

    pub fn validate(&self) -> StoreResult<()> {
        for (field, name) in self.names() {
            if !IDENTIFIER.is_match(name) {
                return Err(StoreError::Config(format!(
                    "`{}` is not a valid SQL identifier for {}",
                    name, field
                )));
            }
        }
        Ok(())
    }

    /// Parse and validate a TOML document. Missing keys take defaults.
    pub fn from_toml_str(content: &str) -> StoreResult<Self> {
        let config: Self = toml::from_str(content).map_err(|e| StoreError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> StoreResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| StoreError::Load {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Self::from_toml_str(&content)
    }

    /// Double-quoted names; `begin` and `end` are SQL keywords.
    pub(crate) fn quoted(&self) -> QuotedNames {
        let q = |name: &str| format!("\"{}\"", name);
        QuotedNames {
            table: q(&self.table),
            id: q(&self.id),
            annotator: q(&self.annotator),
            begin: q(&self.begin),
            end: q(&self.end),
            text: q(&self.text),
            sentence: q(&self.sentence),
            document: q(&self.document),
            label: q(&self.label),
        }
    }
}

pub(crate) struct QuotedNames {
    pub table: String,
    pub id: String,
    pub annotator: String,
    pub begin: String,
    pub end: String,
    pub text: String,
    pub sentence: String,
    pub document: String,
    pub label: String,
}
