//! TOML document fixtures: a text plus every annotator's spans.
//!
//! ```toml
//! id = "01"
//! text = "Take Aspirin daily."
//!
//! [[annotators]]
//! name = "a"
//!
//! [[annotators.spans]]
//! id = "T1"
//! label = "Medication"
//! fragments = [[5, 12]]
//! ```
//!
//! An annotator may give its spans as brat standoff text in `brat`
//! instead of (or in addition to) `spans`.

use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::{parse_brat, AgreementError, AgreementResult, AnnotatedDocument, Span, SpanIndex, SpanInstance};

#[derive(Debug, Clone, Deserialize)]
pub struct DocumentFixture {
    pub id: String,
    pub text: String,
    #[serde(default)]
    pub annotators: Vec<AnnotatorFixture>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AnnotatorFixture {
    pub name: String,
    #[serde(default)]
    pub spans: Vec<SpanFixture>,
    #[serde(default)]
    pub brat: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SpanFixture {
    pub id: String,
    pub label: String,
    pub fragments: Vec<(usize, usize)>,
    /// Covered text; sliced from the document when absent.
    #[serde(default)]
    pub text: Option<String>,
}

impl DocumentFixture {
    pub fn into_document(self) -> AgreementResult<AnnotatedDocument> {
        let mut document = AnnotatedDocument::new(self.id, self.text);
        for annotator in self.annotators {
            let mut index = match &annotator.brat {
                Some(content) => parse_brat(content)?,
                None => SpanIndex::new(),
            };
            for span in annotator.spans {
                let fragments: Vec<Span> = span.fragments.iter().map(|&(b, e)| Span::new(b, e)).collect();
                let text = match span.text {
                    Some(text) => text,
                    None => fragments
                        .iter()
                        .map(|f| document.slice(*f))
                        .collect::<Vec<_>>()
                        .join(" "),
                };
                index.push(SpanInstance::new(span.id, span.label, fragments, text));
            }
            document.add_annotator(annotator.name, index);
        }
        Ok(document)
    }
}

/// Parse a fixture from TOML.
pub fn parse_fixture(content: &str) -> AgreementResult<AnnotatedDocument> {
    let fixture: DocumentFixture = toml::from_str(content).map_err(|e| AgreementError::Parse {
        line: 0,
        message: e.to_string(),
    })?;
    fixture.into_document()
}

/// Load a single fixture file.
pub fn load_fixture(path: &Path) -> AgreementResult<AnnotatedDocument> {
    let content = fs::read_to_string(path).map_err(|e| AgreementError::Load {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;
    parse_fixture(&content)
}

/// Load every `*.toml` fixture in `dir`, ordered by file name.
pub fn load_all_fixtures(dir: &Path) -> AgreementResult<Vec<AnnotatedDocument>> {
    let load_err = |e: std::io::Error| AgreementError::Load {
        path: dir.display().to_string(),
        message: e.to_string(),
    };
    let mut paths = Vec::new();
    for entry in fs::read_dir(dir).map_err(load_err)? {
        let path = entry.map_err(load_err)?.path();
        if path.extension().map_or(false, |e| e == "toml") {
            paths.push(path);
        }
    }
    paths.sort();
    paths.iter().map(|p| load_fixture(p)).collect()
}
