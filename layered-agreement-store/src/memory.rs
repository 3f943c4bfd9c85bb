//! A store over rows held in memory.

use std::collections::BTreeMap;
use std::path::Path;

use layered_agreement::{load_all_fixtures, AnnotatedDocument, SentenceSplitter};

use crate::{AnnotationRow, AnnotationStore, InstanceGroup, PairQuery, SentencePair, StoreResult};

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    rows: Vec<AnnotationRow>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_rows(rows: Vec<AnnotationRow>) -> Self {
        Self { rows }
    }

    /// One row per span instance of every annotator. The sentence is the one
    /// holding the instance's first character; instances starting outside
    /// every sentence get no row.
    pub fn from_document(document: &AnnotatedDocument, splitter: &dyn SentenceSplitter) -> Self {
        let sentences = splitter.split(document.text(false));
        let mut rows = Vec::new();
        for (index, annotator) in document.annotators().iter().enumerate() {
            let Some(spans) = document.spans(index) else {
                continue;
            };
            for inst in spans.iter() {
                let Some(sentence) = sentences
                    .iter()
                    .position(|&(begin, end)| begin <= inst.begin() && inst.begin() < end)
                else {
                    log::warn!(
                        "{} of annotator {} in document {} starts outside every sentence; skipping",
                        inst.id,
                        annotator,
                        document.id()
                    );
                    continue;
                };
                rows.push(AnnotationRow {
                    id: inst.id.clone(),
                    annotator: annotator.to_string(),
                    begin: inst.begin(),
                    end: inst.end(),
                    text: inst.text.clone(),
                    sentence: sentence as i64,
                    document: document.id().to_string(),
                    label: inst.label.clone(),
                });
            }
        }
        log::debug!("memory store for document {}: {} rows", document.id(), rows.len());
        Self { rows }
    }

    /// Rows of every TOML document fixture in `dir`.
    pub fn load_fixtures(dir: &Path, splitter: &dyn SentenceSplitter) -> StoreResult<Self> {
        let mut store = Self::new();
        for document in load_all_fixtures(dir)? {
            store.rows.extend(Self::from_document(&document, splitter).rows);
        }
        Ok(store)
    }

    pub fn insert(&mut self, row: AnnotationRow) {
        self.rows.push(row);
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    fn selected(&self, query: &PairQuery<'_>) -> Vec<&AnnotationRow> {
        self.rows.iter().filter(|row| query.selects(row)).collect()
    }
}

impl AnnotationStore for MemoryStore {
    fn rows(&self, query: &PairQuery<'_>) -> StoreResult<Vec<AnnotationRow>> {
        let mut rows: Vec<AnnotationRow> = self.selected(query).into_iter().cloned().collect();
        rows.sort_by(|a, b| (a.begin, a.end, &a.annotator, &a.id).cmp(&(b.begin, b.end, &b.annotator, &b.id)));
        Ok(rows)
    }

    fn instance_groups(&self, query: &PairQuery<'_>) -> StoreResult<Vec<InstanceGroup>> {
        let mut groups: BTreeMap<(usize, usize, i64), InstanceGroup> = BTreeMap::new();
        for row in self.selected(query) {
            let group = groups
                .entry((row.begin, row.end, row.sentence))
                .or_insert_with(|| InstanceGroup {
                    begin: row.begin,
                    end: row.end,
                    sentence: row.sentence,
                    annotators: Vec::new(),
                    rows: 0,
                });
            group.rows += 1;
            if let Err(at) = group.annotators.binary_search(&row.annotator) {
                group.annotators.insert(at, row.annotator.clone());
            }
        }
        Ok(groups.into_values().collect())
    }

    fn same_sentence_pairs(&self, query: &PairQuery<'_>) -> StoreResult<Vec<SentencePair>> {
        let rows = self.rows(query)?;
        let (first, second): (Vec<&AnnotationRow>, Vec<&AnnotationRow>) =
            rows.iter().partition(|row| row.annotator == query.first);

        let mut pairs = Vec::new();
        for a in &first {
            for b in second.iter().filter(|b| b.sentence == a.sentence) {
                pairs.push(SentencePair {
                    sentence: a.sentence,
                    first: AnnotationRow::clone(a),
                    second: AnnotationRow::clone(b),
                    contained: a.contains(b) || b.contains(a),
                });
            }
        }
        Ok(pairs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use layered_agreement::{parse_fixture, UnicodeSentenceSplitter};

    fn row(annotator: &str, id: &str, begin: usize, end: usize, sentence: i64) -> AnnotationRow {
        AnnotationRow {
            id: id.into(),
            annotator: annotator.into(),
            begin,
            end,
            text: String::new(),
            sentence,
            document: "2".into(),
            label: "Medication".into(),
        }
    }

    #[test]
    fn test_groups_collect_distinct_annotators() {
        let store = MemoryStore::from_rows(vec![
            row("0", "T1", 4, 9, 0),
            row("1", "T1", 4, 9, 0),
            row("1", "T2", 4, 9, 0),
            row("1", "T3", 12, 15, 0),
            row("2", "T1", 12, 15, 0),
        ]);
        let labels = vec!["Medication".to_string()];
        let query = PairQuery::new("2", &labels, "0", "1").unwrap();
        let groups = store.instance_groups(&query).unwrap();
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].annotators, vec!["0", "1"]);
        assert_eq!(groups[0].rows, 3);
        assert_eq!(groups[1].annotators, vec!["1"]);
    }

    #[test]
    fn test_pairs_stay_within_sentence() {
        let store = MemoryStore::from_rows(vec![row("0", "T1", 0, 9, 0), row("1", "T1", 2, 5, 0), row("1", "T2", 20, 25, 1)]);
        let labels = vec!["Medication".to_string()];
        let query = PairQuery::new("2", &labels, "0", "1").unwrap();
        let pairs = store.same_sentence_pairs(&query).unwrap();
        assert_eq!(pairs.len(), 1);
        assert!(pairs[0].contained);
        assert_eq!(pairs[0].second.id, "T1");
    }

    #[test]
    fn test_from_document_assigns_sentences() {
        let doc = parse_fixture(
            r#"
id = "2"
text = "Take Aspirin daily.\nStop Daraprim now."

[[annotators]]
name = "0"
brat = "T1\tMedication 5 12\tAspirin\nT2\tMedication 25 33\tDaraprim\n"
"#,
        )
        .unwrap();
        let store = MemoryStore::from_document(&doc, &UnicodeSentenceSplitter::default());
        assert_eq!(store.len(), 2);
        let sentences: Vec<i64> = store.rows.iter().map(|r| r.sentence).collect();
        assert_eq!(sentences, vec![0, 1]);
        assert_eq!(store.rows[1].text, "Daraprim");
    }

    #[test]
    fn test_from_document_skips_spans_outside_sentences() {
        // offsets 20..24 lie in the trailing whitespace
        let doc = parse_fixture(
            r#"
id = "2"
text = "Take Aspirin daily.     "

[[annotators]]
name = "0"
brat = "T1\tMedication 5 12\tAspirin\nT2\tMedication 20 24\t    \n"
"#,
        )
        .unwrap();
        let store = MemoryStore::from_document(&doc, &UnicodeSentenceSplitter::default());
        assert_eq!(store.len(), 1);
        assert_eq!(store.rows[0].id, "T1");
    }

    #[test]
    fn test_load_fixtures() {
        let dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("../fixtures");
        let store = MemoryStore::load_fixtures(&dir, &UnicodeSentenceSplitter::default()).unwrap();
        let labels = vec!["Medication".to_string()];
        let query = PairQuery::new("02", &labels, "a", "c").unwrap();
        let pairs = store.same_sentence_pairs(&query).unwrap();
        // Metformin in the first sentence, Lisinopril in the second
        assert_eq!(pairs.len(), 2);
        assert!(pairs.iter().all(|p| p.contained));
        assert_eq!(pairs[1].sentence, 1);
    }

    #[test]
    fn test_load_fixtures_missing_dir() {
        let err = MemoryStore::load_fixtures(Path::new("/nonexistent"), &UnicodeSentenceSplitter::default()).unwrap_err();
        assert!(matches!(err, crate::StoreError::Agreement(_)));
    }
}
