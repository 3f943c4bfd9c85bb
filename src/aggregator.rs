//! Per-document agreement: score tables and their disagreements, memoized
//! per (label, match type, threshold, boundary).

use log::{debug, warn};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::matching::{approximate_match, one_vs_all_match, strict_match, ApproximateWindow, MatchOutcome};
use crate::{
    filter_errors, AgreementConfig, AgreementResult, AgreementScoreTable, AnnotatedDocument, Centroid,
    CentroidExtractor, Column, ErrorEntry, ErrorKind, ErrorSet, ErrorType, MatchType, Metric, PrecisionRecall,
    Scores, SpanInstance,
};

/// Cache key of a score table.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ScoreKey {
    pub label: String,
    pub match_type: MatchType,
    pub threshold: u32,
    pub boundary: i32,
}

impl ScoreKey {
    pub fn new(label: impl Into<String>, match_type: MatchType, threshold: u32, boundary: i32) -> Self {
        Self {
            label: label.into(),
            match_type,
            threshold,
            boundary,
        }
    }

    /// Boundary as a centroid noise floor; negative adjustments floor at 0.
    pub fn noise_floor(&self) -> u32 {
        u32::try_from(self.boundary).unwrap_or(0)
    }
}

/// A computed table with the disagreements found while filling it.
#[derive(Debug)]
pub struct ScoreEntry {
    pub table: Arc<AgreementScoreTable>,
    pub errors: ErrorSet,
}

/// Agreement scoring for one document.
pub struct AgreementAggregator {
    document: Arc<AnnotatedDocument>,
    config: AgreementConfig,
    extractor: CentroidExtractor,
    cache: Mutex<HashMap<ScoreKey, Arc<ScoreEntry>>>,
    computations: AtomicUsize,
}

impl AgreementAggregator {
    pub fn new(document: Arc<AnnotatedDocument>, config: AgreementConfig) -> AgreementResult<Self> {
        config.validate()?;
        Ok(Self {
            extractor: CentroidExtractor::new(Arc::clone(&document), config.strip_whitespace),
            document,
            config,
            cache: Mutex::new(HashMap::new()),
            computations: AtomicUsize::new(0),
        })
    }

    pub fn document(&self) -> &Arc<AnnotatedDocument> {
        &self.document
    }

    pub fn config(&self) -> &AgreementConfig {
        &self.config
    }

    pub fn extractor(&self) -> &CentroidExtractor {
        &self.extractor
    }

    /// Number of tables computed so far (cache misses).
    pub fn computations(&self) -> usize {
        self.computations.load(Ordering::Relaxed)
    }

    /// Score table for `label`, or `None` when no annotator used the label.
    pub fn score_table(
        &self,
        label: &str,
        match_type: MatchType,
        threshold: u32,
        boundary: i32,
    ) -> AgreementResult<Option<Arc<AgreementScoreTable>>> {
        let key = ScoreKey::new(label, match_type, threshold, boundary);
        Ok(self.entry(&key)?.map(|entry| Arc::clone(&entry.table)))
    }

    /// Score table using the configured threshold and boundary.
    pub fn default_score_table(
        &self,
        label: &str,
        match_type: MatchType,
    ) -> AgreementResult<Option<Arc<AgreementScoreTable>>> {
        self.score_table(label, match_type, self.config.threshold, self.config.boundary)
    }

    /// Disagreements behind a score table.
    ///
    /// With a focus annotator, false positives are restricted to those the
    /// annotator produced and false negatives to those scored against it.
    /// An unknown focus annotator is ignored.
    pub fn errors(
        &self,
        label: &str,
        match_type: MatchType,
        error_type: ErrorType,
        threshold: u32,
        boundary: i32,
        focus: Option<&str>,
    ) -> AgreementResult<Vec<ErrorEntry>> {
        let focus = focus.filter(|name| {
            let known = self.document.annotators().index_of(name).is_some();
            if !known {
                warn!("focus annotator {} is not annotating document {}; ignoring", name, self.document.id());
            }
            known
        });
        let key = ScoreKey::new(label, match_type, threshold, boundary);
        Ok(match self.entry(&key)? {
            Some(entry) => filter_errors(&entry.errors, error_type, focus).cloned().collect(),
            None => Vec::new(),
        })
    }

    fn entry(&self, key: &ScoreKey) -> AgreementResult<Option<Arc<ScoreEntry>>> {
        if !self.document.has_label(&key.label) {
            return Ok(None);
        }
        let mut cache = self.cache.lock();
        if let Some(entry) = cache.get(key) {
            return Ok(Some(Arc::clone(entry)));
        }
        debug!("computing {:?} for document {}", key, self.document.id());
        let entry = Arc::new(match key.match_type {
            MatchType::Strict | MatchType::Approximate => self.pairwise(key),
            MatchType::OneVsAll => self.one_vs_all(key)?,
        });
        self.computations.fetch_add(1, Ordering::Relaxed);
        cache.insert(key.clone(), Arc::clone(&entry));
        Ok(Some(entry))
    }

    fn new_table(&self, key: &ScoreKey, columns: Vec<Column>) -> AgreementScoreTable {
        AgreementScoreTable::new(
            key.label.clone(),
            key.match_type,
            key.threshold,
            key.boundary,
            self.config.decimals,
            self.document.annotators().names().to_vec(),
            columns,
        )
    }

    fn pairwise(&self, key: &ScoreKey) -> ScoreEntry {
        let names = self.document.annotators().names();
        let decimals = self.config.decimals;
        let mut columns: Vec<Column> = names.iter().cloned().map(Column::Annotator).collect();
        columns.push(Column::All);
        let mut table = self.new_table(key, columns);
        let mut errors = ErrorSet::new();

        let instances: Vec<Vec<&SpanInstance>> = (0..names.len())
            .map(|i| {
                self.document
                    .spans(i)
                    .map(|index| index.by_label(&key.label).collect())
                    .unwrap_or_default()
            })
            .collect();
        let window = ApproximateWindow::new(self.document.mean_word_length(), key.boundary, self.document.char_len());

        for (r, row) in names.iter().enumerate() {
            let mut precisions = Vec::new();
            let mut recalls = Vec::new();
            for (c, column) in names.iter().enumerate() {
                if r == c {
                    continue;
                }
                // the column annotator is the reference side
                let outcome: MatchOutcome = match key.match_type {
                    MatchType::Approximate => approximate_match(&instances[c], &instances[r], &window),
                    _ => strict_match(&instances[c], &instances[r]),
                };
                for &i in &outcome.unmatched_candidate {
                    errors.insert(ErrorEntry::from_instance(ErrorKind::FalsePositive, instances[r][i], row, column));
                }
                for &i in &outcome.unmatched_reference {
                    errors.insert(ErrorEntry::from_instance(ErrorKind::FalseNegative, instances[c][i], column, row));
                }

                let scores = Scores::from_pr(outcome.scores, decimals);
                precisions.push(scores.precision);
                recalls.push(scores.recall);
                table.set(row, &Column::Annotator(column.clone()), scores);
            }
            let averaged = PrecisionRecall::new(Metric::mean(precisions), Metric::mean(recalls));
            table.set(row, &Column::All, Scores::from_pr(averaged, decimals));
        }

        ScoreEntry {
            table: Arc::new(table),
            errors,
        }
    }

    fn one_vs_all(&self, key: &ScoreKey) -> AgreementResult<ScoreEntry> {
        let annotators = self.document.annotators();
        let floor = key.noise_floor();
        let mut table = self.new_table(key, vec![Column::Other]);
        let mut errors = ErrorSet::new();

        for (r, row) in annotators.names().iter().enumerate() {
            let others = annotators.others(r);
            let aggregate: Vec<Arc<Centroid>> = self
                .extractor
                .centroids(&key.label, &others)?
                .iter()
                .filter(|c| c.qualifies(key.threshold, floor).is_some())
                .cloned()
                .collect();
            let individual = self.extractor.centroids(&key.label, &[r])?;
            let outcome = one_vs_all_match(&individual, &aggregate, floor);

            let other_names: Vec<String> = others
                .iter()
                .filter_map(|&i| annotators.name(i))
                .map(str::to_string)
                .collect();
            for &i in &outcome.unmatched_reference {
                errors.insert(ErrorEntry::from_centroid(
                    ErrorKind::FalseNegative,
                    &aggregate[i],
                    floor,
                    &self.document,
                    vec![row.clone()],
                ));
            }
            for &j in &outcome.unmatched_candidate {
                errors.insert(ErrorEntry::from_centroid(
                    ErrorKind::FalsePositive,
                    &individual[j],
                    0,
                    &self.document,
                    other_names.clone(),
                ));
            }

            table.set(row, &Column::Other, Scores::from_pr(outcome.scores, self.config.decimals));
        }

        Ok(ScoreEntry {
            table: Arc::new(table),
            errors,
        })
    }
}
