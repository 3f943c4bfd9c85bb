//! Agreement across a collection of documents.

use log::debug;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::{
    AgreementAggregator, AgreementConfig, AgreementResult, AgreementScoreTable, AnnotatedDocument, AnnotatorSet,
    Column, MatchType, Metric, PrecisionRecall, Scores,
};

/// Aggregators for several documents, keyed by document id.
pub struct BatchComparison {
    config: AgreementConfig,
    documents: BTreeMap<String, AgreementAggregator>,
}

impl BatchComparison {
    pub fn new(config: AgreementConfig) -> AgreementResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            documents: BTreeMap::new(),
        })
    }

    pub fn from_documents<I>(documents: I, config: AgreementConfig) -> AgreementResult<Self>
    where
        I: IntoIterator<Item = AnnotatedDocument>,
    {
        let mut batch = Self::new(config)?;
        for document in documents {
            batch.add_document(document)?;
        }
        Ok(batch)
    }

    /// Add a document, replacing one with the same id.
    pub fn add_document(&mut self, document: AnnotatedDocument) -> AgreementResult<()> {
        let id = document.id().to_string();
        let aggregator = AgreementAggregator::new(Arc::new(document), self.config.clone())?;
        self.documents.insert(id, aggregator);
        Ok(())
    }

    pub fn document(&self, id: &str) -> Option<&AgreementAggregator> {
        self.documents.get(id)
    }

    /// Document ids in order.
    pub fn documents(&self) -> impl Iterator<Item = &str> {
        self.documents.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Label counts summed over every document and annotator.
    pub fn labels(&self) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for aggregator in self.documents.values() {
            for (label, n) in aggregator.document().label_counts() {
                *counts.entry(label).or_insert(0) += n;
            }
        }
        counts
    }

    /// Every annotator seen in any document.
    pub fn annotators(&self) -> AnnotatorSet {
        AnnotatorSet::new(
            self.documents
                .values()
                .flat_map(|agg| agg.document().annotators().names().to_vec()),
        )
    }

    /// Average the per-document tables of `label`.
    ///
    /// Each cell averages precision and recall over the documents where
    /// they are defined; F1 is recomputed from the averages. Documents
    /// without the label contribute nothing. `None` if no document has it.
    pub fn agreement(
        &self,
        label: &str,
        match_type: MatchType,
        threshold: u32,
        boundary: i32,
    ) -> AgreementResult<Option<AgreementScoreTable>> {
        let mut tables = Vec::new();
        for aggregator in self.documents.values() {
            if let Some(table) = aggregator.score_table(label, match_type, threshold, boundary)? {
                tables.push(table);
            }
        }
        if tables.is_empty() {
            return Ok(None);
        }
        debug!("averaging {} tables for {} ({})", tables.len(), label, match_type);

        let rows = self.annotators().names().to_vec();
        let columns: Vec<Column> = if match_type.is_pairwise() {
            rows.iter()
                .cloned()
                .map(Column::Annotator)
                .chain(std::iter::once(Column::All))
                .collect()
        } else {
            vec![Column::Other]
        };

        let mut averaged = AgreementScoreTable::new(
            label,
            match_type,
            threshold,
            boundary,
            self.config.decimals,
            rows.clone(),
            columns.clone(),
        );
        for row in &rows {
            for column in &columns {
                let cells: Vec<Scores> = tables.iter().filter_map(|t| t.get(row, column)).collect();
                let pr = PrecisionRecall::new(
                    Metric::mean(cells.iter().map(|s| s.precision)),
                    Metric::mean(cells.iter().map(|s| s.recall)),
                );
                averaged.set(row, column, Scores::from_pr(pr, self.config.decimals));
            }
        }
        Ok(Some(averaged))
    }
}
