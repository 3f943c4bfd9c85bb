//! A store backed by a SQLite annotation table.

use parking_lot::Mutex;
use rusqlite::types::Type;
use rusqlite::{params, params_from_iter, Connection, Row};
use std::path::Path;
use std::sync::Arc;

use crate::config::QuotedNames;
use crate::{
    AnnotationRow, AnnotationStore, AnnotationTableConfig, InstanceGroup, PairQuery, SentencePair, StoreResult,
};

/// Queries one annotation table through a shared connection.
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
    names: QuotedNames,
    config: AnnotationTableConfig,
}

impl SqliteStore {
    pub fn open<P: AsRef<Path>>(path: P, config: AnnotationTableConfig) -> StoreResult<Self> {
        let conn = Connection::open(path)?;
        Self::from_connection(Arc::new(Mutex::new(conn)), config)
    }

    /// An empty in-memory database with the annotation table created.
    pub fn open_in_memory(config: AnnotationTableConfig) -> StoreResult<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self::from_connection(Arc::new(Mutex::new(conn)), config)?;
        store.create_table()?;
        Ok(store)
    }

    /// Share a connection that other components may also read from.
    pub fn from_connection(conn: Arc<Mutex<Connection>>, config: AnnotationTableConfig) -> StoreResult<Self> {
        config.validate()?;
        Ok(Self {
            conn,
            names: config.quoted(),
            config,
        })
    }

    pub fn config(&self) -> &AnnotationTableConfig {
        &self.config
    }

    pub fn create_table(&self) -> StoreResult<()> {
        let n = &self.names;
        let conn = self.conn.lock();
        conn.execute(
            &format!(
                "CREATE TABLE IF NOT EXISTS {table} (
                    {id} TEXT NOT NULL,
                    {annotator} TEXT NOT NULL,
                    {begin} INTEGER NOT NULL,
                    {end} INTEGER NOT NULL,
                    {text} TEXT NOT NULL,
                    {sentence} INTEGER NOT NULL,
                    {document} TEXT NOT NULL,
                    {label} TEXT NOT NULL
                )",
                table = n.table,
                id = n.id,
                annotator = n.annotator,
                begin = n.begin,
                end = n.end,
                text = n.text,
                sentence = n.sentence,
                document = n.document,
                label = n.label,
            ),
            [],
        )?;
        conn.execute(
            &format!(
                "CREATE INDEX IF NOT EXISTS \"idx_{raw}_label_sentence\" ON {table}({label}, {sentence})",
                raw = self.config.table,
                table = n.table,
                label = n.label,
                sentence = n.sentence,
            ),
            [],
        )?;
        Ok(())
    }

    pub fn insert(&self, row: &AnnotationRow) -> StoreResult<()> {
        let n = &self.names;
        let conn = self.conn.lock();
        conn.execute(
            &format!(
                "INSERT INTO {} ({}, {}, {}, {}, {}, {}, {}, {}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                n.table, n.id, n.annotator, n.begin, n.end, n.text, n.sentence, n.document, n.label
            ),
            params![
                &row.id,
                &row.annotator,
                row.begin as i64,
                row.end as i64,
                &row.text,
                row.sentence,
                &row.document,
                &row.label
            ],
        )?;
        Ok(())
    }

    /// `document = ? AND label IN (?, ...)`, bound after the annotator parameters.
    fn filter(&self, query: &PairQuery<'_>, alias: &str) -> String {
        let n = &self.names;
        let placeholders = vec!["?"; query.labels.len()].join(", ");
        format!(
            "{alias}{document} = ? AND {alias}{label} IN ({placeholders})",
            alias = alias,
            document = n.document,
            label = n.label,
            placeholders = placeholders,
        )
    }

    fn row_columns(&self, alias: &str) -> String {
        let n = &self.names;
        [&n.id, &n.annotator, &n.begin, &n.end, &n.text, &n.sentence, &n.document, &n.label]
            .iter()
            .map(|c| format!("{}{}", alias, c))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

fn offset(row: &Row<'_>, idx: usize) -> rusqlite::Result<usize> {
    let value: i64 = row.get(idx)?;
    usize::try_from(value).map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Integer, Box::new(e)))
}

/// Reads the eight columns of [`SqliteStore::row_columns`] starting at `start`.
fn annotation_row(row: &Row<'_>, start: usize) -> rusqlite::Result<AnnotationRow> {
    Ok(AnnotationRow {
        id: row.get(start)?,
        annotator: row.get(start + 1)?,
        begin: offset(row, start + 2)?,
        end: offset(row, start + 3)?,
        text: row.get(start + 4)?,
        sentence: row.get(start + 5)?,
        document: row.get(start + 6)?,
        label: row.get(start + 7)?,
    })
}

impl AnnotationStore for SqliteStore {
    fn rows(&self, query: &PairQuery<'_>) -> StoreResult<Vec<AnnotationRow>> {
        let n = &self.names;
        let sql = format!(
            "SELECT {columns} FROM {table}
             WHERE {annotator} IN (?, ?) AND {filter}
             ORDER BY {begin}, {end}, {annotator}, {id}",
            columns = self.row_columns(""),
            table = n.table,
            annotator = n.annotator,
            filter = self.filter(query, ""),
            begin = n.begin,
            end = n.end,
            id = n.id,
        );
        let mut values = vec![query.first, query.second, query.document];
        values.extend(query.labels.iter().map(String::as_str));

        let conn = self.conn.lock();
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params_from_iter(values), |row| annotation_row(row, 0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    fn instance_groups(&self, query: &PairQuery<'_>) -> StoreResult<Vec<InstanceGroup>> {
        let n = &self.names;
        // With two annotators in the filter, min and max name the distinct set.
        let sql = format!(
            "SELECT {begin}, {end}, {sentence}, min({annotator}), max({annotator}), count(*)
             FROM {table}
             WHERE {annotator} IN (?, ?) AND {filter}
             GROUP BY {begin}, {end}, {sentence}
             ORDER BY {begin}, {end}, {sentence}",
            begin = n.begin,
            end = n.end,
            sentence = n.sentence,
            annotator = n.annotator,
            table = n.table,
            filter = self.filter(query, ""),
        );
        let mut values = vec![query.first, query.second, query.document];
        values.extend(query.labels.iter().map(String::as_str));

        let conn = self.conn.lock();
        let mut stmt = conn.prepare(&sql)?;
        let groups = stmt
            .query_map(params_from_iter(values), |row| {
                let low: String = row.get(3)?;
                let high: String = row.get(4)?;
                let count: i64 = row.get(5)?;
                let mut annotators = vec![low];
                if high != annotators[0] {
                    annotators.push(high);
                }
                Ok(InstanceGroup {
                    begin: offset(row, 0)?,
                    end: offset(row, 1)?,
                    sentence: row.get(2)?,
                    annotators,
                    rows: count.max(0) as usize,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        log::debug!(
            "{} groups for {}/{} in document {}",
            groups.len(),
            query.first,
            query.second,
            query.document
        );
        Ok(groups)
    }

    fn same_sentence_pairs(&self, query: &PairQuery<'_>) -> StoreResult<Vec<SentencePair>> {
        let n = &self.names;
        let sql = format!(
            "SELECT {a_columns}, {b_columns},
                    (a.{begin} <= b.{begin} AND b.{end} <= a.{end})
                    OR (b.{begin} <= a.{begin} AND a.{end} <= b.{end})
             FROM {table} a JOIN {table} b
               ON a.{sentence} = b.{sentence} AND a.{document} = b.{document}
             WHERE a.{annotator} = ? AND b.{annotator} = ? AND {a_filter} AND {b_filter}
             ORDER BY a.{begin}, a.{end}, a.{id}, b.{begin}, b.{end}, b.{id}",
            a_columns = self.row_columns("a."),
            b_columns = self.row_columns("b."),
            begin = n.begin,
            end = n.end,
            table = n.table,
            sentence = n.sentence,
            document = n.document,
            annotator = n.annotator,
            id = n.id,
            a_filter = self.filter(query, "a."),
            b_filter = self.filter(query, "b."),
        );
        let mut values = vec![query.first, query.second];
        for _ in 0..2 {
            values.push(query.document);
            values.extend(query.labels.iter().map(String::as_str));
        }

        let conn = self.conn.lock();
        let mut stmt = conn.prepare(&sql)?;
        let pairs = stmt
            .query_map(params_from_iter(values), |row| {
                let first = annotation_row(row, 0)?;
                let second = annotation_row(row, 8)?;
                Ok(SentencePair {
                    sentence: first.sentence,
                    first,
                    second,
                    contained: row.get(16)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(pairs)
    }
}
