//! Score tables: one row per annotator, one column group per comparison
//! partner, each cell holding F1, precision and recall.

use serde::Serialize;
use std::fmt::{self, Write};
use unicode_width::UnicodeWidthStr;

use crate::{MatchType, Scores};

/// A column group of a score table.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Column {
    Annotator(String),
    /// Average over every other annotator (pairwise tables).
    All,
    /// The combined remaining annotators (one-vs-all tables).
    Other,
}

impl Column {
    pub fn name(&self) -> &str {
        match self {
            Column::Annotator(name) => name,
            Column::All => "all",
            Column::Other => "other",
        }
    }
}

/// Scores of one (label, match type, threshold, boundary) combination.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AgreementScoreTable {
    pub label: String,
    pub match_type: MatchType,
    pub threshold: u32,
    pub boundary: i32,
    pub decimals: u32,
    rows: Vec<String>,
    columns: Vec<Column>,
    /// Row-major, `rows.len() * columns.len()` cells.
    cells: Vec<Scores>,
}

impl AgreementScoreTable {
    /// A table with every cell undefined.
    pub fn new(
        label: impl Into<String>,
        match_type: MatchType,
        threshold: u32,
        boundary: i32,
        decimals: u32,
        rows: Vec<String>,
        columns: Vec<Column>,
    ) -> Self {
        let cells = vec![Scores::undefined(); rows.len() * columns.len()];
        Self {
            label: label.into(),
            match_type,
            threshold,
            boundary,
            decimals,
            rows,
            columns,
            cells,
        }
    }

    pub fn rows(&self) -> &[String] {
        &self.rows
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    fn position(&self, row: &str, column: &Column) -> Option<usize> {
        let r = self.rows.iter().position(|name| name == row)?;
        let c = self.columns.iter().position(|col| col == column)?;
        Some(r * self.columns.len() + c)
    }

    pub fn get(&self, row: &str, column: &Column) -> Option<Scores> {
        self.position(row, column).map(|i| self.cells[i])
    }

    /// Look up a cell by column name (`"all"`, `"other"` or an annotator).
    pub fn cell(&self, row: &str, column: &str) -> Option<Scores> {
        let column = self.columns.iter().find(|col| col.name() == column)?.clone();
        self.get(row, &column)
    }

    pub fn set(&mut self, row: &str, column: &Column, scores: Scores) -> bool {
        match self.position(row, column) {
            Some(i) => {
                self.cells[i] = scores;
                true
            }
            None => false,
        }
    }

    /// Cells of one row, in column order.
    pub fn row(&self, row: &str) -> Option<&[Scores]> {
        let r = self.rows.iter().position(|name| name == row)?;
        let width = self.columns.len();
        Some(&self.cells[r * width..(r + 1) * width])
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Column, &Scores)> {
        let width = self.columns.len().max(1);
        self.cells.iter().enumerate().map(move |(i, scores)| {
            (
                self.rows[i / width].as_str(),
                &self.columns[i % width],
                scores,
            )
        })
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn to_ron_string(&self) -> Result<String, ron::Error> {
        let config = ron::ser::PrettyConfig::new()
            .depth_limit(4)
            .separate_tuple_members(true)
            .enumerate_arrays(false);
        ron::ser::to_string_pretty(self, config)
    }
}

fn pad(out: &mut String, text: &str, width: usize) {
    out.push_str(text);
    for _ in UnicodeWidthStr::width(text)..width {
        out.push(' ');
    }
}

// ```text
//   │ a                 │ b                 │ all
//   │     f     p     r │     f     p     r │     f     p     r
// a │     -     -     - │  0.67  1.00  0.50 │  0.67  1.00  0.50
// ```
impl fmt::Display for AgreementScoreTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let decimals = self.decimals as usize;
        let cell = (decimals + 3).max(5);
        let group = cell * 3 + 2;
        let row_header = self
            .rows
            .iter()
            .map(|r| UnicodeWidthStr::width(r.as_str()))
            .max()
            .unwrap_or(0);

        writeln!(
            f,
            "{} {} (threshold {}, boundary {})",
            self.label, self.match_type, self.threshold, self.boundary
        )?;

        let mut names = String::new();
        let mut metrics = String::new();
        pad(&mut names, "", row_header);
        pad(&mut metrics, "", row_header);
        for column in &self.columns {
            names.push_str(" │ ");
            pad(&mut names, column.name(), group);
            metrics.push_str(" │ ");
            write!(metrics, "{:>w$} {:>w$} {:>w$}", "f", "p", "r", w = cell)?;
        }
        writeln!(f, "{}", names.trim_end())?;
        write!(f, "{}", metrics.trim_end())?;

        for row in &self.rows {
            let mut line = String::new();
            pad(&mut line, row, row_header);
            for scores in self.row(row).unwrap_or(&[]) {
                line.push_str(" │ ");
                write!(
                    line,
                    "{:>w$.p$} {:>w$.p$} {:>w$.p$}",
                    scores.fscore,
                    scores.precision,
                    scores.recall,
                    w = cell,
                    p = decimals
                )?;
            }
            write!(f, "\n{}", line.trim_end())?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Metric;

    fn table() -> AgreementScoreTable {
        let mut table = AgreementScoreTable::new(
            "Dose",
            MatchType::Strict,
            0,
            0,
            2,
            vec!["a".into(), "b".into()],
            vec![Column::Annotator("a".into()), Column::Annotator("b".into()), Column::All],
        );
        let scores = Scores {
            fscore: Metric::Value(0.67),
            precision: Metric::Value(1.0),
            recall: Metric::Value(0.5),
        };
        table.set("a", &Column::Annotator("b".into()), scores);
        table.set("a", &Column::All, scores);
        table
    }

    #[test]
    fn test_cell_lookup() {
        let table = table();
        assert_eq!(table.cell("a", "b").map(|s| s.recall), Some(Metric::Value(0.5)));
        assert_eq!(table.cell("a", "a"), Some(Scores::undefined()));
        assert_eq!(table.cell("a", "zz"), None);
        assert_eq!(table.iter().count(), 6);
    }

    #[test]
    fn test_display() {
        insta::assert_snapshot!(table(), @r###"
        Dose strict (threshold 0, boundary 0)
          │ a                 │ b                 │ all
          │     f     p     r │     f     p     r │     f     p     r
        a │     -     -     - │  0.67  1.00  0.50 │  0.67  1.00  0.50
        b │     -     -     - │     -     -     - │     -     -     -
        "###);
    }

    #[test]
    fn test_json_export_uses_null_for_undefined() {
        let json = table().to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["cells"][0]["fscore"], serde_json::Value::Null);
        assert_eq!(value["cells"][1]["precision"], serde_json::json!(1.0));
        assert_eq!(value["match_type"], "strict");
    }

    #[test]
    fn test_ron_export() {
        let ron = table().to_ron_string().unwrap();
        assert!(ron.contains("label: \"Dose\""));
        assert!(ron.contains("match_type: strict"));
    }
}
