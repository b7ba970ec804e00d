// 📋 Table - In-memory tabular dataset
// Named columns, rows of text cells; every row is exactly as wide as the header

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    /// Build a table, padding short rows with empty cells.
    ///
    /// A row wider than the header never loses cells: the header grows with
    /// generated `column_{n}` names (1-based position) until it fits.
    pub fn new(mut headers: Vec<String>, mut rows: Vec<Vec<String>>) -> Self {
        let widest = rows.iter().map(Vec::len).max().unwrap_or(0);
        while headers.len() < widest {
            headers.push(format!("column_{}", headers.len() + 1));
        }

        let width = headers.len();
        for row in &mut rows {
            if row.len() < width {
                row.resize(width, String::new());
            }
        }

        Table { headers, rows }
    }

    /// Exact, case-sensitive header lookup
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    pub fn cell(&self, row: usize, col: usize) -> &str {
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .map(String::as_str)
            .unwrap_or("")
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.headers.len()
    }

    /// All values of a named column, top to bottom
    pub fn column<'a>(&'a self, name: &str) -> Option<impl Iterator<Item = &'a str> + 'a> {
        let idx = self.column_index(name)?;
        Some(self.rows.iter().map(move |r| r.get(idx).map(String::as_str).unwrap_or("")))
    }

    /// Copy of the table without the named columns (names not present are ignored)
    pub fn without_columns(&self, names: &[String]) -> Table {
        let keep: Vec<usize> = self
            .headers
            .iter()
            .enumerate()
            .filter(|(_, h)| !names.contains(h))
            .map(|(i, _)| i)
            .collect();

        Table {
            headers: keep.iter().map(|&i| self.headers[i].clone()).collect(),
            rows: self
                .rows
                .iter()
                .map(|row| keep.iter().map(|&i| row.get(i).cloned().unwrap_or_default()).collect())
                .collect(),
        }
    }
}
