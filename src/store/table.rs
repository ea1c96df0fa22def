use std::cmp::Ordering;
use std::collections::HashSet;

use crate::domain::{Record, RECORD_COLUMNS};

/// Rows of string cells under named columns.
///
/// Columns the crawler does not know about (added by later stages) are
/// carried through untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new<S: Into<String>>(headers: impl IntoIterator<Item = S>) -> Self {
        Self {
            headers: headers.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    /// Index of `name`, appending an empty column when it does not exist.
    pub fn ensure_column(&mut self, name: &str) -> usize {
        if let Some(index) = self.column_index(name) {
            return index;
        }
        self.headers.push(name.to_string());
        for row in &mut self.rows {
            row.push(String::new());
        }
        self.headers.len() - 1
    }

    /// Append a row, padded or cut to the header width.
    pub fn push_row(&mut self, mut row: Vec<String>) {
        row.resize(self.headers.len(), String::new());
        self.rows.push(row);
    }

    /// Append a record, adding any crawler column the table lacks.
    pub fn push_record(&mut self, record: &Record) {
        for column in RECORD_COLUMNS {
            self.ensure_column(column);
        }
        let row = self
            .headers
            .iter()
            .map(|h| record.column_value(h).unwrap_or_default())
            .collect();
        self.rows.push(row);
    }

    pub fn get(&self, row: usize, column: &str) -> Option<&str> {
        let index = self.column_index(column)?;
        self.rows.get(row).map(|r| r[index].as_str())
    }

    pub fn set(&mut self, row: usize, column: &str, value: impl Into<String>) {
        let index = self.ensure_column(column);
        if let Some(r) = self.rows.get_mut(row) {
            r[index] = value.into();
        }
    }

    /// Drop rows repeating an earlier row's value in `column`, keeping the
    /// first occurrence. Returns the number of rows removed.
    pub fn dedup_by(&mut self, column: &str) -> usize {
        let Some(index) = self.column_index(column) else {
            return 0;
        };
        let before = self.rows.len();
        let mut seen = HashSet::new();
        self.rows.retain(|row| seen.insert(row[index].clone()));
        before - self.rows.len()
    }

    /// Stable descending sort on `column`, empty cells last.
    ///
    /// Returns `false` and leaves the order unchanged when the column is absent.
    pub fn sort_desc_by(&mut self, column: &str) -> bool {
        let Some(index) = self.column_index(column) else {
            return false;
        };
        self.rows.sort_by(|a, b| {
            match (a[index].is_empty(), b[index].is_empty()) {
                (true, true) => Ordering::Equal,
                (true, false) => Ordering::Greater,
                (false, true) => Ordering::Less,
                (false, false) => b[index].cmp(&a[index]),
            }
        });
        true
    }

    /// Append every row of `other`, matching cells by column name and
    /// adding columns this table lacks.
    pub fn append(&mut self, other: &Table) {
        let indices: Vec<usize> = other
            .headers
            .iter()
            .map(|h| self.ensure_column(h))
            .collect();
        for source in &other.rows {
            let mut row = vec![String::new(); self.headers.len()];
            for (cell, &index) in source.iter().zip(&indices) {
                row[index] = cell.clone();
            }
            self.rows.push(row);
        }
    }

    /// Keep the first `len` rows.
    pub fn truncate(&mut self, len: usize) {
        self.rows.truncate(len);
    }

    /// Row indices whose `column` cell is empty (or missing altogether).
    pub fn rows_missing(&self, column: &str) -> Vec<usize> {
        match self.column_index(column) {
            Some(index) => (0..self.rows.len())
                .filter(|&i| self.rows[i][index].trim().is_empty())
                .collect(),
            None => (0..self.rows.len()).collect(),
        }
    }

    /// A new table with the same columns and only the given rows.
    pub fn select_rows(&self, indices: &[usize]) -> Table {
        Table {
            headers: self.headers.clone(),
            rows: indices
                .iter()
                .filter_map(|&i| self.rows.get(i).cloned())
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(rows: &[(&str, &str)]) -> Table {
        let mut table = Table::new(["link", "crawl_time"]);
        for (link, time) in rows {
            table.push_row(vec![link.to_string(), time.to_string()]);
        }
        table
    }

    #[test]
    fn test_ensure_column_pads_rows() {
        let mut t = table(&[("a", "1")]);
        let index = t.ensure_column("generated_text");
        assert_eq!(index, 2);
        assert_eq!(t.get(0, "generated_text"), Some(""));
        assert_eq!(t.ensure_column("link"), 0);
    }

    #[test]
    fn test_push_row_normalizes_width() {
        let mut t = Table::new(["a", "b"]);
        t.push_row(vec!["1".into()]);
        t.push_row(vec!["1".into(), "2".into(), "3".into()]);
        assert!(t.rows().iter().all(|r| r.len() == 2));
    }

    #[test]
    fn test_dedup_keeps_first() {
        let mut t = table(&[("a", "1"), ("b", "2"), ("a", "3")]);
        assert_eq!(t.dedup_by("link"), 1);
        assert_eq!(t.len(), 2);
        assert_eq!(t.get(0, "crawl_time"), Some("1"));
    }

    #[test]
    fn test_sort_desc_puts_empty_last_and_is_stable() {
        let mut t = table(&[
            ("a", ""),
            ("b", "2024-01-01 00:00:00"),
            ("c", "2024-02-01 00:00:00"),
            ("d", "2024-01-01 00:00:00"),
        ]);
        assert!(t.sort_desc_by("crawl_time"));
        let links: Vec<_> = (0..t.len()).map(|i| t.get(i, "link").unwrap()).collect();
        assert_eq!(links, ["c", "b", "d", "a"]);
    }

    #[test]
    fn test_sort_without_column_is_noop() {
        let mut t = table(&[("b", "1"), ("a", "2")]);
        assert!(!t.sort_desc_by("missing"));
        assert_eq!(t.get(0, "link"), Some("b"));
    }

    #[test]
    fn test_push_record_adds_crawler_columns() {
        let mut t = Table::new(["link", "generated_text"]);
        t.push_row(vec!["old".into(), "done".into()]);

        let mut record = Record::new("title", "new");
        record.like = 21;
        t.push_record(&record);

        assert!(t.has_column("crawl_time"));
        assert_eq!(t.get(1, "link"), Some("new"));
        assert_eq!(t.get(1, "like"), Some("21"));
        assert_eq!(t.get(1, "generated_text"), Some(""));
        assert_eq!(t.get(0, "generated_text"), Some("done"));
    }

    #[test]
    fn test_append_matches_columns_by_name() {
        let mut t = Table::new(["link", "title"]);
        t.push_row(vec!["a".into(), "first".into()]);

        let mut other = Table::new(["title", "link", "generated_text"]);
        other.push_row(vec!["second".into(), "b".into(), "story".into()]);
        t.append(&other);

        assert_eq!(t.headers(), ["link", "title", "generated_text"]);
        assert_eq!(t.get(1, "link"), Some("b"));
        assert_eq!(t.get(1, "title"), Some("second"));
        assert_eq!(t.get(0, "generated_text"), Some(""));
    }

    #[test]
    fn test_rows_missing() {
        let mut t = Table::new(["link", "generated_text"]);
        t.push_row(vec!["a".into(), "text".into()]);
        t.push_row(vec!["b".into(), " ".into()]);
        assert_eq!(t.rows_missing("generated_text"), vec![1]);
        assert_eq!(t.rows_missing("nope"), vec![0, 1]);
        assert_eq!(t.select_rows(&[1]).get(0, "link"), Some("b"));
    }
}
