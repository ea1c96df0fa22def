//! Merging a cycle's records into the persisted store.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::app::Result;
use crate::domain::Record;
use crate::store::{Store, Table};

/// Which records are worth keeping.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    /// Minimum like count (default: 20)
    pub min_likes: u64,

    /// Minimum body length in characters (default: 200)
    pub min_content_chars: usize,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            min_likes: 20,
            min_content_chars: 200,
        }
    }
}

impl FilterConfig {
    pub fn accepts(&self, record: &Record) -> bool {
        record.like >= self.min_likes && record.content_len() >= self.min_content_chars
    }
}

/// What a merge did to the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MergeReport {
    /// Records that passed the filter
    pub accepted: usize,
    /// Accepted records already present in the store (or earlier in the batch)
    pub duplicates: usize,
    /// Repeated links found in the loaded store and dropped
    pub repaired: usize,
    /// Rows dropped by the retention limit
    pub expired: usize,
    /// Rows in the store afterwards
    pub total: usize,
    /// Whether the rows were ordered by crawl time
    pub sorted: bool,
}

impl MergeReport {
    pub fn added(&self) -> usize {
        self.accepted.saturating_sub(self.duplicates)
    }
}

pub struct Accumulator {
    filter: FilterConfig,
    max_rows: Option<usize>,
}

impl Accumulator {
    pub fn new(filter: FilterConfig) -> Self {
        Self {
            filter,
            max_rows: None,
        }
    }

    /// Keep only the newest `max_rows` rows after each merge.
    pub fn with_retention(mut self, max_rows: Option<usize>) -> Self {
        self.max_rows = max_rows;
        self
    }

    /// Records passing the like/length thresholds, in input order.
    pub fn filter(&self, records: Vec<Record>) -> Vec<Record> {
        records
            .into_iter()
            .filter(|r| self.filter.accepts(r))
            .collect()
    }

    /// Append `records` to `table`, drop repeated links (first one wins)
    /// and order by crawl time, newest first.
    pub fn merge(&self, table: &mut Table, records: &[Record]) -> MergeReport {
        let mut seen: HashSet<String> = (0..table.len())
            .filter_map(|i| table.get(i, "link").map(String::from))
            .collect();
        let duplicates = records
            .iter()
            .filter(|r| !seen.insert(r.link.clone()))
            .count();

        for record in records {
            let mut record = record.clone();
            record.stamp_if_missing();
            table.push_record(&record);
        }

        let removed = table.dedup_by("link");
        let repaired = removed.saturating_sub(duplicates);
        if repaired > 0 {
            warn!("Dropped {} repeated links already in the store", repaired);
        }

        let sorted = table.sort_desc_by("crawl_time");
        if !sorted {
            warn!("crawl_time column not found; leaving row order unchanged");
        }

        let mut expired = 0;
        if let Some(max_rows) = self.max_rows {
            if table.len() > max_rows {
                expired = table.len() - max_rows;
                table.truncate(max_rows);
            }
        }

        MergeReport {
            accepted: records.len(),
            duplicates,
            repaired,
            expired,
            total: table.len(),
            sorted,
        }
    }

    /// Filter `records`, merge them into the store and rewrite it.
    pub fn accumulate<S: Store + ?Sized>(&self, store: &S, records: Vec<Record>) -> Result<MergeReport> {
        let accepted = self.filter(records);
        let mut table = store.load()?;
        let report = self.merge(&mut table, &accepted);
        store.save(&table)?;

        info!(
            "Stored {} new posts ({} already known, {} total)",
            report.added(),
            report.duplicates,
            report.total
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::CsvStore;
    use chrono::NaiveDate;
    use tempfile::TempDir;

    fn record(link: &str, like: u64, content_chars: usize) -> Record {
        let mut r = Record::new(format!("post {link}"), link);
        r.like = like;
        r.content = "가".repeat(content_chars);
        r
    }

    fn at(day: u32) -> Option<chrono::NaiveDateTime> {
        NaiveDate::from_ymd_opt(2024, 5, day)
            .unwrap()
            .and_hms_opt(12, 0, 0)
    }

    #[test]
    fn test_filter_threshold_boundaries() {
        let acc = Accumulator::new(FilterConfig::default());
        let kept = acc.filter(vec![
            record("https://a/19", 19, 500),
            record("https://a/20", 20, 200),
            record("https://a/199", 50, 199),
        ]);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].link, "https://a/20");
    }

    #[test]
    fn test_filter_is_configurable() {
        let acc = Accumulator::new(FilterConfig {
            min_likes: 0,
            min_content_chars: 0,
        });
        assert_eq!(acc.filter(vec![record("https://a/1", 0, 0)]).len(), 1);
    }

    #[test]
    fn test_first_seen_wins() {
        let acc = Accumulator::new(FilterConfig::default());
        let mut table = Table::default();

        let mut first = record("https://a/L", 30, 300);
        first.content = format!("A{}", "x".repeat(300));
        acc.merge(&mut table, &[first]);

        let mut second = record("https://a/L", 99, 300);
        second.content = format!("B{}", "x".repeat(300));
        let report = acc.merge(&mut table, &[second]);

        assert_eq!(report.duplicates, 1);
        assert_eq!(report.added(), 0);
        assert_eq!(table.len(), 1);
        assert!(table.get(0, "content").unwrap().starts_with('A'));
        assert_eq!(table.get(0, "like"), Some("30"));
    }

    #[test]
    fn test_merge_into_store_with_repeated_link() {
        let dir = TempDir::new().unwrap();
        let store = CsvStore::new(dir.path().join("posts.csv"));
        let mut table = Table::new(["link", "title", "crawl_time"]);
        table.push_row(vec!["https://a/1".into(), "one".into(), "2024-05-02 12:00:00".into()]);
        table.push_row(vec!["https://a/1".into(), "again".into(), "2024-05-01 12:00:00".into()]);
        store.save(&table).unwrap();

        let acc = Accumulator::new(FilterConfig::default());
        let report = acc.accumulate(&store, vec![]).unwrap();
        assert_eq!(report.accepted, 0);
        assert_eq!(report.duplicates, 0);
        assert_eq!(report.repaired, 1);
        assert_eq!(report.added(), 0);

        let report = acc
            .accumulate(&store, vec![record("https://a/1", 30, 300), record("https://a/2", 30, 300)])
            .unwrap();
        assert_eq!(report.duplicates, 1);
        assert_eq!(report.added(), 1);
        assert_eq!(report.total, 2);
    }

    #[test]
    fn test_merge_sorts_newest_first() {
        let acc = Accumulator::new(FilterConfig::default());
        let mut table = Table::default();

        let mut old = record("https://a/old", 30, 300);
        old.crawl_time = at(1);
        let mut new = record("https://a/new", 30, 300);
        new.crawl_time = at(9);

        let report = acc.merge(&mut table, &[old, new]);
        assert!(report.sorted);
        assert_eq!(table.get(0, "link"), Some("https://a/new"));
        assert_eq!(table.get(1, "link"), Some("https://a/old"));
    }

    #[test]
    fn test_merge_stamps_crawl_time() {
        let acc = Accumulator::new(FilterConfig::default());
        let mut table = Table::default();
        acc.merge(&mut table, &[record("https://a/1", 30, 300)]);
        assert!(!table.get(0, "crawl_time").unwrap().is_empty());
    }

    #[test]
    fn test_missing_crawl_time_column_keeps_order() {
        let acc = Accumulator::new(FilterConfig::default());
        let mut table = Table::new(["link", "title"]);
        table.push_row(vec!["https://a/2".into(), "second".into()]);
        table.push_row(vec!["https://a/1".into(), "first".into()]);
        let before = table.clone();

        let report = acc.merge(&mut table, &[]);
        assert!(!report.sorted);
        assert_eq!(table, before);
    }

    #[test]
    fn test_retention_keeps_newest() {
        let acc = Accumulator::new(FilterConfig::default()).with_retention(Some(2));
        let mut table = Table::default();
        let records: Vec<Record> = (1..=3)
            .map(|day| {
                let mut r = record(&format!("https://a/{day}"), 30, 300);
                r.crawl_time = at(day);
                r
            })
            .collect();

        let report = acc.merge(&mut table, &records);
        assert_eq!(report.expired, 1);
        assert_eq!(table.len(), 2);
        assert_eq!(table.get(0, "link"), Some("https://a/3"));
        assert_eq!(table.get(1, "link"), Some("https://a/2"));
    }

    #[test]
    fn test_accumulate_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let store = CsvStore::new(dir.path().join("posts.csv"));
        let acc = Accumulator::new(FilterConfig::default());

        let mut a = record("https://a/1", 25, 250);
        a.crawl_time = at(2);
        let mut b = record("https://a/2", 40, 400);
        b.crawl_time = at(3);
        let batch = vec![a, b, record("https://a/3", 5, 400)];

        let first = acc.accumulate(&store, batch.clone()).unwrap();
        assert_eq!(first.added(), 2);
        let once = store.load().unwrap();

        let second = acc.accumulate(&store, batch).unwrap();
        assert_eq!(second.added(), 0);
        assert_eq!(store.load().unwrap(), once);
    }

    #[test]
    fn test_accumulate_preserves_downstream_columns() {
        let dir = TempDir::new().unwrap();
        let store = CsvStore::new(dir.path().join("posts.csv"));
        let acc = Accumulator::new(FilterConfig::default());

        acc.accumulate(&store, vec![record("https://a/1", 25, 250)])
            .unwrap();
        let mut table = store.load().unwrap();
        table.set(0, "generated_text", "rewritten");
        store.save(&table).unwrap();

        acc.accumulate(&store, vec![record("https://a/2", 25, 250)])
            .unwrap();
        let table = store.load().unwrap();
        assert_eq!(table.len(), 2);
        let row = (0..2)
            .find(|&i| table.get(i, "link") == Some("https://a/1"))
            .unwrap();
        assert_eq!(table.get(row, "generated_text"), Some("rewritten"));
    }
}
