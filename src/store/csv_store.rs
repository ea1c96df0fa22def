use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::app::{PipelineError, Result};
use crate::store::{Store, Table};

/// A [`Table`] kept in a CSV file with a header row.
///
/// Saves go through a sibling temporary file that is renamed over the
/// store, so readers never observe a half-written table.
pub struct CsvStore {
    path: PathBuf,
}

impl CsvStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "store.csv".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl Store for CsvStore {
    fn load(&self) -> Result<Table> {
        if !self.path.exists() {
            debug!("No store at {}, starting empty", self.path.display());
            return Ok(Table::default());
        }

        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .from_path(&self.path)?;

        let headers: Vec<String> = reader.headers()?.iter().map(String::from).collect();
        if headers.iter().all(|h| h.is_empty()) {
            return Ok(Table::default());
        }

        let mut table = Table::new(headers);
        for record in reader.records() {
            let record = record?;
            table.push_row(record.iter().map(String::from).collect());
        }

        debug!("Loaded {} rows from {}", table.len(), self.path.display());
        Ok(table)
    }

    fn save(&self, table: &Table) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let temp = self.temp_path();
        {
            let mut writer = csv::Writer::from_path(&temp)?;
            writer.write_record(table.headers())?;
            for row in table.rows() {
                writer.write_record(row)?;
            }
            writer.flush()?;
        }

        fs::rename(&temp, &self.path).map_err(|e| {
            PipelineError::Store(format!(
                "Failed to replace {} with {}: {}",
                self.path.display(),
                temp.display(),
                e
            ))
        })?;

        debug!("Wrote {} rows to {}", table.len(), self.path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store_in(dir: &TempDir) -> CsvStore {
        CsvStore::new(dir.path().join("posts.csv"))
    }

    #[test]
    fn test_missing_file_loads_empty() {
        let dir = TempDir::new().unwrap();
        let table = store_in(&dir).load().unwrap();
        assert!(table.is_empty());
        assert!(table.headers().is_empty());
    }

    #[test]
    fn test_save_then_load_preserves_cells() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);

        let mut table = Table::new(["link", "content", "generated_text"]);
        table.push_row(vec![
            "https://www.teamblind.com/p/1".into(),
            "줄바꿈이\n있는, \"인용\" 본문".into(),
            String::new(),
        ]);
        store.save(&table).unwrap();

        assert!(store.exists());
        assert!(!store.temp_path().exists());
        assert_eq!(store.load().unwrap(), table);
    }

    #[test]
    fn test_save_creates_parent_directories() {
        let dir = TempDir::new().unwrap();
        let store = CsvStore::new(dir.path().join("nested/deeper/posts.csv"));
        store.save(&Table::new(["link"])).unwrap();
        assert!(store.exists());
    }

    #[test]
    fn test_load_tolerates_short_rows() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        fs::write(store.path(), "link,title,like\nhttps://a,hello\n").unwrap();

        let table = store.load().unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(table.get(0, "like"), Some(""));
    }

    #[test]
    fn test_empty_file_loads_empty() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        fs::write(store.path(), "").unwrap();
        assert!(store.load().unwrap().is_empty());
    }
}
