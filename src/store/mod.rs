pub mod csv_store;
pub mod table;

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::app::Result;

pub use csv_store::CsvStore;
pub use table::Table;

/// Whole-table persistence: every write replaces the previous contents.
pub trait Store {
    /// Current contents; an absent store is an empty table.
    fn load(&self) -> Result<Table>;

    /// Replace the stored contents with `table`.
    fn save(&self, table: &Table) -> Result<()>;
}

/// Locations of the files shared between stages.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Accumulated crawl results (default: `<data dir>/threadcast/posts.csv`)
    pub path: Option<PathBuf>,

    /// Output of the rewrite stage (default: `<data dir>/threadcast/posts_processed.csv`)
    pub processed_path: Option<PathBuf>,

    /// Narration scripts folder (default: `<data dir>/threadcast/narration`)
    pub narration_dir: Option<PathBuf>,

    /// Keep only the newest N rows after each merge (default: unbounded)
    pub max_rows: Option<usize>,
}
