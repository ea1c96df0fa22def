pub mod outcome;
pub mod record;

pub use outcome::{CycleOutcome, RecordOutcome};
pub use record::{Record, CRAWL_TIME_FORMAT, RECORD_COLUMNS};
