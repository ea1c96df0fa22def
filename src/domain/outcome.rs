use crate::domain::Record;

/// Result of turning one listing entry into a [`Record`].
#[derive(Debug, Clone, PartialEq)]
pub enum RecordOutcome {
    Kept(Record),
    /// The entry was malformed; the rest of the page is unaffected.
    Skipped { index: usize, reason: String },
}

impl RecordOutcome {
    pub fn into_record(self) -> Option<Record> {
        match self {
            RecordOutcome::Kept(record) => Some(record),
            RecordOutcome::Skipped { .. } => None,
        }
    }
}

/// Result of one fetch-parse-detail cycle.
#[derive(Debug)]
pub enum CycleOutcome {
    Completed {
        records: Vec<Record>,
        /// Listing entries dropped by the parser.
        skipped: usize,
        /// Records whose detail page could not be read.
        missing_content: usize,
        attempts: u32,
    },
    /// Every attempt failed; the cycle contributes nothing.
    Failed { attempts: u32, last_error: String },
}

impl CycleOutcome {
    pub fn records(&self) -> &[Record] {
        match self {
            CycleOutcome::Completed { records, .. } => records,
            CycleOutcome::Failed { .. } => &[],
        }
    }

    pub fn into_records(self) -> Vec<Record> {
        match self {
            CycleOutcome::Completed { records, .. } => records,
            CycleOutcome::Failed { .. } => Vec::new(),
        }
    }

    pub fn attempts(&self) -> u32 {
        match self {
            CycleOutcome::Completed { attempts, .. } | CycleOutcome::Failed { attempts, .. } => {
                *attempts
            }
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, CycleOutcome::Failed { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failed_cycle_has_no_records() {
        let outcome = CycleOutcome::Failed {
            attempts: 3,
            last_error: "down".into(),
        };
        assert!(outcome.records().is_empty());
        assert_eq!(outcome.attempts(), 3);
        assert!(outcome.into_records().is_empty());
    }

    #[test]
    fn test_skipped_outcome_yields_no_record() {
        let outcome = RecordOutcome::Skipped {
            index: 2,
            reason: "no digits".into(),
        };
        assert!(outcome.into_record().is_none());
    }
}
