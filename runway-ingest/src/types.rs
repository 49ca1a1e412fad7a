use runway_core::Transaction;
use serde::{Deserialize, Serialize};

/// One export row as text, before any parsing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawRow {
    pub time: String,
    pub kind: String,
    pub amount: String,
    pub category: String,
    pub account: String,
}

/// Why a row was left out of the load
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DropReason {
    BadTime,
    BadAmount,
}

/// Counts from one load. Dropped rows never reach the core, so this is the
/// only place the shrinkage is visible.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadReport {
    pub rows_read: usize,
    pub dropped_bad_time: usize,
    pub dropped_bad_amount: usize,
}

impl LoadReport {
    pub fn kept(&self) -> usize {
        self.rows_read - self.dropped()
    }

    pub fn dropped(&self) -> usize {
        self.dropped_bad_time + self.dropped_bad_amount
    }

    pub(crate) fn record_drop(&mut self, reason: DropReason) {
        match reason {
            DropReason::BadTime => self.dropped_bad_time += 1,
            DropReason::BadAmount => self.dropped_bad_amount += 1,
        }
    }
}

/// Parsed transactions plus the load report
#[derive(Debug, Clone, PartialEq)]
pub struct Loaded {
    pub transactions: Vec<Transaction>,
    pub report: LoadReport,
}
