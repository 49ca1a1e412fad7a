//! Transaction record types

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::taxonomy::Taxonomy;

/// Direction of a transaction
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TxnKind {
    #[serde(rename = "expense")]
    Expense,
    #[serde(rename = "income")]
    Income,
}

/// One imported row, normalized. Never mutated after load.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Transaction {
    pub timestamp: NaiveDateTime,
    pub kind: TxnKind,
    /// Always non-negative; direction lives in `kind`
    pub amount: f64,
    /// Canonical category (a taxonomy key or "Misc")
    pub category: String,
    pub account: String,
}

impl Transaction {
    /// Create a transaction, normalizing the category against `taxonomy`.
    pub fn new(
        timestamp: NaiveDateTime,
        kind: TxnKind,
        amount: f64,
        raw_category: &str,
        account: impl Into<String>,
        taxonomy: &Taxonomy,
    ) -> Self {
        Self {
            timestamp,
            kind,
            amount: amount.abs(),
            category: taxonomy.normalize(raw_category).category,
            account: account.into(),
        }
    }

    pub fn date(&self) -> NaiveDate {
        self.timestamp.date()
    }

    pub fn is_expense(&self) -> bool {
        self.kind == TxnKind::Expense
    }
}
