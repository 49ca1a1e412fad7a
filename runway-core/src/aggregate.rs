//! Filtering and aggregation over a transaction snapshot.
//!
//! Every function here is pure: the same rows and filter give the same
//! result regardless of the order the rows arrive in.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

use crate::taxonomy::{Group, Taxonomy};
use crate::transaction::{Transaction, TxnKind};

/// Default number of top expense categories reported
pub const DEFAULT_TOP_N: usize = 3;

/// Date range (inclusive on both ends) plus the accounts to keep
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Filter {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub accounts: BTreeSet<String>,
}

impl Filter {
    pub fn new(
        start: NaiveDate,
        end: NaiveDate,
        accounts: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            start,
            end,
            accounts: accounts.into_iter().map(Into::into).collect(),
        }
    }

    /// Full date span of `txns` with every account selected.
    /// None when there are no rows.
    pub fn covering(txns: &[Transaction]) -> Option<Self> {
        let start = txns.iter().map(Transaction::date).min()?;
        let end = txns.iter().map(Transaction::date).max()?;
        Some(Self::new(start, end, accounts(txns)))
    }

    pub fn matches(&self, txn: &Transaction) -> bool {
        let d = txn.date();
        d >= self.start && d <= self.end && self.accounts.contains(&txn.account)
    }
}

/// Totals for one filtered view
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateResult {
    pub expense_total: f64,
    pub income_total: f64,
    /// Income minus expense over the filtered rows
    pub balance: f64,
    pub transaction_count: usize,
    /// Highest-spend categories, descending by amount
    pub top_categories: Vec<(String, f64)>,
}

impl AggregateResult {
    pub fn top_category_names(&self) -> Vec<&str> {
        self.top_categories.iter().map(|(c, _)| c.as_str()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.transaction_count == 0
    }
}

/// Expense total for one category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryTotal {
    pub category: String,
    pub amount: f64,
    pub discretionary: bool,
}

/// Summed amount for one calendar day
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DailyAmount {
    pub date: NaiveDate,
    pub amount: f64,
}

impl DailyAmount {
    pub fn new(date: NaiveDate, amount: f64) -> Self {
        Self { date, amount }
    }
}

/// Categories that count toward the essential burn rate
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EssentialSet(BTreeSet<String>);

impl EssentialSet {
    /// Every category in the taxonomy's Essential group
    pub fn from_taxonomy(taxonomy: &Taxonomy) -> Self {
        Self(taxonomy.group_members(Group::Essential).iter().cloned().collect())
    }

    /// A caller-chosen subset; names are normalized against the taxonomy.
    pub fn restricted<'a>(names: impl IntoIterator<Item = &'a str>, taxonomy: &Taxonomy) -> Self {
        Self(
            names
                .into_iter()
                .map(|n| taxonomy.normalize(n).category)
                .collect(),
        )
    }

    pub fn contains(&self, category: &str) -> bool {
        self.0.contains(category)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Distinct account names, sorted
pub fn accounts(txns: &[Transaction]) -> Vec<String> {
    txns.iter()
        .map(|t| t.account.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

fn canonical_cmp(a: &Transaction, b: &Transaction) -> Ordering {
    a.timestamp
        .cmp(&b.timestamp)
        .then_with(|| a.account.cmp(&b.account))
        .then_with(|| a.category.cmp(&b.category))
        .then_with(|| a.kind.cmp(&b.kind))
        .then_with(|| a.amount.total_cmp(&b.amount))
}

/// Rows passing `filter`, in a fixed order independent of input order
fn filtered<'a>(txns: &'a [Transaction], filter: &Filter) -> Vec<&'a Transaction> {
    let mut rows: Vec<&Transaction> = txns.iter().filter(|t| filter.matches(t)).collect();
    rows.sort_by(|a, b| canonical_cmp(a, b));
    rows
}

/// Rows passing `filter`, newest first (the transaction-detail view)
pub fn filter_rows<'a>(txns: &'a [Transaction], filter: &Filter) -> Vec<&'a Transaction> {
    let mut rows = filtered(txns, filter);
    rows.reverse();
    rows
}

fn expense_by_category<'a>(rows: &[&'a Transaction]) -> BTreeMap<&'a str, f64> {
    let mut sums: BTreeMap<&str, f64> = BTreeMap::new();
    for t in rows.iter().filter(|t| t.kind == TxnKind::Expense) {
        *sums.entry(t.category.as_str()).or_insert(0.0) += t.amount;
    }
    sums
}

fn ranked(sums: BTreeMap<&str, f64>) -> Vec<(String, f64)> {
    let mut out: Vec<(String, f64)> = sums
        .into_iter()
        .map(|(c, a)| (c.to_string(), a))
        .collect();
    // BTreeMap iteration is name-ascending and the sort is stable,
    // so equal amounts stay in name order.
    out.sort_by(|a, b| b.1.total_cmp(&a.1));
    out
}

/// Compute totals and the top `top_n` expense categories for `filter`.
/// An empty selection yields zeros and no categories.
pub fn aggregate(txns: &[Transaction], filter: &Filter, top_n: usize) -> AggregateResult {
    let rows = filtered(txns, filter);

    let mut expense_total = 0.0;
    let mut income_total = 0.0;
    for t in &rows {
        match t.kind {
            TxnKind::Expense => expense_total += t.amount,
            TxnKind::Income => income_total += t.amount,
        }
    }

    let mut top_categories = ranked(expense_by_category(&rows));
    top_categories.truncate(top_n);

    debug!(
        rows = rows.len(),
        expense_total, income_total, "aggregated filtered transactions"
    );

    AggregateResult {
        expense_total,
        income_total,
        balance: income_total - expense_total,
        transaction_count: rows.len(),
        top_categories,
    }
}

/// Every expense category in the filtered view, descending by amount,
/// flagged discretionary/essential for display.
pub fn category_breakdown(
    txns: &[Transaction],
    filter: &Filter,
    taxonomy: &Taxonomy,
) -> Vec<CategoryTotal> {
    let rows = filtered(txns, filter);
    ranked(expense_by_category(&rows))
        .into_iter()
        .map(|(category, amount)| CategoryTotal {
            discretionary: taxonomy.is_discretionary(&category),
            category,
            amount,
        })
        .collect()
}

fn daily_sums<'a>(rows: impl Iterator<Item = &'a Transaction>) -> Vec<DailyAmount> {
    let mut by_day: BTreeMap<NaiveDate, f64> = BTreeMap::new();
    for t in rows {
        *by_day.entry(t.date()).or_insert(0.0) += t.amount;
    }
    by_day
        .into_iter()
        .map(|(date, amount)| DailyAmount { date, amount })
        .collect()
}

/// Total expense per day, ascending by date
pub fn daily_expenses(txns: &[Transaction], filter: &Filter) -> Vec<DailyAmount> {
    let rows = filtered(txns, filter);
    daily_sums(rows.into_iter().filter(|t| t.is_expense()))
}

/// Expense per day restricted to `essential` categories: the forecaster's input
pub fn daily_essential_series(
    txns: &[Transaction],
    filter: &Filter,
    essential: &EssentialSet,
) -> Vec<DailyAmount> {
    let rows = filtered(txns, filter);
    daily_sums(
        rows.into_iter()
            .filter(|t| t.is_expense() && essential.contains(&t.category)),
    )
}
