//! MyMoney CSV export parser
//!
//! Expected header (column order free, names trimmed, extra columns ignored):
//!   TIME,TYPE,AMOUNT,CATEGORY,ACCOUNT
//!   2025-06-01 08:00,(-) Expense,50000,Food,Cash
//!   2025-06-02 09:30,(+) Income,12000000,Salary,Payroll
//!
//! AMOUNT may carry a currency label and either separator convention:
//!   "12,000" / "1,250.50"        comma groups, dot decimal
//!   "1.250.000" / "1.250.000,75" dot groups, comma decimal
//!   "1,5"                        lone comma before 1-2 digits is a decimal
//!   "45.5" / "1.250"             lone dot is always a decimal
//! When both separators appear the later one is the decimal point.
//!
//! Rows whose TIME does not parse are dropped, as are rows whose AMOUNT does
//! not parse. Both are counted in the `LoadReport`.

use anyhow::{Context, Result, bail};
use chrono::{NaiveDate, NaiveDateTime};
use regex::Regex;
use runway_core::{Taxonomy, Transaction, TxnKind};
use std::io::Read;
use std::path::Path;
use tracing::{debug, info};

use crate::types::{DropReason, LoadReport, Loaded, RawRow};

const REQUIRED: [&str; 5] = ["TIME", "TYPE", "AMOUNT", "CATEGORY", "ACCOUNT"];

const TIME_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M"];

fn parse_time(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    for fmt in TIME_FORMATS {
        if let Ok(ts) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(ts);
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

/// Rewrite a grouped number with `.` as the only (decimal) separator.
fn unify_separators(s: &str) -> String {
    let decimal = match (s.rfind('.'), s.rfind(',')) {
        (Some(dot), Some(comma)) => Some(if dot > comma { '.' } else { ',' }),
        (Some(_), None) => (s.matches('.').count() == 1).then_some('.'),
        (None, Some(comma)) => {
            let tail = s.len() - comma - 1;
            (s.matches(',').count() == 1 && tail != 3).then_some(',')
        }
        (None, None) => None,
    };
    s.chars()
        .filter_map(|c| match c {
            '.' | ',' if Some(c) == decimal => Some('.'),
            '.' | ',' => None,
            c => Some(c),
        })
        .collect()
}

/// Row parsing rules, compiled once per load
struct RowRules {
    expense_marker: Regex,
    amount_noise: Regex,
}

impl RowRules {
    fn new() -> Result<Self> {
        Ok(Self {
            // "(-) Expense", "(-)", "expense", "EXPENSE"
            expense_marker: Regex::new(r"(?i)^\s*\(\s*-\s*\)|expense")?,
            // currency labels, spaces
            amount_noise: Regex::new(r"[^0-9.,\-]")?,
        })
    }

    fn kind(&self, s: &str) -> TxnKind {
        if self.expense_marker.is_match(s) {
            TxnKind::Expense
        } else {
            TxnKind::Income
        }
    }

    fn amount(&self, s: &str) -> Option<f64> {
        let cleaned = self.amount_noise.replace_all(s.trim(), "");
        let v: f64 = unify_separators(&cleaned).parse().ok()?;
        v.is_finite().then_some(v.abs())
    }

    fn to_transaction(&self, row: &RawRow, taxonomy: &Taxonomy) -> Result<Transaction, DropReason> {
        let ts = parse_time(&row.time).ok_or(DropReason::BadTime)?;
        let amount = self.amount(&row.amount).ok_or(DropReason::BadAmount)?;
        Ok(Transaction::new(
            ts,
            self.kind(&row.kind),
            amount,
            &row.category,
            row.account.trim(),
            taxonomy,
        ))
    }
}

/// Parse a MyMoney CSV export from disk.
pub fn parse_mymoney_csv(path: impl AsRef<Path>, taxonomy: &Taxonomy) -> Result<Loaded> {
    let path = path.as_ref();
    let file = std::fs::File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let loaded = parse_mymoney_reader(file, taxonomy)
        .with_context(|| format!("parsing {}", path.display()))?;
    info!(
        path = %path.display(),
        kept = loaded.report.kept(),
        dropped = loaded.report.dropped(),
        "loaded transactions"
    );
    Ok(loaded)
}

/// Parse MyMoney CSV from any reader.
pub fn parse_mymoney_reader(reader: impl Read, taxonomy: &Taxonomy) -> Result<Loaded> {
    let mut rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .has_headers(true)
        .from_reader(reader);

    let headers = rdr.headers().context("reading header row")?.clone();
    let mut idx = [0usize; 5];
    for (slot, name) in idx.iter_mut().zip(REQUIRED) {
        *slot = match headers
            .iter()
            .position(|h| h.trim().eq_ignore_ascii_case(name))
        {
            Some(i) => i,
            None => bail!("missing required column {name} (found: {:?})", headers),
        };
    }

    let rules = RowRules::new()?;
    let mut report = LoadReport::default();
    let mut transactions = Vec::new();

    for (line, result) in rdr.records().enumerate() {
        let record = result.with_context(|| format!("reading record {}", line + 1))?;
        let field = |i: usize| record.get(i).unwrap_or("").trim().to_string();
        let row = RawRow {
            time: field(idx[0]),
            kind: field(idx[1]),
            amount: field(idx[2]),
            category: field(idx[3]),
            account: field(idx[4]),
        };
        report.rows_read += 1;

        match rules.to_transaction(&row, taxonomy) {
            Ok(t) => transactions.push(t),
            Err(reason) => {
                debug!(record = line + 1, ?reason, time = %row.time, amount = %row.amount, "dropping row");
                report.record_drop(reason);
            }
        }
    }

    Ok(Loaded {
        transactions,
        report,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
TIME,TYPE,AMOUNT,CATEGORY,ACCOUNT
2025-06-01 08:00:00,(-) Expense,50000,food,Cash
2025-06-02 09:30,(+) Income,12000000,Salary,Cash
not a date,(-) Expense,1,Food,Cash
2025-06-03 12:00:00,(-) Expense,30000,transportation,Cash
";

    #[test]
    fn test_parses_and_drops_bad_time() {
        let tax = Taxonomy::standard();
        let loaded = parse_mymoney_reader(SAMPLE.as_bytes(), &tax).unwrap();
        assert_eq!(loaded.transactions.len(), 3);
        assert_eq!(loaded.report.rows_read, 4);
        assert_eq!(loaded.report.dropped_bad_time, 1);
        assert_eq!(loaded.report.kept(), 3);

        let first = &loaded.transactions[0];
        assert_eq!(first.kind, TxnKind::Expense);
        assert_eq!(first.category, "Food");
        assert_eq!(loaded.transactions[1].kind, TxnKind::Income);
        assert_eq!(loaded.transactions[2].category, "Transportation");
    }

    #[test]
    fn test_header_whitespace_and_order() {
        let csv = " ACCOUNT , CATEGORY ,AMOUNT, TYPE ,TIME ,NOTE\nBank,Gadgets,\"1,250.50\",(-) Expense,2025-01-02,x\n";
        let tax = Taxonomy::standard();
        let loaded = parse_mymoney_reader(csv.as_bytes(), &tax).unwrap();
        assert_eq!(loaded.transactions.len(), 1);
        let t = &loaded.transactions[0];
        assert_eq!(t.account, "Bank");
        assert_eq!(t.amount, 1250.5);
        assert_eq!(t.date(), NaiveDate::from_ymd_opt(2025, 1, 2).unwrap());
    }

    #[test]
    fn test_missing_column_is_error() {
        let csv = "TIME,TYPE,AMOUNT,CATEGORY\n2025-01-02,(-) Expense,1,Food\n";
        let tax = Taxonomy::standard();
        let err = parse_mymoney_reader(csv.as_bytes(), &tax).unwrap_err();
        assert!(err.to_string().contains("ACCOUNT"));
    }

    #[test]
    fn test_bad_amount_dropped() {
        let csv = "TIME,TYPE,AMOUNT,CATEGORY,ACCOUNT\n2025-01-02,(-) Expense,abc,Food,Cash\n";
        let tax = Taxonomy::standard();
        let loaded = parse_mymoney_reader(csv.as_bytes(), &tax).unwrap();
        assert!(loaded.transactions.is_empty());
        assert_eq!(loaded.report.dropped_bad_amount, 1);
    }

    #[test]
    fn test_type_markers() {
        let rules = RowRules::new().unwrap();
        assert_eq!(rules.kind("(-) Expense"), TxnKind::Expense);
        assert_eq!(rules.kind("expense"), TxnKind::Expense);
        assert_eq!(rules.kind("(+) Income"), TxnKind::Income);
        assert_eq!(rules.kind("(*) Transfer"), TxnKind::Income);
        assert_eq!(rules.amount("Rp 12,000"), Some(12000.0));
        assert_eq!(rules.amount("-45.5"), Some(45.5));
        assert_eq!(rules.amount(""), None);
    }

    #[test]
    fn test_amount_separator_conventions() {
        let rules = RowRules::new().unwrap();
        assert_eq!(rules.amount("1,250.50"), Some(1250.5));
        assert_eq!(rules.amount("1.250.000"), Some(1250000.0));
        assert_eq!(rules.amount("Rp 1.250.000,75"), Some(1250000.75));
        assert_eq!(rules.amount("1,5"), Some(1.5));
        assert_eq!(rules.amount("12,000,000"), Some(12000000.0));
        assert_eq!(rules.amount("1.250"), Some(1.25));
        assert_eq!(rules.amount("1,2,3"), Some(123.0));
        assert_eq!(rules.amount("."), None);
    }
}
