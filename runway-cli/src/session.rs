//! One computation pass: load the export, apply the filter, aggregate.

use anyhow::{Context, Result, bail};
use chrono::NaiveDate;
use clap::Args;
use runway_core::aggregate::accounts;
use runway_core::{
    AggregateResult, BalanceSource, Filter, Period, Taxonomy, Transaction, aggregate,
    authoritative_balance,
};
use runway_ingest::{LoadReport, parse_mymoney_csv};
use std::path::PathBuf;
use tracing::{info, warn};

use crate::config::Config;

/// Data source and filter flags shared by every analysis command
#[derive(Args, Debug, Clone)]
pub struct DataArgs {
    /// MyMoney CSV export (columns TIME, TYPE, AMOUNT, CATEGORY, ACCOUNT)
    #[arg(long)]
    pub csv: PathBuf,

    /// Date range preset: this-month, last-month, all
    #[arg(long, default_value = "all")]
    pub period: Period,

    /// Custom range start (YYYY-MM-DD); overrides --period
    #[arg(long, requires = "end")]
    pub start: Option<NaiveDate>,

    /// Custom range end (YYYY-MM-DD), inclusive
    #[arg(long, requires = "start")]
    pub end: Option<NaiveDate>,

    /// Account to include (repeatable; default: all accounts)
    #[arg(long = "account")]
    pub accounts: Vec<String>,

    /// Actual current balance; 0 or absent uses the calculated balance
    #[arg(long)]
    pub balance: Option<f64>,

    /// Savings goal (default from config)
    #[arg(long)]
    pub goal: Option<f64>,
}

impl DataArgs {
    fn period(&self) -> Period {
        match (self.start, self.end) {
            (Some(start), Some(end)) => Period::Custom { start, end },
            _ => self.period,
        }
    }
}

/// Everything a command needs after loading and filtering
pub struct Session {
    pub config: Config,
    pub taxonomy: Taxonomy,
    pub transactions: Vec<Transaction>,
    pub report: LoadReport,
    pub filter: Filter,
    pub aggregate: AggregateResult,
    pub balance: BalanceSource,
    pub savings_goal: f64,
    pub today: NaiveDate,
}

impl Session {
    pub fn load(config: Config, args: &DataArgs) -> Result<Self> {
        if !args.csv.exists() {
            bail!("CSV not found: {} (pass --csv <path>)", args.csv.display());
        }

        let taxonomy = config.taxonomy();
        let loaded = parse_mymoney_csv(&args.csv, &taxonomy)
            .with_context(|| format!("loading {}", args.csv.display()))?;
        if loaded.report.dropped() > 0 {
            warn!(
                bad_time = loaded.report.dropped_bad_time,
                bad_amount = loaded.report.dropped_bad_amount,
                "some rows were skipped"
            );
        }

        let today = config.today()?;
        let transactions = loaded.transactions;
        let span = transactions
            .iter()
            .map(Transaction::date)
            .min()
            .zip(transactions.iter().map(Transaction::date).max());
        let (start, end) = args.period().resolve(today, span);

        let all_accounts = accounts(&transactions);
        let selected: Vec<String> = if args.accounts.is_empty() {
            all_accounts
        } else {
            for a in &args.accounts {
                if !all_accounts.contains(a) {
                    warn!(account = %a, "account not present in export");
                }
            }
            args.accounts.clone()
        };

        let filter = Filter::new(start, end, selected);
        let aggregate = aggregate(&transactions, &filter, config.insight.top_n);
        let balance = authoritative_balance(aggregate.balance, args.balance);
        let savings_goal = args.goal.unwrap_or(config.budget.savings_goal);

        info!(
            %start, %end,
            rows = aggregate.transaction_count,
            balance = balance.amount(),
            source = balance.label(),
            "session ready"
        );

        Ok(Self {
            config,
            taxonomy,
            transactions,
            report: loaded.report,
            filter,
            aggregate,
            balance,
            savings_goal,
            today,
        })
    }

    pub fn currency(&self) -> &str {
        &self.config.insight.currency
    }

    pub fn describe_range(&self) -> String {
        format!(
            "{} → {} | accounts: {} | {} rows ({} skipped on import)",
            self.filter.start,
            self.filter.end,
            self.filter.accounts.iter().cloned().collect::<Vec<_>>().join(", "),
            self.aggregate.transaction_count,
            self.report.dropped(),
        )
    }
}
