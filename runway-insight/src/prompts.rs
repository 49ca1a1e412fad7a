//! Prompt assembly for the text-completion service.
//!
//! Each builder pairs the fixed system instruction with a compact data
//! summary. Nothing here talks to the network, retries or caches.

use runway_core::{AggregateResult, Days, RunwayForecast, Transaction, TxnKind, goal_progress};
use serde::Serialize;

use crate::report::format_number;

/// Used when no master-prompt file is configured
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a personal financial advisor.";

/// Default number of transactions included in a chat context
pub const DEFAULT_PREVIEW_ROWS: usize = 200;

/// A request ready for the completion service
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InsightRequest {
    pub system: String,
    pub body: String,
    /// None → the service's configured default
    pub temperature: Option<f32>,
}

impl InsightRequest {
    /// System instruction and data summary as one string; also the cache key.
    pub fn prompt(&self) -> String {
        format!("{}\n\n{}", self.system, self.body)
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }
}

/// Something the user is thinking of buying
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Purchase {
    pub item: String,
    pub price: f64,
    pub reason: String,
    pub category: String,
}

/// One row of the chat transaction preview
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PreviewRow {
    pub time: String,
    #[serde(rename = "type")]
    pub kind: TxnKind,
    pub amount: f64,
    pub category: String,
    pub account: String,
}

impl From<&Transaction> for PreviewRow {
    fn from(t: &Transaction) -> Self {
        Self {
            time: t.timestamp.format("%Y-%m-%d %H:%M:%S").to_string(),
            kind: t.kind,
            amount: t.amount,
            category: t.category.clone(),
            account: t.account.clone(),
        }
    }
}

/// Data the chat assistant sees alongside each question
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatContext {
    pub balance: f64,
    pub top_categories: Vec<String>,
    pub savings_goal: f64,
    pub transaction_preview: Vec<PreviewRow>,
}

impl ChatContext {
    /// `rows` should already be in display order; at most `preview_rows` are kept.
    pub fn new(
        balance: f64,
        aggregate: &AggregateResult,
        savings_goal: f64,
        rows: &[&Transaction],
        preview_rows: usize,
    ) -> Self {
        Self {
            balance,
            top_categories: aggregate
                .top_category_names()
                .into_iter()
                .map(str::to_string)
                .collect(),
            savings_goal,
            transaction_preview: rows.iter().take(preview_rows).map(|t| PreviewRow::from(*t)).collect(),
        }
    }
}

/// Builds requests against one system instruction
#[derive(Debug, Clone, PartialEq)]
pub struct PromptBuilder {
    system: String,
}

impl Default for PromptBuilder {
    fn default() -> Self {
        Self::new(DEFAULT_SYSTEM_PROMPT)
    }
}

fn top_map(aggregate: &AggregateResult) -> String {
    let inner: Vec<String> = aggregate
        .top_categories
        .iter()
        .map(|(c, a)| format!("{c}: {}", format_number(*a)))
        .collect();
    format!("{{{}}}", inner.join(", "))
}

impl PromptBuilder {
    pub fn new(system: impl Into<String>) -> Self {
        let system = system.into();
        let system = if system.trim().is_empty() {
            DEFAULT_SYSTEM_PROMPT.to_string()
        } else {
            system.trim().to_string()
        };
        Self { system }
    }

    pub fn system(&self) -> &str {
        &self.system
    }

    fn request(&self, body: String) -> InsightRequest {
        InsightRequest {
            system: self.system.clone(),
            body,
            temperature: None,
        }
    }

    /// Short insight over the filtered totals
    pub fn summary_request(&self, aggregate: &AggregateResult, balance: f64) -> InsightRequest {
        self.request(format!(
            "Expenses={}, Income={}, Balance={}, Top={}. Give brief insights and advice.",
            format_number(aggregate.expense_total),
            format_number(aggregate.income_total),
            format_number(balance),
            top_map(aggregate),
        ))
    }

    /// Explain a runway projection
    pub fn runway_request(&self, forecast: &RunwayForecast, balance: f64) -> InsightRequest {
        let projection = match (forecast.days_remaining, forecast.depletion_date) {
            (Days::Infinite, _) => "The essential-spend trend is flat or negligible, so the balance is not projected to run out.".to_string(),
            (Days::Finite(days), Some(date)) => format!(
                "Projected to last {days} days (until {}).",
                date.format("%Y-%m-%d")
            ),
            (Days::Finite(days), None) => format!("Projected to last {days} days."),
        };
        self.request(format!(
            "Balance={}, essential burn rate≈{}/day, intercept={}, R²={:.2}. {projection} \
Explain what this means and how to extend the runway.",
            format_number(balance),
            format_number(forecast.daily_burn_rate.abs()),
            format_number(forecast.intercept),
            forecast.r_squared,
        ))
    }

    /// "Is this purchase worth it?"
    pub fn purchase_request(&self, purchase: &Purchase, balance: f64) -> InsightRequest {
        let reason = if purchase.reason.trim().is_empty() {
            "none given"
        } else {
            purchase.reason.trim()
        };
        self.request(format!(
            "I want to buy {} for {}, balance {}, reason: {}, category {}. Is it worth buying?",
            purchase.item.trim(),
            format_number(purchase.price),
            format_number(balance),
            reason,
            purchase.category,
        ))
    }

    /// Free-form question with a bounded transaction preview as JSON context
    pub fn chat_request(&self, context: &ChatContext, question: &str) -> InsightRequest {
        // Serializing plain numbers/strings cannot fail
        let json = serde_json::to_string(context).unwrap_or_else(|_| "{}".to_string());
        self.request(format!("Context: {json}\nQuestion: {}", question.trim()))
    }

    /// Summary plus five tips, for the exported report
    pub fn report_request(
        &self,
        aggregate: &AggregateResult,
        balance: f64,
        savings_goal: f64,
    ) -> InsightRequest {
        self.request(format!(
            "Write a summary plus 5 tips. Data: expenses {}, income {}, balance {}, savings progress {:.1}%.",
            format_number(aggregate.expense_total),
            format_number(aggregate.income_total),
            format_number(balance),
            goal_progress(balance, savings_goal) * 100.0,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveDateTime};
    use runway_core::Taxonomy;

    fn agg() -> AggregateResult {
        AggregateResult {
            expense_total: 80000.0,
            income_total: 12000000.0,
            balance: 11920000.0,
            transaction_count: 3,
            top_categories: vec![
                ("Food".to_string(), 50000.0),
                ("Transportation".to_string(), 30000.0),
            ],
        }
    }

    #[test]
    fn test_summary_prompt_contains_data() {
        let b = PromptBuilder::default();
        let req = b.summary_request(&agg(), 11920000.0);
        assert_eq!(req.system, DEFAULT_SYSTEM_PROMPT);
        assert!(req.body.contains("Expenses=80000"));
        assert!(req.body.contains("Income=12000000"));
        assert!(req.body.contains("Balance=11920000"));
        assert!(req.body.contains("Top={Food: 50000, Transportation: 30000}"));
        assert!(req.prompt().starts_with(DEFAULT_SYSTEM_PROMPT));
        assert!(req.prompt().ends_with(&req.body));
    }

    #[test]
    fn test_blank_system_falls_back() {
        assert_eq!(PromptBuilder::new("  \n").system(), DEFAULT_SYSTEM_PROMPT);
        assert_eq!(PromptBuilder::new(" Be terse. ").system(), "Be terse.");
    }

    #[test]
    fn test_runway_prompt_uses_absolute_burn_rate() {
        let b = PromptBuilder::default();
        let f = RunwayForecast {
            days_remaining: Days::Finite(9),
            depletion_date: NaiveDate::from_ymd_opt(2025, 6, 10),
            daily_burn_rate: -100.0,
            intercept: 100.0,
            r_squared: 0.987,
        };
        let req = b.runway_request(&f, 1000.0);
        assert!(req.body.contains("burn rate≈100/day"));
        assert!(req.body.contains("until 2025-06-10"));
        assert!(req.body.contains("R²=0.99"));

        let flat = RunwayForecast { days_remaining: Days::Infinite, depletion_date: None, ..f };
        assert!(b.runway_request(&flat, 1000.0).body.contains("not projected to run out"));
    }

    #[test]
    fn test_purchase_prompt() {
        let b = PromptBuilder::default();
        let p = Purchase {
            item: "Headphones".to_string(),
            price: 1500000.0,
            reason: "".to_string(),
            category: "Gadgets".to_string(),
        };
        let req = b.purchase_request(&p, 5000000.0).with_temperature(0.2);
        assert!(req.body.contains("buy Headphones for 1500000"));
        assert!(req.body.contains("reason: none given"));
        assert_eq!(req.temperature, Some(0.2));
    }

    #[test]
    fn test_chat_context_is_bounded_json() {
        let tax = Taxonomy::standard();
        let ts = NaiveDateTime::parse_from_str("2025-06-01 08:00:00", "%Y-%m-%d %H:%M:%S").unwrap();
        let txns: Vec<Transaction> = (0..5)
            .map(|_| Transaction::new(ts, TxnKind::Expense, 10.0, "Food", "Cash", &tax))
            .collect();
        let rows: Vec<&Transaction> = txns.iter().collect();
        let ctx = ChatContext::new(100.0, &agg(), 1000.0, &rows, 2);
        assert_eq!(ctx.transaction_preview.len(), 2);

        let req = PromptBuilder::default().chat_request(&ctx, "  where does my money go? ");
        let (context, question) = req.body.split_once("\nQuestion: ").unwrap();
        assert_eq!(question, "where does my money go?");
        let v: serde_json::Value = serde_json::from_str(context.trim_start_matches("Context: ")).unwrap();
        assert_eq!(v["top_categories"][0], "Food");
        assert_eq!(v["transaction_preview"][0]["type"], "expense");
        assert_eq!(v["transaction_preview"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_report_prompt_progress() {
        let req = PromptBuilder::default().report_request(&agg(), 5000000.0, 10000000.0);
        assert!(req.body.contains("savings progress 50.0%"));
        let req = PromptBuilder::default().report_request(&agg(), 5000000.0, 0.0);
        assert!(req.body.contains("savings progress 0.0%"));
    }
}
