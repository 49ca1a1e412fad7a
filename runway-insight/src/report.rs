//! Plain-text rendering: dashboard metrics, runway statement, exported report.

use chrono::NaiveDateTime;
use runway_core::{AggregateResult, BalanceSource, CategoryTotal, DailyAmount, Days, RunwayForecast, goal_progress};

/// Whole numbers print without decimals, everything else with two.
pub fn format_number(v: f64) -> String {
    if v.fract() == 0.0 && v.abs() < 1e15 {
        format!("{v:.0}")
    } else {
        format!("{v:.2}")
    }
}

/// Currency label plus the amount rounded to whole units with thousands separators,
/// e.g. "Rp 11,920,000".
pub fn format_money(v: f64, currency: &str) -> String {
    let rounded = format!("{:.0}", v.abs());
    let mut grouped = String::with_capacity(rounded.len() + rounded.len() / 3);
    for (i, c) in rounded.chars().enumerate() {
        if i > 0 && (rounded.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    let sign = if v < 0.0 && rounded != "0" { "-" } else { "" };
    if currency.is_empty() {
        format!("{sign}{grouped}")
    } else {
        format!("{currency} {sign}{grouped}")
    }
}

/// One newline-terminated block from `lines`
fn block(lines: impl IntoIterator<Item = String>) -> String {
    lines.into_iter().map(|l| l + "\n").collect()
}

/// Headline metrics: expense, income, balance, savings progress
pub fn render_summary(
    aggregate: &AggregateResult,
    balance: BalanceSource,
    savings_goal: f64,
    currency: &str,
) -> String {
    let progress = goal_progress(balance.amount(), savings_goal);
    let top = if aggregate.top_categories.is_empty() {
        "(no expenses in range)".to_string()
    } else {
        aggregate
            .top_categories
            .iter()
            .map(|(c, a)| format!("{c} {}", format_money(*a, currency)))
            .collect::<Vec<_>>()
            .join(" | ")
    };
    block([
        format!("Expenses : {}", format_money(aggregate.expense_total, currency)),
        format!("Income   : {}", format_money(aggregate.income_total, currency)),
        format!(
            "Balance  : {} ({})",
            format_money(balance.amount(), currency),
            balance.label()
        ),
        format!(
            "Savings  : {:.1}% of {}",
            progress * 100.0,
            format_money(savings_goal, currency)
        ),
        format!("Top      : {top}"),
    ])
}

/// Category table with the discretionary/essential split
pub fn render_breakdown(rows: &[CategoryTotal], currency: &str) -> String {
    let width = rows.iter().map(|r| r.category.len()).max().unwrap_or(0).max(8);
    block(rows.iter().map(|r| {
        let kind = if r.discretionary { "Lifestyle" } else { "Essential" };
        format!(
            "{:<width$}  {:>18}  {}",
            r.category,
            format_money(r.amount, currency),
            kind,
        )
    }))
}

/// Daily expense series, one line per day
pub fn render_daily(series: &[DailyAmount], currency: &str) -> String {
    block(
        series
            .iter()
            .map(|d| format!("{}  {:>18}", d.date.format("%Y-%m-%d"), format_money(d.amount, currency))),
    )
}

/// Runway statement, or the insufficient-data notice
pub fn render_runway(forecast: Option<&RunwayForecast>, currency: &str) -> String {
    let Some(f) = forecast else {
        return "Not enough data to project a runway.".to_string();
    };

    let headline = match (f.days_remaining, f.depletion_date) {
        (Days::Infinite, _) => "Balance is not projected to run out at the current trend.".to_string(),
        (Days::Finite(days), Some(date)) => {
            format!("Balance lasts {days} days (until {})", date.format("%d %b %Y"))
        }
        (Days::Finite(days), None) => format!("Balance lasts {days} days"),
    };

    format!(
        "{headline}\n\nℹ️ Stats: burn-rate ≈ {}/day, intercept {}, R² = {:.2}",
        format_money(f.daily_burn_rate.abs(), currency),
        format_money(f.intercept, currency),
        f.r_squared,
    )
}

/// Text written by `runway report`: header, metrics, then the generated summary
pub fn render_report(
    generated_at: NaiveDateTime,
    aggregate: &AggregateResult,
    balance: BalanceSource,
    savings_goal: f64,
    currency: &str,
    ai_text: &str,
) -> String {
    let mut s = block([
        format!("Finance report ({})", generated_at.format("%Y-%m-%d %H:%M")),
        "=".repeat(40),
    ]);
    s.push_str(&render_summary(aggregate, balance, savings_goal, currency));
    s.push('\n');
    s.push_str(ai_text.trim());
    s.push('\n');
    s
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn agg() -> AggregateResult {
        AggregateResult {
            expense_total: 80000.0,
            income_total: 12000000.0,
            balance: 11920000.0,
            transaction_count: 3,
            top_categories: vec![("Food".to_string(), 50000.0)],
        }
    }

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(80000.0), "80000");
        assert_eq!(format_number(12.5), "12.50");
        assert_eq!(format_number(-3.0), "-3");
    }

    #[test]
    fn test_format_money() {
        assert_eq!(format_money(11920000.0, "Rp"), "Rp 11,920,000");
        assert_eq!(format_money(999.0, "Rp"), "Rp 999");
        assert_eq!(format_money(1000.4, ""), "1,000");
        assert_eq!(format_money(-2500.0, "$"), "$ -2,500");
        assert_eq!(format_money(-0.2, "Rp"), "Rp 0");
    }

    #[test]
    fn test_render_summary() {
        let s = render_summary(&agg(), BalanceSource::Calculated(11920000.0), 10000000.0, "Rp");
        assert!(s.contains("Expenses : Rp 80,000"));
        assert!(s.contains("Balance  : Rp 11,920,000 (calculated)"));
        assert!(s.contains("Savings  : 100.0% of Rp 10,000,000"));
        assert!(s.contains("Top      : Food Rp 50,000"));
    }

    #[test]
    fn test_render_runway_variants() {
        assert_eq!(render_runway(None, "Rp"), "Not enough data to project a runway.");

        let f = RunwayForecast {
            days_remaining: Days::Finite(9),
            depletion_date: NaiveDate::from_ymd_opt(2025, 6, 10),
            daily_burn_rate: 100.0,
            intercept: 100.0,
            r_squared: 1.0,
        };
        let s = render_runway(Some(&f), "Rp");
        assert!(s.starts_with("Balance lasts 9 days (until 10 Jun 2025)"));
        assert!(s.contains("burn-rate ≈ Rp 100/day"));
        assert!(s.contains("R² = 1.00"));

        let flat = RunwayForecast { days_remaining: Days::Infinite, depletion_date: None, ..f };
        assert!(render_runway(Some(&flat), "Rp").contains("not projected to run out"));
    }

    #[test]
    fn test_render_report() {
        let at = NaiveDate::from_ymd_opt(2025, 6, 30).unwrap().and_hms_opt(9, 0, 0).unwrap();
        let s = render_report(at, &agg(), BalanceSource::Override(5000000.0), 10000000.0, "Rp", " Tip 1 \n");
        assert!(s.starts_with("Finance report (2025-06-30 09:00)"));
        assert!(s.contains("(actual)"));
        assert!(s.contains("50.0%"));
        assert!(s.trim_end().ends_with("Tip 1"));
    }

    #[test]
    fn test_tables_are_newline_terminated() {
        let rows = vec![
            CategoryTotal { category: "Travel".into(), amount: 70000.0, discretionary: true },
            CategoryTotal { category: "Food".into(), amount: 50000.0, discretionary: false },
        ];
        let table = render_breakdown(&rows, "Rp");
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("Travel") && lines[0].ends_with("Lifestyle"));
        assert!(table.ends_with('\n'));
        assert_eq!(render_breakdown(&[], "Rp"), "");

        let day = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();
        assert_eq!(
            render_daily(&[DailyAmount::new(day, 1500.0)], "Rp"),
            format!("2025-06-01  {:>18}\n", "Rp 1,500")
        );

        let summary = render_summary(&agg(), BalanceSource::Calculated(0.0), 0.0, "Rp");
        assert_eq!(summary.lines().count(), 5);
        assert!(summary.ends_with('\n'));
    }
}
