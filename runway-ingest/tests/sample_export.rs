use chrono::NaiveDate;
use runway_core::{
    DEFAULT_TOP_N, Days, EssentialSet, Filter, Taxonomy, aggregate, authoritative_balance,
    daily_essential_series, forecast_runway,
};
use runway_ingest::parse_mymoney_csv;
use std::path::PathBuf;

fn sample_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .unwrap()
        .join("fixtures")
        .join("mymoney_sample.csv")
}

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

#[test]
fn test_load_sample_drops_bad_timestamp() {
    let tax = Taxonomy::standard();
    let loaded = parse_mymoney_csv(sample_path(), &tax).unwrap();
    assert_eq!(loaded.report.rows_read, 11);
    assert_eq!(loaded.report.dropped_bad_time, 1);
    assert_eq!(loaded.transactions.len(), 10);

    // Unknown category collapses into the catch-all
    assert!(loaded.transactions.iter().any(|t| t.category == "Misc"));
    for t in &loaded.transactions {
        assert!(tax.contains(&t.category), "{} not in taxonomy", t.category);
    }
}

#[test]
fn test_aggregate_sample_all_accounts() {
    let tax = Taxonomy::standard();
    let txns = parse_mymoney_csv(sample_path(), &tax).unwrap().transactions;
    let filter = Filter::covering(&txns).unwrap();
    let agg = aggregate(&txns, &filter, DEFAULT_TOP_N);

    assert_eq!(agg.expense_total, 905000.0);
    assert_eq!(agg.income_total, 12150000.0);
    assert_eq!(agg.balance, 11245000.0);
    assert_eq!(agg.top_category_names(), vec!["Bills", "Entertainment", "Food"]);
    assert_eq!(agg.top_categories[2].1, 150000.0);
}

#[test]
fn test_aggregate_sample_single_account() {
    let tax = Taxonomy::standard();
    let txns = parse_mymoney_csv(sample_path(), &tax).unwrap().transactions;
    let filter = Filter::new(d(2025, 6, 1), d(2025, 6, 30), ["Cash"]);
    let agg = aggregate(&txns, &filter, DEFAULT_TOP_N);

    assert_eq!(agg.expense_total, 235000.0);
    assert_eq!(agg.income_total, 12000000.0);
    assert_eq!(agg.expense_total + agg.balance, agg.income_total);
}

#[test]
fn test_runway_from_sample() {
    let tax = Taxonomy::standard();
    let txns = parse_mymoney_csv(sample_path(), &tax).unwrap().transactions;
    let filter = Filter::covering(&txns).unwrap();
    let agg = aggregate(&txns, &filter, DEFAULT_TOP_N);

    let series = daily_essential_series(&txns, &filter, &EssentialSet::from_taxonomy(&tax));
    assert_eq!(series.len(), 6);

    let balance = authoritative_balance(agg.balance, None);
    let forecast = forecast_runway(&series, balance.amount(), d(2025, 6, 10)).unwrap();
    assert!(forecast.daily_burn_rate > 0.0);
    assert!(forecast.r_squared > 0.5 && forecast.r_squared <= 1.0);
    match forecast.days_remaining {
        Days::Finite(days) => assert!((100..250).contains(&days), "days = {days}"),
        Days::Infinite => panic!("expected a finite runway"),
    }
    assert!(forecast.depletion_date.unwrap() > d(2025, 6, 10));

    // A user-supplied zero balance is ignored; the calculated one is used
    let same = forecast_runway(&series, authoritative_balance(agg.balance, Some(0.0)).amount(), d(2025, 6, 10));
    assert_eq!(same, Some(forecast));
}
