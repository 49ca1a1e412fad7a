//! runway-core: taxonomy, aggregation and runway forecasting over personal transactions

pub mod aggregate;
pub mod balance;
pub mod forecast;
pub mod period;
pub mod taxonomy;
pub mod transaction;

pub use aggregate::{
    AggregateResult, CategoryTotal, DailyAmount, EssentialSet, Filter, DEFAULT_TOP_N,
    aggregate, category_breakdown, daily_essential_series, daily_expenses, filter_rows,
};
pub use balance::{BalanceSource, authoritative_balance, goal_progress};
pub use forecast::{Days, LinearFit, RunwayForecast, fit_linear, forecast_runway};
pub use period::Period;
pub use taxonomy::{Group, MISC, Normalized, Taxonomy};
pub use transaction::{Transaction, TxnKind};
