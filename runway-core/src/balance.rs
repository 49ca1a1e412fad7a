//! Which balance is authoritative, and savings-goal progress.

use serde::{Deserialize, Serialize};

/// Where the balance used for display and forecasting came from
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum BalanceSource {
    /// User-supplied current balance
    Override(f64),
    /// Income minus expense over the filtered rows
    Calculated(f64),
}

impl BalanceSource {
    pub fn amount(&self) -> f64 {
        match self {
            BalanceSource::Override(v) | BalanceSource::Calculated(v) => *v,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            BalanceSource::Override(_) => "actual",
            BalanceSource::Calculated(_) => "calculated",
        }
    }
}

/// Precedence: a positive override wins; zero, negative or missing falls back
/// to the calculated balance.
pub fn authoritative_balance(calculated: f64, override_balance: Option<f64>) -> BalanceSource {
    match override_balance {
        Some(v) if v > 0.0 && v.is_finite() => BalanceSource::Override(v),
        _ => BalanceSource::Calculated(calculated),
    }
}

/// balance / goal clamped to [0, 1]; a zero goal reports no progress.
pub fn goal_progress(balance: f64, goal: f64) -> f64 {
    if goal <= 0.0 || !goal.is_finite() {
        return 0.0;
    }
    (balance / goal).clamp(0.0, 1.0)
}
