//! Runway forecast: how many days a balance lasts under the observed trend.
//!
//! Fits ordinary least squares to cumulative essential spend against a day
//! index and solves for the day the fitted line reaches the balance.
//!
//! Sign convention: daily amounts are positive outflows, so cumulative spend
//! grows and a spending trend has a *positive* slope. `daily_burn_rate` is the
//! raw slope; display code shows its absolute value.

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::aggregate::DailyAmount;

/// Days until depletion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Days {
    Finite(u32),
    /// Flat trend, or depletion past the last representable date
    Infinite,
}

/// Outcome of a successful projection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunwayForecast {
    pub days_remaining: Days,
    /// Set exactly when `days_remaining` is finite
    pub depletion_date: Option<NaiveDate>,
    pub daily_burn_rate: f64,
    pub intercept: f64,
    /// Coefficient of determination, in [0, 1]
    pub r_squared: f64,
}

impl RunwayForecast {
    pub fn is_infinite(&self) -> bool {
        self.days_remaining == Days::Infinite
    }
}

/// Least-squares line through (x, y)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearFit {
    pub slope: f64,
    pub intercept: f64,
    pub r_squared: f64,
}

/// Fit y ≈ slope·x + intercept. With no spread in x the slope is zero and
/// the intercept is the mean of y. Returns None for empty input.
pub fn fit_linear(points: &[(f64, f64)]) -> Option<LinearFit> {
    if points.is_empty() {
        return None;
    }
    let n = points.len() as f64;
    let mean_x = points.iter().map(|(x, _)| x).sum::<f64>() / n;
    let mean_y = points.iter().map(|(_, y)| y).sum::<f64>() / n;

    let mut sxx = 0.0;
    let mut sxy = 0.0;
    for (x, y) in points {
        sxx += (x - mean_x) * (x - mean_x);
        sxy += (x - mean_x) * (y - mean_y);
    }

    let slope = if sxx == 0.0 { 0.0 } else { sxy / sxx };
    let intercept = mean_y - slope * mean_x;

    let mut ss_res = 0.0;
    let mut ss_tot = 0.0;
    for (x, y) in points {
        let predicted = slope * x + intercept;
        ss_res += (y - predicted) * (y - predicted);
        ss_tot += (y - mean_y) * (y - mean_y);
    }

    let r_squared = if ss_tot == 0.0 {
        if ss_res == 0.0 { 1.0 } else { 0.0 }
    } else {
        (1.0 - ss_res / ss_tot).clamp(0.0, 1.0)
    };

    Some(LinearFit {
        slope,
        intercept,
        r_squared,
    })
}

/// Project when `balance` is exhausted by the trend in `series`.
///
/// Returns None ("insufficient data") when the series is empty or the balance
/// is not positive. `today` is the evaluation date, used when the fitted line
/// has already crossed the balance.
pub fn forecast_runway(
    series: &[DailyAmount],
    balance: f64,
    today: NaiveDate,
) -> Option<RunwayForecast> {
    if series.is_empty() || !balance.is_finite() || balance <= 0.0 {
        return None;
    }

    let mut days = series.to_vec();
    days.sort_by_key(|d| d.date);
    let min_date = days[0].date;

    let mut cumulative = 0.0;
    let points: Vec<(f64, f64)> = days
        .iter()
        .map(|d| {
            cumulative += d.amount;
            ((d.date - min_date).num_days() as f64, cumulative)
        })
        .collect();

    let fit = fit_linear(&points)?;

    if fit.slope == 0.0 {
        return Some(RunwayForecast {
            days_remaining: Days::Infinite,
            depletion_date: None,
            daily_burn_rate: fit.slope,
            intercept: fit.intercept,
            r_squared: fit.r_squared,
        });
    }

    let days_float = (balance - fit.intercept) / fit.slope;
    if days_float < 0.0 {
        return Some(RunwayForecast {
            days_remaining: Days::Finite(0),
            depletion_date: Some(today),
            daily_burn_rate: fit.slope,
            intercept: fit.intercept,
            r_squared: fit.r_squared,
        });
    }

    let days_ceil = days_float.ceil();
    let depletion = (days_ceil <= u32::MAX as f64)
        .then(|| days_ceil as u32)
        .and_then(|days| {
            min_date
                .checked_add_signed(Duration::days(days as i64))
                .map(|date| (days, date))
        });

    // Beyond the representable calendar the trend is as good as flat.
    let (days_remaining, depletion_date) = match depletion {
        Some((days, date)) => (Days::Finite(days), Some(date)),
        None => (Days::Infinite, None),
    };

    Some(RunwayForecast {
        days_remaining,
        depletion_date,
        daily_burn_rate: fit.slope,
        intercept: fit.intercept,
        r_squared: fit.r_squared,
    })
}
