//! Date-range presets for the dashboard filter.

use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Period {
    /// First of the current month through today
    #[default]
    ThisMonth,
    /// The whole previous calendar month
    LastMonth,
    /// Earliest through latest transaction date
    All,
    Custom { start: NaiveDate, end: NaiveDate },
}

impl Period {
    /// Resolve to an inclusive (start, end) pair. `data_span` is the
    /// (min, max) date of the loaded rows; `All` with no data falls back to today.
    pub fn resolve(
        &self,
        today: NaiveDate,
        data_span: Option<(NaiveDate, NaiveDate)>,
    ) -> (NaiveDate, NaiveDate) {
        match *self {
            Period::ThisMonth => (first_of_month(today), today),
            Period::LastMonth => {
                let last = first_of_month(today) - Duration::days(1);
                (first_of_month(last), last)
            }
            Period::All => data_span.unwrap_or((today, today)),
            Period::Custom { start, end } => {
                if start <= end {
                    (start, end)
                } else {
                    (end, start)
                }
            }
        }
    }
}

impl FromStr for Period {
    type Err = String;

    /// Parses preset names; custom ranges are built from explicit dates.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "this-month" | "this_month" | "month" => Ok(Period::ThisMonth),
            "last-month" | "last_month" => Ok(Period::LastMonth),
            "all" => Ok(Period::All),
            other => Err(format!(
                "unknown period '{other}' (expected this-month, last-month or all)"
            )),
        }
    }
}

fn first_of_month(d: NaiveDate) -> NaiveDate {
    d.with_day(1).unwrap_or(d)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_this_and_last_month() {
        let today = d(2025, 3, 15);
        assert_eq!(Period::ThisMonth.resolve(today, None), (d(2025, 3, 1), today));
        assert_eq!(Period::LastMonth.resolve(today, None), (d(2025, 2, 1), d(2025, 2, 28)));
        assert_eq!(
            Period::LastMonth.resolve(d(2025, 1, 10), None),
            (d(2024, 12, 1), d(2024, 12, 31))
        );
    }

    #[test]
    fn test_all_and_custom() {
        let today = d(2025, 3, 15);
        let span = Some((d(2024, 1, 1), d(2025, 2, 2)));
        assert_eq!(Period::All.resolve(today, span), (d(2024, 1, 1), d(2025, 2, 2)));
        assert_eq!(Period::All.resolve(today, None), (today, today));

        let custom = Period::Custom { start: d(2025, 2, 10), end: d(2025, 2, 1) };
        assert_eq!(custom.resolve(today, span), (d(2025, 2, 1), d(2025, 2, 10)));
    }

    #[test]
    fn test_parse() {
        assert_eq!("this-month".parse::<Period>().unwrap(), Period::ThisMonth);
        assert_eq!("ALL".parse::<Period>().unwrap(), Period::All);
        assert!("yesterday".parse::<Period>().is_err());
    }
}
