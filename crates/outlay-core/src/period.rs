//! Reporting periods and calendar-month helpers
//!
//! All windows are computed against an explicit reference date so results
//! are reproducible; the service supplies "today".

use chrono::{Datelike, Duration, Months, NaiveDate};
use serde::{Deserialize, Serialize};

/// Period filter for spending queries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Period {
    /// Since the first day of the current calendar month
    Month,
    /// The last 3 months
    Quarter,
    /// The last 12 months
    Year,
    /// No date filter
    All,
}

impl Period {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Month => "month",
            Self::Quarter => "quarter",
            Self::Year => "year",
            Self::All => "all",
        }
    }

    /// Inclusive date range for this period, or None for `All`
    pub fn range(&self, today: NaiveDate) -> Option<(NaiveDate, NaiveDate)> {
        let from = match self {
            Self::Month => first_of_month(today),
            Self::Quarter => shift_months(today, -3),
            Self::Year => shift_months(today, -12),
            Self::All => return None,
        };
        Some((from, today))
    }

    /// The equally long window immediately before `range`
    pub fn previous_range(&self, today: NaiveDate) -> Option<(NaiveDate, NaiveDate)> {
        let (from, _) = self.range(today)?;
        let to = from - Duration::days(1);
        let prev_from = match self {
            Self::Month => shift_months(from, -1),
            Self::Quarter => shift_months(from, -3),
            Self::Year => shift_months(from, -12),
            Self::All => return None,
        };
        Some((prev_from, to))
    }
}

impl std::str::FromStr for Period {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "month" => Ok(Self::Month),
            "quarter" => Ok(Self::Quarter),
            "year" => Ok(Self::Year),
            "all" => Ok(Self::All),
            _ => Err(format!(
                "Unknown period: {} (valid: month, quarter, year, all)",
                s
            )),
        }
    }
}

impl std::fmt::Display for Period {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Window length for period-over-period comparisons
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PeriodComparison {
    #[serde(rename = "1m")]
    OneMonth,
    #[serde(rename = "3m")]
    ThreeMonths,
    #[serde(rename = "6m")]
    SixMonths,
    #[serde(rename = "12m")]
    TwelveMonths,
}

impl PeriodComparison {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OneMonth => "1m",
            Self::ThreeMonths => "3m",
            Self::SixMonths => "6m",
            Self::TwelveMonths => "12m",
        }
    }

    pub fn months(&self) -> i32 {
        match self {
            Self::OneMonth => 1,
            Self::ThreeMonths => 3,
            Self::SixMonths => 6,
            Self::TwelveMonths => 12,
        }
    }

    /// (current, previous) inclusive windows; current ends at `today`
    pub fn windows(
        &self,
        today: NaiveDate,
    ) -> ((NaiveDate, NaiveDate), (NaiveDate, NaiveDate)) {
        let months = self.months();
        let current_from = shift_months(today, -months) + Duration::days(1);
        let previous_to = current_from - Duration::days(1);
        let previous_from = shift_months(previous_to, -months) + Duration::days(1);
        ((current_from, today), (previous_from, previous_to))
    }
}

impl std::str::FromStr for PeriodComparison {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "1m" => Ok(Self::OneMonth),
            "3m" => Ok(Self::ThreeMonths),
            "6m" => Ok(Self::SixMonths),
            "12m" => Ok(Self::TwelveMonths),
            _ => Err(format!(
                "Unknown comparison window: {} (valid: 1m, 3m, 6m, 12m)",
                s
            )),
        }
    }
}

impl std::fmt::Display for PeriodComparison {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Longest month window any query builds (ten years)
pub const MAX_WINDOW_MONTHS: usize = 120;

/// Longest forecast horizon, in months
pub const MAX_HORIZON_MONTHS: usize = 60;

/// `YYYY-MM` key for the month containing `date`
pub fn month_key(date: NaiveDate) -> String {
    date.format("%Y-%m").to_string()
}

pub fn first_of_month(date: NaiveDate) -> NaiveDate {
    date - Duration::days(date.day0() as i64)
}

/// Move a date by whole calendar months, clamping the day to the target month
pub fn shift_months(date: NaiveDate, delta: i32) -> NaiveDate {
    let shifted = if delta >= 0 {
        date.checked_add_months(Months::new(delta as u32))
    } else {
        date.checked_sub_months(Months::new(delta.unsigned_abs()))
    };
    shifted.unwrap_or(date)
}

pub fn days_in_month(date: NaiveDate) -> u32 {
    let first = first_of_month(date);
    let next = shift_months(first, 1);
    (next - first).num_days().max(1) as u32
}

/// Month keys for the `count` months ending with the month of `end`, oldest first
pub fn month_keys_ending(end: NaiveDate, count: usize) -> Vec<String> {
    let first = first_of_month(end);
    (0..count.min(MAX_WINDOW_MONTHS))
        .rev()
        .map(|offset| month_key(shift_months(first, -(offset as i32))))
        .collect()
}
