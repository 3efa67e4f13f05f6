use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Inclusive order-date range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    pub fn is_ordered(&self) -> bool {
        self.start <= self.end
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// True when `other` lies entirely inside this range
    pub fn covers(&self, other: &DateRange) -> bool {
        self.contains(other.start) && self.contains(other.end)
    }
}

/// Committed filter driving every dashboard query.
///
/// An empty `states` set means "every state" (no restriction), while an empty
/// `products` set means "no product", so queries return nothing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterState {
    pub date_range: DateRange,
    pub products: BTreeSet<String>,
    pub states: BTreeSet<String>,
}

impl FilterState {
    pub fn all_states_selected(&self) -> bool {
        self.states.is_empty()
    }
}

/// Time bucket used by the line chart and by pinned periods
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    #[default]
    Month,
    Year,
}

impl Granularity {
    /// Period label: "YYYY-MM" for months, "YYYY" for years
    pub fn bucket(&self, date: NaiveDate) -> String {
        match self {
            Granularity::Month => format!("{:04}-{:02}", date.year(), date.month()),
            Granularity::Year => format!("{:04}", date.year()),
        }
    }

    /// Whether `period` is a well-formed label for this granularity
    pub fn accepts(&self, period: &str) -> bool {
        match self {
            // The parser is lenient about padding and signs, so only the
            // canonical "YYYY-MM" spelling of the parsed month is accepted
            Granularity::Month => NaiveDate::parse_from_str(&format!("{}-01", period), "%Y-%m-%d")
                .is_ok_and(|first| self.bucket(first) == period),
            Granularity::Year => period.len() == 4 && period.chars().all(|c| c.is_ascii_digit()),
        }
    }
}
