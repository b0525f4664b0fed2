//! Inclusive date range for schedules and reports.

use chrono::{Datelike, Duration, NaiveDate};

use crate::constants::MAX_RANGE_DAYS;
use crate::error::{HubError, HubResult};

/// Inclusive range of calendar days.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

impl DateRange {
    pub fn new(from: NaiveDate, to: NaiveDate) -> HubResult<Self> {
        if to < from {
            return Err(HubError::validation(format!(
                "Range end {to} is before its start {from}"
            )));
        }
        let range = DateRange { from, to };
        if range.len_days() > MAX_RANGE_DAYS {
            return Err(HubError::validation(format!(
                "Range {from}..{to} is longer than {MAX_RANGE_DAYS} days"
            )));
        }
        Ok(range)
    }

    /// The calendar month containing `date`.
    pub fn month_of(date: NaiveDate) -> Self {
        let from = date.with_day(1).unwrap_or(date);
        let next_month = if from.month() == 12 {
            NaiveDate::from_ymd_opt(from.year() + 1, 1, 1)
        } else {
            NaiveDate::from_ymd_opt(from.year(), from.month() + 1, 1)
        };
        let to = next_month.and_then(|d| d.pred_opt()).unwrap_or(from);
        DateRange { from, to }
    }

    /// Parse CLI-style bounds.
    /// - `from`: YYYY-MM-DD, defaults to the first day of `today`'s month
    /// - `to`: YYYY-MM-DD, defaults to the last day of `from`'s month
    pub fn from_args(from: Option<&str>, to: Option<&str>, today: NaiveDate) -> HubResult<Self> {
        let from = match from {
            Some(s) => parse_date(s)?,
            None => Self::month_of(today).from,
        };
        let to = match to {
            Some(s) => parse_date(s)?,
            None => Self::month_of(from).to,
        };
        Self::new(from, to)
    }

    pub fn len_days(&self) -> i64 {
        (self.to - self.from).num_days() + 1
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.from <= date && date <= self.to
    }

    /// Every day in the range, in order.
    pub fn days(&self) -> impl Iterator<Item = NaiveDate> + use<> {
        let from = self.from;
        (0..self.len_days()).map(move |i| from + Duration::days(i))
    }
}

/// Parse YYYY-MM-DD
pub fn parse_date(s: &str) -> HubResult<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .map_err(|_| HubError::validation(format!("Invalid date format '{s}'. Expected YYYY-MM-DD")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_month_of_december() {
        let range = DateRange::month_of(parse_date("2024-12-17").unwrap());
        assert_eq!(range.from, parse_date("2024-12-01").unwrap());
        assert_eq!(range.to, parse_date("2024-12-31").unwrap());
        assert_eq!(range.days().count(), 31);
    }

    #[test]
    fn test_from_args_defaults_to_current_month() {
        let today = parse_date("2025-02-10").unwrap();
        let range = DateRange::from_args(None, None, today).unwrap();
        assert_eq!(range.from, parse_date("2025-02-01").unwrap());
        assert_eq!(range.to, parse_date("2025-02-28").unwrap());
    }

    #[test]
    fn test_rejects_inverted_and_oversized_ranges() {
        let today = parse_date("2025-02-10").unwrap();
        assert!(DateRange::from_args(Some("2025-03-01"), Some("2025-02-01"), today).is_err());
        assert!(DateRange::from_args(Some("2020-01-01"), Some("2025-01-01"), today).is_err());
        assert!(DateRange::from_args(Some("2025-13-01"), None, today).is_err());
    }
}
