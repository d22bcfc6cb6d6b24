//! Month calendar model.
//!
//! A target month is addressed by day index `0..days`. The calendar
//! derives weekdays, date labels and public holidays for those indices.
//!
//! # Labels
//! Matrix columns use `month/day` labels without zero padding (`3/7`).
//! History rows use ISO dates (`2025-03-07`).

use std::collections::BTreeSet;

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

/// A public holiday entry from the holiday master.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicHoliday {
    /// Calendar date.
    pub date: NaiveDate,
    /// Holiday name.
    pub name: String,
}

impl PublicHoliday {
    /// Creates a holiday entry.
    pub fn new(date: NaiveDate, name: impl Into<String>) -> Self {
        Self {
            date,
            name: name.into(),
        }
    }
}

/// One target month with its holiday day indices.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthCalendar {
    /// Calendar year.
    pub year: i32,
    /// Month, 1-based.
    pub month: u32,
    /// Day indices that are public holidays (forced rest).
    pub holidays: BTreeSet<usize>,
    first: NaiveDate,
    days: usize,
}

impl MonthCalendar {
    /// Creates a calendar for `year`/`month` with no holidays.
    ///
    /// Returns `None` for an invalid month.
    pub fn new(year: i32, month: u32) -> Option<Self> {
        let first = NaiveDate::from_ymd_opt(year, month, 1)?;
        let (ny, nm) = if month == 12 { (year + 1, 1) } else { (year, month + 1) };
        let next = NaiveDate::from_ymd_opt(ny, nm, 1)?;
        let days = (next - first).num_days() as usize;
        Some(Self {
            year,
            month,
            holidays: BTreeSet::new(),
            first,
            days,
        })
    }

    /// Marks a day index as a holiday. Out-of-range indices are ignored.
    pub fn with_holiday(mut self, day: usize) -> Self {
        if day < self.days {
            self.holidays.insert(day);
        }
        self
    }

    /// Marks every master holiday that falls inside this month.
    pub fn with_public_holidays(mut self, holidays: &[PublicHoliday]) -> Self {
        for h in holidays {
            if let Some(day) = self.day_index(h.date) {
                self.holidays.insert(day);
            }
        }
        self
    }

    /// Number of days in the month.
    #[inline]
    pub fn days(&self) -> usize {
        self.days
    }

    /// First date of the month.
    #[inline]
    pub fn first_date(&self) -> NaiveDate {
        self.first
    }

    /// Date of a day index.
    pub fn date(&self, day: usize) -> NaiveDate {
        self.first + Duration::days(day as i64)
    }

    /// Day index of a date, if it lies in this month.
    pub fn day_index(&self, date: NaiveDate) -> Option<usize> {
        (date.year() == self.year && date.month() == self.month).then(|| date.day0() as usize)
    }

    /// Weekday of a day index.
    pub fn weekday(&self, day: usize) -> Weekday {
        self.date(day).weekday()
    }

    /// Whether a day index is a public holiday.
    #[inline]
    pub fn is_holiday(&self, day: usize) -> bool {
        self.holidays.contains(&day)
    }

    /// Whether a day index falls on Saturday or Sunday.
    pub fn is_weekend(&self, day: usize) -> bool {
        matches!(self.weekday(day), Weekday::Sat | Weekday::Sun)
    }

    /// Weekend days that are not holidays.
    pub fn weekend_days(&self) -> Vec<usize> {
        (0..self.days)
            .filter(|&d| !self.is_holiday(d) && self.is_weekend(d))
            .collect()
    }

    /// Whether this is the final month of the year.
    #[inline]
    pub fn is_year_end(&self) -> bool {
        self.month == 12
    }

    /// Day index universally forced to duty (the 4th of January), unless
    /// it is a holiday.
    pub fn forced_duty_day(&self) -> Option<usize> {
        (self.month == 1 && self.days >= 4 && !self.is_holiday(3)).then_some(3)
    }

    /// Matrix column label (`month/day`).
    pub fn label(&self, day: usize) -> String {
        format!("{}/{}", self.month, day + 1)
    }

    /// All column labels in day order.
    pub fn labels(&self) -> Vec<String> {
        (0..self.days).map(|d| self.label(d)).collect()
    }

    /// Parses a `month/day` label of this month into a day index.
    pub fn parse_label(&self, label: &str) -> Option<usize> {
        let (m, d) = label.trim().split_once('/')?;
        let m: u32 = m.trim().parse().ok()?;
        let d: usize = d.trim().parse().ok()?;
        (m == self.month && (1..=self.days).contains(&d)).then(|| d - 1)
    }

    /// Whether a date falls in the same year as this month.
    pub fn same_year(&self, date: NaiveDate) -> bool {
        date.year() == self.year
    }

    /// The month after this one.
    pub fn next_month(year: i32, month: u32) -> (i32, u32) {
        if month >= 12 {
            (year + 1, 1)
        } else {
            (year, month + 1)
        }
    }

    /// Default target period for a given day: two months ahead through the
    /// 10th, three months ahead afterwards.
    pub fn default_target(today: NaiveDate) -> (i32, u32) {
        let ahead = if today.day() <= 10 { 2 } else { 3 };
        let mut year = today.year();
        let mut month = today.month() + ahead;
        while month > 12 {
            month -= 12;
            year += 1;
        }
        (year, month)
    }
}

/// Short weekday label used in history rows.
pub fn weekday_label(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Mon => "Mon",
        Weekday::Tue => "Tue",
        Weekday::Wed => "Wed",
        Weekday::Thu => "Thu",
        Weekday::Fri => "Fri",
        Weekday::Sat => "Sat",
        Weekday::Sun => "Sun",
    }
}

/// Parses dates the way request and plan rows write them:
/// `YYYY-MM-DD`, `YYYY/MM/DD`, optionally followed by a time part.
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    let head = s.split_whitespace().next()?;
    NaiveDate::parse_from_str(head, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(head, "%Y/%m/%d"))
        .ok()
}
