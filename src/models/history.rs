//! Finalized history log.
//!
//! One row per calendar day with the on-duty flag of every staff member
//! who was rostered that day. The log is the only source for rest days
//! already taken in a year and for the trailing days that rolling-window
//! rules read across a month boundary.

use std::collections::BTreeMap;

use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use super::calendar::weekday_label;
use super::{MonthCalendar, ScheduleMatrix};

/// One finalized day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryRow {
    /// Calendar date.
    pub date: NaiveDate,
    /// Weekday label.
    pub weekday: String,
    /// On-duty flag per staff name. Staff absent from the row were not rostered.
    pub duty: BTreeMap<String, bool>,
}

/// Append/replace store of finalized days, kept sorted by date.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryLog {
    rows: Vec<HistoryRow>,
}

impl HistoryRow {
    /// Creates a row with no staff entries.
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date,
            weekday: weekday_label(date.weekday()).to_string(),
            duty: BTreeMap::new(),
        }
    }

    /// Adds a staff entry.
    pub fn with_duty(mut self, name: impl Into<String>, on_duty: bool) -> Self {
        self.duty.insert(name.into(), on_duty);
        self
    }
}

impl HistoryLog {
    /// Creates an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a log from rows in any order.
    pub fn from_rows(mut rows: Vec<HistoryRow>) -> Self {
        rows.sort_by_key(|r| r.date);
        Self { rows }
    }

    /// All rows ascending by date.
    pub fn rows(&self) -> &[HistoryRow] {
        &self.rows
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the log is empty.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Row for a date.
    pub fn row(&self, date: NaiveDate) -> Option<&HistoryRow> {
        self.rows
            .binary_search_by_key(&date, |r| r.date)
            .ok()
            .map(|i| &self.rows[i])
    }

    /// Staff names appearing anywhere in the log, sorted.
    pub fn staff_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .rows
            .iter()
            .flat_map(|r| r.duty.keys().cloned())
            .collect();
        names.sort();
        names.dedup();
        names
    }

    /// Folds a finalized month into the log.
    ///
    /// Replaces every row of the matrix's year+month, leaves all other
    /// months untouched, and keeps the log sorted ascending by date.
    pub fn fold_month(&mut self, calendar: &MonthCalendar, matrix: &ScheduleMatrix) {
        let (year, month) = (matrix.year, matrix.month);
        self.rows
            .retain(|r| !(r.date.year() == year && r.date.month() == month));

        for day in 0..matrix.days() {
            let mut row = HistoryRow::new(calendar.date(day));
            for (name, cells) in matrix.rows() {
                row.duty.insert(name.to_string(), cells[day]);
            }
            self.rows.push(row);
        }
        self.rows.sort_by_key(|r| r.date);
    }

    /// On-duty flags for the `len` days before `first`, oldest first.
    /// Days missing from the log read as rest.
    pub fn trailing(&self, name: &str, first: NaiveDate, len: usize) -> Vec<bool> {
        (1..=len)
            .rev()
            .map(|back| {
                let date = first - Duration::days(back as i64);
                self.row(date)
                    .and_then(|r| r.duty.get(name).copied())
                    .unwrap_or(false)
            })
            .collect()
    }

    /// Rest days recorded for `name` in `year`, excluding `skip_month`.
    pub fn rest_taken(&self, name: &str, year: i32, skip_month: Option<u32>) -> u32 {
        self.rows
            .iter()
            .filter(|r| r.date.year() == year && Some(r.date.month()) != skip_month)
            .filter(|r| r.duty.get(name) == Some(&false))
            .count() as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn month_matrix(year: i32, month: u32, on_duty: bool) -> (MonthCalendar, ScheduleMatrix) {
        let cal = MonthCalendar::new(year, month).unwrap();
        let rows = vec![("A".to_string(), vec![on_duty; cal.days()])];
        let m = ScheduleMatrix::from_rows(&cal, rows).unwrap();
        (cal, m)
    }

    #[test]
    fn test_fold_replaces_only_target_month() {
        let mut log = HistoryLog::from_rows(vec![
            HistoryRow::new(d(2025, 5, 31)).with_duty("A", true),
            HistoryRow::new(d(2025, 6, 1)).with_duty("A", true),
            HistoryRow::new(d(2025, 6, 15)).with_duty("Old", true),
            HistoryRow::new(d(2025, 7, 1)).with_duty("A", true),
        ]);

        let (cal, m) = month_matrix(2025, 6, false);
        log.fold_month(&cal, &m);

        assert_eq!(log.len(), 30 + 2);
        assert!(log.rows().windows(2).all(|w| w[0].date < w[1].date));
        assert_eq!(log.row(d(2025, 5, 31)).unwrap().duty["A"], true);
        assert_eq!(log.row(d(2025, 7, 1)).unwrap().duty["A"], true);
        let mid = log.row(d(2025, 6, 15)).unwrap();
        assert_eq!(mid.duty.get("A"), Some(&false));
        assert!(!mid.duty.contains_key("Old"));
        assert_eq!(mid.weekday, "Sun");
    }

    #[test]
    fn test_fold_same_year_other_year_kept() {
        let mut log = HistoryLog::from_rows(vec![HistoryRow::new(d(2024, 6, 3)).with_duty("A", true)]);
        let (cal, m) = month_matrix(2025, 6, true);
        log.fold_month(&cal, &m);
        assert!(log.row(d(2024, 6, 3)).is_some());
        assert_eq!(log.rows()[0].date, d(2024, 6, 3));
    }

    #[test]
    fn test_trailing_missing_days_are_rest() {
        let log = HistoryLog::from_rows(vec![
            HistoryRow::new(d(2025, 5, 29)).with_duty("A", true),
            HistoryRow::new(d(2025, 5, 31)).with_duty("A", true),
        ]);
        let t = log.trailing("A", d(2025, 6, 1), 4);
        assert_eq!(t, vec![false, true, false, true]);
        assert_eq!(log.trailing("B", d(2025, 6, 1), 4), vec![false; 4]);
    }

    #[test]
    fn test_rest_taken() {
        let (cal, m) = month_matrix(2025, 2, false);
        let mut log = HistoryLog::new();
        log.fold_month(&cal, &m);
        let (cal, m) = month_matrix(2025, 3, false);
        log.fold_month(&cal, &m);

        assert_eq!(log.rest_taken("A", 2025, None), 28 + 31);
        assert_eq!(log.rest_taken("A", 2025, Some(3)), 28);
        assert_eq!(log.rest_taken("A", 2024, None), 0);
        assert_eq!(log.rest_taken("B", 2025, None), 0);
    }
}
