//! Schedule matrix (the solved or draft roster).
//!
//! Rows are staff names, columns are the day indices of one month. Each
//! cell holds exactly one state: on duty (`true`) or rest (`false`).

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::MonthCalendar;

/// On-duty flags for one day keyed by staff name.
pub type DutyColumn = HashMap<String, bool>;

/// A staff × day work/rest assignment for one month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleMatrix {
    /// Calendar year.
    pub year: i32,
    /// Month, 1-based.
    pub month: u32,
    staff: Vec<String>,
    cells: Vec<Vec<bool>>,
}

impl ScheduleMatrix {
    /// Creates an all-rest matrix for the given staff names.
    pub fn new(calendar: &MonthCalendar, staff: Vec<String>) -> Self {
        let days = calendar.days();
        let cells = vec![vec![false; days]; staff.len()];
        Self {
            year: calendar.year,
            month: calendar.month,
            staff,
            cells,
        }
    }

    /// Creates a matrix from explicit rows. All rows must share one length.
    pub fn from_rows(calendar: &MonthCalendar, rows: Vec<(String, Vec<bool>)>) -> Option<Self> {
        let days = calendar.days();
        if rows.iter().any(|(_, r)| r.len() != days) {
            return None;
        }
        let (staff, cells) = rows.into_iter().unzip();
        Some(Self {
            year: calendar.year,
            month: calendar.month,
            staff,
            cells,
        })
    }

    /// Staff names in row order.
    pub fn staff(&self) -> &[String] {
        &self.staff
    }

    /// Number of days (columns).
    pub fn days(&self) -> usize {
        self.cells.first().map_or(0, Vec::len)
    }

    /// Row index for a staff name.
    pub fn row_index(&self, name: &str) -> Option<usize> {
        self.staff.iter().position(|s| s == name)
    }

    /// Cell by row index.
    #[inline]
    pub fn get(&self, row: usize, day: usize) -> bool {
        self.cells[row][day]
    }

    /// Sets a cell by row index.
    #[inline]
    pub fn set(&mut self, row: usize, day: usize, on_duty: bool) {
        self.cells[row][day] = on_duty;
    }

    /// Cell by staff name. `None` if the name or day is unknown.
    pub fn duty(&self, name: &str, day: usize) -> Option<bool> {
        let row = self.row_index(name)?;
        self.cells[row].get(day).copied()
    }

    /// Sets a cell by staff name. Returns `false` if name or day is unknown.
    pub fn set_duty(&mut self, name: &str, day: usize, on_duty: bool) -> bool {
        match self.row_index(name) {
            Some(row) if day < self.cells[row].len() => {
                self.cells[row][day] = on_duty;
                true
            }
            _ => false,
        }
    }

    /// One staff row.
    pub fn row(&self, row: usize) -> &[bool] {
        &self.cells[row]
    }

    /// On-duty flags for one day keyed by staff name.
    pub fn column(&self, day: usize) -> DutyColumn {
        self.staff
            .iter()
            .zip(&self.cells)
            .map(|(name, row)| (name.clone(), row[day]))
            .collect()
    }

    /// On-duty headcount for a day.
    pub fn duty_count(&self, day: usize) -> usize {
        self.cells.iter().filter(|row| row[day]).count()
    }

    /// Rest days in a staff row.
    pub fn rest_days(&self, row: usize) -> usize {
        self.cells[row].iter().filter(|&&on| !on).count()
    }

    /// Rest days for a staff name.
    pub fn rest_days_of(&self, name: &str) -> Option<usize> {
        self.row_index(name).map(|row| self.rest_days(row))
    }

    /// Iterates `(name, row)` pairs.
    pub fn rows(&self) -> impl Iterator<Item = (&str, &[bool])> {
        self.staff
            .iter()
            .zip(&self.cells)
            .map(|(n, r)| (n.as_str(), r.as_slice()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ScheduleMatrix {
        let cal = MonthCalendar::new(2025, 4).unwrap();
        let mut m = ScheduleMatrix::new(&cal, vec!["A".into(), "B".into()]);
        m.set(0, 0, true);
        m.set(1, 0, true);
        m.set(1, 1, true);
        m
    }

    #[test]
    fn test_new_is_all_rest() {
        let cal = MonthCalendar::new(2025, 4).unwrap();
        let m = ScheduleMatrix::new(&cal, vec!["A".into()]);
        assert_eq!(m.days(), 30);
        assert_eq!(m.rest_days(0), 30);
    }

    #[test]
    fn test_counts() {
        let m = sample();
        assert_eq!(m.duty_count(0), 2);
        assert_eq!(m.duty_count(1), 1);
        assert_eq!(m.rest_days_of("B"), Some(28));
        assert_eq!(m.rest_days_of("Z"), None);
    }

    #[test]
    fn test_named_access() {
        let mut m = sample();
        assert_eq!(m.duty("A", 0), Some(true));
        assert_eq!(m.duty("A", 99), None);
        assert!(m.set_duty("A", 0, false));
        assert!(!m.set_duty("Z", 0, true));
        assert!(!m.set_duty("A", 30, true));
        assert_eq!(m.duty("A", 0), Some(false));
    }

    #[test]
    fn test_column() {
        let col = sample().column(1);
        assert_eq!(col.get("A"), Some(&false));
        assert_eq!(col.get("B"), Some(&true));
    }

    #[test]
    fn test_from_rows_rejects_ragged() {
        let cal = MonthCalendar::new(2025, 4).unwrap();
        assert!(ScheduleMatrix::from_rows(&cal, vec![("A".into(), vec![true; 3])]).is_none());
        let ok = ScheduleMatrix::from_rows(&cal, vec![("A".into(), vec![true; 30])]).unwrap();
        assert_eq!(ok.duty_count(29), 1);
    }
}
