//! Incremental score calculation.
//!
//! The score decomposes into one term per day (headcount, coverage) and
//! one term per staff row (rest quota, rolling window, isolated duty,
//! rest streaks, weekend load). Flipping cell (s, d) only changes row `s`
//! and day `d`, so a move costs two term recomputations instead of a full
//! pass over the matrix.

use super::problem::{RestQuota, RosterProblem};
use super::score::HardSoftScore;
use crate::models::Skill;

/// Working solution with cached per-row and per-day score terms.
#[derive(Debug, Clone)]
pub struct Evaluator<'p> {
    problem: &'p RosterProblem,
    cells: Vec<Vec<bool>>,
    row_terms: Vec<HardSoftScore>,
    day_terms: Vec<HardSoftScore>,
    total: HardSoftScore,
}

impl<'p> Evaluator<'p> {
    /// Scores an initial assignment.
    pub fn new(problem: &'p RosterProblem, cells: Vec<Vec<bool>>) -> Self {
        let row_terms: Vec<HardSoftScore> = (0..problem.staff_count())
            .map(|s| row_term(problem, s, &cells[s]))
            .collect();
        let day_terms: Vec<HardSoftScore> = (0..problem.days())
            .map(|d| day_term(problem, &cells, d))
            .collect();
        let total = row_terms.iter().copied().sum::<HardSoftScore>()
            + day_terms.iter().copied().sum::<HardSoftScore>();
        Self {
            problem,
            cells,
            row_terms,
            day_terms,
            total,
        }
    }

    /// Current score.
    #[inline]
    pub fn score(&self) -> HardSoftScore {
        self.total
    }

    /// Problem being scored.
    pub fn problem(&self) -> &'p RosterProblem {
        self.problem
    }

    /// Current assignment.
    pub fn cells(&self) -> &[Vec<bool>] {
        &self.cells
    }

    /// Cell value.
    #[inline]
    pub fn get(&self, staff: usize, day: usize) -> bool {
        self.cells[staff][day]
    }

    /// Flips one cell and updates the affected terms.
    pub fn flip(&mut self, staff: usize, day: usize) {
        self.cells[staff][day] = !self.cells[staff][day];

        let row = row_term(self.problem, staff, &self.cells[staff]);
        self.total = self.total - self.row_terms[staff] + row;
        self.row_terms[staff] = row;

        let col = day_term(self.problem, &self.cells, day);
        self.total = self.total - self.day_terms[day] + col;
        self.day_terms[day] = col;
    }

    /// Replaces the whole assignment.
    pub fn reset(&mut self, cells: Vec<Vec<bool>>) {
        *self = Self::new(self.problem, cells);
    }

    /// Describes every broken hard constraint, for infeasibility reports.
    pub fn hard_violations(&self) -> Vec<String> {
        let p = self.problem;
        let mut out = Vec::new();
        for d in 0..p.days() {
            if self.day_terms[d].hard() < 0 {
                let on = self.cells.iter().filter(|r| r[d]).count();
                out.push(format!(
                    "{}: {} on duty (required {}-{}) or missing coverage",
                    p.calendar.label(d),
                    on,
                    p.required[d],
                    p.required[d] + p.rules.overstaff_margin
                ));
            }
        }
        for (s, member) in p.staff.iter().enumerate() {
            if self.row_terms[s].hard() < 0 {
                let rest = self.cells[s].iter().filter(|&&c| !c).count();
                out.push(format!(
                    "{}: {} rest days (minimum {}), or rolling-window / isolated-duty breach",
                    member.name,
                    rest,
                    p.quotas[s].min()
                ));
            }
        }
        out
    }
}

/// Score term of one day.
pub(crate) fn day_term(p: &RosterProblem, cells: &[Vec<bool>], day: usize) -> HardSoftScore {
    if !p.is_staffed_day(day) {
        return HardSoftScore::ZERO;
    }
    let mut hard = 0i64;
    let mut soft = 0i64;

    let count = cells.iter().filter(|r| r[day]).count() as i64;
    let min = p.required[day] as i64;
    let max = min + p.rules.overstaff_margin as i64;
    if count < min {
        hard -= min - count;
    } else if count > max {
        hard -= count - max;
    }
    if count != min {
        soft -= p.weights.inexact_headcount;
    }

    for skill in Skill::ALL {
        let covered = p
            .staff
            .iter()
            .zip(cells)
            .any(|(s, row)| row[day] && s.has_skill(skill));
        if !covered {
            hard -= 1;
        }
    }

    HardSoftScore::of(hard, soft)
}

/// Score term of one staff row.
pub(crate) fn row_term(p: &RosterProblem, staff: usize, row: &[bool]) -> HardSoftScore {
    let rules = &p.rules;
    let weights = &p.weights;
    let days = row.len();
    let mut hard = 0i64;
    let mut soft = 0i64;

    let rest = row.iter().filter(|&&on| !on).count() as i64;
    match p.quotas[staff] {
        RestQuota::Band { min, max } => {
            let (min, max) = (min as i64, max as i64);
            if rest < min {
                hard -= min - rest;
            } else if rest > max {
                hard -= rest - max;
            }
            soft -= weights.holiday_excess * (rest - min).max(0);
        }
        RestQuota::YearEnd { need } => {
            let need = need as i64;
            if rest < need {
                hard -= need - rest;
            }
            soft -= weights.year_end_excess * (rest - need).max(0);
        }
    }

    // Rolling window over trailing history followed by the month.
    let trailing = &p.trailing[staff];
    let window = rules.window_len;
    let cap = rules.max_duty_in_window as i64;
    let at = |i: usize| -> bool {
        if i < trailing.len() {
            trailing[i]
        } else {
            row[i - trailing.len()]
        }
    };
    let span = trailing.len() + days;
    if span >= window {
        let mut sum = (0..window).filter(|&i| at(i)).count() as i64;
        if sum > cap {
            hard -= sum - cap;
        }
        for end in window..span {
            sum += at(end) as i64 - at(end - window) as i64;
            if sum > cap {
                hard -= sum - cap;
            }
        }
    }

    // A duty day needs a duty neighbour; month edges are unconstrained.
    for d in 1..days.saturating_sub(1) {
        if p.exempt_day == Some(d) {
            continue;
        }
        if row[d] && !row[d - 1] && !row[d + 1] {
            hard -= 1;
        }
    }

    if p.calendar.month != 1 {
        let streak = rules.rest_streak_len;
        if days >= streak {
            for start in 0..=days - streak {
                if row[start..start + streak].iter().all(|&on| !on) {
                    soft -= weights.rest_streak;
                }
            }
        }
    }

    let weekend_duty = p.weekend.iter().filter(|&&d| row[d]).count() as i64;
    soft -= weights.weekend_square * weekend_duty * weekend_duty;

    HardSoftScore::of(hard, soft)
}
