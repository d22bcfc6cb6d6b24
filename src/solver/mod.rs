//! Monthly roster solver.
//!
//! Produces a staff × day work/rest matrix for one month that satisfies the
//! hard rules and minimizes the soft penalties.
//!
//! # Algorithm
//!
//! 1. **Model**: [`RosterProblem`] pins holidays and leave to rest and the
//!    January 4th duty day to duty, and rejects models that are provably
//!    infeasible before any search.
//! 2. **Construction**: rest days spread evenly per row, phase-shifted
//!    across staff.
//! 3. **Annealing**: `u_metaheur` simulated annealing over flip, row-swap
//!    and day-swap moves with incremental scoring, restarted from the best
//!    matrix until the wall-clock budget runs out.
//!
//! The best assignment is returned if its hard level is zero; otherwise the
//! solve fails with [`RosterError::Infeasible`] and no partial matrix.
//!
//! # Hard rules
//! - Staffed days: `required ≤ on duty ≤ required + overstaff_margin` and
//!   each coverage skill on duty
//! - Rest quota: `[target, target + 1]` in normal months, at least the
//!   remaining entitlement in December
//! - At most `max_duty_in_window` duty days in any `window_len` consecutive
//!   days, counting the previous month's trailing days
//! - No single duty day between two rest days inside the month
//!
//! # Soft penalties
//! Inexact headcount, rest above target, rest streaks (not in January),
//! and the square of each member's weekend duty count.

mod annealing;
mod construction;
mod evaluator;
mod problem;
mod score;

pub use evaluator::Evaluator;
pub use problem::{Pin, ProblemBuilder, RestQuota, RosterProblem};
pub use score::HardSoftScore;

use std::time::Duration;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::{info, warn};

use crate::config::{ConfigError, RosterConfig};
use crate::error::{Result, RosterError};
use crate::models::ScheduleMatrix;

/// Search statistics of one solve.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SolveStats {
    /// Moves evaluated.
    pub steps: u64,
    /// Moves accepted.
    pub accepted: u64,
    /// Annealing runs (one per cool-down).
    pub runs: u32,
    /// Total wall-clock time.
    pub elapsed: Duration,
    /// When the returned best was found.
    pub best_found_at: Duration,
}

/// A feasible solved month.
#[derive(Debug, Clone)]
pub struct Solution {
    /// Work/rest matrix, rows in roster order.
    pub matrix: ScheduleMatrix,
    /// Final score; the hard level is always zero.
    pub score: HardSoftScore,
    /// Search statistics.
    pub stats: SolveStats,
}

/// Roster solver.
#[derive(Debug, Clone, Default)]
pub struct Solver {
    config: RosterConfig,
}

impl Solver {
    /// Creates a solver with the given configuration.
    pub fn new(config: RosterConfig) -> Self {
        Self { config }
    }

    /// Configuration in use.
    pub fn config(&self) -> &RosterConfig {
        &self.config
    }

    /// Solves with a seeded RNG when `search.random_seed` is set, otherwise
    /// with one seeded from entropy.
    pub fn solve(&self, problem: &RosterProblem) -> Result<Solution> {
        let mut rng = match self.config.search.random_seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_rng(&mut rand::rng()),
        };
        self.solve_with_rng(problem, &mut rng)
    }

    /// Solves with an explicit random source.
    ///
    /// # Errors
    /// [`RosterError::Infeasible`] when no assignment without hard
    /// violations was found within the time budget, and
    /// [`RosterError::Config`] for an unusable annealing schedule.
    pub fn solve_with_rng<R: Rng>(&self, problem: &RosterProblem, rng: &mut R) -> Result<Solution> {
        annealing::annealing_config(&self.config.search)
            .validate()
            .map_err(ConfigError::Invalid)?;
        info!(
            event = "solve_start",
            year = problem.calendar().year,
            month = problem.calendar().month,
            staff = problem.staff_count(),
            days = problem.days(),
            time_limit_ms = self.config.termination.time_limit().as_millis() as u64,
        );

        let eval = Evaluator::new(problem, construction::construct(problem));
        let initial = eval.score();
        let outcome = annealing::run(eval, &self.config.search, &self.config.termination, rng);

        let stats = SolveStats {
            steps: outcome.steps,
            accepted: outcome.accepted,
            runs: outcome.runs,
            elapsed: outcome.elapsed,
            best_found_at: outcome.best_found_at,
        };
        info!(
            event = "solve_end",
            initial_score = %initial,
            score = %outcome.best_score,
            steps = stats.steps,
            accepted = stats.accepted,
            runs = stats.runs,
            elapsed_ms = stats.elapsed.as_millis() as u64,
        );

        if !outcome.best_score.is_feasible() {
            let best = Evaluator::new(problem, outcome.best_cells);
            let violations = best.hard_violations();
            warn!(event = "solve_infeasible", score = %outcome.best_score, violations = violations.len());
            return Err(RosterError::Infeasible {
                reason: format!(
                    "best score {} after {} ms; {}",
                    outcome.best_score,
                    stats.elapsed.as_millis(),
                    violations.join("; ")
                ),
            });
        }

        let names = problem.staff().iter().map(|s| s.name.clone()).collect();
        let mut matrix = ScheduleMatrix::new(problem.calendar(), names);
        for (s, row) in outcome.best_cells.iter().enumerate() {
            for (d, &on) in row.iter().enumerate() {
                matrix.set(s, d, on);
            }
        }
        Ok(Solution {
            matrix,
            score: outcome.best_score,
            stats,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feasibility::check_day;
    use crate::models::{LeaveRequest, MonthCalendar, RequirementPlan, StaffMember};
    use chrono::NaiveDate;

    fn fast_config(required_holidays: u32) -> RosterConfig {
        RosterConfig::default()
            .with_required_holidays(required_holidays)
            .with_time_limit(Duration::from_secs(3))
            .with_unimproved_limit(Duration::from_millis(200))
            .with_seed(42)
    }

    fn five_staff() -> Vec<StaffMember> {
        vec![
            StaffMember::new("A").language_a().veteran(),
            StaffMember::new("B").language_b().veteran(),
            StaffMember::new("C").language_a(),
            StaffMember::new("D").language_b(),
            StaffMember::new("E").language_a().language_b(),
        ]
    }

    fn six_staff(target: u32) -> Vec<StaffMember> {
        let mut staff = five_staff();
        staff.push(StaffMember::new("F").language_a().language_b().veteran());
        staff
            .into_iter()
            .map(|s| s.with_holiday_target(target))
            .collect()
    }

    /// Checks every hard rule independently of the evaluator.
    fn assert_hard_rules(
        problem: &RosterProblem,
        plan: &RequirementPlan,
        matrix: &ScheduleMatrix,
        config: &RosterConfig,
    ) {
        let rules = &config.rules;
        let cal = problem.calendar();
        let staff = problem.staff();
        for d in 0..cal.days() {
            let on = matrix.duty_count(d) as u32;
            if cal.is_holiday(d) {
                assert_eq!(on, 0, "{} is a holiday", cal.label(d));
                continue;
            }
            if cal.forced_duty_day() == Some(d) {
                assert_eq!(on as usize, staff.len());
                continue;
            }
            let req = plan.required(d);
            assert!(on >= req && on <= req + rules.overstaff_margin, "{}: {on}", cal.label(d));
            assert!(check_day(staff, &matrix.column(d), plan, d).is_feasible());
        }

        for (s, (name, row)) in matrix.rows().enumerate() {
            let rest = row.iter().filter(|&&c| !c).count() as u32;
            match problem.quota(s) {
                RestQuota::Band { min, max } => assert!(rest >= min && rest <= max, "{name}: {rest}"),
                RestQuota::YearEnd { need } => assert!(rest >= need, "{name}: {rest} < {need}"),
            }
            let mut full = problem.trailing(s).to_vec();
            full.extend_from_slice(row);
            for w in full.windows(rules.window_len) {
                assert!(w.iter().filter(|&&c| c).count() <= rules.max_duty_in_window, "{name}");
            }
            for d in 1..row.len() - 1 {
                if cal.forced_duty_day() != Some(d) {
                    assert!(!(row[d] && !row[d - 1] && !row[d + 1]), "{name} isolated on {d}");
                }
            }
        }
    }

    #[test]
    fn test_five_staff_month() {
        let cal = MonthCalendar::new(2025, 6).unwrap();
        let plan = RequirementPlan::uniform(cal.days(), 4);
        let staff = five_staff();
        for seed in [1, 2] {
            // Four of five on duty every day leaves exactly six rest days each.
            let config = fast_config(6).with_seed(seed);
            let problem = RosterProblem::builder(&staff, &cal, &plan).build(&config).unwrap();
            let solution = Solver::new(config.clone()).solve(&problem).unwrap();

            assert!(solution.score.is_feasible());
            assert_eq!(solution.matrix.staff().len(), 5);
            assert_hard_rules(&problem, &plan, &solution.matrix, &config);
        }
    }

    #[test]
    fn test_leave_and_holidays_pinned() {
        let cal = MonthCalendar::new(2025, 6).unwrap().with_holiday(14);
        let plan = RequirementPlan::uniform(cal.days(), 3);
        let staff = six_staff(120);
        let leave = vec![
            LeaveRequest::new("l1", "A", NaiveDate::from_ymd_opt(2025, 6, 10).unwrap()),
            LeaveRequest::new("l2", "A", NaiveDate::from_ymd_opt(2025, 6, 11).unwrap()),
        ];
        let config = fast_config(8);
        let problem = RosterProblem::builder(&staff, &cal, &plan)
            .leave_requests(&leave)
            .build(&config)
            .unwrap();
        let solution = Solver::new(config.clone()).solve(&problem).unwrap();

        assert_eq!(solution.matrix.duty("A", 9), Some(false));
        assert_eq!(solution.matrix.duty("A", 10), Some(false));
        assert_eq!(solution.matrix.duty_count(14), 0);
        assert_hard_rules(&problem, &plan, &solution.matrix, &config);
    }

    #[test]
    fn test_trailing_history_forces_early_rest() {
        let cal = MonthCalendar::new(2025, 6).unwrap();
        let plan = RequirementPlan::uniform(cal.days(), 3);
        let staff = six_staff(120);
        let config = fast_config(8);
        let problem = RosterProblem::builder(&staff, &cal, &plan)
            .trailing("B", vec![true; 4])
            .build(&config)
            .unwrap();
        let solution = Solver::new(config.clone()).solve(&problem).unwrap();

        assert_eq!(solution.matrix.duty("B", 0), Some(false));
        assert_hard_rules(&problem, &plan, &solution.matrix, &config);
    }

    #[test]
    fn test_year_end_entitlement() {
        let cal = MonthCalendar::new(2025, 12).unwrap();
        let plan = RequirementPlan::uniform(cal.days(), 3);
        let staff = six_staff(120);
        let config = fast_config(8);
        let problem = RosterProblem::builder(&staff, &cal, &plan)
            .taken("A", 110)
            .taken("B", 110)
            .taken("C", 112)
            .taken("D", 110)
            .taken("E", 110)
            .taken("F", 125)
            .build(&config)
            .unwrap();
        assert_eq!(problem.quota(2), RestQuota::YearEnd { need: 8 });
        assert_eq!(problem.quota(5), RestQuota::YearEnd { need: 0 });

        let solution = Solver::new(config.clone()).solve(&problem).unwrap();
        assert_hard_rules(&problem, &plan, &solution.matrix, &config);
        assert!(solution.matrix.rest_days_of("A").unwrap() >= 10);
        assert!(solution.matrix.rest_days_of("C").unwrap() >= 8);
    }

    #[test]
    fn test_january_duty_day() {
        let cal = MonthCalendar::new(2026, 1).unwrap().with_holiday(0);
        let plan = RequirementPlan::uniform(cal.days(), 3);
        let staff = six_staff(120);
        let config = fast_config(8);
        let problem = RosterProblem::builder(&staff, &cal, &plan).build(&config).unwrap();
        let solution = Solver::new(config.clone()).solve(&problem).unwrap();

        assert_eq!(solution.matrix.duty_count(3), 6);
        assert_eq!(solution.matrix.duty_count(0), 0);
        assert_hard_rules(&problem, &plan, &solution.matrix, &config);
    }

    #[test]
    fn test_unusable_schedule_rejected() {
        let cal = MonthCalendar::new(2025, 6).unwrap();
        let plan = RequirementPlan::uniform(cal.days(), 4);
        let mut config = fast_config(6);
        let problem = RosterProblem::builder(&five_staff(), &cal, &plan).build(&config).unwrap();
        config.search.cooling_alpha = 1.5;

        let err = Solver::new(config).solve(&problem).unwrap_err();
        assert!(matches!(err, RosterError::Config(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_unsatisfiable_windows_reported() {
        // Both members must work every day, which breaks the rolling window.
        let staff = vec![
            StaffMember::new("A").language_a().language_b().veteran(),
            StaffMember::new("B").language_a().language_b().veteran(),
        ];
        let cal = MonthCalendar::new(2025, 6).unwrap();
        let plan = RequirementPlan::uniform(cal.days(), 2);
        let config = fast_config(0).with_time_limit(Duration::from_millis(150));
        let problem = RosterProblem::builder(&staff, &cal, &plan).build(&config).unwrap();

        match Solver::new(config).solve(&problem) {
            Err(RosterError::Infeasible { reason }) => assert!(reason.contains("hard")),
            other => panic!("expected infeasible, got {other:?}"),
        }
    }
}
