//! Simulated annealing over the work/rest matrix.
//!
//! Implements `u_metaheur::sa::SaProblem` for the roster. The solution
//! type is the incremental [`Evaluator`], so a neighbor costs one clone
//! plus two term recomputations per flipped cell.
//!
//! # Moves
//! - **Flip**: toggle one free cell.
//! - **Row swap**: exchange a duty day and a rest day within one staff row
//!   (keeps the row's rest count).
//! - **Day swap**: exchange duty between two staff on one day (keeps the
//!   day's headcount).
//!
//! # Budget
//! One annealing run cools from `initial_temperature` to
//! `min_temperature`; runs are repeated from the best matrix so far
//! until the budget is spent. The wall-clock limit, the unimproved limit
//! (feasible best only) and a zero score all stop the current run
//! through the runner's cancel flag.
//!
//! # Reference
//! Kirkpatrick, Gelatt & Vecchi (1983), "Optimization by Simulated Annealing"

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use rand::seq::IndexedRandom;
use rand::Rng;
use tracing::{debug, trace};
use u_metaheur::sa::{CoolingSchedule, SaConfig, SaProblem, SaRunner};

use super::evaluator::Evaluator;
use super::problem::{Pin, RosterProblem};
use super::score::HardSoftScore;
use crate::config::{SearchConfig, TerminationConfig};

/// Cost of one hard point. Large enough that no soft total outweighs it,
/// so cost order matches score order.
const HARD_WEIGHT: f64 = 1e9;

/// Draws per neighbor before giving up on finding a non-trivial move.
const SAMPLE_ATTEMPTS: usize = 8;

/// Maps a score to an annealing cost (lower is better, zero is perfect).
pub(crate) fn score_cost(score: HardSoftScore) -> f64 {
    -(score.hard() as f64 * HARD_WEIGHT + score.soft() as f64)
}

/// Annealing parameters of one run.
pub(crate) fn annealing_config(search: &SearchConfig) -> SaConfig {
    SaConfig::default()
        .with_initial_temperature(search.initial_temperature)
        .with_min_temperature(search.min_temperature)
        .with_cooling(CoolingSchedule::Geometric {
            alpha: search.cooling_alpha,
        })
        .with_iterations_per_temperature(search.iterations_per_temperature)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Move {
    Flip { staff: usize, day: usize },
    RowSwap { staff: usize, a: usize, b: usize },
    DaySwap { day: usize, a: usize, b: usize },
}

impl Move {
    fn apply(self, eval: &mut Evaluator<'_>) {
        match self {
            Move::Flip { staff, day } => eval.flip(staff, day),
            Move::RowSwap { staff, a, b } => {
                eval.flip(staff, a);
                eval.flip(staff, b);
            }
            Move::DaySwap { day, a, b } => {
                eval.flip(a, day);
                eval.flip(b, day);
            }
        }
    }
}

/// Free cells indexed both ways.
#[derive(Debug)]
struct MoveSelector {
    free_days: Vec<Vec<usize>>,
    free_staff: Vec<Vec<usize>>,
    flip_rows: Vec<usize>,
    swap_rows: Vec<usize>,
    swap_days: Vec<usize>,
}

impl MoveSelector {
    fn new(p: &RosterProblem) -> Self {
        let free_days: Vec<Vec<usize>> = (0..p.staff_count())
            .map(|s| (0..p.days()).filter(|&d| p.pin(s, d) == Pin::Free).collect())
            .collect();
        let free_staff: Vec<Vec<usize>> = (0..p.days())
            .map(|d| (0..p.staff_count()).filter(|&s| p.pin(s, d) == Pin::Free).collect())
            .collect();
        let flip_rows = (0..free_days.len()).filter(|&s| !free_days[s].is_empty()).collect();
        let swap_rows = (0..free_days.len()).filter(|&s| free_days[s].len() >= 2).collect();
        let swap_days = (0..free_staff.len()).filter(|&d| free_staff[d].len() >= 2).collect();
        Self {
            free_days,
            free_staff,
            flip_rows,
            swap_rows,
            swap_days,
        }
    }

    fn is_empty(&self) -> bool {
        self.flip_rows.is_empty()
    }

    /// Picks a random move, or `None` when the sampled pair is a no-op.
    fn select<R: Rng>(&self, eval: &Evaluator<'_>, rng: &mut R) -> Option<Move> {
        match rng.random_range(0..10) {
            0..=3 => {
                let &staff = self.flip_rows.choose(rng)?;
                let &day = self.free_days[staff].choose(rng)?;
                Some(Move::Flip { staff, day })
            }
            4..=6 => {
                let &staff = self.swap_rows.choose(rng)?;
                let &a = self.free_days[staff].choose(rng)?;
                let &b = self.free_days[staff].choose(rng)?;
                (eval.get(staff, a) != eval.get(staff, b)).then_some(Move::RowSwap { staff, a, b })
            }
            _ => {
                let &day = self.swap_days.choose(rng)?;
                let &a = self.free_staff[day].choose(rng)?;
                let &b = self.free_staff[day].choose(rng)?;
                (eval.get(a, day) != eval.get(b, day)).then_some(Move::DaySwap { day, a, b })
            }
        }
    }
}

/// Stop conditions shared by every annealing run of one solve.
///
/// Every evaluated cost passes through [`record`](Self::record), so the
/// lowest recorded cost is the best matrix seen so far.
#[derive(Debug)]
struct Budget {
    started: Instant,
    limit: Duration,
    unimproved: Option<Duration>,
    cancel: Arc<AtomicBool>,
    best_cost: AtomicU64,
    improved_at_nanos: AtomicU64,
}

impl Budget {
    fn new(config: &TerminationConfig, initial_cost: f64) -> Self {
        Self::start(config.time_limit(), config.unimproved_limit(), initial_cost)
    }

    fn start(limit: Duration, unimproved: Option<Duration>, initial_cost: f64) -> Self {
        Self {
            started: Instant::now(),
            limit,
            unimproved,
            cancel: Arc::new(AtomicBool::new(false)),
            best_cost: AtomicU64::new(initial_cost.to_bits()),
            improved_at_nanos: AtomicU64::new(0),
        }
    }

    fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    fn best_cost(&self) -> f64 {
        f64::from_bits(self.best_cost.load(Ordering::Relaxed))
    }

    fn improved_at(&self) -> Duration {
        Duration::from_nanos(self.improved_at_nanos.load(Ordering::Relaxed))
    }

    fn record(&self, cost: f64) {
        if cost < self.best_cost() {
            self.best_cost.store(cost.to_bits(), Ordering::Relaxed);
            let at = self.elapsed().as_nanos().min(u64::MAX as u128) as u64;
            self.improved_at_nanos.store(at, Ordering::Relaxed);
        }
    }

    fn is_exhausted(&self) -> bool {
        let best = self.best_cost();
        if best <= 0.0 {
            return true;
        }
        let elapsed = self.elapsed();
        if elapsed >= self.limit {
            return true;
        }
        // A hard-feasible best costs less than one hard point.
        match self.unimproved {
            Some(limit) if best < HARD_WEIGHT => elapsed.saturating_sub(self.improved_at()) >= limit,
            _ => false,
        }
    }

    /// Raises the cancel flag once exhausted.
    fn check(&self) {
        if self.is_exhausted() {
            self.cancel.store(true, Ordering::Relaxed);
        }
    }
}

/// One annealing run, started from a fixed matrix.
struct RosterAnnealing<'p, 'b> {
    start: Evaluator<'p>,
    selector: &'b MoveSelector,
    budget: &'b Budget,
}

impl<'p> SaProblem for RosterAnnealing<'p, '_> {
    type Solution = Evaluator<'p>;

    fn initial_solution<R: Rng>(&self, _rng: &mut R) -> Evaluator<'p> {
        self.start.clone()
    }

    fn cost(&self, eval: &Evaluator<'p>) -> f64 {
        let c = score_cost(eval.score());
        self.budget.record(c);
        c
    }

    fn neighbor<R: Rng>(&self, eval: &Evaluator<'p>, rng: &mut R) -> Evaluator<'p> {
        self.budget.check();
        let mut next = eval.clone();
        for _ in 0..SAMPLE_ATTEMPTS {
            if let Some(mv) = self.selector.select(eval, rng) {
                mv.apply(&mut next);
                break;
            }
        }
        next
    }
}

/// Result of the annealing phase.
#[derive(Debug, Clone)]
pub(crate) struct SearchOutcome {
    pub best_cells: Vec<Vec<bool>>,
    pub best_score: HardSoftScore,
    pub steps: u64,
    pub accepted: u64,
    pub runs: u32,
    pub elapsed: Duration,
    pub best_found_at: Duration,
}

/// Anneals from `start` until the budget is spent. Each run draws its
/// seed from `rng`. Returns the best matrix seen.
pub(crate) fn run<R: Rng>(
    start: Evaluator<'_>,
    search: &SearchConfig,
    termination: &TerminationConfig,
    rng: &mut R,
) -> SearchOutcome {
    let selector = MoveSelector::new(start.problem());
    let budget = Budget::new(termination, score_cost(start.score()));
    let mut best = start;
    let mut outcome = SearchOutcome {
        best_cells: Vec::new(),
        best_score: best.score(),
        steps: 0,
        accepted: 0,
        runs: 0,
        elapsed: Duration::ZERO,
        best_found_at: Duration::ZERO,
    };

    if !selector.is_empty() {
        let base = annealing_config(search);
        while !budget.is_exhausted() {
            let config = base.clone().with_seed(rng.random());
            let problem = RosterAnnealing {
                start: best.clone(),
                selector: &selector,
                budget: &budget,
            };
            let result = SaRunner::run_with_cancel(&problem, &config, Some(Arc::clone(&budget.cancel)));
            outcome.steps += result.iterations as u64;
            outcome.accepted += result.accepted_moves as u64;
            outcome.runs += 1;
            debug!(
                event = "annealing_run",
                run = outcome.runs,
                iterations = result.iterations,
                best = %result.best.score(),
                cancelled = result.cancelled,
            );
            if result.best.score() > best.score() {
                best = result.best;
                trace!(event = "new_best", score = %best.score(), step = outcome.steps);
            }
        }
    }

    outcome.best_cells = best.cells().to_vec();
    outcome.best_score = best.score();
    outcome.elapsed = budget.elapsed();
    outcome.best_found_at = budget.improved_at();
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RosterConfig;
    use crate::models::{MonthCalendar, RequirementPlan, StaffMember};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn problem(month: u32) -> RosterProblem {
        let staff: Vec<StaffMember> = (0..4)
            .map(|i| StaffMember::new(format!("S{i}")).language_a().language_b().veteran())
            .collect();
        let cal = MonthCalendar::new(2025, month).unwrap().with_holiday(0);
        let plan = RequirementPlan::uniform(cal.days(), 2);
        RosterProblem::builder(&staff, &cal, &plan)
            .build(&RosterConfig::default().with_required_holidays(8))
            .unwrap()
    }

    fn termination(millis: u64) -> TerminationConfig {
        TerminationConfig {
            seconds_spent_limit: 0,
            millis_spent_limit: Some(millis),
            unimproved_millis_spent_limit: None,
        }
    }

    #[test]
    fn test_cost_follows_score_order() {
        assert_eq!(score_cost(HardSoftScore::ZERO), 0.0);
        assert!(score_cost(HardSoftScore::of(-1, 0)) > score_cost(HardSoftScore::of(0, -1_000_000)));
        assert!(score_cost(HardSoftScore::of_soft(-5)) > score_cost(HardSoftScore::of_soft(-4)));
    }

    #[test]
    fn test_annealing_config_is_valid() {
        let config = annealing_config(&SearchConfig::default());
        assert!(config.validate().is_ok());
        assert_eq!(config.iterations_per_temperature, SearchConfig::default().iterations_per_temperature);
    }

    #[test]
    fn test_moves_are_involutions() {
        let p = problem(6);
        let mut eval = Evaluator::new(&p, vec![vec![true; 30]; 4]);
        eval.flip(0, 5);
        let before = eval.clone();
        for mv in [
            Move::Flip { staff: 1, day: 3 },
            Move::RowSwap { staff: 0, a: 5, b: 6 },
            Move::DaySwap { day: 5, a: 0, b: 2 },
        ] {
            mv.apply(&mut eval);
            mv.apply(&mut eval);
            assert_eq!(eval.cells(), before.cells());
            assert_eq!(eval.score(), before.score());
        }
    }

    #[test]
    fn test_selector_skips_pinned_cells() {
        let p = problem(6);
        let selector = MoveSelector::new(&p);
        assert!(selector.free_days.iter().all(|days| !days.contains(&0)));
        assert!(selector.free_staff[0].is_empty());
        assert!(!selector.swap_days.contains(&0));

        let eval = Evaluator::new(&p, vec![vec![true; 30]; 4]);
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        for _ in 0..500 {
            match selector.select(&eval, &mut rng) {
                Some(Move::Flip { day, .. }) => assert_ne!(day, 0),
                Some(Move::RowSwap { .. }) | Some(Move::DaySwap { .. }) => {
                    panic!("swaps between equal cells are no-ops")
                }
                None => {}
            }
        }
    }

    #[test]
    fn test_budget_stops() {
        // Perfect score.
        let b = Budget::start(Duration::from_secs(60), None, 0.0);
        assert!(b.is_exhausted());

        // Wall clock.
        let b = Budget::start(Duration::ZERO, None, 1.0);
        assert!(b.is_exhausted());

        // Stale feasible best.
        let b = Budget::start(Duration::from_secs(60), Some(Duration::ZERO), 1.0);
        assert!(b.is_exhausted());

        // An infeasible best keeps searching until the wall-clock limit.
        let b = Budget::start(Duration::from_secs(60), Some(Duration::ZERO), HARD_WEIGHT);
        assert!(!b.is_exhausted());
        b.check();
        assert!(!b.cancel.load(Ordering::Relaxed));
    }

    #[test]
    fn test_budget_records_improvements_only() {
        let b = Budget::start(Duration::from_secs(60), None, 10.0);
        b.record(12.0);
        assert_eq!(b.best_cost(), 10.0);
        b.record(4.0);
        assert_eq!(b.best_cost(), 4.0);
        b.record(0.0);
        b.check();
        assert!(b.cancel.load(Ordering::Relaxed));
    }

    #[test]
    fn test_neighbor_stays_within_free_cells() {
        let p = problem(6);
        let selector = MoveSelector::new(&p);
        let budget = Budget::start(Duration::from_secs(60), None, f64::MAX);
        let sa = RosterAnnealing {
            start: Evaluator::new(&p, vec![vec![false; 30]; 4]),
            selector: &selector,
            budget: &budget,
        };
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let mut eval = sa.initial_solution(&mut rng);
        for _ in 0..200 {
            eval = sa.neighbor(&eval, &mut rng);
            assert!((0..4).all(|s| !eval.get(s, 0)));
            assert_eq!(sa.cost(&eval), score_cost(eval.score()));
        }
        assert!(budget.best_cost() < f64::MAX);
    }

    #[test]
    fn test_best_never_worse_than_start() {
        let p = problem(9);
        let start = Evaluator::new(&p, vec![vec![true; 30]; 4]);
        let initial = start.score();
        let mut rng = ChaCha8Rng::seed_from_u64(3);

        let outcome = run(start, &SearchConfig::default(), &termination(200), &mut rng);
        assert!(outcome.best_score > initial);
        assert!(outcome.steps > 0);
        assert!(outcome.runs >= 1);
        assert_eq!(Evaluator::new(&p, outcome.best_cells).score(), outcome.best_score);
    }
}
