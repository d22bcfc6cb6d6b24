//! Construction heuristic.
//!
//! Seeds every row with its pins, then spreads the row's remaining rest
//! days evenly over its free days. Each row's pattern is phase-shifted by
//! its index so different staff rest on different days, which keeps the
//! daily headcount flat before local search starts.

use super::problem::{Pin, RestQuota, RosterProblem};

/// Builds the initial assignment.
pub(crate) fn construct(p: &RosterProblem) -> Vec<Vec<bool>> {
    let n = p.staff_count();
    let days = p.days();
    (0..n)
        .map(|s| {
            let mut row: Vec<bool> = (0..days).map(|d| p.pin(s, d) != Pin::Rest).collect();
            let free: Vec<usize> = (0..days).filter(|&d| p.pin(s, d) == Pin::Free).collect();
            let pinned_rest = row.iter().filter(|&&on| !on).count();
            let extra = target_rest(p, s)
                .saturating_sub(pinned_rest)
                .min(free.len());
            for k in 0..extra {
                // Consecutive picks are at least one free day apart.
                let i = ((k * n + s) * free.len()) / (extra * n);
                row[free[i]] = false;
            }
            row
        })
        .collect()
}

/// Rest days to aim for in one row: the quota, raised to what the rolling
/// window needs when the quota alone would breach it.
fn target_rest(p: &RosterProblem, s: usize) -> usize {
    let rules = &p.rules;
    let days = p.days();
    let window_floor = if rules.window_len == 0 {
        0
    } else {
        days * (rules.window_len - rules.max_duty_in_window.min(rules.window_len)) / rules.window_len
    };
    match p.quota(s) {
        RestQuota::Band { min, max } => window_floor.max(min as usize).min(max as usize),
        RestQuota::YearEnd { need } => window_floor.max(need as usize),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RosterConfig;
    use crate::models::{MonthCalendar, RequirementPlan, StaffMember};
    use crate::solver::evaluator::Evaluator;

    fn five_staff() -> Vec<StaffMember> {
        vec![
            StaffMember::new("A").language_a().veteran(),
            StaffMember::new("B").language_b().veteran(),
            StaffMember::new("C").language_a(),
            StaffMember::new("D").language_b(),
            StaffMember::new("E").language_a().language_b(),
        ]
    }

    #[test]
    fn test_phase_shifted_rest() {
        let cal = MonthCalendar::new(2025, 6).unwrap();
        let plan = RequirementPlan::uniform(cal.days(), 4);
        let staff = five_staff();
        let p = RosterProblem::builder(&staff, &cal, &plan)
            .build(&RosterConfig::default().with_required_holidays(6))
            .unwrap();

        let cells = construct(&p);
        for (s, row) in cells.iter().enumerate() {
            let rest: Vec<usize> = (0..30).filter(|&d| !row[d]).collect();
            assert_eq!(rest, (0..6).map(|k| 5 * k + s).collect::<Vec<_>>());
        }
        assert!(Evaluator::new(&p, cells).score().is_feasible());
    }

    #[test]
    fn test_pins_respected() {
        let cal = MonthCalendar::new(2026, 1).unwrap().with_holiday(0);
        let plan = RequirementPlan::uniform(cal.days(), 1);
        let staff = five_staff();
        let p = RosterProblem::builder(&staff, &cal, &plan)
            .forced_rest("C", 10)
            .build(&RosterConfig::default().with_required_holidays(8))
            .unwrap();

        let cells = construct(&p);
        for row in &cells {
            assert!(!row[0]);
            assert!(row[3]);
            assert_eq!(row.iter().filter(|&&on| !on).count(), 8);
        }
        assert!(!cells[2][10]);
    }

    #[test]
    fn test_window_floor_for_zero_need() {
        let cal = MonthCalendar::new(2025, 12).unwrap();
        let plan = RequirementPlan::uniform(cal.days(), 1);
        let staff = five_staff();
        let p = RosterProblem::builder(&staff, &cal, &plan)
            .taken("A", 200)
            .build(&RosterConfig::default())
            .unwrap();
        assert_eq!(p.quota(0), RestQuota::YearEnd { need: 0 });

        let cells = construct(&p);
        assert_eq!(cells[0].iter().filter(|&&on| !on).count(), 6);
    }
}
