//! Daily feasibility predicate.
//!
//! Decides whether one day's staffing is still acceptable, typically after
//! a single hypothetical duty → rest flip. Self-service request filtering
//! and the reduction lottery both go through [`check_day`], so a request
//! that was offered to staff is judged by exactly the same rule when it is
//! adjudicated.
//!
//! # Check order
//! 1. Headcount ≥ plan minimum
//! 2. Language-A coverage
//! 3. Language-B coverage
//! 4. Veteran coverage
//!
//! The first failing check decides the verdict.

use std::fmt;

use crate::models::{DutyColumn, RequirementPlan, Skill, StaffMember};

/// Why a day failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shortfall {
    /// Fewer staff on duty than the plan minimum.
    Understaffed { required: u32, on_duty: u32 },
    /// No on-duty member has the skill.
    MissingCoverage(Skill),
}

/// Verdict of a daily check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DayVerdict {
    Feasible,
    Infeasible(Shortfall),
}

impl DayVerdict {
    /// Whether the day passes.
    #[inline]
    pub fn is_feasible(&self) -> bool {
        matches!(self, DayVerdict::Feasible)
    }

    /// Human-readable reason.
    pub fn reason(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Shortfall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Shortfall::Understaffed { required, on_duty } => {
                write!(f, "understaffed (required {required}, on duty {on_duty})")
            }
            Shortfall::MissingCoverage(skill) => write!(f, "missing {} coverage", skill.label()),
        }
    }
}

impl fmt::Display for DayVerdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DayVerdict::Feasible => f.write_str("OK"),
            DayVerdict::Infeasible(shortfall) => shortfall.fmt(f),
        }
    }
}

/// Checks one day's staffing.
///
/// Only schedulable members of `staff` are counted; names in `column` that
/// are not on the roster are ignored, and roster members missing from
/// `column` count as resting.
pub fn check_day(
    staff: &[StaffMember],
    column: &DutyColumn,
    plan: &RequirementPlan,
    day: usize,
) -> DayVerdict {
    let on_duty: Vec<&StaffMember> = staff
        .iter()
        .filter(|s| s.is_schedulable() && column.get(&s.name).copied().unwrap_or(false))
        .collect();

    let required = plan.required(day);
    if (on_duty.len() as u32) < required {
        return DayVerdict::Infeasible(Shortfall::Understaffed {
            required,
            on_duty: on_duty.len() as u32,
        });
    }

    for skill in Skill::ALL {
        if !on_duty.iter().any(|s| s.has_skill(skill)) {
            return DayVerdict::Infeasible(Shortfall::MissingCoverage(skill));
        }
    }

    DayVerdict::Feasible
}

/// Checks a day with one staff member hypothetically flipped to rest.
///
/// The input column is left untouched.
pub fn check_reduction(
    staff: &[StaffMember],
    column: &DutyColumn,
    plan: &RequirementPlan,
    day: usize,
    name: &str,
) -> DayVerdict {
    let mut hypothetical = column.clone();
    hypothetical.insert(name.to_string(), false);
    check_day(staff, &hypothetical, plan, day)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roster() -> Vec<StaffMember> {
        vec![
            StaffMember::new("A").language_a().veteran(),
            StaffMember::new("B").language_b(),
            StaffMember::new("C").language_a(),
            StaffMember::new("D").language_b().veteran(),
            StaffMember::admin("root").language_a().language_b().veteran(),
        ]
    }

    fn column(on: &[&str]) -> DutyColumn {
        ["A", "B", "C", "D", "root"]
            .iter()
            .map(|n| (n.to_string(), on.contains(n)))
            .collect()
    }

    #[test]
    fn test_feasible_day() {
        let plan = RequirementPlan::uniform(30, 2);
        let v = check_day(&roster(), &column(&["A", "B"]), &plan, 0);
        assert!(v.is_feasible());
        assert_eq!(v.reason(), "OK");
    }

    #[test]
    fn test_understaffed_first() {
        // Also lacks language B, but headcount is checked first.
        let plan = RequirementPlan::uniform(30, 2);
        let v = check_day(&roster(), &column(&["A"]), &plan, 0);
        assert_eq!(
            v,
            DayVerdict::Infeasible(Shortfall::Understaffed { required: 2, on_duty: 1 })
        );
        assert!(v.reason().starts_with("understaffed"));
    }

    #[test]
    fn test_coverage_order() {
        let plan = RequirementPlan::uniform(30, 1);
        let roster = roster();
        assert_eq!(
            check_day(&roster, &column(&["B"]), &plan, 0),
            DayVerdict::Infeasible(Shortfall::MissingCoverage(Skill::LanguageA))
        );
        assert_eq!(
            check_day(&roster, &column(&["C"]), &plan, 0),
            DayVerdict::Infeasible(Shortfall::MissingCoverage(Skill::LanguageB))
        );
        let v = check_day(&roster, &column(&["B", "C"]), &plan, 0);
        assert_eq!(v, DayVerdict::Infeasible(Shortfall::MissingCoverage(Skill::Veteran)));
        assert_eq!(v.reason(), "missing veteran coverage");
    }

    #[test]
    fn test_admin_not_counted() {
        let plan = RequirementPlan::uniform(30, 1);
        let v = check_day(&roster(), &column(&["root"]), &plan, 0);
        assert!(!v.is_feasible());
    }

    #[test]
    fn test_unknown_and_missing_names() {
        let plan = RequirementPlan::uniform(30, 2);
        let mut col = DutyColumn::new();
        col.insert("A".into(), true);
        col.insert("B".into(), true);
        col.insert("Ghost".into(), true);
        assert!(check_day(&roster(), &col, &plan, 0).is_feasible());
    }

    #[test]
    fn test_plan_per_day() {
        let plan = RequirementPlan::new().with_day(5, 3);
        let col = column(&["A", "B", "C", "D"]);
        assert!(check_day(&roster(), &col, &plan, 5).is_feasible());
        assert!(!check_day(&roster(), &col, &plan.clone().with_day(5, 5), 5).is_feasible());
    }

    #[test]
    fn test_pure_and_repeatable() {
        let plan = RequirementPlan::uniform(30, 3);
        let roster = roster();
        let col = column(&["A", "B", "C"]);
        let before = col.clone();

        let first = check_reduction(&roster, &col, &plan, 0, "C");
        let second = check_reduction(&roster, &col, &plan, 0, "C");
        assert_eq!(first, second);
        assert!(!first.is_feasible());
        assert_eq!(col, before);
    }
}
