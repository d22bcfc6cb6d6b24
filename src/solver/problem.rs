//! Roster problem formulation.
//!
//! Translates staff, calendar, plan, leave requests and history into a
//! flat model the search works on: one boolean per (staff, day), a pin per
//! cell, per-day requirements, per-staff rest quotas, and the trailing
//! days carried from the previous month.

use std::collections::HashMap;

use tracing::debug;

use crate::config::{RosterConfig, RuleConfig, WeightConfig};
use crate::error::{Result, RosterError};
use crate::models::{HistoryLog, LeaveRequest, MonthCalendar, RequirementPlan, Skill, StaffMember};
use crate::validation::Diagnostics;

/// Fixed state of a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pin {
    /// Decided by the search.
    Free,
    /// Forced rest (holiday, leave, administrative fix).
    Rest,
    /// Forced duty (January 4th).
    Duty,
}

/// Per-staff rest-day rule for the month.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestQuota {
    /// Normal month: rest days within `[min, max]`, excess above `min` penalized.
    Band { min: u32, max: u32 },
    /// Final month: at least the exact remaining entitlement, excess penalized.
    YearEnd { need: u32 },
}

impl RestQuota {
    /// Minimum rest days.
    pub fn min(&self) -> u32 {
        match *self {
            RestQuota::Band { min, .. } => min,
            RestQuota::YearEnd { need } => need,
        }
    }
}

/// A fully built solve input.
#[derive(Debug, Clone)]
pub struct RosterProblem {
    pub(crate) staff: Vec<StaffMember>,
    pub(crate) calendar: MonthCalendar,
    pub(crate) required: Vec<u32>,
    pub(crate) pins: Vec<Vec<Pin>>,
    pub(crate) trailing: Vec<Vec<bool>>,
    pub(crate) quotas: Vec<RestQuota>,
    pub(crate) weekend: Vec<usize>,
    pub(crate) exempt_day: Option<usize>,
    pub(crate) rules: RuleConfig,
    pub(crate) weights: WeightConfig,
}

/// Builder for [`RosterProblem`].
///
/// # Example
/// ```
/// use duty_roster::config::RosterConfig;
/// use duty_roster::models::{MonthCalendar, RequirementPlan, StaffMember};
/// use duty_roster::solver::RosterProblem;
///
/// let staff = vec![
///     StaffMember::new("A").language_a().language_b().veteran(),
///     StaffMember::new("B").language_a().language_b().veteran(),
/// ];
/// let calendar = MonthCalendar::new(2025, 6).unwrap();
/// let plan = RequirementPlan::uniform(calendar.days(), 1);
/// let config = RosterConfig::default().with_required_holidays(10);
///
/// let problem = RosterProblem::builder(&staff, &calendar, &plan)
///     .forced_rest("A", 9)
///     .build(&config)
///     .unwrap();
/// assert_eq!(problem.staff_count(), 2);
/// ```
#[derive(Debug)]
pub struct ProblemBuilder<'a> {
    staff: Vec<StaffMember>,
    calendar: &'a MonthCalendar,
    plan: &'a RequirementPlan,
    forced_rest: Vec<(String, usize)>,
    trailing: HashMap<String, Vec<bool>>,
    taken: HashMap<String, u32>,
    diagnostics: Diagnostics,
}

impl<'a> ProblemBuilder<'a> {
    /// Pins a cell to rest. Unknown names and out-of-range days are recorded
    /// as diagnostics at build time.
    pub fn forced_rest(mut self, name: impl Into<String>, day: usize) -> Self {
        self.forced_rest.push((name.into(), day));
        self
    }

    /// Pins every active leave request of this month to rest.
    pub fn leave_requests(mut self, requests: &[LeaveRequest]) -> Self {
        for (i, r) in requests.iter().enumerate() {
            if !r.is_active() {
                continue;
            }
            let Some(day) = self.calendar.day_index(r.date) else {
                continue;
            };
            if self.staff.iter().any(|s| s.name == r.staff_name) {
                self.forced_rest.push((r.staff_name.clone(), day));
            } else {
                self.diagnostics.push(
                    "leave_requests",
                    i,
                    format!("unknown staff '{}'", r.staff_name),
                );
            }
        }
        self
    }

    /// Sets the trailing on-duty days before the month, oldest first.
    pub fn trailing(mut self, name: impl Into<String>, days: Vec<bool>) -> Self {
        self.trailing.insert(name.into(), days);
        self
    }

    /// Sets rest days already taken earlier in the year.
    pub fn taken(mut self, name: impl Into<String>, days: u32) -> Self {
        self.taken.insert(name.into(), days);
        self
    }

    /// Reads trailing days and rest taken this year from the history log.
    pub fn history(mut self, log: &HistoryLog, window_len: usize) -> Self {
        let first = self.calendar.first_date();
        let tail = window_len.saturating_sub(1);
        for s in &self.staff {
            self.trailing
                .insert(s.name.clone(), log.trailing(&s.name, first, tail));
            let taken = log.rest_taken(&s.name, self.calendar.year, Some(self.calendar.month));
            self.taken.insert(s.name.clone(), taken);
        }
        self
    }

    /// Diagnostics collected so far.
    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    /// Builds the problem.
    ///
    /// # Errors
    /// - [`RosterError::EmptyRoster`] without schedulable staff.
    /// - [`RosterError::Infeasible`] if pins contradict each other or a
    ///   day or quota cannot be met whatever the search does.
    pub fn build(self, config: &RosterConfig) -> Result<RosterProblem> {
        self.build_with_diagnostics(config).map(|(p, _)| p)
    }

    /// Builds the problem and returns the skipped-input diagnostics.
    pub fn build_with_diagnostics(
        mut self,
        config: &RosterConfig,
    ) -> Result<(RosterProblem, Diagnostics)> {
        if self.staff.is_empty() {
            return Err(RosterError::EmptyRoster);
        }
        let rules = config.rules.clone();
        let cal = self.calendar;
        let days = cal.days();
        let n = self.staff.len();
        let index: HashMap<&str, usize> = self
            .staff
            .iter()
            .enumerate()
            .map(|(i, s)| (s.name.as_str(), i))
            .collect();

        let mut pins = vec![vec![Pin::Free; days]; n];
        for row in pins.iter_mut() {
            for &d in &cal.holidays {
                row[d] = Pin::Rest;
            }
        }

        let exempt_day = cal.forced_duty_day();
        if let Some(d) = exempt_day {
            for row in pins.iter_mut() {
                row[d] = Pin::Duty;
            }
        }

        for (i, (name, day)) in self.forced_rest.iter().enumerate() {
            let Some(&s) = index.get(name.as_str()) else {
                self.diagnostics
                    .push("forced_rest", i, format!("unknown staff '{name}'"));
                continue;
            };
            if *day >= days {
                self.diagnostics
                    .push("forced_rest", i, format!("day {day} outside month"));
                continue;
            }
            if pins[s][*day] == Pin::Duty {
                return Err(RosterError::Infeasible {
                    reason: format!(
                        "{name} requested rest on {} which is a forced duty day",
                        cal.label(*day)
                    ),
                });
            }
            pins[s][*day] = Pin::Rest;
        }

        let tail = rules.window_len.saturating_sub(1);
        let trailing: Vec<Vec<bool>> = self
            .staff
            .iter()
            .map(|s| {
                let given = self.trailing.get(&s.name).cloned().unwrap_or_default();
                // Keep the most recent `tail` days, padding older missing days with rest.
                let mut t = vec![false; tail.saturating_sub(given.len())];
                t.extend(given.iter().skip(given.len().saturating_sub(tail)));
                t
            })
            .collect();

        let quotas: Vec<RestQuota> = self
            .staff
            .iter()
            .map(|s| {
                if cal.is_year_end() {
                    let taken = self.taken.get(&s.name).copied().unwrap_or(0) as i64;
                    let need = (s.holiday_target as i64 - taken).clamp(0, days as i64) as u32;
                    RestQuota::YearEnd { need }
                } else {
                    RestQuota::Band {
                        min: rules.required_holidays,
                        max: rules.required_holidays + 1,
                    }
                }
            })
            .collect();

        let problem = RosterProblem {
            required: self.plan.materialize(days),
            weekend: cal.weekend_days(),
            calendar: cal.clone(),
            staff: self.staff,
            pins,
            trailing,
            quotas,
            exempt_day,
            rules,
            weights: config.weights.clone(),
        };

        if let Some(reason) = problem.precheck() {
            return Err(RosterError::Infeasible { reason });
        }

        debug!(
            event = "problem_built",
            staff = problem.staff_count(),
            days,
            holidays = problem.calendar.holidays.len(),
            skipped = self.diagnostics.len(),
        );
        Ok((problem, self.diagnostics))
    }
}

impl RosterProblem {
    /// Starts a builder over the schedulable members of `staff`.
    pub fn builder<'a>(
        staff: &[StaffMember],
        calendar: &'a MonthCalendar,
        plan: &'a RequirementPlan,
    ) -> ProblemBuilder<'a> {
        ProblemBuilder {
            staff: crate::models::schedulable(staff),
            calendar,
            plan,
            forced_rest: Vec::new(),
            trailing: HashMap::new(),
            taken: HashMap::new(),
            diagnostics: Diagnostics::new(),
        }
    }

    /// Number of schedulable staff (matrix rows).
    pub fn staff_count(&self) -> usize {
        self.staff.len()
    }

    /// Schedulable staff in row order.
    pub fn staff(&self) -> &[StaffMember] {
        &self.staff
    }

    /// Days in the month.
    pub fn days(&self) -> usize {
        self.calendar.days()
    }

    /// Target calendar.
    pub fn calendar(&self) -> &MonthCalendar {
        &self.calendar
    }

    /// Pin of one cell.
    #[inline]
    pub fn pin(&self, staff: usize, day: usize) -> Pin {
        self.pins[staff][day]
    }

    /// Rest quota of one staff row.
    pub fn quota(&self, staff: usize) -> RestQuota {
        self.quotas[staff]
    }

    /// Plan minimum of a day.
    pub fn required(&self, day: usize) -> u32 {
        self.required[day]
    }

    /// Whether headcount and coverage rules apply to a day.
    #[inline]
    pub fn is_staffed_day(&self, day: usize) -> bool {
        !self.calendar.is_holiday(day) && self.exempt_day != Some(day)
    }

    /// Trailing days of one staff row, oldest first.
    pub fn trailing(&self, staff: usize) -> &[bool] {
        &self.trailing[staff]
    }

    /// Cheap necessary conditions. Returns a reason when the model
    /// cannot be satisfied by any assignment.
    fn precheck(&self) -> Option<String> {
        let days = self.days();
        for d in (0..days).filter(|&d| self.is_staffed_day(d)) {
            let available: Vec<&StaffMember> = (0..self.staff_count())
                .filter(|&s| self.pins[s][d] != Pin::Rest)
                .map(|s| &self.staff[s])
                .collect();
            let required = self.required[d] as usize;
            if available.len() < required {
                return Some(format!(
                    "{} requires {} on duty but only {} are available",
                    self.calendar.label(d),
                    required,
                    available.len()
                ));
            }
            for skill in Skill::ALL {
                if !available.iter().any(|s| s.has_skill(skill)) {
                    return Some(format!(
                        "{} has no available staff with {} skill",
                        self.calendar.label(d),
                        skill.label()
                    ));
                }
            }
        }

        for (s, member) in self.staff.iter().enumerate() {
            let pinned_rest = self.pins[s].iter().filter(|&&p| p == Pin::Rest).count() as u32;
            let pinned_duty = self.pins[s].iter().filter(|&&p| p == Pin::Duty).count() as u32;
            let max_rest = days as u32 - pinned_duty;
            let quota = self.quotas[s];
            if quota.min() > max_rest {
                return Some(format!(
                    "{} needs {} rest days but at most {} are possible",
                    member.name,
                    quota.min(),
                    max_rest
                ));
            }
            if let RestQuota::Band { max, .. } = quota {
                if pinned_rest > max {
                    return Some(format!(
                        "{} has {} forced rest days, above the allowed {}",
                        member.name, pinned_rest, max
                    ));
                }
            }
        }

        // Total rest demanded versus room left by the plan across the month.
        let n = self.staff_count() as u32;
        let demand: u32 = self.quotas.iter().map(RestQuota::min).sum();
        let capacity: u32 = (0..days)
            .map(|d| {
                let duty = (0..self.staff_count())
                    .filter(|&s| self.pins[s][d] == Pin::Duty)
                    .count() as u32;
                let room = n - duty;
                if self.is_staffed_day(d) {
                    room.min(n.saturating_sub(self.required[d]))
                } else {
                    room
                }
            })
            .sum();
        if demand > capacity {
            return Some(format!(
                "rest quotas need {demand} rest days in total but the plan leaves room for {capacity}"
            ));
        }
        None
    }
}
