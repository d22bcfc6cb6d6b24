//! Roster metrics for the administrator overview.
//!
//! # Metrics
//!
//! | Metric | Definition |
//! |--------|-----------|
//! | On duty | Schedulable staff on duty that day |
//! | Skill counts | On-duty language-A / language-B / veteran members |
//! | Slack | On duty minus plan minimum (negative = understaffed) |
//! | Taken | Rest days recorded this year |
//! | Remaining | max(0, annual target − taken) |
//! | Weekend load | Duty days on non-holiday Saturdays and Sundays |

use std::collections::BTreeMap;

use chrono::Weekday;

use crate::models::{HistoryLog, MonthCalendar, RequirementPlan, ScheduleMatrix, Skill, StaffMember};

/// Staffing of one day.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DayStats {
    /// Day index.
    pub day: usize,
    /// `month/day` label.
    pub label: String,
    /// Weekday.
    pub weekday: Weekday,
    /// Public holiday flag.
    pub holiday: bool,
    /// Plan minimum.
    pub required: u32,
    /// Schedulable staff on duty.
    pub on_duty: u32,
    /// On-duty language-A speakers.
    pub language_a: u32,
    /// On-duty language-B speakers.
    pub language_b: u32,
    /// On-duty veterans.
    pub veteran: u32,
}

impl DayStats {
    /// Computes per-day statistics for every day of the matrix.
    /// Matrix rows without a schedulable roster entry are not counted.
    pub fn calculate(
        matrix: &ScheduleMatrix,
        staff: &[StaffMember],
        plan: &RequirementPlan,
        calendar: &MonthCalendar,
    ) -> Vec<DayStats> {
        let members: Vec<Option<&StaffMember>> = matrix
            .staff()
            .iter()
            .map(|name| staff.iter().find(|s| &s.name == name && s.is_schedulable()))
            .collect();

        (0..matrix.days().min(calendar.days()))
            .map(|day| {
                let on: Vec<&StaffMember> = members
                    .iter()
                    .enumerate()
                    .filter(|&(row, _)| matrix.get(row, day))
                    .filter_map(|(_, m)| *m)
                    .collect();
                let count = |skill: Skill| on.iter().filter(|s| s.has_skill(skill)).count() as u32;
                DayStats {
                    day,
                    label: calendar.label(day),
                    weekday: calendar.weekday(day),
                    holiday: calendar.is_holiday(day),
                    required: plan.required(day),
                    on_duty: on.len() as u32,
                    language_a: count(Skill::LanguageA),
                    language_b: count(Skill::LanguageB),
                    veteran: count(Skill::Veteran),
                }
            })
            .collect()
    }

    /// On duty minus plan minimum.
    pub fn slack(&self) -> i64 {
        self.on_duty as i64 - self.required as i64
    }

    /// Whether headcount and every coverage skill are met. Holidays pass.
    pub fn is_covered(&self) -> bool {
        self.holiday
            || (self.slack() >= 0 && self.language_a > 0 && self.language_b > 0 && self.veteran > 0)
    }
}

/// Annual rest-day accounting of one staff member.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HolidayBalance {
    /// Annual entitlement.
    pub target: u32,
    /// Rest days taken this year.
    pub taken: u32,
    /// `max(0, target − taken)`.
    pub remaining: u32,
}

impl HolidayBalance {
    /// Balance from a target and a taken count.
    pub fn new(target: u32, taken: u32) -> Self {
        Self {
            target,
            taken,
            remaining: target.saturating_sub(taken),
        }
    }

    /// Balance from finalized history alone.
    pub fn from_history(member: &StaffMember, history: &HistoryLog, year: i32) -> Self {
        Self::new(member.holiday_target, history.rest_taken(&member.name, year, None))
    }

    /// Balance assuming `draft` is finalized as is: history of the draft's
    /// year outside its month, plus the draft's rest days.
    pub fn projected(member: &StaffMember, history: &HistoryLog, draft: &ScheduleMatrix) -> Self {
        let before = history.rest_taken(&member.name, draft.year, Some(draft.month));
        let in_draft = draft.rest_days_of(&member.name).unwrap_or(0) as u32;
        Self::new(member.holiday_target, before + in_draft)
    }
}

/// Summary of a whole matrix.
#[derive(Debug, Clone, PartialEq)]
pub struct RosterSummary {
    /// Days below plan minimum or missing a skill (holidays excluded).
    pub uncovered_days: usize,
    /// Mean on-duty headcount over non-holiday days.
    pub avg_on_duty: f64,
    /// Rest days per staff name.
    pub rest_days: BTreeMap<String, u32>,
    /// Weekend duty days per staff name.
    pub weekend_duty: BTreeMap<String, u32>,
}

impl RosterSummary {
    /// Computes the summary.
    pub fn calculate(
        matrix: &ScheduleMatrix,
        staff: &[StaffMember],
        plan: &RequirementPlan,
        calendar: &MonthCalendar,
    ) -> Self {
        let days = DayStats::calculate(matrix, staff, plan, calendar);
        let worked: Vec<&DayStats> = days.iter().filter(|d| !d.holiday).collect();
        let avg_on_duty = if worked.is_empty() {
            0.0
        } else {
            worked.iter().map(|d| d.on_duty as f64).sum::<f64>() / worked.len() as f64
        };

        let weekend = calendar.weekend_days();
        let mut rest_days = BTreeMap::new();
        let mut weekend_duty = BTreeMap::new();
        for (name, row) in matrix.rows() {
            rest_days.insert(name.to_string(), row.iter().filter(|&&on| !on).count() as u32);
            let load = weekend.iter().filter(|&&d| row.get(d).copied().unwrap_or(false)).count();
            weekend_duty.insert(name.to_string(), load as u32);
        }

        Self {
            uncovered_days: days.iter().filter(|d| !d.is_covered()).count(),
            avg_on_duty,
            rest_days,
            weekend_duty,
        }
    }

    /// Largest weekend load minus smallest.
    pub fn weekend_spread(&self) -> u32 {
        let max = self.weekend_duty.values().max().copied().unwrap_or(0);
        let min = self.weekend_duty.values().min().copied().unwrap_or(0);
        max - min
    }
}
