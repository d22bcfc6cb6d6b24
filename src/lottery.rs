//! Reduction lottery.
//!
//! Adjudicates pending reduction requests against a draft. Requests are
//! processed one at a time in random order, each judged by
//! [`check_reduction`] against the draft as mutated by the requests before
//! it. There is no backtracking: an early winner can use up the slack a
//! later request on the same day needed, so the order alone decides
//! conflicts.
//!
//! A request is skipped (status left `requested`) when its staff member is
//! not in the draft, its date lies outside the draft's month, or the cell is
//! already rest.

use std::fmt;

use chrono::NaiveDate;
use rand::seq::SliceRandom;
use rand::Rng;
use tracing::{debug, info};

use crate::feasibility::{check_reduction, DayVerdict, Shortfall};
use crate::models::{
    ChangeKind, ChangeRequest, MonthCalendar, RequestStatus, RequirementPlan, ScheduleMatrix, StaffMember,
};

/// Why a request was passed over without a verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Staff member has no row in the draft.
    UnknownStaff,
    /// Date outside the draft's month.
    OutsideMonth,
    /// Cell is already rest.
    AlreadyRest,
}

/// Outcome of one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LotteryOutcome {
    /// Flip committed.
    Approved,
    /// Flip would break the day.
    Rejected(Shortfall),
    /// Not adjudicated.
    Skipped(SkipReason),
}

/// One entry of the decision log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decision {
    /// Request id.
    pub request_id: String,
    /// Requesting staff member.
    pub staff_name: String,
    /// Requested date.
    pub date: NaiveDate,
    /// Outcome.
    pub outcome: LotteryOutcome,
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = self.date.format("%-m/%-d");
        match self.outcome {
            LotteryOutcome::Approved => write!(f, "approved: {} {}", self.staff_name, label),
            LotteryOutcome::Rejected(why) => {
                write!(f, "rejected: {} {} ({})", self.staff_name, label, why)
            }
            LotteryOutcome::Skipped(why) => {
                let why = match why {
                    SkipReason::UnknownStaff => "unknown staff",
                    SkipReason::OutsideMonth => "outside month",
                    SkipReason::AlreadyRest => "already rest",
                };
                write!(f, "skipped: {} {} ({})", self.staff_name, label, why)
            }
        }
    }
}

/// Decision log of one lottery run, in processing order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LotteryReport {
    /// Every processed request.
    pub decisions: Vec<Decision>,
}

impl LotteryReport {
    /// Number of approved requests.
    pub fn approved(&self) -> usize {
        self.count(|o| matches!(o, LotteryOutcome::Approved))
    }

    /// Number of rejected requests.
    pub fn rejected(&self) -> usize {
        self.count(|o| matches!(o, LotteryOutcome::Rejected(_)))
    }

    /// Number of skipped requests.
    pub fn skipped(&self) -> usize {
        self.count(|o| matches!(o, LotteryOutcome::Skipped(_)))
    }

    /// Human-readable log lines.
    pub fn lines(&self) -> Vec<String> {
        self.decisions.iter().map(ToString::to_string).collect()
    }

    fn count(&self, pred: impl Fn(&LotteryOutcome) -> bool) -> usize {
        self.decisions.iter().filter(|d| pred(&d.outcome)).count()
    }
}

/// Runs the lottery over every pending reduction in `requests`, in an
/// order drawn from `rng`. Statuses in `requests` and cells in `draft` are
/// updated in place.
pub fn resolve<R: Rng>(
    requests: &mut [ChangeRequest],
    draft: &mut ScheduleMatrix,
    staff: &[StaffMember],
    plan: &RequirementPlan,
    rng: &mut R,
) -> LotteryReport {
    let mut order = pending_reductions(requests);
    order.shuffle(rng);
    resolve_in_order(requests, &order, draft, staff, plan)
}

/// Runs the lottery in an explicit order of indices into `requests`.
/// Indices that are out of range or not pending reductions are ignored.
pub fn resolve_in_order(
    requests: &mut [ChangeRequest],
    order: &[usize],
    draft: &mut ScheduleMatrix,
    staff: &[StaffMember],
    plan: &RequirementPlan,
) -> LotteryReport {
    let mut report = LotteryReport::default();
    let calendar = MonthCalendar::new(draft.year, draft.month);

    for &i in order {
        let Some(request) = requests.get_mut(i) else {
            continue;
        };
        if request.kind != ChangeKind::Reduction || !request.is_pending() {
            continue;
        }

        let outcome = adjudicate(request, calendar.as_ref(), draft, staff, plan);
        match outcome {
            LotteryOutcome::Approved => request.status = RequestStatus::Approved,
            LotteryOutcome::Rejected(_) => request.status = RequestStatus::Rejected,
            LotteryOutcome::Skipped(_) => {}
        }
        let decision = Decision {
            request_id: request.id.clone(),
            staff_name: request.staff_name.clone(),
            date: request.date,
            outcome,
        };
        debug!(event = "lottery_decision", decision = %decision);
        report.decisions.push(decision);
    }

    info!(
        event = "lottery_done",
        approved = report.approved(),
        rejected = report.rejected(),
        skipped = report.skipped(),
    );
    report
}

fn adjudicate(
    request: &ChangeRequest,
    calendar: Option<&MonthCalendar>,
    draft: &mut ScheduleMatrix,
    staff: &[StaffMember],
    plan: &RequirementPlan,
) -> LotteryOutcome {
    let Some(day) = calendar.and_then(|c| c.day_index(request.date)) else {
        return LotteryOutcome::Skipped(SkipReason::OutsideMonth);
    };
    let Some(row) = draft.row_index(&request.staff_name) else {
        return LotteryOutcome::Skipped(SkipReason::UnknownStaff);
    };
    if !draft.get(row, day) {
        return LotteryOutcome::Skipped(SkipReason::AlreadyRest);
    }

    let verdict = check_reduction(staff, &draft.column(day), plan, day, &request.staff_name);
    match verdict {
        DayVerdict::Feasible => {
            draft.set(row, day, false);
            LotteryOutcome::Approved
        }
        DayVerdict::Infeasible(why) => LotteryOutcome::Rejected(why),
    }
}

fn pending_reductions(requests: &[ChangeRequest]) -> Vec<usize> {
    requests
        .iter()
        .enumerate()
        .filter(|(_, r)| r.kind == ChangeKind::Reduction && r.is_pending())
        .map(|(i, _)| i)
        .collect()
}
