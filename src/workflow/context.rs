//! Application context: the state one administrator session works on.

use std::ops::RangeInclusive;

use chrono::NaiveDate;
use rand::Rng;
use tracing::info;

use super::Phase;
use crate::config::{ConfigError, RosterConfig};
use crate::error::{Result, RosterError};
use crate::feasibility::check_reduction;
use crate::lottery::{self, LotteryReport};
use crate::models::{
    ChangeKind, ChangeRequest, HistoryLog, LeaveRequest, LeaveStatus, MonthCalendar, PublicHoliday, RequestStatus,
    RequirementPlan, ScheduleMatrix, StaffMember,
};
use crate::report::{DayStats, HolidayBalance};
use crate::solver::{RosterProblem, Solution, Solver};
use crate::store::codec::{self, SystemState};
use crate::store::{tables, TableStore};
use crate::validation::{validate_roster, Diagnostics};

/// Outcome of closing a month.
#[derive(Debug, Clone)]
pub struct FinalizeReport {
    /// Lottery decisions in processing order.
    pub lottery: LotteryReport,
    /// The matrix folded into history.
    pub finalized: ScheduleMatrix,
}

/// Phase, target period, roster, requests, draft, plan and history.
///
/// Every phase operation checks the phase first, works on staged copies
/// and assigns them back only after every step succeeded, so a failing
/// call leaves the context as it was.
///
/// # Example
/// ```
/// use duty_roster::config::RosterConfig;
/// use duty_roster::workflow::{Phase, RosterContext};
///
/// let ctx = RosterContext::new(RosterConfig::default(), 2025, 6).unwrap();
/// assert_eq!(ctx.phase(), Phase::Normal);
/// assert_eq!(ctx.target(), (2025, 6));
/// assert!(ctx.draft().is_none());
/// ```
#[derive(Debug, Clone)]
pub struct RosterContext {
    config: RosterConfig,
    phase: Phase,
    base: MonthCalendar,
    staff: Vec<StaffMember>,
    holidays: Vec<PublicHoliday>,
    leave: Vec<LeaveRequest>,
    changes: Vec<ChangeRequest>,
    draft: Option<ScheduleMatrix>,
    plan: Option<RequirementPlan>,
    history: HistoryLog,
    load_diagnostics: Diagnostics,
    solve_diagnostics: Diagnostics,
}

fn month_calendar(year: i32, month: u32) -> Result<MonthCalendar> {
    MonthCalendar::new(year, month)
        .ok_or_else(|| ConfigError::Invalid(format!("invalid target month {year}-{month}")).into())
}

impl RosterContext {
    /// Creates an empty context in `Normal` for the given target month.
    pub fn new(config: RosterConfig, year: i32, month: u32) -> Result<Self> {
        Ok(Self {
            config,
            phase: Phase::Normal,
            base: month_calendar(year, month)?,
            staff: Vec::new(),
            holidays: Vec::new(),
            leave: Vec::new(),
            changes: Vec::new(),
            draft: None,
            plan: None,
            history: HistoryLog::new(),
            load_diagnostics: Diagnostics::new(),
            solve_diagnostics: Diagnostics::new(),
        })
    }

    /// Sets the roster.
    pub fn with_staff(mut self, staff: Vec<StaffMember>) -> Self {
        self.staff = staff;
        self
    }

    /// Sets the public-holiday master.
    pub fn with_holidays(mut self, holidays: Vec<PublicHoliday>) -> Self {
        self.holidays = holidays;
        self
    }

    /// Sets the history log.
    pub fn with_history(mut self, history: HistoryLog) -> Self {
        self.history = history;
        self
    }

    /// Sets the requirement plan of the target month.
    pub fn with_plan(mut self, plan: RequirementPlan) -> Self {
        self.plan = Some(plan);
        self
    }

    /// Sets the leave requests.
    pub fn with_leave_requests(mut self, leave: Vec<LeaveRequest>) -> Self {
        self.leave = leave;
        self
    }

    /// Sets the change requests.
    pub fn with_change_requests(mut self, changes: Vec<ChangeRequest>) -> Self {
        self.changes = changes;
        self
    }

    // -- accessors ----------------------------------------------------------

    /// Engine configuration.
    pub fn config(&self) -> &RosterConfig {
        &self.config
    }

    /// Current phase.
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Target year and month.
    pub fn target(&self) -> (i32, u32) {
        (self.base.year, self.base.month)
    }

    /// Target month with public holidays applied.
    pub fn calendar(&self) -> MonthCalendar {
        self.base.clone().with_public_holidays(&self.holidays)
    }

    /// Roster.
    pub fn staff(&self) -> &[StaffMember] {
        &self.staff
    }

    /// Leave requests.
    pub fn leave_requests(&self) -> &[LeaveRequest] {
        &self.leave
    }

    /// Change requests.
    pub fn change_requests(&self) -> &[ChangeRequest] {
        &self.changes
    }

    /// Current draft, if solved.
    pub fn draft(&self) -> Option<&ScheduleMatrix> {
        self.draft.as_ref()
    }

    /// History log.
    pub fn history(&self) -> &HistoryLog {
        &self.history
    }

    /// Requirement plan in effect; days without an entry use the
    /// configured default.
    pub fn plan(&self) -> RequirementPlan {
        self.plan
            .clone()
            .unwrap_or_else(|| RequirementPlan::with_default(self.config.rules.default_required))
    }

    /// Whether the target month has a stored plan.
    pub fn has_plan(&self) -> bool {
        self.plan.is_some()
    }

    /// Rows skipped by the last load or sync.
    pub fn diagnostics(&self) -> &Diagnostics {
        &self.load_diagnostics
    }

    /// Inputs ignored by the last solve (unknown staff, dates outside the
    /// month). Replaced on every solve.
    pub fn solve_diagnostics(&self) -> &Diagnostics {
        &self.solve_diagnostics
    }

    fn require(&self, operation: &'static str, expected: Phase) -> Result<()> {
        if self.phase == expected {
            Ok(())
        } else {
            Err(RosterError::OutOfPhase {
                operation,
                expected,
                actual: self.phase,
            })
        }
    }

    fn transition(&mut self, to: Phase) {
        info!(event = "phase_transition", from = %self.phase, to = %to);
        self.phase = to;
    }

    // -- administrator operations ------------------------------------------

    /// Moves the open period. Allowed only in `Normal`.
    pub fn set_target(&mut self, year: i32, month: u32) -> Result<()> {
        self.require("change the target month", Phase::Normal)?;
        let base = month_calendar(year, month)?;
        if (base.year, base.month) != self.target() {
            self.base = base;
            self.plan = None;
            self.draft = None;
        }
        Ok(())
    }

    /// Sets the normal-month rest-day target used by the next solve.
    /// Allowed only in `Normal`.
    ///
    /// # Errors
    /// [`RosterError::Config`] outside `8..=20`.
    pub fn set_required_holidays(&mut self, days: u32) -> Result<()> {
        self.require("change the holiday target", Phase::Normal)?;
        if !REQUIRED_HOLIDAYS.contains(&days) {
            return Err(ConfigError::Invalid(format!(
                "required holidays {days} outside {}..={}",
                REQUIRED_HOLIDAYS.start(),
                REQUIRED_HOLIDAYS.end()
            ))
            .into());
        }
        self.config.rules.required_holidays = days;
        Ok(())
    }

    /// Replaces the requirement plan. Allowed only in `Normal`, before the
    /// draft is published.
    pub fn set_plan(&mut self, plan: RequirementPlan) -> Result<()> {
        self.require("edit the requirement plan", Phase::Normal)?;
        self.plan = Some(plan);
        Ok(())
    }

    /// Solves the target month and keeps the result as the unpublished
    /// draft. Allowed only in `Normal`.
    ///
    /// # Errors
    /// - [`RosterError::InvalidRoster`] if the roster fails validation.
    /// - [`RosterError::Infeasible`] if no feasible schedule was found; the
    ///   previous draft, if any, is kept.
    pub fn solve_draft(&mut self) -> Result<Solution> {
        let problem = self.problem()?;
        let solution = Solver::new(self.config.clone()).solve(&problem)?;
        self.draft = Some(solution.matrix.clone());
        Ok(solution)
    }

    /// [`solve_draft`](Self::solve_draft) with an explicit random source.
    pub fn solve_draft_with_rng<R: Rng>(&mut self, rng: &mut R) -> Result<Solution> {
        let problem = self.problem()?;
        let solution = Solver::new(self.config.clone()).solve_with_rng(&problem, rng)?;
        self.draft = Some(solution.matrix.clone());
        Ok(solution)
    }

    fn problem(&mut self) -> Result<RosterProblem> {
        self.require("solve a draft", Phase::Normal)?;
        validate_roster(&self.staff).map_err(RosterError::InvalidRoster)?;
        let calendar = self.calendar();
        let plan = self.plan();
        let (problem, diags) = RosterProblem::builder(&self.staff, &calendar, &plan)
            .leave_requests(&self.leave)
            .history(&self.history, self.config.rules.window_len)
            .build_with_diagnostics(&self.config)?;
        self.solve_diagnostics = diags;
        Ok(problem)
    }

    /// Publishes the draft: `Normal → AdditionPhase`.
    pub fn publish_draft(&mut self) -> Result<()> {
        self.require("publish the draft", Phase::Normal)?;
        if self.draft.is_none() {
            return Err(RosterError::MissingDraft);
        }
        self.transition(Phase::AdditionPhase);
        Ok(())
    }

    /// Merges every pending addition of the target month into the draft
    /// and approves it: `AdditionPhase → ReductionPhase`. Additions are not
    /// checked; an addition on a duty cell is approved without change.
    /// Returns the number of approved additions.
    pub fn merge_additions(&mut self) -> Result<usize> {
        self.require("merge additions", Phase::AdditionPhase)?;
        let mut draft = self.draft.clone().ok_or(RosterError::MissingDraft)?;
        let mut changes = self.changes.clone();
        let calendar = self.calendar();

        let mut merged = 0;
        for request in changes
            .iter_mut()
            .filter(|r| r.kind == ChangeKind::Addition && r.is_pending())
        {
            let Some(day) = calendar.day_index(request.date) else {
                continue;
            };
            if draft.set_duty(&request.staff_name, day, true) {
                request.status = RequestStatus::Approved;
                merged += 1;
            }
        }

        self.draft = Some(draft);
        self.changes = changes;
        self.transition(Phase::ReductionPhase);
        info!(event = "additions_merged", approved = merged);
        Ok(merged)
    }

    /// Settles pending reductions by lottery, folds the draft into
    /// history, clears the draft and the month's plan, and opens the next
    /// month as the target: `ReductionPhase → Normal`.
    pub fn finalize_reductions<R: Rng>(&mut self, rng: &mut R) -> Result<FinalizeReport> {
        self.finalize_with(|changes, draft, staff, plan| lottery::resolve(changes, draft, staff, plan, rng))
    }

    /// [`finalize_reductions`](Self::finalize_reductions) with an explicit
    /// processing order (indices into [`change_requests`](Self::change_requests)).
    pub fn finalize_reductions_in_order(&mut self, order: &[usize]) -> Result<FinalizeReport> {
        self.finalize_with(|changes, draft, staff, plan| {
            lottery::resolve_in_order(changes, order, draft, staff, plan)
        })
    }

    fn finalize_with<F>(&mut self, run_lottery: F) -> Result<FinalizeReport>
    where
        F: FnOnce(&mut [ChangeRequest], &mut ScheduleMatrix, &[StaffMember], &RequirementPlan) -> LotteryReport,
    {
        self.require("finalize reductions", Phase::ReductionPhase)?;
        let mut draft = self.draft.clone().ok_or(RosterError::MissingDraft)?;
        let mut changes = self.changes.clone();
        let plan = self.plan();

        let (year, month) = MonthCalendar::next_month(self.base.year, self.base.month);
        let next = month_calendar(year, month)?;

        let lottery = run_lottery(&mut changes, &mut draft, &self.staff, &plan);
        let mut history = self.history.clone();
        history.fold_month(&self.calendar(), &draft);

        self.changes = changes;
        self.history = history;
        self.draft = None;
        self.plan = None;
        self.base = next;
        self.transition(Phase::Normal);
        info!(
            event = "month_finalized",
            year = draft.year,
            month = draft.month,
            approved = lottery.approved(),
            rejected = lottery.rejected(),
            next_year = year,
            next_month = month,
        );
        Ok(FinalizeReport {
            lottery,
            finalized: draft,
        })
    }

    // -- self-service ------------------------------------------------------

    fn member(&self, name: &str) -> Result<&StaffMember> {
        self.staff
            .iter()
            .find(|s| s.name == name && s.is_schedulable())
            .ok_or_else(|| RosterError::RequestRefused(format!("'{name}' is not a schedulable staff member")))
    }

    fn requested_change_days(&self, name: &str, kind: ChangeKind) -> Vec<NaiveDate> {
        self.changes
            .iter()
            .filter(|r| r.staff_name == name && r.kind == kind && r.is_active())
            .map(|r| r.date)
            .collect()
    }

    /// Draft rest days `name` may ask to work, excluding days already
    /// requested. Empty without a draft or for unknown staff.
    pub fn addition_candidates(&self, name: &str) -> Vec<usize> {
        let Some(draft) = &self.draft else {
            return Vec::new();
        };
        let Some(row) = draft.row_index(name) else {
            return Vec::new();
        };
        let calendar = self.calendar();
        let taken = self.requested_change_days(name, ChangeKind::Addition);
        (0..draft.days())
            .filter(|&d| !draft.get(row, d))
            .filter(|&d| !taken.contains(&calendar.date(d)))
            .collect()
    }

    /// Draft duty days `name` may ask to rest: not already requested, and
    /// the day stays feasible without them.
    pub fn reduction_candidates(&self, name: &str) -> Vec<usize> {
        let Some(draft) = &self.draft else {
            return Vec::new();
        };
        let Some(row) = draft.row_index(name) else {
            return Vec::new();
        };
        let calendar = self.calendar();
        let plan = self.plan();
        let taken = self.requested_change_days(name, ChangeKind::Reduction);
        (0..draft.days())
            .filter(|&d| draft.get(row, d))
            .filter(|&d| !taken.contains(&calendar.date(d)))
            .filter(|&d| check_reduction(&self.staff, &draft.column(d), &plan, d, name).is_feasible())
            .collect()
    }

    /// Files a leave request for the target month. Accepted only in `Normal`.
    pub fn submit_leave_request(&mut self, name: &str, date: NaiveDate) -> Result<&LeaveRequest> {
        self.require("request leave", Phase::Normal)?;
        self.member(name)?;
        if self.base.day_index(date).is_none() {
            return Err(RosterError::RequestRefused(format!(
                "{date} is outside the open period {}/{}",
                self.base.month, self.base.year
            )));
        }
        if self
            .leave
            .iter()
            .any(|r| r.staff_name == name && r.date == date && r.is_active())
        {
            return Err(RosterError::RequestRefused(format!("{name} already requested {date}")));
        }
        let id = next_id("L", self.leave.iter().map(|r| r.id.as_str()));
        self.leave.push(LeaveRequest::new(id, name, date));
        info!(event = "leave_requested", staff = name, date = %date);
        Ok(&self.leave[self.leave.len() - 1])
    }

    /// Files an addition or reduction request against the published draft.
    /// Additions are accepted only in `AdditionPhase` and reductions only in
    /// `ReductionPhase`; the day must be one of the member's candidates.
    pub fn submit_change_request(&mut self, name: &str, date: NaiveDate, kind: ChangeKind) -> Result<&ChangeRequest> {
        let (operation, expected) = match kind {
            ChangeKind::Addition => ("request an addition", Phase::AdditionPhase),
            ChangeKind::Reduction => ("request a reduction", Phase::ReductionPhase),
        };
        self.require(operation, expected)?;
        self.member(name)?;
        let Some(day) = self.base.day_index(date) else {
            return Err(RosterError::RequestRefused(format!("{date} is outside the draft month")));
        };
        if self.requested_change_days(name, kind).contains(&date) {
            return Err(RosterError::RequestRefused(format!("{name} already requested {date}")));
        }
        let candidates = match kind {
            ChangeKind::Addition => self.addition_candidates(name),
            ChangeKind::Reduction => self.reduction_candidates(name),
        };
        if !candidates.contains(&day) {
            return Err(RosterError::RequestRefused(format!(
                "{} {} is not available to {name}",
                kind.as_str(),
                self.base.label(day)
            )));
        }
        let id = next_id("C", self.changes.iter().map(|r| r.id.as_str()));
        self.changes.push(ChangeRequest::new(id, name, date, kind));
        info!(event = "change_requested", staff = name, date = %date, kind = kind.as_str());
        Ok(&self.changes[self.changes.len() - 1])
    }

    /// Cancels one of `name`'s own pending requests by id.
    pub fn cancel_request(&mut self, name: &str, id: &str) -> Result<()> {
        if let Some(r) = self
            .leave
            .iter_mut()
            .find(|r| r.id == id && r.staff_name == name && r.is_active())
        {
            r.status = LeaveStatus::Cancelled;
            return Ok(());
        }
        if let Some(r) = self
            .changes
            .iter_mut()
            .find(|r| r.id == id && r.staff_name == name && r.is_pending())
        {
            r.status = RequestStatus::Cancelled;
            return Ok(());
        }
        Err(RosterError::RequestRefused(format!("no pending request '{id}' by {name}")))
    }

    // -- overview ----------------------------------------------------------

    /// Per-day statistics of the draft.
    pub fn day_stats(&self) -> Option<Vec<DayStats>> {
        let draft = self.draft.as_ref()?;
        Some(DayStats::calculate(draft, &self.staff, &self.plan(), &self.calendar()))
    }

    /// Holiday balance of `name`: projected with the draft when there is
    /// one, from history alone otherwise.
    pub fn holiday_balance(&self, name: &str) -> Option<HolidayBalance> {
        let member = self.staff.iter().find(|s| s.name == name)?;
        Some(match &self.draft {
            Some(draft) => HolidayBalance::projected(member, &self.history, draft),
            None => HolidayBalance::from_history(member, &self.history, self.base.year),
        })
    }

    // -- storage -----------------------------------------------------------

    /// Loads a context from a store. Without a persisted target month the
    /// default period relative to `today` is used.
    pub fn load<S: TableStore + ?Sized>(config: RosterConfig, store: &S, today: NaiveDate) -> Result<Self> {
        let mut diags = Diagnostics::new();

        let (state, d) = codec::decode_state(&store.load(tables::SYSTEM_CONFIG)?);
        diags.extend(d);
        let (year, month) = state.target.unwrap_or_else(|| MonthCalendar::default_target(today));
        let base = month_calendar(year, month)?;

        let (staff, d) = codec::decode_staff(&store.load(tables::STAFF)?, config.rules.fallback_holiday_target);
        diags.extend(d);
        let (holidays, d) = codec::decode_holidays(&store.load(tables::PUBLIC_HOLIDAYS)?);
        diags.extend(d);
        let (leave, d) = codec::decode_leave(&store.load(tables::LEAVE_REQUESTS)?);
        diags.extend(d);
        let (changes, d) = codec::decode_changes(&store.load(tables::CHANGE_REQUESTS)?);
        diags.extend(d);
        let (plan, d) = codec::decode_plan(
            &store.load(tables::DRAFT_REQUIREMENTS)?,
            &base,
            config.rules.default_required,
        );
        diags.extend(d);
        let (draft, d) = codec::decode_matrix(&store.load(tables::DRAFT_SCHEDULE)?, &base);
        diags.extend(d);
        let (history, d) = codec::decode_history(&store.load(tables::HISTORY)?);
        diags.extend(d);

        info!(
            event = "context_loaded",
            phase = %state.phase,
            year,
            month,
            staff = staff.len(),
            skipped_rows = diags.len(),
        );
        Ok(Self {
            config,
            phase: state.phase,
            base,
            staff,
            holidays,
            leave,
            changes,
            draft,
            plan: (!plan.is_empty()).then_some(plan),
            history,
            load_diagnostics: diags,
            solve_diagnostics: Diagnostics::new(),
        })
    }

    /// Reloads everything from a store, keeping the configuration.
    pub fn sync_from<S: TableStore + ?Sized>(&mut self, store: &S, today: NaiveDate) -> Result<()> {
        *self = Self::load(self.config.clone(), store, today)?;
        Ok(())
    }

    /// Writes every table back to a store.
    pub fn persist_to<S: TableStore + ?Sized>(&self, store: &mut S) -> Result<()> {
        let calendar = self.calendar();
        store.save(tables::STAFF, codec::encode_staff(&self.staff))?;
        store.save(tables::PUBLIC_HOLIDAYS, codec::encode_holidays(&self.holidays))?;
        store.save(tables::LEAVE_REQUESTS, codec::encode_leave(&self.leave))?;
        store.save(tables::CHANGE_REQUESTS, codec::encode_changes(&self.changes))?;

        let mut existing = store.load(tables::DRAFT_REQUIREMENTS)?;
        codec::clear_plan_before(&mut existing, calendar.date(0));
        let plan_table = match &self.plan {
            Some(plan) => codec::encode_plan(&existing, &calendar, plan),
            None => {
                let mut t = existing;
                codec::clear_plan_month(&mut t, &calendar);
                t
            }
        };
        store.save(tables::DRAFT_REQUIREMENTS, plan_table)?;

        match &self.draft {
            Some(draft) => store.save(tables::DRAFT_SCHEDULE, codec::encode_matrix(draft, &calendar))?,
            None => store.clear(tables::DRAFT_SCHEDULE)?,
        }
        store.save(tables::HISTORY, codec::encode_history(&self.history))?;

        let existing = store.load(tables::SYSTEM_CONFIG)?;
        let state = SystemState {
            phase: self.phase,
            target: Some(self.target()),
        };
        store.save(tables::SYSTEM_CONFIG, codec::encode_state(&existing, &state))?;
        Ok(())
    }
}

/// Admin range of the normal-month rest-day target.
const REQUIRED_HOLIDAYS: RangeInclusive<u32> = 8..=20;

/// Next free id of the form `<prefix><number>`.
fn next_id<'a>(prefix: &str, existing: impl Iterator<Item = &'a str> + Clone) -> String {
    let mut n = existing.clone().count() + 1;
    loop {
        let id = format!("{prefix}{n:04}");
        if !existing.clone().any(|e| e == id) {
            return id;
        }
        n += 1;
    }
}
