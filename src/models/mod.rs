//! Roster domain models.
//!
//! Provides the data types shared by the solver, the feasibility checker,
//! the reduction lottery and the phase workflow.
//!
//! # Domain Mappings
//!
//! | duty-roster | Meaning |
//! |-------------|---------|
//! | StaffMember | One rostered person with skill flags and entitlement |
//! | MonthCalendar | Target month: day indices, weekdays, holidays |
//! | RequirementPlan | Minimum on-duty headcount per day |
//! | ScheduleMatrix | Staff × day work/rest assignment |
//! | LeaveRequest / ChangeRequest | Staff-initiated pins and changes |
//! | HistoryLog | Finalized days across months |

mod calendar;
mod history;
mod matrix;
mod plan;
mod request;
mod staff;

pub use calendar::{parse_date, weekday_label, MonthCalendar, PublicHoliday};
pub use history::{HistoryLog, HistoryRow};
pub use matrix::{DutyColumn, ScheduleMatrix};
pub use plan::{RequirementPlan, DEFAULT_REQUIRED};
pub use request::{ChangeKind, ChangeRequest, LeaveRequest, LeaveStatus, RequestStatus};
pub use staff::{schedulable, Role, Skill, StaffMember};
