//! Monthly duty-roster engine.
//!
//! Builds a staff × day work/rest matrix for one month under headcount,
//! skill-coverage and fairness rules, then runs the request workflow that
//! lets staff negotiate changes against the published draft before it is
//! folded into history.
//!
//! # Modules
//!
//! - **`models`**: Domain types: `StaffMember`, `MonthCalendar`,
//!   `RequirementPlan`, `ScheduleMatrix`, `LeaveRequest`, `ChangeRequest`,
//!   `HistoryLog`
//! - **`solver`**: Simulated annealing over the matrix with a hard/soft score
//! - **`feasibility`**: Single-day staffing and coverage checks
//! - **`lottery`**: Random-order settlement of reduction requests
//! - **`workflow`**: `Normal → AdditionPhase → ReductionPhase` state machine
//!   and the `RosterContext` that drives it
//! - **`store`**: Named string tables and the codecs to domain types
//! - **`report`**: Day statistics and holiday balances
//! - **`validation`**: Roster integrity checks and row diagnostics
//! - **`config`** / **`error`**: TOML configuration and the crate error type
//!
//! # Example
//!
//! ```no_run
//! use duty_roster::config::RosterConfig;
//! use duty_roster::models::{MonthCalendar, RequirementPlan, StaffMember};
//! use duty_roster::solver::{RosterProblem, Solver};
//!
//! let staff = vec![
//!     StaffMember::new("A").language_a().veteran(),
//!     StaffMember::new("B").language_b().veteran(),
//!     StaffMember::new("C").language_a(),
//!     StaffMember::new("D").language_b(),
//!     StaffMember::new("E").language_a().language_b(),
//! ];
//! let calendar = MonthCalendar::new(2025, 6).unwrap();
//! let plan = RequirementPlan::uniform(calendar.days(), 4);
//! let config = RosterConfig::default().with_required_holidays(6);
//!
//! let problem = RosterProblem::builder(&staff, &calendar, &plan).build(&config)?;
//! let solution = Solver::new(config).solve(&problem)?;
//! println!("{}", solution.score);
//! # Ok::<(), duty_roster::error::RosterError>(())
//! ```

pub mod config;
pub mod error;
pub mod feasibility;
pub mod lottery;
pub mod models;
pub mod report;
pub mod solver;
pub mod store;
pub mod validation;
pub mod workflow;
