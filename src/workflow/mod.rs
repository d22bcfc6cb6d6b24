//! Monthly request workflow.
//!
//! ```text
//! Normal ──publish_draft──▶ AdditionPhase ──merge_additions──▶ ReductionPhase
//!   ▲                                                              │
//!   └────────────────────────finalize_reductions───────────────────┘
//! ```
//!
//! | Phase | Accepted requests |
//! |-------|-------------------|
//! | `Normal` | leave for the open period |
//! | `AdditionPhase` | additions against the published draft |
//! | `ReductionPhase` | reductions, later settled by lottery |
//!
//! Every transition is administrator-triggered and checks the current
//! phase first; an out-of-phase call fails with
//! [`RosterError::OutOfPhase`](crate::error::RosterError::OutOfPhase)
//! and changes nothing.

mod context;

pub use context::{FinalizeReport, RosterContext};

use std::fmt;

use serde::{Deserialize, Serialize};

/// Workflow phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Phase {
    /// No draft in negotiation; leave requests open.
    #[default]
    Normal,
    /// Draft published; additions open.
    AdditionPhase,
    /// Additions merged; reductions open.
    ReductionPhase,
}

impl Phase {
    /// Storage representation.
    pub fn as_str(self) -> &'static str {
        match self {
            Phase::Normal => "normal",
            Phase::AdditionPhase => "addition",
            Phase::ReductionPhase => "reduction",
        }
    }

    /// Parses the storage representation.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "normal" => Some(Phase::Normal),
            "addition" | "additionphase" => Some(Phase::AdditionPhase),
            "reduction" | "reductionphase" => Some(Phase::ReductionPhase),
            _ => None,
        }
    }

    /// Phase reached by the next transition.
    pub fn next(self) -> Self {
        match self {
            Phase::Normal => Phase::AdditionPhase,
            Phase::AdditionPhase => Phase::ReductionPhase,
            Phase::ReductionPhase => Phase::Normal,
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Normal => f.write_str("Normal"),
            Phase::AdditionPhase => f.write_str("AdditionPhase"),
            Phase::ReductionPhase => f.write_str("ReductionPhase"),
        }
    }
}
