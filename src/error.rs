//! Error types for roster operations.
//!
//! Only true infeasibility and out-of-phase operations surface as errors.
//! Malformed input rows are skipped and reported as
//! [`Diagnostic`](crate::validation::Diagnostic)s instead.

use thiserror::Error;

use crate::config::ConfigError;
use crate::validation::ValidationError;
use crate::workflow::Phase;

/// Main error type for roster operations.
#[derive(Debug, Error)]
pub enum RosterError {
    /// No assignment satisfies the hard constraints within the time budget.
    #[error("No feasible schedule: {reason}")]
    Infeasible { reason: String },

    /// Operation is not legal in the current phase. Nothing was mutated.
    #[error("Cannot {operation} during {actual} (requires {expected})")]
    OutOfPhase {
        operation: &'static str,
        expected: Phase,
        actual: Phase,
    },

    /// A merge or finalize was attempted without a published draft.
    #[error("No draft schedule has been published")]
    MissingDraft,

    /// There are no schedulable staff members.
    #[error("Roster has no schedulable staff")]
    EmptyRoster,

    /// Roster failed structural validation.
    #[error("Invalid roster: {} problem(s)", .0.len())]
    InvalidRoster(Vec<ValidationError>),

    /// A request was refused by the submission rules.
    #[error("Request refused: {0}")]
    RequestRefused(String),

    /// Configuration error.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Storage backend failure.
    #[error("Store error: {0}")]
    Store(String),
}

/// Result type alias for roster operations.
pub type Result<T> = std::result::Result<T, RosterError>;
