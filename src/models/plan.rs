//! Requirement plan: minimum on-duty headcount per day.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Default minimum headcount for days the plan does not mention.
pub const DEFAULT_REQUIRED: u32 = 4;

/// Minimum on-duty headcount per day index of the target month.
///
/// Days without an entry fall back to the plan default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequirementPlan {
    required: BTreeMap<usize, u32>,
    default_required: u32,
}

impl Default for RequirementPlan {
    fn default() -> Self {
        Self::new()
    }
}

impl RequirementPlan {
    /// Creates an empty plan with the standard default.
    pub fn new() -> Self {
        Self::with_default(DEFAULT_REQUIRED)
    }

    /// Creates an empty plan with a custom default.
    pub fn with_default(default_required: u32) -> Self {
        Self {
            required: BTreeMap::new(),
            default_required,
        }
    }

    /// Creates a plan with the same requirement for every day.
    pub fn uniform(days: usize, required: u32) -> Self {
        let mut plan = Self::with_default(required);
        for d in 0..days {
            plan.set(d, required);
        }
        plan
    }

    /// Sets the requirement for a day (builder form).
    pub fn with_day(mut self, day: usize, required: u32) -> Self {
        self.set(day, required);
        self
    }

    /// Sets the requirement for a day.
    pub fn set(&mut self, day: usize, required: u32) {
        self.required.insert(day, required);
    }

    /// Minimum headcount for a day.
    #[inline]
    pub fn required(&self, day: usize) -> u32 {
        self.required.get(&day).copied().unwrap_or(self.default_required)
    }

    /// The fallback headcount.
    pub fn default_required(&self) -> u32 {
        self.default_required
    }

    /// Explicit entries in day order.
    pub fn entries(&self) -> impl Iterator<Item = (usize, u32)> + '_ {
        self.required.iter().map(|(&d, &r)| (d, r))
    }

    /// Whether the plan has no explicit entries.
    pub fn is_empty(&self) -> bool {
        self.required.is_empty()
    }

    /// Fully materialized requirements for `days` days.
    pub fn materialize(&self, days: usize) -> Vec<u32> {
        (0..days).map(|d| self.required(d)).collect()
    }
}
