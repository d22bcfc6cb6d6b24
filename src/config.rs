//! Engine configuration.
//!
//! Loaded from TOML so search budgets, rule constants and objective weights
//! can change without code changes. Every field has a default, so an empty
//! document is a valid configuration.
//!
//! ```
//! use duty_roster::config::RosterConfig;
//! use std::time::Duration;
//!
//! let config = RosterConfig::from_toml_str(r#"
//!     [termination]
//!     seconds_spent_limit = 5
//!
//!     [rules]
//!     required_holidays = 9
//! "#).unwrap();
//!
//! assert_eq!(config.termination.time_limit(), Duration::from_secs(5));
//! assert_eq!(config.rules.required_holidays, 9);
//! assert_eq!(config.rules.default_required, 4);
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration error.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Top-level engine configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RosterConfig {
    /// When the search stops.
    pub termination: TerminationConfig,
    /// Search tuning.
    pub search: SearchConfig,
    /// Objective weights.
    pub weights: WeightConfig,
    /// Rule constants.
    pub rules: RuleConfig,
}

impl RosterConfig {
    /// Creates the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Parses and validates configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects settings the engine cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.termination.seconds_spent_limit == 0 && self.termination.millis_spent_limit.is_none() {
            return Err(ConfigError::Invalid("time limit must be positive".into()));
        }
        if self.termination.millis_spent_limit == Some(0) {
            return Err(ConfigError::Invalid("millis_spent_limit must be positive".into()));
        }
        let search = &self.search;
        if !(search.min_temperature > 0.0 && search.min_temperature < search.initial_temperature) {
            return Err(ConfigError::Invalid(format!(
                "min_temperature ({}) must be positive and below initial_temperature ({})",
                search.min_temperature, search.initial_temperature
            )));
        }
        if !(search.cooling_alpha > 0.0 && search.cooling_alpha < 1.0) {
            return Err(ConfigError::Invalid("cooling_alpha must lie in (0, 1)".into()));
        }
        if search.iterations_per_temperature == 0 {
            return Err(ConfigError::Invalid("iterations_per_temperature must be positive".into()));
        }
        if self.rules.window_len == 0 || self.rules.max_duty_in_window >= self.rules.window_len {
            return Err(ConfigError::Invalid(format!(
                "max_duty_in_window ({}) must be below window_len ({})",
                self.rules.max_duty_in_window, self.rules.window_len
            )));
        }
        if self.rules.rest_streak_len == 0 {
            return Err(ConfigError::Invalid("rest_streak_len must be positive".into()));
        }
        let w = &self.weights;
        if [w.inexact_headcount, w.holiday_excess, w.year_end_excess, w.rest_streak, w.weekend_square]
            .iter()
            .any(|&v| v < 0)
        {
            return Err(ConfigError::Invalid("weights must be non-negative".into()));
        }
        Ok(())
    }

    /// Sets the wall-clock budget.
    pub fn with_time_limit(mut self, limit: Duration) -> Self {
        self.termination.seconds_spent_limit = limit.as_secs();
        self.termination.millis_spent_limit = Some(limit.as_millis() as u64);
        self
    }

    /// Stops once a feasible best has not improved for `limit`.
    pub fn with_unimproved_limit(mut self, limit: Duration) -> Self {
        self.termination.unimproved_millis_spent_limit = Some(limit.as_millis() as u64);
        self
    }

    /// Makes the search reproducible.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.search.random_seed = Some(seed);
        self
    }

    /// Sets the normal-month rest-day target.
    pub fn with_required_holidays(mut self, days: u32) -> Self {
        self.rules.required_holidays = days;
        self
    }
}

/// Termination settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TerminationConfig {
    /// Hard wall-clock budget in seconds.
    pub seconds_spent_limit: u64,
    /// Finer-grained budget; overrides `seconds_spent_limit` when set.
    pub millis_spent_limit: Option<u64>,
    /// Early exit once a feasible best is stale for this long.
    pub unimproved_millis_spent_limit: Option<u64>,
}

impl Default for TerminationConfig {
    fn default() -> Self {
        Self {
            seconds_spent_limit: 15,
            millis_spent_limit: None,
            unimproved_millis_spent_limit: None,
        }
    }
}

impl TerminationConfig {
    /// Effective wall-clock budget.
    pub fn time_limit(&self) -> Duration {
        match self.millis_spent_limit {
            Some(ms) => Duration::from_millis(ms),
            None => Duration::from_secs(self.seconds_spent_limit),
        }
    }

    /// Stale-best limit, if any.
    pub fn unimproved_limit(&self) -> Option<Duration> {
        self.unimproved_millis_spent_limit.map(Duration::from_millis)
    }
}

/// Annealing schedule.
///
/// Temperatures are in soft-score points. One run cools geometrically
/// from `initial_temperature` to `min_temperature`, then the search
/// restarts from its best matrix while time remains.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Seed for the search RNG. `None` draws from OS entropy.
    pub random_seed: Option<u64>,
    pub initial_temperature: f64,
    pub min_temperature: f64,
    /// Geometric cooling factor per temperature step.
    pub cooling_alpha: f64,
    /// Moves tried at each temperature.
    pub iterations_per_temperature: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            random_seed: None,
            initial_temperature: 1000.0,
            min_temperature: 1.0,
            cooling_alpha: 0.97,
            iterations_per_temperature: 200,
        }
    }
}

/// Soft objective weights.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeightConfig {
    /// Per day whose headcount is not exactly the plan minimum.
    pub inexact_headcount: i64,
    /// Per rest day above the normal-month target.
    pub holiday_excess: i64,
    /// Per rest day above the exact year-end remaining entitlement.
    pub year_end_excess: i64,
    /// Per all-rest streak of `rest_streak_len` days.
    pub rest_streak: i64,
    /// Multiplies the square of each staff member's weekend duty count.
    pub weekend_square: i64,
}

impl Default for WeightConfig {
    fn default() -> Self {
        Self {
            inexact_headcount: 50,
            holiday_excess: 100,
            year_end_excess: 200,
            rest_streak: 50,
            weekend_square: 200,
        }
    }
}

/// Rule constants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuleConfig {
    /// Headcount for days missing from the plan.
    pub default_required: u32,
    /// Allowed headcount above the plan minimum.
    pub overstaff_margin: u32,
    /// Rolling window length in days.
    pub window_len: usize,
    /// Maximum duty days inside one rolling window.
    pub max_duty_in_window: usize,
    /// Length of a penalized all-rest streak.
    pub rest_streak_len: usize,
    /// Normal-month rest-day target (rest must land in `[target, target + 1]`).
    pub required_holidays: u32,
    /// Annual entitlement used when a staff record carries none.
    pub fallback_holiday_target: u32,
}

impl Default for RuleConfig {
    fn default() -> Self {
        Self {
            default_required: 4,
            overstaff_margin: 2,
            window_len: 5,
            max_duty_in_window: 4,
            rest_streak_len: 3,
            required_holidays: 11,
            fallback_holiday_target: 139,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_is_default() {
        let config = RosterConfig::from_toml_str("").unwrap();
        assert_eq!(config, RosterConfig::default());
        assert_eq!(config.termination.time_limit(), Duration::from_secs(15));
        assert_eq!(config.weights.weekend_square, 200);
    }

    #[test]
    fn test_partial_sections() {
        let config = RosterConfig::from_toml_str(
            r#"
            [termination]
            millis_spent_limit = 750
            unimproved_millis_spent_limit = 100

            [search]
            random_seed = 7
            cooling_alpha = 0.9

            [weights]
            rest_streak = 10
            "#,
        )
        .unwrap();

        assert_eq!(config.termination.time_limit(), Duration::from_millis(750));
        assert_eq!(config.termination.unimproved_limit(), Some(Duration::from_millis(100)));
        assert_eq!(config.search.random_seed, Some(7));
        assert_eq!(config.search.cooling_alpha, 0.9);
        assert_eq!(config.search.iterations_per_temperature, 200);
        assert_eq!(config.weights.rest_streak, 10);
        assert_eq!(config.weights.holiday_excess, 100);
    }

    #[test]
    fn test_rejects_window_without_slack() {
        let err = RosterConfig::from_toml_str(
            r#"
            [rules]
            window_len = 4
            max_duty_in_window = 4
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_rejects_bad_schedule() {
        for doc in [
            "[search]\nmin_temperature = 0.0\n",
            "[search]\ninitial_temperature = 5.0\nmin_temperature = 5.0\n",
            "[search]\ncooling_alpha = 1.0\n",
            "[search]\niterations_per_temperature = 0\n",
        ] {
            let err = RosterConfig::from_toml_str(doc).unwrap_err();
            assert!(matches!(err, ConfigError::Invalid(_)), "{doc}");
        }
    }

    #[test]
    fn test_rejects_negative_weight() {
        let err = RosterConfig::from_toml_str("[weights]\nweekend_square = -1\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_rejects_bad_toml() {
        let err = RosterConfig::from_toml_str("termination = 3").unwrap_err();
        assert!(matches!(err, ConfigError::Toml(_)));
    }

    #[test]
    fn test_builders() {
        let config = RosterConfig::new()
            .with_time_limit(Duration::from_millis(1500))
            .with_unimproved_limit(Duration::from_millis(200))
            .with_seed(42)
            .with_required_holidays(6);
        assert_eq!(config.termination.time_limit(), Duration::from_millis(1500));
        assert_eq!(config.termination.unimproved_limit(), Some(Duration::from_millis(200)));
        assert_eq!(config.search.random_seed, Some(42));
        assert_eq!(config.rules.required_holidays, 6);
        assert!(config.validate().is_ok());
    }
}
