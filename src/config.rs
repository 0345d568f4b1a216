//! Search configuration.

use crate::error::{MctsError, Result};
use std::time::Duration;

/// Default UCT exploration constant, √2.
pub const DEFAULT_EXPLORATION_CONSTANT: f64 = std::f64::consts::SQRT_2;

/// Parameters controlling one search call.
///
/// At least one of `iteration_budget` and `time_budget` must be set. When both are set the
/// search stops at whichever runs out first.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchConfig {
    /// Weight of the exploration term in the UCT score.
    pub exploration_constant: f64,
    /// Maximum number of completed iterations (rollouts).
    pub iteration_budget: Option<u32>,
    /// Wall-clock limit measured from the start of the search.
    pub time_budget: Option<Duration>,
    /// Seed for the random source. Searches with the same seed, position and iteration budget
    /// are reproducible.
    pub random_seed: Option<u64>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            exploration_constant: DEFAULT_EXPLORATION_CONSTANT,
            iteration_budget: None,
            time_budget: None,
            random_seed: None,
        }
    }
}

impl SearchConfig {
    /// Creates a config limited to `iterations` rollouts.
    pub fn with_iterations(iterations: u32) -> Self {
        Self {
            iteration_budget: Some(iterations),
            ..Default::default()
        }
    }

    /// Creates a config limited by wall-clock time.
    pub fn with_time_budget(budget: Duration) -> Self {
        Self {
            time_budget: Some(budget),
            ..Default::default()
        }
    }

    pub fn with_time_budget_millis(millis: u64) -> Self {
        Self::with_time_budget(Duration::from_millis(millis))
    }

    pub fn iterations(mut self, iterations: u32) -> Self {
        self.iteration_budget = Some(iterations);
        self
    }

    pub fn time_budget(mut self, budget: Duration) -> Self {
        self.time_budget = Some(budget);
        self
    }

    pub fn exploration_constant(mut self, exploration_constant: f64) -> Self {
        self.exploration_constant = exploration_constant;
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.random_seed = Some(seed);
        self
    }

    /// Checks that a budget is configured and the exploration constant is usable.
    pub fn validate(&self) -> Result<()> {
        if self.iteration_budget.is_none() && self.time_budget.is_none() {
            return Err(MctsError::NoBudgetConfigured);
        }

        if !self.exploration_constant.is_finite() || self.exploration_constant < 0.0 {
            return Err(MctsError::InvalidExplorationConstant(
                self.exploration_constant,
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_has_no_budget() {
        let config = SearchConfig::default();
        assert!((config.exploration_constant - std::f64::consts::SQRT_2).abs() < 1e-12);
        assert_eq!(config.validate(), Err(MctsError::NoBudgetConfigured));
    }

    #[test]
    fn either_budget_is_enough() {
        assert_eq!(SearchConfig::with_iterations(10).validate(), Ok(()));
        assert_eq!(SearchConfig::with_time_budget_millis(5).validate(), Ok(()));
    }

    #[test]
    fn chained_setters() {
        let config = SearchConfig::with_iterations(500)
            .time_budget(Duration::from_millis(20))
            .exploration_constant(0.5)
            .seed(7);
        assert_eq!(config.iteration_budget, Some(500));
        assert_eq!(config.time_budget, Some(Duration::from_millis(20)));
        assert_eq!(config.random_seed, Some(7));
        assert!((config.exploration_constant - 0.5).abs() < 1e-12);
    }

    #[test]
    fn rejects_bad_exploration_constant() {
        let negative = SearchConfig::with_iterations(1).exploration_constant(-1.0);
        assert_eq!(
            negative.validate(),
            Err(MctsError::InvalidExplorationConstant(-1.0))
        );
        let nan = SearchConfig::with_iterations(1).exploration_constant(f64::NAN);
        assert!(nan.validate().is_err());
    }
}
