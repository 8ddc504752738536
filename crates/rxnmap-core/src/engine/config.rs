use super::strategy::MappingStrategy;
use crate::core::chem::matcher::MatchOptions;
use std::collections::BTreeSet;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum ConfigError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),
    #[error("Invalid value for parameter '{name}': {reason}")]
    InvalidParameter { name: &'static str, reason: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct MappingConfig {
    /// Strip explicit hydrogens from the molecules handed to the matcher.
    pub remove_hydrogens: bool,
    /// Strategies to run; never empty.
    pub strategies: BTreeSet<MappingStrategy>,
    /// Upper bound for the per-strategy job pool. `None` uses all but one core.
    pub job_threads: Option<usize>,
    /// Step budget of a single exhaustive matcher call.
    pub search_budget: u64,
    /// Leave hydrogens out of the bond-electron matrices.
    pub matrix_skip_hydrogens: bool,
}

#[derive(Default)]
pub struct MappingConfigBuilder {
    remove_hydrogens: Option<bool>,
    strategies: Option<BTreeSet<MappingStrategy>>,
    job_threads: Option<usize>,
    search_budget: Option<u64>,
    matrix_skip_hydrogens: Option<bool>,
}

impl MappingConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder pre-filled with the settings used when nothing is configured.
    pub fn with_defaults() -> Self {
        Self::new()
            .remove_hydrogens(true)
            .strategies(MappingStrategy::ALL)
            .search_budget(MatchOptions::DEFAULT_STEP_BUDGET)
            .matrix_skip_hydrogens(true)
    }

    pub fn remove_hydrogens(mut self, remove: bool) -> Self {
        self.remove_hydrogens = Some(remove);
        self
    }
    pub fn strategies(mut self, strategies: impl IntoIterator<Item = MappingStrategy>) -> Self {
        self.strategies = Some(strategies.into_iter().collect());
        self
    }
    pub fn job_threads(mut self, threads: usize) -> Self {
        self.job_threads = Some(threads);
        self
    }
    pub fn search_budget(mut self, budget: u64) -> Self {
        self.search_budget = Some(budget);
        self
    }
    pub fn matrix_skip_hydrogens(mut self, skip: bool) -> Self {
        self.matrix_skip_hydrogens = Some(skip);
        self
    }

    pub fn build(self) -> Result<MappingConfig, ConfigError> {
        let strategies = self
            .strategies
            .ok_or(ConfigError::MissingParameter("strategies"))?;
        if strategies.is_empty() {
            return Err(ConfigError::InvalidParameter {
                name: "strategies",
                reason: "at least one strategy is required".to_string(),
            });
        }
        if self.job_threads == Some(0) {
            return Err(ConfigError::InvalidParameter {
                name: "job_threads",
                reason: "must be at least 1".to_string(),
            });
        }
        let search_budget = self
            .search_budget
            .ok_or(ConfigError::MissingParameter("search_budget"))?;
        if search_budget == 0 {
            return Err(ConfigError::InvalidParameter {
                name: "search_budget",
                reason: "must be positive".to_string(),
            });
        }

        Ok(MappingConfig {
            remove_hydrogens: self
                .remove_hydrogens
                .ok_or(ConfigError::MissingParameter("remove_hydrogens"))?,
            strategies,
            job_threads: self.job_threads,
            search_budget,
            matrix_skip_hydrogens: self
                .matrix_skip_hydrogens
                .ok_or(ConfigError::MissingParameter("matrix_skip_hydrogens"))?,
        })
    }
}
