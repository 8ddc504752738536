use super::config::MappingConfig;
use super::context::{ModifiedFlags, ReactionContainer};
use super::dispatcher::MatchDispatcher;
use super::error::EngineError;
use super::jobs;
use super::progress::{Progress, ProgressReporter};
use super::reconcile;
use super::state::{StrategyResult, StrategyResults};
use super::strategy::MappingStrategy;
use super::tasks::consolidate;
use super::utils::pool;
use crate::core::chem::matcher::{BacktrackingMcs, SubstructureMatcher};
use crate::core::chem::rings::{RelevantCycles, RingFinder};
use crate::core::chem::standardize::{BasicStandardizer, Standardizer};
use crate::core::models::mapping::ReactionMapping;
use crate::core::models::reaction::Reaction;
use std::sync::Arc;
use tracing::{debug, error, info, instrument};

/// Runs the configured mapping strategies concurrently for one reaction.
///
/// Each strategy standardizes its own copy of the reaction, builds and
/// dispatches its jobs, reconciles the results and consolidates them into a
/// reaction mapping. Strategies run on a pool with one thread per strategy;
/// every strategy fans its jobs out on a pool of its own.
pub struct StrategyOrchestrator<'a> {
    config: &'a MappingConfig,
    reporter: &'a ProgressReporter<'a>,
    standardizer: &'a dyn Standardizer,
    matcher: &'a dyn SubstructureMatcher,
    ring_finder: &'a dyn RingFinder,
    modified: Option<ModifiedFlags>,
}

impl<'a> StrategyOrchestrator<'a> {
    /// Orchestrator using the built-in chemistry collaborators.
    pub fn new(config: &'a MappingConfig, reporter: &'a ProgressReporter<'a>) -> Self {
        Self {
            config,
            reporter,
            standardizer: &BasicStandardizer,
            matcher: &BacktrackingMcs,
            ring_finder: &RelevantCycles,
            modified: None,
        }
    }

    pub fn with_standardizer(mut self, standardizer: &'a dyn Standardizer) -> Self {
        self.standardizer = standardizer;
        self
    }

    pub fn with_matcher(mut self, matcher: &'a dyn SubstructureMatcher) -> Self {
        self.matcher = matcher;
        self
    }

    pub fn with_ring_finder(mut self, ring_finder: &'a dyn RingFinder) -> Self {
        self.ring_finder = ring_finder;
        self
    }

    /// Overrides the per-molecule "modified" flags used to select jobs.
    pub fn with_modified_flags(mut self, flags: ModifiedFlags) -> Self {
        self.modified = Some(flags);
        self
    }

    /// Runs every configured strategy and collects the results that succeed.
    ///
    /// A failing strategy is logged and missing from the returned map; it
    /// never affects the others.
    ///
    /// # Errors
    ///
    /// Fails only if the strategy pool cannot be created or its completion
    /// queue is interrupted.
    #[instrument(skip_all, name = "strategy_orchestrator", fields(strategies = self.config.strategies.len()))]
    pub fn run(&self, reaction: &Reaction) -> Result<StrategyResults, EngineError> {
        let strategies: Vec<MappingStrategy> = self.config.strategies.iter().copied().collect();
        let mut results = StrategyResults::default();
        if strategies.is_empty() {
            return Ok(results);
        }

        let strategy_pool = pool::build_pool(strategies.len(), "strategy")?;
        self.reporter.report(Progress::TaskStart {
            total_steps: strategies.len() as u64,
        });

        pool::run_to_completion(
            &strategy_pool,
            &strategies,
            "strategy",
            |&strategy| self.run_strategy(strategy, reaction),
            |index, outcome| {
                let strategy = strategies[index];
                match outcome {
                    Ok(Ok(result)) => {
                        info!(
                            strategy = %result.strategy(),
                            mapped_atoms = result.mapped_atom_count(),
                            "Strategy finished."
                        );
                        results.insert(result);
                    }
                    Ok(Err(e)) => {
                        error!(strategy = %strategy, error = %e, "Strategy failed; its result is omitted.");
                    }
                    Err(payload) => {
                        error!(
                            strategy = %strategy,
                            panic = %pool::panic_message(payload.as_ref()),
                            "Strategy panicked; its result is omitted."
                        );
                    }
                }
                self.reporter.report(Progress::TaskIncrement);
            },
        )?;
        drop(strategy_pool);

        self.reporter.report(Progress::TaskFinish);
        Ok(results)
    }

    /// Runs a single strategy on the calling thread (its jobs still use a pool).
    #[instrument(skip_all, name = "strategy_task", fields(strategy = %strategy))]
    pub fn run_strategy(
        &self,
        strategy: MappingStrategy,
        reaction: &Reaction,
    ) -> Result<StrategyResult, EngineError> {
        let standardized = self.standardizer.standardize(reaction)?;
        let mut container = ReactionContainer::new(standardized, self.config.remove_hydrogens);
        if let Some(flags) = &self.modified {
            flags.apply(&mut container);
        }

        let groups = jobs::build(&container);
        if groups.is_empty() {
            debug!("No molecule pair needs matching.");
            return Ok(StrategyResult::new(
                strategy,
                container.into_reaction(),
                Arc::from(Vec::new()),
                ReactionMapping::new(),
            ));
        }

        let silent = ProgressReporter::new();
        let raw = MatchDispatcher::new(self.matcher, self.ring_finder, &silent)
            .with_threads(self.config.job_threads)
            .with_step_budget(self.config.search_budget)
            .dispatch(&container, &groups, strategy)?;
        let matches = reconcile::reconcile(&container, groups, raw);
        let mapping = consolidate::run(&container, &matches, strategy, self.ring_finder);

        Ok(StrategyResult::new(
            strategy,
            container.into_reaction(),
            matches,
            mapping,
        ))
    }
}
