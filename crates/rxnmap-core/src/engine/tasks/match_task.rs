use crate::core::chem::matcher::{MatchOptions, SubstructureMatcher};
use crate::core::chem::rings::RingFinder;
use crate::core::models::ids::MoleculeId;
use crate::core::models::molecule::Molecule;
use crate::engine::context::ReactionContainer;
use crate::engine::error::EngineError;
use crate::engine::jobs::Job;
use crate::engine::state::MatchResult;
use crate::engine::strategy::MappingStrategy;
use tracing::{instrument, trace};

/// One matcher call for a representative job, with its options fixed.
#[derive(Debug, Clone)]
pub struct MatchTask<'a> {
    job: Job,
    reactant_id: MoleculeId,
    product_id: MoleculeId,
    reactant: &'a Molecule,
    product: &'a Molecule,
    options: MatchOptions,
}

impl<'a> MatchTask<'a> {
    /// Resolves the job's molecules and derives the ring-aware matcher options.
    ///
    /// Ring matching is only requested when both molecules contain a cycle;
    /// the perfect-ring hint is set when both contain the same number of cycles.
    pub fn prepare(
        job: Job,
        container: &'a ReactionContainer,
        strategy: MappingStrategy,
        ring_finder: &dyn RingFinder,
        step_budget: u64,
    ) -> Result<Self, EngineError> {
        let missing = || EngineError::Internal(format!("job {job} refers to a missing molecule"));
        let reactant = container.educt(job.reactant).ok_or_else(missing)?;
        let product = container.product(job.product).ok_or_else(missing)?;
        let reactant_id = container.educt_id(job.reactant).ok_or_else(missing)?;
        let product_id = container.product_id(job.product).ok_or_else(missing)?;

        let educt_cycles = ring_finder.cycle_count(reactant);
        let product_cycles = ring_finder.cycle_count(product);
        let ring_flag = educt_cycles > 0 && product_cycles > 0;
        let ring_size_equal = educt_cycles == product_cycles;

        Ok(Self {
            job,
            reactant_id,
            product_id,
            reactant,
            product,
            options: strategy
                .feature_flags()
                .match_options(ring_flag, ring_size_equal, step_budget),
        })
    }

    pub fn job(&self) -> Job {
        self.job
    }

    pub fn options(&self) -> &MatchOptions {
        &self.options
    }

    #[instrument(skip_all, name = "match_task", fields(job = %self.job))]
    pub fn run(&self, matcher: &dyn SubstructureMatcher) -> Result<MatchResult, EngineError> {
        let mapping = matcher
            .find_mcs(self.reactant, self.product, &self.options)
            .map_err(|e| self.failure(e.to_string()))?;
        trace!(mapped_atoms = mapping.len(), "Match task finished.");
        Ok(MatchResult {
            reactant_index: self.job.reactant,
            product_index: self.job.product,
            reactant: self.reactant_id,
            product: self.product_id,
            mapping,
        })
    }

    pub fn failure(&self, reason: String) -> EngineError {
        EngineError::MatchTask {
            reactant: self.job.reactant,
            product: self.job.product,
            reason,
        }
    }
}
