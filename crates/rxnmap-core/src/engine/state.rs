use super::jobs::Job;
use super::strategy::MappingStrategy;
use crate::core::models::ids::MoleculeId;
use crate::core::models::mapping::{AtomAtomMapping, ReactionMapping};
use crate::core::models::reaction::Reaction;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Common-substructure solution of one job.
///
/// `mapping` pairs reactant atoms with product atoms of the two containers.
/// Straight out of the dispatcher, node indices refer to the matcher copies;
/// after reconciliation they refer to the canonical molecules.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchResult {
    pub reactant_index: usize,
    pub product_index: usize,
    pub reactant: MoleculeId,
    pub product: MoleculeId,
    pub mapping: AtomAtomMapping,
}

impl MatchResult {
    pub fn job(&self) -> Job {
        Job::new(self.reactant_index, self.product_index)
    }

    /// Same solution reported for another job over the same containers.
    pub fn for_job(&self, job: Job) -> Self {
        Self {
            reactant_index: job.reactant,
            product_index: job.product,
            ..self.clone()
        }
    }
}

/// Everything one strategy produced for a reaction.
#[derive(Debug, Clone)]
pub struct StrategyResult {
    strategy: MappingStrategy,
    reaction: Reaction,
    matches: Arc<[MatchResult]>,
    mapping: ReactionMapping,
}

impl StrategyResult {
    pub fn new(
        strategy: MappingStrategy,
        reaction: Reaction,
        matches: Arc<[MatchResult]>,
        mapping: ReactionMapping,
    ) -> Self {
        Self {
            strategy,
            reaction,
            matches,
            mapping,
        }
    }

    pub fn strategy(&self) -> MappingStrategy {
        self.strategy
    }

    /// The standardized reaction the mapping refers to.
    pub fn reaction(&self) -> &Reaction {
        &self.reaction
    }

    /// Reconciled solutions, one per matched job.
    pub fn matches(&self) -> &[MatchResult] {
        &self.matches
    }

    /// The consolidated reaction-level mapping.
    pub fn mapping(&self) -> &ReactionMapping {
        &self.mapping
    }

    pub fn mapped_atom_count(&self) -> usize {
        self.mapping.len()
    }
}

/// Read-only results of an orchestrator run, keyed by strategy.
#[derive(Debug, Clone, Default)]
pub struct StrategyResults {
    results: BTreeMap<MappingStrategy, StrategyResult>,
}

impl StrategyResults {
    pub(crate) fn insert(&mut self, result: StrategyResult) {
        self.results.insert(result.strategy(), result);
    }

    pub fn get(&self, strategy: MappingStrategy) -> Option<&StrategyResult> {
        self.results.get(&strategy)
    }

    pub fn contains(&self, strategy: MappingStrategy) -> bool {
        self.results.contains_key(&strategy)
    }

    pub fn strategies(&self) -> impl Iterator<Item = MappingStrategy> + '_ {
        self.results.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = &StrategyResult> + '_ {
        self.results.values()
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}
