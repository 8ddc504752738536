use crate::core::chem::rings::{RingFinder, RingSet};
use crate::core::models::ids::MoleculeId;
use crate::core::models::mapping::ReactionMapping;
use crate::core::models::reaction::AtomRef;
use crate::engine::context::ReactionContainer;
use crate::engine::state::MatchResult;
use crate::engine::strategy::MappingStrategy;
use std::cmp::Ordering;
use std::collections::HashMap;
use tracing::{debug, instrument};

#[derive(Debug)]
struct Candidate<'r> {
    result: &'r MatchResult,
    pairs: usize,
    residual: usize,
    fraction: f64,
    ring_atoms: usize,
    similarity: f64,
}

/// Merges the reconciled pair solutions of one strategy into a reaction mapping.
///
/// Solutions are ranked by the strategy's preference and merged greedily:
/// an atom pair is kept unless one of its atoms was already taken by a
/// better-ranked solution.
#[instrument(skip_all, name = "consolidation_task", fields(strategy = %strategy, results = matches.len()))]
pub fn run(
    container: &ReactionContainer,
    matches: &[MatchResult],
    strategy: MappingStrategy,
    ring_finder: &dyn RingFinder,
) -> ReactionMapping {
    let mut rings: HashMap<MoleculeId, RingSet> = HashMap::new();
    let mut candidates: Vec<Candidate> = matches
        .iter()
        .map(|result| {
            let reactant_atoms = container
                .canonical_educt(result.reactant_index)
                .map_or(0, |m| m.atom_count());
            let product_atoms = container
                .canonical_product(result.product_index)
                .map_or(0, |m| m.atom_count());
            let pairs = result.mapping.len();
            let largest = reactant_atoms.max(product_atoms);

            let ring_atoms = match container.canonical_educt(result.reactant_index) {
                Some(molecule) => {
                    let ring_set = rings
                        .entry(result.reactant)
                        .or_insert_with(|| ring_finder.find_rings(molecule));
                    result
                        .mapping
                        .iter()
                        .filter(|(q, _)| ring_set.is_ring_atom(*q))
                        .count()
                }
                None => 0,
            };

            Candidate {
                result,
                pairs,
                residual: (reactant_atoms + product_atoms).saturating_sub(2 * pairs),
                fraction: if largest == 0 {
                    0.0
                } else {
                    pairs as f64 / largest as f64
                },
                ring_atoms,
                similarity: container
                    .similarity()
                    .value(result.reactant_index, result.product_index),
            }
        })
        .collect();

    candidates.sort_by(|a, b| rank(strategy, a, b));

    let mut mapping = ReactionMapping::new();
    let mut rejected = 0usize;
    for candidate in &candidates {
        let result = candidate.result;
        for (q, t) in result.mapping.iter() {
            if !mapping.insert(AtomRef::new(result.reactant, q), AtomRef::new(result.product, t)) {
                rejected += 1;
            }
        }
    }

    debug!(
        mapped_atoms = mapping.len(),
        rejected_pairs = rejected,
        "Consolidated strategy mapping."
    );
    mapping
}

fn rank(strategy: MappingStrategy, a: &Candidate, b: &Candidate) -> Ordering {
    let preferred = match strategy {
        MappingStrategy::Exhaustive => b.pairs.cmp(&a.pairs),
        MappingStrategy::Minimal => a.residual.cmp(&b.residual),
        MappingStrategy::Mixture => b.fraction.total_cmp(&a.fraction),
        MappingStrategy::RingBiased => b
            .ring_atoms
            .cmp(&a.ring_atoms)
            .then_with(|| b.pairs.cmp(&a.pairs)),
    };
    preferred
        .then_with(|| b.similarity.total_cmp(&a.similarity))
        .then_with(|| a.result.job().cmp(&b.result.job()))
}
