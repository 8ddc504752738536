use crate::core::chem::valence::ElectronCounting;
use crate::core::mechanism::blocks::BlockPairing;
use crate::core::mechanism::reaction_matrix::ReactionMechanism;
use crate::core::models::mapping::AtomAtomMapping;
use crate::core::models::reaction::{AtomRef, Reaction};
use crate::engine::config::MappingConfig;
use crate::engine::error::EngineError;
use crate::engine::orchestrator::StrategyOrchestrator;
use crate::engine::progress::{Progress, ProgressReporter};
use crate::engine::state::{StrategyResult, StrategyResults};
use crate::engine::strategy::MappingStrategy;
use nalgebra::Point2;
use std::cmp::Reverse;
use std::collections::HashSet;
use tracing::{debug, info, instrument};

/// A connected group of mapped atoms in the selected mapping and the block it
/// pairs with on the product side.
#[derive(Debug, Clone, PartialEq)]
pub struct FragmentSummary {
    pub reactant_index: usize,
    pub product_index: usize,
    pub atom_count: usize,
    pub reactant_signature: String,
    pub product_signature: String,
    /// Both blocks carry the same signature, so the fragment survives intact.
    pub conserved: bool,
    pub reactant_center: Option<Point2<f64>>,
}

#[derive(Debug, Clone)]
pub struct MappingOutcome {
    pub results: StrategyResults,
    pub best: StrategyResult,
    pub mechanism: ReactionMechanism,
    pub fragments: Vec<FragmentSummary>,
}

impl MappingOutcome {
    pub fn best_strategy(&self) -> MappingStrategy {
        self.best.strategy()
    }

    /// Mapped reaction of the selected strategy.
    pub fn reaction(&self) -> &Reaction {
        self.best.reaction()
    }
}

#[instrument(skip_all, name = "mapping_workflow")]
pub fn run(
    reaction: &Reaction,
    config: &MappingConfig,
    reporter: &ProgressReporter,
) -> Result<MappingOutcome, EngineError> {
    // === Phase 1: Run every configured strategy ===
    reporter.report(Progress::PhaseStart {
        name: "Mapping strategies",
    });
    info!(
        strategies = config.strategies.len(),
        reactants = reaction.reactant_count(),
        products = reaction.product_count(),
        "Starting atom-atom mapping."
    );
    let results = StrategyOrchestrator::new(config, reporter).run(reaction)?;
    reporter.report(Progress::PhaseFinish);

    if results.is_empty() {
        return Err(EngineError::NoMapping);
    }

    // === Phase 2: Score the mappings by their bond changes ===
    reporter.report(Progress::PhaseStart {
        name: "Selecting mapping",
    });
    let valence = ElectronCounting;
    let mut scored = Vec::with_capacity(results.len());
    for result in results.iter() {
        let mechanism = ReactionMechanism::build(
            result.reaction(),
            result.mapping(),
            config.matrix_skip_hydrogens,
            &valence,
        )?;
        debug!(
            strategy = %result.strategy(),
            bond_changes = mechanism.total_changes(),
            mapped_atoms = result.mapped_atom_count(),
            "Scored strategy mapping."
        );
        scored.push((
            mechanism.total_changes(),
            Reverse(result.mapped_atom_count()),
            result.strategy(),
            mechanism,
        ));
    }
    scored.sort_by(|a, b| (a.0, a.1, a.2).cmp(&(b.0, b.1, b.2)));

    let (changes, _, strategy, mechanism) =
        scored.into_iter().next().ok_or(EngineError::NoMapping)?;
    let best = results
        .get(strategy)
        .cloned()
        .ok_or(EngineError::NoMapping)?;
    let fragments = summarize_fragments(&best);
    reporter.report(Progress::PhaseFinish);

    info!(
        strategy = %strategy,
        bond_changes = changes,
        mapped_atoms = best.mapped_atom_count(),
        fragments = fragments.len(),
        "Selected mapping."
    );

    Ok(MappingOutcome {
        results,
        best,
        mechanism,
        fragments,
    })
}

/// Pairs up the connected mapped fragments of every reconciled match,
/// keeping only the atom pairs that made it into the consolidated mapping.
fn summarize_fragments(result: &StrategyResult) -> Vec<FragmentSummary> {
    let reaction = result.reaction();
    let mut seen = HashSet::new();
    let mut fragments = Vec::new();

    for m in result.matches() {
        if !seen.insert((m.reactant, m.product)) {
            continue;
        }
        let (Some(reactant), Some(product)) =
            (reaction.molecule(m.reactant), reaction.molecule(m.product))
        else {
            continue;
        };

        let kept: AtomAtomMapping = m
            .mapping
            .iter()
            .filter(|&(q, t)| {
                result.mapping().product_of(AtomRef::new(m.reactant, q))
                    == Some(AtomRef::new(m.product, t))
            })
            .collect();
        if kept.is_empty() {
            continue;
        }

        let pairing =
            BlockPairing::from_mapping((m.reactant, reactant), (m.product, product), &kept);
        for (i, block) in pairing.reactant_blocks().iter().enumerate() {
            let Some(partner) = pairing.partner_of(i) else {
                continue;
            };
            fragments.push(FragmentSummary {
                reactant_index: m.reactant_index,
                product_index: m.product_index,
                atom_count: block.atom_count(),
                reactant_signature: block.signature_str().to_string(),
                product_signature: partner.signature_str().to_string(),
                conserved: block.is_same_kind(partner),
                reactant_center: block.center_point(),
            });
        }
    }
    fragments
}
