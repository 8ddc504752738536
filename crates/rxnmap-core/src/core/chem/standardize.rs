use crate::core::models::reaction::{Reaction, ReactionSide};
use std::collections::HashSet;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StandardizeError {
    #[error("Reaction has no {0} molecules")]
    EmptySide(ReactionSide),
    #[error("Atom {index} of molecule '{molecule}' has no element symbol")]
    BlankSymbol { molecule: String, index: usize },
}

/// Preprocessing applied to a reaction before it is mapped.
pub trait Standardizer: Send + Sync {
    /// Returns a cleaned copy of `reaction`; the input is left untouched.
    ///
    /// Implementations must keep molecule ids and atom order, so that atoms of
    /// the copy can be addressed with the node indices of the input.
    fn standardize(&self, reaction: &Reaction) -> Result<Reaction, StandardizeError>;
}

/// Validates a reaction and gives every atom a reaction-wide unique id.
///
/// Atoms with a blank or already used id are renamed `a1`, `a2`, ... (skipping
/// names that are taken), visiting molecules in reactant then product order.
#[derive(Debug, Clone, Copy, Default)]
pub struct BasicStandardizer;

impl Standardizer for BasicStandardizer {
    fn standardize(&self, reaction: &Reaction) -> Result<Reaction, StandardizeError> {
        for side in [ReactionSide::Reactant, ReactionSide::Product] {
            if reaction.side_count(side) == 0 {
                return Err(StandardizeError::EmptySide(side));
            }
        }
        for (_, molecule) in reaction.molecules() {
            if let Some((idx, _)) = molecule
                .atoms()
                .find(|(_, atom)| atom.symbol.trim().is_empty())
            {
                return Err(StandardizeError::BlankSymbol {
                    molecule: molecule.name().to_string(),
                    index: idx.index(),
                });
            }
        }

        let mut cleaned = reaction.clone();
        let visit_order: Vec<_> = {
            let mut seen = HashSet::new();
            cleaned
                .reactant_ids()
                .iter()
                .chain(cleaned.product_ids())
                .copied()
                .filter(|id| seen.insert(*id))
                .collect()
        };

        let taken: HashSet<String> = cleaned
            .molecules()
            .flat_map(|(_, mol)| mol.atoms().map(|(_, atom)| atom.id.clone()))
            .filter(|id| !id.trim().is_empty())
            .collect();
        let mut used: HashSet<String> = HashSet::new();
        let mut counter = 0usize;
        let mut renamed = 0usize;

        for mol_id in visit_order {
            let Some(molecule) = cleaned.molecule_mut(mol_id) else {
                continue;
            };
            let indices: Vec<_> = molecule.atom_indices().collect();
            for idx in indices {
                let Some(atom) = molecule.atom_mut(idx) else {
                    continue;
                };
                atom.symbol = atom.symbol.trim().to_string();
                let id = atom.id.trim().to_string();
                if !id.is_empty() && used.insert(id.clone()) {
                    atom.id = id;
                    continue;
                }
                let fresh = loop {
                    counter += 1;
                    let candidate = format!("a{counter}");
                    if !taken.contains(&candidate) && !used.contains(&candidate) {
                        break candidate;
                    }
                };
                used.insert(fresh.clone());
                atom.id = fresh;
                renamed += 1;
            }
        }

        if renamed > 0 {
            debug!(renamed, "Assigned fresh ids to atoms with blank or duplicate ids.");
        }
        Ok(cleaned)
    }
}
