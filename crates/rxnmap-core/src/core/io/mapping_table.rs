use crate::core::models::mapping::ReactionMapping;
use crate::core::models::reaction::{AtomRef, Reaction, ReactionSide};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::io::Write;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MappingTableError {
    #[error("File I/O error for '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("Mapped atom is not part of the reaction")]
    UnknownAtom,
}

/// One mapped atom pair, as written to a mapping table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappingRow {
    pub map_number: u32,
    pub reactant_molecule: String,
    pub reactant_atom: String,
    pub reactant_symbol: String,
    pub product_molecule: String,
    pub product_atom: String,
    pub product_symbol: String,
}

/// Flattens a reaction mapping into rows ordered by reactant molecule and atom.
pub fn rows(reaction: &Reaction, mapping: &ReactionMapping) -> Result<Vec<MappingRow>, MappingTableError> {
    let mut rows = Vec::with_capacity(mapping.len());
    let mut seen = HashSet::new();
    for (mol_id, molecule) in reaction.side(ReactionSide::Reactant) {
        if !seen.insert(mol_id) {
            continue;
        }
        for (idx, atom) in molecule.atoms() {
            let reactant = AtomRef::new(mol_id, idx);
            let Some(product) = mapping.product_of(reactant) else {
                continue;
            };
            let product_molecule = reaction
                .molecule(product.molecule)
                .ok_or(MappingTableError::UnknownAtom)?;
            let product_atom = reaction.atom(product).ok_or(MappingTableError::UnknownAtom)?;
            rows.push(MappingRow {
                map_number: rows.len() as u32 + 1,
                reactant_molecule: molecule.name().to_string(),
                reactant_atom: atom.id.clone(),
                reactant_symbol: atom.symbol.clone(),
                product_molecule: product_molecule.name().to_string(),
                product_atom: product_atom.id.clone(),
                product_symbol: product_atom.symbol.clone(),
            });
        }
    }
    Ok(rows)
}

pub fn write_to(
    reaction: &Reaction,
    mapping: &ReactionMapping,
    writer: impl Write,
) -> Result<(), MappingTableError> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    for row in rows(reaction, mapping)? {
        csv_writer.serialize(row)?;
    }
    csv_writer.flush().map_err(|source| MappingTableError::Io {
        path: String::new(),
        source,
    })
}

pub fn write_to_path(
    reaction: &Reaction,
    mapping: &ReactionMapping,
    path: &Path,
) -> Result<(), MappingTableError> {
    let file = std::fs::File::create(path).map_err(|source| MappingTableError::Io {
        path: path.to_string_lossy().to_string(),
        source,
    })?;
    write_to(reaction, mapping, std::io::BufWriter::new(file))
}
