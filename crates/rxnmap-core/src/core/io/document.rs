use crate::core::io::traits::ReactionFile;
use crate::core::models::atom::Atom;
use crate::core::models::molecule::{ModelError, Molecule};
use crate::core::models::reaction::{Reaction, ReactionSide};
use crate::core::models::topology::{Bond, BondOrder, BondStereo};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::io::{self, BufRead, Write};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("TOML parsing error: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("TOML serialization error: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("Molecule '{molecule}': {reason}")]
    Invalid { molecule: String, reason: String },
    #[error("Molecule '{molecule}': {source}")]
    Model {
        molecule: String,
        source: ModelError,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct AtomEntry {
    pub id: String,
    pub symbol: String,
    #[serde(default)]
    pub charge: i8,
    #[serde(default)]
    pub hydrogens: u8,
    #[serde(default)]
    pub aromatic: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct BondEntry {
    pub atoms: [String; 2],
    #[serde(default = "default_order")]
    pub order: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stereo: Option<String>,
}

fn default_order() -> String {
    "single".to_string()
}

fn default_count() -> usize {
    1
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct MoleculeEntry {
    pub name: String,
    /// Number of times the molecule takes part; all copies are one molecule.
    #[serde(default = "default_count")]
    pub count: usize,
    #[serde(default)]
    pub atoms: Vec<AtomEntry>,
    #[serde(default)]
    pub bonds: Vec<BondEntry>,
}

/// Serializable form of a reaction.
///
/// ```toml
/// id = "R1"
///
/// [[reactants]]
/// name = "ethanol"
/// atoms = [
///     { id = "c1", symbol = "C", hydrogens = 3 },
///     { id = "c2", symbol = "C", hydrogens = 2 },
///     { id = "o1", symbol = "O", hydrogens = 1 },
/// ]
/// bonds = [{ atoms = ["c1", "c2"] }, { atoms = ["c2", "o1"] }]
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct ReactionDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    #[serde(default)]
    pub reactants: Vec<MoleculeEntry>,
    #[serde(default)]
    pub products: Vec<MoleculeEntry>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocumentMetadata {
    pub title: Option<String>,
    pub comment: Option<String>,
}

impl ReactionDocument {
    pub fn to_reaction(&self) -> Result<Reaction, DocumentError> {
        let mut reaction = Reaction::new();
        if let Some(id) = &self.id {
            reaction.set_id(id);
        }
        for (side, entries) in [
            (ReactionSide::Reactant, &self.reactants),
            (ReactionSide::Product, &self.products),
        ] {
            for entry in entries {
                if entry.count == 0 {
                    return Err(DocumentError::Invalid {
                        molecule: entry.name.clone(),
                        reason: "count must be at least 1".to_string(),
                    });
                }
                let id = reaction.add_molecule(entry.to_molecule()?);
                for _ in 0..entry.count {
                    reaction
                        .add_ref(side, id)
                        .map_err(|source| DocumentError::Model {
                            molecule: entry.name.clone(),
                            source,
                        })?;
                }
            }
        }
        Ok(reaction)
    }

    /// Builds a document from a reaction.
    ///
    /// Consecutive slots holding the same molecule collapse into one entry
    /// with a count.
    pub fn from_reaction(reaction: &Reaction, metadata: &DocumentMetadata) -> Self {
        let entries = |side: ReactionSide| {
            let mut entries: Vec<MoleculeEntry> = Vec::new();
            let mut previous = None;
            for (id, molecule) in reaction.side(side) {
                if previous == Some(id) {
                    if let Some(last) = entries.last_mut() {
                        last.count += 1;
                    }
                } else {
                    entries.push(MoleculeEntry::from_molecule(molecule));
                }
                previous = Some(id);
            }
            entries
        };
        Self {
            id: reaction.id().map(str::to_string),
            title: metadata.title.clone(),
            comment: metadata.comment.clone(),
            reactants: entries(ReactionSide::Reactant),
            products: entries(ReactionSide::Product),
        }
    }
}

impl MoleculeEntry {
    fn to_molecule(&self) -> Result<Molecule, DocumentError> {
        let invalid = |reason: String| DocumentError::Invalid {
            molecule: self.name.clone(),
            reason,
        };

        let mut molecule = Molecule::new(&self.name);
        let mut index = HashMap::new();
        for entry in &self.atoms {
            let mut atom = Atom::new(&entry.id, &entry.symbol)
                .with_charge(entry.charge)
                .with_hydrogens(entry.hydrogens);
            atom.is_aromatic = entry.aromatic;
            match (entry.x, entry.y) {
                (Some(x), Some(y)) => atom = atom.with_position(x, y),
                (None, None) => {}
                _ => return Err(invalid(format!("atom '{}' has only one coordinate", entry.id))),
            }
            let idx = molecule.add_atom(atom);
            if index.insert(entry.id.clone(), idx).is_some() {
                return Err(invalid(format!("duplicate atom id '{}'", entry.id)));
            }
        }

        for entry in &self.bonds {
            let [a, b] = &entry.atoms;
            let (Some(&ia), Some(&ib)) = (index.get(a), index.get(b)) else {
                return Err(invalid(format!("bond {a}-{b} references an unknown atom")));
            };
            let order: BondOrder = entry
                .order
                .parse()
                .map_err(|_| invalid(format!("bond {a}-{b} has invalid order '{}'", entry.order)))?;
            let stereo: BondStereo = match &entry.stereo {
                Some(s) => s
                    .parse()
                    .map_err(|_| invalid(format!("bond {a}-{b} has invalid stereo '{s}'")))?,
                None => BondStereo::None,
            };
            molecule
                .add_bond(ia, ib, Bond::new(order).with_stereo(stereo))
                .map_err(|source| DocumentError::Model {
                    molecule: self.name.clone(),
                    source,
                })?;
        }
        Ok(molecule)
    }

    fn from_molecule(molecule: &Molecule) -> Self {
        let atoms = molecule
            .atoms()
            .map(|(_, atom)| AtomEntry {
                id: atom.id.clone(),
                symbol: atom.symbol.clone(),
                charge: atom.formal_charge,
                hydrogens: atom.hydrogen_count,
                aromatic: atom.is_aromatic,
                x: atom.position.map(|p| p.x),
                y: atom.position.map(|p| p.y),
            })
            .collect();
        let bonds = molecule
            .bonds()
            .filter_map(|(a, b, bond)| {
                let a = molecule.atom(a)?;
                let b = molecule.atom(b)?;
                Some(BondEntry {
                    atoms: [a.id.clone(), b.id.clone()],
                    order: bond.order.to_string().to_lowercase(),
                    stereo: (bond.stereo != BondStereo::None).then(|| bond.stereo.to_string()),
                })
            })
            .collect();
        Self {
            name: molecule.name().to_string(),
            count: 1,
            atoms,
            bonds,
        }
    }
}

/// TOML reaction documents.
pub struct TomlReactionFile;

impl ReactionFile for TomlReactionFile {
    type Metadata = DocumentMetadata;
    type Error = DocumentError;

    fn read_from(reader: &mut impl BufRead) -> Result<(Reaction, Self::Metadata), Self::Error> {
        let mut content = String::new();
        reader.read_to_string(&mut content)?;
        let document: ReactionDocument = toml::from_str(&content)?;
        let metadata = DocumentMetadata {
            title: document.title.clone(),
            comment: document.comment.clone(),
        };
        Ok((document.to_reaction()?, metadata))
    }

    fn write_to(
        reaction: &Reaction,
        metadata: &Self::Metadata,
        writer: &mut impl Write,
    ) -> Result<(), Self::Error> {
        let document = ReactionDocument::from_reaction(reaction, metadata);
        writer.write_all(toml::to_string_pretty(&document)?.as_bytes())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use tempfile::tempdir;

    const ESTERIFICATION: &str = r#"
id = "R1"
title = "Esterification"

[[reactants]]
name = "acetic acid"
atoms = [
    { id = "c1", symbol = "C", hydrogens = 3 },
    { id = "c2", symbol = "C" },
    { id = "o1", symbol = "O" },
    { id = "o2", symbol = "O", hydrogens = 1 },
]
bonds = [
    { atoms = ["c1", "c2"] },
    { atoms = ["c2", "o1"], order = "double" },
    { atoms = ["c2", "o2"] },
]

[[reactants]]
name = "methanol"
atoms = [{ id = "c3", symbol = "C", hydrogens = 3 }, { id = "o3", symbol = "O", hydrogens = 1 }]
bonds = [{ atoms = ["c3", "o3"] }]

[[products]]
name = "water"
count = 1
atoms = [{ id = "o4", symbol = "O", hydrogens = 2, x = 1.5, y = -0.5 }]
"#;

    fn read(text: &str) -> Result<(Reaction, DocumentMetadata), DocumentError> {
        TomlReactionFile::read_from(&mut Cursor::new(text))
    }

    #[test]
    fn reads_molecules_atoms_and_bonds() {
        let (reaction, metadata) = read(ESTERIFICATION).unwrap();
        assert_eq!(reaction.id(), Some("R1"));
        assert_eq!(metadata.title.as_deref(), Some("Esterification"));
        assert_eq!(reaction.reactant_count(), 2);
        assert_eq!(reaction.product_count(), 1);

        let acid = reaction.reactant(0).unwrap();
        assert_eq!(acid.atom_count(), 4);
        let c2 = acid.find_atom("c2").unwrap();
        let o1 = acid.find_atom("o1").unwrap();
        assert_eq!(acid.bond_between(c2, o1).unwrap().order, BondOrder::Double);

        let water = reaction.product(0).unwrap();
        let o4 = water.find_atom("o4").unwrap();
        assert_eq!(water.atom(o4).unwrap().hydrogen_count, 2);
        assert_eq!(water.atom(o4).unwrap().position.unwrap().x, 1.5);
    }

    #[test]
    fn count_lists_one_molecule_several_times() {
        let text = r#"
[[reactants]]
name = "hydrogen"
count = 2
atoms = [{ id = "h1", symbol = "H" }]

[[products]]
name = "product"
atoms = [{ id = "h2", symbol = "H" }]
"#;
        let (reaction, _) = read(text).unwrap();
        assert_eq!(reaction.reactant_count(), 2);
        assert_eq!(reaction.reactant_ids()[0], reaction.reactant_ids()[1]);
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let text = "[[reactants]]\nname = \"x\"\ncolour = \"blue\"\n";
        assert!(matches!(read(text), Err(DocumentError::Parse(_))));
    }

    #[test]
    fn bonds_to_unknown_atoms_are_rejected() {
        let text = r#"
[[reactants]]
name = "broken"
atoms = [{ id = "a", symbol = "C" }]
bonds = [{ atoms = ["a", "b"] }]
"#;
        assert!(matches!(read(text), Err(DocumentError::Invalid { .. })));
    }

    #[test]
    fn invalid_bond_orders_are_rejected() {
        let text = r#"
[[reactants]]
name = "broken"
atoms = [{ id = "a", symbol = "C" }, { id = "b", symbol = "C" }]
bonds = [{ atoms = ["a", "b"], order = "sextuple" }]
"#;
        assert!(matches!(read(text), Err(DocumentError::Invalid { .. })));
    }

    #[test]
    fn written_documents_read_back_to_the_same_structure() {
        let (reaction, metadata) = read(ESTERIFICATION).unwrap();
        let dir = tempdir().unwrap();
        let path = dir.path().join("reaction.toml");
        TomlReactionFile::write_to_path(&reaction, &metadata, &path).unwrap();

        let (again, again_metadata) = TomlReactionFile::read_from_path(&path).unwrap();
        assert_eq!(again_metadata, metadata);
        assert_eq!(
            ReactionDocument::from_reaction(&again, &again_metadata),
            ReactionDocument::from_reaction(&reaction, &metadata)
        );
    }
}
