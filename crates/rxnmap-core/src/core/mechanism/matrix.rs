use crate::core::chem::valence::ValenceModel;
use crate::core::models::ids::MoleculeId;
use crate::core::models::mapping::ReactionMapping;
use crate::core::models::molecule::Molecule;
use crate::core::models::reaction::{AtomRef, Reaction, ReactionSide};
use crate::core::models::topology::{Bond, BondStereo};
use nalgebra::DMatrix;
use std::collections::{HashMap, HashSet};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MatrixError {
    #[error("Target ordering has {actual} atoms but the matrix holds {expected}")]
    OrderingMismatch { expected: usize, actual: usize },
    #[error("Atom '{0}' is not part of the matrix")]
    UnknownAtom(String),
    #[error("Matrix position {index} is out of range (atom count {len})")]
    IndexOutOfRange { index: usize, len: usize },
}

/// An atom row of a [`BondElectronMatrix`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatrixAtom {
    pub atom_ref: AtomRef,
    pub id: String,
    pub symbol: String,
}

/// Bond-electron matrix over the atoms taking part in a mapping.
///
/// For `n` atoms the matrix is `(n + 1) x (n + 1)`: cell `(i, i)` holds the
/// free valence electrons of atom `i`, cell `(i, j)` the order of the bond
/// between atoms `i` and `j` (0 if unbonded). Row and column `n` hold the
/// lone-pair sentinel, the corner holds the corner sentinel.
#[derive(Debug, Clone, PartialEq)]
pub struct BondElectronMatrix {
    atoms: Vec<MatrixAtom>,
    values: DMatrix<f64>,
    bonds: HashMap<(AtomRef, AtomRef), Bond>,
    skip_hydrogens: bool,
}

impl BondElectronMatrix {
    pub const LONE_PAIR_SENTINEL: f64 = 100.0;
    pub const CORNER_SENTINEL: f64 = 200.0;

    /// Builds the matrix from a molecule set.
    ///
    /// Atoms are taken molecule by molecule in the given order (a molecule
    /// listed twice contributes once), keeping only atoms for which
    /// `participates` holds. Hydrogens are left out when `skip_hydrogens` is set.
    pub fn build<'m, I, F>(
        molecules: I,
        participates: F,
        skip_hydrogens: bool,
        valence: &dyn ValenceModel,
    ) -> Self
    where
        I: IntoIterator<Item = (MoleculeId, &'m Molecule)>,
        F: Fn(AtomRef) -> bool,
    {
        let mut seen = HashSet::new();
        let mut atoms = Vec::new();
        let mut electrons = Vec::new();
        let mut bonds = HashMap::new();

        for (mol_id, molecule) in molecules {
            if !seen.insert(mol_id) {
                continue;
            }
            let kept: HashSet<_> = molecule
                .atoms()
                .filter(|(_, atom)| !(skip_hydrogens && atom.is_hydrogen()))
                .map(|(idx, _)| idx)
                .filter(|&idx| participates(AtomRef::new(mol_id, idx)))
                .collect();

            for (idx, atom) in molecule.atoms().filter(|(idx, _)| kept.contains(idx)) {
                atoms.push(MatrixAtom {
                    atom_ref: AtomRef::new(mol_id, idx),
                    id: atom.id.clone(),
                    symbol: atom.symbol.clone(),
                });
                electrons.push(valence.free_valence_electrons(molecule, idx, skip_hydrogens));
            }
            for (a, b, bond) in molecule.bonds() {
                if kept.contains(&a) && kept.contains(&b) {
                    bonds.insert(
                        bond_key(AtomRef::new(mol_id, a), AtomRef::new(mol_id, b)),
                        *bond,
                    );
                }
            }
        }

        let n = atoms.len();
        let mut values = DMatrix::from_element(n + 1, n + 1, 0.0);
        for i in 0..n {
            values[(i, i)] = electrons[i];
            for j in (i + 1)..n {
                let order = bonds
                    .get(&bond_key(atoms[i].atom_ref, atoms[j].atom_ref))
                    .map_or(0.0, |bond| bond.order.electron_matrix_value());
                values[(i, j)] = order;
                values[(j, i)] = order;
            }
            values[(n, i)] = Self::LONE_PAIR_SENTINEL;
            values[(i, n)] = Self::LONE_PAIR_SENTINEL;
        }
        values[(n, n)] = Self::CORNER_SENTINEL;

        Self {
            atoms,
            values,
            bonds,
            skip_hydrogens,
        }
    }

    /// Matrix over the atoms of one reaction side that appear in `mapping`.
    pub fn for_side(
        reaction: &Reaction,
        side: ReactionSide,
        mapping: &ReactionMapping,
        skip_hydrogens: bool,
        valence: &dyn ValenceModel,
    ) -> Self {
        Self::build(
            reaction.side(side),
            |atom| match side {
                ReactionSide::Reactant => mapping.contains_reactant_atom(atom),
                ReactionSide::Product => mapping.contains_product_atom(atom),
            },
            skip_hydrogens,
            valence,
        )
    }

    pub fn atom_count(&self) -> usize {
        self.atoms.len()
    }

    /// Side length of the square matrix (`atom_count() + 1`).
    pub fn dimension(&self) -> usize {
        self.values.nrows()
    }

    pub fn skips_hydrogens(&self) -> bool {
        self.skip_hydrogens
    }

    pub fn values(&self) -> &DMatrix<f64> {
        &self.values
    }

    pub fn value(&self, i: usize, j: usize) -> Option<f64> {
        (i < self.dimension() && j < self.dimension()).then(|| self.values[(i, j)])
    }

    pub fn atoms(&self) -> &[MatrixAtom] {
        &self.atoms
    }

    /// Returns the atom at matrix position `pos`.
    pub fn atom(&self, pos: usize) -> Result<&MatrixAtom, MatrixError> {
        self.atoms.get(pos).ok_or(MatrixError::IndexOutOfRange {
            index: pos,
            len: self.atoms.len(),
        })
    }

    pub fn index_of(&self, atom_id: &str) -> Option<usize> {
        self.atoms.iter().position(|atom| atom.id == atom_id)
    }

    /// Matrix entry between two atoms addressed by id.
    pub fn order(&self, a: &str, b: &str) -> Option<f64> {
        Some(self.values[(self.index_of(a)?, self.index_of(b)?)])
    }

    pub fn free_electrons(&self, atom_id: &str) -> Option<f64> {
        self.order(atom_id, atom_id)
    }

    pub fn bond(&self, a: &str, b: &str) -> Option<&Bond> {
        let a = self.atoms.get(self.index_of(a)?)?.atom_ref;
        let b = self.atoms.get(self.index_of(b)?)?.atom_ref;
        self.bonds.get(&bond_key(a, b))
    }

    /// Stereo code of the bond between two atoms, [`BondStereo::NONE_CODE`] if unbonded.
    pub fn bond_stereo(&self, a: &str, b: &str) -> i32 {
        self.bond(a, b)
            .map_or(BondStereo::NONE_CODE, |bond| bond.stereo.code())
    }

    pub fn molecule_of(&self, atom_id: &str) -> Option<MoleculeId> {
        self.index_of(atom_id)
            .map(|idx| self.atoms[idx].atom_ref.molecule)
    }

    /// Swaps two atoms together with their rows and columns.
    pub fn pivot(&mut self, i1: usize, i2: usize) -> Result<(), MatrixError> {
        for index in [i1, i2] {
            if index >= self.atoms.len() {
                return Err(MatrixError::IndexOutOfRange {
                    index,
                    len: self.atoms.len(),
                });
            }
        }
        if i1 != i2 {
            self.atoms.swap(i1, i2);
            self.values.swap_columns(i1, i2);
            self.values.swap_rows(i1, i2);
        }
        Ok(())
    }

    /// Reorders the matrix so that position `i` holds atom `target[i]`.
    ///
    /// Returns, for each target position, the position the atom was found at
    /// when it was moved into place. The request is validated in full before
    /// any pivot, so on error the matrix is unchanged.
    pub fn order_atoms<S: AsRef<str>>(&mut self, target: &[S]) -> Result<Vec<usize>, MatrixError> {
        if target.len() != self.atoms.len() {
            return Err(MatrixError::OrderingMismatch {
                expected: self.atoms.len(),
                actual: target.len(),
            });
        }
        let mut requested = HashSet::new();
        for id in target {
            let id = id.as_ref();
            if self.index_of(id).is_none() || !requested.insert(id) {
                return Err(MatrixError::UnknownAtom(id.to_string()));
            }
        }

        let mut canonical = Vec::with_capacity(target.len());
        for (i, id) in target.iter().enumerate() {
            let current = self
                .index_of(id.as_ref())
                .ok_or_else(|| MatrixError::UnknownAtom(id.as_ref().to_string()))?;
            if current != i {
                self.pivot(current, i)?;
            }
            canonical.push(current);
        }
        Ok(canonical)
    }
}

fn bond_key(a: AtomRef, b: AtomRef) -> (AtomRef, AtomRef) {
    if a <= b { (a, b) } else { (b, a) }
}

impl fmt::Display for BondElectronMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.atoms.len())?;
        let header: Vec<String> = self
            .atoms
            .iter()
            .map(|atom| format!("{}{}", atom.symbol, atom.id))
            .collect();
        writeln!(f, "{}", header.join("\t"))?;
        for i in 0..self.dimension() {
            let row: Vec<String> = (0..self.dimension())
                .map(|j| self.values[(i, j)].to_string())
                .collect();
            writeln!(f, "{}", row.join("\t"))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::chem::valence::ElectronCounting;
    use crate::core::models::atom::Atom;
    use crate::core::models::topology::BondOrder;

    fn propene() -> (Reaction, MoleculeId) {
        let mut mol = Molecule::new("propene");
        let c1 = mol.add_atom(Atom::new("c1", "C").with_hydrogens(2));
        let c2 = mol.add_atom(Atom::new("c2", "C").with_hydrogens(1));
        let c3 = mol.add_atom(Atom::new("c3", "C").with_hydrogens(3));
        let h = mol.add_atom(Atom::new("h1", "H"));
        mol.add_bond(c1, c2, Bond::new(BondOrder::Double).with_stereo(BondStereo::EOrZ))
            .unwrap();
        mol.add_bond(c2, c3, Bond::default()).unwrap();
        mol.add_bond(c3, h, Bond::default()).unwrap();
        let mut reaction = Reaction::new();
        let id = reaction.add_reactant(mol);
        (reaction, id)
    }

    fn full_matrix(skip_hydrogens: bool) -> BondElectronMatrix {
        let (reaction, _) = propene();
        BondElectronMatrix::build(
            reaction.side(ReactionSide::Reactant),
            |_| true,
            skip_hydrogens,
            &ElectronCounting,
        )
    }

    #[test]
    fn dimension_is_atom_count_plus_sentinel() {
        let matrix = full_matrix(false);
        assert_eq!(matrix.atom_count(), 4);
        assert_eq!(matrix.dimension(), 5);
        assert_eq!(matrix.value(4, 0), Some(BondElectronMatrix::LONE_PAIR_SENTINEL));
        assert_eq!(matrix.value(0, 4), Some(BondElectronMatrix::LONE_PAIR_SENTINEL));
        assert_eq!(matrix.value(4, 4), Some(BondElectronMatrix::CORNER_SENTINEL));
        assert_eq!(matrix.value(5, 0), None);
    }

    #[test]
    fn hydrogens_are_skipped_on_request() {
        let matrix = full_matrix(true);
        assert_eq!(matrix.atom_count(), 3);
        assert!(matrix.index_of("h1").is_none());
    }

    #[test]
    fn bond_orders_are_symmetric() {
        let matrix = full_matrix(false);
        assert_eq!(matrix.order("c1", "c2"), Some(2.0));
        assert_eq!(matrix.order("c2", "c3"), Some(1.0));
        assert_eq!(matrix.order("c1", "c3"), Some(0.0));
        for i in 0..matrix.dimension() {
            for j in 0..matrix.dimension() {
                assert_eq!(matrix.value(i, j), matrix.value(j, i));
            }
        }
    }

    #[test]
    fn only_participating_atoms_are_included() {
        let (reaction, id) = propene();
        let matrix = BondElectronMatrix::build(
            reaction.side(ReactionSide::Reactant),
            |atom| atom.atom.index() < 2 && atom.molecule == id,
            false,
            &ElectronCounting,
        );
        assert_eq!(matrix.atom_count(), 2);
        assert_eq!(matrix.dimension(), 3);
    }

    #[test]
    fn stereo_and_bond_lookups_use_named_codes() {
        let matrix = full_matrix(false);
        assert_eq!(matrix.bond_stereo("c1", "c2"), BondStereo::E_OR_Z_CODE);
        assert_eq!(matrix.bond_stereo("c1", "c3"), BondStereo::NONE_CODE);
        assert_eq!(matrix.bond("c2", "c3").map(|b| b.order), Some(BondOrder::Single));
        assert!(matrix.molecule_of("c3").is_some());
        assert!(matrix.molecule_of("zz").is_none());
    }

    #[test]
    fn atom_lookup_reports_out_of_range_positions() {
        let matrix = full_matrix(false);
        assert_eq!(matrix.atom(0).unwrap().id, "c1");
        assert_eq!(
            matrix.atom(9),
            Err(MatrixError::IndexOutOfRange { index: 9, len: 4 })
        );
    }

    #[test]
    fn pivot_twice_restores_the_matrix() {
        let original = full_matrix(false);
        let mut matrix = original.clone();
        matrix.pivot(0, 2).unwrap();
        assert_eq!(matrix.atom(0).unwrap().id, "c3");
        assert_eq!(matrix.order("c1", "c2"), Some(2.0));
        matrix.pivot(0, 2).unwrap();
        assert_eq!(matrix, original);
    }

    #[test]
    fn order_atoms_applies_target_order() {
        let mut matrix = full_matrix(true);
        let canonical = matrix.order_atoms(&["c3", "c1", "c2"]).unwrap();
        let ids: Vec<&str> = matrix.atoms().iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, vec!["c3", "c1", "c2"]);
        assert_eq!(canonical, vec![2, 2, 2]);
        assert_eq!(matrix.order("c1", "c2"), Some(2.0));
        assert_eq!(matrix.value(1, 2), Some(2.0));
    }

    #[test]
    fn order_atoms_rejects_wrong_sizes_without_changes() {
        let original = full_matrix(true);
        let mut matrix = original.clone();
        assert_eq!(
            matrix.order_atoms(&["c2", "c1"]),
            Err(MatrixError::OrderingMismatch {
                expected: 3,
                actual: 2
            })
        );
        assert_eq!(matrix, original);
    }

    #[test]
    fn order_atoms_rejects_unknown_atoms_without_changes() {
        let original = full_matrix(true);
        let mut matrix = original.clone();
        assert_eq!(
            matrix.order_atoms(&["c2", "c1", "x9"]),
            Err(MatrixError::UnknownAtom("x9".to_string()))
        );
        assert_eq!(
            matrix.order_atoms(&["c2", "c2", "c1"]),
            Err(MatrixError::UnknownAtom("c2".to_string()))
        );
        assert_eq!(matrix, original);
    }
}
