use crate::core::chem::signature::SubgraphSignature;
use crate::core::models::ids::MoleculeId;
use crate::core::models::molecule::Molecule;
use crate::core::models::reaction::{Reaction, ReactionSide};
use nalgebra::DMatrix;
use std::collections::{BTreeMap, HashMap, HashSet};

/// Pairwise similarity of reactants (rows) and products (columns).
///
/// A value of [`SimilarityMatrix::FORCE_INCLUSION`] marks a pair that must be
/// matched even when one of its molecules is empty.
#[derive(Debug, Clone, PartialEq)]
pub struct SimilarityMatrix {
    values: DMatrix<f64>,
}

impl SimilarityMatrix {
    pub const FORCE_INCLUSION: f64 = -1.0;

    pub fn zeros(reactants: usize, products: usize) -> Self {
        Self {
            values: DMatrix::zeros(reactants, products),
        }
    }

    /// Tanimoto similarity of the element compositions of every molecule pair.
    pub fn from_element_counts(reaction: &Reaction) -> Self {
        let reactants: Vec<_> = reaction
            .side(ReactionSide::Reactant)
            .map(|(_, mol)| element_counts(mol))
            .collect();
        let products: Vec<_> = reaction
            .side(ReactionSide::Product)
            .map(|(_, mol)| element_counts(mol))
            .collect();
        Self {
            values: DMatrix::from_fn(reactants.len(), products.len(), |r, p| {
                tanimoto(&reactants[r], &products[p])
            }),
        }
    }

    pub fn rows(&self) -> usize {
        self.values.nrows()
    }

    pub fn cols(&self) -> usize {
        self.values.ncols()
    }

    /// Similarity of a pair; 0 for pairs outside the matrix.
    pub fn value(&self, reactant: usize, product: usize) -> f64 {
        self.values
            .get((reactant, product))
            .copied()
            .unwrap_or(0.0)
    }

    pub fn set(&mut self, reactant: usize, product: usize, value: f64) -> bool {
        match self.values.get_mut((reactant, product)) {
            Some(slot) => {
                *slot = value;
                true
            }
            None => false,
        }
    }

    pub fn force_inclusion(&mut self, reactant: usize, product: usize) -> bool {
        self.set(reactant, product, Self::FORCE_INCLUSION)
    }

    pub fn forces_inclusion(&self, reactant: usize, product: usize) -> bool {
        self.value(reactant, product) == Self::FORCE_INCLUSION
    }
}

fn element_counts(molecule: &Molecule) -> BTreeMap<&str, usize> {
    let mut counts = BTreeMap::new();
    for (_, atom) in molecule.atoms() {
        *counts.entry(atom.symbol.as_str()).or_insert(0) += 1;
    }
    counts
}

fn tanimoto(a: &BTreeMap<&str, usize>, b: &BTreeMap<&str, usize>) -> f64 {
    let symbols: HashSet<&str> = a.keys().chain(b.keys()).copied().collect();
    let (shared, total) = symbols.into_iter().fold((0, 0), |(shared, total), symbol| {
        let x = a.get(symbol).copied().unwrap_or(0);
        let y = b.get(symbol).copied().unwrap_or(0);
        (shared + x.min(y), total + x.max(y))
    });
    if total == 0 {
        0.0
    } else {
        shared as f64 / total as f64
    }
}

/// Caller-supplied "modified" flags, replacing the signature-based defaults.
///
/// Entries beyond the reaction's side counts are ignored; missing entries keep
/// the default.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModifiedFlags {
    pub educts: Vec<bool>,
    pub products: Vec<bool>,
}

impl ModifiedFlags {
    pub fn apply(&self, container: &mut ReactionContainer) {
        for (index, &flag) in self.educts.iter().enumerate() {
            container.set_educt_modified(index, flag);
        }
        for (index, &flag) in self.products.iter().enumerate() {
            container.set_product_modified(index, flag);
        }
    }
}

/// The molecules of one standardized reaction, prepared for job building.
///
/// Holds the canonical reaction together with the copy handed to the matcher
/// (hydrogen-stripped when requested). Both share molecule ids and side lists,
/// so side slot `i` names the same container in either view.
#[derive(Debug, Clone)]
pub struct ReactionContainer {
    reaction: Reaction,
    matched: Reaction,
    educt_modified: Vec<bool>,
    product_modified: Vec<bool>,
    similarity: SimilarityMatrix,
}

impl ReactionContainer {
    /// Prepares `reaction` for matching.
    ///
    /// A molecule counts as modified unless a molecule with the same heavy-atom
    /// signature appears on the opposite side.
    pub fn new(reaction: Reaction, remove_hydrogens: bool) -> Self {
        let matched = if remove_hydrogens {
            reaction.map_molecules(Molecule::heavy_atom_copy)
        } else {
            reaction.clone()
        };

        let signatures: HashMap<MoleculeId, SubgraphSignature> = reaction
            .molecules()
            .map(|(id, mol)| (id, SubgraphSignature::of_molecule(&mol.heavy_atom_copy())))
            .collect();
        let side_signatures = |side: ReactionSide| -> Vec<&SubgraphSignature> {
            reaction
                .side_ids(side)
                .iter()
                .filter_map(|id| signatures.get(id))
                .collect()
        };
        let educts = side_signatures(ReactionSide::Reactant);
        let products = side_signatures(ReactionSide::Product);
        let educt_modified = educts.iter().map(|sig| !products.contains(sig)).collect();
        let product_modified = products.iter().map(|sig| !educts.contains(sig)).collect();

        let similarity = SimilarityMatrix::from_element_counts(&reaction);
        Self {
            reaction,
            matched,
            educt_modified,
            product_modified,
            similarity,
        }
    }

    pub fn reaction(&self) -> &Reaction {
        &self.reaction
    }

    pub fn matched_reaction(&self) -> &Reaction {
        &self.matched
    }

    pub fn into_reaction(self) -> Reaction {
        self.reaction
    }

    pub fn educt_count(&self) -> usize {
        self.reaction.reactant_count()
    }

    pub fn product_count(&self) -> usize {
        self.reaction.product_count()
    }

    pub fn educt_id(&self, index: usize) -> Option<MoleculeId> {
        self.reaction.molecule_id(ReactionSide::Reactant, index)
    }

    pub fn product_id(&self, index: usize) -> Option<MoleculeId> {
        self.reaction.molecule_id(ReactionSide::Product, index)
    }

    /// Reactant `index` as handed to the matcher.
    pub fn educt(&self, index: usize) -> Option<&Molecule> {
        self.matched.molecule_at(ReactionSide::Reactant, index)
    }

    /// Product `index` as handed to the matcher.
    pub fn product(&self, index: usize) -> Option<&Molecule> {
        self.matched.molecule_at(ReactionSide::Product, index)
    }

    pub fn canonical_educt(&self, index: usize) -> Option<&Molecule> {
        self.reaction.molecule_at(ReactionSide::Reactant, index)
    }

    pub fn canonical_product(&self, index: usize) -> Option<&Molecule> {
        self.reaction.molecule_at(ReactionSide::Product, index)
    }

    pub fn is_educt_modified(&self, index: usize) -> bool {
        self.educt_modified.get(index).copied().unwrap_or(false)
    }

    pub fn is_product_modified(&self, index: usize) -> bool {
        self.product_modified.get(index).copied().unwrap_or(false)
    }

    pub fn set_educt_modified(&mut self, index: usize, modified: bool) {
        if let Some(flag) = self.educt_modified.get_mut(index) {
            *flag = modified;
        }
    }

    pub fn set_product_modified(&mut self, index: usize, modified: bool) {
        if let Some(flag) = self.product_modified.get_mut(index) {
            *flag = modified;
        }
    }

    pub fn similarity(&self) -> &SimilarityMatrix {
        &self.similarity
    }

    pub fn similarity_mut(&mut self) -> &mut SimilarityMatrix {
        &mut self.similarity
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::atom::Atom;
    use crate::core::models::topology::Bond;

    fn water(prefix: &str, explicit_h: bool) -> Molecule {
        let mut mol = Molecule::new("water");
        let o = mol.add_atom(Atom::new(&format!("{prefix}o"), "O").with_hydrogens(if explicit_h { 0 } else { 2 }));
        if explicit_h {
            for k in 0..2 {
                let h = mol.add_atom(Atom::new(&format!("{prefix}h{k}"), "H"));
                mol.add_bond(o, h, Bond::default()).unwrap();
            }
        }
        mol
    }

    fn methanol(prefix: &str) -> Molecule {
        let mut mol = Molecule::new("methanol");
        let c = mol.add_atom(Atom::new(&format!("{prefix}c"), "C").with_hydrogens(3));
        let o = mol.add_atom(Atom::new(&format!("{prefix}o"), "O").with_hydrogens(1));
        mol.add_bond(c, o, Bond::default()).unwrap();
        mol
    }

    fn formaldehyde(prefix: &str) -> Molecule {
        let mut mol = Molecule::new("formaldehyde");
        let c = mol.add_atom(Atom::new(&format!("{prefix}c"), "C").with_hydrogens(2));
        let o = mol.add_atom(Atom::new(&format!("{prefix}o"), "O"));
        mol.add_bond(c, o, Bond::new(crate::core::models::topology::BondOrder::Double))
            .unwrap();
        mol
    }

    fn oxidation() -> Reaction {
        let mut reaction = Reaction::new();
        reaction.add_reactant(methanol("r"));
        reaction.add_reactant(water("rw", true));
        reaction.add_product(formaldehyde("p"));
        reaction.add_product(water("pw", false));
        reaction
    }

    #[test]
    fn spectators_are_not_modified() {
        let container = ReactionContainer::new(oxidation(), true);
        assert!(container.is_educt_modified(0));
        assert!(!container.is_educt_modified(1));
        assert!(container.is_product_modified(0));
        assert!(!container.is_product_modified(1));
        assert!(!container.is_educt_modified(7));
    }

    #[test]
    fn spectator_with_reordered_atoms_is_not_modified() {
        let forward = |prefix: &str| {
            let mut mol = Molecule::new("ethanol");
            let c1 = mol.add_atom(Atom::new(&format!("{prefix}c1"), "C").with_hydrogens(3));
            let c2 = mol.add_atom(Atom::new(&format!("{prefix}c2"), "C").with_hydrogens(2));
            let o = mol.add_atom(Atom::new(&format!("{prefix}o"), "O").with_hydrogens(1));
            mol.add_bond(c1, c2, Bond::default()).unwrap();
            mol.add_bond(c2, o, Bond::default()).unwrap();
            mol
        };
        let mut reversed = Molecule::new("ethanol");
        let o = reversed.add_atom(Atom::new("po", "O").with_hydrogens(1));
        let c2 = reversed.add_atom(Atom::new("pc2", "C").with_hydrogens(2));
        let c1 = reversed.add_atom(Atom::new("pc1", "C").with_hydrogens(3));
        reversed.add_bond(o, c2, Bond::default()).unwrap();
        reversed.add_bond(c2, c1, Bond::default()).unwrap();

        let mut reaction = Reaction::new();
        reaction.add_reactant(forward("r"));
        reaction.add_reactant(methanol("m"));
        reaction.add_product(reversed);
        reaction.add_product(formaldehyde("f"));

        let container = ReactionContainer::new(reaction, true);
        assert!(!container.is_educt_modified(0));
        assert!(!container.is_product_modified(0));
        assert!(container.is_educt_modified(1));
        assert!(container.is_product_modified(1));
    }

    #[test]
    fn modified_flags_can_be_overridden() {
        let mut container = ReactionContainer::new(oxidation(), true);
        container.set_educt_modified(1, true);
        container.set_product_modified(0, false);
        assert!(container.is_educt_modified(1));
        assert!(!container.is_product_modified(0));

        ModifiedFlags {
            educts: vec![false],
            products: vec![true, true, true],
        }
        .apply(&mut container);
        assert!(!container.is_educt_modified(0));
        assert!(container.is_educt_modified(1));
        assert!(container.is_product_modified(0));
        assert!(container.is_product_modified(1));
    }

    #[test]
    fn matcher_copies_drop_hydrogens_but_keep_identity() {
        let container = ReactionContainer::new(oxidation(), true);
        assert_eq!(container.educt(1).unwrap().atom_count(), 1);
        assert_eq!(container.canonical_educt(1).unwrap().atom_count(), 3);
        assert_eq!(container.educt_id(1), container.reaction().molecule_id(ReactionSide::Reactant, 1));

        let kept = ReactionContainer::new(oxidation(), false);
        assert_eq!(kept.educt(1).unwrap().atom_count(), 3);
    }

    #[test]
    fn similarity_compares_element_composition() {
        let container = ReactionContainer::new(oxidation(), true);
        let similarity = container.similarity();
        assert_eq!((similarity.rows(), similarity.cols()), (2, 2));
        assert_eq!(similarity.value(0, 0), 1.0);
        assert_eq!(similarity.value(1, 0), 0.25);
        assert_eq!(similarity.value(5, 5), 0.0);
    }

    #[test]
    fn forced_inclusion_uses_the_sentinel() {
        let mut matrix = SimilarityMatrix::zeros(1, 2);
        assert!(matrix.force_inclusion(0, 1));
        assert!(matrix.forces_inclusion(0, 1));
        assert!(!matrix.forces_inclusion(0, 0));
        assert!(!matrix.force_inclusion(3, 0));
    }
}
