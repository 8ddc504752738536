use super::atom::Atom;
use super::ids::MoleculeId;
use super::molecule::{ModelError, Molecule};
use petgraph::graph::NodeIndex;
use slotmap::SlotMap;
use std::fmt;

/// Side of a reaction a molecule is listed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ReactionSide {
    Reactant,
    Product,
}

impl ReactionSide {
    pub fn opposite(self) -> Self {
        match self {
            Self::Reactant => Self::Product,
            Self::Product => Self::Reactant,
        }
    }
}

impl fmt::Display for ReactionSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Reactant => write!(f, "reactant"),
            Self::Product => write!(f, "product"),
        }
    }
}

/// Reference to one atom of one molecule owned by a [`Reaction`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AtomRef {
    pub molecule: MoleculeId,
    pub atom: NodeIndex,
}

impl AtomRef {
    pub fn new(molecule: MoleculeId, atom: NodeIndex) -> Self {
        Self { molecule, atom }
    }
}

/// A chemical reaction: a pool of molecules plus ordered reactant and product lists.
///
/// The side lists hold [`MoleculeId`]s into the pool. The same id may appear
/// more than once (for example for a stoichiometric coefficient of two); such
/// slots refer to one and the same molecule object. Cloning a reaction keeps
/// every id valid, so identity relations between slots survive copies.
#[derive(Debug, Clone, Default)]
pub struct Reaction {
    id: Option<String>,
    molecules: SlotMap<MoleculeId, Molecule>,
    reactants: Vec<MoleculeId>,
    products: Vec<MoleculeId>,
}

impl Reaction {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn set_id(&mut self, id: &str) {
        self.id = Some(id.to_string());
    }

    /// Adds a molecule to the pool without listing it on either side.
    pub fn add_molecule(&mut self, molecule: Molecule) -> MoleculeId {
        self.molecules.insert(molecule)
    }

    pub fn add_reactant(&mut self, molecule: Molecule) -> MoleculeId {
        let id = self.molecules.insert(molecule);
        self.reactants.push(id);
        id
    }

    pub fn add_product(&mut self, molecule: Molecule) -> MoleculeId {
        let id = self.molecules.insert(molecule);
        self.products.push(id);
        id
    }

    /// Lists an already pooled molecule on the given side once more.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::UnknownMolecule`] if `id` is not in the pool.
    pub fn add_ref(&mut self, side: ReactionSide, id: MoleculeId) -> Result<(), ModelError> {
        if !self.molecules.contains_key(id) {
            return Err(ModelError::UnknownMolecule);
        }
        match side {
            ReactionSide::Reactant => self.reactants.push(id),
            ReactionSide::Product => self.products.push(id),
        }
        Ok(())
    }

    pub fn reactant_count(&self) -> usize {
        self.reactants.len()
    }

    pub fn product_count(&self) -> usize {
        self.products.len()
    }

    pub fn side_count(&self, side: ReactionSide) -> usize {
        self.side_ids(side).len()
    }

    pub fn side_ids(&self, side: ReactionSide) -> &[MoleculeId] {
        match side {
            ReactionSide::Reactant => &self.reactants,
            ReactionSide::Product => &self.products,
        }
    }

    pub fn reactant_ids(&self) -> &[MoleculeId] {
        &self.reactants
    }

    pub fn product_ids(&self) -> &[MoleculeId] {
        &self.products
    }

    pub fn molecule_id(&self, side: ReactionSide, index: usize) -> Option<MoleculeId> {
        self.side_ids(side).get(index).copied()
    }

    pub fn molecule(&self, id: MoleculeId) -> Option<&Molecule> {
        self.molecules.get(id)
    }

    pub fn molecule_mut(&mut self, id: MoleculeId) -> Option<&mut Molecule> {
        self.molecules.get_mut(id)
    }

    pub fn molecule_at(&self, side: ReactionSide, index: usize) -> Option<&Molecule> {
        self.molecule_id(side, index)
            .and_then(|id| self.molecules.get(id))
    }

    pub fn reactant(&self, index: usize) -> Option<&Molecule> {
        self.molecule_at(ReactionSide::Reactant, index)
    }

    pub fn product(&self, index: usize) -> Option<&Molecule> {
        self.molecule_at(ReactionSide::Product, index)
    }

    /// Iterates over the molecules of one side, in side order, with their ids.
    pub fn side(&self, side: ReactionSide) -> impl Iterator<Item = (MoleculeId, &Molecule)> + '_ {
        self.side_ids(side)
            .iter()
            .filter_map(move |&id| self.molecules.get(id).map(|mol| (id, mol)))
    }

    /// Iterates over every pooled molecule exactly once.
    pub fn molecules(&self) -> impl Iterator<Item = (MoleculeId, &Molecule)> + '_ {
        self.molecules.iter()
    }

    pub fn molecules_mut(&mut self) -> impl Iterator<Item = (MoleculeId, &mut Molecule)> + '_ {
        self.molecules.iter_mut()
    }

    pub fn atom(&self, atom_ref: AtomRef) -> Option<&Atom> {
        self.molecules
            .get(atom_ref.molecule)
            .and_then(|mol| mol.atom(atom_ref.atom))
    }

    /// Finds an atom by stable id among the molecules of one side.
    pub fn find_atom(&self, side: ReactionSide, atom_id: &str) -> Option<AtomRef> {
        self.side(side).find_map(|(mol_id, mol)| {
            mol.find_atom(atom_id)
                .map(|idx| AtomRef::new(mol_id, idx))
        })
    }

    /// Returns a copy of the reaction with every pooled molecule transformed once.
    ///
    /// Molecule ids, and therefore the identity relations between side slots,
    /// are preserved.
    pub fn map_molecules<F>(&self, transform: F) -> Reaction
    where
        F: Fn(&Molecule) -> Molecule,
    {
        let mut copy = self.clone();
        for (_, molecule) in copy.molecules.iter_mut() {
            *molecule = transform(molecule);
        }
        copy
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::topology::Bond;

    fn diatomic(name: &str, a: &str, b: &str) -> Molecule {
        let mut mol = Molecule::new(name);
        let x = mol.add_atom(Atom::new(a, "C"));
        let y = mol.add_atom(Atom::new(b, "O"));
        mol.add_bond(x, y, Bond::default()).unwrap();
        mol
    }

    #[test]
    fn side_lists_keep_insertion_order() {
        let mut reaction = Reaction::new();
        reaction.add_reactant(diatomic("A", "a1", "a2"));
        reaction.add_reactant(diatomic("B", "b1", "b2"));
        reaction.add_product(diatomic("C", "c1", "c2"));

        assert_eq!(reaction.reactant_count(), 2);
        assert_eq!(reaction.product_count(), 1);
        assert_eq!(reaction.reactant(0).unwrap().name(), "A");
        assert_eq!(reaction.reactant(1).unwrap().name(), "B");
        assert!(reaction.product(1).is_none());
    }

    #[test]
    fn add_ref_lists_the_same_molecule_twice() {
        let mut reaction = Reaction::new();
        let id = reaction.add_reactant(diatomic("A", "a1", "a2"));
        reaction.add_ref(ReactionSide::Reactant, id).unwrap();

        assert_eq!(reaction.reactant_count(), 2);
        assert_eq!(reaction.reactant_ids()[0], reaction.reactant_ids()[1]);
        assert_eq!(reaction.molecules().count(), 1);
    }

    #[test]
    fn add_ref_rejects_foreign_ids() {
        let mut other = Reaction::new();
        let foreign = other.add_reactant(diatomic("X", "x1", "x2"));
        other.add_reactant(diatomic("Y", "y1", "y2"));

        let mut reaction = Reaction::new();
        assert_eq!(
            reaction.add_ref(ReactionSide::Product, foreign),
            Err(ModelError::UnknownMolecule)
        );
    }

    #[test]
    fn find_atom_searches_only_the_requested_side() {
        let mut reaction = Reaction::new();
        reaction.add_reactant(diatomic("A", "a1", "a2"));
        let product_id = reaction.add_product(diatomic("C", "c1", "c2"));

        let found = reaction.find_atom(ReactionSide::Product, "c2").unwrap();
        assert_eq!(found.molecule, product_id);
        assert_eq!(reaction.atom(found).unwrap().symbol, "O");
        assert!(reaction.find_atom(ReactionSide::Reactant, "c2").is_none());
    }

    #[test]
    fn map_molecules_preserves_slot_identity() {
        let mut reaction = Reaction::new();
        let id = reaction.add_reactant(diatomic("A", "a1", "a2"));
        reaction.add_ref(ReactionSide::Reactant, id).unwrap();
        reaction.add_product(diatomic("C", "c1", "c2"));

        let renamed = reaction.map_molecules(|mol| {
            let mut copy = mol.clone();
            copy.set_name(&format!("{}'", mol.name()));
            copy
        });

        assert_eq!(renamed.reactant_ids(), reaction.reactant_ids());
        assert_eq!(renamed.reactant(1).unwrap().name(), "A'");
        assert_eq!(reaction.reactant(1).unwrap().name(), "A");
    }

    #[test]
    fn opposite_side_round_trips() {
        assert_eq!(ReactionSide::Reactant.opposite(), ReactionSide::Product);
        assert_eq!(ReactionSide::Product.opposite(), ReactionSide::Reactant);
    }
}
