use super::matrix::{BondElectronMatrix, MatrixError};
use crate::core::chem::valence::ValenceModel;
use crate::core::models::mapping::ReactionMapping;
use crate::core::models::reaction::{Reaction, ReactionSide};
use nalgebra::DMatrix;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BondChangeKind {
    Formed,
    Cleaved,
    OrderChanged,
}

impl fmt::Display for BondChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Formed => write!(f, "formed"),
            Self::Cleaved => write!(f, "cleaved"),
            Self::OrderChanged => write!(f, "order-changed"),
        }
    }
}

/// One bond made, broken or changed by the reaction, addressed by reactant atom ids.
#[derive(Debug, Clone, PartialEq)]
pub struct BondChange {
    pub first: String,
    pub second: String,
    pub kind: BondChangeKind,
    pub before: f64,
    pub after: f64,
}

/// Educt and product bond-electron matrices over the same mapped atoms, and
/// their difference `R = P - E`.
#[derive(Debug, Clone, PartialEq)]
pub struct ReactionMechanism {
    educt: BondElectronMatrix,
    product: BondElectronMatrix,
    reaction_matrix: DMatrix<f64>,
    changes: Vec<BondChange>,
}

impl ReactionMechanism {
    /// Builds both matrices from a reaction-level mapping and aligns the
    /// product matrix to the educt atom order.
    ///
    /// # Errors
    ///
    /// Returns [`MatrixError`] if the product atoms cannot be put into the
    /// educt order, which happens when the mapping is not a bijection between
    /// the atoms kept on both sides.
    pub fn build(
        reaction: &Reaction,
        mapping: &ReactionMapping,
        skip_hydrogens: bool,
        valence: &dyn ValenceModel,
    ) -> Result<Self, MatrixError> {
        let educt = BondElectronMatrix::for_side(
            reaction,
            ReactionSide::Reactant,
            mapping,
            skip_hydrogens,
            valence,
        );
        let mut product = BondElectronMatrix::for_side(
            reaction,
            ReactionSide::Product,
            mapping,
            skip_hydrogens,
            valence,
        );

        let target: Vec<String> = educt
            .atoms()
            .iter()
            .map(|atom| {
                mapping
                    .product_of(atom.atom_ref)
                    .and_then(|p| reaction.atom(p))
                    .map(|a| a.id.clone())
                    .ok_or_else(|| MatrixError::UnknownAtom(atom.id.clone()))
            })
            .collect::<Result<_, _>>()?;
        product.order_atoms(&target)?;

        let reaction_matrix = product.values() - educt.values();
        let changes = bond_changes(&educt, &product);

        Ok(Self {
            educt,
            product,
            reaction_matrix,
            changes,
        })
    }

    pub fn educt(&self) -> &BondElectronMatrix {
        &self.educt
    }

    pub fn product(&self) -> &BondElectronMatrix {
        &self.product
    }

    pub fn reaction_matrix(&self) -> &DMatrix<f64> {
        &self.reaction_matrix
    }

    pub fn changes(&self) -> &[BondChange] {
        &self.changes
    }

    pub fn count(&self, kind: BondChangeKind) -> usize {
        self.changes.iter().filter(|c| c.kind == kind).count()
    }

    /// Number of bond changes of any kind.
    pub fn total_changes(&self) -> usize {
        self.changes.len()
    }
}

fn bond_changes(educt: &BondElectronMatrix, product: &BondElectronMatrix) -> Vec<BondChange> {
    let e = educt.values();
    let p = product.values();
    let n = educt.atom_count();
    let mut changes = Vec::new();
    for i in 0..n {
        for j in (i + 1)..n {
            let (before, after) = (e[(i, j)], p[(i, j)]);
            let kind = match (before > 0.0, after > 0.0) {
                (false, true) => BondChangeKind::Formed,
                (true, false) => BondChangeKind::Cleaved,
                (true, true) if before != after => BondChangeKind::OrderChanged,
                _ => continue,
            };
            changes.push(BondChange {
                first: educt.atoms()[i].id.clone(),
                second: educt.atoms()[j].id.clone(),
                kind,
                before,
                after,
            });
        }
    }
    changes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::chem::valence::ElectronCounting;
    use crate::core::models::atom::Atom;
    use crate::core::models::molecule::Molecule;
    use crate::core::models::reaction::AtomRef;
    use crate::core::models::topology::{Bond, BondOrder};

    // CH3-CH2-OH -> CH3-CH=O, heavy atoms only.
    fn oxidation() -> (Reaction, ReactionMapping) {
        let mut ethanol = Molecule::new("ethanol");
        let c1 = ethanol.add_atom(Atom::new("r1", "C").with_hydrogens(3));
        let c2 = ethanol.add_atom(Atom::new("r2", "C").with_hydrogens(2));
        let o = ethanol.add_atom(Atom::new("r3", "O").with_hydrogens(1));
        ethanol.add_bond(c1, c2, Bond::default()).unwrap();
        ethanol.add_bond(c2, o, Bond::default()).unwrap();

        let mut aldehyde = Molecule::new("acetaldehyde");
        let o2 = aldehyde.add_atom(Atom::new("p1", "O"));
        let c3 = aldehyde.add_atom(Atom::new("p2", "C").with_hydrogens(1));
        let c4 = aldehyde.add_atom(Atom::new("p3", "C").with_hydrogens(3));
        aldehyde.add_bond(o2, c3, Bond::new(BondOrder::Double)).unwrap();
        aldehyde.add_bond(c3, c4, Bond::default()).unwrap();

        let mut reaction = Reaction::new();
        let r = reaction.add_reactant(ethanol);
        let p = reaction.add_product(aldehyde);
        let mut mapping = ReactionMapping::new();
        mapping.insert(AtomRef::new(r, c1), AtomRef::new(p, c4));
        mapping.insert(AtomRef::new(r, c2), AtomRef::new(p, c3));
        mapping.insert(AtomRef::new(r, o), AtomRef::new(p, o2));
        (reaction, mapping)
    }

    #[test]
    fn product_matrix_follows_educt_order() {
        let (reaction, mapping) = oxidation();
        let mechanism = ReactionMechanism::build(&reaction, &mapping, true, &ElectronCounting).unwrap();
        let product_ids: Vec<&str> = mechanism
            .product()
            .atoms()
            .iter()
            .map(|a| a.id.as_str())
            .collect();
        assert_eq!(product_ids, vec!["p3", "p2", "p1"]);
        assert_eq!(mechanism.reaction_matrix().nrows(), 4);
    }

    #[test]
    fn reaction_matrix_records_the_order_change() {
        let (reaction, mapping) = oxidation();
        let mechanism = ReactionMechanism::build(&reaction, &mapping, true, &ElectronCounting).unwrap();

        assert_eq!(mechanism.reaction_matrix()[(1, 2)], 1.0);
        assert_eq!(mechanism.reaction_matrix()[(0, 1)], 0.0);
        assert_eq!(mechanism.reaction_matrix()[(3, 3)], 0.0);
        assert_eq!(mechanism.total_changes(), 1);
        assert_eq!(mechanism.count(BondChangeKind::OrderChanged), 1);
        let change = &mechanism.changes()[0];
        assert_eq!((change.first.as_str(), change.second.as_str()), ("r2", "r3"));
        assert_eq!((change.before, change.after), (1.0, 2.0));
    }

    #[test]
    fn empty_mapping_gives_sentinel_only_matrices() {
        let (reaction, _) = oxidation();
        let mechanism =
            ReactionMechanism::build(&reaction, &ReactionMapping::new(), true, &ElectronCounting).unwrap();
        assert_eq!(mechanism.educt().dimension(), 1);
        assert_eq!(mechanism.total_changes(), 0);
    }
}
