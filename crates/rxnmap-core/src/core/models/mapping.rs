use super::reaction::AtomRef;
use petgraph::graph::NodeIndex;
use std::collections::BTreeMap;

/// A partial bijection between the atoms of two molecules.
///
/// Keys are node indices of the query (reactant) molecule and values are node
/// indices of the target (product) molecule. Every atom appears at most once on
/// each side.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AtomAtomMapping {
    forward: BTreeMap<NodeIndex, NodeIndex>,
    reverse: BTreeMap<NodeIndex, NodeIndex>,
}

impl AtomAtomMapping {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds the pair `query -> target`.
    ///
    /// Returns `false` and leaves the mapping untouched if either atom is
    /// already mapped.
    pub fn insert(&mut self, query: NodeIndex, target: NodeIndex) -> bool {
        if self.forward.contains_key(&query) || self.reverse.contains_key(&target) {
            return false;
        }
        self.forward.insert(query, target);
        self.reverse.insert(target, query);
        true
    }

    pub fn get(&self, query: NodeIndex) -> Option<NodeIndex> {
        self.forward.get(&query).copied()
    }

    pub fn get_reverse(&self, target: NodeIndex) -> Option<NodeIndex> {
        self.reverse.get(&target).copied()
    }

    pub fn contains_query(&self, query: NodeIndex) -> bool {
        self.forward.contains_key(&query)
    }

    pub fn contains_target(&self, target: NodeIndex) -> bool {
        self.reverse.contains_key(&target)
    }

    pub fn len(&self) -> usize {
        self.forward.len()
    }

    pub fn is_empty(&self) -> bool {
        self.forward.is_empty()
    }

    /// Iterates over `(query, target)` pairs in ascending query order.
    pub fn iter(&self) -> impl Iterator<Item = (NodeIndex, NodeIndex)> + '_ {
        self.forward.iter().map(|(&q, &t)| (q, t))
    }

    /// Returns the mapping with query and target swapped.
    pub fn inverted(&self) -> Self {
        Self {
            forward: self.reverse.clone(),
            reverse: self.forward.clone(),
        }
    }
}

impl FromIterator<(NodeIndex, NodeIndex)> for AtomAtomMapping {
    fn from_iter<I: IntoIterator<Item = (NodeIndex, NodeIndex)>>(iter: I) -> Self {
        let mut mapping = Self::new();
        for (q, t) in iter {
            mapping.insert(q, t);
        }
        mapping
    }
}

/// Reaction-level atom-atom mapping from reactant atoms to product atoms.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReactionMapping {
    forward: BTreeMap<AtomRef, AtomRef>,
    reverse: BTreeMap<AtomRef, AtomRef>,
}

impl ReactionMapping {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds the pair `reactant -> product` unless either atom is already mapped.
    pub fn insert(&mut self, reactant: AtomRef, product: AtomRef) -> bool {
        if self.forward.contains_key(&reactant) || self.reverse.contains_key(&product) {
            return false;
        }
        self.forward.insert(reactant, product);
        self.reverse.insert(product, reactant);
        true
    }

    pub fn product_of(&self, reactant: AtomRef) -> Option<AtomRef> {
        self.forward.get(&reactant).copied()
    }

    pub fn reactant_of(&self, product: AtomRef) -> Option<AtomRef> {
        self.reverse.get(&product).copied()
    }

    pub fn contains_reactant_atom(&self, atom: AtomRef) -> bool {
        self.forward.contains_key(&atom)
    }

    pub fn contains_product_atom(&self, atom: AtomRef) -> bool {
        self.reverse.contains_key(&atom)
    }

    pub fn len(&self) -> usize {
        self.forward.len()
    }

    pub fn is_empty(&self) -> bool {
        self.forward.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (AtomRef, AtomRef)> + '_ {
        self.forward.iter().map(|(&r, &p)| (r, p))
    }

    pub fn reactant_atoms(&self) -> impl Iterator<Item = AtomRef> + '_ {
        self.forward.keys().copied()
    }

    pub fn product_atoms(&self) -> impl Iterator<Item = AtomRef> + '_ {
        self.reverse.keys().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::ids::MoleculeId;
    use slotmap::SlotMap;

    fn n(i: usize) -> NodeIndex {
        NodeIndex::new(i)
    }

    #[test]
    fn insert_keeps_mapping_bijective() {
        let mut mapping = AtomAtomMapping::new();
        assert!(mapping.insert(n(0), n(2)));
        assert!(!mapping.insert(n(0), n(3)));
        assert!(!mapping.insert(n(1), n(2)));
        assert!(mapping.insert(n(1), n(0)));

        assert_eq!(mapping.len(), 2);
        assert_eq!(mapping.get(n(0)), Some(n(2)));
        assert_eq!(mapping.get_reverse(n(0)), Some(n(1)));
    }

    #[test]
    fn inverted_swaps_both_directions() {
        let mapping: AtomAtomMapping = [(n(0), n(5)), (n(1), n(4))].into_iter().collect();
        let inverted = mapping.inverted();
        assert_eq!(inverted.get(n(5)), Some(n(0)));
        assert_eq!(inverted.get_reverse(n(1)), Some(n(4)));
        assert_eq!(inverted.inverted(), mapping);
    }

    #[test]
    fn iter_yields_pairs_in_query_order() {
        let mapping: AtomAtomMapping = [(n(3), n(0)), (n(1), n(1))].into_iter().collect();
        let pairs: Vec<_> = mapping.iter().collect();
        assert_eq!(pairs, vec![(n(1), n(1)), (n(3), n(0))]);
    }

    #[test]
    fn reaction_mapping_rejects_reused_atoms() {
        let mut keys: SlotMap<MoleculeId, ()> = SlotMap::with_key();
        let r = keys.insert(());
        let p = keys.insert(());

        let mut mapping = ReactionMapping::new();
        assert!(mapping.insert(AtomRef::new(r, n(0)), AtomRef::new(p, n(1))));
        assert!(!mapping.insert(AtomRef::new(r, n(1)), AtomRef::new(p, n(1))));
        assert_eq!(
            mapping.reactant_of(AtomRef::new(p, n(1))),
            Some(AtomRef::new(r, n(0)))
        );
        assert!(mapping.contains_product_atom(AtomRef::new(p, n(1))));
        assert_eq!(mapping.len(), 1);
    }
}
