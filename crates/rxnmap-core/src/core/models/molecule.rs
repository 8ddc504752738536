use super::atom::Atom;
use super::topology::Bond;
use petgraph::graph::{EdgeIndex, NodeIndex, UnGraph};
use petgraph::visit::EdgeRef;
use std::collections::HashMap;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ModelError {
    #[error("Atom index {0} is out of range")]
    AtomOutOfRange(usize),
    #[error("Cannot bond atom {0} to itself")]
    SelfBond(usize),
    #[error("Atoms {0} and {1} are already bonded")]
    DuplicateBond(usize, usize),
    #[error("Molecule is not part of this reaction")]
    UnknownMolecule,
}

/// A molecule (atom container) taking part in a reaction.
///
/// Atoms and bonds are stored in an undirected graph whose node order is the
/// atom order of the molecule. Node indices are stable as long as no atom is
/// removed; molecules are never mutated once a mapping run has started.
#[derive(Debug, Clone, Default)]
pub struct Molecule {
    name: String,
    graph: UnGraph<Atom, Bond>,
}

impl Molecule {
    /// Creates a new, empty molecule with the given name.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            graph: UnGraph::default(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: &str) {
        self.name = name.to_string();
    }

    pub fn graph(&self) -> &UnGraph<Atom, Bond> {
        &self.graph
    }

    /// Retrieves an atom by its node index.
    ///
    /// # Return
    ///
    /// Returns `Some(&Atom)` if the index is valid, otherwise `None`.
    pub fn atom(&self, idx: NodeIndex) -> Option<&Atom> {
        self.graph.node_weight(idx)
    }

    pub fn atom_mut(&mut self, idx: NodeIndex) -> Option<&mut Atom> {
        self.graph.node_weight_mut(idx)
    }

    pub fn add_atom(&mut self, atom: Atom) -> NodeIndex {
        self.graph.add_node(atom)
    }

    /// Adds a bond between two existing atoms.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError`] if either index is out of range, if both indices
    /// refer to the same atom, or if the two atoms are already bonded.
    pub fn add_bond(&mut self, a: NodeIndex, b: NodeIndex, bond: Bond) -> Result<EdgeIndex, ModelError> {
        for idx in [a, b] {
            if idx.index() >= self.graph.node_count() {
                return Err(ModelError::AtomOutOfRange(idx.index()));
            }
        }
        if a == b {
            return Err(ModelError::SelfBond(a.index()));
        }
        if self.graph.find_edge(a, b).is_some() {
            return Err(ModelError::DuplicateBond(a.index(), b.index()));
        }
        Ok(self.graph.add_edge(a, b, bond))
    }

    pub fn atom_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn bond_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    pub fn heavy_atom_count(&self) -> usize {
        self.graph
            .node_weights()
            .filter(|atom| !atom.is_hydrogen())
            .count()
    }

    /// Iterates over atoms in molecule order.
    pub fn atoms(&self) -> impl Iterator<Item = (NodeIndex, &Atom)> + '_ {
        self.graph
            .node_indices()
            .map(move |idx| (idx, &self.graph[idx]))
    }

    pub fn atom_indices(&self) -> impl Iterator<Item = NodeIndex> + '_ {
        self.graph.node_indices()
    }

    pub fn neighbors(&self, idx: NodeIndex) -> impl Iterator<Item = NodeIndex> + '_ {
        self.graph.neighbors(idx)
    }

    pub fn degree(&self, idx: NodeIndex) -> usize {
        self.graph.neighbors(idx).count()
    }

    /// Iterates over all bonds as `(begin, end, bond)` triples.
    pub fn bonds(&self) -> impl Iterator<Item = (NodeIndex, NodeIndex, &Bond)> + '_ {
        self.graph
            .edge_references()
            .map(|edge| (edge.source(), edge.target(), edge.weight()))
    }

    /// Iterates over the bonds of one atom as `(neighbor, bond)` pairs.
    pub fn bonds_of(&self, idx: NodeIndex) -> impl Iterator<Item = (NodeIndex, &Bond)> + '_ {
        self.graph.edges(idx).map(move |edge| {
            let other = if edge.source() == idx {
                edge.target()
            } else {
                edge.source()
            };
            (other, edge.weight())
        })
    }

    pub fn bond_between(&self, a: NodeIndex, b: NodeIndex) -> Option<&Bond> {
        self.graph.find_edge(a, b).map(|edge| &self.graph[edge])
    }

    /// Finds an atom by its stable identifier.
    pub fn find_atom(&self, id: &str) -> Option<NodeIndex> {
        self.graph
            .node_indices()
            .find(|&idx| self.graph[idx].id == id)
    }

    pub fn contains_atom_id(&self, id: &str) -> bool {
        self.find_atom(id).is_some()
    }

    /// Builds a copy of this molecule without explicit hydrogen atoms.
    ///
    /// Removed hydrogens are folded into the implicit hydrogen count of the
    /// heavy atom they were bonded to. Atom ids are preserved, so atoms of the
    /// copy can be re-located in the original by id.
    pub fn heavy_atom_copy(&self) -> Molecule {
        let mut copy = Molecule::new(&self.name);
        let mut index_map: HashMap<NodeIndex, NodeIndex> = HashMap::new();

        for (idx, atom) in self.atoms() {
            if atom.is_hydrogen() {
                continue;
            }
            index_map.insert(idx, copy.add_atom(atom.clone()));
        }

        for (a, b, bond) in self.bonds() {
            match (index_map.get(&a), index_map.get(&b)) {
                (Some(&na), Some(&nb)) => {
                    copy.graph.add_edge(na, nb, *bond);
                }
                (Some(&heavy), None) | (None, Some(&heavy)) => {
                    let atom = &mut copy.graph[heavy];
                    atom.hydrogen_count = atom.hydrogen_count.saturating_add(1);
                }
                (None, None) => {}
            }
        }

        copy
    }
}
