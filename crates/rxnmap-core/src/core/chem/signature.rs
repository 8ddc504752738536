use crate::core::models::molecule::Molecule;
use crate::core::models::topology::BondOrder;
use petgraph::graph::NodeIndex;
use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::fmt;
use std::hash::{Hash, Hasher};

#[derive(Clone, PartialEq, Eq, PartialOrd, Ord)]
struct AtomInvariant {
    symbol: String,
    formal_charge: i8,
    hydrogen_count: u8,
    is_aromatic: bool,
    degree: usize,
    bond_codes: Vec<u8>,
}

/// Canonical description of a subset of atoms of one molecule.
///
/// Two subsets that induce isomorphic labelled subgraphs produce equal
/// signatures. Signatures order by their canonical string, which gives a total
/// order for pairing structurally equivalent fragments. Equality, hashing and
/// ordering look at the canonical string only; `labels` follow the input
/// atom order.
#[derive(Debug, Clone)]
pub struct SubgraphSignature {
    canonical: String,
    labels: Vec<usize>,
}

impl SubgraphSignature {
    /// Computes the signature of the subgraph induced by `atoms`.
    ///
    /// Indices that do not belong to `molecule` and repeated indices are ignored.
    pub fn new(molecule: &Molecule, atoms: &[NodeIndex]) -> Self {
        let subset: Vec<NodeIndex> = atoms
            .iter()
            .copied()
            .filter(|idx| molecule.atom(*idx).is_some())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let local = |idx: NodeIndex| subset.binary_search(&idx).ok();

        let neighbors: Vec<Vec<(u8, usize)>> = subset
            .iter()
            .map(|&idx| {
                molecule
                    .bonds_of(idx)
                    .filter_map(|(nb, bond)| local(nb).map(|j| (bond_code(bond.order), j)))
                    .collect()
            })
            .collect();

        let invariants: Vec<AtomInvariant> = subset
            .iter()
            .zip(&neighbors)
            .filter_map(|(&idx, nbs)| {
                let atom = molecule.atom(idx)?;
                let mut bond_codes: Vec<u8> = nbs.iter().map(|(code, _)| *code).collect();
                bond_codes.sort_unstable();
                Some(AtomInvariant {
                    symbol: atom.symbol.clone(),
                    formal_charge: atom.formal_charge,
                    hydrogen_count: atom.hydrogen_count,
                    is_aromatic: atom.is_aromatic,
                    degree: nbs.len(),
                    bond_codes,
                })
            })
            .collect();

        let mut ranks = ranks_from_keys(&invariants);
        let mut distinct = count_distinct(&ranks);
        loop {
            let keys: Vec<(usize, Vec<(u8, usize)>)> = neighbors
                .iter()
                .enumerate()
                .map(|(i, nbs)| {
                    let mut around: Vec<(u8, usize)> =
                        nbs.iter().map(|&(code, j)| (code, ranks[j])).collect();
                    around.sort_unstable();
                    (ranks[i], around)
                })
                .collect();
            let refined = ranks_from_keys(&keys);
            let refined_distinct = count_distinct(&refined);
            if refined_distinct <= distinct {
                break;
            }
            ranks = refined;
            distinct = refined_distinct;
        }

        let mut order: Vec<usize> = (0..subset.len()).collect();
        order.sort_by_key(|&i| ranks[i]);
        let canonical = order
            .iter()
            .map(|&i| {
                let inv = &invariants[i];
                let mut around: Vec<String> = neighbors[i]
                    .iter()
                    .map(|&(code, j)| format!("{code}{}", ranks[j]))
                    .collect();
                around.sort_unstable();
                format!(
                    "{}{:+}h{}{}@{}({})",
                    inv.symbol,
                    inv.formal_charge,
                    inv.hydrogen_count,
                    if inv.is_aromatic { "a" } else { "" },
                    ranks[i],
                    around.join(",")
                )
            })
            .collect::<Vec<_>>()
            .join(";");

        Self {
            canonical,
            labels: ranks,
        }
    }

    /// Signature of a whole molecule.
    pub fn of_molecule(molecule: &Molecule) -> Self {
        let atoms: Vec<NodeIndex> = molecule.atom_indices().collect();
        Self::new(molecule, &atoms)
    }

    pub fn as_str(&self) -> &str {
        &self.canonical
    }

    /// Canonical class of each subset atom, in ascending node-index order.
    pub fn labels(&self) -> &[usize] {
        &self.labels
    }

    pub fn is_empty(&self) -> bool {
        self.canonical.is_empty()
    }
}

impl PartialEq for SubgraphSignature {
    fn eq(&self, other: &Self) -> bool {
        self.canonical == other.canonical
    }
}

impl Eq for SubgraphSignature {}

impl Hash for SubgraphSignature {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.canonical.hash(state);
    }
}

impl PartialOrd for SubgraphSignature {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for SubgraphSignature {
    fn cmp(&self, other: &Self) -> Ordering {
        self.canonical.cmp(&other.canonical)
    }
}

impl fmt::Display for SubgraphSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.canonical)
    }
}

/// Bond label used in signatures; unlike the MDL code every order is distinct.
fn bond_code(order: BondOrder) -> u8 {
    match order {
        BondOrder::Single => 1,
        BondOrder::Double => 2,
        BondOrder::Triple => 3,
        BondOrder::Aromatic => 4,
        BondOrder::Quadruple => 5,
    }
}

fn ranks_from_keys<K: Ord>(keys: &[K]) -> Vec<usize> {
    let mut indices: Vec<usize> = (0..keys.len()).collect();
    indices.sort_by(|&a, &b| keys[a].cmp(&keys[b]));
    let mut ranks = vec![0usize; keys.len()];
    for pos in 1..indices.len() {
        let (prev, cur) = (indices[pos - 1], indices[pos]);
        ranks[cur] = if keys[cur] == keys[prev] {
            ranks[prev]
        } else {
            pos
        };
    }
    ranks
}

fn count_distinct(ranks: &[usize]) -> usize {
    ranks.iter().collect::<BTreeSet<_>>().len()
}
