use crate::core::models::molecule::Molecule;
use petgraph::algo::connected_components;
use petgraph::graph::NodeIndex;
use std::collections::{BTreeSet, VecDeque};

/// Cycles found in one molecule, each as a closed walk of node indices.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RingSet {
    rings: Vec<Vec<NodeIndex>>,
}

impl RingSet {
    pub fn len(&self) -> usize {
        self.rings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rings.is_empty()
    }

    pub fn rings(&self) -> &[Vec<NodeIndex>] {
        &self.rings
    }

    pub fn is_ring_atom(&self, atom: NodeIndex) -> bool {
        self.rings.iter().any(|ring| ring.contains(&atom))
    }

    pub fn is_ring_bond(&self, a: NodeIndex, b: NodeIndex) -> bool {
        self.rings.iter().any(|ring| {
            let len = ring.len();
            (0..len).any(|i| {
                let j = (i + 1) % len;
                (ring[i] == a && ring[j] == b) || (ring[i] == b && ring[j] == a)
            })
        })
    }

    /// All atoms that belong to at least one ring.
    pub fn ring_atoms(&self) -> BTreeSet<NodeIndex> {
        self.rings.iter().flatten().copied().collect()
    }
}

/// Cycle perception used to derive ring-aware matching flags.
pub trait RingFinder: Send + Sync {
    fn find_rings(&self, molecule: &Molecule) -> RingSet;

    fn cycle_count(&self, molecule: &Molecule) -> usize {
        self.find_rings(molecule).len()
    }
}

/// Relevant-cycle perception.
///
/// A cycle is relevant when it cannot be written as the GF(2) sum of strictly
/// shorter cycles. Candidates are the Horton cycles of the molecule graph;
/// the result is the union of all minimum cycle bases.
#[derive(Debug, Clone, Copy, Default)]
pub struct RelevantCycles;

impl RingFinder for RelevantCycles {
    fn find_rings(&self, molecule: &Molecule) -> RingSet {
        if cyclomatic_number(molecule) == 0 {
            return RingSet::default();
        }

        let num_edges = molecule.bond_count();
        let candidates = horton_candidates(molecule);

        let mut basis: Vec<Vec<u64>> = Vec::new();
        let mut rings = Vec::new();
        let mut start = 0;
        while start < candidates.len() {
            let size = candidates[start].len();
            let end = candidates[start..]
                .iter()
                .position(|ring| ring.len() != size)
                .map_or(candidates.len(), |offset| start + offset);

            let shorter = basis.clone();
            for ring in &candidates[start..end] {
                let bv = ring_to_edge_bitvector(ring, num_edges, molecule);
                if bv.iter().all(|&w| w == 0) {
                    continue;
                }
                if !is_in_cycle_space(&shorter, &bv) {
                    rings.push(ring.clone());
                    try_add_to_basis(&mut basis, bv);
                }
            }
            start = end;
        }

        RingSet { rings }
    }

    fn cycle_count(&self, molecule: &Molecule) -> usize {
        self.find_rings(molecule).len()
    }
}

/// Number of independent cycles (`E - V + C`).
pub fn cyclomatic_number(molecule: &Molecule) -> usize {
    let v = molecule.atom_count();
    let e = molecule.bond_count();
    let c = connected_components(molecule.graph());
    (e + c).saturating_sub(v)
}

fn horton_candidates(molecule: &Molecule) -> Vec<Vec<NodeIndex>> {
    let n = molecule.atom_count();
    let pred = shortest_path_trees(molecule, n);

    let mut candidates: Vec<Vec<NodeIndex>> = Vec::new();
    for (u, v, _) in molecule.bonds() {
        for w_idx in 0..n {
            let w = NodeIndex::new(w_idx);
            let (Some(path_u), Some(path_v)) = (
                reconstruct_path(&pred, w, u),
                reconstruct_path(&pred, w, v),
            ) else {
                continue;
            };
            if path_u.len() + path_v.len() < 4 {
                continue;
            }
            if path_u[1..].iter().any(|node| path_v[1..].contains(node)) {
                continue;
            }
            let mut ring = path_u;
            ring.extend(path_v[1..].iter().rev());
            candidates.push(normalize_ring(&ring));
        }
    }

    candidates.sort_by(|a, b| a.len().cmp(&b.len()).then_with(|| a.cmp(b)));
    candidates.dedup();
    candidates
}

fn shortest_path_trees(molecule: &Molecule, n: usize) -> Vec<Vec<Option<NodeIndex>>> {
    let mut pred = vec![vec![None; n]; n];
    for (src_idx, row) in pred.iter_mut().enumerate() {
        let mut visited = vec![false; n];
        visited[src_idx] = true;
        let mut queue = VecDeque::from([NodeIndex::new(src_idx)]);
        while let Some(cur) = queue.pop_front() {
            for nb in molecule.neighbors(cur) {
                if !visited[nb.index()] {
                    visited[nb.index()] = true;
                    row[nb.index()] = Some(cur);
                    queue.push_back(nb);
                }
            }
        }
    }
    pred
}

fn reconstruct_path(
    pred: &[Vec<Option<NodeIndex>>],
    src: NodeIndex,
    dst: NodeIndex,
) -> Option<Vec<NodeIndex>> {
    let mut path = vec![dst];
    let mut cur = dst;
    while cur != src {
        cur = pred[src.index()][cur.index()]?;
        path.push(cur);
    }
    path.reverse();
    Some(path)
}

fn ring_to_edge_bitvector(ring: &[NodeIndex], num_edges: usize, molecule: &Molecule) -> Vec<u64> {
    let mut bv = vec![0u64; num_edges.div_ceil(64)];
    let len = ring.len();
    for i in 0..len {
        if let Some(edge) = molecule.graph().find_edge(ring[i], ring[(i + 1) % len]) {
            let idx = edge.index();
            bv[idx / 64] |= 1u64 << (idx % 64);
        }
    }
    bv
}

fn reduce(basis: &[Vec<u64>], bv: &[u64]) -> Vec<u64> {
    let mut v = bv.to_vec();
    for row in basis {
        if let Some(p) = leading_bit(row) {
            if v[p / 64] & (1u64 << (p % 64)) != 0 {
                xor_into(&mut v, row);
            }
        }
    }
    v
}

fn is_in_cycle_space(basis: &[Vec<u64>], bv: &[u64]) -> bool {
    reduce(basis, bv).iter().all(|&w| w == 0)
}

fn try_add_to_basis(basis: &mut Vec<Vec<u64>>, candidate: Vec<u64>) -> bool {
    let v = reduce(basis, &candidate);
    if v.iter().all(|&w| w == 0) {
        return false;
    }
    basis.push(v);
    true
}

fn leading_bit(bv: &[u64]) -> Option<usize> {
    bv.iter()
        .enumerate()
        .find(|(_, word)| **word != 0)
        .map(|(i, word)| i * 64 + word.trailing_zeros() as usize)
}

fn xor_into(a: &mut [u64], b: &[u64]) {
    for (aw, bw) in a.iter_mut().zip(b) {
        *aw ^= *bw;
    }
}

fn normalize_ring(ring: &[NodeIndex]) -> Vec<NodeIndex> {
    let Some(min_pos) = ring
        .iter()
        .enumerate()
        .min_by_key(|&(_, idx)| idx)
        .map(|(i, _)| i)
    else {
        return Vec::new();
    };

    let len = ring.len();
    let mut normalized: Vec<NodeIndex> = (0..len).map(|i| ring[(min_pos + i) % len]).collect();
    if len > 2 && normalized[1] > normalized[len - 1] {
        normalized[1..].reverse();
    }
    normalized
}
