use super::rings::{RelevantCycles, RingFinder, RingSet};
use crate::core::models::mapping::AtomAtomMapping;
use crate::core::models::molecule::Molecule;
use petgraph::graph::NodeIndex;
use std::collections::{HashMap, VecDeque};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MatchError {
    #[error("Molecule '{name}' has {atoms} atoms, exceeding the matcher limit of {limit}")]
    TooLarge {
        name: String,
        atoms: usize,
        limit: usize,
    },
    #[error("Subgraph search exceeded its budget of {0} steps")]
    BudgetExhausted(u64),
}

/// Feature switches for one matching call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchOptions {
    /// Bonds present on both sides must have the same order.
    pub match_bonds: bool,
    /// Ring atoms only match ring atoms.
    pub match_rings: bool,
    /// Both sides have the same number of rings, so ring bonds may be required
    /// to map onto ring bonds.
    pub perfect_rings: bool,
    /// Full branch-and-bound search instead of a single greedy descent.
    pub exhaustive: bool,
    /// Maximum number of search nodes visited by the exhaustive search.
    pub step_budget: u64,
    /// Largest molecule the matcher accepts.
    pub atom_limit: usize,
}

impl MatchOptions {
    pub const DEFAULT_STEP_BUDGET: u64 = 200_000;
    pub const DEFAULT_ATOM_LIMIT: usize = 1_000;
}

impl Default for MatchOptions {
    fn default() -> Self {
        Self {
            match_bonds: false,
            match_rings: false,
            perfect_rings: false,
            exhaustive: true,
            step_budget: Self::DEFAULT_STEP_BUDGET,
            atom_limit: Self::DEFAULT_ATOM_LIMIT,
        }
    }
}

/// Common-substructure search between two molecules.
pub trait SubstructureMatcher: Send + Sync {
    /// Finds the best partial atom-atom mapping from `query` onto `target`.
    fn find_mcs(
        &self,
        query: &Molecule,
        target: &Molecule,
        options: &MatchOptions,
    ) -> Result<AtomAtomMapping, MatchError>;

    /// Tests whether the smaller of the two molecules embeds into the larger one.
    fn is_subgraph(
        &self,
        first: &Molecule,
        second: &Molecule,
        options: &MatchOptions,
    ) -> Result<bool, MatchError>;
}

/// Branch-and-bound common-substructure matcher over element labels.
///
/// A mapping is scored by the number of bonds it conserves, then by the number
/// of atoms it maps. Bonds present on one side only are allowed (they are the
/// bonds made or broken by the reaction) but do not score.
#[derive(Debug, Clone, Copy, Default)]
pub struct BacktrackingMcs;

type Score = (usize, usize);

impl SubstructureMatcher for BacktrackingMcs {
    fn find_mcs(
        &self,
        query: &Molecule,
        target: &Molecule,
        options: &MatchOptions,
    ) -> Result<AtomAtomMapping, MatchError> {
        check_size(query, options)?;
        check_size(target, options)?;

        let problem = Problem::new(query, target, options, false);
        let mut state = problem.initial_state();
        problem.greedy(&mut state);
        let mut best = (state.score(), state.q_map.clone());

        if options.exhaustive {
            let mut state = problem.initial_state();
            if problem.search(0, &mut state, &mut best).is_none() {
                debug!(
                    query = query.name(),
                    target = target.name(),
                    budget = options.step_budget,
                    "MCS search budget exhausted; keeping best mapping found so far."
                );
            }
        }

        Ok(best
            .1
            .iter()
            .enumerate()
            .filter_map(|(q, t)| t.map(|t| (NodeIndex::new(q), t)))
            .collect())
    }

    fn is_subgraph(
        &self,
        first: &Molecule,
        second: &Molecule,
        options: &MatchOptions,
    ) -> Result<bool, MatchError> {
        check_size(first, options)?;
        check_size(second, options)?;

        let (query, target) = if (first.atom_count(), first.bond_count())
            <= (second.atom_count(), second.bond_count())
        {
            (first, second)
        } else {
            (second, first)
        };
        if query.bond_count() > target.bond_count() {
            return Ok(false);
        }

        let problem = Problem::new(query, target, options, true);
        let mut state = problem.initial_state();
        problem
            .embed(0, &mut state)
            .ok_or(MatchError::BudgetExhausted(options.step_budget))
    }
}

fn check_size(molecule: &Molecule, options: &MatchOptions) -> Result<(), MatchError> {
    if molecule.atom_count() > options.atom_limit {
        return Err(MatchError::TooLarge {
            name: molecule.name().to_string(),
            atoms: molecule.atom_count(),
            limit: options.atom_limit,
        });
    }
    Ok(())
}

struct Problem<'a> {
    query: &'a Molecule,
    target: &'a Molecule,
    options: &'a MatchOptions,
    strict: bool,
    order: Vec<NodeIndex>,
    q_label: Vec<usize>,
    t_label: Vec<usize>,
    label_count: usize,
    q_rings: Option<RingSet>,
    t_rings: Option<RingSet>,
    undecided_edges: Vec<usize>,
}

struct State {
    q_map: Vec<Option<NodeIndex>>,
    t_used: Vec<bool>,
    q_left: Vec<usize>,
    t_left: Vec<usize>,
    mapped: usize,
    conserved: usize,
    steps: u64,
}

impl State {
    fn score(&self) -> Score {
        (self.conserved, self.mapped)
    }
}

impl<'a> Problem<'a> {
    fn new(
        query: &'a Molecule,
        target: &'a Molecule,
        options: &'a MatchOptions,
        strict: bool,
    ) -> Self {
        let mut labels: HashMap<&str, usize> = HashMap::new();
        let mut label_of = |mol: &'a Molecule| -> Vec<usize> {
            mol.atoms()
                .map(|(_, atom)| {
                    let next = labels.len();
                    *labels.entry(atom.symbol.as_str()).or_insert(next)
                })
                .collect()
        };
        let q_label = label_of(query);
        let t_label = label_of(target);
        let label_count = labels.len();

        let (q_rings, t_rings) = if options.match_rings {
            (
                Some(RelevantCycles.find_rings(query)),
                Some(RelevantCycles.find_rings(target)),
            )
        } else {
            (None, None)
        };

        let order = search_order(query);
        let mut position = vec![0; query.atom_count()];
        for (pos, idx) in order.iter().enumerate() {
            position[idx.index()] = pos;
        }
        let mut undecided_edges = vec![0; order.len() + 1];
        for (a, b, _) in query.bonds() {
            undecided_edges[position[a.index()].max(position[b.index()])] += 1;
        }
        for d in (0..order.len()).rev() {
            undecided_edges[d] += undecided_edges[d + 1];
        }

        Self {
            query,
            target,
            options,
            strict,
            order,
            q_label,
            t_label,
            label_count,
            q_rings,
            t_rings,
            undecided_edges,
        }
    }

    fn initial_state(&self) -> State {
        let mut q_left = vec![0; self.label_count];
        let mut t_left = vec![0; self.label_count];
        for &label in &self.q_label {
            q_left[label] += 1;
        }
        for &label in &self.t_label {
            t_left[label] += 1;
        }
        State {
            q_map: vec![None; self.query.atom_count()],
            t_used: vec![false; self.target.atom_count()],
            q_left,
            t_left,
            mapped: 0,
            conserved: 0,
            steps: 0,
        }
    }

    fn compatible(&self, q: NodeIndex, t: NodeIndex) -> bool {
        if self.q_label[q.index()] != self.t_label[t.index()] {
            return false;
        }
        match (&self.q_rings, &self.t_rings) {
            (Some(qr), Some(tr)) => qr.is_ring_atom(q) == tr.is_ring_atom(t),
            _ => true,
        }
    }

    /// Number of bonds conserved by adding `q -> t`, or `None` if the pair
    /// contradicts a bond between already mapped atoms.
    fn gain(&self, state: &State, q: NodeIndex, t: NodeIndex) -> Option<usize> {
        let mut gain = 0;
        for (qn, q_bond) in self.query.bonds_of(q) {
            let Some(tn) = state.q_map[qn.index()] else {
                continue;
            };
            let Some(t_bond) = self.target.bond_between(t, tn) else {
                if self.strict {
                    return None;
                }
                continue;
            };
            if self.options.match_bonds && q_bond.order != t_bond.order {
                return None;
            }
            if self.options.perfect_rings {
                if let (Some(qr), Some(tr)) = (&self.q_rings, &self.t_rings) {
                    if qr.is_ring_bond(q, qn) != tr.is_ring_bond(t, tn) {
                        return None;
                    }
                }
            }
            gain += 1;
        }
        Some(gain)
    }

    fn candidates(&self, state: &State, q: NodeIndex) -> Vec<(usize, NodeIndex)> {
        let mut candidates: Vec<(usize, NodeIndex)> = self
            .target
            .atom_indices()
            .filter(|t| !state.t_used[t.index()] && self.compatible(q, *t))
            .filter_map(|t| self.gain(state, q, t).map(|g| (g, t)))
            .collect();
        let q_degree = self.query.degree(q);
        candidates.sort_by_key(|&(gain, t)| {
            (
                std::cmp::Reverse(gain),
                q_degree.abs_diff(self.target.degree(t)),
                t,
            )
        });
        candidates
    }

    fn assign(&self, state: &mut State, q: NodeIndex, t: NodeIndex, gain: usize) {
        state.q_map[q.index()] = Some(t);
        state.t_used[t.index()] = true;
        state.t_left[self.t_label[t.index()]] -= 1;
        state.mapped += 1;
        state.conserved += gain;
    }

    fn unassign(&self, state: &mut State, q: NodeIndex, t: NodeIndex, gain: usize) {
        state.q_map[q.index()] = None;
        state.t_used[t.index()] = false;
        state.t_left[self.t_label[t.index()]] += 1;
        state.mapped -= 1;
        state.conserved -= gain;
    }

    fn bound(&self, state: &State, depth: usize) -> Score {
        let atoms: usize = state
            .q_left
            .iter()
            .zip(&state.t_left)
            .map(|(q, t)| (*q).min(*t))
            .sum();
        (
            state.conserved + self.undecided_edges[depth],
            state.mapped + atoms,
        )
    }

    fn greedy(&self, state: &mut State) {
        for &q in &self.order {
            state.q_left[self.q_label[q.index()]] -= 1;
            if let Some(&(gain, t)) = self.candidates(state, q).first() {
                self.assign(state, q, t, gain);
            }
        }
    }

    /// Returns `None` once the step budget is exhausted.
    fn search(
        &self,
        depth: usize,
        state: &mut State,
        best: &mut (Score, Vec<Option<NodeIndex>>),
    ) -> Option<()> {
        state.steps += 1;
        if state.steps > self.options.step_budget {
            return None;
        }
        if depth == self.order.len() {
            if state.score() > best.0 {
                *best = (state.score(), state.q_map.clone());
            }
            return Some(());
        }
        if self.bound(state, depth) <= best.0 {
            return Some(());
        }

        let q = self.order[depth];
        let label = self.q_label[q.index()];
        state.q_left[label] -= 1;

        for (gain, t) in self.candidates(state, q) {
            self.assign(state, q, t, gain);
            let outcome = self.search(depth + 1, state, best);
            self.unassign(state, q, t, gain);
            outcome?;
        }
        let outcome = self.search(depth + 1, state, best);

        state.q_left[label] += 1;
        outcome
    }

    /// Complete embedding of the query: every atom mapped, every bond kept.
    fn embed(&self, depth: usize, state: &mut State) -> Option<bool> {
        state.steps += 1;
        if state.steps > self.options.step_budget {
            return None;
        }
        if depth == self.order.len() {
            return Some(true);
        }

        let q = self.order[depth];
        for (gain, t) in self.candidates(state, q) {
            self.assign(state, q, t, gain);
            let found = self.embed(depth + 1, state);
            self.unassign(state, q, t, gain);
            if found != Some(false) {
                return found;
            }
        }
        Some(false)
    }
}

/// Breadth-first atom order, starting each component at its highest-degree atom.
fn search_order(molecule: &Molecule) -> Vec<NodeIndex> {
    let n = molecule.atom_count();
    let mut visited = vec![false; n];
    let mut order = Vec::with_capacity(n);

    let mut seeds: Vec<NodeIndex> = molecule.atom_indices().collect();
    seeds.sort_by(|a, b| {
        molecule
            .degree(*b)
            .cmp(&molecule.degree(*a))
            .then(a.cmp(b))
    });

    for seed in seeds {
        if visited[seed.index()] {
            continue;
        }
        visited[seed.index()] = true;
        let mut queue = VecDeque::from([seed]);
        while let Some(cur) = queue.pop_front() {
            order.push(cur);
            let mut neighbors: Vec<NodeIndex> = molecule.neighbors(cur).collect();
            neighbors.sort();
            for nb in neighbors {
                if !visited[nb.index()] {
                    visited[nb.index()] = true;
                    queue.push_back(nb);
                }
            }
        }
    }
    order
}
