use super::context::ReactionContainer;
use itertools::iproduct;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use tracing::debug;

/// A (reactant index, product index) pair that needs a structural match.
///
/// Jobs order lexicographically, reactant index first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Job {
    pub reactant: usize,
    pub product: usize,
}

impl Job {
    pub fn new(reactant: usize, product: usize) -> Self {
        Self { reactant, product }
    }
}

impl fmt::Display for Job {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.reactant, self.product)
    }
}

/// Representative job mapped to the jobs that re-match the same two containers.
pub type JobGroups = BTreeMap<Job, BTreeSet<Job>>;

/// Enumerates the pairs that need matching, in row-major order.
///
/// A pair qualifies when both molecules have atoms (or the similarity matrix
/// forces it) and at least one of the two molecules is modified.
pub fn candidate_jobs(container: &ReactionContainer) -> BTreeSet<Job> {
    iproduct!(0..container.educt_count(), 0..container.product_count())
        .filter(|&(r, p)| {
            let non_trivial = match (container.educt(r), container.product(p)) {
                (Some(educt), Some(product)) => !educt.is_empty() && !product.is_empty(),
                _ => false,
            };
            let forced = container.similarity().forces_inclusion(r, p);
            (non_trivial || forced)
                && (container.is_educt_modified(r) || container.is_product_modified(p))
        })
        .map(|(r, p)| Job::new(r, p))
        .collect()
}

/// Folds candidates into groups of jobs over identical containers.
///
/// Two jobs share a group when their reactant slots hold the same molecule id,
/// their product slots hold the same molecule id and the atom counts agree.
/// Structurally identical but distinct molecules are never merged.
pub fn group_jobs(container: &ReactionContainer, candidates: &BTreeSet<Job>) -> JobGroups {
    let mut groups = JobGroups::new();
    for &job in candidates {
        let representative = groups
            .keys()
            .copied()
            .find(|&key| same_containers(container, key, job));
        match representative {
            Some(key) => {
                if let Some(members) = groups.get_mut(&key) {
                    members.insert(job);
                }
            }
            None => {
                groups.insert(job, BTreeSet::new());
            }
        }
    }
    groups
}

fn same_containers(container: &ReactionContainer, a: Job, b: Job) -> bool {
    let same_ids = container.educt_id(a.reactant).is_some()
        && container.educt_id(a.reactant) == container.educt_id(b.reactant)
        && container.product_id(a.product).is_some()
        && container.product_id(a.product) == container.product_id(b.product);
    let atoms = |job: Job| {
        (
            container.educt(job.reactant).map(|m| m.atom_count()),
            container.product(job.product).map(|m| m.atom_count()),
        )
    };
    same_ids && atoms(a) == atoms(b)
}

/// Builds the job groups of one strategy run.
pub fn build(container: &ReactionContainer) -> JobGroups {
    let candidates = candidate_jobs(container);
    if candidates.is_empty() {
        return JobGroups::new();
    }
    let groups = group_jobs(container, &candidates);
    debug!(
        candidates = candidates.len(),
        groups = groups.len(),
        "Built matching jobs."
    );
    groups
}
