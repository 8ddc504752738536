use super::context::ReactionContainer;
use super::jobs::JobGroups;
use super::state::MatchResult;
use crate::core::models::mapping::AtomAtomMapping;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

/// Projects dispatcher results onto the canonical molecules.
///
/// Each result is matched to its job group by the job indices it carries.
/// Every mapped pair is re-located in the canonical reactant and product by
/// atom id; a pair that cannot be re-located is dropped with a warning. The
/// group is consumed, so it is reconciled once, and the projected result is
/// reported for the representative and every equivalent job.
#[instrument(skip_all, name = "reconcile", fields(results = raw.len(), groups = groups.len()))]
pub fn reconcile(
    container: &ReactionContainer,
    mut groups: JobGroups,
    raw: Vec<MatchResult>,
) -> Arc<[MatchResult]> {
    let mut reconciled = Vec::with_capacity(raw.len());

    for result in raw {
        let job = result.job();
        let Some(equivalents) = groups.remove(&job) else {
            debug!(job = %job, "Result has no open job group; skipping.");
            continue;
        };
        let Some(projected) = project(container, &result) else {
            warn!(job = %job, "Job refers to molecules outside the reaction; result dropped.");
            continue;
        };
        reconciled.extend(equivalents.iter().map(|&other| projected.for_job(other)));
        reconciled.push(projected);
    }

    reconciled.sort_by_key(MatchResult::job);
    reconciled.into()
}

fn project(container: &ReactionContainer, result: &MatchResult) -> Option<MatchResult> {
    let matched_reactant = container.educt(result.reactant_index)?;
    let matched_product = container.product(result.product_index)?;
    let reactant = container.canonical_educt(result.reactant_index)?;
    let product = container.canonical_product(result.product_index)?;

    let mut mapping = AtomAtomMapping::new();
    for (q, t) in result.mapping.iter() {
        let reactant_atom = matched_reactant
            .atom(q)
            .and_then(|atom| reactant.find_atom(&atom.id));
        let product_atom = matched_product
            .atom(t)
            .and_then(|atom| product.find_atom(&atom.id));
        match (reactant_atom, product_atom) {
            (Some(a), Some(b)) => {
                mapping.insert(a, b);
            }
            _ => warn!(
                job = %result.job(),
                reactant_atom = q.index(),
                product_atom = t.index(),
                "Mapped atom could not be re-located by id; pair dropped."
            ),
        }
    }

    Some(MatchResult {
        mapping,
        ..result.clone()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::atom::Atom;
    use crate::core::models::molecule::Molecule;
    use crate::core::models::reaction::{Reaction, ReactionSide};
    use crate::core::models::topology::Bond;
    use crate::engine::jobs::{self, Job};
    use petgraph::graph::NodeIndex;
    use std::collections::BTreeSet;

    fn hydroxy(name: &str) -> Molecule {
        let mut mol = Molecule::new(name);
        let c = mol.add_atom(Atom::new(&format!("{name}c"), "C"));
        let o = mol.add_atom(Atom::new(&format!("{name}o"), "O"));
        let h = mol.add_atom(Atom::new(&format!("{name}h"), "H"));
        mol.add_bond(c, o, Bond::default()).unwrap();
        mol.add_bond(o, h, Bond::default()).unwrap();
        mol
    }

    fn amine(name: &str) -> Molecule {
        let mut mol = Molecule::new(name);
        let h = mol.add_atom(Atom::new(&format!("{name}h"), "H"));
        let c = mol.add_atom(Atom::new(&format!("{name}c"), "C"));
        let n = mol.add_atom(Atom::new(&format!("{name}n"), "N"));
        mol.add_bond(h, n, Bond::default()).unwrap();
        mol.add_bond(c, n, Bond::default()).unwrap();
        mol
    }

    fn raw(container: &ReactionContainer, job: Job, pairs: &[(usize, usize)]) -> MatchResult {
        MatchResult {
            reactant_index: job.reactant,
            product_index: job.product,
            reactant: container.educt_id(job.reactant).unwrap(),
            product: container.product_id(job.product).unwrap(),
            mapping: pairs
                .iter()
                .map(|&(q, t)| (NodeIndex::new(q), NodeIndex::new(t)))
                .collect(),
        }
    }

    #[test]
    fn atoms_are_relocated_in_the_hydrogenated_molecules() {
        let mut reaction = Reaction::new();
        reaction.add_reactant(hydroxy("r"));
        reaction.add_product(amine("p"));
        let container = ReactionContainer::new(reaction, true);
        let groups = jobs::build(&container);

        // Matcher copies are C(0)-O(1) and C(0)-N(1); the canonical product starts with H.
        let results = reconcile(&container, groups, vec![raw(&container, Job::new(0, 0), &[(0, 0)])]);

        assert_eq!(results.len(), 1);
        let mapping = &results[0].mapping;
        assert_eq!(mapping.get(NodeIndex::new(0)), Some(NodeIndex::new(1)));
    }

    #[test]
    fn shared_containers_are_reported_for_every_job() {
        let mut reaction = Reaction::new();
        let r = reaction.add_reactant(hydroxy("r"));
        reaction.add_ref(ReactionSide::Reactant, r).unwrap();
        reaction.add_product(amine("p"));
        let container = ReactionContainer::new(reaction, false);
        let groups = jobs::build(&container);
        assert_eq!(groups.len(), 1);

        let results = reconcile(&container, groups, vec![raw(&container, Job::new(0, 0), &[(0, 1)])]);

        let jobs: BTreeSet<Job> = results.iter().map(MatchResult::job).collect();
        assert_eq!(jobs, BTreeSet::from([Job::new(0, 0), Job::new(1, 0)]));
        assert_eq!(results[0].mapping, results[1].mapping);
    }

    #[test]
    fn each_group_is_reconciled_once() {
        let mut reaction = Reaction::new();
        reaction.add_reactant(hydroxy("r"));
        reaction.add_product(amine("p"));
        let container = ReactionContainer::new(reaction, false);
        let groups = jobs::build(&container);

        let first = raw(&container, Job::new(0, 0), &[(0, 1)]);
        let results = reconcile(&container, groups, vec![first.clone(), first]);
        assert_eq!(results.len(), 1);
    }

    #[test]
    fn unknown_atoms_drop_only_their_pair() {
        let mut reaction = Reaction::new();
        reaction.add_reactant(hydroxy("r"));
        reaction.add_product(amine("p"));
        let container = ReactionContainer::new(reaction, false);
        let groups = jobs::build(&container);

        let results = reconcile(
            &container,
            groups,
            vec![raw(&container, Job::new(0, 0), &[(0, 1), (1, 9)])],
        );
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].mapping.len(), 1);
    }

    #[test]
    fn results_without_a_group_are_ignored() {
        let mut reaction = Reaction::new();
        reaction.add_reactant(hydroxy("r"));
        reaction.add_product(amine("p"));
        let container = ReactionContainer::new(reaction, false);

        let results = reconcile(
            &container,
            JobGroups::new(),
            vec![raw(&container, Job::new(0, 0), &[(0, 1)])],
        );
        assert!(results.is_empty());
    }
}
