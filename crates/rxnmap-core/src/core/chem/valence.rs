use crate::core::models::element;
use crate::core::models::molecule::Molecule;
use petgraph::graph::NodeIndex;

/// Electron bookkeeping used for the diagonal of bond-electron matrices.
pub trait ValenceModel: Send + Sync {
    /// Valence electrons of `atom` not used in bonds.
    ///
    /// With `skip_hydrogen` set, bonds to hydrogen (explicit or implicit) are
    /// not subtracted, so the count matches a matrix that leaves hydrogens out.
    fn free_valence_electrons(&self, molecule: &Molecule, atom: NodeIndex, skip_hydrogen: bool) -> f64;
}

/// Valence electrons minus bonding electrons, implicit hydrogens and formal charge.
#[derive(Debug, Clone, Copy, Default)]
pub struct ElectronCounting;

impl ValenceModel for ElectronCounting {
    fn free_valence_electrons(&self, molecule: &Molecule, atom: NodeIndex, skip_hydrogen: bool) -> f64 {
        let Some(center) = molecule.atom(atom) else {
            return 0.0;
        };
        let valence = f64::from(element::valence_electrons(&center.symbol).unwrap_or(0));

        let bonding: f64 = molecule
            .bonds_of(atom)
            .filter(|(nb, _)| {
                !skip_hydrogen || !molecule.atom(*nb).is_some_and(|a| a.is_hydrogen())
            })
            .map(|(_, bond)| bond.order.electron_matrix_value())
            .sum();
        let implicit = if skip_hydrogen {
            0.0
        } else {
            f64::from(center.hydrogen_count)
        };

        valence - bonding - implicit - f64::from(center.formal_charge)
    }
}
