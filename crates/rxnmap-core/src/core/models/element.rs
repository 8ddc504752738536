use phf::{Map, Set, phf_map, phf_set};

static VALENCE_ELECTRONS: Map<&'static str, u8> = phf_map! {
    "H" => 1, "D" => 1, "T" => 1,
    "Li" => 1, "Na" => 1, "K" => 1, "Rb" => 1, "Cs" => 1,
    "Be" => 2, "Mg" => 2, "Ca" => 2, "Sr" => 2, "Ba" => 2, "Zn" => 2, "Cd" => 2, "Hg" => 2,
    "B" => 3, "Al" => 3, "Ga" => 3, "In" => 3,
    "C" => 4, "Si" => 4, "Ge" => 4, "Sn" => 4, "Pb" => 4,
    "N" => 5, "P" => 5, "As" => 5, "Sb" => 5, "Bi" => 5,
    "O" => 6, "S" => 6, "Se" => 6, "Te" => 6,
    "F" => 7, "Cl" => 7, "Br" => 7, "I" => 7, "At" => 7,
    "He" => 2, "Ne" => 8, "Ar" => 8, "Kr" => 8, "Xe" => 8,
};

static DEFAULT_VALENCE: Map<&'static str, u8> = phf_map! {
    "H" => 1, "D" => 1, "T" => 1,
    "B" => 3, "C" => 4, "Si" => 4,
    "N" => 3, "P" => 3, "As" => 3,
    "O" => 2, "S" => 2, "Se" => 2,
    "F" => 1, "Cl" => 1, "Br" => 1, "I" => 1,
};

static HYDROGEN_SYMBOLS: Set<&'static str> = phf_set! { "H", "D", "T" };

/// Number of valence-shell electrons of a neutral atom of `symbol`.
///
/// Returns `None` for symbols outside the main-group table (transition metals,
/// pseudo-atoms such as `R` or `*`).
pub fn valence_electrons(symbol: &str) -> Option<u8> {
    VALENCE_ELECTRONS.get(symbol.trim()).copied()
}

/// Usual number of bonds formed by a neutral atom of `symbol`.
pub fn default_valence(symbol: &str) -> Option<u8> {
    DEFAULT_VALENCE.get(symbol.trim()).copied()
}

/// Implicit hydrogens needed to fill the usual valence of an atom.
///
/// Electron-rich elements (N, O, halogens...) gain a bond per positive charge
/// and lose one per negative charge; the others lose a bond per unit of charge
/// either way. Unknown elements get no hydrogens.
pub fn implicit_hydrogens(symbol: &str, formal_charge: i8, bond_order_sum: f64) -> u8 {
    let (Some(valence), Some(electrons)) = (default_valence(symbol), valence_electrons(symbol)) else {
        return 0;
    };
    let valence = i32::from(valence);
    let charge = i32::from(formal_charge);
    let target = if electrons >= 5 {
        valence + charge
    } else {
        valence - charge.abs()
    };
    let missing = target - bond_order_sum.round() as i32;
    missing.clamp(0, i32::from(u8::MAX)) as u8
}

pub fn is_hydrogen(symbol: &str) -> bool {
    HYDROGEN_SYMBOLS.contains(symbol.trim())
}

pub fn is_known_element(symbol: &str) -> bool {
    VALENCE_ELECTRONS.contains_key(symbol.trim())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valence_electrons_follow_main_group_columns() {
        assert_eq!(valence_electrons("C"), Some(4));
        assert_eq!(valence_electrons("N"), Some(5));
        assert_eq!(valence_electrons("O"), Some(6));
        assert_eq!(valence_electrons("Cl"), Some(7));
        assert_eq!(valence_electrons(" S "), Some(6));
    }

    #[test]
    fn unknown_symbols_have_no_valence_entry() {
        assert_eq!(valence_electrons("R"), None);
        assert_eq!(valence_electrons("Fe"), None);
        assert!(!is_known_element("*"));
    }

    #[test]
    fn implicit_hydrogens_fill_the_default_valence() {
        assert_eq!(implicit_hydrogens("C", 0, 1.0), 3);
        assert_eq!(implicit_hydrogens("C", 0, 4.0), 0);
        assert_eq!(implicit_hydrogens("O", 0, 1.0), 1);
        assert_eq!(implicit_hydrogens("N", 1, 0.0), 4);
        assert_eq!(implicit_hydrogens("O", -1, 1.0), 0);
        assert_eq!(implicit_hydrogens("C", 0, 5.0), 0);
        assert_eq!(implicit_hydrogens("Fe", 0, 0.0), 0);
    }

    #[test]
    fn hydrogen_isotopes_are_recognized() {
        assert!(is_hydrogen("H"));
        assert!(is_hydrogen("D"));
        assert!(is_hydrogen("T"));
        assert!(!is_hydrogen("He"));
        assert!(!is_hydrogen("Hg"));
    }
}
