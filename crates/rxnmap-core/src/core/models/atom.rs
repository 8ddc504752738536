use super::element;
use nalgebra::Point2;

/// Represents an atom of a molecule taking part in a reaction.
///
/// The `id` is the atom's stable identity: it survives copying a molecule
/// (for example when hydrogens are stripped before matching) and is the key
/// used to re-locate an atom in its canonical molecule after matching.
#[derive(Debug, Clone, PartialEq)]
pub struct Atom {
    /// Stable identifier, unique within a reaction (e.g., "a1", "r0.3").
    pub id: String,
    /// Element symbol (e.g., "C", "Cl").
    pub symbol: String,
    /// Formal charge in elementary charge units.
    pub formal_charge: i8,
    /// Number of implicit hydrogens carried by this atom.
    pub hydrogen_count: u8,
    /// Whether the atom is flagged aromatic by the input.
    pub is_aromatic: bool,
    /// Optional 2-D depiction coordinates.
    pub position: Option<Point2<f64>>,
}

impl Atom {
    /// Creates a new neutral `Atom` without implicit hydrogens or coordinates.
    ///
    /// # Arguments
    ///
    /// * `id` - The stable identifier of the atom.
    /// * `symbol` - The element symbol.
    pub fn new(id: &str, symbol: &str) -> Self {
        Self {
            id: id.to_string(),
            symbol: symbol.to_string(),
            formal_charge: 0,
            hydrogen_count: 0,
            is_aromatic: false,
            position: None,
        }
    }

    pub fn with_position(mut self, x: f64, y: f64) -> Self {
        self.position = Some(Point2::new(x, y));
        self
    }

    pub fn with_hydrogens(mut self, count: u8) -> Self {
        self.hydrogen_count = count;
        self
    }

    pub fn with_charge(mut self, charge: i8) -> Self {
        self.formal_charge = charge;
        self
    }

    pub fn is_hydrogen(&self) -> bool {
        element::is_hydrogen(&self.symbol)
    }
}
