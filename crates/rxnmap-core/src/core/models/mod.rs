//! # Core Models Module
//!
//! Data structures for the molecules and reactions handled by the mapping engine.
//!
//! ## Key Components
//!
//! - [`atom`] - Atom with stable id, element, charge and implicit hydrogens
//! - [`element`] - Static element tables (valence electrons, hydrogen isotopes)
//! - [`topology`] - Bond order and bond stereo payloads
//! - [`molecule`] - Graph-backed molecule (atom container)
//! - [`reaction`] - Reaction sides over a pool of molecules addressed by [`ids::MoleculeId`]
//! - [`mapping`] - Atom-atom mappings between two molecules and across a reaction
//!
//! ## Usage
//!
//! ```ignore
//! use rxnmap::core::models::{atom::Atom, molecule::Molecule, reaction::Reaction, topology::Bond};
//!
//! let mut ethanol = Molecule::new("ethanol");
//! let c1 = ethanol.add_atom(Atom::new("c1", "C"));
//! let c2 = ethanol.add_atom(Atom::new("c2", "C"));
//! ethanol.add_bond(c1, c2, Bond::default())?;
//!
//! let mut reaction = Reaction::new();
//! reaction.add_reactant(ethanol);
//! ```

pub mod atom;
pub mod element;
pub mod ids;
pub mod mapping;
pub mod molecule;
pub mod reaction;
pub mod topology;
