//! Reaction mechanism models built on top of an atom-atom mapping.
//!
//! - [`matrix`] - Bond-electron matrices with pivoting and canonical reordering
//! - [`reaction_matrix`] - Educt/product matrices, `R = P - E` and bond changes
//! - [`blocks`] - Signature-paired blocks of mapped atoms

pub mod blocks;
pub mod matrix;
pub mod reaction_matrix;
