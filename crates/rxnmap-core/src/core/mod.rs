//! # Core Module
//!
//! Stateless building blocks of the mapping engine.
//!
//! - **Reaction model** ([`models`]) - Atoms, molecules, reactions and atom-atom mappings
//! - **Chemistry collaborators** ([`chem`]) - Ring perception, substructure matching,
//!   subgraph signatures, valence and standardization
//! - **Mechanism analysis** ([`mechanism`]) - Bond-electron matrices, reaction matrices
//!   and mapped fragment blocks
//! - **File I/O** ([`io`]) - TOML reaction documents, MDL RXN files and mapping tables
//!
//! Nothing in this layer owns threads. Every type is either immutable after
//! construction or cheap to clone, so the [`crate::engine`] can share inputs
//! freely across its worker pools.

pub mod chem;
pub mod io;
pub mod mechanism;
pub mod models;
