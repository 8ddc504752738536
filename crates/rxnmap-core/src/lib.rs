//! # rxnmap Core Library
//!
//! A concurrent atom-atom mapping engine for chemical reactions. Several
//! mapping strategies are run over the same reaction; each one breaks the
//! reaction into reactant/product molecule pairs, matches every pair in
//! parallel and consolidates the pairwise matches into a reaction mapping.
//!
//! ## Architectural Philosophy
//!
//! The library keeps the same three-layer split throughout:
//!
//! - **[`core`]: The Foundation.** Stateless data models (`Reaction`, `Molecule`,
//!   `ReactionMapping`), chemistry collaborators behind traits (matching, rings,
//!   valence, standardization), mechanism analysis (`BondElectronMatrix`, `Block`)
//!   and file I/O.
//!
//! - **[`engine`]: The Logic Core.** Job construction and deduplication, the
//!   parallel match dispatcher, result reconciliation and the strategy
//!   orchestrator. All threading lives here.
//!
//! - **[`workflows`]: The Public API.** Runs the orchestrator for a reaction,
//!   selects the best strategy and derives the bond changes and mapped fragments
//!   of the winning mapping.

pub mod core;
pub mod engine;
pub mod workflows;
