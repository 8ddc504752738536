//! Chemistry collaborators consumed by the mapping engine.
//!
//! Each concern is a narrow trait with one compact default implementation:
//!
//! - [`standardize`] - [`standardize::Standardizer`] / [`standardize::BasicStandardizer`]
//! - [`matcher`] - [`matcher::SubstructureMatcher`] / [`matcher::BacktrackingMcs`]
//! - [`rings`] - [`rings::RingFinder`] / [`rings::RelevantCycles`]
//! - [`valence`] - [`valence::ValenceModel`] / [`valence::ElectronCounting`]
//! - [`signature`] - canonical signatures of atom subsets

pub mod matcher;
pub mod rings;
pub mod signature;
pub mod standardize;
pub mod valence;
