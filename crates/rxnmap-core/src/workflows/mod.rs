//! # Workflows Module
//!
//! High-level entry points that take a reaction from input to a finished
//! atom-atom mapping.
//!
//! ## Overview
//!
//! A workflow wires the engine together: it runs every configured mapping
//! strategy, scores the candidate mappings by the bond changes their
//! reaction matrix implies, and summarizes the mapped fragments of the
//! selected one. Progress is reported per phase through the engine's
//! [`crate::engine::progress::ProgressReporter`].
//!
//! - **Mapping Workflow** ([`map`]) - strategy fan-out, mapping selection and
//!   fragment pairing.

pub mod map;
