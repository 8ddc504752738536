//! Units of work executed by the engine's worker pools.
//!
//! A [`match_task::MatchTask`] is one matcher call for a representative job;
//! [`consolidate`] turns the reconciled solutions of a strategy into its
//! reaction-level mapping.

pub mod consolidate;
pub mod match_task;
