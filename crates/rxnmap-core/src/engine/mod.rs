//! # Engine Module
//!
//! The concurrent mapping machinery. Everything that owns threads or mutable
//! run state lives here; the [`crate::core`] layer only supplies immutable
//! models and the chemistry collaborators.
//!
//! ## Pipeline
//!
//! For every configured [`strategy::MappingStrategy`] the
//! [`orchestrator::StrategyOrchestrator`] runs:
//!
//! 1. **Job building** ([`jobs`]) - enumerate the (reactant, product) pairs that
//!    need matching and fold pairs over identical containers into groups.
//! 2. **Dispatch** ([`dispatcher`]) - one matcher task per representative job on
//!    a bounded worker pool, collected in completion order.
//! 3. **Reconciliation** ([`reconcile`]) - project each solution onto the
//!    canonical molecules by atom id and replicate it to equivalent jobs.
//! 4. **Consolidation** ([`tasks::consolidate`]) - rank the solutions the way the
//!    strategy prefers and merge them into one reaction mapping.
//!
//! Strategies run concurrently on their own pool; a failing job or strategy is
//! logged and left out without affecting its siblings.

pub mod config;
pub mod context;
pub mod dispatcher;
pub mod error;
pub mod jobs;
pub mod orchestrator;
pub mod progress;
pub mod reconcile;
pub mod state;
pub mod strategy;
pub mod tasks;
pub(crate) mod utils;
