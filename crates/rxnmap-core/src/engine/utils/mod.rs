//! Helpers shared by the engine's worker pools.

pub mod pool;
