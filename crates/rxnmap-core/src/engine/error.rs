use thiserror::Error;

use crate::core::chem::standardize::StandardizeError;
use crate::core::mechanism::matrix::MatrixError;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Standardization failed: {0}")]
    Standardization(#[from] StandardizeError),

    #[error("Matching job (reactant {reactant}, product {product}) failed: {reason}")]
    MatchTask {
        reactant: usize,
        product: usize,
        reason: String,
    },

    #[error("Interrupted while waiting for {stage} results ({received} of {expected} received)")]
    InterruptedWait {
        stage: &'static str,
        received: usize,
        expected: usize,
    },

    #[error("Failed to create worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error("Bond-electron matrix error: {0}")]
    Matrix(#[from] MatrixError),

    #[error("No mapping strategy produced a result")]
    NoMapping,

    #[error("Internal logic error: {0}")]
    Internal(String),
}
