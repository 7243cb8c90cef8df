//! Error taxonomy shared across the crate.
//!
//! Nothing in the core panics on user-data errors; only logic-invariant failures
//! (cell determinant zero after a finished mutation, history index out of range)
//! are fatal and surface as a `panic!`/`debug_assert!` at the call site instead of
//! a variant here.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, XtalError>;

#[derive(Debug, Error)]
pub enum XtalError {
    /// Invalid settings: probabilities not summing to 100, a missing template, etc.
    /// Logged, then the caller refuses to start.
    #[error("config error: {0}")]
    ConfigError(String),

    /// Spacegroup-mode (or box-mode) generation could not fit the requested
    /// composition. Callers retry locally, then fall back to random generation.
    #[error("generation failure: {0}")]
    GenerationFailure(String),

    /// A structure fails the interatomic-distance check post-optimization.
    #[error("radii violation: {0}")]
    RadiiViolation(String),

    /// The optimizer adapter returned `Failed` for a step.
    #[error("step failure at step {step}: {reason}")]
    StepFailure { step: u32, reason: String },

    /// Non-numeric objective output, or a NaN/Inf value.
    #[error("oracle failure: {0}")]
    OracleFailure(String),

    /// Niggli reduction did not converge within `max_iters`.
    #[error("niggli reduction did not converge after {iters} iterations")]
    NiggliExhaustion { iters: u32 },

    /// RDF dot-product exceeded the similarity threshold.
    #[error("similarity collision with tag {existing_tag} (dot = {dot:.6})")]
    SimilarityCollision { existing_tag: String, dot: f64 },
}
