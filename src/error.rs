//! Error types raised by the contact solver.
//!
//! Every error is a violated local precondition. The solver never recovers
//! from one; it is propagated to the physics step that built the contact
//! list, which decides whether to abort or drop the frame.

use thiserror::Error;

/// Errors that can occur while building or solving contacts.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SolverError {
    /// An applied or accumulated impulse exceeded the stability limit.
    #[error("impulse blow-up: lambda = {lambda}, lambda_total = {lambda_total} (limit {limit})")]
    ImpulseOverflow {
        /// Impulse applied in the current iteration.
        lambda: f32,
        /// Accumulated impulse after clamping.
        lambda_total: f32,
        /// Magnitude limit that was exceeded.
        limit: f32,
    },

    /// Impulse bounds are inverted.
    #[error("lower impulse bound ({min}) exceeds upper bound ({max})")]
    InvertedBounds {
        /// Lower bound.
        min: f32,
        /// Upper bound.
        max: f32,
    },

    /// A friction clamping bound is outside the admissible range.
    #[error("clamping bound {value} exceeds the admissible magnitude {limit}")]
    ClampingOutOfRange {
        /// Offending bound.
        value: f32,
        /// Largest admissible magnitude.
        limit: f32,
    },

    /// Exactly one of the two friction coefficients is NaN.
    #[error(
        "inconsistent NaN-ness of friction coefficients: \
         stiction = {stiction}, friction = {friction}"
    )]
    InconsistentFriction {
        /// Static coefficient.
        stiction: f32,
        /// Sliding coefficient.
        friction: f32,
    },

    /// A contact references an entity without a `RigidBodyPulses` component.
    #[error("entity {0:?} has no rigid body in the solver arena")]
    MissingBody(hecs::Entity),

    /// A tire contact references a tire the vehicle does not have.
    #[error("vehicle has no tire with id {0}")]
    UnknownTire(usize),
}

/// Result alias used throughout the solver.
pub type SolverResult<T> = Result<T, SolverError>;
