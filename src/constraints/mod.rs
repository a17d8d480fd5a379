//! Constraint value types and bounded multiplier wrappers.

pub mod bounded;
pub mod value;

pub use bounded::{
    clamp_accumulated, BoundedFreeConstraint1D, BoundedNormalConstraint1D,
    BoundedShockAbsorberConstraint, NormalConstraint, MAX_IMPULSE,
};
pub use value::{
    GenericLineEqualityConstraint, ImpulseAccumulator, LineEqualityConstraint, NormalImpulse,
    PlaneEqualityConstraint, PlaneInequalityConstraint, PointEqualityConstraint,
    ShockAbsorberConstraint, BAUMGARTE_BETA, PENETRATION_SLOP,
};
