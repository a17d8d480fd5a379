//! Rein contact constraint solver
//!
//! A sequential-impulse (projected Gauss-Seidel) solver for rigid-body
//! contacts, joints, suspensions and tires.
//!
//! # Architecture
//!
//! The library is organized into layers, leaves first:
//!
//! 1. **body** - Per-sub-step rigid body state (`RigidBodyPulses`) stored in a `hecs::World`
//! 2. **constraints** - Constraint value types and bounded multiplier wrappers
//! 3. **contact** - Contact-info objects resolving one constraint over one or two bodies
//! 4. **tire** - Magic-formula tire model and the vehicle-side `TireHost`
//! 5. **solver** - `solve_contacts` iteration driver
//! 6. **config** - Solver and engine parameters
//!
//! Contacts are rebuilt by the caller for every sub-step; nothing persists
//! across `solve_contacts` calls.

pub mod body;
pub mod config;
pub mod constraints;
pub mod contact;
pub mod error;
pub mod solver;
pub mod tire;

// Re-export commonly used types
pub use body::{reduced_mass, RigidBodyPulses, VectorAtPosition};

pub use config::{PhysicsEngineConfig, SolverConfig};

pub use constraints::{
    BoundedFreeConstraint1D, BoundedNormalConstraint1D, BoundedShockAbsorberConstraint,
    GenericLineEqualityConstraint, ImpulseAccumulator, LineEqualityConstraint, NormalImpulse,
    PlaneEqualityConstraint, PlaneInequalityConstraint, PointEqualityConstraint,
    ShockAbsorberConstraint,
};

pub use contact::{
    ContactInfo, FrictionClamping, FrictionContactInfo1, FrictionContactInfo2, LineContactInfo1,
    LineContactInfo2, NormalContactInfo1, NormalContactInfo2, PlaneContactInfo1,
    PlaneContactInfo2, ShockAbsorberContactInfo1, ShockAbsorberContactInfo2, TireContactInfo1,
};

pub use error::{SolverError, SolverResult};

pub use solver::solve_contacts;

pub use tire::{
    CombinedMagicFormula, ForceBounds, FreeRollingVehicle, MagicFormula, MagicFormulaMode,
    StictionCurve, SurfacePowerMode, Tire, TireContactState, TireHost,
};

// Re-export glam for convenience
pub use glam;
