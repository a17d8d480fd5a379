//! Contact-info objects: one solvable row (or row group) each.
//!
//! Every constraint kind comes in a 1-body variant, solved against immovable
//! environment, and a 2-body variant for dynamic-dynamic contacts. Normals
//! point from the environment (or body1) towards body0; body0 receives
//! `+impulse`, body1 `-impulse`.

pub mod friction;
pub mod line;
pub mod normal;
pub mod plane;
pub mod shock_absorber;
pub mod tire;

pub use friction::{FrictionClamping, FrictionContactInfo1, FrictionContactInfo2};
pub use line::{LineContactInfo1, LineContactInfo2};
pub use normal::{NormalContactInfo1, NormalContactInfo2};
pub use plane::{PlaneContactInfo1, PlaneContactInfo2};
pub use shock_absorber::{ShockAbsorberContactInfo1, ShockAbsorberContactInfo2};
pub use tire::TireContactInfo1;

use crate::error::SolverResult;

/// A contact resolved by [`solve_contacts`](crate::solver::solve_contacts).
pub trait ContactInfo {
    /// Run one sequential-impulse update of this contact.
    ///
    /// `iteration` counts from zero up to `niterations - 1`.
    fn solve(
        &mut self,
        world: &hecs::World,
        dt: f32,
        relaxation: f32,
        iteration: usize,
        niterations: usize,
    ) -> SolverResult<()>;

    /// Called once after the last iteration.
    fn finalize(&mut self) {}
}
