//! Constraint value types.
//!
//! Pure data plus the target ("violation") velocity each constraint asks the
//! solver to reach. Positional errors are turned into velocities with
//! Baumgarte stabilization (`beta / dt * error`).

use std::cell::Cell;
use std::rc::Rc;

use glam::Vec3;

/// Default Baumgarte stabilization parameter.
pub const BAUMGARTE_BETA: f32 = 0.2;
/// Default penetration slop (allowed penetration before position correction).
pub const PENETRATION_SLOP: f32 = 0.005;

/// Accumulated scalar impulse of one constraint row.
///
/// Clones share the same cell, so a friction contact holding a clone of a
/// normal constraint's accumulator always reads the latest total.
#[derive(Debug, Clone, Default)]
pub struct ImpulseAccumulator(Rc<Cell<f32>>);

impl ImpulseAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn get(&self) -> f32 {
        self.0.get()
    }

    #[inline]
    pub fn set(&self, lambda_total: f32) {
        self.0.set(lambda_total);
    }

    /// Whether both handles refer to the same cell.
    pub fn shares_with(&self, other: &ImpulseAccumulator) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

/// Contact normal together with the impulse accumulated along it.
#[derive(Debug, Clone)]
pub struct NormalImpulse {
    /// Unit normal, pointing from the environment (or body1) towards body0.
    pub normal: Vec3,
    pub lambda_total: ImpulseAccumulator,
}

impl NormalImpulse {
    pub fn new(normal: Vec3) -> Self {
        Self {
            normal,
            lambda_total: ImpulseAccumulator::new(),
        }
    }
}

/// Non-penetration constraint against a plane.
#[derive(Debug, Clone)]
pub struct PlaneInequalityConstraint {
    pub normal_impulse: NormalImpulse,
    /// Penetration depth, positive when overlapping.
    pub overlap: f32,
    /// Target separating velocity (restitution, conveyor speed).
    pub b: f32,
    pub slop: f32,
    pub beta: f32,
}

impl PlaneInequalityConstraint {
    pub fn new(normal: Vec3, overlap: f32) -> Self {
        Self {
            normal_impulse: NormalImpulse::new(normal),
            overlap,
            b: 0.0,
            slop: PENETRATION_SLOP,
            beta: BAUMGARTE_BETA,
        }
    }

    /// Positional error left after the slop. Never negative, so separated
    /// contacts are not pulled together.
    #[inline]
    pub fn bias(&self) -> f32 {
        (self.overlap - self.slop).max(0.0)
    }

    /// Target velocity along the normal.
    #[inline]
    pub fn v(&self, dt: f32) -> f32 {
        self.b + self.beta / dt * self.bias()
    }
}

/// Holonomic constraint keeping a point on a plane.
#[derive(Debug, Clone)]
pub struct PlaneEqualityConstraint {
    pub normal_impulse: NormalImpulse,
    /// Signed distance to travel along the normal to satisfy the constraint.
    pub overlap: f32,
    pub b: f32,
    pub beta: f32,
}

impl PlaneEqualityConstraint {
    pub fn new(normal: Vec3, overlap: f32) -> Self {
        Self {
            normal_impulse: NormalImpulse::new(normal),
            overlap,
            b: 0.0,
            beta: BAUMGARTE_BETA,
        }
    }

    #[inline]
    pub fn v(&self, dt: f32) -> f32 {
        self.b + self.beta / dt * self.overlap
    }
}

/// Constraint pulling point `p0` (on body0) onto point `p1`.
#[derive(Debug, Clone, Copy)]
pub struct PointEqualityConstraint {
    pub p0: Vec3,
    pub p1: Vec3,
    pub beta: f32,
}

impl PointEqualityConstraint {
    pub fn new(p0: Vec3, p1: Vec3) -> Self {
        Self {
            p0,
            p1,
            beta: BAUMGARTE_BETA,
        }
    }

    #[inline]
    pub fn v(&self, dt: f32) -> Vec3 {
        (self.p1 - self.p0) * (self.beta / dt)
    }
}

/// Point equality with `N` free directions.
///
/// The rows of `null_space` must be orthonormal. Velocity errors along them
/// are ignored, e.g. an axle free to slide along one direction uses `N = 1`.
#[derive(Debug, Clone, Copy)]
pub struct GenericLineEqualityConstraint<const N: usize> {
    pub pec: PointEqualityConstraint,
    pub null_space: [Vec3; N],
}

/// Point constrained to a line through `p1`.
pub type LineEqualityConstraint = GenericLineEqualityConstraint<1>;

impl<const N: usize> GenericLineEqualityConstraint<N> {
    pub fn new(pec: PointEqualityConstraint, null_space: [Vec3; N]) -> Self {
        Self { pec, null_space }
    }

    /// Remove the components of `x` lying in the null space.
    #[inline]
    pub fn project(&self, x: Vec3) -> Vec3 {
        self.null_space
            .iter()
            .fold(x, |x, n| x - *n * x.dot(*n))
    }

    #[inline]
    pub fn v(&self, dt: f32) -> Vec3 {
        self.project(self.pec.v(dt))
    }
}

/// Spring-damper acting along a contact normal.
#[derive(Debug, Clone)]
pub struct ShockAbsorberConstraint {
    pub normal_impulse: NormalImpulse,
    /// Spring compression.
    pub distance: f32,
    /// Spring constant `Ks`.
    pub stiffness: f32,
    /// Damping constant `Ka`.
    pub damping: f32,
}

impl ShockAbsorberConstraint {
    /// Force for the given closing velocity (positive when approaching).
    #[inline]
    pub fn force(&self, closing_velocity: f32) -> f32 {
        self.stiffness * self.distance + self.damping * closing_velocity
    }
}
