//! Rigid-body velocity state used by the contact solver.
//!
//! Bodies live as [`RigidBodyPulses`] components in a `hecs::World` that the
//! physics step populates once per sub-step. Contacts refer to them through
//! `hecs::Entity` handles and must not outlive that world.

use glam::{Mat3, Vec3};

use crate::error::{SolverError, SolverResult};

/// A vector applied at a world-space position (impulse or direction).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VectorAtPosition {
    pub vector: Vec3,
    pub position: Vec3,
}

/// Velocity state and inverse inertia of a rigid body for one sub-step.
#[derive(Debug, Clone, PartialEq)]
pub struct RigidBodyPulses {
    /// Inverse mass, zero for immovable bodies.
    pub inv_mass: f32,
    /// Inverse inertia tensor in world space, zero for immovable bodies.
    pub inv_inertia: Mat3,
    /// Centre of mass in world space.
    pub abs_com: Vec3,
    /// Linear velocity.
    pub v: Vec3,
    /// Angular velocity.
    pub w: Vec3,
}

impl RigidBodyPulses {
    /// Create a dynamic body from its mass and world-space inertia tensor.
    ///
    /// Non-positive masses and singular tensors make the respective part of
    /// the body immovable.
    pub fn new_dynamic(mass: f32, inertia: Mat3, abs_com: Vec3) -> Self {
        let inv_mass = if mass > 0.0 { 1.0 / mass } else { 0.0 };
        let inv_inertia = if inertia.determinant().abs() > f32::EPSILON {
            inertia.inverse()
        } else {
            Mat3::ZERO
        };
        Self {
            inv_mass,
            inv_inertia,
            abs_com,
            v: Vec3::ZERO,
            w: Vec3::ZERO,
        }
    }

    /// Dynamic body with a solid-box inertia tensor.
    pub fn new_box(mass: f32, half_extents: Vec3, abs_com: Vec3) -> Self {
        let e = half_extents * 2.0;
        let k = mass / 12.0;
        let inertia = Mat3::from_diagonal(Vec3::new(
            k * (e.y * e.y + e.z * e.z),
            k * (e.x * e.x + e.z * e.z),
            k * (e.x * e.x + e.y * e.y),
        ));
        Self::new_dynamic(mass, inertia, abs_com)
    }

    /// Create an immovable body (environment, kinematic geometry).
    pub fn new_fixed(abs_com: Vec3) -> Self {
        Self {
            inv_mass: 0.0,
            inv_inertia: Mat3::ZERO,
            abs_com,
            v: Vec3::ZERO,
            w: Vec3::ZERO,
        }
    }

    /// Builder-style initial velocities.
    pub fn with_velocity(mut self, v: Vec3, w: Vec3) -> Self {
        self.v = v;
        self.w = w;
        self
    }

    /// Mass of the body, infinite for immovable bodies.
    #[inline]
    pub fn mass(&self) -> f32 {
        if self.inv_mass > 0.0 {
            1.0 / self.inv_mass
        } else {
            f32::INFINITY
        }
    }

    /// Velocity of the material point at world position `position`.
    #[inline]
    pub fn velocity_at_position(&self, position: Vec3) -> Vec3 {
        self.v + self.w.cross(position - self.abs_com)
    }

    /// Mass felt by a unit impulse along `vp.vector` applied at `vp.position`.
    ///
    /// `vp.vector` must be normalized. Returns infinity for immovable bodies.
    pub fn effective_mass(&self, vp: &VectorAtPosition) -> f32 {
        let rn = (vp.position - self.abs_com).cross(vp.vector);
        let k = self.inv_mass + rn.dot(self.inv_inertia * rn);
        if k > 0.0 {
            1.0 / k
        } else {
            f32::INFINITY
        }
    }

    /// Apply impulse `j`. The angular response is scaled by `1 + extra_w`.
    pub fn integrate_impulse(&mut self, j: &VectorAtPosition, extra_w: f32) {
        self.v += j.vector * self.inv_mass;
        let torque = (j.position - self.abs_com).cross(j.vector);
        self.w += self.inv_inertia * torque * (1.0 + extra_w);
    }
}

/// Reduced mass `(m0 * m1) / (m0 + m1)` of two participants.
///
/// Evaluated in inverse form so an immovable participant yields the other
/// body's mass.
#[inline]
pub fn reduced_mass(m0: f32, m1: f32) -> f32 {
    1.0 / (1.0 / m0 + 1.0 / m1)
}

pub(crate) fn body(
    world: &hecs::World,
    entity: hecs::Entity,
) -> SolverResult<hecs::Ref<'_, RigidBodyPulses>> {
    world
        .get::<&RigidBodyPulses>(entity)
        .map_err(|_| SolverError::MissingBody(entity))
}

pub(crate) fn body_mut(
    world: &hecs::World,
    entity: hecs::Entity,
) -> SolverResult<hecs::RefMut<'_, RigidBodyPulses>> {
    world
        .get::<&mut RigidBodyPulses>(entity)
        .map_err(|_| SolverError::MissingBody(entity))
}

/// Apply `j` to `entity` and its negation to `other`.
pub(crate) fn integrate_impulse_pair(
    world: &hecs::World,
    entity: hecs::Entity,
    other: hecs::Entity,
    j0: &VectorAtPosition,
    j1: &VectorAtPosition,
    extra_w: f32,
) -> SolverResult<()> {
    body_mut(world, entity)?.integrate_impulse(j0, extra_w);
    body_mut(world, other)?.integrate_impulse(
        &VectorAtPosition {
            vector: -j1.vector,
            position: j1.position,
        },
        extra_w,
    );
    Ok(())
}
