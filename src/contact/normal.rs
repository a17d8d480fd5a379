//! Non-penetration contacts.

use glam::Vec3;

use crate::body::{body, body_mut, integrate_impulse_pair, reduced_mass, VectorAtPosition};
use crate::constraints::{BoundedNormalConstraint1D, NormalImpulse};
use crate::error::SolverResult;

use super::ContactInfo;

/// Body pressed against immovable environment.
#[derive(Debug, Clone)]
pub struct NormalContactInfo1 {
    body: hecs::Entity,
    constraint: BoundedNormalConstraint1D,
    position: Vec3,
}

impl NormalContactInfo1 {
    pub fn new(body: hecs::Entity, constraint: BoundedNormalConstraint1D, position: Vec3) -> Self {
        Self {
            body,
            constraint,
            position,
        }
    }

    /// Normal and accumulator, for attaching friction to this contact.
    pub fn normal_impulse(&self) -> &NormalImpulse {
        self.constraint.normal_impulse()
    }

    pub fn lambda_total(&self) -> f32 {
        self.constraint.lambda_total()
    }
}

impl ContactInfo for NormalContactInfo1 {
    fn solve(
        &mut self,
        world: &hecs::World,
        dt: f32,
        relaxation: f32,
        _iteration: usize,
        _niterations: usize,
    ) -> SolverResult<()> {
        let normal = self.normal_impulse().normal;
        let direction = VectorAtPosition {
            vector: normal,
            position: self.position,
        };
        let (vn, mc) = {
            let rb = body(world, self.body)?;
            (
                rb.velocity_at_position(self.position).dot(normal),
                rb.effective_mass(&direction),
            )
        };
        if !mc.is_finite() {
            return Ok(());
        }
        let lambda = relaxation * mc * (self.constraint.constraint.v(dt) - vn);
        let lambda = self.constraint.clamped_lambda(lambda)?;
        body_mut(world, self.body)?.integrate_impulse(
            &VectorAtPosition {
                vector: normal * lambda,
                position: self.position,
            },
            0.0,
        );
        Ok(())
    }
}

/// Callback receiving the terminal normal impulse of a contact.
pub type NormalImpulseCallback = Box<dyn FnMut(f32)>;

/// Contact between two dynamic bodies.
pub struct NormalContactInfo2 {
    body0: hecs::Entity,
    body1: hecs::Entity,
    constraint: BoundedNormalConstraint1D,
    position: Vec3,
    on_finalize: Option<NormalImpulseCallback>,
}

impl NormalContactInfo2 {
    pub fn new(
        body0: hecs::Entity,
        body1: hecs::Entity,
        constraint: BoundedNormalConstraint1D,
        position: Vec3,
    ) -> Self {
        Self {
            body0,
            body1,
            constraint,
            position,
            on_finalize: None,
        }
    }

    /// Report the final `lambda_total` to `callback` (damage, impact audio).
    pub fn with_finalize(mut self, callback: impl FnMut(f32) + 'static) -> Self {
        self.on_finalize = Some(Box::new(callback));
        self
    }

    pub fn normal_impulse(&self) -> &NormalImpulse {
        self.constraint.normal_impulse()
    }

    pub fn lambda_total(&self) -> f32 {
        self.constraint.lambda_total()
    }
}

impl ContactInfo for NormalContactInfo2 {
    fn solve(
        &mut self,
        world: &hecs::World,
        dt: f32,
        relaxation: f32,
        _iteration: usize,
        _niterations: usize,
    ) -> SolverResult<()> {
        let normal = self.normal_impulse().normal;
        let direction = VectorAtPosition {
            vector: normal,
            position: self.position,
        };
        let (vn, mc) = {
            let rb0 = body(world, self.body0)?;
            let rb1 = body(world, self.body1)?;
            let v = rb0.velocity_at_position(self.position)
                - rb1.velocity_at_position(self.position);
            (
                v.dot(normal),
                reduced_mass(rb0.effective_mass(&direction), rb1.effective_mass(&direction)),
            )
        };
        if !mc.is_finite() {
            return Ok(());
        }
        let lambda = relaxation * mc * (self.constraint.constraint.v(dt) - vn);
        let lambda = self.constraint.clamped_lambda(lambda)?;
        let j = VectorAtPosition {
            vector: normal * lambda,
            position: self.position,
        };
        integrate_impulse_pair(world, self.body0, self.body1, &j, &j, 0.0)
    }

    fn finalize(&mut self) {
        let lambda_total = self.constraint.lambda_total();
        if let Some(callback) = self.on_finalize.as_mut() {
            callback(lambda_total);
        }
    }
}
