//! Spring-damper contacts (suspension).
//!
//! The force is turned into an impulse over the sub-step and spread evenly
//! across the solver iterations. Relaxation does not apply to it.

use glam::Vec3;

use crate::body::{body, body_mut, integrate_impulse_pair, VectorAtPosition};
use crate::constraints::{BoundedShockAbsorberConstraint, NormalImpulse};
use crate::error::SolverResult;

use super::ContactInfo;

#[derive(Debug, Clone)]
pub struct ShockAbsorberContactInfo1 {
    body: hecs::Entity,
    constraint: BoundedShockAbsorberConstraint,
    position: Vec3,
    /// Calibration factor applied to the impulse.
    fit: f32,
}

impl ShockAbsorberContactInfo1 {
    pub fn new(
        body: hecs::Entity,
        constraint: BoundedShockAbsorberConstraint,
        position: Vec3,
    ) -> Self {
        Self {
            body,
            constraint,
            position,
            fit: 1.0,
        }
    }

    pub fn with_fit(mut self, fit: f32) -> Self {
        self.fit = fit;
        self
    }

    /// Normal and accumulator, for attaching tire friction to this contact.
    pub fn normal_impulse(&self) -> &NormalImpulse {
        self.constraint.normal_impulse()
    }

    pub fn lambda_total(&self) -> f32 {
        self.constraint.lambda_total()
    }
}

impl ContactInfo for ShockAbsorberContactInfo1 {
    fn solve(
        &mut self,
        world: &hecs::World,
        dt: f32,
        _relaxation: f32,
        _iteration: usize,
        niterations: usize,
    ) -> SolverResult<()> {
        let normal = self.normal_impulse().normal;
        let closing_velocity = -body(world, self.body)?
            .velocity_at_position(self.position)
            .dot(normal);
        let force = self.constraint.constraint.force(closing_velocity);
        let lambda = self
            .constraint
            .clamped_lambda(force * dt / niterations.max(1) as f32)?;
        body_mut(world, self.body)?.integrate_impulse(
            &VectorAtPosition {
                vector: normal * (lambda * self.fit),
                position: self.position,
            },
            0.0,
        );
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct ShockAbsorberContactInfo2 {
    body0: hecs::Entity,
    body1: hecs::Entity,
    constraint: BoundedShockAbsorberConstraint,
    position: Vec3,
    fit: f32,
}

impl ShockAbsorberContactInfo2 {
    pub fn new(
        body0: hecs::Entity,
        body1: hecs::Entity,
        constraint: BoundedShockAbsorberConstraint,
        position: Vec3,
    ) -> Self {
        Self {
            body0,
            body1,
            constraint,
            position,
            fit: 1.0,
        }
    }

    pub fn with_fit(mut self, fit: f32) -> Self {
        self.fit = fit;
        self
    }

    pub fn normal_impulse(&self) -> &NormalImpulse {
        self.constraint.normal_impulse()
    }

    pub fn lambda_total(&self) -> f32 {
        self.constraint.lambda_total()
    }
}

impl ContactInfo for ShockAbsorberContactInfo2 {
    fn solve(
        &mut self,
        world: &hecs::World,
        dt: f32,
        _relaxation: f32,
        _iteration: usize,
        niterations: usize,
    ) -> SolverResult<()> {
        let normal = self.normal_impulse().normal;
        let closing_velocity = {
            let rb0 = body(world, self.body0)?;
            let rb1 = body(world, self.body1)?;
            -(rb0.velocity_at_position(self.position) - rb1.velocity_at_position(self.position))
                .dot(normal)
        };
        let force = self.constraint.constraint.force(closing_velocity);
        let lambda = self
            .constraint
            .clamped_lambda(force * dt / niterations.max(1) as f32)?;
        let j = VectorAtPosition {
            vector: normal * (lambda * self.fit),
            position: self.position,
        };
        integrate_impulse_pair(world, self.body0, self.body1, &j, &j, 0.0)
    }
}
