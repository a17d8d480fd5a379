//! Plane equality contacts (point kept on a plane, both directions).

use glam::Vec3;

use crate::body::{body, body_mut, integrate_impulse_pair, reduced_mass, VectorAtPosition};
use crate::constraints::{BoundedFreeConstraint1D, PlaneEqualityConstraint};
use crate::error::SolverResult;

use super::ContactInfo;

#[derive(Debug, Clone)]
pub struct PlaneContactInfo1 {
    body: hecs::Entity,
    constraint: BoundedFreeConstraint1D<PlaneEqualityConstraint>,
    position: Vec3,
}

impl PlaneContactInfo1 {
    pub fn new(
        body: hecs::Entity,
        constraint: BoundedFreeConstraint1D<PlaneEqualityConstraint>,
        position: Vec3,
    ) -> Self {
        Self {
            body,
            constraint,
            position,
        }
    }

    pub fn lambda_total(&self) -> f32 {
        self.constraint.lambda_total()
    }
}

impl ContactInfo for PlaneContactInfo1 {
    fn solve(
        &mut self,
        world: &hecs::World,
        dt: f32,
        relaxation: f32,
        _iteration: usize,
        _niterations: usize,
    ) -> SolverResult<()> {
        let normal = self.constraint.constraint.normal_impulse.normal;
        let (vn, mc) = {
            let rb = body(world, self.body)?;
            (
                rb.velocity_at_position(self.position).dot(normal),
                rb.effective_mass(&VectorAtPosition {
                    vector: normal,
                    position: self.position,
                }),
            )
        };
        if !mc.is_finite() {
            return Ok(());
        }
        let lambda = self
            .constraint
            .clamped_lambda(relaxation * mc * (self.constraint.constraint.v(dt) - vn))?;
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

#[derive(Debug, Clone)]
pub struct PlaneContactInfo2 {
    body0: hecs::Entity,
    body1: hecs::Entity,
    constraint: BoundedFreeConstraint1D<PlaneEqualityConstraint>,
    position: Vec3,
}

impl PlaneContactInfo2 {
    pub fn new(
        body0: hecs::Entity,
        body1: hecs::Entity,
        constraint: BoundedFreeConstraint1D<PlaneEqualityConstraint>,
        position: Vec3,
    ) -> Self {
        Self {
            body0,
            body1,
            constraint,
            position,
        }
    }

    pub fn lambda_total(&self) -> f32 {
        self.constraint.lambda_total()
    }
}

impl ContactInfo for PlaneContactInfo2 {
    fn solve(
        &mut self,
        world: &hecs::World,
        dt: f32,
        relaxation: f32,
        _iteration: usize,
        _niterations: usize,
    ) -> SolverResult<()> {
        let normal = self.constraint.constraint.normal_impulse.normal;
        let direction = VectorAtPosition {
            vector: normal,
            position: self.position,
        };
        let (vn, mc) = {
            let rb0 = body(world, self.body0)?;
            let rb1 = body(world, self.body1)?;
            (
                (rb0.velocity_at_position(self.position) - rb1.velocity_at_position(self.position))
                    .dot(normal),
                reduced_mass(rb0.effective_mass(&direction), rb1.effective_mass(&direction)),
            )
        };
        if !mc.is_finite() {
            return Ok(());
        }
        let lambda = self
            .constraint
            .clamped_lambda(relaxation * mc * (self.constraint.constraint.v(dt) - vn))?;
        let j = VectorAtPosition {
            vector: normal * lambda,
            position: self.position,
        };
        integrate_impulse_pair(world, self.body0, self.body1, &j, &j, 0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::body::RigidBodyPulses;
    use crate::contact::test_util::{momentum, unit_body};

    const DT: f32 = 1.0 / 60.0;

    #[test]
    fn test_plane1_holds_separating_body() {
        let mut world = hecs::World::new();
        let entity = world.spawn((unit_body(Vec3::Y, Vec3::new(1.0, 4.0, 0.0)),));
        let mut contact = PlaneContactInfo1::new(
            entity,
            BoundedFreeConstraint1D::unbounded(PlaneEqualityConstraint::new(Vec3::Y, 0.0)),
            Vec3::Y,
        );

        contact.solve(&world, DT, 1.0, 0, 1).unwrap();

        let rb = world.get::<&RigidBodyPulses>(entity).unwrap();
        assert!(rb.v.y.abs() < 1e-5, "vy = {}", rb.v.y);
        // Tangential motion is untouched.
        assert_eq!(rb.v.x, 1.0);
        assert!(contact.lambda_total() < 0.0);
    }

    #[test]
    fn test_plane1_respects_bounds() {
        let mut world = hecs::World::new();
        let entity = world.spawn((unit_body(Vec3::Y, Vec3::new(0.0, 4.0, 0.0)),));
        let mut contact = PlaneContactInfo1::new(
            entity,
            BoundedFreeConstraint1D::new(PlaneEqualityConstraint::new(Vec3::Y, 0.0), -1.0, 1.0)
                .unwrap(),
            Vec3::Y,
        );

        for _ in 0..5 {
            contact.solve(&world, DT, 1.0, 0, 5).unwrap();
        }

        assert_eq!(contact.lambda_total(), -1.0);
        let rb = world.get::<&RigidBodyPulses>(entity).unwrap();
        assert!((rb.v.y - 3.0).abs() < 1e-5);
    }

    #[test]
    fn test_plane2_conserves_momentum() {
        let mut world = hecs::World::new();
        let b0 = world.spawn((unit_body(Vec3::Y, Vec3::new(0.0, 1.0, 0.5)),));
        let b1 = world.spawn((unit_body(-Vec3::Y, Vec3::new(0.3, -1.0, 0.0)),));
        let mut contact = PlaneContactInfo2::new(
            b0,
            b1,
            BoundedFreeConstraint1D::unbounded(PlaneEqualityConstraint::new(Vec3::Y, 0.02)),
            Vec3::new(0.2, 0.0, 0.1),
        );

        let before = momentum(&world, b0) + momentum(&world, b1);
        contact.solve(&world, DT, 1.0, 0, 1).unwrap();
        let after = momentum(&world, b0) + momentum(&world, b1);
        assert!((after - before).length() < 1e-5);
        assert!(contact.lambda_total() < 0.0);
    }
}
