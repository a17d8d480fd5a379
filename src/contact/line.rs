//! Point and line equality contacts (joints, axles).

use glam::Vec3;

use crate::body::{body, body_mut, integrate_impulse_pair, reduced_mass, VectorAtPosition};
use crate::constraints::bounded::check_impulse;
use crate::constraints::GenericLineEqualityConstraint;
use crate::error::SolverResult;

use super::ContactInfo;

/// Velocity errors below this are considered solved.
const MIN_VELOCITY_ERROR: f32 = 1e-12;

/// Point on a body attached to a fixed point or line.
#[derive(Debug, Clone)]
pub struct LineContactInfo1<const N: usize = 1> {
    body: hecs::Entity,
    constraint: GenericLineEqualityConstraint<N>,
    lambda_total: Vec3,
}

impl<const N: usize> LineContactInfo1<N> {
    pub fn new(body: hecs::Entity, constraint: GenericLineEqualityConstraint<N>) -> Self {
        Self {
            body,
            constraint,
            lambda_total: Vec3::ZERO,
        }
    }

    pub fn lambda_total(&self) -> Vec3 {
        self.lambda_total
    }
}

impl<const N: usize> ContactInfo for LineContactInfo1<N> {
    fn solve(
        &mut self,
        world: &hecs::World,
        dt: f32,
        relaxation: f32,
        _iteration: usize,
        _niterations: usize,
    ) -> SolverResult<()> {
        let p0 = self.constraint.pec.p0;
        let target = self.constraint.v(dt);
        let rb = body(world, self.body)?;
        let dv = self
            .constraint
            .project(target - rb.velocity_at_position(p0));
        let len = dv.length();
        if len < MIN_VELOCITY_ERROR {
            return Ok(());
        }
        let direction = dv / len;
        let mc = rb.effective_mass(&VectorAtPosition {
            vector: direction,
            position: p0,
        });
        drop(rb);
        if !mc.is_finite() {
            return Ok(());
        }
        let j = direction * (relaxation * mc * len);
        let lambda_total = self.lambda_total + j;
        check_impulse(j.length(), lambda_total.length())?;
        self.lambda_total = lambda_total;
        body_mut(world, self.body)?.integrate_impulse(
            &VectorAtPosition {
                vector: j,
                position: p0,
            },
            0.0,
        );
        Ok(())
    }
}

/// Point `p0` on body0 attached to point `p1` on body1.
#[derive(Debug, Clone)]
pub struct LineContactInfo2<const N: usize = 1> {
    body0: hecs::Entity,
    body1: hecs::Entity,
    constraint: GenericLineEqualityConstraint<N>,
    lambda_total: Vec3,
}

impl<const N: usize> LineContactInfo2<N> {
    pub fn new(
        body0: hecs::Entity,
        body1: hecs::Entity,
        constraint: GenericLineEqualityConstraint<N>,
    ) -> Self {
        Self {
            body0,
            body1,
            constraint,
            lambda_total: Vec3::ZERO,
        }
    }

    pub fn lambda_total(&self) -> Vec3 {
        self.lambda_total
    }
}

impl<const N: usize> ContactInfo for LineContactInfo2<N> {
    fn solve(
        &mut self,
        world: &hecs::World,
        dt: f32,
        relaxation: f32,
        _iteration: usize,
        _niterations: usize,
    ) -> SolverResult<()> {
        let p0 = self.constraint.pec.p0;
        let p1 = self.constraint.pec.p1;
        let target = self.constraint.v(dt);
        let (direction, len, mc) = {
            let rb0 = body(world, self.body0)?;
            let rb1 = body(world, self.body1)?;
            let v = rb0.velocity_at_position(p0) - rb1.velocity_at_position(p1);
            let dv = self.constraint.project(target - v);
            let len = dv.length();
            if len < MIN_VELOCITY_ERROR {
                return Ok(());
            }
            let direction = dv / len;
            let m0 = rb0.effective_mass(&VectorAtPosition {
                vector: direction,
                position: p0,
            });
            let m1 = rb1.effective_mass(&VectorAtPosition {
                vector: direction,
                position: p1,
            });
            (direction, len, reduced_mass(m0, m1))
        };
        if !mc.is_finite() {
            return Ok(());
        }
        let j = direction * (relaxation * mc * len);
        let lambda_total = self.lambda_total + j;
        check_impulse(j.length(), lambda_total.length())?;
        self.lambda_total = lambda_total;
        integrate_impulse_pair(
            world,
            self.body0,
            self.body1,
            &VectorAtPosition {
                vector: j,
                position: p0,
            },
            &VectorAtPosition {
                vector: j,
                position: p1,
            },
            0.0,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::body::RigidBodyPulses;
    use crate::constraints::{LineEqualityConstraint, PointEqualityConstraint};
    use crate::contact::test_util::{momentum, unit_body};

    const DT: f32 = 1.0 / 60.0;

    #[test]
    fn test_line1_keeps_free_axis() {
        let mut world = hecs::World::new();
        let entity = world.spawn((unit_body(Vec3::ZERO, Vec3::new(2.0, -1.0, 0.5)),));
        let mut contact = LineContactInfo1::new(
            entity,
            LineEqualityConstraint::new(
                PointEqualityConstraint::new(Vec3::ZERO, Vec3::ZERO),
                [Vec3::X],
            ),
        );

        contact.solve(&world, DT, 1.0, 0, 1).unwrap();

        let rb = world.get::<&RigidBodyPulses>(entity).unwrap();
        assert!((rb.v - Vec3::new(2.0, 0.0, 0.0)).length() < 1e-5, "v = {:?}", rb.v);
        assert_eq!(contact.lambda_total().x, 0.0);
    }

    #[test]
    fn test_point1_pulls_towards_anchor() {
        let mut world = hecs::World::new();
        let entity = world.spawn((unit_body(Vec3::ZERO, Vec3::ZERO),));
        let pec = PointEqualityConstraint {
            p0: Vec3::ZERO,
            p1: Vec3::new(0.0, 0.1, 0.0),
            beta: 0.5,
        };
        let mut contact =
            LineContactInfo1::<0>::new(entity, GenericLineEqualityConstraint::new(pec, []));

        contact.solve(&world, DT, 1.0, 0, 1).unwrap();

        let rb = world.get::<&RigidBodyPulses>(entity).unwrap();
        assert!((rb.v - pec.v(DT)).length() < 1e-4, "v = {:?}", rb.v);
    }

    #[test]
    fn test_line2_conserves_momentum() {
        let mut world = hecs::World::new();
        let b0 = world.spawn((unit_body(Vec3::new(1.0, 0.0, 0.0), Vec3::new(0.0, 1.0, 0.0)),));
        let b1 = world.spawn((unit_body(Vec3::new(-1.0, 0.0, 0.0), Vec3::new(0.0, -1.0, 0.3)),));
        let pec =
            PointEqualityConstraint::new(Vec3::new(0.1, 0.0, 0.0), Vec3::new(-0.1, 0.05, 0.0));
        let mut contact =
            LineContactInfo2::<0>::new(b0, b1, GenericLineEqualityConstraint::new(pec, []));

        for iteration in 0..5 {
            let before = momentum(&world, b0) + momentum(&world, b1);
            contact.solve(&world, DT, 1.0, iteration, 5).unwrap();
            let after = momentum(&world, b0) + momentum(&world, b1);
            assert!((after - before).length() < 1e-5);
        }
        assert!(contact.lambda_total().length() > 0.0);
    }
}
