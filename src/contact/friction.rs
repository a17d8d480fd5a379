//! Coulomb and anisotropic friction contacts.
//!
//! A friction contact shares the [`NormalImpulse`] of the normal (or shock
//! absorber) contact it belongs to and bounds its tangential impulse by the
//! current value of that accumulator.

use glam::Vec3;

use crate::body::{body, body_mut, integrate_impulse_pair, reduced_mass, VectorAtPosition};
use crate::constraints::bounded::check_impulse;
use crate::constraints::NormalImpulse;
use crate::error::{SolverError, SolverResult};

use super::ContactInfo;

/// Largest admissible magnitude of a clamping bound.
pub const MAX_CLAMPING: f32 = 1e4;
/// Tangential velocities below this are considered at rest.
const MIN_TANGENTIAL_VELOCITY: f32 = 1e-12;

/// Anisotropic friction cone (friction ellipse).
///
/// The accumulated impulse component along `direction` is clamped to
/// `[min, max]`, the orthogonal remainder to an L2 ball of radius
/// `ortho_max_l2`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrictionClamping {
    pub direction: Vec3,
    pub min: f32,
    pub max: f32,
    pub ortho_max_l2: f32,
}

impl FrictionClamping {
    pub fn new(direction: Vec3, min: f32, max: f32, ortho_max_l2: f32) -> SolverResult<Self> {
        if min > max {
            return Err(SolverError::InvertedBounds { min, max });
        }
        for value in [min, max, ortho_max_l2] {
            if !(value.abs() <= MAX_CLAMPING) {
                return Err(SolverError::ClampingOutOfRange {
                    value,
                    limit: MAX_CLAMPING,
                });
            }
        }
        Ok(Self {
            direction,
            min,
            max,
            ortho_max_l2,
        })
    }

    /// Project an accumulated impulse into the cone.
    pub fn apply(&self, lambda_total: Vec3) -> Vec3 {
        let parallel = lambda_total.dot(self.direction);
        let mut ortho = lambda_total - self.direction * parallel;
        let ortho_len = ortho.length();
        if ortho_len > self.ortho_max_l2 {
            ortho *= self.ortho_max_l2 / ortho_len;
        }
        self.direction * parallel.max(self.min).min(self.max) + ortho
    }
}

/// State shared by the 1-body and 2-body friction contacts.
#[derive(Debug, Clone)]
struct FrictionRow {
    normal_impulse: NormalImpulse,
    stiction_coefficient: f32,
    friction_coefficient: f32,
    b: Vec3,
    lambda_total: Vec3,
    clamping: Option<FrictionClamping>,
    extra_stiction: f32,
    extra_friction: f32,
    extra_w: f32,
}

impl FrictionRow {
    fn new(
        normal_impulse: NormalImpulse,
        stiction_coefficient: f32,
        friction_coefficient: f32,
    ) -> SolverResult<Self> {
        if stiction_coefficient.is_nan() != friction_coefficient.is_nan() {
            return Err(SolverError::InconsistentFriction {
                stiction: stiction_coefficient,
                friction: friction_coefficient,
            });
        }
        Ok(Self {
            normal_impulse,
            stiction_coefficient,
            friction_coefficient,
            b: Vec3::ZERO,
            lambda_total: Vec3::ZERO,
            clamping: None,
            extra_stiction: 0.0,
            extra_friction: 0.0,
            extra_w: 0.0,
        })
    }

    /// NaN coefficients without a clamping cone mean "frictionless".
    fn is_active(&self) -> bool {
        self.clamping.is_some() || !self.stiction_coefficient.is_nan()
    }

    fn normal_lambda(&self) -> f32 {
        self.normal_impulse.lambda_total.get().max(0.0)
    }

    fn max_impulse_stiction(&self) -> f32 {
        self.stiction_coefficient * (1.0 + self.extra_stiction) * self.normal_lambda()
    }

    fn max_impulse_friction(&self) -> f32 {
        self.friction_coefficient * (1.0 + self.extra_friction) * self.normal_lambda()
    }

    /// `v - b` without its normal component.
    fn tangential_velocity(&self, v: Vec3) -> Vec3 {
        let n = self.normal_impulse.normal;
        let v3 = v - self.b;
        v3 - n * v3.dot(n)
    }

    /// Accumulate the impulse cancelling `v3` and return the applied delta.
    fn update(&mut self, v3: Vec3, mc: f32, relaxation: f32) -> SolverResult<Vec3> {
        let lambda = -v3 * (relaxation * mc);
        let old = self.lambda_total;
        let mut total = old + lambda;
        match &self.clamping {
            Some(clamping) => total = clamping.apply(total),
            None => {
                let len = total.length();
                if len > self.max_impulse_stiction() {
                    total *= self.max_impulse_friction() / len;
                }
            }
        }
        check_impulse(lambda.length(), total.length())?;
        self.lambda_total = total;
        Ok(total - old)
    }
}

macro_rules! friction_accessors {
    () => {
        /// Bias velocity the friction drives the contact point towards.
        pub fn set_b(&mut self, b: Vec3) {
            self.row.b = b;
        }

        pub fn b(&self) -> Vec3 {
            self.row.b
        }

        /// Switch to an anisotropic cone.
        pub fn set_clamping(
            &mut self,
            direction: Vec3,
            min: f32,
            max: f32,
            ortho_max_l2: f32,
        ) -> SolverResult<()> {
            self.row.clamping = Some(FrictionClamping::new(direction, min, max, ortho_max_l2)?);
            Ok(())
        }

        pub fn clamping(&self) -> Option<&FrictionClamping> {
            self.row.clamping.as_ref()
        }

        pub fn set_extra_stiction(&mut self, extra_stiction: f32) {
            self.row.extra_stiction = extra_stiction;
        }

        pub fn set_extra_friction(&mut self, extra_friction: f32) {
            self.row.extra_friction = extra_friction;
        }

        pub fn set_extra_w(&mut self, extra_w: f32) {
            self.row.extra_w = extra_w;
        }

        pub fn extra_stiction(&self) -> f32 {
            self.row.extra_stiction
        }

        pub fn extra_friction(&self) -> f32 {
            self.row.extra_friction
        }

        pub fn extra_w(&self) -> f32 {
            self.row.extra_w
        }

        pub fn normal_impulse(&self) -> &NormalImpulse {
            &self.row.normal_impulse
        }

        pub fn lambda_total(&self) -> Vec3 {
            self.row.lambda_total
        }

        pub fn max_impulse_stiction(&self) -> f32 {
            self.row.max_impulse_stiction()
        }

        pub fn max_impulse_friction(&self) -> f32 {
            self.row.max_impulse_friction()
        }
    };
}

/// Friction of a body sliding on immovable environment.
#[derive(Debug, Clone)]
pub struct FrictionContactInfo1 {
    body: hecs::Entity,
    position: Vec3,
    row: FrictionRow,
}

impl FrictionContactInfo1 {
    /// `normal_impulse` must be a clone of the owning normal contact's
    /// impulse so the cone follows its accumulator.
    pub fn new(
        body: hecs::Entity,
        normal_impulse: NormalImpulse,
        position: Vec3,
        stiction_coefficient: f32,
        friction_coefficient: f32,
    ) -> SolverResult<Self> {
        Ok(Self {
            body,
            position,
            row: FrictionRow::new(normal_impulse, stiction_coefficient, friction_coefficient)?,
        })
    }

    pub fn body(&self) -> hecs::Entity {
        self.body
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    friction_accessors!();
}

impl ContactInfo for FrictionContactInfo1 {
    fn solve(
        &mut self,
        world: &hecs::World,
        _dt: f32,
        relaxation: f32,
        _iteration: usize,
        _niterations: usize,
    ) -> SolverResult<()> {
        if !self.row.is_active() {
            return Ok(());
        }
        let (v3, mc) = {
            let rb = body(world, self.body)?;
            let v3 = self
                .row
                .tangential_velocity(rb.velocity_at_position(self.position));
            let vl = v3.length();
            if vl <= MIN_TANGENTIAL_VELOCITY {
                return Ok(());
            }
            let mc = rb.effective_mass(&VectorAtPosition {
                vector: v3 / vl,
                position: self.position,
            });
            (v3, mc)
        };
        if !mc.is_finite() {
            return Ok(());
        }
        let delta = self.row.update(v3, mc, relaxation)?;
        body_mut(world, self.body)?.integrate_impulse(
            &VectorAtPosition {
                vector: delta,
                position: self.position,
            },
            self.row.extra_w,
        );
        Ok(())
    }
}

/// Friction between two dynamic bodies.
#[derive(Debug, Clone)]
pub struct FrictionContactInfo2 {
    body0: hecs::Entity,
    body1: hecs::Entity,
    position: Vec3,
    row: FrictionRow,
}

impl FrictionContactInfo2 {
    pub fn new(
        body0: hecs::Entity,
        body1: hecs::Entity,
        normal_impulse: NormalImpulse,
        position: Vec3,
        stiction_coefficient: f32,
        friction_coefficient: f32,
    ) -> SolverResult<Self> {
        Ok(Self {
            body0,
            body1,
            position,
            row: FrictionRow::new(normal_impulse, stiction_coefficient, friction_coefficient)?,
        })
    }

    friction_accessors!();
}

impl ContactInfo for FrictionContactInfo2 {
    fn solve(
        &mut self,
        world: &hecs::World,
        _dt: f32,
        relaxation: f32,
        _iteration: usize,
        _niterations: usize,
    ) -> SolverResult<()> {
        if !self.row.is_active() {
            return Ok(());
        }
        let (v3, mc) = {
            let rb0 = body(world, self.body0)?;
            let rb1 = body(world, self.body1)?;
            let v3 = self.row.tangential_velocity(
                rb0.velocity_at_position(self.position) - rb1.velocity_at_position(self.position),
            );
            let vl = v3.length();
            if vl <= MIN_TANGENTIAL_VELOCITY {
                return Ok(());
            }
            let direction = VectorAtPosition {
                vector: v3 / vl,
                position: self.position,
            };
            (
                v3,
                reduced_mass(rb0.effective_mass(&direction), rb1.effective_mass(&direction)),
            )
        };
        if !mc.is_finite() {
            return Ok(());
        }
        let delta = self.row.update(v3, mc, relaxation)?;
        let j = VectorAtPosition {
            vector: delta,
            position: self.position,
        };
        integrate_impulse_pair(world, self.body0, self.body1, &j, &j, self.row.extra_w)
    }
}
