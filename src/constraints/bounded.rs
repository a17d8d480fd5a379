//! Bounded Lagrange-multiplier accounting.
//!
//! The solver clamps the *accumulated* impulse of a row, not the increment of
//! a single iteration, and applies only the part of the increment that
//! survives the clamp. This is what lets later iterations take back impulse
//! that an earlier iteration applied too eagerly.

use crate::error::{SolverError, SolverResult};

use super::value::{
    ImpulseAccumulator, NormalImpulse, PlaneEqualityConstraint, PlaneInequalityConstraint,
    ShockAbsorberConstraint,
};

/// Largest admissible magnitude of an applied or accumulated impulse.
pub const MAX_IMPULSE: f32 = 1e6;

/// Add `lambda` to the accumulator, clamp the total into
/// `[lambda_min, lambda_max]` and return the change actually applied.
pub fn clamp_accumulated(
    accumulator: &ImpulseAccumulator,
    lambda: f32,
    lambda_min: f32,
    lambda_max: f32,
) -> SolverResult<f32> {
    let old = accumulator.get();
    let total = (old + lambda).max(lambda_min).min(lambda_max);
    check_impulse(lambda, total)?;
    accumulator.set(total);
    Ok(total - old)
}

/// Fail on non-finite impulses or impulses beyond [`MAX_IMPULSE`].
pub(crate) fn check_impulse(lambda: f32, lambda_total: f32) -> SolverResult<()> {
    if lambda.abs() <= MAX_IMPULSE && lambda_total.abs() <= MAX_IMPULSE {
        return Ok(());
    }
    tracing::error!(lambda, lambda_total, "contact impulse blow-up");
    Err(SolverError::ImpulseOverflow {
        lambda,
        lambda_total,
        limit: MAX_IMPULSE,
    })
}

fn check_bounds(lambda_min: f32, lambda_max: f32) -> SolverResult<()> {
    if lambda_min <= lambda_max {
        Ok(())
    } else {
        Err(SolverError::InvertedBounds {
            min: lambda_min,
            max: lambda_max,
        })
    }
}

/// Constraints whose accumulator lives in an embedded [`NormalImpulse`].
pub trait NormalConstraint {
    fn normal_impulse(&self) -> &NormalImpulse;
}

impl NormalConstraint for PlaneInequalityConstraint {
    fn normal_impulse(&self) -> &NormalImpulse {
        &self.normal_impulse
    }
}

impl NormalConstraint for ShockAbsorberConstraint {
    fn normal_impulse(&self) -> &NormalImpulse {
        &self.normal_impulse
    }
}

/// Bounded constraint storing its total in the constraint's normal impulse,
/// where dependent friction contacts can read it.
#[derive(Debug, Clone)]
pub struct BoundedNormalConstraint1D<C = PlaneInequalityConstraint> {
    pub constraint: C,
    pub lambda_min: f32,
    pub lambda_max: f32,
}

/// Shock absorber with bounded accumulated impulse.
pub type BoundedShockAbsorberConstraint = BoundedNormalConstraint1D<ShockAbsorberConstraint>;

impl<C: NormalConstraint> BoundedNormalConstraint1D<C> {
    pub fn new(constraint: C, lambda_min: f32, lambda_max: f32) -> SolverResult<Self> {
        check_bounds(lambda_min, lambda_max)?;
        Ok(Self {
            constraint,
            lambda_min,
            lambda_max,
        })
    }

    /// Bounds `[0, inf)`: the constraint may push but never pull.
    pub fn pushing(constraint: C) -> Self {
        Self {
            constraint,
            lambda_min: 0.0,
            lambda_max: f32::INFINITY,
        }
    }

    #[inline]
    pub fn normal_impulse(&self) -> &NormalImpulse {
        self.constraint.normal_impulse()
    }

    #[inline]
    pub fn lambda_total(&self) -> f32 {
        self.normal_impulse().lambda_total.get()
    }

    pub fn clamped_lambda(&self, lambda: f32) -> SolverResult<f32> {
        clamp_accumulated(
            &self.normal_impulse().lambda_total,
            lambda,
            self.lambda_min,
            self.lambda_max,
        )
    }
}

/// Bounded equality constraint with a private accumulator.
#[derive(Debug, Clone)]
pub struct BoundedFreeConstraint1D<C = PlaneEqualityConstraint> {
    pub constraint: C,
    pub lambda_min: f32,
    pub lambda_max: f32,
    lambda_total: ImpulseAccumulator,
}

impl<C> BoundedFreeConstraint1D<C> {
    pub fn new(constraint: C, lambda_min: f32, lambda_max: f32) -> SolverResult<Self> {
        check_bounds(lambda_min, lambda_max)?;
        Ok(Self {
            constraint,
            lambda_min,
            lambda_max,
            lambda_total: ImpulseAccumulator::new(),
        })
    }

    /// Bounds `(-inf, inf)`.
    pub fn unbounded(constraint: C) -> Self {
        Self {
            constraint,
            lambda_min: f32::NEG_INFINITY,
            lambda_max: f32::INFINITY,
            lambda_total: ImpulseAccumulator::new(),
        }
    }

    #[inline]
    pub fn lambda_total(&self) -> f32 {
        self.lambda_total.get()
    }

    pub fn clamped_lambda(&self, lambda: f32) -> SolverResult<f32> {
        clamp_accumulated(&self.lambda_total, lambda, self.lambda_min, self.lambda_max)
    }
}
