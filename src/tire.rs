//! Tire model and the vehicle-side surface consumed by tire contacts.
//!
//! The longitudinal and lateral force curves follow the Pacejka "magic
//! formula". Combined slip is handled by normalizing the slip pair by each
//! curve's peak position and distributing the combined force over the two
//! axes in proportion to their normalized slip.

use std::f32::consts::FRAC_PI_2;

use glam::{Vec2, Vec3};

use crate::error::{SolverError, SolverResult};

/// How the magic formula treats slip beyond the force peak.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MagicFormulaMode {
    /// Force falls off past the peak.
    Standard,
    /// Force saturates at the peak.
    NoSlip,
}

/// One Pacejka curve `d * sin(c * atan(b*x - e*(b*x - atan(b*x))))`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MagicFormula {
    pub b: f32,
    pub c: f32,
    pub d: f32,
    pub e: f32,
}

impl MagicFormula {
    /// Typical dry-asphalt longitudinal curve (slip ratio).
    pub const LONGITUDINAL: Self = Self {
        b: 10.0,
        c: 1.9,
        d: 1.0,
        e: 0.97,
    };

    /// Typical dry-asphalt lateral curve (slip angle in radians).
    pub const LATERAL: Self = Self {
        b: 10.0,
        c: 1.3,
        d: 1.0,
        e: 0.97,
    };

    #[inline]
    fn phi(&self, x: f32) -> f32 {
        let bx = self.b * x;
        bx - self.e * (bx - bx.atan())
    }

    pub fn evaluate(&self, x: f32) -> f32 {
        self.d * (self.c * self.phi(x).atan()).sin()
    }

    /// Slip at which the curve peaks, infinite if it never does (`c <= 1`).
    pub fn argmax(&self) -> f32 {
        if self.c <= 1.0 || self.b <= 0.0 {
            return f32::INFINITY;
        }
        // phi is monotonic for e <= 1; bisect phi(x) = tan(pi / (2c)).
        let target = (FRAC_PI_2 / self.c).tan();
        let mut hi = 1.0 / self.b;
        while self.phi(hi) < target {
            hi *= 2.0;
            if !hi.is_finite() {
                return f32::INFINITY;
            }
        }
        let mut lo = 0.0;
        for _ in 0..48 {
            let mid = 0.5 * (lo + hi);
            if self.phi(mid) < target {
                lo = mid;
            } else {
                hi = mid;
            }
        }
        0.5 * (lo + hi)
    }

    /// Evaluate with the peak position `argmax` precomputed.
    #[inline]
    pub fn evaluate_mode(&self, x: f32, argmax: f32, mode: MagicFormulaMode) -> f32 {
        match mode {
            MagicFormulaMode::NoSlip if argmax.is_finite() => {
                self.evaluate(x.clamp(-argmax, argmax))
            }
            _ => self.evaluate(x),
        }
    }
}

/// Longitudinal and lateral curves evaluated on a combined slip pair.
///
/// The peak positions of both curves are found once, at construction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CombinedMagicFormula {
    longitudinal: MagicFormula,
    lateral: MagicFormula,
    /// `argmax` of the longitudinal and lateral curves.
    argmax: Vec2,
}

impl Default for CombinedMagicFormula {
    fn default() -> Self {
        Self::new(MagicFormula::LONGITUDINAL, MagicFormula::LATERAL)
    }
}

impl CombinedMagicFormula {
    pub fn new(longitudinal: MagicFormula, lateral: MagicFormula) -> Self {
        Self {
            longitudinal,
            lateral,
            argmax: Vec2::new(longitudinal.argmax(), lateral.argmax()),
        }
    }

    pub fn longitudinal(&self) -> &MagicFormula {
        &self.longitudinal
    }

    pub fn lateral(&self) -> &MagicFormula {
        &self.lateral
    }

    /// Peak positions, infinite for curves without a peak.
    pub fn argmax(&self) -> Vec2 {
        self.argmax
    }

    /// Normalized force coefficients for `slip = (slip ratio, slip angle)`.
    pub fn evaluate(&self, slip: Vec2, mode: MagicFormulaMode) -> Vec2 {
        let scale = |argmax: f32| if argmax.is_finite() { argmax } else { 1.0 };
        let peak = Vec2::new(scale(self.argmax.x), scale(self.argmax.y));
        let normalized = slip / peak;
        let rho = normalized.length();
        if rho < 1e-12 {
            return Vec2::ZERO;
        }
        Vec2::new(
            self.longitudinal.evaluate_mode(rho * peak.x, self.argmax.x, mode) * normalized.x / rho,
            self.lateral.evaluate_mode(rho * peak.y, self.argmax.y, mode) * normalized.y / rho,
        )
    }
}

/// Stiction coefficient as a piecewise-linear function of normal force.
#[derive(Debug, Clone, PartialEq)]
pub struct StictionCurve {
    /// `(normal_force, coefficient)` sorted by force.
    points: Vec<(f32, f32)>,
}

impl StictionCurve {
    pub fn constant(coefficient: f32) -> Self {
        Self {
            points: vec![(0.0, coefficient)],
        }
    }

    /// Points are sorted by normal force; an empty curve evaluates to NaN.
    pub fn new(mut points: Vec<(f32, f32)>) -> Self {
        points.sort_by(|a, b| a.0.total_cmp(&b.0));
        Self { points }
    }

    /// Interpolated coefficient, clamped to the first/last point outside the
    /// sampled range. A NaN force reads the first point.
    pub fn coefficient(&self, normal_force: f32) -> f32 {
        let (Some(first), Some(last)) = (self.points.first(), self.points.last()) else {
            return f32::NAN;
        };
        if !(normal_force > first.0) {
            return first.1;
        }
        if normal_force >= last.0 {
            return last.1;
        }
        let i = self.points.partition_point(|p| p.0 <= normal_force);
        let (f0, c0) = self.points[i - 1];
        let (f1, c1) = self.points[i];
        c0 + (c1 - c0) * (normal_force - f0) / (f1 - f0)
    }
}

/// Wheel state read by tire contacts.
#[derive(Debug, Clone, PartialEq)]
pub struct Tire {
    pub radius: f32,
    /// Velocity of the contact patch relative to the hub along the rolling
    /// direction is `angular_velocity * radius`, so a wheel rolling forward
    /// has a negative angular velocity.
    pub angular_velocity: f32,
    pub magic_formula: CombinedMagicFormula,
    pub stiction: StictionCurve,
}

impl Tire {
    pub fn new(radius: f32) -> Self {
        Self {
            radius,
            angular_velocity: 0.0,
            magic_formula: CombinedMagicFormula::default(),
            stiction: StictionCurve::constant(1.0),
        }
    }

    #[inline]
    pub fn magic_formula(&self, slip: Vec2, mode: MagicFormulaMode) -> Vec2 {
        self.magic_formula.evaluate(slip, mode)
    }

    #[inline]
    pub fn stiction_coefficient(&self, normal_force: f32) -> f32 {
        self.stiction.coefficient(normal_force)
    }
}

/// Engine surface-power budget requested by a tire contact.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfacePowerMode {
    /// Chassis faster than the hand-brake velocity.
    Fast,
    Slow,
}

/// Admissible longitudinal force on a tire, `min <= 0 <= max`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ForceBounds {
    pub min: f32,
    pub max: f32,
}

impl ForceBounds {
    pub fn symmetric(force: f32) -> Self {
        Self {
            min: -force.abs(),
            max: force.abs(),
        }
    }
}

/// Contact geometry handed to the vehicle when a tire touches terrain.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TireContactState {
    pub position: Vec3,
    /// Surface normal.
    pub normal: Vec3,
    /// Rolling direction, orthogonal to `normal`.
    pub tangent: Vec3,
    /// Velocity of the chassis at `position`, relative to the surface.
    pub velocity: Vec3,
    /// Current normal impulse on the tire.
    pub normal_impulse: f32,
    pub dt: f32,
}

/// Vehicle-side collaborator of [`TireContactInfo1`](crate::contact::TireContactInfo1).
pub trait TireHost {
    /// Grinding vehicles (e.g. on rails) produce no tire friction.
    fn is_grinding(&self) -> bool;

    fn tire(&self, tire_id: usize) -> Option<&Tire>;

    /// Spend the drivetrain's surface power on the tire, update its angular
    /// velocity and return the longitudinal force the terrain can transfer.
    fn handle_tire_triangle_intersection(
        &mut self,
        tire_id: usize,
        mode: SurfacePowerMode,
        contact: &TireContactState,
    ) -> SolverResult<ForceBounds>;
}

/// Undriven vehicle whose wheels either roll freely or are locked by the
/// brakes.
#[derive(Debug, Clone)]
pub struct FreeRollingVehicle {
    pub tires: Vec<Tire>,
    pub grinding: bool,
    pub braking: bool,
    /// Largest brake force per tire.
    pub brake_force: f32,
}

impl FreeRollingVehicle {
    pub fn new(tires: Vec<Tire>, brake_force: f32) -> Self {
        Self {
            tires,
            grinding: false,
            braking: false,
            brake_force,
        }
    }
}

impl TireHost for FreeRollingVehicle {
    fn is_grinding(&self) -> bool {
        self.grinding
    }

    fn tire(&self, tire_id: usize) -> Option<&Tire> {
        self.tires.get(tire_id)
    }

    fn handle_tire_triangle_intersection(
        &mut self,
        tire_id: usize,
        _mode: SurfacePowerMode,
        contact: &TireContactState,
    ) -> SolverResult<ForceBounds> {
        let tire = self
            .tires
            .get_mut(tire_id)
            .ok_or(SolverError::UnknownTire(tire_id))?;
        if self.braking {
            tire.angular_velocity = 0.0;
            Ok(ForceBounds::symmetric(self.brake_force))
        } else {
            tire.angular_velocity = -contact.velocity.dot(contact.tangent) / tire.radius;
            Ok(ForceBounds::symmetric(0.0))
        }
    }
}
