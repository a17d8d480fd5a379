//! Tire contacts: friction bounded by a combined-slip magic formula.

use std::cell::RefCell;
use std::rc::Rc;

use glam::{Vec2, Vec3};

use crate::body::body;
use crate::config::PhysicsEngineConfig;
use crate::error::{SolverError, SolverResult};
use crate::tire::{MagicFormulaMode, SurfacePowerMode, TireContactState, TireHost};

use super::{ContactInfo, FrictionContactInfo1};

/// Tangential speeds below this have no defined slip angle.
const MIN_SLIP_VELOCITY: f32 = 1e-6;

/// Tire of a vehicle touching immovable terrain.
///
/// Each iteration re-derives the friction ellipse of the wrapped
/// [`FrictionContactInfo1`] from the tire's slip and the current normal
/// impulse, then solves it.
pub struct TireContactInfo1 {
    friction: FrictionContactInfo1,
    host: Rc<RefCell<dyn TireHost>>,
    tire_id: usize,
    /// Rolling direction.
    tangent: Vec3,
    /// Surface velocity of the terrain.
    b0: Vec3,
    surface_stiction_factor: f32,
    cfg: PhysicsEngineConfig,
    slip: f32,
    sin_lateral_slip_angle: f32,
}

impl TireContactInfo1 {
    /// `friction` must share the normal impulse of the tire's suspension or
    /// normal contact. Its current bias velocity is taken as the terrain's
    /// surface velocity.
    pub fn new(
        friction: FrictionContactInfo1,
        host: Rc<RefCell<dyn TireHost>>,
        tire_id: usize,
        tangent: Vec3,
        surface_stiction_factor: f32,
        cfg: &PhysicsEngineConfig,
    ) -> Self {
        let b0 = friction.b();
        Self {
            friction,
            host,
            tire_id,
            tangent,
            b0,
            surface_stiction_factor,
            cfg: cfg.clone(),
            slip: 0.0,
            sin_lateral_slip_angle: 0.0,
        }
    }

    pub fn friction(&self) -> &FrictionContactInfo1 {
        &self.friction
    }

    /// Longitudinal slip ratio of the last iteration.
    pub fn slip(&self) -> f32 {
        self.slip
    }

    /// Sine of the lateral slip angle of the last iteration.
    pub fn sin_lateral_slip_angle(&self) -> f32 {
        self.sin_lateral_slip_angle
    }
}

impl ContactInfo for TireContactInfo1 {
    fn solve(
        &mut self,
        world: &hecs::World,
        dt: f32,
        relaxation: f32,
        iteration: usize,
        niterations: usize,
    ) -> SolverResult<()> {
        if self.host.borrow().is_grinding() {
            tracing::trace!(tire_id = self.tire_id, "tire grinding, skipping friction");
            return Ok(());
        }
        let normal = self.friction.normal_impulse().normal;
        let n3 = (self.tangent - normal * self.tangent.dot(normal)).normalize_or_zero();
        if n3 == Vec3::ZERO {
            return Ok(());
        }
        let position = self.friction.position();
        let (chassis_speed, vc) = {
            let rb = body(world, self.friction.body())?;
            (rb.v.length(), rb.velocity_at_position(position))
        };
        let mode = if chassis_speed > self.cfg.hand_brake_velocity {
            SurfacePowerMode::Fast
        } else {
            SurfacePowerMode::Slow
        };
        let normal_lambda = self.friction.normal_impulse().lambda_total.get().max(0.0);

        // Tangential velocity relative to the terrain surface.
        let v3 = {
            let v = vc - self.b0;
            v - normal * v.dot(normal)
        };
        let bounds = self.host.borrow_mut().handle_tire_triangle_intersection(
            self.tire_id,
            mode,
            &TireContactState {
                position,
                normal,
                tangent: n3,
                velocity: v3,
                normal_impulse: normal_lambda,
                dt,
            },
        )?;

        let host = self.host.borrow();
        let tire = host
            .tire(self.tire_id)
            .ok_or(SolverError::UnknownTire(self.tire_id))?;
        let tv = tire.angular_velocity * tire.radius;
        self.friction.set_b(self.b0 - n3 * tv);

        let v_long = v3.dot(n3);
        let hand_brake_velocity = self.cfg.hand_brake_velocity.max(f32::EPSILON);
        self.slip = (v_long + tv) / hand_brake_velocity.max(v_long.abs());

        // sin(atan2(v_lat, |v_long|)) without the trig calls.
        let v_lat = v3.dot(normal.cross(n3));
        let vt = v3.length();
        self.sin_lateral_slip_angle = if vt > MIN_SLIP_VELOCITY {
            (v_lat / vt).clamp(-1.0, 1.0)
        } else {
            0.0
        };

        let extra_friction = self.cfg.max_extra_friction.min(self.sin_lateral_slip_angle);
        self.friction.set_extra_friction(extra_friction);
        self.friction.set_extra_stiction(extra_friction);
        self.friction
            .set_extra_w(self.cfg.max_extra_w.min(self.sin_lateral_slip_angle));

        let lambda_max = normal_lambda
            * tire.stiction_coefficient(normal_lambda / dt)
            * self.surface_stiction_factor;
        let formula_mode = if self.cfg.no_slip {
            MagicFormulaMode::NoSlip
        } else {
            MagicFormulaMode::Standard
        };
        let r = tire.magic_formula(
            Vec2::new(self.slip, self.sin_lateral_slip_angle.asin()),
            formula_mode,
        ) * lambda_max;
        drop(host);

        let dt_substeps = self.cfg.dt_substeps();
        let r_long = r.x.abs();
        self.friction.set_clamping(
            n3,
            -(bounds.min.min(0.0).abs() * dt_substeps).min(r_long),
            (bounds.max.max(0.0) * dt_substeps).min(r_long),
            r.y.abs(),
        )?;
        self.friction
            .solve(world, dt, relaxation, iteration, niterations)
    }
}

#[cfg(test)]
mod tests {
    use glam::Mat3;

    use super::*;
    use crate::body::RigidBodyPulses;
    use crate::constraints::NormalImpulse;
    use crate::tire::{ForceBounds, FreeRollingVehicle, Tire};

    const DT: f32 = 1.0 / 240.0;

    struct RecordingHost {
        tire: Tire,
        grinding: bool,
        bounds: ForceBounds,
        modes: Vec<SurfacePowerMode>,
    }

    impl TireHost for RecordingHost {
        fn is_grinding(&self) -> bool {
            self.grinding
        }

        fn tire(&self, tire_id: usize) -> Option<&Tire> {
            (tire_id == 0).then_some(&self.tire)
        }

        fn handle_tire_triangle_intersection(
            &mut self,
            _tire_id: usize,
            mode: SurfacePowerMode,
            _contact: &TireContactState,
        ) -> SolverResult<ForceBounds> {
            self.modes.push(mode);
            Ok(self.bounds)
        }
    }

    fn recording_host(grinding: bool) -> Rc<RefCell<RecordingHost>> {
        Rc::new(RefCell::new(RecordingHost {
            tire: Tire::new(0.3),
            grinding,
            bounds: ForceBounds::symmetric(5000.0),
            modes: Vec::new(),
        }))
    }

    fn cfg() -> PhysicsEngineConfig {
        PhysicsEngineConfig {
            dt: DT * 4.0,
            ..PhysicsEngineConfig::default()
        }
    }

    /// Chassis with the tire loaded by `normal_lambda`.
    fn tire_contact(
        world: &mut hecs::World,
        v: Vec3,
        normal_lambda: f32,
        host: Rc<RefCell<dyn TireHost>>,
        tire_id: usize,
    ) -> (hecs::Entity, TireContactInfo1) {
        tire_contact_with(world, v, normal_lambda, host, tire_id, &cfg(), 1.0)
    }

    fn tire_contact_with(
        world: &mut hecs::World,
        v: Vec3,
        normal_lambda: f32,
        host: Rc<RefCell<dyn TireHost>>,
        tire_id: usize,
        cfg: &PhysicsEngineConfig,
        surface_stiction_factor: f32,
    ) -> (hecs::Entity, TireContactInfo1) {
        let entity = world.spawn((RigidBodyPulses::new_dynamic(
            300.0,
            Mat3::IDENTITY * 300.0,
            Vec3::ZERO,
        )
        .with_velocity(v, Vec3::ZERO),));
        let normal_impulse = NormalImpulse::new(Vec3::Y);
        normal_impulse.lambda_total.set(normal_lambda);
        let friction =
            FrictionContactInfo1::new(entity, normal_impulse, Vec3::ZERO, f32::NAN, f32::NAN)
                .unwrap();
        let contact =
            TireContactInfo1::new(friction, host, tire_id, Vec3::X, surface_stiction_factor, cfg);
        (entity, contact)
    }

    /// Longitudinal bound of a locked wheel at 10 m/s under `normal_lambda`.
    fn locked_wheel_bound(cfg: &PhysicsEngineConfig, surface_stiction_factor: f32) -> f32 {
        let mut world = hecs::World::new();
        let host = recording_host(false);
        host.borrow_mut().bounds = ForceBounds::symmetric(1e6);
        let (_, mut contact) = tire_contact_with(
            &mut world,
            Vec3::new(10.0, 0.0, 0.0),
            1000.0,
            host,
            0,
            cfg,
            surface_stiction_factor,
        );
        contact.solve(&world, DT, 1.0, 0, 5).unwrap();
        let clamping = *contact.friction().clamping().unwrap();
        assert!((clamping.min + clamping.max).abs() < 1e-3 * clamping.max);
        clamping.max
    }

    #[test]
    fn test_tire_slip_finite_at_standstill() {
        let mut world = hecs::World::new();
        let host = recording_host(false);
        let (entity, mut contact) =
            tire_contact(&mut world, Vec3::new(0.5, 0.0, 0.1), 10.0, host.clone(), 0);

        for iteration in 0..5 {
            contact.solve(&world, DT, 1.0, iteration, 5).unwrap();
            assert!(contact.slip().is_finite(), "slip = {}", contact.slip());
            assert!(contact.slip().abs() <= 1.0);
        }
        let rb = world.get::<&RigidBodyPulses>(entity).unwrap();
        assert!(rb.v.is_finite() && rb.w.is_finite(), "v = {:?}, w = {:?}", rb.v, rb.w);
        assert!(host.borrow().modes.iter().all(|m| *m == SurfacePowerMode::Slow));
    }

    #[test]
    fn test_tire_slip_zero_speed_zero_wheel() {
        let mut world = hecs::World::new();
        let host = recording_host(false);
        let (_, mut contact) = tire_contact(&mut world, Vec3::ZERO, 10.0, host, 0);

        contact.solve(&world, DT, 1.0, 0, 5).unwrap();

        assert_eq!(contact.slip(), 0.0);
        assert_eq!(contact.sin_lateral_slip_angle(), 0.0);
    }

    #[test]
    fn test_tire_fast_mode_and_locked_wheel_slip() {
        let mut world = hecs::World::new();
        let host = recording_host(false);
        let (_, mut contact) =
            tire_contact(&mut world, Vec3::new(10.0, 0.0, 0.0), 1000.0, host.clone(), 0);

        contact.solve(&world, DT, 1.0, 0, 5).unwrap();

        assert_eq!(host.borrow().modes, vec![SurfacePowerMode::Fast]);
        assert!((contact.slip() - 1.0).abs() < 1e-6, "slip = {}", contact.slip());
        let clamping = contact.friction().clamping().copied().unwrap();
        assert_eq!(clamping.direction, Vec3::X);
        assert!(clamping.min <= 0.0 && clamping.max >= 0.0);
        // Pure longitudinal slip leaves no lateral budget.
        assert!(clamping.ortho_max_l2.abs() < 1e-6);
    }

    #[test]
    fn test_tire_friction_ellipse_bounds_impulse() {
        let mut world = hecs::World::new();
        let host = recording_host(false);
        let (_, mut contact) =
            tire_contact(&mut world, Vec3::new(8.0, 0.0, 3.0), 1000.0, host, 0);

        for iteration in 0..5 {
            contact.solve(&world, DT, 1.0, iteration, 5).unwrap();
            let clamping = *contact.friction().clamping().unwrap();
            let lambda_total = contact.friction().lambda_total();
            let parallel = lambda_total.dot(clamping.direction);
            let ortho = lambda_total - clamping.direction * parallel;
            assert!(parallel >= clamping.min - 1e-4 && parallel <= clamping.max + 1e-4);
            assert!(ortho.length() <= clamping.ortho_max_l2 + 1e-4);
        }
        assert!(contact.sin_lateral_slip_angle() < 0.0);
        // Friction opposes the sliding direction.
        let lambda_total = contact.friction().lambda_total();
        assert!(lambda_total.x < 0.0 && lambda_total.z < 0.0, "lambda_total = {:?}", lambda_total);
    }

    #[test]
    fn test_extra_friction_follows_lateral_slip() {
        let cfg = PhysicsEngineConfig {
            max_extra_friction: 0.3,
            max_extra_w: 0.2,
            ..cfg()
        };
        let host = recording_host(false);

        // Large lateral slip: both extras saturate at their configured maximum.
        let mut world = hecs::World::new();
        let (_, mut contact) = tire_contact_with(
            &mut world,
            Vec3::new(8.0, 0.0, -3.0),
            1000.0,
            host.clone(),
            0,
            &cfg,
            1.0,
        );
        contact.solve(&world, DT, 1.0, 0, 5).unwrap();
        let sin = 3.0 / 73.0_f32.sqrt();
        assert!((contact.sin_lateral_slip_angle() - sin).abs() < 1e-5);
        assert!((contact.friction().extra_friction() - 0.3).abs() < 1e-6);
        assert!((contact.friction().extra_stiction() - 0.3).abs() < 1e-6);
        assert!((contact.friction().extra_w() - 0.2).abs() < 1e-6);

        // Small lateral slip: all three follow the slip angle.
        let mut world = hecs::World::new();
        let (_, mut contact) = tire_contact_with(
            &mut world,
            Vec3::new(8.0, 0.0, -1.0),
            1000.0,
            host,
            0,
            &cfg,
            1.0,
        );
        contact.solve(&world, DT, 1.0, 0, 5).unwrap();
        let sin = 1.0 / 65.0_f32.sqrt();
        assert!((contact.friction().extra_friction() - sin).abs() < 1e-5);
        assert!((contact.friction().extra_stiction() - sin).abs() < 1e-5);
        assert!((contact.friction().extra_w() - sin).abs() < 1e-5);
    }

    #[test]
    fn test_no_slip_uses_peak_grip() {
        let standard = locked_wheel_bound(&cfg(), 1.0);
        let no_slip = locked_wheel_bound(
            &PhysicsEngineConfig {
                no_slip: true,
                ..cfg()
            },
            1.0,
        );

        let tire = Tire::new(0.3);
        let lambda_max = 1000.0 * tire.stiction_coefficient(1000.0 / DT);
        let slip = Vec2::new(1.0, 0.0);
        let expected_standard = tire.magic_formula(slip, MagicFormulaMode::Standard).x * lambda_max;
        let expected_no_slip = tire.magic_formula(slip, MagicFormulaMode::NoSlip).x * lambda_max;
        assert!((standard - expected_standard).abs() < 1e-3 * expected_standard);
        assert!((no_slip - expected_no_slip).abs() < 1e-3 * expected_no_slip);
        assert!(no_slip >= standard, "no_slip = {}, standard = {}", no_slip, standard);
    }

    #[test]
    fn test_surface_stiction_factor_scales_bound() {
        let full = locked_wheel_bound(&cfg(), 1.0);
        let half = locked_wheel_bound(&cfg(), 0.5);

        assert!(full > 0.0);
        assert!((half - 0.5 * full).abs() < 1e-3 * full, "half = {}, full = {}", half, full);
    }

    #[test]
    fn test_host_force_bounds_clamp_longitudinal_impulse() {
        let mut world = hecs::World::new();
        let host = recording_host(false);
        // 240 N and 480 N over one 1/240 s sub-step.
        host.borrow_mut().bounds = ForceBounds {
            min: -240.0,
            max: 480.0,
        };
        let (_, mut contact) =
            tire_contact(&mut world, Vec3::new(10.0, 0.0, 0.0), 1000.0, host.clone(), 0);

        contact.solve(&world, DT, 1.0, 0, 5).unwrap();

        let clamping = *contact.friction().clamping().unwrap();
        assert!((clamping.min + 1.0).abs() < 1e-5, "min = {}", clamping.min);
        assert!((clamping.max - 2.0).abs() < 1e-5, "max = {}", clamping.max);
        let parallel = contact.friction().lambda_total().dot(Vec3::X);
        assert!(parallel >= -1.0 - 1e-5 && parallel <= 2.0 + 1e-5);
    }

    #[test]
    fn test_free_rolling_tire_keeps_speed() {
        let mut world = hecs::World::new();
        let host = Rc::new(RefCell::new(FreeRollingVehicle::new(vec![Tire::new(0.3)], 2000.0)));
        let (entity, mut contact) =
            tire_contact(&mut world, Vec3::new(10.0, 0.0, 0.0), 1000.0, host.clone(), 0);

        for iteration in 0..5 {
            contact.solve(&world, DT, 1.0, iteration, 5).unwrap();
        }

        assert!(contact.slip().abs() < 1e-6);
        let rb = world.get::<&RigidBodyPulses>(entity).unwrap();
        assert!((rb.v.x - 10.0).abs() < 1e-4, "vx = {}", rb.v.x);
        assert!((host.borrow().tires[0].angular_velocity + 10.0 / 0.3).abs() < 1e-3);
    }

    #[test]
    fn test_grinding_tire_is_skipped() {
        let mut world = hecs::World::new();
        let host = recording_host(true);
        let (entity, mut contact) =
            tire_contact(&mut world, Vec3::new(10.0, 0.0, 2.0), 1000.0, host.clone(), 0);

        contact.solve(&world, DT, 1.0, 0, 5).unwrap();

        assert!(host.borrow().modes.is_empty());
        assert_eq!(contact.friction().lambda_total(), Vec3::ZERO);
        assert_eq!(world.get::<&RigidBodyPulses>(entity).unwrap().v, Vec3::new(10.0, 0.0, 2.0));
    }

    #[test]
    fn test_unknown_tire_is_an_error() {
        let mut world = hecs::World::new();
        let host = recording_host(false);
        let (_, mut contact) = tire_contact(&mut world, Vec3::X, 10.0, host, 7);

        assert_eq!(
            contact.solve(&world, DT, 1.0, 0, 5).unwrap_err(),
            SolverError::UnknownTire(7)
        );
    }
}
