//! Solver and physics-engine configuration.

/// Iteration schedule of [`solve_contacts`](crate::solver::solve_contacts).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolverConfig {
    /// Number of Gauss-Seidel sweeps over the contact list. Default: 5.
    pub niterations: usize,
    /// Relaxation of the first sweep. Default: 0.2.
    ///
    /// A soft first sweep limits overshoot on the first contact after a
    /// penetration.
    pub first_relaxation: f32,
    /// Relaxation of the remaining sweeps. Default: 1.0.
    pub relaxation: f32,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            niterations: 5,
            first_relaxation: 0.2,
            relaxation: 1.0,
        }
    }
}

impl SolverConfig {
    /// Relaxation used in the given sweep.
    #[inline]
    pub fn relaxation_at(&self, iteration: usize) -> f32 {
        if iteration == 0 {
            self.first_relaxation
        } else {
            self.relaxation
        }
    }
}

/// Engine-wide parameters read by the contact models.
#[derive(Debug, Clone)]
pub struct PhysicsEngineConfig {
    /// Frame timestep in seconds. Default: 1/60.
    pub dt: f32,
    /// Number of physics sub-steps per frame. Default: 4.
    pub nsubsteps: usize,
    /// Speed below which tires use the slow surface-power budget and the
    /// slip denominator is floored. Default: 2.0 m/s.
    pub hand_brake_velocity: f32,
    /// Upper bound of the slip-angle friction boost. Default: 0.0.
    pub max_extra_friction: f32,
    /// Upper bound of the slip-angle angular-coupling boost. Default: 0.0.
    pub max_extra_w: f32,
    /// Saturate the tire magic formula at its peak. Default: false.
    pub no_slip: bool,
    /// Iteration schedule.
    pub solver: SolverConfig,
}

impl Default for PhysicsEngineConfig {
    fn default() -> Self {
        Self {
            dt: 1.0 / 60.0,
            nsubsteps: 4,
            hand_brake_velocity: 2.0,
            max_extra_friction: 0.0,
            max_extra_w: 0.0,
            no_slip: false,
            solver: SolverConfig::default(),
        }
    }
}

impl PhysicsEngineConfig {
    /// Duration of one physics sub-step.
    #[inline]
    pub fn dt_substeps(&self) -> f32 {
        self.dt / self.nsubsteps.max(1) as f32
    }
}
