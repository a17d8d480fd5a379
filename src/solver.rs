//! Sequential impulse constraint solver.

use crate::config::SolverConfig;
use crate::contact::ContactInfo;
use crate::error::SolverResult;

/// Solve contact constraints using sequential impulse iteration.
///
/// Runs `config.niterations` Gauss-Seidel sweeps over `contact_infos` in
/// list order, then finalizes every contact once. The first error aborts
/// the solve; bodies keep the impulses applied up to that point.
pub fn solve_contacts(
    contact_infos: &mut [Box<dyn ContactInfo>],
    world: &hecs::World,
    dt: f32,
    config: &SolverConfig,
) -> SolverResult<()> {
    let _span =
        tracing::debug_span!("solve_contacts", ncontacts = contact_infos.len(), dt).entered();
    let niterations = config.niterations;
    for iteration in 0..niterations {
        let relaxation = config.relaxation_at(iteration);
        tracing::trace!(iteration, relaxation, "solver sweep");
        for contact_info in contact_infos.iter_mut() {
            contact_info.solve(world, dt, relaxation, iteration, niterations)?;
        }
    }
    for contact_info in contact_infos.iter_mut() {
        contact_info.finalize();
    }
    Ok(())
}
