//! Shared setup helpers for rein-constraints benchmarks.
//!
//! ## Running
//!
//! Solver (criterion):
//!   cargo bench --manifest-path benchmarks/Cargo.toml --bench physics
//!
//! iai-callgrind (instruction counts, requires valgrind):
//!   cargo install iai-callgrind-runner
//!   cargo bench --manifest-path benchmarks/Cargo.toml --bench physics_iai
//!
//! Filter by group:
//!   cargo bench --manifest-path benchmarks/Cargo.toml --bench physics -- solver
//!   cargo bench --manifest-path benchmarks/Cargo.toml --bench physics -- vehicle

use std::cell::RefCell;
use std::rc::Rc;

use glam::Vec3;
use rein::{
    BoundedNormalConstraint1D, ContactInfo, FrictionContactInfo1, FrictionContactInfo2,
    FreeRollingVehicle, NormalContactInfo1, NormalContactInfo2, NormalImpulse,
    PhysicsEngineConfig, PlaneInequalityConstraint, RigidBodyPulses, ShockAbsorberConstraint,
    ShockAbsorberContactInfo1, Tire, TireContactInfo1, TireHost,
};

/// One sub-step of a 60 Hz, 4-sub-step engine.
pub const DT: f32 = 1.0 / 240.0;

pub type Contacts = Vec<Box<dyn ContactInfo>>;

const HALF_EXTENTS: Vec3 = Vec3::splat(0.5);

fn corners(center: Vec3) -> [Vec3; 4] {
    [
        center + Vec3::new(0.5, -0.5, 0.5),
        center + Vec3::new(-0.5, -0.5, 0.5),
        center + Vec3::new(0.5, -0.5, -0.5),
        center + Vec3::new(-0.5, -0.5, -0.5),
    ]
}

// ---------------------------------------------------------------------------
// Basic scenes
// ---------------------------------------------------------------------------

/// `n` unit boxes sliding on the ground in a grid, four corner contacts
/// with friction each.
pub fn setup_sliding_boxes(n: usize) -> anyhow::Result<(hecs::World, Contacts)> {
    let mut world = hecs::World::new();
    let mut contacts: Contacts = Vec::with_capacity(n * 8);
    let cols = (n as f32).sqrt().ceil() as usize;

    for i in 0..n {
        let x = (i % cols) as f32 * 1.5;
        let z = (i / cols) as f32 * 1.5;
        let center = Vec3::new(x, 0.5, z);
        let entity = world.spawn((RigidBodyPulses::new_box(1.0, HALF_EXTENTS, center)
            .with_velocity(Vec3::new(2.0, -0.2, 0.5), Vec3::ZERO),));

        for corner in corners(center) {
            let normal = NormalContactInfo1::new(
                entity,
                BoundedNormalConstraint1D::pushing(PlaneInequalityConstraint::new(Vec3::Y, 0.01)),
                corner,
            );
            let friction = FrictionContactInfo1::new(
                entity,
                normal.normal_impulse().clone(),
                corner,
                0.6,
                0.5,
            )?;
            contacts.push(Box::new(normal));
            contacts.push(Box::new(friction));
        }
    }
    Ok((world, contacts))
}

/// Column of `n` boxes stacked on the ground.
pub fn setup_stack(n: usize) -> anyhow::Result<(hecs::World, Contacts)> {
    let mut world = hecs::World::new();
    let mut contacts: Contacts = Vec::with_capacity(n * 8);
    let mut below: Option<hecs::Entity> = None;

    for i in 0..n {
        let center = Vec3::new(0.0, 0.5 + i as f32, 0.0);
        let entity = world.spawn((RigidBodyPulses::new_box(1.0, HALF_EXTENTS, center)
            .with_velocity(Vec3::new(0.0, -9.81 * DT, 0.0), Vec3::ZERO),));

        for corner in corners(center) {
            let constraint =
                BoundedNormalConstraint1D::pushing(PlaneInequalityConstraint::new(Vec3::Y, 0.002));
            match below {
                Some(other) => {
                    let normal = NormalContactInfo2::new(entity, other, constraint, corner);
                    let friction = FrictionContactInfo2::new(
                        entity,
                        other,
                        normal.normal_impulse().clone(),
                        corner,
                        0.6,
                        0.5,
                    )?;
                    contacts.push(Box::new(normal));
                    contacts.push(Box::new(friction));
                }
                None => {
                    let normal = NormalContactInfo1::new(entity, constraint, corner);
                    let friction = FrictionContactInfo1::new(
                        entity,
                        normal.normal_impulse().clone(),
                        corner,
                        0.6,
                        0.5,
                    )?;
                    contacts.push(Box::new(normal));
                    contacts.push(Box::new(friction));
                }
            }
        }
        below = Some(entity);
    }
    Ok((world, contacts))
}

// ---------------------------------------------------------------------------
// Vehicles
// ---------------------------------------------------------------------------

const WHEELS: [Vec3; 4] = [
    Vec3::new(1.2, -0.5, 0.8),
    Vec3::new(1.2, -0.5, -0.8),
    Vec3::new(-1.2, -0.5, 0.8),
    Vec3::new(-1.2, -0.5, -0.8),
];

/// `n` four-wheeled cars driving along x, each wheel with a suspension
/// and a tire contact.
pub fn setup_vehicles(n: usize) -> anyhow::Result<(hecs::World, Contacts)> {
    let cfg = PhysicsEngineConfig::default();
    let mut world = hecs::World::new();
    let mut contacts: Contacts = Vec::with_capacity(n * 8);

    for i in 0..n {
        let center = Vec3::new(0.0, 0.8, i as f32 * 4.0);
        let chassis = world.spawn((RigidBodyPulses::new_box(
            1200.0,
            Vec3::new(2.0, 0.5, 1.0),
            center,
        )
        .with_velocity(Vec3::new(15.0, 0.0, 0.3), Vec3::ZERO),));
        let tires = WHEELS.iter().map(|_| Tire::new(0.3)).collect();
        let host: Rc<RefCell<dyn TireHost>> =
            Rc::new(RefCell::new(FreeRollingVehicle::new(tires, 3000.0)));

        for (tire_id, offset) in WHEELS.iter().enumerate() {
            let position = center + *offset;
            let suspension = ShockAbsorberContactInfo1::new(
                chassis,
                BoundedNormalConstraint1D::pushing(ShockAbsorberConstraint {
                    normal_impulse: NormalImpulse::new(Vec3::Y),
                    distance: 0.1,
                    stiffness: 30_000.0,
                    damping: 3_000.0,
                }),
                position,
            );
            let friction = FrictionContactInfo1::new(
                chassis,
                suspension.normal_impulse().clone(),
                position,
                f32::NAN,
                f32::NAN,
            )?;
            let tire = TireContactInfo1::new(friction, host.clone(), tire_id, Vec3::X, 1.0, &cfg);
            contacts.push(Box::new(suspension));
            contacts.push(Box::new(tire));
        }
    }
    Ok((world, contacts))
}
