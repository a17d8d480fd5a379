//! Contact Demo - A sliding box and a braking car on flat ground, headless
//!
//! Run with: RUST_LOG=info cargo run -p demo-app
//! Solver spans: RUST_LOG=rein_constraints=trace,info cargo run -p demo-app

use std::cell::RefCell;
use std::rc::Rc;

use anyhow::Context;
use glam::Vec3;
use rein::{
    BoundedNormalConstraint1D, ContactInfo, FreeRollingVehicle, FrictionContactInfo1,
    NormalContactInfo1, NormalImpulse, PhysicsEngineConfig, PlaneInequalityConstraint,
    RigidBodyPulses, ShockAbsorberConstraint, ShockAbsorberContactInfo1, Tire, TireContactInfo1,
    TireHost, solve_contacts,
};

const GRAVITY: Vec3 = Vec3::new(0.0, -9.81, 0.0);
const FRAMES: usize = 240;
/// Frame after which the car brakes.
const BRAKE_FRAME: usize = 60;

const BOX_HALF_EXTENTS: Vec3 = Vec3::splat(0.5);

const WHEEL_RADIUS: f32 = 0.3;
const SUSPENSION_LENGTH: f32 = 0.4;
/// Hub positions relative to the chassis centre of mass.
const WHEELS: [Vec3; 4] = [
    Vec3::new(1.3, -0.3, 0.8),
    Vec3::new(1.3, -0.3, -0.8),
    Vec3::new(-1.3, -0.3, 0.8),
    Vec3::new(-1.3, -0.3, -0.8),
];

struct Scene {
    crate_box: hecs::Entity,
    chassis: hecs::Entity,
    vehicle: Rc<RefCell<FreeRollingVehicle>>,
}

fn setup(world: &mut hecs::World) -> Scene {
    let crate_box = world.spawn((RigidBodyPulses::new_box(
        20.0,
        BOX_HALF_EXTENTS,
        Vec3::new(0.0, 0.5, -5.0),
    )
    .with_velocity(Vec3::new(4.0, 0.0, 0.0), Vec3::ZERO),));
    let chassis = world.spawn((RigidBodyPulses::new_box(
        1200.0,
        Vec3::new(2.0, 0.4, 1.0),
        Vec3::new(0.0, 0.9, 0.0),
    )
    .with_velocity(Vec3::new(20.0, 0.0, 0.0), Vec3::ZERO),));
    let tires = WHEELS.iter().map(|_| Tire::new(WHEEL_RADIUS)).collect();
    let vehicle = Rc::new(RefCell::new(FreeRollingVehicle::new(tires, 4000.0)));
    Scene {
        crate_box,
        chassis,
        vehicle,
    }
}

/// Velocity-level integration of external forces.
fn apply_gravity(world: &mut hecs::World, dt: f32) {
    for (_, rb) in world.query_mut::<&mut RigidBodyPulses>() {
        if rb.inv_mass > 0.0 {
            rb.v += GRAVITY * dt;
        }
    }
}

/// Orientation is not tracked, so contact offsets stay axis-aligned and
/// spin is dropped after every sub-step.
fn integrate_positions(world: &mut hecs::World, dt: f32) {
    for (_, rb) in world.query_mut::<&mut RigidBodyPulses>() {
        rb.abs_com += rb.v * dt;
        rb.w = Vec3::ZERO;
    }
}

/// Ground contacts of the sliding box, one per corner touching y = 0.
fn box_contacts(
    world: &hecs::World,
    entity: hecs::Entity,
    contacts: &mut Vec<Box<dyn ContactInfo>>,
) -> anyhow::Result<()> {
    let center = world.get::<&RigidBodyPulses>(entity)?.abs_com;
    for sx in [-1.0, 1.0] {
        for sz in [-1.0, 1.0] {
            let corner = center + BOX_HALF_EXTENTS * Vec3::new(sx, -1.0, sz);
            if corner.y > 0.0 {
                continue;
            }
            let plane = PlaneInequalityConstraint::new(Vec3::Y, -corner.y);
            let normal =
                NormalContactInfo1::new(entity, BoundedNormalConstraint1D::pushing(plane), corner);
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
    Ok(())
}

/// Suspension and tire contacts of every wheel touching y = 0.
fn vehicle_contacts(
    world: &hecs::World,
    scene: &Scene,
    cfg: &PhysicsEngineConfig,
    contacts: &mut Vec<Box<dyn ContactInfo>>,
) -> anyhow::Result<()> {
    let center = world.get::<&RigidBodyPulses>(scene.chassis)?.abs_com;
    let host: Rc<RefCell<dyn TireHost>> = scene.vehicle.clone();
    for (tire_id, offset) in WHEELS.iter().enumerate() {
        let hub = center + *offset;
        let compression = SUSPENSION_LENGTH + WHEEL_RADIUS - hub.y;
        if compression <= 0.0 {
            continue;
        }
        let contact_point = Vec3::new(hub.x, 0.0, hub.z);
        let suspension = ShockAbsorberContactInfo1::new(
            scene.chassis,
            BoundedNormalConstraint1D::pushing(ShockAbsorberConstraint {
                normal_impulse: NormalImpulse::new(Vec3::Y),
                distance: compression,
                stiffness: 40_000.0,
                damping: 4_000.0,
            }),
            contact_point,
        );
        let friction = FrictionContactInfo1::new(
            scene.chassis,
            suspension.normal_impulse().clone(),
            contact_point,
            f32::NAN,
            f32::NAN,
        )?;
        let tire = TireContactInfo1::new(friction, host.clone(), tire_id, Vec3::X, 1.0, cfg);
        contacts.push(Box::new(suspension));
        contacts.push(Box::new(tire));
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cfg = PhysicsEngineConfig::default();
    let dt = cfg.dt_substeps();
    let mut world = hecs::World::new();
    let scene = setup(&mut world);

    for frame in 0..FRAMES {
        if frame == BRAKE_FRAME {
            log::info!("frame {frame}: braking");
            scene.vehicle.borrow_mut().braking = true;
        }
        for substep in 0..cfg.nsubsteps {
            apply_gravity(&mut world, dt);
            let mut contacts: Vec<Box<dyn ContactInfo>> = Vec::new();
            box_contacts(&world, scene.crate_box, &mut contacts)?;
            vehicle_contacts(&world, &scene, &cfg, &mut contacts)?;
            solve_contacts(&mut contacts, &world, dt, &cfg.solver)
                .with_context(|| format!("frame {frame}, substep {substep}"))?;
            integrate_positions(&mut world, dt);
        }

        if frame % 30 == 0 || frame + 1 == FRAMES {
            let crate_box = world.get::<&RigidBodyPulses>(scene.crate_box)?;
            let chassis = world.get::<&RigidBodyPulses>(scene.chassis)?;
            let vehicle = scene.vehicle.borrow();
            log::info!(
                "frame {frame}: box x={:.3} vx={:.3} | car x={:.2} y={:.3} vx={:.3} wheel0 w={:.2}",
                crate_box.abs_com.x,
                crate_box.v.x,
                chassis.abs_com.x,
                chassis.abs_com.y,
                chassis.v.x,
                vehicle.tires[0].angular_velocity,
            );
        }
    }
    Ok(())
}
