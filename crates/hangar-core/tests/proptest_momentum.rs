//! Momentum through a full dock and launch cycle, over random velocities
//! and launch impulses.

use hangar_core::prelude::*;
use hangar_logic::config::HangarConfig;
use hangar_logic::design::{PartSpec, ShipDesign};
use hangar_logic::entry::VesselId;
use hangar_logic::math::{Transform, Vec3};
use proptest::prelude::*;

const HOST_POSITION: Vec3 = Vec3 {
    x: 0.0,
    y: 700_000.0,
    z: 0.0,
};

fn vec3(range: f64) -> impl Strategy<Value = Vec3> {
    (-range..range, -range..range, -range..range).prop_map(|(x, y, z)| Vec3::new(x, y, z))
}

fn momentum(world: &FlightWorld, ids: &[VesselId]) -> Vec3 {
    ids.iter().fold(Vec3::ZERO, |acc, id| {
        let v = world.orbit(*id).map(|o| o.velocity).unwrap_or_default();
        acc + v * world.vessel_mass(*id)
    })
}

proptest! {
    #[test]
    fn dock_and_launch_conserve_momentum(
        host_v in vec3(3000.0),
        drift in vec3(0.5),
        punch in vec3(5.0),
        host_mass in 2.0f64..50.0,
        cargo_mass in 0.1f64..10.0,
    ) {
        let mut world = FlightWorld::new(Scene::Flight);
        let carrier = ShipDesign::new(
            "Carrier",
            vec![
                PartSpec::new("pod", host_mass, 1000.0, Vec3::ZERO, Vec3::splat(2.0)).with_command(),
                PartSpec::new("bay", 8.0, 4000.0, Vec3::new(0.0, -6.0, 0.0), Vec3::splat(10.0)),
            ],
        );
        let host = world.spawn_loaded(&carrier, Transform::from_position(HOST_POSITION), host_v);
        let config = HangarConfig {
            gate: None,
            launch_with_punch: true,
            launch_velocity: format!("{},{},{}", punch.x, punch.y, punch.z),
            ..HangarConfig::default()
        };
        let mut hangar = Hangar::new(HangarId(0), host, 1, config);
        prop_assert!(hangar.setup(&mut world, false).is_ok());
        hangar.activate();

        let cargo = ShipDesign::new(
            "Cargo",
            vec![PartSpec::new("crate", cargo_mass, 100.0, Vec3::ZERO, Vec3::splat(1.5)).with_command()],
        );
        let at = Transform::from_position(HOST_POSITION + Vec3::new(0.0, -6.0, 0.0));
        let id = world.spawn_loaded(&cargo, at, host_v + drift);

        let before = momentum(&world, &[host, id]);
        let scale = before.length().max(1.0);
        prop_assert_eq!(hangar.store_vessel(&mut world, id, true), Ok(id));
        let docked = momentum(&world, &[host]);
        prop_assert!((docked - before).length() / scale < 1e-9);

        prop_assert!(hangar.try_restore(&mut world, id).is_ok());
        let launched = momentum(&world, &[host, id]);
        prop_assert!((launched - docked).length() / scale < 1e-9);
    }
}
