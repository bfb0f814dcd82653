//! Mission start, scheduled launches and whole-flight snapshots through
//! the `Flight` facade.

use hangar_core::prelude::*;
use hangar_logic::config::HangarConfig;
use hangar_logic::design::{PartSpec, ShipDesign};
use hangar_logic::entry::{CrewMember, VesselId};
use hangar_logic::math::{Transform, Vec3};

const DT: f64 = 0.05;

/// Carrier with two bays, one under the other.
fn carrier(flight: &mut Flight) -> VesselId {
    let design = ShipDesign::new(
        "Carrier",
        vec![
            PartSpec::new("pod", 2.0, 1000.0, Vec3::ZERO, Vec3::splat(2.0))
                .with_command()
                .with_crew(3)
                .with_tank("ElectricCharge", 200.0, 200.0),
            PartSpec::new("upper bay", 8.0, 4000.0, Vec3::new(0.0, -6.0, 0.0), Vec3::splat(10.0)),
            PartSpec::new("lower bay", 8.0, 4000.0, Vec3::new(0.0, -16.0, 0.0), Vec3::splat(10.0)),
        ],
    );
    flight.world.spawn_loaded(
        &design,
        Transform::from_position(Vec3::new(0.0, 700_000.0, 0.0)),
        Vec3::new(2200.0, 0.0, 0.0),
    )
}

fn rover(name: &str) -> ShipDesign {
    ShipDesign::new(
        name,
        vec![PartSpec::new("chassis", 1.2, 900.0, Vec3::ZERO, Vec3::new(2.0, 1.0, 3.0)).with_tank(
            "ElectricCharge",
            20.0,
            20.0,
        )],
    )
}

fn gateless() -> HangarConfig {
    HangarConfig {
        gate: None,
        ..HangarConfig::default()
    }
}

#[test]
fn constructs_convert_in_part_order() {
    let mut flight = Flight::new(Scene::Flight);
    let v = carrier(&mut flight);
    // registered out of part order on purpose
    let lower = flight.add_hangar(v, 2, gateless()).unwrap();
    let upper = flight.add_hangar(v, 1, gateless()).unwrap();
    for (id, name) in [(upper, "Alpha"), (lower, "Beta"), (lower, "Gamma")] {
        flight
            .with_hangar(id, |h, world| h.add_construct(world, rover(name), "flag"))
            .unwrap()
            .unwrap();
    }
    flight.hangar_mut(upper).unwrap().activate();
    assert_eq!(flight.registry().earlier(lower), vec![upper]);

    flight.start();
    let mut ticks = 0;
    while !flight.all_ready() && ticks < 1000 {
        flight.update(DT);
        ticks += 1;
        if !flight.registry().is_ready(upper) {
            // the lower bay must not touch its constructs before the upper is done
            assert_eq!(flight.hangar(lower).unwrap().constructs().len(), 2);
        }
    }

    assert!(flight.all_ready(), "conversion did not finish in {ticks} ticks");
    for (id, stored) in [(upper, 1), (lower, 2)] {
        let h = flight.hangar(id).unwrap();
        assert!(h.constructs().is_empty());
        assert_eq!(h.stored().len(), stored);
        assert!(h.totals().agrees_with(&h.resynced_totals(), 1e-9));
    }
    // converted vessels live only inside the hangars
    assert_eq!(flight.world.vessel_count(), 1);
    assert_eq!(flight.world.active_vessel, Some(v));
    assert_eq!(flight.world.save_requests, 2);
    assert!(flight.hangar(upper).unwrap().is_active());
    assert!(!flight.hangar(lower).unwrap().is_active());

    let names: Vec<String> = flight
        .hangar(lower)
        .unwrap()
        .get_vessels()
        .iter()
        .map(|s| s.name.clone())
        .collect();
    // converted vessels take the carrier's name and the bay's
    assert_eq!(names, vec!["Carrier:lower bay".to_string(); 2]);
    let upper_names: Vec<String> = flight
        .hangar(upper)
        .unwrap()
        .get_vessels()
        .iter()
        .map(|s| s.name.clone())
        .collect();
    assert_eq!(upper_names, vec!["Carrier:upper bay".to_string()]);
}

#[test]
fn editor_scene_keeps_constructs() {
    let mut flight = Flight::new(Scene::Editor);
    let v = carrier(&mut flight);
    let id = flight.add_hangar(v, 1, gateless()).unwrap();
    flight
        .with_hangar(id, |h, world| h.add_construct(world, rover("Alpha"), ""))
        .unwrap()
        .unwrap();
    flight.start();
    flight.update(DT);
    assert!(flight.all_ready());
    assert_eq!(flight.hangar(id).unwrap().constructs().len(), 1);
}

#[test]
fn launch_seats_crew_after_loading() {
    let mut flight = Flight::new(Scene::Flight);
    let v = carrier(&mut flight);
    let id = flight.add_hangar(v, 1, gateless()).unwrap();

    let lander = ShipDesign::new(
        "Lander",
        vec![PartSpec::new("can", 0.8, 500.0, Vec3::ZERO, Vec3::splat(1.5)).with_crew(2)],
    );
    let at = Transform::from_position(Vec3::new(0.0, 699_994.0, 0.0));
    let p = flight.world.spawn_loaded(&lander, at, Vec3::new(2200.0, 0.0, 0.0));
    flight.world.update(p, |s: &mut Structure| {
        s.add_crew(&mut vec![CrewMember::new("Valentina", "Pilot"), CrewMember::new("Bob", "Scientist")])
    });

    flight.hangar_mut(id).unwrap().activate();
    assert_eq!(flight.on_contact(id, p), Ok(p));
    assert_eq!(flight.world.structure(v).unwrap().crew_count(), 2);

    let launched = flight.launch(id, p).expect("launch failed");
    assert_eq!(launched, p);
    assert_eq!(flight.scheduler().task_names(), vec!["post-spawn".to_string()]);
    assert_eq!(flight.world.structure(v).unwrap().crew_count(), 0);
    assert_eq!(flight.world.structure(p).unwrap().crew_count(), 0);

    for _ in 0..20 {
        flight.update(DT);
    }
    assert!(flight.scheduler().is_empty());
    assert_eq!(flight.world.structure(p).unwrap().crew_count(), 2);
    assert!(!flight.world.vessel(p).unwrap().held);
}

#[test]
fn launch_refused_while_inactive_reports_once() {
    let mut flight = Flight::new(Scene::Flight);
    let v = carrier(&mut flight);
    let id = flight.add_hangar(v, 1, gateless()).unwrap();
    let p = flight
        .world
        .spawn_loaded(&rover("Scout"), Transform::from_position(Vec3::new(0.0, 699_994.0, 0.0)), Vec3::new(2200.0, 0.0, 0.0));
    flight.with_hangar(id, |h, world| h.store_vessel(world, p, false)).unwrap().unwrap();

    let err = flight.launch(id, p).unwrap_err();
    assert_eq!(err, HangarError::Restore(RestoreRejection::Inactive));
    assert_eq!(flight.world.messages_containing("Activate the hangar first"), 1);
    assert!(flight.scheduler().is_empty());
    assert_eq!(flight.hangar(id).unwrap().stored().len(), 1);
}

#[test]
fn snapshot_round_trip() {
    let mut flight = Flight::new(Scene::Flight);
    let v = carrier(&mut flight);
    let id = flight.add_hangar(v, 1, HangarConfig::default()).unwrap();
    flight
        .with_hangar(id, |h, world| h.add_construct(world, rover("Alpha"), ""))
        .unwrap()
        .unwrap();
    flight.hangar_mut(id).unwrap().activate();
    flight.hangar_mut(id).unwrap().open_gates();
    for _ in 0..10 {
        flight.update(DT);
    }

    let mut buf = Vec::new();
    flight.snapshot(&mut buf).expect("Snapshot failed");

    let mut restored = Flight::new(Scene::Editor);
    restored.restore_snapshot(&buf[..]).expect("Restore failed");

    assert_eq!(restored.world.scene, Scene::Flight);
    assert_eq!(restored.world.tick, flight.world.tick);
    assert_eq!(restored.world.vessel_count(), 1);
    assert_eq!(restored.world.orbit(v), flight.world.orbit(v));
    let (a, b) = (flight.hangar(id).unwrap(), restored.hangar(id).unwrap());
    assert_eq!(b.gate_state(), a.gate_state());
    assert_eq!(b.state(), a.state());
    assert_eq!(b.constructs().ids(), a.constructs().ids());
    assert!(b.totals().agrees_with(a.totals(), 1e-12));
    assert_eq!(restored.registry().hangars_on(v), vec![id]);

    // ids keep counting from where the snapshot left off
    let next = restored.add_hangar(v, 2, HangarConfig::default()).unwrap();
    assert_eq!(next, HangarId(1));
}

#[test]
fn flight_node_round_trip() {
    let mut flight = Flight::new(Scene::Flight);
    let v = carrier(&mut flight);
    let id = flight.add_hangar(v, 1, gateless()).unwrap();
    flight
        .with_hangar(id, |h, world| h.add_construct(world, rover("Alpha"), ""))
        .unwrap()
        .unwrap();
    flight.hangar_mut(id).unwrap().activate();
    let node = flight.save();

    flight.with_hangar(id, |h, world| h.clear_constructs(world)).unwrap();
    flight.hangar_mut(id).unwrap().deactivate();

    flight.load(&node).expect("load failed");
    let h = flight.hangar(id).unwrap();
    assert!(h.is_active());
    assert_eq!(h.constructs().len(), 1);
    let bay_mass = flight.world.structure(v).unwrap().parts[1].mass;
    assert!((bay_mass - (8.0 + 1.2)).abs() < 1e-9);
}
