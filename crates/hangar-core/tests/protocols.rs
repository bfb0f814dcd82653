//! Store and restore protocols driven against a live flight world.

use hangar_core::prelude::*;
use hangar_logic::config::{HangarConfig, SpaceConfig};
use hangar_logic::constants::keys;
use hangar_logic::design::{PartSpec, ShipDesign};
use hangar_logic::entry::{CrewMember, VesselId};
use hangar_logic::math::{Transform, Vec3};
use hangar_logic::node::Node;
use hangar_logic::resources::ResourceStore;
use hangar_logic::state::HangarState;

const HOST_POSITION: Vec3 = Vec3 {
    x: 0.0,
    y: 700_000.0,
    z: 0.0,
};

fn carrier(world: &mut FlightWorld) -> VesselId {
    let design = ShipDesign::new(
        "Carrier",
        vec![
            PartSpec::new("pod", 2.0, 1000.0, Vec3::ZERO, Vec3::splat(2.0))
                .with_command()
                .with_crew(2)
                .with_tank("ElectricCharge", 50.0, 50.0)
                .with_tank("LiquidFuel", 100.0, 200.0),
            PartSpec::new("bay", 10.0, 5000.0, Vec3::new(0.0, -6.0, 0.0), Vec3::splat(10.0)),
        ],
    );
    world.spawn_loaded(&design, Transform::from_position(HOST_POSITION), Vec3::ZERO)
}

fn drone(world: &mut FlightWorld, velocity: Vec3) -> VesselId {
    let design = ShipDesign::new(
        "Drone",
        vec![PartSpec::new("core", 0.5, 300.0, Vec3::ZERO, Vec3::new(1.0, 2.0, 1.0))
            .with_command()
            .with_crew(1)
            .with_tank("LiquidFuel", 50.0, 100.0)],
    );
    let at = Transform::from_position(HOST_POSITION + Vec3::new(0.0, -6.0, 0.0));
    let id = world.spawn_loaded(&design, at, velocity);
    world.update(id, |s: &mut Structure| s.add_crew(&mut vec![CrewMember::new("Jebediah", "Pilot")]));
    id
}

fn gateless() -> HangarConfig {
    HangarConfig {
        gate: None,
        ..HangarConfig::default()
    }
}

fn hangar(world: &mut FlightWorld, config: HangarConfig) -> Hangar {
    let host = carrier(world);
    let mut h = Hangar::new(HangarId(0), host, 1, config);
    h.setup(world, false).expect("setup failed");
    h
}

fn fuel(world: &FlightWorld, id: VesselId) -> f64 {
    world.structure(id).map(|s| s.amount("LiquidFuel")).unwrap_or(0.0)
}

// ── Store ───────────────────────────────────────────────────────────────

#[test]
fn store_conserves_momentum_and_moves_crew() {
    let mut world = FlightWorld::new(Scene::Flight);
    let mut h = hangar(&mut world, gateless());
    h.activate();
    let v = Vec3::new(0.5, 0.0, 0.2);
    let candidate = drone(&mut world, v);
    world.set_active(candidate);

    let big_m = world.vessel_mass(h.vessel());
    let m = world.vessel_mass(candidate);
    let id = h.store_vessel(&mut world, candidate, true).expect("store failed");

    assert_eq!(id, candidate);
    assert!(!world.contains(candidate));
    assert_eq!(world.active_vessel, Some(h.vessel()));
    let after = world.orbit(h.vessel()).unwrap().velocity;
    let momentum = after * (big_m + m);
    assert!(momentum.approx_eq(&(v * m), 1e-9));

    // the bay has no seats, so the pilot lands in the pod
    let host = world.structure(h.vessel()).unwrap();
    assert_eq!(host.crew_count(), 1);
    assert!((host.parts[1].mass - (10.0 + m)).abs() < 1e-9);
    assert_eq!(world.messages_containing("docked inside the hangar"), 1);
}

#[test]
fn store_is_noop_while_inactive() {
    let mut world = FlightWorld::new(Scene::Flight);
    let mut h = hangar(&mut world, gateless());
    let candidate = drone(&mut world, Vec3::ZERO);

    assert_eq!(h.store_vessel(&mut world, candidate, true), Err(StoreRejection::Inactive));
    assert!(world.contains(candidate));
    assert!(h.stored().is_empty());
    assert!(world.messages.is_empty());
    assert!(h.debounce().is_empty());
}

#[test]
fn contact_before_activation_does_not_block_storing() {
    let mut world = FlightWorld::new(Scene::Flight);
    let mut h = hangar(&mut world, gateless());
    let candidate = drone(&mut world, Vec3::ZERO);
    for _ in 0..5 {
        assert_eq!(h.store_vessel(&mut world, candidate, true), Err(StoreRejection::Inactive));
        h.fixed_update(&mut world, 0.02);
    }

    h.activate();
    h.fixed_update(&mut world, 0.02);
    assert_eq!(h.store_vessel(&mut world, candidate, true), Ok(candidate));
    assert_eq!(h.stored().len(), 1);
}

#[test]
fn vessel_that_slows_down_is_stored_on_next_contact() {
    let mut world = FlightWorld::new(Scene::Flight);
    let mut h = hangar(&mut world, gateless());
    h.activate();
    let candidate = drone(&mut world, Vec3::new(3.0, 0.0, 0.0));

    for _ in 0..3 {
        assert!(matches!(
            h.store_vessel(&mut world, candidate, true),
            Err(StoreRejection::TooFast { .. })
        ));
    }
    // momentary rejections are shown, not remembered
    assert_eq!(world.messages_containing("relative speed"), 1);
    assert!(h.debounce().is_empty());

    world.update(candidate, |o: &mut OrbitState| o.velocity = Vec3::new(0.5, 0.0, 0.0));
    assert_eq!(h.store_vessel(&mut world, candidate, true), Ok(candidate));
}

#[test]
fn store_rejects_without_crew_seats() {
    let mut world = FlightWorld::new(Scene::Flight);
    let mut h = hangar(&mut world, gateless());
    h.activate();
    world.update(h.vessel(), |s: &mut Structure| {
        s.add_crew(&mut vec![CrewMember::new("Bill", "Engineer"), CrewMember::new("Bob", "Scientist")])
    });
    let candidate = drone(&mut world, Vec3::ZERO);

    assert_eq!(
        h.store_vessel(&mut world, candidate, true),
        Err(StoreRejection::NoCrewSpace { crew: 1, free: 0 })
    );
    assert!(world.contains(candidate));
}

#[test]
fn debounce_reports_once_and_clears_on_success() {
    let mut world = FlightWorld::new(Scene::Flight);
    let mut h = hangar(&mut world, gateless());
    h.activate();
    let seated = vec![CrewMember::new("Bill", "Engineer"), CrewMember::new("Bob", "Scientist")];
    world.update(h.vessel(), |s: &mut Structure| s.add_crew(&mut seated.clone()));
    let candidate = drone(&mut world, Vec3::ZERO);

    assert!(matches!(
        h.store_vessel(&mut world, candidate, true),
        Err(StoreRejection::NoCrewSpace { .. })
    ));
    assert_eq!(h.store_vessel(&mut world, candidate, true), Err(StoreRejection::Debounced));
    assert_eq!(world.messages_containing("Not enough space for the crew"), 1);
    assert!(h.debounce().contains(&candidate));

    world.update(h.vessel(), |s: &mut Structure| s.remove_crew(&seated[..1]));
    h.fixed_update(&mut world, 3.5);
    assert!(h.debounce().is_empty());
    assert!(h.store_vessel(&mut world, candidate, true).is_ok());
    assert!(h.debounce().is_empty());
}

// ── Restore ─────────────────────────────────────────────────────────────

#[test]
fn restore_guards() {
    let mut world = FlightWorld::new(Scene::Flight);
    let mut h = hangar(&mut world, HangarConfig::default());
    let candidate = drone(&mut world, Vec3::ZERO);
    let id = h.store_vessel(&mut world, candidate, false).expect("store failed");

    assert_eq!(
        h.try_restore(&mut world, id).unwrap_err(),
        HangarError::Restore(RestoreRejection::Inactive)
    );
    h.activate();
    assert_eq!(
        h.try_restore(&mut world, id).unwrap_err(),
        HangarError::Restore(RestoreRejection::GatesNotOpen)
    );
    h.open_gates();
    for _ in 0..40 {
        h.fixed_update(&mut world, 0.1);
    }
    assert_eq!(h.gate_state(), hangar_logic::state::GateState::Opened);

    world.update(h.vessel(), |o: &mut OrbitState| o.angular_velocity = Vec3::new(0.0, 0.01, 0.0));
    assert!(matches!(
        h.try_restore(&mut world, id),
        Err(HangarError::Restore(RestoreRejection::Rotating { .. }))
    ));
    world.update(h.vessel(), |o: &mut OrbitState| o.angular_velocity = Vec3::ZERO);

    world.clear_to_save = ClearToSave::InAtmosphere;
    assert_eq!(
        h.try_restore(&mut world, id).unwrap_err(),
        HangarError::Restore(RestoreRejection::InAtmosphere)
    );
    world.clear_to_save = ClearToSave::Clear;

    assert_eq!(h.stored().len(), 1);
    assert!(h.try_restore(&mut world, id).is_ok());
    assert_eq!(h.state(), HangarState::Inactive);
}

#[test]
fn restore_unknown_entry_is_internal_error() {
    let mut world = FlightWorld::new(Scene::Flight);
    let mut h = hangar(&mut world, gateless());
    h.activate();
    let missing = VesselId::new();
    assert_eq!(
        h.try_restore(&mut world, missing).unwrap_err(),
        HangarError::MissingEntry(missing)
    );
    assert_eq!(world.messages_containing("This should never happen!"), 1);
}

#[test]
fn launch_punch_conserves_momentum() {
    let mut world = FlightWorld::new(Scene::Flight);
    let config = HangarConfig {
        launch_with_punch: true,
        launch_velocity: "0,5,0".to_string(),
        ..gateless()
    };
    let mut h = hangar(&mut world, config);
    let candidate = drone(&mut world, Vec3::ZERO);
    let id = h.store_vessel(&mut world, candidate, false).expect("store failed");
    h.activate();

    let outcome = h.try_restore(&mut world, id).expect("launch failed");
    assert_eq!(outcome.vessel, id);
    assert_eq!(world.active_vessel, Some(id));

    let host_mass = world.vessel_mass(h.vessel());
    let launched_mass = world.vessel_mass(id);
    let host_v = world.orbit(h.vessel()).unwrap().velocity;
    let launched_v = world.orbit(id).unwrap().velocity;
    assert!(launched_v.y > 0.0);
    assert!(host_v.y < 0.0);
    let total = host_v * host_mass + launched_v * launched_mass;
    assert!(total.approx_eq(&Vec3::ZERO, 1e-9));
    assert!((world.structure(h.vessel()).unwrap().parts[1].mass - 10.0).abs() < 1e-9);
}

#[test]
fn launched_vessel_is_placed_at_launch_point() {
    let mut world = FlightWorld::new(Scene::Flight);
    let mut h = hangar(&mut world, gateless());
    let candidate = drone(&mut world, Vec3::ZERO);
    let id = h.store_vessel(&mut world, candidate, false).expect("store failed");
    h.activate();
    h.try_restore(&mut world, id).expect("launch failed");

    // single-part vessel: bounds centre and origin coincide with the bay
    let at = world.orbit(id).unwrap().position;
    assert!(at.approx_eq(&(HOST_POSITION + Vec3::new(0.0, -6.0, 0.0)), 1e-9));
    let vessel = world.vessel(id).unwrap();
    assert!(vessel.held);
    assert!(!vessel.landed_or_splashed());
}

// ── Resources ───────────────────────────────────────────────────────────

#[test]
fn transfer_conserves_pool_and_keeps_totals_in_step() {
    let mut world = FlightWorld::new(Scene::Flight);
    let mut h = hangar(&mut world, gateless());
    let candidate = drone(&mut world, Vec3::ZERO);
    let id = h.store_vessel(&mut world, candidate, false).expect("store failed");

    assert!(h.prepare_resource_list(&world, id));
    assert_eq!(h.set_resource_amount("LiquidFuel", 500.0), Some(100.0));
    let summary = h.transfer_resources(&mut world).expect("nothing transferred");
    assert_eq!(summary.moved, vec![("LiquidFuel".to_string(), 50.0)]);

    let stored = h.get_vessel(&id).unwrap();
    assert!((fuel(&world, h.vessel()) + stored.amount("LiquidFuel") - 150.0).abs() < 1e-9);
    assert!((stored.mass - 1.0).abs() < 1e-9);
    assert!(h.totals().agrees_with(&h.resynced_totals(), 1e-9));
    let bay_mass = world.structure(h.vessel()).unwrap().parts[1].mass;
    assert!((bay_mass - 11.0).abs() < 1e-9);

    h.setup(&mut world, true).expect("reset failed");
    assert!(h.totals().agrees_with(&h.resynced_totals(), 1e-9));
    assert!((world.structure(h.vessel()).unwrap().parts[1].mass - bay_mass).abs() < 1e-9);
    assert!((h.totals().base_mass - 10.0).abs() < 1e-9);
}

#[test]
fn pending_transfer_settles_on_launch() {
    let mut world = FlightWorld::new(Scene::Flight);
    let mut h = hangar(&mut world, gateless());
    let candidate = drone(&mut world, Vec3::ZERO);
    let id = h.store_vessel(&mut world, candidate, false).expect("store failed");

    h.prepare_resource_list(&world, id);
    h.set_resource_amount("LiquidFuel", 0.0);
    h.activate();
    h.try_restore(&mut world, id).expect("launch failed");

    assert!((fuel(&world, id) - 0.0).abs() < 1e-9);
    assert!((fuel(&world, h.vessel()) - 150.0).abs() < 1e-9);
    assert!(h.resource_manifests().is_empty());
}

#[test]
fn no_transfers_config_skips_negotiation() {
    let mut world = FlightWorld::new(Scene::Flight);
    let mut h = hangar(
        &mut world,
        HangarConfig {
            no_transfers: true,
            ..gateless()
        },
    );
    let candidate = drone(&mut world, Vec3::ZERO);
    let id = h.store_vessel(&mut world, candidate, false).expect("store failed");
    assert!(!h.prepare_resource_list(&world, id));
    assert!(h.transfer_resources(&mut world).is_none());
}

// ── Scenario and persistence ────────────────────────────────────────────

fn block(world: &mut FlightWorld, name: &str, size: Vec3) -> VesselId {
    let design = ShipDesign::new(name, vec![PartSpec::new("block", 1.0, 10.0, Vec3::ZERO, size)]);
    let at = Transform::from_position(HOST_POSITION + Vec3::new(0.0, -6.0, 0.0));
    world.spawn_loaded(&design, at, Vec3::ZERO)
}

#[test]
fn hundred_cubic_metre_bay() {
    let mut world = FlightWorld::new(Scene::Flight);
    let config = HangarConfig {
        hangar_space: Some(SpaceConfig {
            size: Vec3::new(10.0, 5.0, 2.0),
            center: Vec3::ZERO,
            mesh: None,
            use_mesh: false,
        }),
        ..gateless()
    };
    let mut h = hangar(&mut world, config);
    h.activate();
    assert!((h.hangar_metric().volume - 100.0).abs() < 1e-9);

    let a = block(&mut world, "A", Vec3::new(6.0, 5.0, 2.0));
    let b = block(&mut world, "B", Vec3::new(5.0, 5.0, 2.0));

    h.store_vessel(&mut world, a, true).expect("A should fit");
    assert!((h.stored().used_volume() - 60.0).abs() < 1e-9);

    assert_eq!(h.store_vessel(&mut world, b, true), Err(StoreRejection::NoRoom));
    assert!(world.contains(b));
    assert_eq!(h.stored().len(), 1);
    assert!((h.stored().used_volume() - 60.0).abs() < 1e-9);

    h.try_restore(&mut world, a).expect("launch failed");
    assert_eq!(h.stored().used_volume(), 0.0);

    h.activate();
    h.store_vessel(&mut world, b, true).expect("B should fit now");
    assert!((h.stored().used_volume() - 50.0).abs() < 1e-9);
}

#[test]
fn module_node_round_trip() {
    let mut world = FlightWorld::new(Scene::Flight);
    let mut h = hangar(&mut world, gateless());
    let candidate = drone(&mut world, Vec3::ZERO);
    let id = h.store_vessel(&mut world, candidate, false).expect("store failed");
    h.activate();

    let mut node = Node::new("MODULE");
    h.on_save(&mut node);
    assert!(node.has_node(keys::STORED_VESSELS));
    assert!(!node.has_node(keys::PACKED_CONSTRUCTS));

    let mut other = Hangar::new(HangarId(1), h.vessel(), 1, gateless());
    other.on_load(&node).expect("load failed");
    other.setup(&mut world, false).expect("setup failed");
    assert!(other.is_active());
    assert_eq!(other.stored().ids(), vec![id]);
    assert!(other.totals().agrees_with(h.totals(), 1e-9));
    assert_eq!(other.module_cost(), h.module_cost());
}
