//! Binary snapshots of a whole flight
//!
//! Uses bincode for the entire flight: world globals, every vessel entity
//! and every hangar record. Components are serialized individually then
//! reconstructed on load. Scheduled tasks are not part of a snapshot; a
//! restored flight starts with an empty scheduler.

use hecs::World;
use serde::{Deserialize, Serialize};
use std::io::{Read, Write};
use thiserror::Error;

use hangar_logic::entry::VesselId;
use hangar_logic::resources::ResourceLibrary;

use crate::components::*;
use crate::hangar::HangarRecord;
use crate::registry::ReadinessRegistry;
use crate::world::{CelestialBody, ClearToSave, FlightWorld, Scene, ScreenMessage};

/// Version number for snapshot format (increment when format changes)
const SNAPSHOT_VERSION: u32 = 1;

/// Serializable snapshot of a flight
#[derive(Serialize, Deserialize)]
pub struct SnapshotData {
    pub version: u32,
    pub time: f64,
    pub tick: u64,
    pub scene: Scene,
    pub clear_to_save: ClearToSave,
    pub active_vessel: Option<VesselId>,
    pub body: CelestialBody,
    pub library: ResourceLibrary,
    pub messages: Vec<ScreenMessage>,
    pub save_requests: u32,
    pub load_ticks: u32,
    pub vessels: Vec<SerializableVessel>,
    pub hangars: Vec<HangarRecord>,
    pub registry: ReadinessRegistry,
    pub next_hangar: u32,
}

/// All components a vessel entity may carry, serialized as optionals
#[derive(Serialize, Deserialize, Default)]
pub struct SerializableVessel {
    pub vessel: Option<Vessel>,
    pub orbit: Option<OrbitState>,
    pub structure: Option<Structure>,
}

fn serialize_vessels(world: &World) -> Vec<SerializableVessel> {
    let mut vessels: Vec<SerializableVessel> = world
        .iter()
        .map(|entity| SerializableVessel {
            vessel: entity.get::<&Vessel>().map(|c| (*c).clone()),
            orbit: entity.get::<&OrbitState>().map(|c| *c),
            structure: entity.get::<&Structure>().map(|c| (*c).clone()),
        })
        .collect();
    // entity order is an allocation detail
    vessels.sort_by_key(|v| v.vessel.as_ref().map(|v| v.id));
    vessels
}

fn spawn_vessel(world: &mut World, sv: SerializableVessel) {
    let entity = world.spawn(());
    if let Some(c) = sv.vessel {
        let _ = world.insert_one(entity, c);
    }
    if let Some(c) = sv.orbit {
        let _ = world.insert_one(entity, c);
    }
    if let Some(c) = sv.structure {
        let _ = world.insert_one(entity, c);
    }
}

/// Write `world` and the hangar state to `writer`.
pub fn save_flight<W: Write>(
    writer: W,
    world: &FlightWorld,
    hangars: Vec<HangarRecord>,
    registry: &ReadinessRegistry,
    next_hangar: u32,
) -> Result<(), SnapshotError> {
    let data = SnapshotData {
        version: SNAPSHOT_VERSION,
        time: world.time,
        tick: world.tick,
        scene: world.scene,
        clear_to_save: world.clear_to_save,
        active_vessel: world.active_vessel,
        body: world.body.clone(),
        library: world.library.clone(),
        messages: world.messages.clone(),
        save_requests: world.save_requests,
        load_ticks: world.load_ticks,
        vessels: serialize_vessels(&world.world),
        hangars,
        registry: registry.clone(),
        next_hangar,
    };
    bincode::serialize_into(writer, &data)?;
    Ok(())
}

/// Read a snapshot written by [`save_flight`].
pub fn load_flight<R: Read>(reader: R) -> Result<LoadedFlight, SnapshotError> {
    let data: SnapshotData = bincode::deserialize_from(reader)?;
    if data.version != SNAPSHOT_VERSION {
        return Err(SnapshotError::VersionMismatch {
            expected: SNAPSHOT_VERSION,
            found: data.version,
        });
    }

    let mut world = FlightWorld::new(data.scene);
    world.time = data.time;
    world.tick = data.tick;
    world.clear_to_save = data.clear_to_save;
    world.active_vessel = data.active_vessel;
    world.body = data.body;
    world.library = data.library;
    world.messages = data.messages;
    world.save_requests = data.save_requests;
    world.load_ticks = data.load_ticks;
    for sv in data.vessels {
        spawn_vessel(&mut world.world, sv);
    }

    Ok(LoadedFlight {
        world,
        hangars: data.hangars,
        registry: data.registry,
        next_hangar: data.next_hangar,
    })
}

/// Result of loading a snapshot
pub struct LoadedFlight {
    pub world: FlightWorld,
    pub hangars: Vec<HangarRecord>,
    pub registry: ReadinessRegistry,
    pub next_hangar: u32,
}

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Bincode(#[from] Box<bincode::ErrorKind>),

    #[error("Snapshot version mismatch: expected {expected}, found {found}")]
    VersionMismatch { expected: u32, found: u32 },
}

#[cfg(test)]
mod tests {
    use super::*;
    use hangar_logic::design::{PartSpec, ShipDesign};
    use hangar_logic::math::{Transform, Vec3};

    #[test]
    fn test_version_mismatch() {
        let world = FlightWorld::new(Scene::Flight);
        let mut buf = Vec::new();
        save_flight(&mut buf, &world, Vec::new(), &ReadinessRegistry::new(), 0).expect("Save failed");
        // version is the leading little-endian u32
        buf[0] = 9;
        match load_flight(&buf[..]) {
            Err(SnapshotError::VersionMismatch { expected, found }) => {
                assert_eq!(expected, SNAPSHOT_VERSION);
                assert_eq!(found, 9);
            }
            _ => panic!("expected a version mismatch"),
        }
    }

    #[test]
    fn test_vessels_roundtrip() {
        let mut world = FlightWorld::new(Scene::Flight);
        let design = ShipDesign::new(
            "Tug",
            vec![PartSpec::new("core", 1.5, 800.0, Vec3::ZERO, Vec3::ONE).with_tank("LiquidFuel", 10.0, 20.0)],
        );
        let id = world.spawn_loaded(&design, Transform::from_position(Vec3::new(0.0, 650_000.0, 0.0)), Vec3::new(0.0, 0.0, 2200.0));
        world.tick(0.5);

        let mut buf = Vec::new();
        save_flight(&mut buf, &world, Vec::new(), &ReadinessRegistry::new(), 0).expect("Save failed");
        let loaded = load_flight(&buf[..]).expect("Load failed");

        assert_eq!(loaded.world.vessel_count(), 1);
        assert_eq!(loaded.world.tick, 1);
        assert_eq!(loaded.world.orbit(id), world.orbit(id));
        assert!((loaded.world.vessel_mass(id) - world.vessel_mass(id)).abs() < 1e-9);
    }
}
