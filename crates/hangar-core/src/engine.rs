//! Flight - main entry point for running hangars inside a flight

use std::collections::BTreeMap;

use hangar_logic::config::HangarConfig;
use hangar_logic::entry::VesselId;
use hangar_logic::node::{Node, NodeError};

use crate::hangar::{Hangar, HangarError, HangarId};
use crate::persistence::{load_flight, save_flight, SnapshotError};
use crate::registry::ReadinessRegistry;
use crate::scheduler::{Scheduler, TaskContext, TaskId};
use crate::tasks::ConvertConstructsTask;
use crate::world::{FlightWorld, Scene};

/// Node name of one hangar inside [`Flight::save`].
pub const HANGAR_NODE: &str = "HANGAR";

/// A flight with its hangars
pub struct Flight {
    /// Host simulation
    pub world: FlightWorld,
    hangars: BTreeMap<HangarId, Hangar>,
    registry: ReadinessRegistry,
    scheduler: Scheduler,
    next_hangar: u32,
}

impl Flight {
    pub fn new(scene: Scene) -> Self {
        Self {
            world: FlightWorld::new(scene),
            hangars: BTreeMap::new(),
            registry: ReadinessRegistry::new(),
            scheduler: Scheduler::new(),
            next_hangar: 0,
        }
    }

    /// Mount a hangar on `vessel`'s part `part_index`.
    pub fn add_hangar(
        &mut self,
        vessel: VesselId,
        part_index: usize,
        config: HangarConfig,
    ) -> Result<HangarId, HangarError> {
        if !self.world.contains(vessel) {
            return Err(HangarError::UnknownVessel(vessel));
        }
        let id = HangarId(self.next_hangar);
        let mut hangar = Hangar::new(id, vessel, part_index, config);
        hangar.setup(&mut self.world, false)?;
        self.next_hangar += 1;
        self.registry.register(vessel, part_index, id);
        self.hangars.insert(id, hangar);
        Ok(id)
    }

    pub fn remove_hangar(&mut self, id: HangarId) -> Option<Hangar> {
        self.registry.unregister(id);
        self.hangars.remove(&id)
    }

    pub fn hangar(&self, id: HangarId) -> Option<&Hangar> {
        self.hangars.get(&id)
    }

    pub fn hangar_mut(&mut self, id: HangarId) -> Option<&mut Hangar> {
        self.hangars.get_mut(&id)
    }

    pub fn hangar_ids(&self) -> Vec<HangarId> {
        self.hangars.keys().copied().collect()
    }

    pub fn registry(&self) -> &ReadinessRegistry {
        &self.registry
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    /// Run `f` on one hangar and the world it lives in.
    pub fn with_hangar<R>(
        &mut self,
        id: HangarId,
        f: impl FnOnce(&mut Hangar, &mut FlightWorld) -> R,
    ) -> Result<R, HangarError> {
        let hangar = self.hangars.get_mut(&id).ok_or(HangarError::UnknownHangar(id))?;
        Ok(f(hangar, &mut self.world))
    }

    // ── Running ─────────────────────────────────────────────────────────

    /// Start the mission: every hangar converts its packed constructs, in
    /// part order per vessel.
    pub fn start(&mut self) -> Vec<TaskId> {
        let ids: Vec<HangarId> = self.hangars.keys().copied().collect();
        ids.into_iter()
            .map(|id| {
                self.registry.set_ready(id, false);
                self.scheduler.spawn(Box::new(ConvertConstructsTask::new(id)))
            })
            .collect()
    }

    /// Advance the flight by `delta_seconds`.
    pub fn update(&mut self, delta_seconds: f64) {
        for hangar in self.hangars.values_mut() {
            hangar.fixed_update(&mut self.world, delta_seconds);
        }
        self.world.tick(delta_seconds);
        let mut cx = TaskContext {
            world: &mut self.world,
            hangars: &mut self.hangars,
            registry: &mut self.registry,
        };
        self.scheduler.run(&mut cx);
    }

    /// Every hangar is done converting its constructs.
    pub fn all_ready(&self) -> bool {
        self.hangars.keys().all(|id| self.registry.is_ready(*id))
    }

    // ── Protocols ───────────────────────────────────────────────────────

    /// `candidate` touched the hangar's trigger volume.
    pub fn on_contact(&mut self, hangar: HangarId, candidate: VesselId) -> Result<VesselId, HangarError> {
        self.with_hangar(hangar, |h, world| h.store_vessel(world, candidate, true))?
            .map_err(HangarError::from)
    }

    /// Launch stored vessel `vessel` and schedule the rest of its spawn.
    pub fn launch(&mut self, hangar: HangarId, vessel: VesselId) -> Result<VesselId, HangarError> {
        let outcome = self.with_hangar(hangar, |h, world| h.try_restore(world, vessel))??;
        self.scheduler.spawn(Box::new(outcome.task));
        Ok(outcome.vessel)
    }

    // ── Persistence ─────────────────────────────────────────────────────

    /// Persisted node of every hangar, in id order.
    pub fn save(&self) -> Node {
        let mut root = Node::new("HANGARS");
        for (id, hangar) in &self.hangars {
            let node = root.add_node(HANGAR_NODE);
            node.add_value("id", id.0);
            hangar.on_save(node);
        }
        root
    }

    /// Load nodes written by [`Flight::save`] into the matching hangars.
    pub fn load(&mut self, root: &Node) -> Result<(), NodeError> {
        for node in root.get_nodes(HANGAR_NODE) {
            let id = HangarId(node.parse("id")?);
            let Some(hangar) = self.hangars.get_mut(&id) else {
                log::warn!("skipping saved state of unknown hangar {id}");
                continue;
            };
            hangar.on_load(node)?;
            if let Err(e) = hangar.setup(&mut self.world, false) {
                log::warn!("hangar {id} could not be set up after loading: {e}");
            }
        }
        Ok(())
    }

    /// Write a binary snapshot of the whole flight.
    pub fn snapshot<W: std::io::Write>(&self, writer: W) -> Result<(), SnapshotError> {
        let hangars = self.hangars.values().map(Hangar::record).collect();
        save_flight(writer, &self.world, hangars, &self.registry, self.next_hangar)
    }

    /// Replace this flight with a snapshot. Pending tasks are dropped.
    pub fn restore_snapshot<R: std::io::Read>(&mut self, reader: R) -> Result<(), SnapshotError> {
        let loaded = load_flight(reader)?;
        self.world = loaded.world;
        self.hangars = loaded
            .hangars
            .into_iter()
            .map(|r| (r.id, Hangar::from_record(r)))
            .collect();
        self.registry = loaded.registry;
        self.next_hangar = loaded.next_hangar;
        self.scheduler = Scheduler::new();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hangar_logic::design::{PartSpec, ShipDesign};
    use hangar_logic::math::{Transform, Vec3};

    fn carrier(flight: &mut Flight) -> VesselId {
        let design = ShipDesign::new(
            "Carrier",
            vec![
                PartSpec::new("pod", 2.0, 1000.0, Vec3::ZERO, Vec3::splat(2.0)).with_command(),
                PartSpec::new("bay", 8.0, 4000.0, Vec3::new(0.0, -6.0, 0.0), Vec3::splat(10.0)),
            ],
        );
        flight
            .world
            .spawn_loaded(&design, Transform::from_position(Vec3::new(0.0, 700_000.0, 0.0)), Vec3::ZERO)
    }

    #[test]
    fn test_add_hangar_registers() {
        let mut flight = Flight::new(Scene::Flight);
        let v = carrier(&mut flight);
        let id = flight.add_hangar(v, 1, HangarConfig::default()).unwrap();
        assert_eq!(flight.registry().hangars_on(v), vec![id]);
        assert!(!flight.registry().is_ready(id));
        assert!(matches!(
            flight.add_hangar(VesselId::new(), 0, HangarConfig::default()),
            Err(HangarError::UnknownVessel(_))
        ));
        assert_eq!(flight.hangar_ids(), vec![id]);
    }

    #[test]
    fn test_start_with_no_constructs_is_ready_next_update() {
        let mut flight = Flight::new(Scene::Flight);
        let v = carrier(&mut flight);
        flight.add_hangar(v, 1, HangarConfig::default()).unwrap();
        flight.start();
        assert!(!flight.all_ready());
        flight.update(0.02);
        assert!(flight.all_ready());
        assert!(flight.scheduler().is_empty());
    }

    #[test]
    fn test_unknown_hangar() {
        let mut flight = Flight::new(Scene::Flight);
        let err = flight.launch(HangarId(7), VesselId::new()).unwrap_err();
        assert_eq!(err, HangarError::UnknownHangar(HangarId(7)));
    }
}
