//! Flight world - the host simulation hangars operate in.
//!
//! Vessels are `hecs` entities carrying [`Vessel`], [`OrbitState`] and
//! [`Structure`]. The world also holds the globals a hangar consults: the
//! scene, the clear-to-save status, the active vessel, the celestial body,
//! the resource library and the on-screen message log.

use hecs::{Entity, World};
use serde::{Deserialize, Serialize};

use hangar_logic::constants::timing;
use hangar_logic::design::ShipDesign;
use hangar_logic::entry::VesselId;
use hangar_logic::math::{Transform, Vec3};
use hangar_logic::metric::Metric;
use hangar_logic::resources::ResourceLibrary;

use crate::components::*;
use crate::systems::{loading_system, motion_system};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Scene {
    Editor,
    Flight,
}

/// Whether the flight may be mutated right now, and if not, why.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClearToSave {
    #[default]
    Clear,
    AboutToCrash,
    UnderAcceleration,
    InAtmosphere,
    MovingOverSurface,
}

/// Spherical body the flight happens around.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CelestialBody {
    pub name: String,
    /// Metres
    pub radius: f64,
}

impl CelestialBody {
    pub fn new(name: &str, radius: f64) -> Self {
        Self {
            name: name.to_string(),
            radius,
        }
    }

    /// Latitude/longitude/altitude of a body-centred position; +Y is north.
    pub fn surface_coords(&self, position: Vec3) -> SurfaceCoords {
        let r = position.length();
        let latitude = if r > 0.0 {
            (position.y / r).clamp(-1.0, 1.0).asin().to_degrees()
        } else {
            0.0
        };
        SurfaceCoords {
            latitude,
            longitude: position.z.atan2(position.x).to_degrees(),
            altitude: r - self.radius,
        }
    }
}

impl Default for CelestialBody {
    fn default() -> Self {
        Self::new("Kerbin", 600_000.0)
    }
}

/// A message shown to the player.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScreenMessage {
    pub time: f64,
    pub text: String,
}

/// The host simulation
pub struct FlightWorld {
    /// ECS world containing all vessels
    pub world: World,
    /// Seconds since the flight started
    pub time: f64,
    pub tick: u64,
    pub scene: Scene,
    pub clear_to_save: ClearToSave,
    pub active_vessel: Option<VesselId>,
    pub body: CelestialBody,
    pub library: ResourceLibrary,
    pub messages: Vec<ScreenMessage>,
    /// Persistent saves requested so far.
    pub save_requests: u32,
    /// Ticks a newly spawned vessel takes to load.
    pub load_ticks: u32,
}

impl FlightWorld {
    pub fn new(scene: Scene) -> Self {
        Self {
            world: World::new(),
            time: 0.0,
            tick: 0,
            scene,
            clear_to_save: ClearToSave::Clear,
            active_vessel: None,
            body: CelestialBody::default(),
            library: ResourceLibrary::standard(),
            messages: Vec::new(),
            save_requests: 0,
            load_ticks: timing::LOAD_TICKS,
        }
    }

    /// Advance time and run the world systems.
    pub fn tick(&mut self, delta_seconds: f64) {
        self.time += delta_seconds;
        self.tick += 1;
        loading_system(&mut self.world);
        motion_system(&mut self.world, delta_seconds);
    }

    // ── Vessels ─────────────────────────────────────────────────────────

    pub fn entity(&self, id: VesselId) -> Option<Entity> {
        self.world
            .query::<&Vessel>()
            .iter()
            .find_map(|(e, v)| (v.id == id).then_some(e))
    }

    pub fn contains(&self, id: VesselId) -> bool {
        self.entity(id).is_some()
    }

    pub fn vessel_ids(&self) -> Vec<VesselId> {
        let mut ids: Vec<VesselId> = self.world.query::<&Vessel>().iter().map(|(_, v)| v.id).collect();
        ids.sort();
        ids
    }

    pub fn vessel_count(&self) -> usize {
        self.world.query::<&Vessel>().iter().count()
    }

    /// Spawn a vessel that starts loading now.
    pub fn spawn(&mut self, name: &str, structure: Structure, orbit: OrbitState) -> VesselId {
        self.spawn_as(VesselId::new(), name, structure, orbit)
    }

    /// Spawn under a known id, as when a stored vessel comes back.
    pub fn spawn_as(&mut self, id: VesselId, name: &str, structure: Structure, orbit: OrbitState) -> VesselId {
        let vessel = Vessel::new(id, name, self.load_ticks);
        self.world.spawn((vessel, orbit, structure));
        id
    }

    /// Spawn a design with its origin at `transform`.
    pub fn spawn_design(&mut self, design: &ShipDesign, name: &str, transform: Transform, velocity: Vec3) -> VesselId {
        let orbit = OrbitState::new(transform.position, velocity, transform.rotation);
        self.spawn(name, Structure::from_design(design), orbit)
    }

    /// Spawn a design that is already fully loaded.
    pub fn spawn_loaded(&mut self, design: &ShipDesign, transform: Transform, velocity: Vec3) -> VesselId {
        let id = self.spawn_design(design, &design.name, transform, velocity);
        self.update(id, |v: &mut Vessel| v.load_ticks = 0);
        id
    }

    pub fn despawn(&mut self, id: VesselId) -> bool {
        match self.entity(id) {
            Some(e) => self.world.despawn(e).is_ok(),
            None => false,
        }
    }

    /// Copy of one component of a vessel.
    pub fn get<T: hecs::Component + Clone>(&self, id: VesselId) -> Option<T> {
        let e = self.entity(id)?;
        let c = self.world.get::<&T>(e).ok()?;
        Some((*c).clone())
    }

    /// Mutate one component of a vessel in place.
    pub fn update<T: hecs::Component, R>(&mut self, id: VesselId, f: impl FnOnce(&mut T) -> R) -> Option<R> {
        let e = self.entity(id)?;
        self.world.query_one_mut::<&mut T>(e).ok().map(f)
    }

    /// A vessel's structure together with the resource library.
    pub fn structure_and_library(&mut self, id: VesselId) -> Option<(&mut Structure, &ResourceLibrary)> {
        let e = self.entity(id)?;
        let s = self.world.query_one_mut::<&mut Structure>(e).ok()?;
        Some((s, &self.library))
    }

    pub fn vessel(&self, id: VesselId) -> Option<Vessel> {
        self.get(id)
    }

    pub fn orbit(&self, id: VesselId) -> Option<OrbitState> {
        self.get(id)
    }

    pub fn structure(&self, id: VesselId) -> Option<Structure> {
        self.get(id)
    }

    pub fn is_loaded(&self, id: VesselId) -> bool {
        self.vessel(id).map(|v| v.is_loaded()).unwrap_or(false)
    }

    pub fn vessel_mass(&self, id: VesselId) -> f64 {
        self.structure(id).map(|s| s.mass(&self.library)).unwrap_or(0.0)
    }

    pub fn vessel_cost(&self, id: VesselId) -> f64 {
        self.structure(id).map(|s| s.cost(&self.library)).unwrap_or(0.0)
    }

    /// Footprint of a vessel in its own frame; `hull` asks for the convex
    /// hull of its parts instead of their bounding box.
    pub fn vessel_metric(&self, id: VesselId, hull: bool) -> Option<Metric> {
        let s = self.structure(id)?;
        let points: Vec<Vec3> = s.to_design("").points();
        let (mass, cost) = (s.mass(&self.library), s.cost(&self.library));
        Some(if hull {
            Metric::from_hull_points(&points, mass, cost)
        } else {
            Metric::from_points(&points, mass, cost)
        })
    }

    /// Current design of a live vessel, tank levels included.
    pub fn vessel_design(&self, id: VesselId) -> Option<ShipDesign> {
        let name = self.vessel(id)?.name;
        Some(self.structure(id)?.to_design(&name))
    }

    pub fn is_controllable(&self, id: VesselId) -> bool {
        self.structure(id).map(|s| s.is_controllable()).unwrap_or(false)
    }

    pub fn set_active(&mut self, id: VesselId) {
        self.active_vessel = Some(id);
    }

    // ── Player feedback ─────────────────────────────────────────────────

    /// Show `text` unless the same text is still on screen. The log keeps
    /// the latest [`timing::MESSAGE_LOG_LIMIT`] messages.
    pub fn message(&mut self, text: impl Into<String>) {
        let text = text.into();
        let on_screen = self
            .messages
            .iter()
            .rev()
            .take_while(|m| self.time - m.time < timing::MESSAGE_DURATION)
            .any(|m| m.text == text);
        if on_screen {
            log::debug!("[message] still shown: {}", text);
            return;
        }
        log::info!("[message] {}", text);
        self.messages.push(ScreenMessage { time: self.time, text });
        if self.messages.len() > timing::MESSAGE_LOG_LIMIT {
            let excess = self.messages.len() - timing::MESSAGE_LOG_LIMIT;
            self.messages.drain(..excess);
        }
    }

    pub fn messages_containing(&self, needle: &str) -> usize {
        self.messages.iter().filter(|m| m.text.contains(needle)).count()
    }

    pub fn request_save(&mut self) {
        self.save_requests += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hangar_logic::design::PartSpec;

    fn drone() -> ShipDesign {
        ShipDesign::new(
            "Drone",
            vec![PartSpec::new("core", 0.5, 300.0, Vec3::ZERO, Vec3::new(1.0, 2.0, 1.0)).with_command()],
        )
    }

    #[test]
    fn test_spawn_loads_over_ticks() {
        let mut w = FlightWorld::new(Scene::Flight);
        let id = w.spawn_design(&drone(), "Drone", Transform::IDENTITY, Vec3::ZERO);
        assert!(!w.is_loaded(id));
        for _ in 0..timing::LOAD_TICKS {
            w.tick(0.02);
        }
        assert!(w.is_loaded(id));
        assert!(w.despawn(id));
        assert!(!w.contains(id));
    }

    #[test]
    fn test_metric_in_vessel_frame() {
        let mut w = FlightWorld::new(Scene::Flight);
        let id = w.spawn_loaded(&drone(), Transform::from_position(Vec3::new(0.0, 700_000.0, 0.0)), Vec3::ZERO);
        let m = w.vessel_metric(id, false).unwrap();
        assert!((m.volume - 2.0).abs() < 1e-9);
        assert!(m.center.approx_eq(&Vec3::ZERO, 1e-9));
        assert_eq!(m.mass, 0.5);
    }

    #[test]
    fn test_repeated_message_shown_once_while_on_screen() {
        let mut w = FlightWorld::new(Scene::Flight);
        w.message("Cannot accept an accelerating vessel");
        w.message("Cannot accept an accelerating vessel");
        assert_eq!(w.messages.len(), 1);
        w.tick(timing::MESSAGE_DURATION);
        w.message("Cannot accept an accelerating vessel");
        assert_eq!(w.messages.len(), 2);
    }

    #[test]
    fn test_message_log_is_bounded() {
        let mut w = FlightWorld::new(Scene::Flight);
        for i in 0..timing::MESSAGE_LOG_LIMIT + 10 {
            w.message(format!("message {i}"));
        }
        assert_eq!(w.messages.len(), timing::MESSAGE_LOG_LIMIT);
        assert_eq!(w.messages[0].text, "message 10");
        assert_eq!(w.messages_containing("message 9"), 0);
    }

    #[test]
    fn test_surface_coords() {
        let body = CelestialBody::new("Test", 1000.0);
        let c = body.surface_coords(Vec3::new(0.0, 1010.0, 0.0));
        assert!((c.latitude - 90.0).abs() < 1e-9);
        assert!((c.altitude - 10.0).abs() < 1e-9);
        let c = body.surface_coords(Vec3::new(0.0, 0.0, 1000.0));
        assert!((c.longitude - 90.0).abs() < 1e-9);
    }
}
