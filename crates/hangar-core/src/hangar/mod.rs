//! The hangar part module.
//!
//! A [`Hangar`] sits on one part of a host vessel and owns two packs: live
//! vessels it has swallowed and editor constructs waiting to be launched.
//!
//! | File | Operations |
//! |------|------------|
//! | `mod.rs` | setup, part parameters, Active/Inactive, energy, gates, status, persistence |
//! | `store.rs` | `can_store`, `store_vessel` |
//! | `restore.rs` | `can_restore`, `try_restore` |
//! | `constructs.rs` | editor construct packing |
//! | `transfer.rs` | resource negotiation with a stored vessel |

mod constructs;
mod errors;
mod restore;
mod store;
mod transfer;

pub use errors::*;
pub use restore::LaunchOutcome;

use std::fmt;

use hangar_logic::config::HangarConfig;
use hangar_logic::constants::{keys, timing, usable_size_ratio, CREW_VOLUME_RATIO};
use hangar_logic::entry::{PackedEntry, VesselId};
use hangar_logic::math::{Transform, Vec3};
use hangar_logic::metric::{Metric, Space};
use hangar_logic::node::{Node, NodeError};
use hangar_logic::pack::{Pack, PackedConstruct, StoredVessel};
use hangar_logic::reconcile::ResourceReconciler;
use hangar_logic::resources::{ResourceStore, AMOUNT_EPSILON};
use hangar_logic::state::{DebounceTable, GateState, HangarState};
use hangar_logic::totals::{crew_capacity_for, CargoTotals};
use serde::{Deserialize, Serialize};

use crate::components::{Part, Structure};
use crate::gate::{gate_for, Gate};
use crate::world::{FlightWorld, Scene};

const ELECTRIC_CHARGE: &str = "ElectricCharge";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct HangarId(pub u32);

impl fmt::Display for HangarId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Labels shown in the part's context menu.
#[derive(Debug, Clone, PartialEq)]
pub struct HangarStatus {
    pub gate: GateState,
    pub state: HangarState,
    pub volume: f64,
    pub dimensions: Vec3,
    pub crew_capacity: u32,
    pub stored_mass: f64,
    pub stored_cost: f64,
    /// Share of the space in use, 0 when there is no space.
    pub used_fraction: f64,
}

/// Everything about a hangar that survives a flight snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HangarRecord {
    pub id: HangarId,
    pub vessel: VesselId,
    pub part_index: usize,
    pub name: String,
    pub config: HangarConfig,
    pub state: HangarState,
    pub gate: GateState,
    pub stored: Pack<StoredVessel>,
    pub constructs: Pack<PackedConstruct>,
    pub totals: CargoTotals,
    pub base_mass_captured: bool,
    pub part_metric: Metric,
    pub hangar_metric: Metric,
    pub launch: Transform,
    pub debounce: DebounceTable,
    pub reconciler: ResourceReconciler,
    pub reconciling: Option<VesselId>,
    pub enabled: bool,
}

/// Hangar module on one part of a host vessel
#[derive(Debug)]
pub struct Hangar {
    id: HangarId,
    vessel: VesselId,
    part_index: usize,
    name: String,
    pub config: HangarConfig,
    state: HangarState,
    gate: Box<dyn Gate>,
    stored: Pack<StoredVessel>,
    constructs: Pack<PackedConstruct>,
    totals: CargoTotals,
    base_mass_captured: bool,
    part_metric: Metric,
    hangar_metric: Metric,
    /// Launch point in the part frame.
    launch: Transform,
    debounce: DebounceTable,
    reconciler: ResourceReconciler,
    /// Stored vessel the pending manifests belong to.
    reconciling: Option<VesselId>,
    enabled: bool,
}

impl Hangar {
    /// A hangar on `vessel`'s part `part_index`. Call [`Hangar::setup`]
    /// before use.
    pub fn new(id: HangarId, vessel: VesselId, part_index: usize, config: HangarConfig) -> Self {
        Self {
            id,
            vessel,
            part_index,
            name: config.hangar_name.clone(),
            gate: gate_for(&config),
            config,
            state: HangarState::Inactive,
            stored: Pack::new(Metric::default()),
            constructs: Pack::new(Metric::default()),
            totals: CargoTotals::default(),
            base_mass_captured: false,
            part_metric: Metric::default(),
            hangar_metric: Metric::default(),
            launch: Transform::IDENTITY,
            debounce: DebounceTable::new(timing::DEBOUNCE_WINDOW),
            reconciler: ResourceReconciler::new(),
            reconciling: None,
            enabled: true,
        }
    }

    // ── Accessors ───────────────────────────────────────────────────────

    pub fn id(&self) -> HangarId {
        self.id
    }

    /// Host vessel.
    pub fn vessel(&self) -> VesselId {
        self.vessel
    }

    pub fn part_index(&self) -> usize {
        self.part_index
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn state(&self) -> HangarState {
        self.state
    }

    pub fn is_active(&self) -> bool {
        self.state == HangarState::Active
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn gate_state(&self) -> GateState {
        self.gate.state()
    }

    pub fn totals(&self) -> &CargoTotals {
        &self.totals
    }

    pub fn part_metric(&self) -> &Metric {
        &self.part_metric
    }

    pub fn hangar_metric(&self) -> &Metric {
        &self.hangar_metric
    }

    pub fn stored(&self) -> &Pack<StoredVessel> {
        &self.stored
    }

    pub fn constructs(&self) -> &Pack<PackedConstruct> {
        &self.constructs
    }

    pub fn debounce(&self) -> &DebounceTable {
        &self.debounce
    }

    /// Stored vessels, in pack order.
    pub fn get_vessels(&self) -> Vec<&StoredVessel> {
        self.stored.values().collect()
    }

    pub fn get_vessel(&self, id: &VesselId) -> Option<&StoredVessel> {
        self.stored.get(id)
    }

    /// Cost the stored cargo adds to the part.
    pub fn module_cost(&self) -> f64 {
        self.totals.vessels_cost
    }

    /// All entries of both packs.
    fn entries(&self) -> impl Iterator<Item = &PackedEntry> {
        self.stored
            .values()
            .map(|s| &s.0)
            .chain(self.constructs.values().map(|c| &c.0))
    }

    /// Totals rebuilt from scratch, for checking the incremental ones.
    pub fn resynced_totals(&self) -> CargoTotals {
        let mut t = CargoTotals::new(self.totals.base_mass);
        t.resync(self.entries());
        t
    }

    fn part(&self, world: &FlightWorld) -> Result<Part, HangarError> {
        world
            .structure(self.vessel)
            .and_then(|s| s.part(self.part_index).cloned())
            .ok_or(HangarError::MissingPart {
                vessel: self.vessel,
                index: self.part_index,
            })
    }

    // ── Setup ───────────────────────────────────────────────────────────

    /// Derive the part and space metrics and the launch point from the
    /// part and config. With `reset`, constructs are admitted again
    /// against the new space and the totals are rebuilt.
    pub fn setup(&mut self, world: &mut FlightWorld, reset: bool) -> Result<(), HangarError> {
        let part = self.part(world)?;
        self.name = if self.config.hangar_name.is_empty() {
            part.name.clone()
        } else {
            self.config.hangar_name.clone()
        };
        self.part_metric = Metric::from_box(part.size, Vec3::ZERO, part.mass, part.cost);
        self.hangar_metric = self.space_metric();
        self.launch = match self.config.launch_transform {
            Some(t) => t,
            None => {
                log::info!("LaunchTransform not found. Using offset.");
                Transform::from_position(Vec3::UP * self.config.launch_height_offset)
            }
        };
        self.stored.set_space(self.hangar_metric.clone());
        self.constructs.set_space(self.hangar_metric.clone());
        if reset {
            self.readmit_constructs(world);
        }
        self.set_part_params(world, reset);
        log::info!(
            "hangar \"{}\" ready: {:.2} m3 of {:.2} m3 part volume",
            self.name,
            self.hangar_metric.volume,
            self.part_metric.volume
        );
        Ok(())
    }

    fn space_metric(&self) -> Metric {
        if let Some(space) = &self.config.hangar_space {
            if space.use_mesh {
                match space.mesh.as_ref().filter(|m| !m.is_empty()) {
                    Some(mesh) if mesh.is_well_formed() => {
                        return Metric::from_mesh(mesh.clone(), 0.0, 0.0);
                    }
                    Some(_) => log::warn!("{}: space mesh is malformed, using its box", self.name()),
                    None => {}
                }
            }
            let m = Metric::from_box(space.size, space.center, 0.0, 0.0);
            if !m.is_empty() {
                return m;
            }
        }
        let mut m = self.part_metric.scale(usable_size_ratio());
        m.mass = 0.0;
        m.cost = 0.0;
        m
    }

    /// Storage space for fit tests.
    fn space(&self) -> Space<'_> {
        match &self.hangar_metric.hull {
            Some(mesh) => Space::Hull(mesh),
            None => Space::Box(&self.hangar_metric),
        }
    }

    /// Whether `metric` fits the space when placed at the launch point.
    pub fn fits(&self, metric: &Metric) -> bool {
        metric.fits_aligned(&self.launch, &Transform::IDENTITY, self.space())
    }

    /// Capture base mass if needed and push the totals onto the part.
    pub fn set_part_params(&mut self, world: &mut FlightWorld, reset: bool) {
        if !self.base_mass_captured || reset {
            if let Ok(part) = self.part(world) {
                self.totals.base_mass = if self.base_mass_captured {
                    part.mass - self.totals.vessels_mass
                } else {
                    part.mass
                };
                self.base_mass_captured = true;
            }
            self.totals = self.resynced_totals();
        }
        let crew_capacity = (!self.config.static_crew_capacity).then(|| {
            crew_capacity_for(
                self.part_metric.volume,
                self.hangar_metric.volume,
                CREW_VOLUME_RATIO,
                self.config.volume_per_kerbal,
            )
        });
        self.sync_part(world, crew_capacity);
    }

    /// Add (`k = 1`) or remove (`k = -1`) a footprint from the totals.
    pub fn change_part_params(&mut self, world: &mut FlightWorld, metric: &Metric, k: f64) {
        self.totals.apply(metric, k);
        self.sync_part(world, None);
    }

    fn sync_part(&self, world: &mut FlightWorld, crew_capacity: Option<u32>) {
        let (index, mass) = (self.part_index, self.totals.part_mass());
        world.update(self.vessel, |s: &mut Structure| {
            if let Some(p) = s.part_mut(index) {
                p.mass = mass;
                if let Some(c) = crew_capacity {
                    p.crew_capacity = c;
                }
            }
        });
    }

    // ── Operating state ─────────────────────────────────────────────────

    pub fn activate(&mut self) {
        self.state = HangarState::Active;
    }

    /// Go Inactive and drop every pending debounce timer.
    pub fn deactivate(&mut self) {
        self.state = HangarState::Inactive;
        self.debounce.clear();
    }

    pub fn toggle(&mut self) {
        match self.state {
            HangarState::Active => self.deactivate(),
            HangarState::Inactive => self.activate(),
        }
    }

    pub fn open_gates(&mut self) {
        self.gate.open();
    }

    pub fn close_gates(&mut self) {
        self.gate.close();
    }

    pub fn toggle_gates(&mut self) {
        self.gate.toggle();
    }

    /// Per-tick upkeep: move the gates, draw charge while Active and let
    /// debounce timers run out.
    pub fn fixed_update(&mut self, world: &mut FlightWorld, dt: f64) {
        if world.scene != Scene::Flight {
            return;
        }
        let demand = self.gate.energy_demand(dt);
        let supplied = if demand > 0.0 {
            self.draw_charge(world, demand) / demand
        } else {
            1.0
        };
        self.gate.advance(dt, supplied);

        if self.is_active() && self.config.energy_consumption > 0.0 {
            let request = self.config.energy_consumption * dt;
            let got = self.draw_charge(world, request);
            if got + AMOUNT_EPSILON < request {
                world.message("Not enough energy. The hangar has deactivated.");
                log::warn!("hangar \"{}\" ran out of charge ({got:.4}/{request:.4})", self.name);
                self.deactivate();
            }
        }

        for id in self.debounce.tick(dt) {
            log::debug!("hangar \"{}\": debounce for {} expired", self.name, id);
        }
    }

    fn draw_charge(&self, world: &mut FlightWorld, amount: f64) -> f64 {
        world
            .update(self.vessel, |s: &mut Structure| -s.transfer(ELECTRIC_CHARGE, -amount))
            .unwrap_or(0.0)
    }

    // ── Controllable module ─────────────────────────────────────────────

    /// Whether the part may be deflated; the refusal is shown to the player.
    pub fn can_disable(&self, world: &mut FlightWorld) -> Result<(), DisableRejection> {
        let result = if !self.stored.is_empty() || !self.constructs.is_empty() {
            Err(DisableRejection::NotEmpty)
        } else if self.is_active() && world.scene != Scene::Editor {
            Err(DisableRejection::Active)
        } else if self.gate.state() != GateState::Closed {
            Err(DisableRejection::GatesNotClosed)
        } else {
            Ok(())
        };
        if let Err(e) = &result {
            world.message(e.to_string());
        }
        result
    }

    pub fn enable(&mut self, world: &mut FlightWorld, enable: bool) -> Result<(), HangarError> {
        if enable {
            self.setup(world, false)?;
        }
        self.enabled = enable;
        Ok(())
    }

    /// The host can be flown from here: it has a command part or the
    /// hangar part itself carries crew.
    pub fn is_controllable(&self, world: &FlightWorld) -> bool {
        world.is_controllable(self.vessel)
            || self
                .part(world)
                .map(|p| !p.crew.is_empty())
                .unwrap_or(false)
    }

    pub fn status(&self, world: &FlightWorld) -> HangarStatus {
        let volume = self.hangar_metric.volume;
        HangarStatus {
            gate: self.gate.state(),
            state: self.state,
            volume,
            dimensions: self.hangar_metric.size,
            crew_capacity: self.part(world).map(|p| p.crew_capacity).unwrap_or(0),
            stored_mass: self.totals.vessels_mass,
            stored_cost: self.totals.vessels_cost,
            used_fraction: if volume > 0.0 {
                self.totals.used_volume / volume
            } else {
                0.0
            },
        }
    }

    // ── Placement ───────────────────────────────────────────────────────

    /// Launch point in world space.
    pub fn launch_transform(&self, world: &FlightWorld) -> Result<Transform, HangarError> {
        let orbit = world.orbit(self.vessel).ok_or(HangarError::UnknownVessel(self.vessel))?;
        let part = self.part(world)?;
        Ok(orbit.transform().then(&part.transform()).then(&self.launch))
    }

    /// Where `entry`'s origin goes so its bounds centre sits on the launch
    /// point.
    pub fn placement(&self, world: &FlightWorld, entry: &PackedEntry) -> Result<Transform, HangarError> {
        let launch = self.launch_transform(world)?;
        let r = launch.rotation;
        // mass centre sits off the geometric centre by CoM - CoG
        let com = launch.position + r.rotate(entry.center_of_mass - entry.center_of_geometry);
        Ok(Transform::new(com - r.rotate(entry.center_of_mass), r))
    }

    // ── Persistence ─────────────────────────────────────────────────────

    /// Write the module node: state, then each pack only when non-empty.
    pub fn on_save(&self, node: &mut Node) {
        node.add_value(keys::HANGAR_STATE, self.state);
        node.add_value("HangarName", &self.config.hangar_name);
        node.add_value("LaunchWithPunch", self.config.launch_with_punch);
        if !self.stored.is_empty() {
            self.stored.save(node.add_node(keys::STORED_VESSELS));
        }
        if !self.constructs.is_empty() {
            self.constructs.save(node.add_node(keys::PACKED_CONSTRUCTS));
        }
    }

    /// Read a module node written by [`Hangar::on_save`]. Malformed entries
    /// are skipped; call [`Hangar::setup`] afterwards to refresh the part.
    pub fn on_load(&mut self, node: &Node) -> Result<(), NodeError> {
        self.state = node.parse_or(keys::HANGAR_STATE, HangarState::Inactive)?;
        self.config.hangar_name = node.parse_or("HangarName", self.config.hangar_name.clone())?;
        self.config.launch_with_punch = node.parse_or("LaunchWithPunch", self.config.launch_with_punch)?;
        match node.get_node(keys::STORED_VESSELS) {
            Some(n) => self.stored.load(n),
            None => self.stored.clear(),
        }
        match node.get_node(keys::PACKED_CONSTRUCTS) {
            Some(n) => self.constructs.load(n),
            None => self.constructs.clear(),
        }
        self.totals = self.resynced_totals();
        Ok(())
    }

    pub fn record(&self) -> HangarRecord {
        HangarRecord {
            id: self.id,
            vessel: self.vessel,
            part_index: self.part_index,
            name: self.name.clone(),
            config: self.config.clone(),
            state: self.state,
            gate: self.gate.state(),
            stored: self.stored.clone(),
            constructs: self.constructs.clone(),
            totals: self.totals,
            base_mass_captured: self.base_mass_captured,
            part_metric: self.part_metric.clone(),
            hangar_metric: self.hangar_metric.clone(),
            launch: self.launch,
            debounce: self.debounce.clone(),
            reconciler: self.reconciler.clone(),
            reconciling: self.reconciling,
            enabled: self.enabled,
        }
    }

    pub fn from_record(r: HangarRecord) -> Self {
        let mut gate = gate_for(&r.config);
        gate.force(r.gate);
        Self {
            id: r.id,
            vessel: r.vessel,
            part_index: r.part_index,
            name: r.name,
            config: r.config,
            state: r.state,
            gate,
            stored: r.stored,
            constructs: r.constructs,
            totals: r.totals,
            base_mass_captured: r.base_mass_captured,
            part_metric: r.part_metric,
            hangar_metric: r.hangar_metric,
            launch: r.launch,
            debounce: r.debounce,
            reconciler: r.reconciler,
            reconciling: r.reconciling,
            enabled: r.enabled,
        }
    }
}
