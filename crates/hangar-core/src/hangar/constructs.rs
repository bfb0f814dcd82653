//! Editor designs packed into the hangar before flight.

use hangar_logic::design::ShipDesign;
use hangar_logic::entry::{PackedEntry, VesselId};
use hangar_logic::metric::Metric;
use hangar_logic::pack::PackedConstruct;

use super::{ConstructRejection, Hangar};
use crate::world::FlightWorld;

impl Hangar {
    /// Pack `design` as a construct. Any refusal is also shown to the player.
    pub fn add_construct(
        &mut self,
        world: &mut FlightWorld,
        design: ShipDesign,
        flag: &str,
    ) -> Result<VesselId, ConstructRejection> {
        let result = self
            .pack_design(world, design, flag)
            .and_then(|entry| self.admit_construct(world, entry));
        if let Err(e) = &result {
            log::warn!("hangar \"{}\": {}", self.name, e);
            world.message(e.to_string());
        }
        result
    }

    fn pack_design(&self, world: &FlightWorld, design: ShipDesign, flag: &str) -> Result<PackedEntry, ConstructRejection> {
        let name = design.name.clone();
        design.validate().map_err(|e| ConstructRejection::LoadFailed {
            name: name.clone(),
            reason: e.to_string(),
        })?;
        if design.has_launch_clamp() {
            return Err(ConstructRejection::LaunchClamps { name });
        }
        let unavailable = design.unavailable_parts();
        if !unavailable.is_empty() {
            return Err(ConstructRejection::ExperimentalParts {
                name,
                parts: unavailable.into_iter().map(str::to_string).collect(),
            });
        }
        let points = design.points();
        let metric = if self.hangar_metric.hull.is_some() {
            Metric::from_hull_points(&points, 0.0, 0.0)
        } else {
            Metric::from_points(&points, 0.0, 0.0)
        };
        Ok(PackedEntry::construct(design, flag, metric, &world.library))
    }

    fn admit_construct(&mut self, world: &mut FlightWorld, entry: PackedEntry) -> Result<VesselId, ConstructRejection> {
        if !self.fits(&entry.metric) {
            return Err(ConstructRejection::DoesNotFit { name: entry.name });
        }
        let (id, metric) = (entry.id, entry.metric.clone());
        let name = entry.name.clone();
        if !self.constructs.add(PackedConstruct(entry)) {
            return Err(ConstructRejection::NoRoom { name });
        }
        self.change_part_params(world, &metric, 1.0);
        log::info!("hangar \"{}\" packed construct \"{}\" ({:.2} m3)", self.name, name, metric.volume);
        Ok(id)
    }

    /// Pack another copy of construct `id`.
    pub fn clone_construct(&mut self, world: &mut FlightWorld, id: VesselId) -> Result<VesselId, ConstructRejection> {
        let copy = self
            .constructs
            .get(&id)
            .and_then(|c| c.duplicate())
            .ok_or(ConstructRejection::Unknown(id))?;
        let result = self.admit_construct(world, copy);
        if let Err(e) = &result {
            world.message(e.to_string());
        }
        result
    }

    pub fn remove_construct(&mut self, world: &mut FlightWorld, id: VesselId) -> Option<PackedEntry> {
        let entry = self.constructs.remove(&id)?.0;
        self.change_part_params(world, &entry.metric, -1.0);
        Some(entry)
    }

    pub fn clear_constructs(&mut self, world: &mut FlightWorld) {
        for c in self.constructs.take_all() {
            self.totals.apply(&c.metric, -1.0);
        }
        self.sync_part(world, None);
    }

    /// Packed constructs ordered by name, as listed in the editor.
    pub fn constructs_sorted(&self) -> Vec<&PackedConstruct> {
        let mut list: Vec<&PackedConstruct> = self.constructs.values().collect();
        list.sort_by(|a, b| a.name.cmp(&b.name));
        list
    }

    /// Admit every construct again after the space changed. Ones that no
    /// longer fit are dropped with a message; totals are rebuilt by the
    /// caller.
    pub(super) fn readmit_constructs(&mut self, world: &mut FlightWorld) {
        for c in self.constructs.take_all() {
            let name = c.name.clone();
            if !self.fits(&c.metric) {
                world.message(ConstructRejection::DoesNotFit { name }.to_string());
            } else if !self.constructs.add(c) {
                world.message(ConstructRejection::NoRoom { name }.to_string());
            }
        }
    }
}
