//! Taking a live vessel into the hangar.

use hangar_logic::constants::thresholds;
use hangar_logic::entry::{PackedEntry, VesselId, VesselSnapshot};
use hangar_logic::momentum::store_velocity_delta;
use hangar_logic::pack::StoredVessel;

use super::{Hangar, StoreRejection};
use crate::components::{OrbitState, Structure};
use crate::world::{ClearToSave, FlightWorld};

impl Hangar {
    /// Checks that depend only on the current moment.
    pub fn can_store(&self, world: &FlightWorld, candidate: VesselId) -> Result<(), StoreRejection> {
        let Some(vessel) = world.vessel(candidate) else {
            return Err(StoreRejection::NotACandidate);
        };
        if candidate == self.vessel || !vessel.enabled || vessel.is_eva() {
            return Err(StoreRejection::NotACandidate);
        }
        if !self.is_active() {
            return Err(StoreRejection::Inactive);
        }
        if world.clear_to_save == ClearToSave::AboutToCrash {
            return Err(StoreRejection::AboutToCrash);
        }
        let (Some(host), Some(orbit)) = (world.orbit(self.vessel), world.orbit(candidate)) else {
            return Err(StoreRejection::NotACandidate);
        };
        let speed = (orbit.velocity - host.velocity).length();
        if speed > thresholds::MAX_STORE_SPEED {
            return Err(StoreRejection::TooFast { speed });
        }
        let acceleration = (orbit.acceleration - host.acceleration).length();
        if acceleration > thresholds::MAX_STORE_ACCELERATION {
            return Err(StoreRejection::Accelerating { acceleration });
        }
        Ok(())
    }

    /// Crew, shape and room checks; yields the entry that would be stored.
    fn try_store(&self, world: &FlightWorld, candidate: VesselId) -> Result<PackedEntry, StoreRejection> {
        let crew = world.structure(candidate).map(|s| s.crew_count()).unwrap_or(0);
        let free = world.structure(self.vessel).map(|s| s.free_seats()).unwrap_or(0);
        if crew > free {
            return Err(StoreRejection::NoCrewSpace { crew, free });
        }
        let entry = self.capture(world, candidate).ok_or(StoreRejection::NotACandidate)?;
        if !self.fits(&entry.metric) {
            return Err(StoreRejection::DoesNotFit);
        }
        if !self.stored.can_add(&StoredVessel(entry.clone())) {
            return Err(StoreRejection::NoRoom);
        }
        Ok(entry)
    }

    /// Freeze a live vessel into an entry keyed by its own id.
    fn capture(&self, world: &FlightWorld, candidate: VesselId) -> Option<PackedEntry> {
        let metric = world.vessel_metric(candidate, self.hangar_metric.hull.is_some())?;
        let design = world.vessel_design(candidate)?;
        let crew = world.structure(candidate)?.crew();
        let snapshot = VesselSnapshot {
            design,
            captured_at: world.time,
        };
        Some(PackedEntry::stored(candidate, snapshot, metric, crew, &world.library))
    }

    /// Store `candidate`. With `perform_checks` an inactive hangar ignores
    /// the contact, momentary rejections are shown but not remembered, and
    /// a crew, shape or room rejection is shown once and then silenced for
    /// the debounce window. Without, the vessel is taken in unconditionally.
    pub fn store_vessel(
        &mut self,
        world: &mut FlightWorld,
        candidate: VesselId,
        perform_checks: bool,
    ) -> Result<VesselId, StoreRejection> {
        let entry = if perform_checks {
            if !self.is_active() {
                return Err(StoreRejection::Inactive);
            }
            if self.debounce.touch(candidate) {
                return Err(StoreRejection::Debounced);
            }
            if let Err(e) = self.can_store(world, candidate) {
                self.show(world, &e);
                return Err(e);
            }
            match self.try_store(world, candidate) {
                Ok(entry) => entry,
                Err(e) => {
                    self.reject(world, candidate, &e);
                    return Err(e);
                }
            }
        } else {
            self.capture(world, candidate).ok_or(StoreRejection::NotACandidate)?
        };
        self.commit(world, candidate, entry, perform_checks)
    }

    fn show(&self, world: &mut FlightWorld, e: &StoreRejection) {
        if !e.is_silent() {
            world.message(e.to_string());
        }
    }

    fn reject(&mut self, world: &mut FlightWorld, candidate: VesselId, e: &StoreRejection) {
        if e.is_silent() {
            return;
        }
        world.message(e.to_string());
        self.debounce.remember(candidate);
    }

    fn commit(
        &mut self,
        world: &mut FlightWorld,
        candidate: VesselId,
        entry: PackedEntry,
        checked: bool,
    ) -> Result<VesselId, StoreRejection> {
        let (Some(host), Some(orbit)) = (world.orbit(self.vessel), world.orbit(candidate)) else {
            return Err(StoreRejection::NotACandidate);
        };
        let host_mass = world.vessel_mass(self.vessel);
        let (id, name, metric, crew) = (entry.id, entry.name.clone(), entry.metric.clone(), entry.crew.clone());

        if checked {
            if !self.stored.add(StoredVessel(entry)) {
                let e = StoreRejection::NoRoom;
                self.reject(world, candidate, &e);
                return Err(e);
            }
        } else {
            self.stored.force_add(StoredVessel(entry));
        }

        let dv = store_velocity_delta(host_mass, host.velocity, metric.mass, orbit.velocity);
        world.update(self.vessel, |o: &mut OrbitState| o.change_velocity(dv));
        self.change_part_params(world, &metric, 1.0);

        world.update(candidate, |s: &mut Structure| s.remove_crew(&crew));
        let index = self.part_index;
        let unseated = world
            .update(self.vessel, |s: &mut Structure| {
                let mut crew = crew;
                s.add_crew_to_part(index, &mut crew);
                s.add_crew(&mut crew);
                crew
            })
            .unwrap_or_default();
        if !unseated.is_empty() {
            log::warn!("{} crew of \"{}\" found no seat in the hangar vessel", unseated.len(), name);
        }

        self.debounce.forget(&candidate);
        if world.active_vessel == Some(candidate) {
            world.set_active(self.vessel);
        }
        world.despawn(candidate);
        world.message("Vessel has been docked inside the hangar");
        log::info!(
            "hangar \"{}\" stored \"{}\" ({:.2} t, {:.2} m3)",
            self.name,
            name,
            metric.mass,
            metric.volume
        );
        Ok(id)
    }
}
