//! Launching a stored vessel back into the flight.

use hangar_logic::constants::thresholds;
use hangar_logic::entry::{PackedEntry, VesselId};
use hangar_logic::math::{Transform, Vec3};
use hangar_logic::momentum::split_launch_impulse;
use hangar_logic::pack::StoredVessel;
use hangar_logic::state::GateState;

use super::{Hangar, HangarError, RestoreRejection};
use crate::components::{OrbitState, Structure, Vessel};
use crate::tasks::PostSpawnTask;
use crate::world::{ClearToSave, FlightWorld};

/// A vessel that has just left the hangar, and the task that finishes
/// its spawn once it is loaded.
#[derive(Debug)]
pub struct LaunchOutcome {
    pub vessel: VesselId,
    pub task: PostSpawnTask,
}

/// Pose and velocities of a launch, worked out before anything moves.
struct LaunchPlan {
    transform: Transform,
    velocity: Vec3,
    host_dv: Vec3,
}

impl Hangar {
    pub fn can_restore(&self, world: &FlightWorld) -> Result<(), RestoreRejection> {
        if !self.is_active() {
            return Err(RestoreRejection::Inactive);
        }
        if self.gate.state() != GateState::Opened {
            return Err(RestoreRejection::GatesNotOpen);
        }
        let structure = world.structure(self.vessel);
        if structure.as_ref().and_then(|s| s.docked_vessel()).is_some() {
            return Err(RestoreRejection::DockingPortOccupied);
        }
        match world.clear_to_save {
            ClearToSave::Clear => {}
            ClearToSave::InAtmosphere => return Err(RestoreRejection::InAtmosphere),
            ClearToSave::UnderAcceleration => return Err(RestoreRejection::UnderAcceleration),
            ClearToSave::AboutToCrash => return Err(RestoreRejection::AboutToCrash),
            ClearToSave::MovingOverSurface => return Err(RestoreRejection::MovingOverSurface),
        }
        let angular_velocity = world.orbit(self.vessel).map(|o| o.angular_velocity.length()).unwrap_or(0.0);
        if angular_velocity > thresholds::MAX_LAUNCH_ANGULAR_VELOCITY {
            return Err(RestoreRejection::Rotating { angular_velocity });
        }
        Ok(())
    }

    /// Launch stored vessel `id`. Leaves the hangar Inactive.
    pub fn try_restore(&mut self, world: &mut FlightWorld, id: VesselId) -> Result<LaunchOutcome, HangarError> {
        if let Err(e) = self.can_restore(world) {
            world.message(e.to_string());
            return Err(e.into());
        }
        let Some(stored) = self.stored.remove(&id) else {
            let e = HangarError::MissingEntry(id);
            log::error!("{e}");
            world.message(e.to_string());
            return Err(e);
        };
        let mut entry = stored.0;
        world.message(format!("Launching \"{}\"...", entry.name));
        self.deactivate();
        self.settle_resources(world, &mut entry);

        let plan = match self.plan_launch(world, &entry) {
            Ok(plan) => plan,
            Err(e) => {
                log::error!("hangar \"{}\" cannot place \"{}\": {e}", self.name, entry.name);
                self.stored.force_add(StoredVessel(entry));
                return Err(e);
            }
        };
        let host = world.vessel(self.vessel);
        let host_orbit = world.orbit(self.vessel).unwrap_or_default();

        world.update(self.vessel, |o: &mut OrbitState| o.change_velocity(plan.host_dv));
        self.change_part_params(world, &entry.metric, -1.0);
        let crew = world
            .update(self.vessel, |s: &mut Structure| s.remove_crew(&entry.crew))
            .unwrap_or_default();

        let design = entry.design_with_resources();
        let mut orbit = OrbitState::new(plan.transform.position, plan.velocity, plan.transform.rotation);
        orbit.angular_velocity = host_orbit.angular_velocity;
        let vessel = world.spawn_as(entry.id, &entry.name, Structure::from_design(&design), orbit);
        let surface = host
            .filter(|h| h.landed_or_splashed())
            .map(|_| world.body.surface_coords(plan.transform.position));
        world.update(vessel, |v: &mut Vessel| {
            v.landed = false;
            v.splashed = false;
            v.held = true;
            v.surface = surface;
        });
        world.set_active(vessel);

        let host_tf = host_orbit.transform();
        let relative = Transform::new(
            host_tf.inverse_transform_point(plan.transform.position),
            (host_tf.rotation.inverse() * plan.transform.rotation).normalize(),
        );
        log::info!(
            "hangar \"{}\" launched \"{}\" ({:.2} t) with {} crew",
            self.name,
            entry.name,
            entry.mass,
            crew.len()
        );
        Ok(LaunchOutcome {
            vessel,
            task: PostSpawnTask::new(vessel, self.vessel, relative, crew),
        })
    }

    fn plan_launch(&self, world: &FlightWorld, entry: &PackedEntry) -> Result<LaunchPlan, HangarError> {
        let host = world.orbit(self.vessel).ok_or(HangarError::UnknownVessel(self.vessel))?;
        let launch = self.launch_transform(world)?;
        let transform = self.placement(world, entry)?;
        let mut plan = LaunchPlan {
            transform,
            velocity: host.velocity,
            host_dv: Vec3::ZERO,
        };
        if self.config.launch_with_punch {
            if let Some(punch) = self.config.launch_velocity().filter(|v| v.length() > 0.0) {
                // host mass still carries the entry as cargo
                let total = world.vessel_mass(self.vessel);
                let dv = launch.transform_direction(punch);
                let (launched, reaction) = split_launch_impulse(total - entry.mass, entry.mass, dv);
                plan.velocity += launched;
                plan.host_dv = reaction;
            }
        }
        Ok(plan)
    }
}
