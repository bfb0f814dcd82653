//! Multi-tick hangar work run by the [`Scheduler`](crate::scheduler::Scheduler).
//!
//! - [`PostSpawnTask`]: finishes a launch once the vessel has loaded.
//! - [`ConvertConstructsTask`]: turns packed constructs into stored vessels
//!   at mission start, after every earlier hangar on the vessel.

use hangar_logic::constants::timing;
use hangar_logic::entry::{CrewMember, VesselId};
use hangar_logic::math::Transform;
use hangar_logic::state::HangarState;

use crate::components::{OrbitState, Structure, Vessel};
use crate::hangar::HangarId;
use crate::scheduler::{Step, Task, TaskContext, Wait};
use crate::world::Scene;

// ── Post-spawn ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PostSpawnStage {
    Start,
    Place,
    Crew,
}

/// Puts a launched vessel back where it left the hangar once it loaded,
/// seats its crew and releases its hold.
#[derive(Debug)]
pub struct PostSpawnTask {
    vessel: VesselId,
    host: VesselId,
    /// Pose in the host frame.
    relative: Transform,
    crew: Vec<CrewMember>,
    stage: PostSpawnStage,
}

impl PostSpawnTask {
    pub fn new(vessel: VesselId, host: VesselId, relative: Transform, crew: Vec<CrewMember>) -> Self {
        Self {
            vessel,
            host,
            relative,
            crew,
            stage: PostSpawnStage::Start,
        }
    }

    pub fn vessel(&self) -> VesselId {
        self.vessel
    }

    fn place(&self, cx: &mut TaskContext<'_>) {
        let Some(host) = cx.world.orbit(self.host) else {
            return;
        };
        let pose = host.transform().then(&self.relative);
        cx.world.update(self.vessel, |o: &mut OrbitState| {
            o.position = pose.position;
            o.rotation = pose.rotation;
        });
    }

    fn seat_crew(&mut self, cx: &mut TaskContext<'_>) {
        let crew = std::mem::take(&mut self.crew);
        if crew.is_empty() {
            return;
        }
        let leftover = cx
            .world
            .update(self.vessel, |s: &mut Structure| {
                let mut crew = crew.clone();
                s.add_crew(&mut crew);
                crew
            })
            .unwrap_or(crew);
        if leftover.is_empty() {
            return;
        }
        log::warn!("{} crew found no seat on the launched vessel, returning them to the hangar vessel", leftover.len());
        cx.world.update(self.host, |s: &mut Structure| {
            let mut leftover = leftover;
            s.add_crew(&mut leftover);
        });
    }
}

impl Task for PostSpawnTask {
    fn name(&self) -> &str {
        "post-spawn"
    }

    fn resume(&mut self, cx: &mut TaskContext<'_>) -> Step {
        match self.stage {
            PostSpawnStage::Start => {
                self.stage = PostSpawnStage::Place;
                Step::Yield(Wait::VesselLoaded(self.vessel))
            }
            PostSpawnStage::Place => {
                if !cx.world.contains(self.vessel) {
                    log::warn!("launched vessel {} vanished before it loaded", self.vessel);
                    return Step::Done;
                }
                self.place(cx);
                self.stage = PostSpawnStage::Crew;
                Step::Yield(Wait::Seconds(timing::POST_SPAWN_PAUSE))
            }
            PostSpawnStage::Crew => {
                if cx.world.contains(self.vessel) {
                    self.seat_crew(cx);
                    cx.world.update(self.vessel, |v: &mut Vessel| v.held = false);
                }
                Step::Done
            }
        }
    }
}

// ── Construct conversion ────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ConvertStage {
    Begin,
    AwaitEnabled,
    AwaitEarlier,
    Next,
    Store(VesselId),
    Finish,
    Settle,
    Save,
}

/// Spawns each packed construct inside the hangar and stores it as a live
/// vessel, then marks the hangar ready.
#[derive(Debug)]
pub struct ConvertConstructsTask {
    hangar: HangarId,
    host: Option<VesselId>,
    prior: HangarState,
    converted: usize,
    stage: ConvertStage,
}

impl ConvertConstructsTask {
    pub fn new(hangar: HangarId) -> Self {
        Self {
            hangar,
            host: None,
            prior: HangarState::Inactive,
            converted: 0,
            stage: ConvertStage::Begin,
        }
    }

    fn give_up(&self, cx: &mut TaskContext<'_>) -> Step {
        log::warn!("hangar {} disappeared during construct conversion", self.hangar);
        cx.registry.set_ready(self.hangar, true);
        Step::Done
    }

    /// Spawn the next construct; `None` once there are none left.
    fn spawn_next(&mut self, cx: &mut TaskContext<'_>) -> Option<Result<VesselId, ()>> {
        let hangar = cx.hangars.get_mut(&self.hangar)?;
        let id = *hangar.constructs().ids().first()?;
        let entry = hangar.constructs().get(&id)?.0.clone();
        let placement = hangar.placement(cx.world, &entry);
        hangar.remove_construct(cx.world, id);
        let transform = match placement {
            Ok(t) => t,
            Err(e) => {
                log::error!("cannot place construct \"{}\": {}", entry.name, e);
                cx.world.message(format!("Unable to launch \"{}\"", entry.name));
                return Some(Err(()));
            }
        };
        let velocity = cx.world.orbit(hangar.vessel()).map(|o| o.velocity).unwrap_or_default();
        let host = cx.world.vessel(hangar.vessel()).map(|v| v.name).unwrap_or_default();
        let name = format!("{}:{}", host, hangar.name());
        let vessel = cx.world.spawn_design(&entry.design_with_resources(), &name, transform, velocity);
        cx.world.set_active(vessel);
        Some(Ok(vessel))
    }
}

impl Task for ConvertConstructsTask {
    fn name(&self) -> &str {
        "convert-constructs"
    }

    fn resume(&mut self, cx: &mut TaskContext<'_>) -> Step {
        loop {
            match self.stage {
                ConvertStage::Begin => {
                    let Some(hangar) = cx.hangars.get_mut(&self.hangar) else {
                        return self.give_up(cx);
                    };
                    if cx.world.scene != Scene::Flight || hangar.constructs().is_empty() {
                        cx.registry.set_ready(self.hangar, true);
                        return Step::Done;
                    }
                    self.prior = hangar.state();
                    self.host = Some(hangar.vessel());
                    hangar.deactivate();
                    self.stage = ConvertStage::AwaitEnabled;
                    return Step::Yield(Wait::VesselLoaded(hangar.vessel()));
                }
                ConvertStage::AwaitEnabled => {
                    self.stage = ConvertStage::AwaitEarlier;
                    return Step::Yield(Wait::HangarEnabled(self.hangar));
                }
                ConvertStage::AwaitEarlier => {
                    self.stage = ConvertStage::Next;
                    return Step::Yield(Wait::EarlierHangarsReady(self.hangar));
                }
                ConvertStage::Next => match self.spawn_next(cx) {
                    Some(Ok(vessel)) => {
                        self.stage = ConvertStage::Store(vessel);
                        return Step::Yield(Wait::VesselLoaded(vessel));
                    }
                    Some(Err(())) => continue,
                    None => self.stage = ConvertStage::Finish,
                },
                ConvertStage::Store(vessel) => {
                    let Some(hangar) = cx.hangars.get_mut(&self.hangar) else {
                        return self.give_up(cx);
                    };
                    match hangar.store_vessel(cx.world, vessel, false) {
                        Ok(_) => self.converted += 1,
                        Err(e) => log::warn!("converted construct {} was not stored: {}", vessel, e),
                    }
                    self.stage = ConvertStage::Next;
                    return Step::Yield(Wait::Seconds(timing::CONVERT_PAUSE));
                }
                ConvertStage::Finish => {
                    let Some(hangar) = cx.hangars.get_mut(&self.hangar) else {
                        return self.give_up(cx);
                    };
                    if self.prior == HangarState::Active {
                        hangar.activate();
                    }
                    let host = hangar.vessel();
                    cx.world.set_active(host);
                    self.stage = ConvertStage::Settle;
                    return Step::Yield(Wait::VesselLoaded(host));
                }
                ConvertStage::Settle => {
                    self.stage = ConvertStage::Save;
                    return Step::Yield(Wait::Seconds(timing::CONVERT_SETTLE));
                }
                ConvertStage::Save => {
                    cx.world.request_save();
                    cx.registry.set_ready(self.hangar, true);
                    log::info!(
                        "hangar {} converted {} constructs on {:?}",
                        self.hangar,
                        self.converted,
                        self.host
                    );
                    return Step::Done;
                }
            }
        }
    }
}
