//! Cooperative task scheduler.
//!
//! Long-running hangar work (waiting for a vessel to load, pausing between
//! spawns, waiting on sibling hangars) is written as a [`Task`]: a state
//! machine that does some work when resumed and then yields the [`Wait`]
//! it needs before the next step. The scheduler resumes each task at most
//! once per tick, and only when its condition holds. Everything a task may
//! touch arrives through [`TaskContext`].

use std::collections::BTreeMap;

use hangar_logic::entry::VesselId;

use crate::hangar::{Hangar, HangarId};
use crate::registry::ReadinessRegistry;
use crate::world::FlightWorld;

/// What a task waits for before its next step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Wait {
    NextTick,
    Ticks(u32),
    Seconds(f64),
    /// Satisfied once the vessel is loaded, or if it no longer exists.
    VesselLoaded(VesselId),
    HangarEnabled(HangarId),
    /// Every hangar before this one on the same vessel is ready.
    EarlierHangarsReady(HangarId),
}

/// Result of resuming a task.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Step {
    Yield(Wait),
    Done,
}

/// State a task may read and mutate while it runs.
pub struct TaskContext<'a> {
    pub world: &'a mut FlightWorld,
    pub hangars: &'a mut BTreeMap<HangarId, Hangar>,
    pub registry: &'a mut ReadinessRegistry,
}

pub trait Task: Send {
    fn name(&self) -> &str;

    fn resume(&mut self, cx: &mut TaskContext<'_>) -> Step;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TaskId(pub u64);

/// A [`Wait`] pinned to absolute time.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Condition {
    AtTick(u64),
    AtTime(f64),
    VesselLoaded(VesselId),
    HangarEnabled(HangarId),
    EarlierReady(HangarId),
}

impl Condition {
    fn resolve(wait: Wait, world: &FlightWorld) -> Self {
        match wait {
            Wait::NextTick => Condition::AtTick(world.tick + 1),
            Wait::Ticks(n) => Condition::AtTick(world.tick + n as u64),
            Wait::Seconds(s) => Condition::AtTime(world.time + s),
            Wait::VesselLoaded(id) => Condition::VesselLoaded(id),
            Wait::HangarEnabled(h) => Condition::HangarEnabled(h),
            Wait::EarlierHangarsReady(h) => Condition::EarlierReady(h),
        }
    }

    fn holds(&self, cx: &TaskContext<'_>) -> bool {
        match *self {
            Condition::AtTick(t) => cx.world.tick >= t,
            Condition::AtTime(t) => cx.world.time + 1e-9 >= t,
            Condition::VesselLoaded(id) => !cx.world.contains(id) || cx.world.is_loaded(id),
            Condition::HangarEnabled(h) => cx.hangars.get(&h).map(|h| h.is_enabled()).unwrap_or(true),
            Condition::EarlierReady(h) => cx.registry.earlier_ready(h),
        }
    }
}

struct Pending {
    id: TaskId,
    task: Box<dyn Task>,
    until: Condition,
}

#[derive(Default)]
pub struct Scheduler {
    pending: Vec<Pending>,
    next_id: u64,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a task; it first runs on the next [`Scheduler::run`].
    pub fn spawn(&mut self, task: Box<dyn Task>) -> TaskId {
        let id = TaskId(self.next_id);
        self.next_id += 1;
        log::debug!("task {} spawned: {}", id.0, task.name());
        self.pending.push(Pending {
            id,
            task,
            until: Condition::AtTick(0),
        });
        id
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn is_running(&self, id: TaskId) -> bool {
        self.pending.iter().any(|p| p.id == id)
    }

    pub fn task_names(&self) -> Vec<String> {
        self.pending.iter().map(|p| p.task.name().to_string()).collect()
    }

    /// Resume every task whose condition holds, in spawn order.
    pub fn run(&mut self, cx: &mut TaskContext<'_>) {
        let mut still = Vec::with_capacity(self.pending.len());
        for mut p in std::mem::take(&mut self.pending) {
            if !p.until.holds(cx) {
                still.push(p);
                continue;
            }
            match p.task.resume(cx) {
                Step::Yield(wait) => {
                    p.until = Condition::resolve(wait, cx.world);
                    still.push(p);
                }
                Step::Done => log::debug!("task {} finished: {}", p.id.0, p.task.name()),
            }
        }
        self.pending = still;
    }
}
