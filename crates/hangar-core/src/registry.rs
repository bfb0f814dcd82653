//! Readiness registry - which hangars share a vessel, in part order, and
//! which of them have finished converting their constructs.

use std::collections::{BTreeMap, HashMap};

use hangar_logic::entry::VesselId;
use serde::{Deserialize, Serialize};

use crate::hangar::HangarId;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReadinessRegistry {
    /// Hangars per vessel as (part index, hangar), sorted by part index.
    assemblies: BTreeMap<VesselId, Vec<(usize, HangarId)>>,
    ready: HashMap<HangarId, bool>,
}

impl ReadinessRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a hangar on `vessel`'s part `part_index`; it starts not ready.
    pub fn register(&mut self, vessel: VesselId, part_index: usize, hangar: HangarId) {
        self.unregister(hangar);
        let list = self.assemblies.entry(vessel).or_default();
        let at = list.partition_point(|(i, h)| (*i, *h) < (part_index, hangar));
        list.insert(at, (part_index, hangar));
        self.ready.insert(hangar, false);
    }

    pub fn unregister(&mut self, hangar: HangarId) {
        for list in self.assemblies.values_mut() {
            list.retain(|(_, h)| *h != hangar);
        }
        self.assemblies.retain(|_, list| !list.is_empty());
        self.ready.remove(&hangar);
    }

    pub fn set_ready(&mut self, hangar: HangarId, ready: bool) {
        if let Some(r) = self.ready.get_mut(&hangar) {
            *r = ready;
        }
    }

    pub fn is_ready(&self, hangar: HangarId) -> bool {
        self.ready.get(&hangar).copied().unwrap_or(false)
    }

    /// Hangars on the same vessel that come before `hangar`.
    pub fn earlier(&self, hangar: HangarId) -> Vec<HangarId> {
        for list in self.assemblies.values() {
            if let Some(pos) = list.iter().position(|(_, h)| *h == hangar) {
                return list[..pos].iter().map(|(_, h)| *h).collect();
            }
        }
        Vec::new()
    }

    /// True once every earlier hangar on the same vessel is ready.
    pub fn earlier_ready(&self, hangar: HangarId) -> bool {
        self.earlier(hangar).into_iter().all(|h| self.is_ready(h))
    }

    pub fn hangars_on(&self, vessel: VesselId) -> Vec<HangarId> {
        self.assemblies
            .get(&vessel)
            .map(|list| list.iter().map(|(_, h)| *h).collect())
            .unwrap_or_default()
    }
}
