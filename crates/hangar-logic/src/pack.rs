//! Pack: a capacity-constrained keyed container of packed entries.
//!
//! `used_volume` is maintained incrementally: [`Pack::add`] and
//! [`Pack::force_add`] increase it by the entry's volume and
//! [`Pack::remove`] decreases it by exactly the removed entry's volume.
//! [`Pack::add`] is the only admission path that checks capacity.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::entry::{PackedEntry, VesselId};
use crate::metric::Metric;
use crate::node::Node;

/// Something a [`Pack`] can hold.
pub trait Packable: Clone {
    /// Child node name under which one entry is persisted.
    const NODE_NAME: &'static str;

    fn id(&self) -> VesselId;
    fn metric(&self) -> &Metric;
    fn save(&self, node: &mut Node);
    fn load(node: &Node) -> Result<Self, String>;

    fn volume(&self) -> f64 {
        self.metric().volume
    }
}

/// Entries keyed by id inside one storage space.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pack<T> {
    space: Metric,
    entries: BTreeMap<VesselId, T>,
    used_volume: f64,
}

impl<T: Packable> Pack<T> {
    pub fn new(space: Metric) -> Self {
        Self {
            space,
            entries: BTreeMap::new(),
            used_volume: 0.0,
        }
    }

    pub fn space(&self) -> &Metric {
        &self.space
    }

    /// Replace the storage space. Existing entries stay; callers re-admit
    /// them when the new space may be smaller.
    pub fn set_space(&mut self, space: Metric) {
        self.space = space;
    }

    pub fn used_volume(&self) -> f64 {
        self.used_volume
    }

    pub fn remaining_volume(&self) -> f64 {
        (self.space.volume - self.used_volume).max(0.0)
    }

    /// Volume of the current entries summed from scratch.
    pub fn entries_volume(&self) -> f64 {
        self.entries.values().map(Packable::volume).sum()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, id: &VesselId) -> bool {
        self.entries.contains_key(id)
    }

    pub fn get(&self, id: &VesselId) -> Option<&T> {
        self.entries.get(id)
    }

    pub fn get_mut(&mut self, id: &VesselId) -> Option<&mut T> {
        self.entries.get_mut(id)
    }

    pub fn values(&self) -> impl Iterator<Item = &T> {
        self.entries.values()
    }

    pub fn ids(&self) -> Vec<VesselId> {
        self.entries.keys().copied().collect()
    }

    /// Whether `entry` would be admitted right now.
    pub fn can_add(&self, entry: &T) -> bool {
        !self.entries.contains_key(&entry.id()) && self.used_volume + entry.volume() <= self.space.volume
    }

    /// Admit `entry` if its id is new and the remaining volume holds it.
    /// Returns false and leaves the pack untouched otherwise.
    pub fn add(&mut self, entry: T) -> bool {
        if !self.can_add(&entry) {
            return false;
        }
        self.used_volume += entry.volume();
        self.entries.insert(entry.id(), entry);
        true
    }

    /// Insert without the capacity check, for entries whose footprint is
    /// already accounted for. A duplicate id replaces the old entry.
    pub fn force_add(&mut self, entry: T) {
        let v = entry.volume();
        if let Some(old) = self.entries.insert(entry.id(), entry) {
            self.used_volume -= old.volume();
        }
        self.used_volume += v;
    }

    pub fn remove(&mut self, id: &VesselId) -> Option<T> {
        let entry = self.entries.remove(id)?;
        if self.entries.is_empty() {
            self.used_volume = 0.0;
        } else {
            self.used_volume -= entry.volume();
        }
        Some(entry)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.used_volume = 0.0;
    }

    /// Drain every entry, leaving the pack empty.
    pub fn take_all(&mut self) -> Vec<T> {
        self.used_volume = 0.0;
        std::mem::take(&mut self.entries).into_values().collect()
    }

    // ── Persistence ─────────────────────────────────────────────────────

    pub fn save(&self, node: &mut Node) {
        for entry in self.entries.values() {
            entry.save(node.add_node(T::NODE_NAME));
        }
    }

    /// Replace the contents with the entries under `node`. Malformed
    /// entries are logged and skipped.
    pub fn load(&mut self, node: &Node) {
        self.clear();
        for child in node.get_nodes(T::NODE_NAME) {
            match T::load(child) {
                Ok(entry) => self.force_add(entry),
                Err(e) => log::warn!("skipping malformed {}: {}", T::NODE_NAME, e),
            }
        }
    }
}

/// Stored vessels and packed constructs persist under different names, so
/// one `Pack<PackedEntry>` type serves both through thin wrappers.
macro_rules! entry_wrapper {
    ($name:ident, $node:expr, $doc:literal) => {
        #[doc = $doc]
        #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
        pub struct $name(pub PackedEntry);

        impl Packable for $name {
            const NODE_NAME: &'static str = $node;

            fn id(&self) -> VesselId {
                self.0.id
            }

            fn metric(&self) -> &Metric {
                &self.0.metric
            }

            fn save(&self, node: &mut Node) {
                self.0.save(node)
            }

            fn load(node: &Node) -> Result<Self, String> {
                PackedEntry::load(node).map($name).map_err(|e| e.to_string())
            }
        }

        impl std::ops::Deref for $name {
            type Target = PackedEntry;

            fn deref(&self) -> &PackedEntry {
                &self.0
            }
        }

        impl std::ops::DerefMut for $name {
            fn deref_mut(&mut self) -> &mut PackedEntry {
                &mut self.0
            }
        }
    };
}

entry_wrapper!(
    StoredVessel,
    crate::constants::keys::STORED_VESSEL_NODE,
    "A vessel captured on docking."
);
entry_wrapper!(
    PackedConstruct,
    crate::constants::keys::PACKED_CONSTRUCT_NODE,
    "An editor design packed for launch."
);
