//! Hangar operating state, reported gate state, and the rejection
//! debounce table.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use crate::entry::VesselId;

/// Whether the hangar accepts and launches vessels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum HangarState {
    Active,
    #[default]
    Inactive,
}

impl HangarState {
    pub fn toggled(self) -> Self {
        match self {
            HangarState::Active => HangarState::Inactive,
            HangarState::Inactive => HangarState::Active,
        }
    }
}

impl fmt::Display for HangarState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HangarState::Active => write!(f, "Active"),
            HangarState::Inactive => write!(f, "Inactive"),
        }
    }
}

impl FromStr for HangarState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "Active" => Ok(HangarState::Active),
            "Inactive" => Ok(HangarState::Inactive),
            other => Err(format!("unknown hangar state '{other}'")),
        }
    }
}

/// Gate position as reported by the gate collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GateState {
    Opened,
    Closed,
    Opening,
    Closing,
}

impl GateState {
    pub fn is_moving(self) -> bool {
        matches!(self, GateState::Opening | GateState::Closing)
    }
}

impl fmt::Display for GateState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            GateState::Opened => "Opened",
            GateState::Closed => "Closed",
            GateState::Opening => "Opening",
            GateState::Closing => "Closing",
        };
        write!(f, "{s}")
    }
}

/// Rejected candidates and the time left before they may be reported again.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DebounceTable {
    window: f64,
    timers: HashMap<VesselId, f64>,
}

impl DebounceTable {
    pub fn new(window: f64) -> Self {
        Self {
            window,
            timers: HashMap::new(),
        }
    }

    pub fn window(&self) -> f64 {
        self.window
    }

    /// If `id` is still silenced, restart its window and return true.
    pub fn touch(&mut self, id: VesselId) -> bool {
        match self.timers.get_mut(&id) {
            Some(left) => {
                *left = self.window;
                true
            }
            None => false,
        }
    }

    /// Silence `id` for a full window.
    pub fn remember(&mut self, id: VesselId) {
        self.timers.insert(id, self.window);
    }

    pub fn forget(&mut self, id: &VesselId) -> bool {
        self.timers.remove(id).is_some()
    }

    /// Advance all timers; expired records are dropped and returned.
    pub fn tick(&mut self, dt: f64) -> Vec<VesselId> {
        let mut expired = Vec::new();
        self.timers.retain(|id, left| {
            *left -= dt;
            if *left <= 0.0 {
                expired.push(*id);
                false
            } else {
                true
            }
        });
        expired
    }

    pub fn clear(&mut self) {
        self.timers.clear();
    }

    pub fn len(&self) -> usize {
        self.timers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timers.is_empty()
    }

    pub fn contains(&self, id: &VesselId) -> bool {
        self.timers.contains_key(id)
    }
}
