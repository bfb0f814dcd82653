//! Vessel identity and flight-state flags.

use hangar_logic::entry::VesselId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VesselKind {
    Ship,
    /// A crew member floating on their own.
    Eva,
}

/// Latitude/longitude in degrees and altitude in metres above the datum.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SurfaceCoords {
    pub latitude: f64,
    pub longitude: f64,
    pub altitude: f64,
}

/// Vessel component - one independently flying craft
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vessel {
    pub id: VesselId,
    pub name: String,
    pub kind: VesselKind,
    pub enabled: bool,
    /// Ticks left until the vessel is fully loaded.
    pub load_ticks: u32,
    pub landed: bool,
    pub splashed: bool,
    /// Held vessels wait for a post-spawn task before their crew appears.
    pub held: bool,
    /// Where the vessel was placed on the surface, if it was.
    pub surface: Option<SurfaceCoords>,
}

impl Vessel {
    pub fn new(id: VesselId, name: impl Into<String>, load_ticks: u32) -> Self {
        Self {
            id,
            name: name.into(),
            kind: VesselKind::Ship,
            enabled: true,
            load_ticks,
            landed: false,
            splashed: false,
            held: false,
            surface: None,
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.load_ticks == 0
    }

    pub fn is_eva(&self) -> bool {
        self.kind == VesselKind::Eva
    }

    pub fn landed_or_splashed(&self) -> bool {
        self.landed || self.splashed
    }
}
