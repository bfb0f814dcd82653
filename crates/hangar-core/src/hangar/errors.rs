//! Rejection and failure types. The `Display` text of every rejection is
//! the message shown to the player.

use hangar_logic::entry::VesselId;
use thiserror::Error;

use super::HangarId;

/// Why a vessel was not taken in.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StoreRejection {
    /// Own vessel, disabled vessel or a crew member on EVA. Not reported.
    #[error("vessel cannot be stored")]
    NotACandidate,

    /// Rejected moments ago; the debounce window was restarted. Not reported.
    #[error("vessel was rejected moments ago")]
    Debounced,

    /// Contacts with an inactive hangar are ignored. Not reported.
    #[error("Activate the hangar first")]
    Inactive,

    #[error("Cannot accept the vessel while about to crash")]
    AboutToCrash,

    #[error("Cannot accept a vessel with a relative speed higher than 1m/s")]
    TooFast { speed: f64 },

    #[error("Cannot accept an accelerating vessel")]
    Accelerating { acceleration: f64 },

    #[error("Not enough space for the crew of a docking vessel")]
    NoCrewSpace { crew: u32, free: u32 },

    #[error("Insufficient vessel clearance for safe docking\nThe vessel cannot be stored in this hangar")]
    DoesNotFit,

    #[error("There's no room in the hangar for this vessel")]
    NoRoom,
}

impl StoreRejection {
    /// Whether the player hears about it.
    pub fn is_silent(&self) -> bool {
        matches!(
            self,
            StoreRejection::NotACandidate | StoreRejection::Debounced | StoreRejection::Inactive
        )
    }
}

/// Why a stored vessel cannot be launched right now.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RestoreRejection {
    #[error("Activate the hangar first")]
    Inactive,

    #[error("Open hangar gates first")]
    GatesNotOpen,

    #[error("Cannot launch a vessel while another is docked")]
    DockingPortOccupied,

    #[error("Cannot launch a vessel while flying in atmosphere")]
    InAtmosphere,

    #[error("Cannot launch a vessel while the hangar is under acceleration")]
    UnderAcceleration,

    #[error("Cannot launch a vessel while about to crash")]
    AboutToCrash,

    #[error("Cannot launch a vessel while moving over the surface")]
    MovingOverSurface,

    #[error("Cannot launch a vessel while rotating")]
    Rotating { angular_velocity: f64 },
}

/// Why an editor design was not packed.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConstructRejection {
    #[error("Unable to load {name}")]
    LoadFailed { name: String, reason: String },

    #[error("\"{name}\" has launch clamps. Remove them before storing.")]
    LaunchClamps { name: String },

    #[error("\"{name}\" contains experimental parts: {}", .parts.join(", "))]
    ExperimentalParts { name: String, parts: Vec<String> },

    #[error("Insufficient vessel clearance for safe docking\n\"{name}\" cannot be stored in this hangar")]
    DoesNotFit { name: String },

    #[error("There's no room in the hangar for \"{name}\"")]
    NoRoom { name: String },

    #[error("no packed construct {0}")]
    Unknown(VesselId),
}

/// Why the hangar cannot be deflated.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DisableRejection {
    #[error("Empty the hangar before deflating it")]
    NotEmpty,

    #[error("Deactivate the hangar before deflating it")]
    Active,

    #[error("Close hangar doors before deflating it")]
    GatesNotClosed,
}

/// Failures surfaced by the flight-level API.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum HangarError {
    #[error(transparent)]
    Store(#[from] StoreRejection),

    #[error(transparent)]
    Restore(#[from] RestoreRejection),

    #[error(transparent)]
    Construct(#[from] ConstructRejection),

    /// The pack disagrees with its caller about what it holds.
    #[error("WARNING: restored vessel ID is not found in the Stored Vessels: {0}\nThis should never happen!")]
    MissingEntry(VesselId),

    #[error("no hangar {0}")]
    UnknownHangar(HangarId),

    #[error("vessel {0} is not in flight")]
    UnknownVessel(VesselId),

    #[error("hangar part {index} is missing from vessel {vessel}")]
    MissingPart { vessel: VesselId, index: usize },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        assert_eq!(StoreRejection::Inactive.to_string(), "Activate the hangar first");
        assert!(StoreRejection::Debounced.is_silent());
        assert!(StoreRejection::Inactive.is_silent());
        assert!(!StoreRejection::NoRoom.is_silent());
        let e = ConstructRejection::ExperimentalParts {
            name: "X".into(),
            parts: vec!["a".into(), "b".into()],
        };
        assert_eq!(e.to_string(), "\"X\" contains experimental parts: a, b");
        let e: HangarError = RestoreRejection::GatesNotOpen.into();
        assert_eq!(e.to_string(), "Open hangar gates first");
    }
}
