//! Engine constants: volume ratios, admission thresholds, timings.
//!
//! Plain values with no engine dependency; both the core engine and the
//! simtest harness read them from here.

/// Share of the part volume usable as hangar space when none is configured.
pub const USABLE_VOLUME_RATIO: f64 = 0.7;

/// Share of the non-hangar part volume that can house crew.
pub const CREW_VOLUME_RATIO: f64 = 0.3;

/// Linear scale that yields [`USABLE_VOLUME_RATIO`] of a volume.
pub fn usable_size_ratio() -> f64 {
    USABLE_VOLUME_RATIO.powf(1.0 / 3.0)
}

pub mod defaults {
    /// Electric charge drawn per second while Active.
    pub const ENERGY_CONSUMPTION: f64 = 0.75;
    /// Habitable volume (m³) one crew member needs.
    pub const VOLUME_PER_KERBAL: f64 = 6.7;
    /// Seconds an animated gate takes to open or close.
    pub const GATE_DURATION: f64 = 3.0;
    /// Electric charge per second drawn while a gate moves.
    pub const GATE_ENERGY: f64 = 0.5;
}

pub mod thresholds {
    /// Max relative speed (m/s) of a vessel entering the hangar.
    pub const MAX_STORE_SPEED: f64 = 1.0;
    /// Max relative acceleration (m/s²) of a vessel entering the hangar.
    pub const MAX_STORE_ACCELERATION: f64 = 0.1;
    /// Max angular velocity (rad/s) of the hangar vessel during launch.
    pub const MAX_LAUNCH_ANGULAR_VELOCITY: f64 = 0.003;
}

pub mod timing {
    /// Seconds a rejected candidate stays silent.
    pub const DEBOUNCE_WINDOW: f64 = 3.0;
    /// Ticks a freshly spawned vessel needs to finish loading.
    pub const LOAD_TICKS: u32 = 3;
    /// Pause after each construct is converted.
    pub const CONVERT_PAUSE: f64 = 0.1;
    /// Pause before the persistent save after conversion.
    pub const CONVERT_SETTLE: f64 = 0.5;
    /// Pause before the crew of a launched vessel is spawned.
    pub const POST_SPAWN_PAUSE: f64 = 0.25;
    /// Seconds a message stays on screen; repeats in that time are dropped.
    pub const MESSAGE_DURATION: f64 = 3.0;
    /// Messages kept in the flight log, oldest dropped first.
    pub const MESSAGE_LOG_LIMIT: usize = 64;
}

pub mod keys {
    /// Node name of a stored vessel record.
    pub const STORED_VESSEL_NODE: &str = "STORED_VESSEL";
    /// Node name of a packed construct record.
    pub const PACKED_CONSTRUCT_NODE: &str = "PACKED_CONSTRUCT";
    pub const STORED_VESSELS: &str = "STORED_VESSELS";
    pub const PACKED_CONSTRUCTS: &str = "PACKED_CONSTRUCTS";
    pub const HANGAR_STATE: &str = "hangarState";
}
