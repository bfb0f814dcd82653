//! Hangar Core - Vessel Packing & Restoration Engine
//!
//! Hangar modules sit on parts of a host vessel, swallow nearby vessels,
//! carry them as packed entries and launch them again, keeping mass,
//! momentum, crew and resources consistent the whole way.
//!
//! # Architecture
//!
//! The host flight is an Entity Component System (ECS) world via `hecs`:
//! - **Entities**: Vessels
//! - **Components**: Pure data attached to vessels (Vessel, OrbitState, Structure)
//! - **Systems**: Loading and motion, run every tick
//!
//! Hangars live beside the world rather than in it. Work that spans ticks
//! (post-launch placement, converting packed constructs at mission start)
//! runs as tasks on a cooperative scheduler, and the readiness registry
//! orders conversion across hangars sharing a vessel.
//!
//! # Example
//!
//! ```rust,no_run
//! use hangar_core::prelude::*;
//! use hangar_logic::config::HangarConfig;
//! use hangar_logic::design::{PartSpec, ShipDesign};
//! use hangar_logic::math::{Transform, Vec3};
//!
//! let mut flight = Flight::new(Scene::Flight);
//! let design = ShipDesign::new(
//!     "Carrier",
//!     vec![
//!         PartSpec::new("pod", 2.0, 1000.0, Vec3::ZERO, Vec3::splat(2.0)).with_command(),
//!         PartSpec::new("bay", 8.0, 4000.0, Vec3::new(0.0, -6.0, 0.0), Vec3::splat(10.0)),
//!     ],
//! );
//! let carrier = flight.world.spawn_loaded(&design, Transform::IDENTITY, Vec3::ZERO);
//! flight.add_hangar(carrier, 1, HangarConfig::default()).unwrap();
//! flight.start();
//!
//! loop {
//!     flight.update(0.02); // 50 Hz physics
//! }
//! ```

pub mod components;
pub mod engine;
pub mod gate;
pub mod hangar;
pub mod persistence;
pub mod registry;
pub mod scheduler;
pub mod systems;
pub mod tasks;
pub mod world;

/// Commonly used types for convenient importing
pub mod prelude {
    pub use crate::components::*;
    pub use crate::engine::Flight;
    pub use crate::hangar::{Hangar, HangarError, HangarId, RestoreRejection, StoreRejection};
    pub use crate::world::{ClearToSave, FlightWorld, Scene};
}
