//! Component definitions for the flight world.
//!
//! Every vessel entity carries a [`Vessel`], an [`OrbitState`] and a
//! [`Structure`]. Components are plain data; behaviour lives in the
//! systems and the hangar module.

mod orbit;
mod structure;
mod vessel;

pub use orbit::*;
pub use structure::*;
pub use vessel::*;
