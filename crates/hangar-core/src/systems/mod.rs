//! Systems - world logic that runs every tick

mod loading;
mod motion;

pub use loading::*;
pub use motion::*;
