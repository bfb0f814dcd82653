//! Orbital state vectors.

use hangar_logic::math::{Quat, Transform, Vec3};
use serde::{Deserialize, Serialize};

/// State vectors of a vessel's origin relative to the body centre.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct OrbitState {
    pub position: Vec3,
    pub velocity: Vec3,
    pub rotation: Quat,
    /// rad/s
    pub angular_velocity: Vec3,
    pub acceleration: Vec3,
}

impl OrbitState {
    pub fn new(position: Vec3, velocity: Vec3, rotation: Quat) -> Self {
        Self {
            position,
            velocity,
            rotation,
            angular_velocity: Vec3::ZERO,
            acceleration: Vec3::ZERO,
        }
    }

    pub fn transform(&self) -> Transform {
        Transform::new(self.position, self.rotation)
    }

    pub fn change_velocity(&mut self, dv: Vec3) {
        self.velocity += dv;
    }
}
