//! Momentum bookkeeping for docking and launch.

use crate::math::Vec3;

/// Velocity change of the container after absorbing a candidate, so that
/// total momentum is unchanged: `(v_candidate − v_container) · m / (M + m)`.
pub fn store_velocity_delta(container_mass: f64, container_vel: Vec3, candidate_mass: f64, candidate_vel: Vec3) -> Vec3 {
    let total = container_mass + candidate_mass;
    if total <= 0.0 {
        return Vec3::ZERO;
    }
    (candidate_vel - container_vel) * (candidate_mass / total)
}

/// Split a launch impulse `dv` between the launched vessel and the
/// container. Returns `(launched, container)` velocity changes.
pub fn split_launch_impulse(container_mass: f64, launched_mass: f64, dv: Vec3) -> (Vec3, Vec3) {
    let total = container_mass + launched_mass;
    if total <= 0.0 {
        return (Vec3::ZERO, Vec3::ZERO);
    }
    (dv * (container_mass / total), -(dv * (launched_mass / total)))
}

pub fn momentum(mass: f64, vel: Vec3) -> Vec3 {
    vel * mass
}
