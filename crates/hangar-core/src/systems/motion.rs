//! Motion system - integrates vessel state vectors

use hecs::World;
use hangar_logic::math::Quat;

use crate::components::{OrbitState, Vessel};

/// Move every loaded vessel along its velocity and spin it by its angular
/// velocity. Landed vessels stay put.
pub fn motion_system(world: &mut World, delta_seconds: f64) {
    for (_, (vessel, orbit)) in world.query_mut::<(&Vessel, &mut OrbitState)>() {
        if !vessel.is_loaded() || vessel.landed_or_splashed() {
            continue;
        }
        step(orbit, delta_seconds);
    }
}

fn step(orbit: &mut OrbitState, dt: f64) {
    orbit.velocity += orbit.acceleration * dt;
    orbit.position += orbit.velocity * dt;
    let w = orbit.angular_velocity.length();
    if w > 0.0 {
        let spin = Quat::from_axis_angle(orbit.angular_velocity / w, w * dt);
        orbit.rotation = (spin * orbit.rotation).normalize();
    }
}
