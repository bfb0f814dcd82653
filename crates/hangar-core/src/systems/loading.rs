//! Loading system - counts freshly spawned vessels down to loaded

use hecs::World;

use crate::components::Vessel;

/// Advance every vessel that is still loading by one tick.
pub fn loading_system(world: &mut World) {
    for (_, vessel) in world.query_mut::<&mut Vessel>() {
        if vessel.load_ticks > 0 {
            vessel.load_ticks -= 1;
            if vessel.load_ticks == 0 {
                log::debug!("vessel \"{}\" loaded", vessel.name);
            }
        }
    }
}
