//! Cleanup system: despawns projectiles whose death frame has elapsed.

use std::collections::HashMap;

use hecs::{Entity, World};

use ballista_core::types::ProjectileId;

use crate::projectile::ActiveProjectile;

/// Remove dead projectiles from the world and the id index.
/// Uses a pre-allocated buffer to avoid per-tick allocation.
pub fn run(
    world: &mut World,
    despawn_buffer: &mut Vec<Entity>,
    index: &mut HashMap<ProjectileId, Entity>,
) -> usize {
    despawn_buffer.clear();

    for (entity, proj) in world.query_mut::<&ActiveProjectile>() {
        if !proj.alive {
            index.remove(&proj.id);
            despawn_buffer.push(entity);
        }
    }

    let removed = despawn_buffer.len();
    for entity in despawn_buffer.drain(..) {
        let _ = world.despawn(entity);
    }
    removed
}
