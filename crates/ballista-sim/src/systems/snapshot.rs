//! Snapshot system: builds a read-only [`EmitterSnapshot`] from the world.

use glam::DVec3;
use hecs::World;
use serde::{Deserialize, Serialize};

use ballista_core::events::ProjectileEvent;
use ballista_core::types::{EmitterId, ProjectileId, SimTime};

use crate::projectile::ActiveProjectile;

/// Render-facing view of one projectile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectileView {
    pub id: ProjectileId,
    pub position: DVec3,
    pub velocity: DVec3,
    pub alive: bool,
    pub dry_run: bool,
    pub lifetime_distance: f64,
    pub time_alive: f64,
    pub containment_depth: usize,
    pub ricochets_remaining: u32,
    pub penetration_count: u32,
    /// Positions reached during the last tick.
    pub trail: Vec<DVec3>,
}

impl From<&ActiveProjectile> for ProjectileView {
    fn from(proj: &ActiveProjectile) -> Self {
        Self {
            id: proj.id,
            position: proj.position,
            velocity: proj.velocity,
            alive: proj.alive,
            dry_run: proj.dry_run,
            lifetime_distance: proj.lifetime_distance,
            time_alive: proj.time_alive,
            containment_depth: proj.containment.len(),
            ricochets_remaining: proj.ricochets_remaining,
            penetration_count: proj.penetration_count,
            trail: proj.last_frame_positions.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmitterSnapshot {
    pub emitter: EmitterId,
    pub time: SimTime,
    /// Sorted by id.
    pub projectiles: Vec<ProjectileView>,
    pub events: Vec<ProjectileEvent>,
}

pub fn build_snapshot(
    emitter: EmitterId,
    world: &World,
    time: &SimTime,
    events: Vec<ProjectileEvent>,
) -> EmitterSnapshot {
    let mut projectiles: Vec<ProjectileView> = world
        .query::<&ActiveProjectile>()
        .iter()
        .map(|(_, proj)| ProjectileView::from(proj))
        .collect();
    projectiles.sort_by_key(|p| p.id);

    EmitterSnapshot {
        emitter,
        time: *time,
        projectiles,
        events,
    }
}
