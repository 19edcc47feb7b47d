//! Notifications produced while projectiles are advanced.

use glam::DVec3;
use serde::{Deserialize, Serialize};

use crate::types::{EmitterId, Hit, ProjectileId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProjectileEventKind {
    Hit,
    HitTrigger,
    Die,
    Ricochet,
    Penetration,
    PenetrationExit,
}

/// A fire-and-forget event. Consumers read them after the tick; nothing in
/// the simulation depends on them being observed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectileEvent {
    pub kind: ProjectileEventKind,
    pub projectile: ProjectileId,
    pub emitter: EmitterId,
    /// Projectile position when the event fired.
    pub position: DVec3,
    pub hit: Option<Hit>,
    pub dry_run: bool,
}
