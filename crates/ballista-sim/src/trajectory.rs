//! Dry-run trajectory prediction.
//!
//! A prediction runs a private copy of a shot until it dies. It owns its
//! RNG, event log and launch queue, so nothing it does reaches live
//! projectiles. Launches requested by its stages are collected but never
//! spawned.

use std::collections::VecDeque;

use rand_chacha::ChaCha8Rng;
use serde::Serialize;
use tracing::warn;

use ballista_core::constants::MAX_PREDICTION_TICKS;
use ballista_core::events::ProjectileEvent;
use ballista_core::material::MaterialRegistry;
use ballista_core::scene::PhysicsScene;

use crate::integrator::{self, StepContext, SweepSettings};
use crate::projectile::{ActiveProjectile, LaunchRequest};
use crate::systems::snapshot::ProjectileView;

#[derive(Debug, Clone)]
pub struct Prediction {
    /// State when the shot died or the tick ceiling was reached.
    pub projectile: ActiveProjectile,
    /// State after every resolve step, when recorded.
    pub steps: Vec<ActiveProjectile>,
    pub events: Vec<ProjectileEvent>,
    pub launches: Vec<LaunchRequest>,
    pub ticks: u32,
}

/// Serializable summary of a [`Prediction`].
#[derive(Debug, Clone, Serialize)]
pub struct PredictionReport {
    pub ticks: u32,
    pub final_state: ProjectileView,
    pub path: Vec<glam::DVec3>,
    pub events: Vec<ProjectileEvent>,
    pub child_launches: usize,
}

impl Prediction {
    pub fn report(&self) -> PredictionReport {
        PredictionReport {
            ticks: self.ticks,
            final_state: ProjectileView::from(&self.projectile),
            path: self.projectile.lifetime_positions.clone(),
            events: self.events.clone(),
            child_launches: self.launches.len(),
        }
    }
}

/// Run `proj` as a dry run until it dies.
pub fn predict(
    mut proj: ActiveProjectile,
    scene: &dyn PhysicsScene,
    materials: &MaterialRegistry,
    settings: SweepSettings,
    mut rng: ChaCha8Rng,
    record: bool,
) -> Prediction {
    proj.dry_run = true;
    let mut events = Vec::new();
    let mut launches = VecDeque::new();
    let mut steps = Vec::new();
    let mut ticks = 0;

    let mut ctx = StepContext {
        scene,
        materials,
        settings,
        rng: &mut rng,
        events: &mut events,
        launches: &mut launches,
    };

    while proj.alive && ticks < MAX_PREDICTION_TICKS {
        steps.extend(integrator::advance_tick(&mut proj, &mut ctx, record));
        ticks += 1;
    }
    if proj.alive {
        warn!(projectile = %proj.id, ticks, "prediction stopped before the shot died");
    }

    Prediction {
        projectile: proj,
        steps,
        events,
        launches: launches.into(),
        ticks,
    }
}
