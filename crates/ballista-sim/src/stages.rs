//! Stage rules: one-shot condition blocks that run actions against a
//! projectile in flight.
//!
//! The evaluator only talks to [`StageCondition`] and [`StageAction`].
//! [`Condition`] and [`Action`] are the built-in, serializable rule sets;
//! their `Custom` variants carry user rules.

use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;

use glam::DVec3;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use ballista_core::enums::{BlockKind, DryRunBehavior, HitFilter};
use ballista_core::math::{euler_degrees, look_rotation, rotate_towards};
use ballista_core::scene::PhysicsScene;
use ballista_core::types::LayerMask;

use crate::definition::ProjectileDefinition;
use crate::projectile::{ActiveProjectile, LaunchRequest, PresetSwitch, SeekTarget};

/// A predicate over projectile state.
pub trait StageCondition: fmt::Debug + Send + Sync {
    fn evaluate(&self, proj: &ActiveProjectile, scene: &dyn PhysicsScene) -> bool;
}

/// A mutation applied when a block fires.
///
/// Actions may queue launches but must not advance `proj`.
pub trait StageAction: fmt::Debug + Send + Sync {
    fn apply(&self, proj: &mut ActiveProjectile, ctx: &mut ActionContext<'_>);
}

/// What actions can reach besides the projectile itself.
pub struct ActionContext<'a> {
    pub scene: &'a dyn PhysicsScene,
    pub launches: &'a mut VecDeque<LaunchRequest>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Condition {
    Always,
    /// Time alive at or past `seconds` (at or below when `below`).
    TimeAlive {
        seconds: f64,
        #[serde(default)]
        below: bool,
    },
    DistanceTraveled {
        distance: f64,
        #[serde(default)]
        below: bool,
    },
    /// Distance to the seek target at or past `distance` (at or below when `within`).
    DistanceToTarget {
        distance: f64,
        #[serde(default)]
        within: bool,
    },
    OnHit {
        #[serde(default)]
        filter: HitFilter,
    },
    /// Last hit was the collider being sought.
    OnHitTarget,
    OnDie,
    /// Unobstructed line to the seek target (blocked when `invert`).
    LineOfSight {
        #[serde(default)]
        invert: bool,
    },
    /// Heading within `leniency_deg` of perpendicular to the target.
    PerpendicularToTarget { leniency_deg: f64 },
    /// Another stage on this projectile has fired.
    StageCompleted { index: usize },
    #[serde(skip)]
    Custom(Arc<dyn StageCondition>),
}

impl StageCondition for Condition {
    fn evaluate(&self, proj: &ActiveProjectile, scene: &dyn PhysicsScene) -> bool {
        match self {
            Condition::Always => true,
            Condition::TimeAlive { seconds, below } => {
                if *below {
                    proj.time_alive <= *seconds
                } else {
                    proj.time_alive >= *seconds
                }
            }
            Condition::DistanceTraveled { distance, below } => {
                if *below {
                    proj.lifetime_distance <= *distance
                } else {
                    proj.lifetime_distance >= *distance
                }
            }
            Condition::DistanceToTarget { distance, within } => match proj.seek.resolve(scene) {
                Some(target) => {
                    let d = proj.position.distance(target);
                    if *within {
                        d <= *distance
                    } else {
                        d >= *distance
                    }
                }
                None => false,
            },
            Condition::OnHit { filter } => {
                proj.last_hit.is_some_and(|h| filter.accepts(h.is_trigger))
            }
            Condition::OnHitTarget => match (proj.seek.collider(), proj.last_hit) {
                (Some(target), Some(hit)) => hit.collider == target,
                _ => false,
            },
            Condition::OnDie => !proj.alive,
            Condition::LineOfSight { invert } => {
                line_of_sight(proj, scene).is_some_and(|clear| clear != *invert)
            }
            Condition::PerpendicularToTarget { leniency_deg } => match proj.seek.resolve(scene) {
                Some(target) => {
                    let to_target = target - proj.position;
                    if to_target.length_squared() == 0.0 || proj.velocity_normal == DVec3::ZERO {
                        return false;
                    }
                    let angle = proj.velocity_normal.angle_between(to_target).to_degrees();
                    (angle - 90.0).abs() <= *leniency_deg
                }
                None => false,
            },
            Condition::StageCompleted { index } => {
                proj.stages.get(*index).is_some_and(|s| s.triggered)
            }
            Condition::Custom(rule) => rule.evaluate(proj, scene),
        }
    }
}

/// `Some(true)` when nothing on the target layers blocks the line to the
/// seek target, `None` when there is no target.
fn line_of_sight(proj: &ActiveProjectile, scene: &dyn PhysicsScene) -> Option<bool> {
    let target = proj.seek.resolve(scene)?;
    let offset = target - proj.position;
    let distance = offset.length();
    if distance == 0.0 {
        return Some(true);
    }
    let blocker = scene.raycast(proj.position, offset / distance, distance, proj.target_layers);
    Some(match (blocker, proj.seek) {
        (None, SeekTarget::Point(_)) => true,
        (None, _) => false,
        (Some(hit), SeekTarget::Collider(id)) => hit.collider == id,
        (Some(_), _) => false,
    })
}

/// One sub-munition of an emit action.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EmitSpec {
    /// Definition of the child. `None` uses the emitter's default.
    pub definition: Option<Arc<ProjectileDefinition>>,
    /// Pitch, yaw, roll offset from the parent heading, degrees.
    pub direction_offset: DVec3,
    pub position_offset: DVec3,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Action {
    Kill,
    SwitchPreset {
        definition: Arc<ProjectileDefinition>,
        #[serde(default)]
        options: PresetSwitch,
    },
    /// Queue child launches from the projectile's position and heading.
    Emit {
        emits: Vec<EmitSpec>,
        #[serde(default)]
        dry_run: DryRunBehavior,
    },
    /// Turn toward the seek target by at most `max_degrees`.
    SnapToTarget { max_degrees: f64 },
    /// Hold `distance` above the first surface found straight down.
    HoverAboveSurface { layers: LayerMask, distance: f64 },
    #[serde(skip)]
    Custom(Arc<dyn StageAction>),
}

impl StageAction for Action {
    fn apply(&self, proj: &mut ActiveProjectile, ctx: &mut ActionContext<'_>) {
        match self {
            Action::Kill => proj.alive = false,
            Action::SwitchPreset { definition, options } => {
                proj.switch_definition(Arc::clone(definition), options);
            }
            Action::Emit { emits, dry_run } => {
                if proj.dry_run && *dry_run == DryRunBehavior::Skip {
                    return;
                }
                let frame = look_rotation(proj.velocity_normal, DVec3::Y);
                for spec in emits {
                    let o = spec.direction_offset;
                    let direction = frame * (euler_degrees(o.x, o.y, o.z) * DVec3::Z);
                    ctx.launches.push_back(LaunchRequest {
                        position: proj.position + spec.position_offset,
                        direction,
                        seek: proj.seek,
                        dry_run: proj.dry_run,
                        definition: spec.definition.clone(),
                    });
                }
            }
            Action::SnapToTarget { max_degrees } => {
                if let Some(target) = proj.seek.resolve(ctx.scene) {
                    let speed = proj.speed();
                    let heading = rotate_towards(
                        proj.velocity_normal,
                        target - proj.position,
                        max_degrees.to_radians(),
                    );
                    proj.velocity_normal = heading;
                    proj.velocity = heading * speed;
                }
            }
            Action::HoverAboveSurface { layers, distance } => {
                let below = ctx
                    .scene
                    .raycast(proj.position, DVec3::NEG_Y, distance + 0.01, *layers);
                if let Some(hit) = below {
                    proj.position.y = hit.point.y + distance;
                }
            }
            Action::Custom(rule) => rule.apply(proj, ctx),
        }
    }
}

/// Conditions combined by `kind`, with actions run when they hold.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Block {
    pub kind: BlockKind,
    pub conditions: Vec<Condition>,
    pub actions: Vec<Action>,
}

impl Block {
    /// AND needs every condition, OR stops at the first true one. A block
    /// without conditions never fires.
    pub fn evaluate(&self, proj: &ActiveProjectile, scene: &dyn PhysicsScene) -> bool {
        if self.conditions.is_empty() {
            warn!(projectile = %proj.id, "stage block has no conditions");
            return false;
        }
        match self.kind {
            BlockKind::And => self.conditions.iter().all(|c| c.evaluate(proj, scene)),
            BlockKind::Or => self.conditions.iter().any(|c| c.evaluate(proj, scene)),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Stage {
    pub name: String,
    pub blocks: Vec<Block>,
}

/// A stage and whether it has fired on this projectile.
#[derive(Debug, Clone)]
pub struct StageState {
    pub stage: Arc<Stage>,
    pub triggered: bool,
}

impl StageState {
    pub fn new(stage: Arc<Stage>) -> Self {
        Self { stage, triggered: false }
    }
}

/// Run every untriggered stage once against `proj`. Each block that holds
/// marks its stage triggered and runs its actions.
pub fn evaluate(proj: &mut ActiveProjectile, ctx: &mut ActionContext<'_>) {
    // Index loop: actions may replace or extend the stage list.
    let mut i = 0;
    while i < proj.stages.len() {
        if proj.stages[i].triggered {
            i += 1;
            continue;
        }
        let stage = Arc::clone(&proj.stages[i].stage);
        if stage.blocks.is_empty() {
            debug!(projectile = %proj.id, stage = %stage.name, "stage has no blocks");
        }
        for block in &stage.blocks {
            if !block.evaluate(proj, ctx.scene) {
                continue;
            }
            if let Some(state) = proj.stages.get_mut(i) {
                if Arc::ptr_eq(&state.stage, &stage) {
                    state.triggered = true;
                }
            }
            debug!(projectile = %proj.id, stage = %stage.name, "stage triggered");
            for action in &block.actions {
                action.apply(proj, ctx);
            }
        }
        i += 1;
    }
}
