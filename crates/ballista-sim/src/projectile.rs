//! Per-shot simulation state.

use std::sync::Arc;

use glam::{DQuat, DVec3};
use serde::{Deserialize, Serialize};

use ballista_core::constants::STANDARD_GRAVITY;
use ballista_core::enums::{CapUpdate, StageMerge};
use ballista_core::material::MaterialToughness;
use ballista_core::math::look_rotation;
use ballista_core::scene::PhysicsScene;
use ballista_core::types::{ColliderId, EmitterId, Hit, LayerMask, ProjectileId};

use crate::definition::ProjectileDefinition;
use crate::stages::StageState;

/// What, if anything, the projectile steers toward.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub enum SeekTarget {
    #[default]
    None,
    /// Follow a collider; its centre is re-read every step.
    Collider(ColliderId),
    Point(DVec3),
}

impl SeekTarget {
    /// Current aim point. A collider the scene no longer knows yields `None`.
    pub fn resolve(&self, scene: &dyn PhysicsScene) -> Option<DVec3> {
        match *self {
            SeekTarget::None => None,
            SeekTarget::Collider(id) => scene.collider_center(id),
            SeekTarget::Point(p) => Some(p),
        }
    }

    pub fn collider(&self) -> Option<ColliderId> {
        match *self {
            SeekTarget::Collider(id) => Some(id),
            _ => None,
        }
    }
}

/// A solid or substance the projectile is inside.
#[derive(Debug, Clone)]
pub struct ContainmentEntry {
    /// Entry hit.
    pub hit: Hit,
    pub material: Option<Arc<MaterialToughness>>,
}

/// Entered-but-not-exited colliders, most recent last.
#[derive(Debug, Clone, Default)]
pub struct ContainmentStack {
    entries: Vec<ContainmentEntry>,
}

impl ContainmentStack {
    pub fn push(&mut self, entry: ContainmentEntry) {
        self.entries.push(entry);
    }

    pub fn top(&self) -> Option<&ContainmentEntry> {
        self.entries.last()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[ContainmentEntry] {
        &self.entries
    }

    pub fn contains_collider(&self, collider: ColliderId) -> bool {
        self.entries.iter().any(|e| e.hit.collider == collider)
    }

    /// Remove the entries at `indices` (any order, duplicates allowed) and
    /// return them ordered from the top of the stack down.
    pub fn remove_indices(&mut self, indices: &mut Vec<usize>) -> Vec<ContainmentEntry> {
        indices.sort_unstable_by(|a, b| b.cmp(a));
        indices.dedup();
        let mut removed = Vec::with_capacity(indices.len());
        for &i in indices.iter() {
            if i < self.entries.len() {
                removed.push(self.entries.remove(i));
            }
        }
        removed
    }
}

/// A queued launch, produced by stage actions or by callers who must not
/// affect the current tick.
#[derive(Debug, Clone)]
pub struct LaunchRequest {
    pub position: DVec3,
    pub direction: DVec3,
    pub seek: SeekTarget,
    pub dry_run: bool,
    /// Overrides the emitter's default definition.
    pub definition: Option<Arc<ProjectileDefinition>>,
}

impl LaunchRequest {
    pub fn new(position: DVec3, direction: DVec3) -> Self {
        Self {
            position,
            direction,
            seek: SeekTarget::None,
            dry_run: false,
            definition: None,
        }
    }
}

/// Options for swapping a live projectile onto another definition.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PresetSwitch {
    pub stages: StageMerge,
    pub penetration_distance: CapUpdate,
    pub penetration_count: CapUpdate,
    /// Restart curves from the current time and distance. When false the
    /// offsets reset to zero.
    pub restart_curves: bool,
}

/// Mutable state of one shot.
///
/// Cloning yields a value snapshot: the definition and stage rules are
/// shared, every simulation field is copied.
#[derive(Debug, Clone)]
pub struct ActiveProjectile {
    pub id: ProjectileId,
    pub emitter: EmitterId,
    pub definition: Arc<ProjectileDefinition>,
    pub alive: bool,
    /// Prediction shot: no side effects beyond its own state.
    pub dry_run: bool,
    /// OnDie has been emitted.
    pub death_reported: bool,

    // --- Launch-time copies of emitter settings ---
    pub target_layers: LayerMask,
    pub time_scale: f64,
    pub gravity: DVec3,
    /// Sub-steps per tick, fixed at launch.
    pub samples: u32,

    // --- Kinematics ---
    pub position: DVec3,
    pub velocity: DVec3,
    /// Kept in step with `velocity` by the integrator; never derived on read.
    pub velocity_normal: DVec3,
    /// Last sampled value of the speed curve.
    pub evaluated_speed: f64,
    /// Frame path curves are rotated into, refreshed each tick.
    pub launch_orientation: DQuat,
    pub last_frame_positions: Vec<DVec3>,
    pub lifetime_positions: Vec<DVec3>,

    // --- Lifetime ---
    pub lifetime_distance: f64,
    pub time_alive: f64,
    pub max_time_alive: f64,
    pub lifetime_offset: f64,
    pub distance_offset: f64,

    // --- Seeking ---
    pub seek: SeekTarget,

    // --- Penetration ---
    pub penetrated_distance: f64,
    pub penetration_count: u32,
    pub max_penetration_distance: f64,
    pub max_penetrations: u32,
    pub containment: ContainmentStack,
    pub last_hit: Option<Hit>,

    // --- Ricochet ---
    pub ricochets_remaining: u32,
    pub ricochets_until_seek: u32,

    pub stages: Vec<StageState>,
}

impl ActiveProjectile {
    /// Fresh shot from `position` along `direction` under `gravity`.
    pub fn new(
        id: ProjectileId,
        definition: Arc<ProjectileDefinition>,
        position: DVec3,
        direction: DVec3,
        gravity: DVec3,
    ) -> Self {
        let def = &definition;
        let direction = tilt_upwards(
            direction.normalize_or_zero(),
            def.speed.upwards_offset,
            gravity,
        );
        let speed = def.speed.curve.evaluate(0.0);
        let (max_penetration_distance, max_penetrations) = def.penetration.caps();
        let ricochets_until_seek = if def.ricochet.first_bounce_seeks {
            0
        } else {
            def.ricochet.seek_interval
        };

        Self {
            id,
            emitter: EmitterId::default(),
            alive: true,
            dry_run: false,
            death_reported: false,
            target_layers: LayerMask::ALL,
            time_scale: 1.0,
            gravity,
            samples: def.recommended_samples.max(1),
            position,
            velocity: direction * speed,
            velocity_normal: direction,
            evaluated_speed: speed,
            launch_orientation: look_rotation(direction, DVec3::Y),
            last_frame_positions: Vec::new(),
            lifetime_positions: vec![position],
            lifetime_distance: 0.0,
            time_alive: 0.0,
            max_time_alive: def.lifetime.seconds,
            lifetime_offset: 0.0,
            distance_offset: 0.0,
            seek: SeekTarget::None,
            penetrated_distance: 0.0,
            penetration_count: 0,
            max_penetration_distance,
            max_penetrations,
            containment: ContainmentStack::default(),
            last_hit: None,
            ricochets_remaining: def.ricochet.count,
            ricochets_until_seek,
            stages: def.stages.iter().cloned().map(StageState::new).collect(),
            definition,
        }
    }

    /// Shot under standard downward gravity.
    pub fn launch(
        id: ProjectileId,
        definition: Arc<ProjectileDefinition>,
        position: DVec3,
        direction: DVec3,
    ) -> Self {
        Self::new(id, definition, position, direction, DVec3::NEG_Y * STANDARD_GRAVITY)
    }

    pub fn speed(&self) -> f64 {
        self.velocity.length()
    }

    /// Curve position since the last stage offset.
    pub fn curve_position(&self, by_distance: bool) -> f64 {
        if by_distance {
            self.lifetime_distance - self.distance_offset
        } else {
            self.time_alive - self.lifetime_offset
        }
    }

    /// Set speed, keeping the heading.
    pub fn set_speed(&mut self, speed: f64) {
        self.velocity = self.velocity_normal * speed;
    }

    /// Set velocity and its cached normal together.
    pub fn set_velocity(&mut self, velocity: DVec3) {
        self.velocity = velocity;
        let n = velocity.normalize_or_zero();
        if n != DVec3::ZERO {
            self.velocity_normal = n;
        }
    }

    pub fn is_in_bounds(&self) -> bool {
        self.definition.lifetime.bounds.contains(self.position)
    }

    /// Swap to another definition mid-flight.
    pub fn switch_definition(
        &mut self,
        definition: Arc<ProjectileDefinition>,
        switch: &PresetSwitch,
    ) {
        if switch.restart_curves {
            self.lifetime_offset = self.time_alive;
            self.distance_offset = self.lifetime_distance;
        } else {
            self.lifetime_offset = 0.0;
            self.distance_offset = 0.0;
        }
        self.max_time_alive += definition.lifetime.seconds;

        let speed = definition
            .speed
            .curve
            .evaluate(self.curve_position(definition.speed.by_distance));
        self.evaluated_speed = speed;

        let (distance, count) = definition.penetration.caps();
        self.max_penetration_distance = match switch.penetration_distance {
            CapUpdate::Set => distance,
            CapUpdate::Add => self.max_penetration_distance + distance,
        };
        self.max_penetrations = match switch.penetration_count {
            CapUpdate::Set => count,
            CapUpdate::Add => self.max_penetrations.saturating_add(count),
        };

        let offset = definition.speed.upwards_offset;
        self.velocity_normal = tilt_upwards(self.velocity_normal, offset, self.gravity);
        self.velocity = self.velocity_normal * speed;

        match switch.stages {
            StageMerge::Keep => {}
            StageMerge::Add => self
                .stages
                .extend(definition.stages.iter().cloned().map(StageState::new)),
            StageMerge::Replace => {
                self.stages = definition.stages.iter().cloned().map(StageState::new).collect();
            }
        }

        tracing::debug!(
            projectile = %self.id,
            from = %self.definition.name,
            to = %definition.name,
            "switched definition"
        );
        self.definition = definition;
    }
}

/// Tilt `dir` away from gravity by `offset` and renormalize.
pub(crate) fn tilt_upwards(dir: DVec3, offset: f64, gravity: DVec3) -> DVec3 {
    if offset == 0.0 || dir == DVec3::ZERO {
        return dir;
    }
    let up = -gravity.normalize_or_zero();
    let up = if up == DVec3::ZERO { DVec3::Y } else { up };
    (dir + up * offset).normalize_or_zero()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ballista_core::curve::Curve;

    fn hit(collider: u32) -> Hit {
        Hit {
            point: DVec3::ZERO,
            normal: DVec3::Y,
            distance: 0.0,
            collider: ColliderId(collider),
            layer: 0,
            is_trigger: false,
        }
    }

    #[test]
    fn test_penetration_caps_zero_means_unlimited() {
        let mut def = ProjectileDefinition::default();
        def.penetration.distance = 0.0;
        def.penetration.max_objects = 3;
        let p = ActiveProjectile::launch(ProjectileId(1), Arc::new(def), DVec3::ZERO, DVec3::Z);
        assert!(p.max_penetration_distance.is_infinite());
        assert_eq!(p.max_penetrations, 3);
    }

    #[test]
    fn test_first_bounce_seeks_countdown() {
        let mut def = ProjectileDefinition::default();
        def.ricochet.seek_interval = 2;
        def.ricochet.first_bounce_seeks = false;
        let p = ActiveProjectile::launch(ProjectileId(1), Arc::new(def), DVec3::ZERO, DVec3::Z);
        assert_eq!(p.ricochets_until_seek, 2);
    }

    #[test]
    fn test_upwards_offset_tilts_launch() {
        let mut def = ProjectileDefinition::default();
        def.speed.upwards_offset = 1.0;
        let p = ActiveProjectile::launch(ProjectileId(1), Arc::new(def), DVec3::ZERO, DVec3::Z);
        let expected = DVec3::new(0.0, 1.0, 1.0).normalize();
        assert!((p.velocity_normal - expected).length() < 1e-12);
        assert!((p.speed() - 50.0).abs() < 1e-9, "speed {:.3}", p.speed());
    }

    #[test]
    fn test_remove_indices_top_down() {
        let mut stack = ContainmentStack::default();
        for id in 0..4 {
            stack.push(ContainmentEntry { hit: hit(id), material: None });
        }
        let removed = stack.remove_indices(&mut vec![1, 3, 1]);
        let ids: Vec<u32> = removed.iter().map(|e| e.hit.collider.0).collect();
        assert_eq!(ids, vec![3, 1]);
        assert_eq!(stack.len(), 2);
        assert_eq!(stack.top().map(|e| e.hit.collider), Some(ColliderId(2)));
    }

    #[test]
    fn test_switch_definition_extends_lifetime_and_resets_speed() {
        let base = ProjectileDefinition::default();
        let mut next = ProjectileDefinition::default();
        next.name = "fragment".into();
        next.speed.curve = Curve::constant(20.0);
        next.lifetime.seconds = 2.0;
        next.penetration.distance = 1.5;

        let mut p =
            ActiveProjectile::launch(ProjectileId(1), Arc::new(base), DVec3::ZERO, DVec3::Z);
        p.time_alive = 1.0;
        p.lifetime_distance = 50.0;
        p.switch_definition(
            Arc::new(next),
            &PresetSwitch {
                restart_curves: true,
                penetration_distance: CapUpdate::Add,
                ..Default::default()
            },
        );

        assert_eq!(p.definition.name, "fragment");
        assert!((p.max_time_alive - 7.0).abs() < 1e-12);
        assert!((p.speed() - 20.0).abs() < 1e-12);
        assert_eq!(p.evaluated_speed, 20.0);
        assert_eq!(p.lifetime_offset, 1.0);
        assert_eq!(p.distance_offset, 50.0);
        assert!((p.max_penetration_distance - 1.5).abs() < 1e-12);
    }
}
