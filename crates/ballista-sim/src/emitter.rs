//! Projectile emitter.
//!
//! `Emitter` owns the hecs world holding every live shot, launches new
//! ones, and advances them all once per tick against a caller-supplied
//! [`PhysicsScene`]. Fully headless and deterministic for a given seed.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use glam::DVec3;
use hecs::{Entity, World};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use ballista_core::constants::{DEFAULT_SPEED_FLOOR, DT, MAX_RESOLVE_STEPS, STANDARD_GRAVITY};
use ballista_core::error::{BallistaError, Result};
use ballista_core::events::{ProjectileEvent, ProjectileEventKind};
use ballista_core::material::{Atmosphere, MaterialRegistry, MaterialToughness};
use ballista_core::scene::PhysicsScene;
use ballista_core::types::{ColliderId, EmitterId, Hit, LayerMask, ProjectileId, SimTime};

use crate::definition::ProjectileDefinition;
use crate::integrator::{self, StepContext, SweepSettings};
use crate::projectile::{ActiveProjectile, ContainmentEntry, LaunchRequest};
use crate::systems;
use crate::systems::snapshot::EmitterSnapshot;
use crate::trajectory::{self, Prediction};

/// Configuration for an emitter.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmitterConfig {
    /// RNG seed for ricochet scatter. Same seed = same simulation.
    pub seed: u64,
    /// Seconds per tick.
    pub fixed_dt: f64,
    pub time_scale: f64,
    pub gravity: DVec3,
    /// Layers projectiles collide with.
    pub target_layers: LayerMask,
    pub atmosphere: Atmosphere,
    pub max_resolve_steps: u32,
    pub speed_floor: f64,
    /// Add the emitter's velocity to every launch.
    pub inherit_velocity: bool,
}

impl Default for EmitterConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            fixed_dt: DT,
            time_scale: 1.0,
            gravity: DVec3::NEG_Y * STANDARD_GRAVITY,
            target_layers: LayerMask::ALL,
            atmosphere: Atmosphere::default(),
            max_resolve_steps: MAX_RESOLVE_STEPS,
            speed_floor: DEFAULT_SPEED_FLOOR,
            inherit_velocity: false,
        }
    }
}

impl EmitterConfig {
    pub fn sweep_settings(&self) -> SweepSettings {
        SweepSettings {
            fixed_dt: self.fixed_dt,
            atmosphere: self.atmosphere,
            max_resolve_steps: self.max_resolve_steps,
            speed_floor: self.speed_floor,
        }
    }
}

/// Launches and advances projectiles.
pub struct Emitter {
    id: EmitterId,
    config: EmitterConfig,
    definition: Option<Arc<ProjectileDefinition>>,
    world: World,
    index: HashMap<ProjectileId, Entity>,
    time: SimTime,
    rng: ChaCha8Rng,
    next_projectile_id: u64,
    launch_queue: VecDeque<LaunchRequest>,
    despawn_buffer: Vec<Entity>,
    /// Events since the last tick boundary.
    events: Vec<ProjectileEvent>,
    last_events: Vec<ProjectileEvent>,

    // --- Launch state ---
    contained_by: Option<(ColliderId, Option<Arc<MaterialToughness>>)>,
    velocity: DVec3,
}

impl Emitter {
    pub fn new(id: EmitterId, config: EmitterConfig) -> Self {
        Self {
            id,
            rng: ChaCha8Rng::seed_from_u64(config.seed),
            config,
            definition: None,
            world: World::new(),
            index: HashMap::new(),
            time: SimTime::default(),
            next_projectile_id: 0,
            launch_queue: VecDeque::new(),
            despawn_buffer: Vec::new(),
            events: Vec::new(),
            last_events: Vec::new(),
            contained_by: None,
            velocity: DVec3::ZERO,
        }
    }

    /// Set the default definition used by launches that carry none.
    pub fn with_definition(mut self, definition: Arc<ProjectileDefinition>) -> Self {
        self.definition = Some(definition);
        self
    }

    pub fn set_definition(&mut self, definition: Option<Arc<ProjectileDefinition>>) {
        self.definition = definition;
    }

    pub fn id(&self) -> EmitterId {
        self.id
    }

    pub fn config(&self) -> &EmitterConfig {
        &self.config
    }

    pub fn time(&self) -> SimTime {
        self.time
    }

    /// Get a read-only reference to the ECS world.
    pub fn world(&self) -> &World {
        &self.world
    }

    /// Number of projectiles in the world, including ones in their death frame.
    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Mark the emitter as sitting inside `collider`. Every later launch
    /// starts contained by it, paying its drag but no penetration budget.
    pub fn set_contained_by(
        &mut self,
        collider: ColliderId,
        material: Option<Arc<MaterialToughness>>,
    ) {
        self.contained_by = Some((collider, material));
    }

    pub fn clear_contained_by(&mut self) {
        self.contained_by = None;
    }

    /// Emitter velocity, inherited by launches when the config asks for it.
    pub fn set_velocity(&mut self, velocity: DVec3) {
        self.velocity = velocity;
    }

    // --- Projectile access ---

    pub fn get(&self, id: ProjectileId) -> Option<hecs::Ref<'_, ActiveProjectile>> {
        let entity = *self.index.get(&id)?;
        self.world.get::<&ActiveProjectile>(entity).ok()
    }

    pub fn get_mut(&mut self, id: ProjectileId) -> Option<hecs::RefMut<'_, ActiveProjectile>> {
        let entity = *self.index.get(&id)?;
        self.world.get::<&mut ActiveProjectile>(entity).ok()
    }

    /// Ids of every projectile in the world, ascending.
    pub fn projectile_ids(&self) -> Vec<ProjectileId> {
        let mut ids: Vec<ProjectileId> = self.index.keys().copied().collect();
        ids.sort();
        ids
    }

    // --- Launching ---

    /// Launch immediately. The projectile first moves on the next tick.
    pub fn launch(&mut self, request: LaunchRequest) -> Result<ProjectileId> {
        let id = ProjectileId(self.next_projectile_id);
        let proj = self.build_projectile(id, request)?;
        self.next_projectile_id += 1;

        debug!(
            emitter = self.id.0,
            projectile = %id,
            definition = %proj.definition.name,
            position = ?proj.position,
            dry_run = proj.dry_run,
            "launched projectile"
        );
        let entity = self.world.spawn((proj,));
        self.index.insert(id, entity);
        Ok(id)
    }

    /// Queue a launch for the end of the current or next tick.
    pub fn launch_deferred(&mut self, request: LaunchRequest) {
        self.launch_queue.push_back(request);
    }

    fn build_projectile(
        &self,
        id: ProjectileId,
        request: LaunchRequest,
    ) -> Result<ActiveProjectile> {
        let definition = request
            .definition
            .or_else(|| self.definition.clone())
            .ok_or(BallistaError::NoDefinition)?;
        definition.check()?;

        let mut proj = ActiveProjectile::new(
            id,
            definition,
            request.position,
            request.direction,
            self.config.gravity,
        );
        proj.emitter = self.id;
        proj.dry_run = request.dry_run;
        proj.seek = request.seek;
        proj.target_layers = self.config.target_layers;
        proj.time_scale = self.config.time_scale;
        if self.config.inherit_velocity {
            proj.set_velocity(proj.velocity + self.velocity);
        }
        if let Some((collider, material)) = &self.contained_by {
            proj.containment.push(ContainmentEntry {
                hit: Hit {
                    point: request.position,
                    normal: -proj.velocity_normal,
                    distance: 0.0,
                    collider: *collider,
                    layer: 0,
                    is_trigger: true,
                },
                material: material.clone(),
            });
        }
        Ok(proj)
    }

    fn drain_launch_queue(&mut self) {
        while let Some(request) = self.launch_queue.pop_front() {
            if let Err(err) = self.launch(request) {
                warn!(emitter = self.id.0, error = %err, "dropped queued launch");
            }
        }
    }

    // --- Simulation ---

    /// Advance every projectile by one tick and return the tick's events.
    pub fn tick(
        &mut self,
        scene: &dyn PhysicsScene,
        materials: &MaterialRegistry,
    ) -> Vec<ProjectileEvent> {
        // Projectiles that died last tick have had their death frame.
        self.remove_dead_instances();

        let mut ctx = StepContext {
            scene,
            materials,
            settings: self.config.sweep_settings(),
            rng: &mut self.rng,
            events: &mut self.events,
            launches: &mut self.launch_queue,
        };
        for (_entity, proj) in self.world.query_mut::<&mut ActiveProjectile>() {
            if proj.alive {
                integrator::advance_tick(proj, &mut ctx, false);
            }
        }

        self.drain_launch_queue();
        self.time.advance(self.config.fixed_dt);

        let events = std::mem::take(&mut self.events);
        self.last_events.clone_from(&events);
        events
    }

    /// Tick and return a snapshot carrying the tick's events.
    pub fn step(
        &mut self,
        scene: &dyn PhysicsScene,
        materials: &MaterialRegistry,
    ) -> EmitterSnapshot {
        let events = self.tick(scene, materials);
        systems::snapshot::build_snapshot(self.id, &self.world, &self.time, events)
    }

    /// Snapshot of the current state with the events of the last tick.
    pub fn snapshot(&self) -> EmitterSnapshot {
        systems::snapshot::build_snapshot(
            self.id,
            &self.world,
            &self.time,
            self.last_events.clone(),
        )
    }

    /// Despawn every dead projectile now. Returns how many were removed.
    pub fn remove_dead_instances(&mut self) -> usize {
        systems::cleanup::run(&mut self.world, &mut self.despawn_buffer, &mut self.index)
    }

    /// Events raised outside a tick (kills, manual hits) since the last tick.
    pub fn take_events(&mut self) -> Vec<ProjectileEvent> {
        std::mem::take(&mut self.events)
    }

    // --- By-id operations ---

    /// Kill a projectile. OnDie fires now, once; the projectile is removed
    /// on the next tick.
    pub fn kill(&mut self, id: ProjectileId) -> Result<()> {
        let entity = *self.index.get(&id).ok_or(BallistaError::UnknownProjectile(id))?;
        let mut proj = self
            .world
            .get::<&mut ActiveProjectile>(entity)
            .map_err(|_| BallistaError::UnknownProjectile(id))?;
        proj.alive = false;
        integrator::report_death(&mut proj, &mut self.events);
        Ok(())
    }

    /// Fire OnHit as if the projectile had struck `collider`, optionally
    /// killing it.
    pub fn manual_hit(
        &mut self,
        id: ProjectileId,
        collider: ColliderId,
        kill: bool,
        scene: &dyn PhysicsScene,
    ) -> Result<()> {
        let entity = *self.index.get(&id).ok_or(BallistaError::UnknownProjectile(id))?;
        let mut proj = self
            .world
            .get::<&mut ActiveProjectile>(entity)
            .map_err(|_| BallistaError::UnknownProjectile(id))?;
        if !proj.alive {
            return Err(BallistaError::UnknownProjectile(id));
        }

        let hit = struck_surface(&proj, collider, scene);
        proj.last_hit = Some(hit);
        integrator::push_event(&mut self.events, &proj, ProjectileEventKind::Hit, Some(hit));
        if kill {
            proj.alive = false;
            integrator::report_death(&mut proj, &mut self.events);
        }
        Ok(())
    }

    // --- Prediction ---

    /// Run a dry-run copy of `request` until it dies. Live projectiles,
    /// the projectile id sequence and the live RNG stream are untouched.
    pub fn predict(
        &self,
        request: LaunchRequest,
        scene: &dyn PhysicsScene,
        materials: &MaterialRegistry,
        record: bool,
    ) -> Result<Prediction> {
        let proj = self.build_projectile(ProjectileId(self.next_projectile_id), request)?;
        Ok(trajectory::predict(
            proj,
            scene,
            materials,
            self.config.sweep_settings(),
            self.rng.clone(),
            record,
        ))
    }

    /// Final state of a dry-run shot.
    pub fn predict_trajectory(
        &self,
        request: LaunchRequest,
        scene: &dyn PhysicsScene,
        materials: &MaterialRegistry,
    ) -> Result<ActiveProjectile> {
        Ok(self.predict(request, scene, materials, false)?.projectile)
    }

    /// State after every resolve step of a dry-run shot.
    pub fn predict_trajectory_full(
        &self,
        request: LaunchRequest,
        scene: &dyn PhysicsScene,
        materials: &MaterialRegistry,
    ) -> Result<Vec<ActiveProjectile>> {
        Ok(self.predict(request, scene, materials, true)?.steps)
    }
}

/// Surface of `collider` facing the projectile, or its centre when the
/// scene cannot say.
fn struck_surface(proj: &ActiveProjectile, collider: ColliderId, scene: &dyn PhysicsScene) -> Hit {
    let fallback = |point: DVec3| Hit {
        point,
        normal: -proj.velocity_normal,
        distance: proj.position.distance(point),
        collider,
        layer: 0,
        is_trigger: false,
    };
    let Some(center) = scene.collider_center(collider) else {
        return fallback(proj.position);
    };
    let to_center = center - proj.position;
    scene
        .collider_raycast(
            collider,
            proj.position,
            to_center.normalize_or_zero(),
            to_center.length(),
        )
        .unwrap_or_else(|| fallback(center))
}
