//! Motion integrator.
//!
//! [`advance`] moves a projectile through one sample of a tick. Each
//! resolve step composes drag, paths, gravity and seeking into a working
//! [`Sweep`], casts it against the scene, and commits the motion up to the
//! first surface crossing. A truncated step leaves a remainder that the
//! next step consumes, so one sample may chain several entries, exits and
//! bounces.

use std::collections::VecDeque;
use std::sync::Arc;

use glam::DVec3;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use ballista_core::constants::{
    DEFAULT_SPEED_FLOOR, DT, MAX_RESOLVE_STEPS, MIN_LIFE_FRACTION, SURFACE_EPSILON,
};
use ballista_core::events::{ProjectileEvent, ProjectileEventKind};
use ballista_core::material::{Atmosphere, MaterialRegistry};
use ballista_core::math::look_rotation;
use ballista_core::scene::PhysicsScene;
use ballista_core::types::Hit;

use crate::projectile::{ActiveProjectile, ContainmentEntry, LaunchRequest};
use crate::stages::{self, ActionContext};
use crate::systems::ricochet::Bounce;
use crate::systems::{drag, forces, ricochet};

/// Integrator tuning shared by every projectile of an emitter.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct SweepSettings {
    /// Seconds per tick.
    pub fixed_dt: f64,
    pub atmosphere: Atmosphere,
    /// Resolve steps allowed within one sample before the projectile is killed.
    pub max_resolve_steps: u32,
    /// Drag never takes a projectile below this speed.
    pub speed_floor: f64,
}

impl Default for SweepSettings {
    fn default() -> Self {
        Self {
            fixed_dt: DT,
            atmosphere: Atmosphere::default(),
            max_resolve_steps: MAX_RESOLVE_STEPS,
            speed_floor: DEFAULT_SPEED_FLOOR,
        }
    }
}

/// Everything a step reads or writes besides the projectile.
pub struct StepContext<'a> {
    pub scene: &'a dyn PhysicsScene,
    pub materials: &'a MaterialRegistry,
    pub settings: SweepSettings,
    pub rng: &'a mut ChaCha8Rng,
    pub events: &'a mut Vec<ProjectileEvent>,
    pub launches: &'a mut VecDeque<LaunchRequest>,
}

/// Working velocity of one resolve step and the contributions that built it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sweep {
    pub velocity: DVec3,
    pub normal: DVec3,
    /// Velocity removed by the path pull (before minus after).
    pub paths: DVec3,
    /// Velocity added by gravity.
    pub gravity: DVec3,
    /// Velocity removed by seeking (before minus after).
    pub seek: DVec3,
    /// Speed removed by drag.
    pub slowdown: f64,
}

impl Sweep {
    pub fn new(normal: DVec3, speed: f64) -> Self {
        Self {
            velocity: normal * speed,
            normal,
            paths: DVec3::ZERO,
            gravity: DVec3::ZERO,
            seek: DVec3::ZERO,
            slowdown: 0.0,
        }
    }

    pub fn speed(&self) -> f64 {
        self.velocity.length()
    }

    /// Replace the velocity. A zero velocity keeps the previous heading.
    pub fn set_velocity(&mut self, velocity: DVec3) {
        self.velocity = velocity;
        let n = velocity.normalize_or_zero();
        if n != DVec3::ZERO {
            self.normal = n;
        }
    }

    pub fn set_speed(&mut self, speed: f64) {
        self.velocity = self.normal * speed;
    }

    pub fn apply_drag(&mut self, drag: f64, mass: f64, dt: f64, floor: f64) {
        let before = self.speed();
        let after = drag::decay(before, drag, mass, dt, floor);
        self.slowdown = before - after;
        self.set_speed(after);
    }

    /// Undo drag, gravity and seeking and reapply them over a shortened
    /// `dt`. The path pull is dropped for the rest of the step.
    fn rebuild(
        &mut self,
        proj: &ActiveProjectile,
        scene: &dyn PhysicsScene,
        drag: f64,
        dt: f64,
        floor: f64,
    ) {
        self.set_velocity(self.velocity + self.paths + self.seek - self.gravity);
        self.paths = DVec3::ZERO;
        self.seek = DVec3::ZERO;
        self.gravity = DVec3::ZERO;
        self.set_speed(self.speed() + self.slowdown);
        self.apply_drag(drag, proj.definition.drag.mass, dt, floor);
        forces::apply_gravity(self, proj, dt);
        forces::apply_seek(self, proj, scene, dt);
    }
}

pub(crate) fn push_event(
    events: &mut Vec<ProjectileEvent>,
    proj: &ActiveProjectile,
    kind: ProjectileEventKind,
    hit: Option<Hit>,
) {
    events.push(ProjectileEvent {
        kind,
        projectile: proj.id,
        emitter: proj.emitter,
        position: proj.position,
        hit,
        dry_run: proj.dry_run,
    });
}

/// Emit OnDie for a dead projectile, once.
pub fn report_death(proj: &mut ActiveProjectile, events: &mut Vec<ProjectileEvent>) {
    if proj.alive || proj.death_reported {
        return;
    }
    proj.death_reported = true;
    debug!(projectile = %proj.id, position = ?proj.position, "projectile died");
    push_event(events, proj, ProjectileEventKind::Die, proj.last_hit);
}

/// One tick of a projectile: `samples` calls to [`advance`], with the
/// per-tick position history reset first and appended to the lifetime
/// history after.
pub fn advance_tick(
    proj: &mut ActiveProjectile,
    ctx: &mut StepContext<'_>,
    record: bool,
) -> Vec<ActiveProjectile> {
    let mut snapshots = Vec::new();
    proj.last_frame_positions.clear();
    proj.launch_orientation = look_rotation(proj.velocity_normal, DVec3::Y);
    for _ in 0..proj.samples.max(1) {
        snapshots.extend(advance(proj, ctx, record));
    }
    let frame = std::mem::take(&mut proj.last_frame_positions);
    proj.lifetime_positions.extend_from_slice(&frame);
    proj.last_frame_positions = frame;
    snapshots
}

/// Advance `proj` through one sample. With `record`, returns a snapshot of
/// the projectile after every resolve step.
pub fn advance(
    proj: &mut ActiveProjectile,
    ctx: &mut StepContext<'_>,
    record: bool,
) -> Vec<ActiveProjectile> {
    let mut snapshots = Vec::new();
    if proj.alive && proj.velocity_normal == DVec3::ZERO {
        debug!(projectile = %proj.id, "projectile has no heading");
        proj.alive = false;
    }
    if !proj.alive {
        report_death(proj, ctx.events);
        return snapshots;
    }

    let sample_dt = ctx.settings.fixed_dt * proj.time_scale / f64::from(proj.samples.max(1));
    if sample_dt <= 0.0 {
        return snapshots;
    }
    // The last sample before expiry only gets the time that is left.
    let life = ((proj.max_time_alive - proj.time_alive) / sample_dt).clamp(MIN_LIFE_FRACTION, 1.0);
    let budget = sample_dt * life;

    let mut remaining = 1.0;
    let mut steps = 0;
    loop {
        if steps >= ctx.settings.max_resolve_steps {
            warn!(
                projectile = %proj.id,
                steps,
                position = ?proj.position,
                "resolve step limit reached, killing projectile"
            );
            proj.alive = false;
            break;
        }
        steps += 1;

        let next = resolve_step(proj, ctx, budget, remaining);
        if record {
            snapshots.push(proj.clone());
        }
        match next {
            Some(percent) => remaining *= 1.0 - percent,
            None => break,
        }
    }

    if !proj.alive {
        report_death(proj, ctx.events);
    }
    snapshots
}

/// Drag through `entry` spends penetration budget.
fn costs_penetration(
    proj: &ActiveProjectile,
    entry: &ContainmentEntry,
    atmosphere: &Atmosphere,
) -> bool {
    let pen = &proj.definition.penetration;
    !entry.hit.is_trigger
        && pen.layers.contains(entry.hit.layer)
        && drag::medium_drag(entry.material.as_deref(), atmosphere) > pen.drag_threshold
}

fn fraction(distance: f64, full: f64) -> f64 {
    if full > 0.0 {
        distance / full
    } else {
        1.0
    }
}

fn still_alive(proj: &ActiveProjectile, remaining: f64) -> bool {
    let life = &proj.definition.lifetime;
    if proj.time_alive >= proj.max_time_alive {
        return false;
    }
    if !proj.is_in_bounds() {
        return false;
    }
    proj.speed() > life.minimum_speed * remaining.clamp(0.0, 1.0)
}

/// One resolve step over `remaining` of the sample budget. Returns the
/// share of the step travelled when a crossing cut it short and the
/// projectile should continue.
fn resolve_step(
    proj: &mut ActiveProjectile,
    ctx: &mut StepContext<'_>,
    budget: f64,
    remaining: f64,
) -> Option<f64> {
    let def = Arc::clone(&proj.definition);
    let settings = ctx.settings;
    let floor = settings.speed_floor;
    let dt = budget * remaining;
    let start = proj.position;

    // Apply only the change in the speed curve, so speed set from outside
    // (ricochets, actions) carries over.
    let evaluated = def.speed.curve.evaluate(proj.curve_position(def.speed.by_distance));
    let speed = (proj.speed() + evaluated - proj.evaluated_speed).max(0.0);
    proj.evaluated_speed = evaluated;

    let medium = proj.containment.top().and_then(|e| e.material.clone());
    let medium_drag = drag::medium_drag(medium.as_deref(), &settings.atmosphere);

    let mut sweep = Sweep::new(proj.velocity_normal, speed);
    sweep.apply_drag(medium_drag, def.drag.mass, dt, floor);
    forces::apply_paths(&mut sweep, proj, remaining);
    forces::apply_gravity(&mut sweep, proj, dt);
    forces::apply_seek(&mut sweep, proj, ctx.scene, dt);

    let full_len = sweep.speed() * dt;
    let mut frame_len = full_len;
    let mut end = start + sweep.normal * full_len;
    let mut percent = 1.0;
    let mut truncated = false;
    let mut penetrated = 0.0;
    let mut check_caps = false;
    let mut pops: Vec<usize> = Vec::new();
    let mut exit_hit: Option<Hit> = None;
    let mut entering: Option<ContainmentEntry> = None;

    // --- Leaving the innermost collider ---
    if let Some(top) = proj.containment.top().cloned() {
        let top_index = proj.containment.len() - 1;
        let costed = costs_penetration(proj, &top, &settings.atmosphere);
        if costed {
            penetrated = frame_len;
            let budget_left = (proj.max_penetration_distance - proj.penetrated_distance).max(0.0);
            if frame_len > budget_left {
                frame_len = budget_left;
                penetrated = budget_left;
                end = start + sweep.normal * budget_left;
            }
        }
        let exit = ctx
            .scene
            .collider_raycast(top.hit.collider, end, -sweep.normal, frame_len);
        if let Some(exit) = exit {
            frame_len = start.distance(exit.point);
            percent = fraction(frame_len, full_len);
            end = exit.point + sweep.normal * SURFACE_EPSILON;
            pops.push(top_index);
            exit_hit = Some(exit);
            truncated = true;
            sweep.rebuild(proj, ctx.scene, medium_drag, dt * percent, floor);
            penetrated = if costed { frame_len } else { 0.0 };
        }
    }

    // --- First surface ahead ---
    let layers = proj.target_layers;
    // Surfaces we are inside of, or the face of a plain trigger we stopped on.
    let resting_on = |h: &Hit| {
        proj.containment.contains_collider(h.collider)
            || (h.is_trigger
                && h.distance <= SURFACE_EPSILON
                && proj.last_hit.is_some_and(|last| last.collider == h.collider))
    };
    let mut ahead = ctx.scene.raycast(start, sweep.normal, frame_len, layers);
    if ahead.as_ref().is_some_and(resting_on) {
        let len = (frame_len - SURFACE_EPSILON).max(0.0);
        ahead = ctx
            .scene
            .raycast(start + sweep.normal * SURFACE_EPSILON, sweep.normal, len, layers)
            .filter(|h| !resting_on(h));
    }

    if let Some(hit) = ahead {
        let distance = start.distance(hit.point);
        percent = fraction(distance, full_len);
        end = hit.point;
        frame_len = distance;
        pops.clear();
        exit_hit = None;
        truncated = true;
        sweep.rebuild(proj, ctx.scene, medium_drag, dt * percent, floor);
        proj.last_hit = Some(hit);

        if hit.is_trigger {
            push_event(ctx.events, proj, ProjectileEventKind::HitTrigger, Some(hit));
            // Triggers with a material are substances: drag only, free passage.
            if let Some(material) = ctx.materials.get(hit.collider) {
                entering = Some(ContainmentEntry {
                    hit,
                    material: Some(Arc::clone(material)),
                });
            }
        } else {
            push_event(ctx.events, proj, ProjectileEventKind::Hit, Some(hit));
            if def.ricochet.layers.contains(hit.layer) {
                let bounce = ricochet::bounce(proj, &hit, &mut sweep, ctx.scene, ctx.rng);
                if bounce == Bounce::Reflected {
                    push_event(ctx.events, proj, ProjectileEventKind::Ricochet, Some(hit));
                }
            } else if def.penetration.layers.contains(hit.layer) {
                let material = ctx.materials.get(hit.collider).cloned();
                let material_drag = drag::medium_drag(material.as_deref(), &settings.atmosphere);
                if material_drag > def.penetration.drag_threshold {
                    proj.penetration_count = proj.penetration_count.saturating_add(1);
                    check_caps = true;
                }
                push_event(ctx.events, proj, ProjectileEventKind::Penetration, Some(hit));
                entering = Some(ContainmentEntry { hit, material });
            } else {
                proj.alive = false;
            }
        }

        if let Some(top) = proj.containment.top() {
            if costs_penetration(proj, top, &settings.atmosphere) {
                penetrated = distance;
            }
        }

        if let Some(material) = entering.as_ref().and_then(|e| e.material.as_deref()) {
            let mass = def.drag.first_contact_mass;
            let impact = drag::first_contact(sweep.speed(), material, mass, floor);
            sweep.set_speed(impact);
        }
    }

    // --- Outer colliders left behind ---
    let outer = proj.containment.len().saturating_sub(1);
    for (i, entry) in proj.containment.entries()[..outer].iter().enumerate() {
        let collider = entry.hit.collider;
        let crossed = ctx.scene.collider_raycast(collider, end, -sweep.normal, frame_len).is_some();
        if crossed || !ctx.scene.collider_contains(collider, end) {
            pops.push(i);
        }
    }

    // --- Commit ---
    proj.lifetime_distance += start.distance(end);
    proj.penetrated_distance += penetrated;
    proj.position = end;
    proj.last_frame_positions.push(end);

    if (penetrated > 0.0 || check_caps)
        && (proj.penetrated_distance + SURFACE_EPSILON > proj.max_penetration_distance
            || proj.penetration_count > proj.max_penetrations)
    {
        proj.alive = false;
    }

    if !def.paths.relative && sweep.paths != DVec3::ZERO {
        sweep.set_velocity(sweep.velocity + sweep.paths);
        sweep.paths = DVec3::ZERO;
    }
    proj.velocity = sweep.velocity;
    proj.velocity_normal = sweep.normal;
    proj.time_alive += dt * percent.min(1.0);

    if proj.alive && !still_alive(proj, remaining) {
        proj.alive = false;
    }

    stages::evaluate(
        proj,
        &mut ActionContext {
            scene: ctx.scene,
            launches: &mut *ctx.launches,
        },
    );

    let exit_collider = exit_hit.map(|h| h.collider);
    for entry in proj.containment.remove_indices(&mut pops) {
        let hit = if Some(entry.hit.collider) == exit_collider { exit_hit } else { None };
        push_event(ctx.events, proj, ProjectileEventKind::PenetrationExit, hit);
    }
    if let Some(entry) = entering {
        proj.containment.push(entry);
    }

    (truncated && percent < 1.0 && proj.alive).then_some(percent)
}
