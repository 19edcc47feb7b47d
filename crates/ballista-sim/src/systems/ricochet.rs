//! Ricochet resolution.

use std::sync::Arc;

use rand::Rng;
use rand_chacha::ChaCha8Rng;

use ballista_core::constants::{
    RICOCHET_PROBE_BACKSTEP, RICOCHET_PROBE_LENGTH, RICOCHET_SURFACE_NUDGE_DEG,
};
use ballista_core::curve::lerp;
use ballista_core::math::{euler_degrees, project_on_plane, reflect, rotate_towards};
use ballista_core::scene::PhysicsScene;
use ballista_core::types::Hit;

use crate::integrator::Sweep;
use crate::projectile::ActiveProjectile;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bounce {
    /// Reflected off the surface.
    Reflected,
    /// No ricochets left; the projectile is dead.
    Exhausted,
}

/// Fraction of speed lost bouncing off `hit` while travelling along `normal`.
pub fn speed_loss(proj: &ActiveProjectile, normal: glam::DVec3, hit: &Hit) -> f64 {
    let r = &proj.definition.ricochet;
    let mut loss = r.speed_loss;
    if r.loss_by_angle {
        loss *= normal.angle_between(hit.normal).to_degrees() / 180.0;
    }
    loss.clamp(r.min_loss, r.max_loss)
}

/// Bounce the working velocity off `hit`.
///
/// Every `seek_interval + 1`th bounce of a seeking projectile turns toward
/// the target, unless that turn would drive it back into the surface. The
/// other bounces scatter randomly by up to the configured variability.
pub fn bounce(
    proj: &mut ActiveProjectile,
    hit: &Hit,
    sweep: &mut Sweep,
    scene: &dyn PhysicsScene,
    rng: &mut ChaCha8Rng,
) -> Bounce {
    if proj.ricochets_remaining == 0 {
        proj.alive = false;
        return Bounce::Exhausted;
    }
    proj.ricochets_remaining -= 1;

    let def = Arc::clone(&proj.definition);
    let r = &def.ricochet;
    let loss = speed_loss(proj, sweep.normal, hit);
    let speed = sweep.speed() * (1.0 - loss);
    sweep.normal = reflect(sweep.normal, hit.normal).normalize_or_zero();

    let seek_bounce = proj.ricochets_until_seek == 0;
    proj.ricochets_until_seek = if seek_bounce {
        r.seek_interval
    } else {
        proj.ricochets_until_seek - 1
    };

    let target = if seek_bounce { proj.seek.resolve(scene) } else { None };
    match target {
        Some(target) => {
            let mirrored = sweep.normal;
            // The step commits at the contact, so aim from there rather than
            // from `proj.position`, which still holds the step start.
            sweep.normal = rotate_towards(mirrored, target - hit.point, r.seek_turn.to_radians());
            // Probe from just behind the contact: a hit means the turn points
            // back into the surface we bounced off.
            let origin = hit.point - sweep.normal * RICOCHET_PROBE_BACKSTEP;
            let probe =
                scene.collider_raycast(hit.collider, origin, sweep.normal, RICOCHET_PROBE_LENGTH);
            if let Some(probe) = probe {
                if proj.seek.collider() == Some(probe.collider) {
                    sweep.normal = mirrored;
                } else {
                    let along = project_on_plane(sweep.normal, probe.normal).normalize_or_zero();
                    let nudge = RICOCHET_SURFACE_NUDGE_DEG.to_radians();
                    sweep.normal = rotate_towards(along, probe.normal, nudge);
                }
            }
        }
        None if r.angle_variability > 0.0 => {
            let first = rng.gen::<f64>();
            let pitch = lerp(0.0, r.angle_variability, first) * random_sign(rng);
            let second = rng.gen::<f64>() * (1.0 - first);
            let yaw = lerp(0.0, r.angle_variability, second) * random_sign(rng);
            sweep.normal = (euler_degrees(pitch, yaw, 0.0) * sweep.normal).normalize_or_zero();
        }
        None => {}
    }

    sweep.set_speed(speed);
    Bounce::Reflected
}

fn random_sign(rng: &mut ChaCha8Rng) -> f64 {
    if rng.gen_bool(0.5) {
        1.0
    } else {
        -1.0
    }
}
