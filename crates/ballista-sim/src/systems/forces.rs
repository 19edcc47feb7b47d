//! Velocity contributions of path curves, gravity and seeking.
//!
//! Each contribution records what it changed on the [`Sweep`] so the
//! integrator can undo it when a collision shortens the step.

use glam::DVec3;

use ballista_core::enums::GravityMode;
use ballista_core::math::rotate_towards;
use ballista_core::scene::PhysicsScene;

use crate::integrator::Sweep;
use crate::projectile::ActiveProjectile;

/// Bend the heading toward the path pull without changing speed.
///
/// Only the steering gravity modes use paths this way; in the path-as-gravity
/// modes the curves feed [`apply_gravity`] instead.
pub fn apply_paths(sweep: &mut Sweep, proj: &ActiveProjectile, remaining: f64) {
    let def = &proj.definition;
    if !def.gravity.mode.steers_with_paths() {
        return;
    }
    let local = def.path_at(proj.curve_position(def.paths.by_distance)) * remaining;
    if local == DVec3::ZERO {
        return;
    }
    let before = sweep.velocity;
    let speed = sweep.speed();
    sweep.set_velocity(before + proj.launch_orientation * local);
    sweep.set_speed(speed);
    sweep.paths = before - sweep.velocity;
}

/// Acceleration for `dt` seconds, before terminal-velocity clamping.
pub fn gravity_delta(proj: &ActiveProjectile, dt: f64) -> DVec3 {
    let def = &proj.definition;
    let path = || def.path_at(proj.curve_position(def.paths.by_distance));
    let accel = match def.gravity.mode {
        GravityMode::None => return DVec3::ZERO,
        GravityMode::Planetary => proj.gravity,
        GravityMode::PathAsGravity => path(),
        GravityMode::PathAsGravityMultiplier => {
            let p = path();
            proj.gravity * DVec3::new(p.x, p.y, 1.0)
        }
    };
    accel * def.gravity.mass * dt
}

/// Add gravity, skipping any axis already at terminal velocity in the
/// direction gravity would push it.
pub fn apply_gravity(sweep: &mut Sweep, proj: &ActiveProjectile, dt: f64) {
    let mut delta = gravity_delta(proj, dt);
    if delta == DVec3::ZERO {
        sweep.gravity = DVec3::ZERO;
        return;
    }
    let terminal = proj.definition.gravity.terminal_velocity;
    for axis in 0..3 {
        let v = sweep.velocity[axis];
        let g = delta[axis];
        if g != 0.0 && v.signum() == g.signum() && v.abs() >= terminal {
            delta[axis] = 0.0;
        }
    }
    sweep.set_velocity(sweep.velocity + delta);
    sweep.gravity = delta;
}

/// Turn toward the seek target. A target that cannot be resolved leaves
/// the heading alone.
pub fn apply_seek(sweep: &mut Sweep, proj: &ActiveProjectile, scene: &dyn PhysicsScene, dt: f64) {
    sweep.seek = DVec3::ZERO;
    let Some(target) = proj.seek.resolve(scene) else {
        return;
    };
    let def = &proj.definition;
    if def.seek.overrides_paths && sweep.paths != DVec3::ZERO {
        let speed = sweep.speed();
        sweep.set_velocity(sweep.velocity + sweep.paths);
        sweep.set_speed(speed);
        sweep.paths = DVec3::ZERO;
    }
    let rate = def.seek.turn_rate.evaluate(proj.curve_position(def.seek.by_distance));
    let step = (rate * dt).to_radians();
    if step <= 0.0 {
        return;
    }
    let before = sweep.velocity;
    let speed = sweep.speed();
    sweep.normal = rotate_towards(sweep.normal, target - proj.position, step);
    sweep.set_speed(speed);
    sweep.seek = before - sweep.velocity;
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use ballista_core::curve::Curve;
    use ballista_core::types::ProjectileId;

    use crate::definition::ProjectileDefinition;
    use crate::projectile::SeekTarget;
    use crate::scene::BoxScene;

    fn projectile(def: ProjectileDefinition) -> ActiveProjectile {
        ActiveProjectile::launch(ProjectileId(1), Arc::new(def), DVec3::ZERO, DVec3::Z)
    }

    #[test]
    fn test_paths_bend_heading_keep_speed() {
        let mut def = ProjectileDefinition::default();
        def.paths.y = Curve::constant(5.0);
        let proj = projectile(def);
        let mut sweep = Sweep::new(DVec3::Z, 50.0);
        apply_paths(&mut sweep, &proj, 1.0);
        assert!((sweep.speed() - 50.0).abs() < 1e-9, "speed {:.6}", sweep.speed());
        assert!(sweep.velocity.y > 0.0, "path pulled up");
        // The recorded diff restores the original velocity.
        assert!((sweep.velocity + sweep.paths - DVec3::Z * 50.0).length() < 1e-9);
    }

    #[test]
    fn test_paths_ignored_when_used_as_gravity() {
        let mut def = ProjectileDefinition::default();
        def.gravity.mode = GravityMode::PathAsGravity;
        def.paths.x = Curve::constant(5.0);
        let proj = projectile(def);
        let mut sweep = Sweep::new(DVec3::Z, 50.0);
        apply_paths(&mut sweep, &proj, 1.0);
        assert_eq!(sweep.velocity, DVec3::Z * 50.0);
    }

    #[test]
    fn test_planetary_gravity_accelerates_down() {
        let mut def = ProjectileDefinition::default();
        def.gravity.mode = GravityMode::Planetary;
        def.gravity.mass = 2.0;
        let proj = projectile(def);
        let mut sweep = Sweep::new(DVec3::Z, 50.0);
        apply_gravity(&mut sweep, &proj, 0.5);
        assert!((sweep.velocity.y + 9.81).abs() < 1e-9, "vy {:.4}", sweep.velocity.y);
        assert_eq!(sweep.gravity, DVec3::new(0.0, -9.81, 0.0));
    }

    #[test]
    fn test_terminal_velocity_stops_same_sign_axis() {
        let mut def = ProjectileDefinition::default();
        def.gravity.mode = GravityMode::Planetary;
        def.gravity.terminal_velocity = 20.0;
        let proj = projectile(def);

        let mut falling = Sweep::new(DVec3::NEG_Y, 25.0);
        apply_gravity(&mut falling, &proj, 0.1);
        assert_eq!(falling.velocity.y, -25.0, "no more acceleration past terminal");

        // Rising fast: gravity still decelerates.
        let mut rising = Sweep::new(DVec3::Y, 25.0);
        apply_gravity(&mut rising, &proj, 0.1);
        assert!(rising.velocity.y < 25.0);
    }

    #[test]
    fn test_multiplier_scales_gravity_per_axis() {
        let mut def = ProjectileDefinition::default();
        def.gravity.mode = GravityMode::PathAsGravityMultiplier;
        def.paths.y = Curve::constant(0.5);
        let proj = projectile(def);
        let delta = gravity_delta(&proj, 1.0);
        assert!((delta.y + 4.905).abs() < 1e-9, "dy {:.4}", delta.y);
    }

    #[test]
    fn test_seek_turns_by_rate() {
        let mut def = ProjectileDefinition::default();
        def.seek.turn_rate = Curve::constant(90.0);
        let mut proj = projectile(def);
        proj.seek = SeekTarget::Point(DVec3::new(100.0, 0.0, 0.0));
        let scene = BoxScene::new();
        let mut sweep = Sweep::new(DVec3::Z, 50.0);
        apply_seek(&mut sweep, &proj, &scene, 0.1);
        let turned = DVec3::Z.angle_between(sweep.normal).to_degrees();
        assert!((turned - 9.0).abs() < 1e-9, "turned {turned:.4}");
        assert!((sweep.speed() - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_seek_missing_collider_yields_nothing() {
        let mut def = ProjectileDefinition::default();
        def.seek.turn_rate = Curve::constant(90.0);
        let mut proj = projectile(def);
        proj.seek = SeekTarget::Collider(ballista_core::types::ColliderId(99));
        let scene = BoxScene::new();
        let mut sweep = Sweep::new(DVec3::Z, 50.0);
        apply_seek(&mut sweep, &proj, &scene, 0.1);
        assert_eq!(sweep.normal, DVec3::Z);
        assert_eq!(sweep.seek, DVec3::ZERO);
    }
}
