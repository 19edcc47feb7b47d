use glam::DVec3;

use crate::enums::*;
use crate::events::{ProjectileEvent, ProjectileEventKind};
use crate::material::{Atmosphere, MaterialRegistry, MaterialToughness};
use crate::types::*;

// ---- Layers ----

#[test]
fn test_layer_mask_membership() {
    let mask = LayerMask::from_layers(&[0, 3, 31, 40]);
    assert!(mask.contains(0));
    assert!(mask.contains(3));
    assert!(mask.contains(31));
    assert!(!mask.contains(1));
    assert!(!mask.contains(40), "layers past 31 are ignored");
    assert!(mask.overlaps(LayerMask::from_layers(&[3])));
    assert!(!mask.overlaps(LayerMask::from_layers(&[4])));
    assert!(LayerMask::NONE.is_empty());
}

// ---- Bounds ----

#[test]
fn test_aabb_ray_entry_distance_and_normal() {
    let wall = Aabb::new(DVec3::new(-5.0, -5.0, 25.0), DVec3::new(5.0, 5.0, 26.0));
    let (t, n) = wall.ray_entry(DVec3::ZERO, DVec3::Z).expect("ray should hit the wall");
    assert!((t - 25.0).abs() < 1e-12, "entry distance {t:.6}");
    assert_eq!(n, DVec3::new(0.0, 0.0, -1.0));

    // From behind the wall, travelling back toward the origin.
    let (t, n) = wall
        .ray_entry(DVec3::new(0.0, 0.0, 30.0), -DVec3::Z)
        .expect("reverse ray should hit the back face");
    assert!((t - 4.0).abs() < 1e-12, "entry distance {t:.6}");
    assert_eq!(n, DVec3::Z);
}

#[test]
fn test_aabb_ray_ignores_inside_origin_and_behind() {
    let b = Aabb::from_center(DVec3::ZERO, DVec3::ONE);
    assert!(b.ray_entry(DVec3::ZERO, DVec3::X).is_none(), "origin inside");
    assert!(b.ray_entry(DVec3::new(5.0, 0.0, 0.0), DVec3::X).is_none(), "box behind");
    assert!(b.ray_entry(DVec3::new(-5.0, 3.0, 0.0), DVec3::X).is_none(), "parallel miss");
}

#[test]
fn test_aabb_contains_inclusive() {
    let b = Aabb::new(DVec3::ZERO, DVec3::ONE);
    assert!(b.contains(DVec3::ONE));
    assert!(b.contains(DVec3::splat(0.5)));
    assert!(!b.contains(DVec3::new(1.0001, 0.5, 0.5)));
    assert_eq!(Aabb::default().max.x, 5000.0);
}

// ---- Materials ----

#[test]
fn test_material_registry_lookup() {
    let mut registry = MaterialRegistry::new();
    registry.insert(
        ColliderId(7),
        MaterialToughness {
            name: "water".into(),
            drag: 40.0,
            ..Default::default()
        },
    );
    assert_eq!(registry.get(ColliderId(7)).map(|m| m.drag), Some(40.0));
    assert!(registry.get(ColliderId(8)).is_none());
    assert_eq!(Atmosphere::default().drag, 1.0);
    assert_eq!(Atmosphere::vacuum().drag, 0.0);
}

#[test]
fn test_material_defaults_from_partial_json() {
    let m: MaterialToughness = serde_json::from_str(r#"{ "drag": 12.0 }"#).unwrap();
    assert_eq!(m.drag, 12.0);
    assert_eq!(m.impact_slowdown.evaluate(300.0), 0.0);
}

// ---- Enums ----

#[test]
fn test_hit_filter_accepts() {
    assert!(HitFilter::CollidersOnly.accepts(false));
    assert!(!HitFilter::CollidersOnly.accepts(true));
    assert!(HitFilter::TriggersOnly.accepts(true));
    assert!(HitFilter::Both.accepts(true) && HitFilter::Both.accepts(false));
}

#[test]
fn test_gravity_mode_path_steering() {
    assert!(GravityMode::None.steers_with_paths());
    assert!(GravityMode::Planetary.steers_with_paths());
    assert!(!GravityMode::PathAsGravity.steers_with_paths());
    assert!(!GravityMode::PathAsGravityMultiplier.steers_with_paths());
}

// ---- Events ----

#[test]
fn test_event_serializes_with_hit() {
    let event = ProjectileEvent {
        kind: ProjectileEventKind::Hit,
        projectile: ProjectileId(3),
        emitter: EmitterId(1),
        position: DVec3::new(0.0, 0.0, 25.0),
        hit: Some(Hit {
            point: DVec3::new(0.0, 0.0, 25.0),
            normal: -DVec3::Z,
            distance: 0.8,
            collider: ColliderId(2),
            layer: 4,
            is_trigger: false,
        }),
        dry_run: false,
    };
    let json = serde_json::to_string(&event).unwrap();
    assert!(json.contains("\"Hit\""), "kind missing: {json}");
    let back: ProjectileEvent = serde_json::from_str(&json).unwrap();
    assert_eq!(back.hit.map(|h| h.collider), Some(ColliderId(2)));
}
