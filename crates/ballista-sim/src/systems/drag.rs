//! Drag model: continuous decay inside a medium and the one-shot slowdown
//! on first contact with a material.

use ballista_core::constants::{DRAG_ITERATIONS, DRAG_SCALE};
use ballista_core::material::{Atmosphere, MaterialToughness};

/// Drag of the medium the projectile is in, in percent.
pub fn medium_drag(material: Option<&MaterialToughness>, atmosphere: &Atmosphere) -> f64 {
    material.map_or(atmosphere.drag, |m| m.drag)
}

/// Speed after `dt` seconds in a medium of `drag` percent.
///
/// Integrated as [`DRAG_ITERATIONS`] explicit sub-steps so large `dt * drag`
/// products stay bounded. The result never exceeds `speed`, never goes
/// negative, and never falls below `min(speed, floor)`.
pub fn decay(speed: f64, drag: f64, mass: f64, dt: f64, floor: f64) -> f64 {
    if speed <= 0.0 || dt <= 0.0 || drag <= 0.0 {
        return speed.max(0.0);
    }
    let k = (drag / DRAG_SCALE) / mass;
    let factor = (1.0 - k * dt / DRAG_ITERATIONS as f64).max(0.0);
    let mut v = speed;
    for _ in 0..DRAG_ITERATIONS {
        v *= factor;
    }
    v.max(floor.min(speed))
}

/// Speed after striking `material` at `speed`.
pub fn first_contact(speed: f64, material: &MaterialToughness, mass: f64, floor: f64) -> f64 {
    if speed <= 0.0 {
        return 0.0;
    }
    let loss = ((material.impact_slowdown.evaluate(speed) / DRAG_SCALE) / mass).clamp(0.0, 1.0);
    (speed - speed * loss).max(floor.min(speed))
}
