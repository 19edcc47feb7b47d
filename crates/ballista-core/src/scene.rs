//! Ray-intersection collaborator the integrator queries.

use glam::DVec3;

use crate::types::{ColliderId, Hit, LayerMask};

/// Static or kinematic scene geometry.
///
/// Ray queries take a normalized direction and only report surfaces hit
/// from outside: colliders containing the ray origin are ignored. Hit
/// normals face the ray origin.
pub trait PhysicsScene {
    /// Closest hit along the ray against colliders whose layer is in `layers`.
    fn raycast(
        &self,
        origin: DVec3,
        dir: DVec3,
        max_distance: f64,
        layers: LayerMask,
    ) -> Option<Hit>;

    /// Ray test against a single collider, regardless of its layer.
    fn collider_raycast(
        &self,
        collider: ColliderId,
        origin: DVec3,
        dir: DVec3,
        max_distance: f64,
    ) -> Option<Hit>;

    /// Whether `point` lies inside the collider's bounds.
    fn collider_contains(&self, collider: ColliderId, point: DVec3) -> bool;

    /// Reference point used when the collider is a seek target.
    fn collider_center(&self, collider: ColliderId) -> Option<DVec3>;
}
