//! Box-collider scene: a self-contained [`PhysicsScene`] for tools, tests
//! and headless runs.

use glam::DVec3;
use serde::{Deserialize, Serialize};

use ballista_core::constants::CONTACT_SKIN;
use ballista_core::error::Result;
use ballista_core::material::{MaterialRegistry, MaterialToughness};
use ballista_core::scene::PhysicsScene;
use ballista_core::types::{Aabb, ColliderId, Hit, LayerMask};

/// An axis-aligned box collider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoxCollider {
    pub bounds: Aabb,
    #[serde(default)]
    pub layer: u8,
    #[serde(default)]
    pub is_trigger: bool,
    #[serde(default)]
    pub name: String,
    /// Material attached when the scene is loaded from a file.
    #[serde(default)]
    pub material: Option<MaterialToughness>,
}

impl BoxCollider {
    pub fn new(bounds: Aabb) -> Self {
        Self {
            bounds,
            layer: 0,
            is_trigger: false,
            name: String::new(),
            material: None,
        }
    }

    pub fn on_layer(mut self, layer: u8) -> Self {
        self.layer = layer;
        self
    }

    pub fn trigger(mut self) -> Self {
        self.is_trigger = true;
        self
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_material(mut self, material: MaterialToughness) -> Self {
        self.material = Some(material);
        self
    }

    fn hit(&self, id: ColliderId, origin: DVec3, dir: DVec3, max_distance: f64) -> Option<Hit> {
        let (t, normal) = self.bounds.ray_entry(origin, dir)?;
        if t > max_distance + CONTACT_SKIN {
            return None;
        }
        Some(Hit {
            point: origin + dir * t,
            normal,
            distance: t,
            collider: id,
            layer: self.layer,
            is_trigger: self.is_trigger,
        })
    }
}

/// Static scene of box colliders. Collider ids are insertion indices.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BoxScene {
    colliders: Vec<BoxCollider>,
}

impl BoxScene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn add(&mut self, collider: BoxCollider) -> ColliderId {
        let id = ColliderId(self.colliders.len() as u32);
        self.colliders.push(collider);
        id
    }

    pub fn get(&self, id: ColliderId) -> Option<&BoxCollider> {
        self.colliders.get(id.0 as usize)
    }

    /// Move a collider, e.g. to model kinematic geometry.
    pub fn set_bounds(&mut self, id: ColliderId, bounds: Aabb) {
        if let Some(c) = self.colliders.get_mut(id.0 as usize) {
            c.bounds = bounds;
        }
    }

    pub fn len(&self) -> usize {
        self.colliders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colliders.is_empty()
    }

    /// Registry of the materials declared on the colliders.
    pub fn materials(&self) -> MaterialRegistry {
        let mut registry = MaterialRegistry::new();
        for (i, collider) in self.colliders.iter().enumerate() {
            if let Some(material) = &collider.material {
                registry.insert(ColliderId(i as u32), material.clone());
            }
        }
        registry
    }

    fn iter(&self) -> impl Iterator<Item = (ColliderId, &BoxCollider)> {
        self.colliders
            .iter()
            .enumerate()
            .map(|(i, c)| (ColliderId(i as u32), c))
    }
}

impl PhysicsScene for BoxScene {
    fn raycast(
        &self,
        origin: DVec3,
        dir: DVec3,
        max_distance: f64,
        layers: LayerMask,
    ) -> Option<Hit> {
        self.iter()
            .filter(|(_, c)| layers.contains(c.layer))
            .filter_map(|(id, c)| c.hit(id, origin, dir, max_distance))
            .min_by(|a, b| a.distance.total_cmp(&b.distance))
    }

    fn collider_raycast(
        &self,
        collider: ColliderId,
        origin: DVec3,
        dir: DVec3,
        max_distance: f64,
    ) -> Option<Hit> {
        self.get(collider)?.hit(collider, origin, dir, max_distance)
    }

    fn collider_contains(&self, collider: ColliderId, point: DVec3) -> bool {
        self.get(collider).is_some_and(|c| c.bounds.contains(point))
    }

    fn collider_center(&self, collider: ColliderId) -> Option<DVec3> {
        self.get(collider).map(|c| c.bounds.center())
    }
}
