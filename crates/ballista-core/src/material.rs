//! Substance data consumed by the drag model.
//!
//! Materials are attached to colliders through a [`MaterialRegistry`]
//! owned by whoever owns the scene. A collider without an entry behaves as
//! ambient [`Atmosphere`] for drag purposes.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::constants::AIR_DRAG;
use crate::curve::Curve;
use crate::types::ColliderId;

/// Drag and impact response of a solid or substance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MaterialToughness {
    /// Free-form label for tooling.
    pub name: String,
    /// Continuous drag while contained, in percent.
    pub drag: f64,
    /// Percent of speed lost on first contact, keyed by impact speed.
    pub impact_slowdown: Curve,
}

impl Default for MaterialToughness {
    fn default() -> Self {
        Self {
            name: String::new(),
            drag: AIR_DRAG,
            impact_slowdown: Curve::constant(0.0),
        }
    }
}

/// Ambient medium used when a projectile is not contained by anything.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Atmosphere {
    /// Drag in percent.
    pub drag: f64,
}

impl Default for Atmosphere {
    fn default() -> Self {
        Self {
            drag: AIR_DRAG,
        }
    }
}

impl Atmosphere {
    /// Atmosphere without drag.
    pub fn vacuum() -> Self {
        Self {
            drag: 0.0,
            ..Default::default()
        }
    }
}

/// Collider to material lookup.
#[derive(Debug, Clone, Default)]
pub struct MaterialRegistry {
    materials: HashMap<ColliderId, Arc<MaterialToughness>>,
}

impl MaterialRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach `material` to `collider`, replacing any previous entry.
    pub fn insert(&mut self, collider: ColliderId, material: MaterialToughness) {
        self.materials.insert(collider, Arc::new(material));
    }

    /// Share one material between several colliders.
    pub fn insert_shared(&mut self, collider: ColliderId, material: Arc<MaterialToughness>) {
        self.materials.insert(collider, material);
    }

    pub fn get(&self, collider: ColliderId) -> Option<&Arc<MaterialToughness>> {
        self.materials.get(&collider)
    }

    pub fn remove(&mut self, collider: ColliderId) -> Option<Arc<MaterialToughness>> {
        self.materials.remove(&collider)
    }

    pub fn len(&self) -> usize {
        self.materials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.materials.is_empty()
    }
}
