//! Projectile definitions: the immutable, shared tuning data of a
//! projectile type.
//!
//! Definitions load from JSON with every field optional. Call
//! [`ProjectileDefinition::validated`] before launching to fold
//! out-of-range values back into range.

use std::path::Path;
use std::sync::Arc;

use glam::DVec3;
use serde::{Deserialize, Serialize};
use tracing::warn;

use ballista_core::constants::{
    DEFAULT_PHYSICS_LIMIT, MAX_RECOMMENDED_SAMPLES, MAX_RICOCHET_LOSS, MIN_DRAG_MASS,
};
use ballista_core::curve::Curve;
use ballista_core::enums::GravityMode;
use ballista_core::error::{BallistaError, Result};
use ballista_core::types::{Aabb, LayerMask};

use crate::stages::Stage;

/// Speed over time or distance.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeedSettings {
    pub curve: Curve,
    /// Sample `curve` by distance travelled instead of time alive.
    pub by_distance: bool,
    /// Launch direction tilt against gravity.
    pub upwards_offset: f64,
}

impl Default for SpeedSettings {
    fn default() -> Self {
        Self {
            curve: Curve::constant(50.0),
            by_distance: false,
            upwards_offset: 0.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DragSettings {
    /// Divides continuous drag. Heavier projectiles slow down less.
    pub mass: f64,
    /// Divides the impact slowdown of a material on first contact.
    pub first_contact_mass: f64,
}

impl Default for DragSettings {
    fn default() -> Self {
        Self {
            mass: 1.0,
            first_contact_mass: 1.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GravitySettings {
    pub mode: GravityMode,
    pub mass: f64,
    /// Per-axis speed past which gravity stops accelerating that axis.
    pub terminal_velocity: f64,
}

impl Default for GravitySettings {
    fn default() -> Self {
        Self {
            mode: GravityMode::None,
            mass: 1.0,
            terminal_velocity: 50.0,
        }
    }
}

/// Lateral (X) and vertical (Y) pull applied each sample.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathSettings {
    pub x: Curve,
    pub y: Curve,
    /// When false the pull is undone at the end of every step, so paths
    /// displace the shot within a step without bending its heading.
    pub relative: bool,
    pub by_distance: bool,
}

impl Default for PathSettings {
    fn default() -> Self {
        Self {
            x: Curve::constant(0.0),
            y: Curve::constant(0.0),
            relative: true,
            by_distance: false,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SeekSettings {
    /// Turn rate toward the seek target, degrees per second.
    pub turn_rate: Curve,
    pub by_distance: bool,
    pub overrides_paths: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PenetrationSettings {
    pub layers: LayerMask,
    /// Distance that may be travelled inside costed solids.
    pub distance: f64,
    pub max_objects: u32,
    /// Materials with drag at or below this are passed through for free.
    pub drag_threshold: f64,
}

impl PenetrationSettings {
    /// Effective (distance, count) caps. A zero cap next to a non-zero one
    /// means unlimited.
    pub fn caps(&self) -> (f64, u32) {
        match (self.distance > 0.0, self.max_objects > 0) {
            (true, true) => (self.distance, self.max_objects),
            (false, true) => (f64::INFINITY, self.max_objects),
            (true, false) => (self.distance, u32::MAX),
            (false, false) => (0.0, 0),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RicochetSettings {
    pub layers: LayerMask,
    pub count: u32,
    /// Fraction of speed lost per bounce (0..1).
    pub speed_loss: f64,
    /// Scale `speed_loss` by incidence angle / 180 degrees.
    pub loss_by_angle: bool,
    pub min_loss: f64,
    pub max_loss: f64,
    /// Random deviation of non-seeking bounces, degrees.
    pub angle_variability: f64,
    /// Turn toward the seek target on a seek bounce, degrees.
    pub seek_turn: f64,
    /// Bounces between seek bounces.
    pub seek_interval: u32,
    pub first_bounce_seeks: bool,
}

impl Default for RicochetSettings {
    fn default() -> Self {
        Self {
            layers: LayerMask::NONE,
            count: 0,
            speed_loss: 0.0,
            loss_by_angle: false,
            min_loss: 0.0,
            max_loss: MAX_RICOCHET_LOSS,
            angle_variability: 0.0,
            seek_turn: 0.0,
            seek_interval: 0,
            first_bounce_seeks: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LifetimeSettings {
    pub seconds: f64,
    /// Below this speed the projectile dies.
    pub minimum_speed: f64,
    /// Leaving this box kills the projectile.
    pub bounds: Aabb,
}

impl Default for LifetimeSettings {
    fn default() -> Self {
        Self {
            seconds: 5.0,
            minimum_speed: 0.4,
            bounds: Aabb::from_center(DVec3::ZERO, DVec3::splat(DEFAULT_PHYSICS_LIMIT)),
        }
    }
}

/// Tuning data shared by every shot of one projectile type.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectileDefinition {
    pub name: String,
    pub speed: SpeedSettings,
    pub drag: DragSettings,
    pub gravity: GravitySettings,
    pub paths: PathSettings,
    pub seek: SeekSettings,
    pub penetration: PenetrationSettings,
    pub ricochet: RicochetSettings,
    pub lifetime: LifetimeSettings,
    /// Sub-steps per tick.
    pub recommended_samples: u32,
    pub stages: Vec<Arc<Stage>>,
}

impl Default for ProjectileDefinition {
    fn default() -> Self {
        Self {
            name: String::from("projectile"),
            speed: SpeedSettings::default(),
            drag: DragSettings::default(),
            gravity: GravitySettings::default(),
            paths: PathSettings::default(),
            seek: SeekSettings::default(),
            penetration: PenetrationSettings::default(),
            ricochet: RicochetSettings::default(),
            lifetime: LifetimeSettings::default(),
            recommended_samples: 1,
            stages: Vec::new(),
        }
    }
}

impl ProjectileDefinition {
    /// Parse a definition from JSON and validate it.
    pub fn from_json(json: &str) -> Result<Self> {
        let def: ProjectileDefinition = serde_json::from_str(json)?;
        Ok(def.validated())
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    /// Fold out-of-range values back into range, logging each correction.
    pub fn validated(mut self) -> Self {
        if self.drag.mass <= 0.0 {
            warn!(definition = %self.name, mass = self.drag.mass, "drag mass must be positive");
            self.drag.mass = MIN_DRAG_MASS;
        }
        if self.drag.first_contact_mass <= 0.0 {
            warn!(
                definition = %self.name,
                mass = self.drag.first_contact_mass,
                "first contact drag mass must be positive"
            );
            self.drag.first_contact_mass = MIN_DRAG_MASS;
        }

        let samples = self.recommended_samples.clamp(1, MAX_RECOMMENDED_SAMPLES);
        if samples != self.recommended_samples {
            warn!(
                definition = %self.name,
                samples = self.recommended_samples,
                "sample count out of range"
            );
            self.recommended_samples = samples;
        }

        let r = &mut self.ricochet;
        r.min_loss = r.min_loss.clamp(0.0, MAX_RICOCHET_LOSS);
        r.max_loss = r.max_loss.clamp(0.0, MAX_RICOCHET_LOSS);
        if r.min_loss > r.max_loss {
            let mid = (r.min_loss + r.max_loss) / 2.0;
            warn!(
                definition = %self.name,
                min = r.min_loss,
                max = r.max_loss,
                "ricochet min loss above max loss"
            );
            r.min_loss = (mid - 0.1).clamp(0.0, MAX_RICOCHET_LOSS);
            r.max_loss = (mid + 0.1).clamp(0.0, MAX_RICOCHET_LOSS);
        }
        r.angle_variability = r.angle_variability.max(0.0);

        if self.penetration.layers.overlaps(self.ricochet.layers) {
            warn!(
                definition = %self.name,
                "penetrable and ricochet layers overlap; overlapping layers ricochet"
            );
        }

        self.penetration.distance = self.penetration.distance.max(0.0);
        self.lifetime.seconds = self.lifetime.seconds.max(0.0);
        self.lifetime.minimum_speed = self.lifetime.minimum_speed.max(0.0);
        self
    }

    /// Reject definitions that cannot be repaired.
    pub fn check(&self) -> Result<()> {
        if !self.lifetime.bounds.min.is_finite() || !self.lifetime.bounds.max.is_finite() {
            return Err(BallistaError::InvalidDefinition(format!(
                "{}: physics bounds must be finite",
                self.name
            )));
        }
        if self.speed.curve.keys().is_empty() {
            return Err(BallistaError::InvalidDefinition(format!(
                "{}: speed curve has no keys",
                self.name
            )));
        }
        Ok(())
    }

    /// Path pull at curve position `t`, in the projectile's local frame.
    pub fn path_at(&self, t: f64) -> DVec3 {
        DVec3::new(self.paths.x.evaluate(t), self.paths.y.evaluate(t), 0.0)
    }
}
