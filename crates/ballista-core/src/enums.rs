//! Enumeration types used throughout the simulation.

use serde::{Deserialize, Serialize};

/// How gravity contributes to a projectile's velocity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum GravityMode {
    /// No gravity. Path curves steer the projectile.
    #[default]
    None,
    /// Local gravity vector scaled by gravity mass.
    Planetary,
    /// The path curves are the acceleration (world space).
    PathAsGravity,
    /// Gravity scaled per axis by the path curves.
    PathAsGravityMultiplier,
}

impl GravityMode {
    /// Path curves steer the heading only in these modes.
    pub fn steers_with_paths(self) -> bool {
        matches!(self, GravityMode::None | GravityMode::Planetary)
    }
}

/// Boolean combination applied to a block's conditions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum BlockKind {
    #[default]
    And,
    Or,
}

/// Which kinds of contact a hit condition reacts to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum HitFilter {
    #[default]
    CollidersOnly,
    TriggersOnly,
    Both,
}

impl HitFilter {
    pub fn accepts(self, is_trigger: bool) -> bool {
        match self {
            HitFilter::CollidersOnly => !is_trigger,
            HitFilter::TriggersOnly => is_trigger,
            HitFilter::Both => true,
        }
    }
}

/// How a preset switch treats the instance's stage list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum StageMerge {
    /// Keep the current stages.
    #[default]
    Keep,
    /// Append the new preset's stages.
    Add,
    /// Replace the stage list with the new preset's.
    Replace,
}

/// How a penetration cap from a new preset is applied.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum CapUpdate {
    #[default]
    Set,
    Add,
}

/// What an emit action does while its parent is a dry run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DryRunBehavior {
    /// Emit nothing.
    #[default]
    Skip,
    /// Emit dry-run children.
    EmitDryRun,
}
