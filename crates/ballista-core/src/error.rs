use thiserror::Error;

use crate::types::ProjectileId;

#[derive(Debug, Error)]
pub enum BallistaError {
    #[error("invalid definition: {0}")]
    InvalidDefinition(String),

    #[error("emitter has no projectile definition and none was supplied")]
    NoDefinition,

    #[error("no live projectile {0}")]
    UnknownProjectile(ProjectileId),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, BallistaError>;
