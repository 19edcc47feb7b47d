//! Per-concern pieces of a projectile step.
//!
//! Systems are plain functions over a projectile and its working
//! [`Sweep`](crate::integrator::Sweep). They own no state.

pub mod cleanup;
pub mod drag;
pub mod forces;
pub mod ricochet;
pub mod snapshot;
