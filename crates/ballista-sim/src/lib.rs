//! Projectile simulation for ballista.
//!
//! The [`Emitter`] owns live shots in a hecs world and advances them at a
//! fixed tick rate through sub-stepped raycast sweeps against a
//! [`PhysicsScene`](ballista_core::scene::PhysicsScene).

pub mod definition;
pub mod emitter;
pub mod integrator;
pub mod projectile;
pub mod scene;
pub mod stages;
pub mod systems;
pub mod trajectory;

pub use ballista_core as core;
pub use emitter::{Emitter, EmitterConfig};
