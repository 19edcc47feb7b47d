//! Core types and definitions for the ballista projectile simulation.
//!
//! This crate defines the vocabulary shared across the workspace:
//! identifiers, hit records, curves, materials, events, constants and
//! the physics-scene collaborator trait. It carries no simulation logic.

pub mod constants;
pub mod curve;
pub mod enums;
pub mod error;
pub mod events;
pub mod material;
pub mod math;
pub mod scene;
pub mod types;

#[cfg(test)]
mod tests;
