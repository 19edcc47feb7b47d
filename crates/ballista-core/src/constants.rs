//! Simulation constants and tuning parameters.

/// Fixed tick rate (Hz).
pub const TICK_RATE: u32 = 60;

/// Seconds per tick.
pub const DT: f64 = 1.0 / TICK_RATE as f64;

// --- Sweep ---

/// Offset used to step past a surface after an exit or self-hit.
pub const SURFACE_EPSILON: f64 = 1e-4;

/// Ceiling on resolve steps within one Advance before the projectile is killed.
pub const MAX_RESOLVE_STEPS: u32 = 32;

/// Smallest share of a sample a projectile near expiry is allowed to move.
pub const MIN_LIFE_FRACTION: f64 = 0.01;

// --- Drag ---

/// Sub-iterations of the discretized exponential decay.
pub const DRAG_ITERATIONS: u32 = 10;

/// Drag values are authored in percent.
pub const DRAG_SCALE: f64 = 100.0;

/// Default lower bound drag may take a moving projectile to.
pub const DEFAULT_SPEED_FLOOR: f64 = 0.1;

/// Replacement for non-positive drag masses.
pub const MIN_DRAG_MASS: f64 = 0.001;

// --- Atmosphere ---

pub const AIR_DRAG: f64 = 1.0;

/// Standard gravity (m/s^2), applied along -Y.
pub const STANDARD_GRAVITY: f64 = 9.81;

// --- Ricochet ---

/// How far behind the contact the seek-bounce probe starts.
pub const RICOCHET_PROBE_BACKSTEP: f64 = 0.1;

/// Length of the seek-bounce probe ray.
pub const RICOCHET_PROBE_LENGTH: f64 = 1.0;

/// Nudge off a blocking surface after a seek bounce (degrees).
pub const RICOCHET_SURFACE_NUDGE_DEG: f64 = 5.0;

/// Upper bound of per-bounce speed loss.
pub const MAX_RICOCHET_LOSS: f64 = 0.99;

// --- Definition limits ---

pub const MAX_RECOMMENDED_SAMPLES: u32 = 50;

/// Ticks a trajectory prediction may run before it is abandoned.
pub const MAX_PREDICTION_TICKS: u32 = 36_000;

/// Default half-extent of the physics bounds on every axis.
pub const DEFAULT_PHYSICS_LIMIT: f64 = 5000.0;

// --- Scene ---

/// Tolerance past the ray length within which a contact still counts.
pub const CONTACT_SKIN: f64 = 1e-6;
