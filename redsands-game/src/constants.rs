//! Centralized balance and tuning constants for Redsands engine logic.
//!
//! These values define the deterministic math for the rover simulation.
//! Keeping them together ensures that mission balance can only be adjusted
//! via code changes reviewed in version control, rather than through
//! external assets.

// Rover resources ----------------------------------------------------------
pub const START_FUEL: f64 = 100.0;
pub const START_HEALTH: f64 = 100.0;
pub const MOVE_FUEL_COST: f64 = 1.0;
pub const COLLISION_HEALTH_PENALTY: f64 = 10.0;

// Execution limits ---------------------------------------------------------
/// Interpreter operations allowed per routine invocation before the tick
/// faults. Guards against scripts that never terminate.
pub const MAX_STEPS_PER_TICK: u32 = 10_000;
/// Default tick ceiling for a headless mission run.
pub const DEFAULT_MAX_TICKS: u32 = 500;

// Replay cadence -----------------------------------------------------------
pub const REPLAY_FRAME_INTERVAL_MS: u64 = 600;
pub const DAMAGE_FLASH_MS: u64 = 300;
