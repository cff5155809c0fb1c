//! Core deterministic primitives.
//!
//! All types in this module are designed for bit-exact reproducibility
//! across platforms: fixed-point math, integer timers, stable hashing.

pub mod fixed;
pub mod vec3;
pub mod time;
pub mod hash;

// Re-export core types
pub use fixed::{Fixed, FIXED_ONE, FIXED_HALF, FIXED_SCALE};
pub use vec3::FixedVec3;
pub use time::{Ticks, TICK_RATE, secs};
pub use hash::{compute_state_hash, StateHash};
