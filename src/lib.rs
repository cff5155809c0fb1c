//! # Hunter Sim
//!
//! Deterministic per-frame simulation core for Hunter combatants: health and
//! ammo bookkeeping, weapon selection and charge fire, damage with status
//! afflictions, movement against world collision, respawn and pickups.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        HUNTER SIM                            │
//! ├─────────────────────────────────────────────────────────────┤
//! │  core/           - Deterministic primitives                  │
//! │  ├── fixed.rs    - Q16.16 fixed-point arithmetic             │
//! │  ├── vec3.rs     - 3D vector with fixed-point                │
//! │  ├── time.rs     - Tick rate and durations                   │
//! │  └── hash.rs     - State hashing for verification            │
//! │                                                              │
//! │  game/           - Combatant simulation (deterministic)      │
//! │  ├── weapon.rs   - Weapons, ammo, charge                     │
//! │  ├── timers.rs   - Status timer bank                         │
//! │  ├── damage.rs   - Damage resolution                         │
//! │  ├── movement.rs - Movement integrator                       │
//! │  ├── pickup.rs   - Items                                     │
//! │  ├── respawn.rs  - Spawn points and respawn                  │
//! │  ├── state.rs    - Combatant arena                           │
//! │  └── tick.rs     - Per-frame orchestrator                    │
//! │                                                              │
//! │  config.rs       - Session configuration (JSON)              │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Determinism Guarantee
//!
//! The `core/` and `game/` modules are **100% deterministic**:
//! - No floating-point arithmetic in game logic
//! - No HashMap (uses BTreeMap and handle order)
//! - No system time dependencies
//! - No randomness; spawn choice is driven by the tick counter
//!
//! Given identical inputs, the simulation produces **identical results**
//! on any platform.

#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod config;
pub mod core;
pub mod game;

// Re-export commonly used types
pub use crate::core::fixed::{Fixed, FIXED_ONE, FIXED_HALF, FIXED_SCALE};
pub use crate::core::vec3::FixedVec3;
pub use crate::core::time::{Ticks, TICK_RATE};
pub use config::{SimConfig, GameMode};
pub use game::input::{InputFrame, InputRecording};
pub use game::state::{SimState, SimError};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
