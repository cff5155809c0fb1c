//! Game Logic Module
//!
//! All combatant simulation code. 100% deterministic.
//!
//! ## Module Structure
//!
//! - `hunter`: Archetypes and per-hunter constants
//! - `weapon`: Beams, ammo pools, selection and the charge machine
//! - `timers`: Status timer bank and alpha convergence
//! - `damage`: Hit resolution, afflictions, knockback
//! - `movement`: Physics integration and the collision service
//! - `pickup`: Items and their effects
//! - `respawn`: Spawn points and the spawn reset
//! - `combatant`: The entity and its capability traits
//! - `state`: Arena, hashing, snapshots
//! - `input`: Per-tick input frames and recordings
//! - `events`: Requests to the render, audio and projectile layers
//! - `tick`: Per-frame orchestrator and replay

pub mod hunter;
pub mod weapon;
pub mod timers;
pub mod damage;
pub mod movement;
pub mod pickup;
pub mod respawn;
pub mod combatant;
pub mod state;
pub mod input;
pub mod events;
pub mod tick;

// Re-export key types
pub use combatant::{Combatant, CombatantId, Damageable, Drawable, DrawState, Phase, BodyForm, Simulated};
pub use damage::{DamageFlags, DamageOutcome, DamageSource, Hit};
pub use events::{EventSink, SimEvent, SimEventData};
pub use hunter::Hunter;
pub use input::{InputFrame, InputRecording};
pub use movement::{CollisionService, FloorPlane};
pub use state::{SimError, SimState};
pub use tick::{tick, replay, TickResult};
pub use weapon::{AmmoType, BeamType};
