//! Hunter Archetypes
//!
//! Per-hunter physical constants, keyed by [`Hunter`] index.
//! All speeds and accelerations are per tick at the simulation tick rate.

use serde::{Serialize, Deserialize};

use crate::core::fixed::{Fixed, to_fixed};
use crate::core::time::{Ticks, secs};
use crate::game::damage::Effectiveness;
use crate::game::weapon::{BeamType, BEAM_COUNT};

/// Playable character archetype.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(u8)]
#[derive(Default)]
pub enum Hunter {
    /// Balanced all-rounder
    #[default]
    Samus = 0,
    /// Fast, electric
    Kanden = 1,
    /// Sniper, cloaks on the move
    Trace = 2,
    /// Shock Coil specialist
    Sylux = 3,
    /// Ice affinity
    Noxus = 4,
    /// Heavy, fire affinity
    Spire = 5,
    /// Melee-leaning, splits in two
    Weavel = 6,
    /// Generic enemy hunter
    Guardian = 7,
}

impl Hunter {
    /// Number of archetypes
    pub const COUNT: usize = 8;

    /// Get hunter from index (0-7).
    pub fn from_index(index: u8) -> Option<Hunter> {
        match index {
            0 => Some(Hunter::Samus),
            1 => Some(Hunter::Kanden),
            2 => Some(Hunter::Trace),
            3 => Some(Hunter::Sylux),
            4 => Some(Hunter::Noxus),
            5 => Some(Hunter::Spire),
            6 => Some(Hunter::Weavel),
            7 => Some(Hunter::Guardian),
            _ => None,
        }
    }

    /// The beam this hunter is empowered with.
    pub fn affinity_beam(self) -> BeamType {
        match self {
            Hunter::Samus => BeamType::Missile,
            Hunter::Kanden => BeamType::VoltDriver,
            Hunter::Trace => BeamType::Imperialist,
            Hunter::Sylux => BeamType::ShockCoil,
            Hunter::Noxus => BeamType::Judicator,
            Hunter::Spire => BeamType::Magmaul,
            Hunter::Weavel => BeamType::Battlehammer,
            Hunter::Guardian => BeamType::PowerBeam,
        }
    }

    /// Physical constants for this hunter.
    #[inline]
    pub fn values(self) -> &'static HunterValues {
        &HUNTER_VALUES[self as usize]
    }
}

// =============================================================================
// HUNTER VALUES
// =============================================================================

/// Immutable per-hunter constants.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HunterValues {
    /// Forward acceleration per tick at full stick
    pub walk_traction: Fixed,
    /// Sideways acceleration per tick at full stick
    pub strafe_traction: Fixed,
    /// Horizontal speed cap while walking
    pub walk_speed_cap: Fixed,
    /// Horizontal speed cap while only strafing
    pub strafe_speed_cap: Fixed,
    /// Traction multiplier while airborne
    pub air_speed_factor: Fixed,
    /// Fraction of horizontal speed lost per tick with no stick input on ground
    pub stand_speed_factor: Fixed,
    /// Downward acceleration per tick
    pub biped_gravity: Fixed,
    /// Vertical speed set by a jump
    pub jump_speed: Fixed,
    /// Traction used while a jump pad holds control
    pub jump_pad_slide_factor: Fixed,
    /// Collision sphere radius in biped form
    pub biped_col_radius: Fixed,
    /// Collision sphere radius in alt-form
    pub alt_col_radius: Fixed,
    /// Alt-form sphere center height above position
    pub alt_col_y: Fixed,
    /// Lowest item offset (item.y - self.y) that can be picked up
    pub min_pickup_height: Fixed,
    /// Highest item offset (item.y - self.y) that can be picked up
    pub max_pickup_height: Fixed,
    /// Invulnerability window armed by a hit
    pub damage_invuln: Ticks,
    /// Invulnerability window armed by spawning
    pub spawn_invuln: Ticks,
    /// Ammo cap for both pools in multiplayer
    pub mp_ammo_cap: u16,
    /// Health granted per energy tank
    pub energy_tank: u16,
    /// Damage multiplier per incoming beam type
    pub effectiveness: [Effectiveness; BEAM_COUNT],
}

const BASE_VALUES: HunterValues = HunterValues {
    walk_traction: to_fixed(0.03),
    strafe_traction: to_fixed(0.025),
    walk_speed_cap: to_fixed(0.2),
    strafe_speed_cap: to_fixed(0.17),
    air_speed_factor: to_fixed(0.4),
    stand_speed_factor: to_fixed(0.2),
    biped_gravity: to_fixed(0.0105),
    jump_speed: to_fixed(0.21),
    jump_pad_slide_factor: to_fixed(0.005),
    biped_col_radius: to_fixed(0.5),
    alt_col_radius: to_fixed(0.65),
    alt_col_y: to_fixed(0.65),
    min_pickup_height: to_fixed(-0.5),
    max_pickup_height: to_fixed(1.8),
    damage_invuln: secs(1.0 / 3.0),
    spawn_invuln: secs(3.0),
    mp_ammo_cap: 400,
    energy_tank: 100,
    effectiveness: [Effectiveness::Normal; BEAM_COUNT],
};

/// Constants table, indexed by `Hunter as usize`.
pub static HUNTER_VALUES: [HunterValues; Hunter::COUNT] = [
    // Samus
    BASE_VALUES,
    // Kanden
    HunterValues {
        walk_traction: to_fixed(0.034),
        walk_speed_cap: to_fixed(0.215),
        ..BASE_VALUES
    },
    // Trace
    HunterValues {
        walk_speed_cap: to_fixed(0.21),
        biped_col_radius: to_fixed(0.45),
        ..BASE_VALUES
    },
    // Sylux
    HunterValues {
        strafe_speed_cap: to_fixed(0.18),
        ..BASE_VALUES
    },
    // Noxus
    HunterValues {
        jump_speed: to_fixed(0.225),
        ..BASE_VALUES
    },
    // Spire
    HunterValues {
        walk_traction: to_fixed(0.027),
        walk_speed_cap: to_fixed(0.185),
        biped_col_radius: to_fixed(0.6),
        ..BASE_VALUES
    },
    // Weavel
    HunterValues {
        walk_speed_cap: to_fixed(0.205),
        ..BASE_VALUES
    },
    // Guardian
    HunterValues {
        mp_ammo_cap: 300,
        ..BASE_VALUES
    },
];
