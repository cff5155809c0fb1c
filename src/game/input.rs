//! Per-Tick Input
//!
//! Stick and button state for one combatant on one tick, already
//! decoded from whatever device or AI produced it.
//! Uses lookup table (MOVE_LUT) for exact i8 to Fixed conversion.

use serde::{Serialize, Deserialize};

use crate::core::fixed::Fixed;
use crate::core::vec3::FixedVec3;
use crate::game::combatant::CombatantId;
use crate::game::movement::MoveIntent;
use crate::game::weapon::BeamType;

// =============================================================================
// MOVE LOOKUP TABLE
// =============================================================================

/// Lookup table for converting i8 stick input to Fixed.
///
/// Maps [-127..+127] onto [-1.0..+1.0] with floor division
/// `(value * 65536) / 127`, so both ends land exactly on ±1.0.
///
/// Index 128 (-128 as i8) maps to 0: the "no input" value.
pub static MOVE_LUT: [Fixed; 256] = {
    let mut lut = [0i32; 256];
    let mut i = 0i32;
    while i < 256 {
        // Treat as signed: 0..127 = positive, 128..255 = negative (-128..-1)
        let signed = if i < 128 { i } else { i - 256 };

        if signed == -128 {
            lut[i as usize] = 0;
        } else {
            lut[i as usize] = (signed * 65536) / 127;
        }
        i += 1;
    }
    lut
};

/// Convert i8 stick input to Fixed using lookup table.
#[inline]
pub fn move_to_fixed(input: i8) -> Fixed {
    MOVE_LUT[(input as u8) as usize]
}

// =============================================================================
// INPUT FRAME
// =============================================================================

/// Input for a single combatant on a single tick.
///
/// NO tick field - tick is stored separately for compression.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InputFrame {
    /// Strafe: -127 (left) to +127 (right), -128 = released
    pub move_x: i8,
    /// Walk: -127 (back) to +127 (forward), -128 = released
    pub move_z: i8,
    /// Aim direction X in world space, -128 = keep facing
    pub aim_x: i8,
    /// Aim direction Z in world space, -128 = keep facing
    pub aim_z: i8,
    /// Held buttons
    pub buttons: u8,
    /// Beam index to equip this tick, 0xFF = none
    pub weapon_select: u8,
}

impl Default for InputFrame {
    fn default() -> Self {
        Self::new()
    }
}

impl InputFrame {
    /// Special value indicating a released stick
    pub const NO_INPUT: i8 = -128;

    /// No weapon request
    pub const NO_SELECT: u8 = 0xFF;

    pub const BUTTON_JUMP: u8 = 0x01;
    pub const BUTTON_FIRE: u8 = 0x02;
    pub const BUTTON_MORPH: u8 = 0x04;

    /// Idle frame.
    pub const fn new() -> Self {
        Self {
            move_x: Self::NO_INPUT,
            move_z: Self::NO_INPUT,
            aim_x: Self::NO_INPUT,
            aim_z: Self::NO_INPUT,
            buttons: 0,
            weapon_select: Self::NO_SELECT,
        }
    }

    /// Builder: stick input.
    pub const fn with_movement(mut self, strafe: i8, forward: i8) -> Self {
        self.move_x = strafe;
        self.move_z = forward;
        self
    }

    /// Builder: aim direction.
    pub const fn with_aim(mut self, x: i8, z: i8) -> Self {
        self.aim_x = x;
        self.aim_z = z;
        self
    }

    /// Builder: add held buttons.
    pub const fn with_buttons(mut self, buttons: u8) -> Self {
        self.buttons |= buttons;
        self
    }

    /// Builder: request a weapon.
    pub const fn with_weapon(mut self, beam: BeamType) -> Self {
        self.weapon_select = beam as u8;
        self
    }

    /// Stick input as a movement intent.
    pub fn move_intent(&self) -> MoveIntent {
        MoveIntent {
            forward: move_to_fixed(self.move_z),
            strafe: move_to_fixed(self.move_x),
            jump: self.held(Self::BUTTON_JUMP),
        }
    }

    /// Aim vector on the XZ plane, if given.
    pub fn aim(&self) -> Option<FixedVec3> {
        if self.aim_x == Self::NO_INPUT && self.aim_z == Self::NO_INPUT {
            return None;
        }
        Some(FixedVec3::new(move_to_fixed(self.aim_x), 0, move_to_fixed(self.aim_z)))
    }

    /// Whether a button is held this tick.
    #[inline]
    pub fn held(&self, button: u8) -> bool {
        self.buttons & button != 0
    }

    /// Whether a button went down this tick.
    #[inline]
    pub fn pressed(&self, button: u8, previous: u8) -> bool {
        self.held(button) && previous & button == 0
    }

    /// Requested beam. Out-of-range indices are reported as Err with the raw value.
    pub fn weapon_request(&self) -> Option<Result<BeamType, u8>> {
        if self.weapon_select == Self::NO_SELECT {
            return None;
        }
        Some(match BeamType::from_index(self.weapon_select) {
            Some(beam) => Ok(beam),
            None => Err(self.weapon_select),
        })
    }
}

// =============================================================================
// INPUT RECORDING
// =============================================================================

/// Input change at a tick.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct InputDelta {
    /// Tick when this input state began
    pub tick: u32,
    /// The new input state
    pub frame: InputFrame,
}

/// Delta-compressed input recording for one combatant.
///
/// Only ticks where input CHANGED are stored.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct InputRecording {
    pub combatant: CombatantId,
    /// Last recorded tick
    pub end_tick: u32,
    deltas: Vec<InputDelta>,
    #[serde(skip, default = "InputFrame::new")]
    last_frame: InputFrame,
}

impl InputRecording {
    /// Empty recording.
    pub fn new(combatant: CombatantId) -> Self {
        Self {
            combatant,
            end_tick: 0,
            deltas: Vec::new(),
            last_frame: InputFrame::new(),
        }
    }

    /// Record input for a tick. Only stores if input changed.
    pub fn record(&mut self, tick: u32, frame: InputFrame) {
        self.end_tick = tick;
        if frame != self.last_frame {
            self.deltas.push(InputDelta { tick, frame });
            self.last_frame = frame;
        }
    }

    /// Input in effect at `tick`.
    pub fn input_at(&self, tick: u32) -> InputFrame {
        let idx = self.deltas.partition_point(|d| d.tick <= tick);
        if idx == 0 {
            InputFrame::new()
        } else {
            self.deltas[idx - 1].frame
        }
    }

    /// Number of stored changes.
    pub fn delta_count(&self) -> usize {
        self.deltas.len()
    }
}

// =============================================================================
// TESTS
// =============================================================================
