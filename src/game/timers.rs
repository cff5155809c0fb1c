//! Status Timer Bank
//!
//! Independent countdowns for transient conditions. Each timer moves by
//! exactly one per tick while above zero and reports its expiry exactly
//! once, on the tick it reaches zero.

use serde::{Serialize, Deserialize};

use crate::core::fixed::{Fixed, FIXED_ONE, to_fixed, fixed_approach};
use crate::core::time::{Ticks, secs, count_down, count_up};

/// Freeze applied when the victim has been thawed long enough
pub const FREEZE_LONG: Ticks = secs(2.5);
/// Freeze applied in single-player when no attacker is known
pub const FREEZE_SHORT: Ticks = secs(1.0);
/// Freeze floor on a re-freeze
pub const FREEZE_FLOOR: Ticks = secs(0.5);
/// Time since thaw after which a fresh long freeze applies
pub const FREEZE_REARM_THRESHOLD: Ticks = secs(2.0);
/// Freeze visual outlasts the freeze by this much
pub const FREEZE_GFX_TAIL: Ticks = 10;

/// Disruption length
pub const DISRUPT_DURATION: Ticks = secs(2.0);
/// Burn length
pub const BURN_DURATION: Ticks = secs(5.0);
/// Burn self-damage interval
pub const BURN_INTERVAL: Ticks = 16;

/// Double damage, cloak and death-alt buff length
pub const BUFF_DURATION: Ticks = secs(30.0);

/// Death animation before a respawn may be attempted
pub const RESPAWN_COUNTDOWN: Ticks = secs(3.0);

/// Alpha while cloaked
pub const CLOAK_ALPHA: Fixed = to_fixed(0.05);
/// Alpha change per tick while fading in
pub const ALPHA_RISE: Fixed = to_fixed(0.1);
/// Alpha change per tick while fading out
pub const ALPHA_FALL: Fixed = to_fixed(0.04);

/// Timers that reached zero during a step.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Expired {
    pub spawn_invuln: bool,
    pub damage_invuln: bool,
    pub disrupted: bool,
    pub death_alt: bool,
    pub cloak: bool,
}

/// Result of one burn step.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BurnStep {
    /// A self-damage tick is due
    pub damage_due: bool,
    /// Burn ended this tick
    pub expired: bool,
}

/// All per-combatant countdowns.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusTimers {
    pub frozen: Ticks,
    pub frozen_gfx: Ticks,
    /// Ticks since the last thaw (saturating)
    pub time_since_frozen: Ticks,
    pub burn: Ticks,
    pub disrupted: Ticks,
    pub cloak: Ticks,
    pub double_damage: Ticks,
    pub death_alt: Ticks,
    pub spawn_invuln: Ticks,
    pub damage_invuln: Ticks,
    pub respawn: Ticks,
}

impl StatusTimers {
    /// Whether the combatant is frozen this tick.
    #[inline]
    pub fn is_frozen(&self) -> bool {
        self.frozen > 0
    }

    /// Arm or extend the freeze.
    ///
    /// A victim thawed for longer than the re-arm threshold gets the long
    /// freeze (or the short one in single-player when nobody is to blame).
    /// Anyone else is raised to at least the floor; a longer timer is kept.
    pub fn arm_freeze(&mut self, short: bool) {
        if self.frozen == 0 && self.time_since_frozen > FREEZE_REARM_THRESHOLD {
            self.frozen = if short { FREEZE_SHORT } else { FREEZE_LONG };
        } else {
            self.frozen = self.frozen.max(FREEZE_FLOOR);
        }
        self.frozen_gfx = self.frozen + FREEZE_GFX_TAIL;
    }

    /// Arm the disruption. Re-arming replaces.
    #[inline]
    pub fn arm_disrupt(&mut self) {
        self.disrupted = DISRUPT_DURATION;
    }

    /// Arm the burn. Re-arming replaces.
    #[inline]
    pub fn arm_burn(&mut self) {
        self.burn = BURN_DURATION;
    }

    /// Clear every affliction and buff timer on death.
    pub fn clear_on_death(&mut self) {
        self.frozen = 0;
        self.frozen_gfx = 0;
        self.burn = 0;
        self.disrupted = 0;
        self.cloak = 0;
        self.double_damage = 0;
        self.death_alt = 0;
        self.damage_invuln = 0;
        self.spawn_invuln = 0;
        self.respawn = RESPAWN_COUNTDOWN;
    }

    /// Reset for a fresh spawn.
    pub fn reset_for_spawn(&mut self, spawn_invuln: Ticks) {
        *self = Self {
            time_since_frozen: Ticks::MAX,
            spawn_invuln,
            ..Self::default()
        };
    }

    /// Invulnerability, disruption, death-alt and cloak countdowns.
    pub fn step_status(&mut self) -> Expired {
        Expired {
            spawn_invuln: count_down(&mut self.spawn_invuln),
            damage_invuln: count_down(&mut self.damage_invuln),
            disrupted: count_down(&mut self.disrupted),
            death_alt: count_down(&mut self.death_alt),
            cloak: count_down(&mut self.cloak),
        }
    }

    /// Freeze countdown. Returns true on the tick the victim thaws.
    pub fn step_freeze(&mut self) -> bool {
        count_down(&mut self.frozen_gfx);
        if self.frozen == 0 {
            count_up(&mut self.time_since_frozen);
            return false;
        }
        let thawed = count_down(&mut self.frozen);
        if thawed {
            self.time_since_frozen = 0;
        }
        thawed
    }

    /// Double-damage countdown. Returns true on expiry.
    #[inline]
    pub fn step_double_damage(&mut self) -> bool {
        count_down(&mut self.double_damage)
    }

    /// Burn countdown with periodic self-damage.
    pub fn step_burn(&mut self) -> BurnStep {
        if self.burn == 0 {
            return BurnStep::default();
        }
        let expired = count_down(&mut self.burn);
        // The expiry tick lands on a multiple of the interval too
        BurnStep {
            damage_due: self.burn % BURN_INTERVAL == 0,
            expired,
        }
    }

    /// Respawn countdown. Returns true once it has run out.
    pub fn step_respawn(&mut self) -> bool {
        count_down(&mut self.respawn);
        self.respawn == 0
    }
}

// =============================================================================
// ALPHA
// =============================================================================

/// Render alpha converging on a target.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fade {
    pub alpha: Fixed,
    pub target: Fixed,
}

impl Default for Fade {
    fn default() -> Self {
        Self {
            alpha: FIXED_ONE,
            target: FIXED_ONE,
        }
    }
}

impl Fade {
    /// Move alpha one tick towards the target (faster rising than falling).
    pub fn step(&mut self) {
        let rate = if self.target > self.alpha { ALPHA_RISE } else { ALPHA_FALL };
        self.alpha = fixed_approach(self.alpha, self.target, rate);
    }
}
