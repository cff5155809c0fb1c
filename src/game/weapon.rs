//! Weapon & Ammo Controller
//!
//! Unlocked beams, the two ammo pools, the current/previous/selected
//! weapon record, slot bindings, and the hold-to-charge state machine.
//!
//! ## Ammo access
//!
//! The active weapon never holds a reference into the pools. Every read
//! or write goes through [`ammo_type_of`], a pure mapping from beam to
//! pool index, so switching weapons carries no hidden state.
//!
//! ## Charge
//!
//! ```text
//!  held ──► level += 1 (capped at full) ──► release ─┬─ level >= min ──► charged shot
//!   │           ▲                                    └─ level <  min ──► cancelled
//!   └── ammo < cost(level) ──────────────────────────► release
//! ```

use serde::{Serialize, Deserialize};

use crate::core::fixed::{Fixed, FIXED_ONE, fixed_div};
use crate::core::time::{Ticks, secs, count_down, count_up};
use crate::game::damage::Affliction;
use crate::game::hunter::Hunter;

/// Number of selectable beams (None excluded)
pub const BEAM_COUNT: usize = 9;

/// Number of ammo pools
pub const AMMO_POOL_COUNT: usize = 2;

/// Weapon slot bound to the affinity/pickup weapon
pub const AFFINITY_SLOT: usize = 2;

/// Charge level at or below which a fresh press fires an uncharged shot
const TAP_FIRE_MAX_CHARGE: Ticks = 2;

/// Gun switch animation lengths
const SWITCH_ANIM_TICKS: Ticks = secs(1.0 / 6.0);
const MISSILE_ANIM_TICKS: Ticks = secs(2.0 / 15.0);

// =============================================================================
// BEAM TYPE
// =============================================================================

/// Discrete weapon type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(u8)]
#[derive(Default)]
pub enum BeamType {
    /// Default beam, free to fire
    #[default]
    PowerBeam = 0,
    /// Electric beam, charged shots disrupt
    VoltDriver = 1,
    /// Missile launcher (missile pool)
    Missile = 2,
    /// Rapid-fire plasma
    Battlehammer = 3,
    /// Sniper rifle
    Imperialist = 4,
    /// Ice beam, charged shots freeze
    Judicator = 5,
    /// Fire launcher, charged shots burn
    Magmaul = 6,
    /// Continuous short-range beam
    ShockCoil = 7,
    /// One-shot superweapon
    OmegaCannon = 8,
    /// No weapon
    None = 255,
}

impl BeamType {
    /// All selectable beams in index order.
    pub const ALL: [BeamType; BEAM_COUNT] = [
        BeamType::PowerBeam,
        BeamType::VoltDriver,
        BeamType::Missile,
        BeamType::Battlehammer,
        BeamType::Imperialist,
        BeamType::Judicator,
        BeamType::Magmaul,
        BeamType::ShockCoil,
        BeamType::OmegaCannon,
    ];

    /// Get beam from index (0-8). 255 maps to None.
    pub fn from_index(index: u8) -> Option<BeamType> {
        if index == BeamType::None as u8 {
            return Some(BeamType::None);
        }
        Self::ALL.get(index as usize).copied()
    }

    /// Table index, or None for `BeamType::None`.
    #[inline]
    pub fn index(self) -> Option<usize> {
        match self {
            BeamType::None => None,
            beam => Some(beam as usize),
        }
    }
}

/// Ammo pool index.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum AmmoType {
    /// Universal ammo, shared by every beam except Missile
    Ua = 0,
    /// Missile ammo
    Missiles = 1,
}

/// Pool index used by a beam.
#[inline]
pub fn ammo_type_of(beam: BeamType) -> AmmoType {
    match beam {
        BeamType::Missile => AmmoType::Missiles,
        _ => AmmoType::Ua,
    }
}

// =============================================================================
// WEAPON DEFINITIONS
// =============================================================================

/// Immutable per-beam constants.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeaponDef {
    /// Beam this definition belongs to
    pub beam: BeamType,
    /// Auto-equip precedence (higher wins)
    pub priority: u8,
    /// Cost of an uncharged shot
    pub ammo_cost: u16,
    /// Charge level where a release fires a charged shot
    pub min_charge: Ticks,
    /// Charge level cap
    pub full_charge: Ticks,
    /// Cost of a shot released at `min_charge`
    pub min_charge_cost: u16,
    /// Cost of a shot released at `full_charge`
    pub charge_cost: u16,
    /// Ticks since last shot required by the tap/charged path
    pub shot_cooldown: Ticks,
    /// Ticks since last shot required while holding a repeat-fire weapon
    pub autofire_cooldown: Ticks,
    /// Weapon accumulates charge while held
    pub can_charge: bool,
    /// Weapon fires repeatedly while held
    pub repeat_fire: bool,
    /// Afflictions carried by uncharged shots
    pub afflictions: Affliction,
    /// Afflictions carried by shots at or above min charge
    pub charged_afflictions: Affliction,
}

impl WeaponDef {
    /// Pool this weapon draws from.
    #[inline]
    pub fn ammo_type(&self) -> AmmoType {
        ammo_type_of(self.beam)
    }

    /// Ammo required to keep holding a charge at `level`.
    ///
    /// Below min charge this is the min-charge cost; above it the cost is
    /// interpolated linearly up to the full-charge cost.
    pub fn cost_at(&self, level: Ticks) -> u16 {
        if level <= self.min_charge || self.full_charge <= self.min_charge {
            return self.min_charge_cost;
        }
        let span = (self.full_charge - self.min_charge) as u32;
        let progress = (level.min(self.full_charge) - self.min_charge) as u32;
        let min = self.min_charge_cost as u32;
        let max = self.charge_cost as u32;
        if max >= min {
            (min + (max - min) * progress / span) as u16
        } else {
            (min - (min - max) * progress / span) as u16
        }
    }

    /// Ammo spent by a shot released at `level`.
    #[inline]
    pub fn shot_cost(&self, level: Ticks) -> u16 {
        if self.can_charge && level >= self.min_charge {
            self.cost_at(level)
        } else {
            self.ammo_cost
        }
    }

    /// Charge fraction in [0, 1] for a shot released at `level`.
    pub fn charge_fraction(&self, level: Ticks) -> Fixed {
        if !self.can_charge || level < self.min_charge {
            return 0;
        }
        if self.full_charge <= self.min_charge {
            return FIXED_ONE;
        }
        let span = (self.full_charge - self.min_charge) as i32;
        let progress = (level.min(self.full_charge) - self.min_charge) as i32;
        fixed_div(progress << 16, span << 16)
    }
}

const fn def(
    beam: BeamType,
    priority: u8,
    ammo_cost: u16,
    charge: (Ticks, Ticks, u16, u16),
    cooldowns: (Ticks, Ticks),
    can_charge: bool,
    repeat_fire: bool,
    afflictions: (Affliction, Affliction),
) -> WeaponDef {
    WeaponDef {
        beam,
        priority,
        ammo_cost,
        min_charge: charge.0,
        full_charge: charge.1,
        min_charge_cost: charge.2,
        charge_cost: charge.3,
        shot_cooldown: cooldowns.0,
        autofire_cooldown: cooldowns.1,
        can_charge,
        repeat_fire,
        afflictions: afflictions.0,
        charged_afflictions: afflictions.1,
    }
}

const NONE: Affliction = Affliction::NONE;

/// Standard weapon table, indexed by `BeamType as usize`.
pub static WEAPONS: [WeaponDef; BEAM_COUNT] = [
    def(BeamType::PowerBeam, 0, 0, (10, 40, 0, 0), (10, 10), true, false, (NONE, NONE)),
    def(BeamType::VoltDriver, 2, 5, (10, 50, 10, 20), (14, 14), true, false, (NONE, Affliction::DISRUPT)),
    def(BeamType::Missile, 1, 10, (10, 40, 10, 10), (24, 24), true, false, (NONE, NONE)),
    def(BeamType::Battlehammer, 4, 4, (0, 0, 0, 0), (14, 14), false, true, (NONE, NONE)),
    def(BeamType::Imperialist, 7, 20, (0, 0, 0, 0), (40, 40), false, false, (NONE, NONE)),
    def(BeamType::Judicator, 3, 5, (10, 40, 10, 15), (16, 16), true, false, (NONE, Affliction::FREEZE)),
    def(BeamType::Magmaul, 5, 10, (10, 40, 10, 20), (26, 26), true, false, (NONE, Affliction::BURN)),
    def(BeamType::ShockCoil, 6, 1, (0, 0, 0, 0), (2, 2), false, true, (NONE, NONE)),
    def(BeamType::OmegaCannon, 10, 0, (0, 0, 0, 0), (120, 120), false, false, (NONE, NONE)),
];

/// Affinity weapon table: same costs, stronger afflictions.
pub static AFFINITY_WEAPONS: [WeaponDef; BEAM_COUNT] = [
    def(BeamType::PowerBeam, 0, 0, (10, 30, 0, 0), (8, 8), true, false, (NONE, NONE)),
    def(BeamType::VoltDriver, 2, 5, (10, 40, 10, 20), (12, 12), true, false, (Affliction::DISRUPT, Affliction::DISRUPT)),
    def(BeamType::Missile, 1, 10, (10, 30, 10, 10), (20, 20), true, false, (NONE, NONE)),
    def(BeamType::Battlehammer, 4, 4, (0, 0, 0, 0), (12, 12), false, true, (NONE, NONE)),
    def(BeamType::Imperialist, 7, 20, (0, 0, 0, 0), (36, 36), false, false, (NONE, NONE)),
    def(BeamType::Judicator, 3, 5, (10, 40, 10, 15), (16, 16), true, false, (Affliction::FREEZE, Affliction::FREEZE)),
    def(BeamType::Magmaul, 5, 10, (10, 40, 10, 20), (24, 24), true, false, (Affliction::BURN, Affliction::BURN)),
    def(BeamType::ShockCoil, 6, 1, (0, 0, 0, 0), (2, 2), false, true, (Affliction::DISRUPT, Affliction::DISRUPT)),
    def(BeamType::OmegaCannon, 10, 0, (0, 0, 0, 0), (120, 120), false, false, (NONE, NONE)),
];

/// Look up a weapon definition. `None` resolves to the Power Beam.
#[inline]
pub fn weapon_def(beam: BeamType, affinity: bool) -> &'static WeaponDef {
    let index = beam.index().unwrap_or(0);
    if affinity {
        &AFFINITY_WEAPONS[index]
    } else {
        &WEAPONS[index]
    }
}

/// Whether `hunter` fires `beam` with the affinity table.
pub fn uses_affinity_table(hunter: Hunter, beam: BeamType, single_player: bool) -> bool {
    if beam == hunter.affinity_beam() {
        return true;
    }
    single_player
        && match hunter {
            Hunter::Samus => matches!(beam, BeamType::PowerBeam | BeamType::OmegaCannon),
            Hunter::Guardian => beam == BeamType::VoltDriver,
            _ => false,
        }
}

// =============================================================================
// BEAM SET
// =============================================================================

/// Bitset over the nine selectable beams.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BeamSet(u16);

impl BeamSet {
    const MASK: u16 = (1 << BEAM_COUNT) - 1;

    /// Empty set
    pub const EMPTY: Self = Self(0);

    /// Membership test. `None` is never a member.
    #[inline]
    pub fn contains(self, beam: BeamType) -> bool {
        beam.index().is_some_and(|i| self.0 & (1 << i) != 0)
    }

    /// Add a beam.
    #[inline]
    pub fn insert(&mut self, beam: BeamType) {
        if let Some(i) = beam.index() {
            self.0 |= 1 << i;
        }
    }

    /// Remove a beam.
    #[inline]
    pub fn remove(&mut self, beam: BeamType) {
        if let Some(i) = beam.index() {
            self.0 &= !(1 << i);
        }
    }

    /// Add all nine beams.
    #[inline]
    pub fn set_all(&mut self) {
        self.0 = Self::MASK;
    }

    /// Remove all beams.
    #[inline]
    pub fn clear(&mut self) {
        self.0 = 0;
    }

    /// Raw bits (for hashing).
    #[inline]
    pub fn bits(self) -> u16 {
        self.0
    }
}

// =============================================================================
// AMMO POOL
// =============================================================================

/// The two ammo pools with their caps and pending recovery.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AmmoPool {
    amount: [u16; AMMO_POOL_COUNT],
    max: [u16; AMMO_POOL_COUNT],
    /// Ammo still to be paid out gradually
    pub recovery: [u16; AMMO_POOL_COUNT],
    /// Alternates each tick; recovery pays out on every other tick
    pub recovery_phase: [bool; AMMO_POOL_COUNT],
    /// Pools never deplete (campaign bots)
    pub infinite: bool,
}

impl AmmoPool {
    /// Current amount in a pool.
    #[inline]
    pub fn get(&self, ty: AmmoType) -> u16 {
        self.amount[ty as usize]
    }

    /// Cap of a pool.
    #[inline]
    pub fn max(&self, ty: AmmoType) -> u16 {
        self.max[ty as usize]
    }

    /// Whether a pool can pay `cost`.
    #[inline]
    pub fn has(&self, ty: AmmoType, cost: u16) -> bool {
        self.infinite || self.get(ty) >= cost
    }

    /// Set a pool's amount, clamped to its cap.
    #[inline]
    pub fn set(&mut self, ty: AmmoType, value: u16) {
        let i = ty as usize;
        self.amount[i] = value.min(self.max[i]);
    }

    /// Set a pool's cap, clamping the amount down if needed.
    pub fn set_max(&mut self, ty: AmmoType, max: u16) {
        let i = ty as usize;
        self.max[i] = max;
        self.amount[i] = self.amount[i].min(max);
    }

    /// Add ammo, capped at the pool max.
    #[inline]
    pub fn add(&mut self, ty: AmmoType, amount: u16) {
        let i = ty as usize;
        self.amount[i] = self.amount[i].saturating_add(amount).min(self.max[i]);
    }

    /// Spend ammo. Returns false (and spends nothing) if the pool is short.
    pub fn spend(&mut self, ty: AmmoType, cost: u16) -> bool {
        if self.infinite {
            return true;
        }
        let i = ty as usize;
        if self.amount[i] < cost {
            return false;
        }
        self.amount[i] -= cost;
        true
    }

    /// Fill both pools to their caps.
    pub fn fill(&mut self) {
        self.amount = self.max;
    }

    /// Empty both pools and drop pending recovery.
    pub fn clear(&mut self) {
        self.amount = [0; AMMO_POOL_COUNT];
        self.recovery = [0; AMMO_POOL_COUNT];
        self.recovery_phase = [false; AMMO_POOL_COUNT];
    }

    /// Pay out pending recovery: up to `step` every other tick per pool.
    pub fn step_recovery(&mut self, step: u16) {
        for i in 0..AMMO_POOL_COUNT {
            if self.recovery[i] == 0 {
                self.recovery_phase[i] = false;
                continue;
            }
            if self.recovery_phase[i] {
                self.recovery_phase[i] = false;
                let paid = self.recovery[i].min(step);
                self.amount[i] = self.amount[i].saturating_add(paid).min(self.max[i]);
                self.recovery[i] -= paid;
            } else {
                self.recovery_phase[i] = true;
            }
        }
    }
}

// =============================================================================
// GUN ANIMATION
// =============================================================================

/// Gun-model animation selector read by the renderer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum GunAnimation {
    /// Resting
    #[default]
    Idle = 0,
    /// Lower/raise between two non-missile beams
    Switch = 1,
    /// Missile launcher opening
    MissileOpen = 2,
    /// Missile launcher closing
    MissileClose = 3,
}

impl GunAnimation {
    fn duration(self) -> Ticks {
        match self {
            GunAnimation::Idle => 0,
            GunAnimation::Switch => SWITCH_ANIM_TICKS,
            GunAnimation::MissileOpen | GunAnimation::MissileClose => MISSILE_ANIM_TICKS,
        }
    }
}

// =============================================================================
// OUTCOMES
// =============================================================================

/// Why an equip request was refused.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum EquipDenial {
    /// Beam index out of range (or None)
    InvalidBeam,
    /// Pool cannot pay one shot
    NoAmmo,
    /// Beam not unlocked
    Locked,
    /// A switch animation is still playing
    Busy,
}

/// Result of an equip request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EquipOutcome {
    /// Weapon equipped
    Equipped {
        /// Weapon held before the call
        previous: BeamType,
        /// Switch animation started (non-silent only)
        animation: Option<GunAnimation>,
    },
    /// Request refused, state unchanged
    Denied(EquipDenial),
}

impl EquipOutcome {
    /// True when the weapon was equipped.
    #[inline]
    pub fn succeeded(self) -> bool {
        matches!(self, EquipOutcome::Equipped { .. })
    }
}

/// A shot attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ShotOutcome {
    /// Shot left the gun
    Fired {
        /// Beam fired
        beam: BeamType,
        /// Charge fraction at release (0 for uncharged)
        charge: Fixed,
        /// Ammo spent
        ammo_spent: u16,
        /// Afflictions carried by the projectile
        afflictions: Affliction,
    },
    /// Pool could not pay
    Empty {
        /// Beam that clicked empty
        beam: BeamType,
    },
}

/// Everything the trigger produced this tick.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TriggerResult {
    /// Shot attempt, if any
    pub shot: Option<ShotOutcome>,
    /// Charge reached min charge this tick
    pub reached_min_charge: bool,
    /// Charge reached full charge this tick
    pub reached_full_charge: bool,
    /// A charge below min was dropped without firing
    pub charge_cancelled: bool,
}

/// Starting weapon kit.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Loadout {
    /// Power Beam and Missile, ten missiles
    Multiplayer,
    /// Everything unlocked, pools full
    Campaign,
    /// Affinity beam only, infinite ammo
    CampaignBot,
}

// =============================================================================
// WEAPON STATE
// =============================================================================

/// Per-combatant weapon selection record and ammo.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeaponState {
    /// Weapon in hand
    pub current: BeamType,
    /// Weapon held before the last equip
    pub previous: BeamType,
    /// Weapon the selection UI points at
    pub selection: BeamType,
    /// Slot bindings: power, missile, affinity
    pub slots: [BeamType; 3],
    /// Unlocked weapons
    pub available: BeamSet,
    /// Unlocked weapons allowed to charge
    pub available_charge: BeamSet,
    /// Active definition comes from the affinity table
    pub affinity_variant: bool,
    /// Hold-to-charge progress, in [0, full_charge]
    pub charge_level: Ticks,
    /// Fire input was held this tick
    pub shooting: bool,
    /// Gun animation in progress
    pub gun_animation: GunAnimation,
    /// Remaining ticks of `gun_animation`
    pub gun_animation_ticks: Ticks,
    /// Ticks since the last successful shot
    pub time_since_shot: Ticks,
    /// Omega unequip requested; honored at the start of the next tick
    pub unequip_omega_pending: bool,
    /// Ammo pools
    pub ammo: AmmoPool,
}

impl Default for WeaponState {
    fn default() -> Self {
        Self {
            current: BeamType::PowerBeam,
            previous: BeamType::PowerBeam,
            selection: BeamType::PowerBeam,
            slots: [BeamType::PowerBeam, BeamType::Missile, BeamType::None],
            available: BeamSet::EMPTY,
            available_charge: BeamSet::EMPTY,
            affinity_variant: false,
            charge_level: 0,
            shooting: false,
            gun_animation: GunAnimation::Idle,
            gun_animation_ticks: 0,
            time_since_shot: Ticks::MAX,
            unequip_omega_pending: false,
            ammo: AmmoPool::default(),
        }
    }
}

impl WeaponState {
    /// Active weapon definition.
    #[inline]
    pub fn active_def(&self) -> &'static WeaponDef {
        weapon_def(self.current, self.affinity_variant)
    }

    /// Whether the active weapon may accumulate charge.
    #[inline]
    pub fn can_charge(&self) -> bool {
        self.available_charge.contains(self.current) && self.active_def().can_charge
    }

    /// Unlock a weapon together with its charge ability.
    pub fn unlock(&mut self, beam: BeamType) {
        self.available.insert(beam);
        self.available_charge.insert(beam);
    }

    /// Revoke a weapon and its charge ability.
    pub fn revoke(&mut self, beam: BeamType) {
        self.available.remove(beam);
        self.available_charge.remove(beam);
    }

    /// Set up the starting kit. Pool caps must already be set.
    pub fn initialize(&mut self, loadout: Loadout, hunter: Hunter) {
        self.available.clear();
        self.available_charge.clear();
        self.ammo.clear();
        self.ammo.infinite = false;
        self.charge_level = 0;
        self.shooting = false;
        self.unequip_omega_pending = false;
        self.gun_animation = GunAnimation::Idle;
        self.gun_animation_ticks = 0;
        self.time_since_shot = Ticks::MAX;
        match loadout {
            Loadout::Multiplayer => {
                self.unlock(BeamType::PowerBeam);
                self.unlock(BeamType::Missile);
                self.slots = [BeamType::PowerBeam, BeamType::Missile, BeamType::None];
                let missile = weapon_def(BeamType::Missile, false);
                self.ammo.set(AmmoType::Missiles, 10 * missile.ammo_cost);
            }
            Loadout::Campaign => {
                self.available.set_all();
                self.available_charge.set_all();
                self.slots = [BeamType::PowerBeam, BeamType::Missile, BeamType::VoltDriver];
                self.ammo.fill();
            }
            Loadout::CampaignBot => {
                let affinity = hunter.affinity_beam();
                self.unlock(affinity);
                self.slots = [BeamType::None, BeamType::None, affinity];
                self.ammo.infinite = true;
            }
        }
    }

    /// Equip a weapon.
    ///
    /// Non-silent requests are refused when the pool cannot pay one shot,
    /// the weapon is locked, or a switch animation is still playing.
    /// Silent requests skip all three checks.
    pub fn try_equip(
        &mut self,
        beam: BeamType,
        silent: bool,
        hunter: Hunter,
        single_player: bool,
    ) -> EquipOutcome {
        if beam.index().is_none() {
            return EquipOutcome::Denied(EquipDenial::InvalidBeam);
        }
        let def = weapon_def(beam, false);
        let has_ammo = beam == BeamType::PowerBeam || self.ammo.has(def.ammo_type(), def.ammo_cost);
        if !silent {
            if !has_ammo {
                return EquipOutcome::Denied(EquipDenial::NoAmmo);
            }
            if !self.available.contains(beam) {
                return EquipOutcome::Denied(EquipDenial::Locked);
            }
            if self.gun_animation != GunAnimation::Idle && self.gun_animation_ticks > 0 {
                return EquipOutcome::Denied(EquipDenial::Busy);
            }
        }

        let outgoing = self.current;
        if beam != outgoing {
            self.previous = outgoing;
        }
        self.current = beam;
        self.selection = beam;
        self.affinity_variant = uses_affinity_table(hunter, beam, single_player);
        self.charge_level = 0;

        let animation = if silent {
            None
        } else if beam == BeamType::Missile {
            Some(GunAnimation::MissileOpen)
        } else if outgoing == BeamType::Missile {
            Some(GunAnimation::MissileClose)
        } else {
            Some(GunAnimation::Switch)
        };
        if let Some(anim) = animation {
            self.gun_animation = anim;
            self.gun_animation_ticks = anim.duration();
        }

        if beam != BeamType::PowerBeam && beam != BeamType::Missile {
            self.update_affinity_slot(beam);
        }

        EquipOutcome::Equipped { previous: outgoing, animation }
    }

    /// Bind a beam to the affinity slot, evicting Omega if displaced.
    pub fn update_affinity_slot(&mut self, beam: BeamType) {
        if self.slots[AFFINITY_SLOT] == BeamType::OmegaCannon && beam != BeamType::OmegaCannon {
            self.revoke(BeamType::OmegaCannon);
        }
        self.slots[AFFINITY_SLOT] = beam;
    }

    /// Drop the Omega Cannon and fall back to the best remaining weapon.
    ///
    /// Only acts in multiplayer while Omega is in hand. Returns the
    /// weapon equipped in its place.
    pub fn unequip_omega(&mut self, hunter: Hunter, single_player: bool) -> Option<BeamType> {
        if self.current != BeamType::OmegaCannon || single_player {
            return None;
        }
        self.revoke(BeamType::OmegaCannon);

        let mut best_priority = 0;
        let mut next = BeamType::None;
        for beam in BeamType::ALL.iter().copied() {
            if matches!(beam, BeamType::PowerBeam | BeamType::Missile) || !self.available.contains(beam) {
                continue;
            }
            let def = weapon_def(beam, false);
            if def.priority > best_priority && self.ammo.has(def.ammo_type(), def.ammo_cost) {
                best_priority = def.priority;
                next = beam;
            }
        }
        self.update_affinity_slot(next);

        let target = if next == BeamType::None { BeamType::PowerBeam } else { next };
        if !self.try_equip(target, false, hunter, single_player).succeeded() {
            self.try_equip(target, true, hunter, single_player);
        }
        Some(target)
    }

    /// Slot weapon to fall back to when the active pool is exhausted.
    ///
    /// Returns None while the active weapon can still pay one shot.
    pub fn auto_switch_target(&self) -> Option<BeamType> {
        if self.ammo.infinite {
            return None;
        }
        let def = self.active_def();
        if self.ammo.has(def.ammo_type(), def.ammo_cost) {
            return None;
        }
        let mut best_slot = 0;
        let mut best_priority = 0;
        for (slot, beam) in self.slots.iter().copied().enumerate() {
            if !self.available.contains(beam) {
                continue;
            }
            let slot_def = weapon_def(beam, false);
            if slot_def.priority > best_priority && self.ammo.has(slot_def.ammo_type(), slot_def.ammo_cost) {
                best_priority = slot_def.priority;
                best_slot = slot;
            }
        }
        let target = self.slots[best_slot];
        (target != BeamType::None && target != self.current).then_some(target)
    }

    /// Advance the gun animation by one tick.
    pub fn step_gun_animation(&mut self) {
        if count_down(&mut self.gun_animation_ticks) {
            self.gun_animation = GunAnimation::Idle;
        }
    }

    /// Advance the time-since-shot counter.
    #[inline]
    pub fn step_shot_clock(&mut self) {
        count_up(&mut self.time_since_shot);
    }

    /// Drop any charge and mark fire released.
    pub fn reset_trigger(&mut self) {
        self.charge_level = 0;
        self.shooting = false;
    }

    /// Run the trigger for one tick.
    ///
    /// `held` is fire held this tick, `pressed` is fire newly pressed.
    pub fn step_trigger(&mut self, held: bool, pressed: bool) -> TriggerResult {
        let mut result = TriggerResult::default();
        let def = self.active_def();
        let pool = def.ammo_type();
        self.shooting = held;

        if !self.can_charge() {
            self.charge_level = 0;
        } else {
            let release = !held || !self.ammo.has(pool, def.cost_at(self.charge_level));
            if release {
                if self.charge_level >= def.min_charge {
                    result.shot = self.try_fire(self.charge_level, false);
                } else if self.charge_level > 0 {
                    result.charge_cancelled = true;
                }
                self.charge_level = 0;
            } else if self.charge_level < def.full_charge {
                self.charge_level += 1;
                if self.charge_level > def.min_charge && !self.ammo.has(pool, def.cost_at(self.charge_level)) {
                    self.charge_level -= 1;
                } else if self.charge_level == def.min_charge {
                    result.reached_min_charge = true;
                } else if self.charge_level == def.full_charge {
                    result.reached_full_charge = true;
                }
            }
        }

        if result.shot.is_none() {
            let tap = pressed && self.charge_level <= TAP_FIRE_MAX_CHARGE;
            let autofire = def.repeat_fire
                && held
                && (!self.can_charge() || self.charge_level < def.min_charge);
            if tap || autofire {
                result.shot = self.try_fire(0, !tap);
            }
        }

        result
    }

    /// Attempt one shot released at `level`.
    ///
    /// Returns None while the shot cooldown has not elapsed.
    fn try_fire(&mut self, level: Ticks, autofire: bool) -> Option<ShotOutcome> {
        let def = self.active_def();
        let cooldown = if autofire { def.autofire_cooldown } else { def.shot_cooldown };
        if self.time_since_shot < cooldown {
            return None;
        }
        let cost = def.shot_cost(level);
        if !self.ammo.spend(def.ammo_type(), cost) {
            return Some(ShotOutcome::Empty { beam: self.current });
        }
        self.time_since_shot = 0;
        let charged = def.can_charge && level >= def.min_charge;
        Some(ShotOutcome::Fired {
            beam: self.current,
            charge: def.charge_fraction(level),
            ammo_spent: if self.ammo.infinite { 0 } else { cost },
            afflictions: if charged { def.charged_afflictions } else { def.afflictions },
        })
    }
}

// =============================================================================
// TESTS
// =============================================================================
