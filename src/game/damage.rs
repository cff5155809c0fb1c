//! Damage Resolution
//!
//! Incoming hits are resolved in two stages:
//!
//! 1. [`resolve_amount`] runs with read access to the whole arena and turns
//!    a raw [`Hit`] into a [`ResolvedHit`]: effectiveness, double damage,
//!    friendly fire and self-damage suppression.
//! 2. [`Damageable::take_damage`] mutates only the victim: invulnerability
//!    gates, the death decision, afflictions, knockback.
//!
//! A resolved amount of zero without the Death flag is a no-op.

use std::ops::BitOr;

use serde::{Serialize, Deserialize};
use tracing::debug;

use crate::core::fixed::{Fixed, FIXED_ONE, fixed_abs, fixed_max, fixed_min, fixed_mul, to_fixed};
use crate::core::vec3::FixedVec3;
use crate::game::combatant::{BodyForm, Combatant, CombatantId, Damageable, Phase};
use crate::game::events::{EffectKind, EventSink, SimEventData, SoundCue};
use crate::game::pickup::ItemType;
use crate::game::weapon::{AmmoType, BeamType};

/// Maximum upward knockback
const KNOCKBACK_MAX_Y: Fixed = to_fixed(0.25);
/// Knockback scale in alt-form
const ALT_KNOCKBACK: Fixed = to_fixed(0.4);
/// Height above the corpse where a death drop appears
const DROP_HEIGHT: Fixed = to_fixed(0.35);

const SHAKE_PER_DAMAGE: Fixed = to_fixed(0.01);
const SHAKE_MIN: Fixed = to_fixed(0.05);
const SHAKE_BURN: Fixed = to_fixed(0.03);

// =============================================================================
// TYPES
// =============================================================================

/// Damage multiplier for a beam against a hunter.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Effectiveness {
    /// Immune
    Zero,
    /// Half damage
    Half,
    /// Unchanged
    #[default]
    Normal,
    /// Double damage
    Double,
}

impl Effectiveness {
    /// Scale `damage`. Any nonzero result is at least 1.
    pub fn apply(self, damage: u16) -> u16 {
        if damage == 0 {
            return 0;
        }
        match self {
            Effectiveness::Zero => 0,
            Effectiveness::Half => (damage / 2).max(1),
            Effectiveness::Normal => damage,
            Effectiveness::Double => damage.saturating_mul(2),
        }
    }
}

/// Status effect tags carried by a hit.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Affliction(u8);

impl Affliction {
    pub const NONE: Self = Self(0);
    pub const FREEZE: Self = Self(0x01);
    pub const DISRUPT: Self = Self(0x02);
    pub const BURN: Self = Self(0x04);

    /// Check whether all tags in `other` are present.
    #[inline]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0 && other.0 != 0
    }

    /// No tags.
    #[inline]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Raw bits.
    #[inline]
    pub const fn bits(self) -> u8 {
        self.0
    }
}

impl BitOr for Affliction {
    type Output = Self;
    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

/// Modifiers on a hit.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DamageFlags(u16);

impl DamageFlags {
    pub const NONE: Self = Self(0);
    /// Do not arm a damage-invulnerability window
    pub const NO_DMG_INVULN: Self = Self(0x001);
    /// Pass through both invulnerability windows
    pub const IGNORE_INVULN: Self = Self(0x002);
    /// Always kill
    pub const DEATH: Self = Self(0x004);
    /// Dealt by a halfturret
    pub const HALFTURRET: Self = Self(0x008);
    pub const HEADSHOT: Self = Self(0x010);
    /// Dealt by a death-alt attack
    pub const DEATH_ALT: Self = Self(0x020);
    /// Periodic burn tick
    pub const BURN: Self = Self(0x040);
    /// Suppress hit audio
    pub const NO_SFX: Self = Self(0x080);
    /// Dealt from alt-form
    pub const FROM_ALT: Self = Self(0x100);

    /// Check whether any flag in `other` is set.
    #[inline]
    pub const fn intersects(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }

    /// Raw bits.
    #[inline]
    pub const fn bits(self) -> u16 {
        self.0
    }
}

impl BitOr for DamageFlags {
    type Output = Self;
    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

/// Where a hit came from.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DamageSource {
    /// Unattributed
    #[default]
    None,
    /// A projectile, scaled by the victim's effectiveness for its beam
    Projectile {
        owner: Option<CombatantId>,
        beam: BeamType,
    },
    /// Direct contact with another combatant
    Combatant(CombatantId),
    /// An explosion (bombs, halfturret, scenery)
    Explosive {
        owner: Option<CombatantId>,
    },
    /// Periodic burn, attributed to the igniter
    Burn {
        owner: Option<CombatantId>,
    },
    /// Acid, lava or kill plane
    Hazard,
}

impl DamageSource {
    /// Combatant credited with the hit.
    pub fn attacker(self) -> Option<CombatantId> {
        match self {
            DamageSource::Projectile { owner, .. }
            | DamageSource::Explosive { owner }
            | DamageSource::Burn { owner } => owner,
            DamageSource::Combatant(id) => Some(id),
            DamageSource::None | DamageSource::Hazard => None,
        }
    }
}

/// A hit as delivered by a projectile, explosion or hazard.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hit {
    pub damage: u16,
    pub flags: DamageFlags,
    pub afflictions: Affliction,
    /// Knockback direction; derived from the attacker when absent
    pub direction: Option<FixedVec3>,
    pub source: DamageSource,
}

impl Hit {
    /// Plain hit with no source.
    pub fn new(damage: u16, flags: DamageFlags) -> Self {
        Self { damage, flags, ..Default::default() }
    }

    /// Builder: set the source.
    pub fn from_source(mut self, source: DamageSource) -> Self {
        self.source = source;
        self
    }

    /// Builder: set afflictions.
    pub fn with_afflictions(mut self, afflictions: Affliction) -> Self {
        self.afflictions = afflictions;
        self
    }

    /// Builder: set knockback direction.
    pub fn with_direction(mut self, direction: FixedVec3) -> Self {
        self.direction = Some(direction);
        self
    }
}

/// Attacker state captured before the victim is mutated.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AttackerInfo {
    pub id: CombatantId,
    pub position: FixedVec3,
    /// Pool used by the attacker's current weapon
    pub ammo_type: AmmoType,
}

impl AttackerInfo {
    /// Capture attacker state.
    pub fn of(attacker: &Combatant) -> Self {
        Self {
            id: attacker.id,
            position: attacker.body.position,
            ammo_type: attacker.weapons.active_def().ammo_type(),
        }
    }
}

/// A hit with its final amount.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ResolvedHit {
    pub amount: u16,
    pub flags: DamageFlags,
    pub afflictions: Affliction,
    pub direction: Option<FixedVec3>,
    pub attacker: Option<AttackerInfo>,
}

/// Session rules that affect damage.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DamageRules {
    pub single_player: bool,
    pub teams: bool,
    pub friendly_fire: bool,
}

/// Directional hit reaction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum HitReaction {
    Front = 0,
    Back = 1,
    Left = 2,
    Right = 3,
}

/// What a hit did to its victim.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DamageOutcome {
    /// Nothing changed
    Ignored,
    /// Victim survived
    Damaged {
        amount: u16,
        health: u16,
    },
    /// Victim died
    Killed {
        killer: Option<CombatantId>,
        /// Item to drop at the given position
        drop: Option<(ItemType, FixedVec3)>,
    },
}

// =============================================================================
// RESOLUTION
// =============================================================================

/// Compute the amount a hit deals to `victim`.
pub fn resolve_amount(
    hit: &Hit,
    victim: &Combatant,
    attacker: Option<&Combatant>,
    rules: &DamageRules,
) -> u16 {
    let mut amount = hit.damage;
    match hit.source {
        DamageSource::Projectile { beam, .. } => {
            if let Some(index) = beam.index() {
                amount = victim.hunter.values().effectiveness[index].apply(amount);
            }
        }
        DamageSource::Combatant(_) => {
            if attacker.is_some_and(|a| a.timers.double_damage > 0) {
                amount = amount.saturating_mul(2);
            }
        }
        DamageSource::None
        | DamageSource::Explosive { .. }
        | DamageSource::Burn { .. }
        | DamageSource::Hazard => {}
    }

    if let Some(attacker) = attacker {
        if attacker.id == victim.id {
            if victim.is_bot {
                amount = 0;
            }
        } else if rules.teams && !rules.friendly_fire && attacker.team == victim.team {
            amount = 0;
        }
    }
    amount
}

/// Classify a hit direction against a facing.
///
/// The direction is projected onto the facing's side and forward axes.
/// Ties between the two axes go to left/right.
pub fn classify_hit(direction: FixedVec3, facing: FixedVec3) -> HitReaction {
    let forward = facing.horizontal().normalize();
    let side = FixedVec3::UP.cross(forward);
    let lr = -direction.dot(side);
    let ud = -direction.dot(forward);
    if fixed_abs(ud) <= fixed_abs(lr) {
        if lr <= 0 {
            HitReaction::Right
        } else {
            HitReaction::Left
        }
    } else if ud <= 0 {
        HitReaction::Back
    } else {
        HitReaction::Front
    }
}

/// Camera shake requested for a hit.
pub fn camera_shake(amount: u16, flags: DamageFlags) -> Fixed {
    if flags.intersects(DamageFlags::BURN) {
        SHAKE_BURN
    } else {
        fixed_max((amount as i32).saturating_mul(SHAKE_PER_DAMAGE), SHAKE_MIN)
    }
}

// =============================================================================
// VICTIM SIDE
// =============================================================================

impl Damageable for Combatant {
    fn is_dead(&self) -> bool {
        self.phase == Phase::Dead
    }

    fn take_damage(&mut self, hit: &ResolvedHit, rules: &DamageRules, sink: &mut EventSink) -> DamageOutcome {
        let flags = hit.flags;
        if self.is_dead() || (hit.amount == 0 && !flags.intersects(DamageFlags::DEATH)) {
            return DamageOutcome::Ignored;
        }
        let forced = flags.intersects(DamageFlags::IGNORE_INVULN | DamageFlags::DEATH);
        if !forced && self.timers.spawn_invuln > 0 {
            return DamageOutcome::Ignored;
        }
        // Any of the three flags skips the damage-invulnerability window entirely
        if !flags.intersects(DamageFlags::IGNORE_INVULN | DamageFlags::DEATH | DamageFlags::NO_DMG_INVULN) {
            if self.timers.damage_invuln > 0 {
                return DamageOutcome::Ignored;
            }
            self.timers.damage_invuln = self.hunter.values().damage_invuln;
        }

        let killer = hit.attacker.map(|a| a.id);
        if self.health <= hit.amount || flags.intersects(DamageFlags::DEATH) {
            return self.die(hit, rules, sink);
        }

        self.health -= hit.amount;

        if hit.afflictions.contains(Affliction::FREEZE) {
            self.timers.arm_freeze(rules.single_player && killer.is_none());
        }
        if hit.afflictions.contains(Affliction::DISRUPT) {
            self.timers.arm_disrupt();
        }
        if hit.afflictions.contains(Affliction::BURN) {
            self.timers.arm_burn();
            self.burn_owner = killer;
            if self.effects.burn.is_none() {
                self.effects.burn = Some(sink.spawn_effect(self.id, EffectKind::Burn, self.body.position));
            }
        }

        let direction = hit
            .direction
            .or_else(|| hit.attacker.map(|a| self.body.position - a.position));
        let mut reaction = None;
        if !self.timers.is_frozen() {
            if let Some(dir) = direction {
                reaction = self.apply_knockback(dir);
            }
        }
        self.hit_reaction = reaction.or(self.hit_reaction);

        if self.form == BodyForm::Biped && !self.timers.is_frozen() {
            sink.push(SimEventData::CameraShake {
                combatant: self.id,
                amount: camera_shake(hit.amount, flags),
            });
        }
        sink.push(SimEventData::Damaged {
            victim: self.id,
            attacker: killer,
            amount: hit.amount,
            health: self.health,
            flags,
            reaction,
        });

        DamageOutcome::Damaged { amount: hit.amount, health: self.health }
    }
}

impl Combatant {
    /// Push the body along a hit direction and pick a hit reaction.
    fn apply_knockback(&mut self, dir: FixedVec3) -> Option<HitReaction> {
        let speed = &mut self.body.speed;
        match self.form {
            BodyForm::Alt => {
                speed.x = speed.x.wrapping_add(fixed_mul(dir.x, ALT_KNOCKBACK));
                speed.z = speed.z.wrapping_add(fixed_mul(dir.z, ALT_KNOCKBACK));
                None
            }
            BodyForm::Biped => {
                speed.x = speed.x.wrapping_add(dir.x);
                speed.z = speed.z.wrapping_add(dir.z);
                speed.y = speed.y.wrapping_add(fixed_min(dir.y, KNOCKBACK_MAX_Y));
                Some(classify_hit(dir, self.body.facing))
            }
        }
    }

    /// Death transition.
    fn die(&mut self, hit: &ResolvedHit, rules: &DamageRules, sink: &mut EventSink) -> DamageOutcome {
        let killer = hit.attacker.map(|a| a.id);
        let alt_form = self.form == BodyForm::Alt;
        let position = self.body.position;

        self.phase = Phase::Dead;
        self.health = 0;
        self.health_recovery = 0;
        self.weapons.ammo.recovery = [0; 2];
        self.weapons.reset_trigger();
        self.weapons.selection = self.weapons.current;
        self.body.speed = FixedVec3::ZERO;
        self.timers.clear_on_death();
        self.burn_owner = None;
        self.hit_reaction = None;
        self.time_since_death = 0;
        self.deaths = self.deaths.saturating_add(1);
        self.fade.target = FIXED_ONE;
        self.effects.end_all(sink);

        let kind = if alt_form { EffectKind::DeathAlt } else { EffectKind::DeathBiped };
        sink.spawn_effect(self.id, kind, position);
        let cue = if rules.single_player { SoundCue::DeathSinglePlayer } else { SoundCue::DeathMultiplayer };
        sink.sound(self.id, cue);
        sink.push(SimEventData::Died { victim: self.id, killer, alt_form });

        let drop = match hit.attacker {
            Some(attacker) if !rules.single_player && attacker.id != self.id => {
                let item = match attacker.ammo_type {
                    AmmoType::Missiles => ItemType::MissileSmall,
                    AmmoType::Ua => ItemType::UaSmall,
                };
                Some((item, position.with_y(position.y.wrapping_add(DROP_HEIGHT))))
            }
            _ => None,
        };

        debug!(victim = self.id.0, killer = ?killer.map(|k| k.0), "combatant died");
        DamageOutcome::Killed { killer, drop }
    }
}

// =============================================================================
// TESTS
// =============================================================================
