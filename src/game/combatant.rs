//! Combatant Entity
//!
//! One entity per game slot, allocated once and reused across respawns.
//! Mutually exclusive phases live in [`Phase`]; orthogonal conditions are
//! plain fields and countdowns in [`StatusTimers`].
//!
//! Capabilities are split into three traits so projectiles, hazards and the
//! renderer each depend only on what they use:
//!
//! - [`Damageable`]: hits
//! - [`Simulated`]: physics
//! - [`Drawable`]: read-only render view

use serde::{Serialize, Deserialize};
use tracing::debug;

use crate::core::fixed::Fixed;
use crate::core::hash::StateHasher;
use crate::core::time::{Ticks, secs, count_down};
use crate::core::vec3::FixedVec3;
use crate::game::damage::{DamageOutcome, DamageRules, HitReaction, ResolvedHit};
use crate::game::events::{EffectId, EventSink, SimEventData, SoundCue};
use crate::game::hunter::Hunter;
use crate::game::movement::{Body, CollisionService, CollisionShape, MoveIntent};
use crate::game::timers::{Fade, StatusTimers};
use crate::game::weapon::{AmmoType, BeamType, EquipOutcome, GunAnimation, WeaponState};

/// Morph transition length
pub const MORPH_TICKS: Ticks = secs(1.0 / 6.0);

/// Recovery paid out per payout tick
pub const RECOVERY_STEP: u16 = 3;

// =============================================================================
// IDENTITY AND PHASE
// =============================================================================

/// Stable arena handle (the game slot).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CombatantId(pub u8);

/// Mutually exclusive life phase.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Phase {
    Alive,
    /// Waiting for respawn
    #[default]
    Dead,
    /// Turning into alt-form
    Morphing { ticks: Ticks },
    /// Turning back into biped
    Unmorphing { ticks: Ticks },
}

impl Phase {
    fn tag(self) -> u8 {
        match self {
            Phase::Alive => 0,
            Phase::Dead => 1,
            Phase::Morphing { .. } => 2,
            Phase::Unmorphing { .. } => 3,
        }
    }
}

/// Physical form.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BodyForm {
    #[default]
    Biped,
    Alt,
}

/// Visual effects owned by a combatant.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EffectHandles {
    pub burn: Option<EffectId>,
    pub double_damage: Option<EffectId>,
    pub charge: Option<EffectId>,
}

impl EffectHandles {
    /// Request removal of every held effect.
    pub fn end_all(&mut self, sink: &mut EventSink) {
        sink.end_effect(&mut self.burn);
        sink.end_effect(&mut self.double_damage);
        sink.end_effect(&mut self.charge);
    }
}

// =============================================================================
// CAPABILITIES
// =============================================================================

/// Something that can take hits.
pub trait Damageable {
    /// Dead entities ignore all hits.
    fn is_dead(&self) -> bool;

    /// Apply a resolved hit.
    fn take_damage(&mut self, hit: &ResolvedHit, rules: &DamageRules, sink: &mut EventSink) -> DamageOutcome;
}

/// Something moved by the physics step.
pub trait Simulated {
    fn body(&self) -> &Body;

    fn body_mut(&mut self) -> &mut Body;

    /// Collision sphere in the current form.
    fn collision_shape(&self) -> CollisionShape;

    /// Advance physics one tick.
    fn step_physics(&mut self, intent: MoveIntent, world: &dyn CollisionService);
}

/// Read-only state for the renderer and HUD.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrawState {
    pub id: CombatantId,
    pub hunter: Hunter,
    pub phase: Phase,
    pub form: BodyForm,
    pub position: FixedVec3,
    pub facing: FixedVec3,
    pub health: u16,
    pub health_max: u16,
    pub weapon: BeamType,
    pub ammo: u16,
    pub ammo_max: u16,
    pub charge_level: Ticks,
    pub gun_animation: GunAnimation,
    pub hit_reaction: Option<HitReaction>,
    pub alpha: Fixed,
    pub frozen: bool,
    pub frozen_gfx: bool,
    pub disrupted: bool,
    pub cloaked: bool,
    pub double_damage: bool,
}

/// Something the renderer can read.
pub trait Drawable {
    fn draw_state(&self) -> DrawState;
}

// =============================================================================
// COMBATANT
// =============================================================================

/// A player or bot.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Combatant {
    pub id: CombatantId,
    pub team: u8,
    pub hunter: Hunter,
    pub is_bot: bool,
    /// Viewed in first person
    pub is_main_player: bool,

    pub phase: Phase,
    pub form: BodyForm,

    pub health: u16,
    pub health_max: u16,
    /// Health still to be paid out gradually
    pub health_recovery: u16,
    pub health_recovery_phase: bool,

    pub weapons: WeaponState,
    pub timers: StatusTimers,
    pub fade: Fade,
    pub body: Body,

    /// Buttons held last tick (for press detection)
    pub buttons: u8,
    /// Credited with burn damage
    pub burn_owner: Option<CombatantId>,
    pub effects: EffectHandles,
    pub hit_reaction: Option<HitReaction>,

    pub kills: u16,
    pub deaths: u16,
    pub time_since_death: Ticks,

    /// Pickups disabled
    pub pickups_suppressed: bool,
    /// Prime hunter buff: health items do not heal
    pub prime: bool,
}

impl Combatant {
    /// Allocate a combatant for a slot. It starts dead and spawns on its
    /// first tick.
    pub fn new(id: CombatantId, hunter: Hunter, team: u8, is_bot: bool) -> Self {
        Self {
            id,
            team,
            hunter,
            is_bot,
            is_main_player: false,
            phase: Phase::Dead,
            form: BodyForm::Biped,
            health: 0,
            health_max: 0,
            health_recovery: 0,
            health_recovery_phase: false,
            weapons: WeaponState::default(),
            timers: StatusTimers::default(),
            fade: Fade::default(),
            body: Body::default(),
            buttons: 0,
            burn_owner: None,
            effects: EffectHandles::default(),
            hit_reaction: None,
            kills: 0,
            deaths: 0,
            time_since_death: Ticks::MAX,
            pickups_suppressed: false,
            prime: false,
        }
    }

    /// Not dead (morphing counts as alive).
    #[inline]
    pub fn is_alive(&self) -> bool {
        self.phase != Phase::Dead
    }

    /// Heal, capped at max.
    pub fn gain_health(&mut self, amount: u16) {
        self.health = self.health.saturating_add(amount).min(self.health_max);
    }

    /// Pay out health and ammo recovery.
    pub fn step_recovery(&mut self) {
        if self.health_recovery == 0 {
            self.health_recovery_phase = false;
        } else if self.health_recovery_phase {
            self.health_recovery_phase = false;
            let paid = self.health_recovery.min(RECOVERY_STEP);
            self.gain_health(paid);
            self.health_recovery -= paid;
        } else {
            self.health_recovery_phase = true;
        }
        self.weapons.ammo.step_recovery(RECOVERY_STEP);
    }

    /// Equip a weapon, reporting the result as events.
    pub fn try_equip_weapon(
        &mut self,
        beam: BeamType,
        silent: bool,
        single_player: bool,
        sink: &mut EventSink,
    ) -> bool {
        match self.weapons.try_equip(beam, silent, self.hunter, single_player) {
            EquipOutcome::Equipped { previous, animation } => {
                sink.end_effect(&mut self.effects.charge);
                sink.push(SimEventData::WeaponEquipped {
                    combatant: self.id,
                    beam,
                    previous,
                    animation,
                });
                debug!(combatant = self.id.0, ?beam, ?previous, silent, "weapon equipped");
                true
            }
            EquipOutcome::Denied(reason) => {
                if !silent {
                    sink.sound(self.id, SoundCue::EquipDenied);
                    sink.push(SimEventData::EquipDenied { combatant: self.id, beam, reason });
                }
                debug!(combatant = self.id.0, ?beam, ?reason, "equip denied");
                false
            }
        }
    }

    /// Start a morph or unmorph. Frozen or dead combatants cannot morph.
    pub fn start_morph(&mut self) -> bool {
        if self.phase != Phase::Alive || self.timers.is_frozen() {
            return false;
        }
        self.phase = match self.form {
            BodyForm::Biped => Phase::Morphing { ticks: MORPH_TICKS },
            BodyForm::Alt => Phase::Unmorphing { ticks: MORPH_TICKS },
        };
        self.weapons.reset_trigger();
        true
    }

    /// Advance a morph in progress.
    pub fn step_morph(&mut self) {
        match &mut self.phase {
            Phase::Morphing { ticks } => {
                if count_down(ticks) {
                    self.phase = Phase::Alive;
                    self.form = BodyForm::Alt;
                }
            }
            Phase::Unmorphing { ticks } => {
                if count_down(ticks) {
                    self.phase = Phase::Alive;
                    self.form = BodyForm::Biped;
                }
            }
            Phase::Alive | Phase::Dead => {}
        }
    }

    /// Biped, not mid-morph, not dead.
    #[inline]
    pub fn can_fire(&self) -> bool {
        self.phase == Phase::Alive && self.form == BodyForm::Biped
    }

    /// Hash every gameplay-relevant field.
    pub fn hash_into(&self, hasher: &mut StateHasher) {
        hasher.update_u8(self.id.0);
        hasher.update_u8(self.team);
        hasher.update_u8(self.hunter as u8);
        hasher.update_bool(self.is_bot);
        hasher.update_u8(self.phase.tag());
        if let Phase::Morphing { ticks } | Phase::Unmorphing { ticks } = self.phase {
            hasher.update_u16(ticks);
        }
        hasher.update_u8(self.form as u8);

        hasher.update_u16(self.health);
        hasher.update_u16(self.health_max);
        hasher.update_u16(self.health_recovery);
        hasher.update_bool(self.health_recovery_phase);

        let w = &self.weapons;
        hasher.update_u8(w.current as u8);
        hasher.update_u8(w.previous as u8);
        hasher.update_u8(w.selection as u8);
        for slot in w.slots {
            hasher.update_u8(slot as u8);
        }
        hasher.update_u16(w.available.bits());
        hasher.update_u16(w.available_charge.bits());
        hasher.update_bool(w.affinity_variant);
        hasher.update_u16(w.charge_level);
        hasher.update_u8(w.gun_animation as u8);
        hasher.update_u16(w.gun_animation_ticks);
        hasher.update_u16(w.time_since_shot);
        for ty in [AmmoType::Ua, AmmoType::Missiles] {
            hasher.update_u16(w.ammo.get(ty));
            hasher.update_u16(w.ammo.max(ty));
            hasher.update_u16(w.ammo.recovery[ty as usize]);
        }

        let t = &self.timers;
        for timer in [
            t.frozen, t.frozen_gfx, t.time_since_frozen, t.burn, t.disrupted, t.cloak,
            t.double_damage, t.death_alt, t.spawn_invuln, t.damage_invuln, t.respawn,
        ] {
            hasher.update_u16(timer);
        }
        hasher.update_fixed(self.fade.alpha);
        hasher.update_fixed(self.fade.target);

        let b = &self.body;
        hasher.update_vec3(b.position);
        hasher.update_vec3(b.speed);
        hasher.update_vec3(b.facing);
        hasher.update_bool(b.grounded);
        hasher.update_u16(b.jump_pad_lock);

        hasher.update_u8(self.buttons);
        hasher.update_u16(self.kills);
        hasher.update_u16(self.deaths);
        hasher.update_u16(self.time_since_death);
    }
}

impl Simulated for Combatant {
    fn body(&self) -> &Body {
        &self.body
    }

    fn body_mut(&mut self) -> &mut Body {
        &mut self.body
    }

    fn collision_shape(&self) -> CollisionShape {
        let values = self.hunter.values();
        match self.form {
            BodyForm::Biped => CollisionShape {
                center_y: values.biped_col_radius,
                radius: values.biped_col_radius,
            },
            BodyForm::Alt => CollisionShape {
                center_y: values.alt_col_y,
                radius: values.alt_col_radius,
            },
        }
    }

    fn step_physics(&mut self, intent: MoveIntent, world: &dyn CollisionService) {
        let values = self.hunter.values();
        let steering = self.phase == Phase::Alive && self.form == BodyForm::Biped;
        if steering {
            self.body.accelerate(values, intent);
        }
        let jump = (steering && intent.jump).then_some(values.jump_speed);
        self.body.apply_vertical(values.biped_gravity, jump);
        let shape = self.collision_shape();
        self.body.integrate(shape, world);
    }
}

impl Drawable for Combatant {
    fn draw_state(&self) -> DrawState {
        let def = self.weapons.active_def();
        let pool = def.ammo_type();
        DrawState {
            id: self.id,
            hunter: self.hunter,
            phase: self.phase,
            form: self.form,
            position: self.body.position,
            facing: self.body.facing,
            health: self.health,
            health_max: self.health_max,
            weapon: self.weapons.current,
            ammo: self.weapons.ammo.get(pool),
            ammo_max: self.weapons.ammo.max(pool),
            charge_level: self.weapons.charge_level,
            gun_animation: self.weapons.gun_animation,
            hit_reaction: self.hit_reaction,
            alpha: self.fade.alpha,
            frozen: self.timers.is_frozen(),
            frozen_gfx: self.timers.frozen_gfx > 0,
            disrupted: self.timers.disrupted > 0,
            cloaked: self.timers.cloak > 0,
            double_damage: self.timers.double_damage > 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::hash::StateHasher;

    fn alive() -> Combatant {
        let mut c = Combatant::new(CombatantId(1), Hunter::Kanden, 0, false);
        c.phase = Phase::Alive;
        c.health_max = 199;
        c.health = 99;
        c
    }

    #[test]
    fn test_new_combatant_waits_to_spawn() {
        let c = Combatant::new(CombatantId(0), Hunter::Spire, 1, true);
        assert!(!c.is_alive());
        assert_eq!(c.timers.respawn, 0);
        assert_eq!(c.health, 0);
    }

    #[test]
    fn test_gain_health_caps() {
        let mut c = alive();
        c.gain_health(500);
        assert_eq!(c.health, 199);
    }

    #[test]
    fn test_health_recovery_every_other_tick() {
        let mut c = alive();
        c.health_recovery = 5;
        let mut seen = Vec::new();
        for _ in 0..5 {
            c.step_recovery();
            seen.push(c.health);
        }
        assert_eq!(seen, vec![99, 102, 102, 104, 104]);
        assert_eq!(c.health_recovery, 0);
    }

    #[test]
    fn test_morph_cycle() {
        let mut c = alive();
        assert!(c.start_morph());
        assert!(!c.can_fire());
        for _ in 0..MORPH_TICKS {
            c.step_morph();
        }
        assert_eq!(c.phase, Phase::Alive);
        assert_eq!(c.form, BodyForm::Alt);

        assert!(c.start_morph());
        assert!(matches!(c.phase, Phase::Unmorphing { .. }));
        for _ in 0..MORPH_TICKS {
            c.step_morph();
        }
        assert_eq!(c.form, BodyForm::Biped);
    }

    #[test]
    fn test_frozen_cannot_morph() {
        let mut c = alive();
        c.timers.frozen = 10;
        assert!(!c.start_morph());
        assert_eq!(c.phase, Phase::Alive);
    }

    #[test]
    fn test_equip_denial_reports_feedback_only() {
        let mut c = alive();
        let before = c.clone();
        let mut sink = EventSink::new(0, 0);
        assert!(!c.try_equip_weapon(BeamType::Judicator, false, false, &mut sink));
        assert_eq!(c, before);
        assert!(sink
            .events()
            .iter()
            .any(|e| matches!(e.data, SimEventData::EquipDenied { .. })));
    }

    #[test]
    fn test_hash_tracks_health() {
        let a = alive();
        let mut b = alive();
        b.health -= 1;
        let hash = |c: &Combatant| {
            let mut h = StateHasher::for_sim_state();
            c.hash_into(&mut h);
            h.finalize()
        };
        assert_eq!(hash(&a), hash(&a.clone()));
        assert_ne!(hash(&a), hash(&b));
    }

    #[test]
    fn test_draw_state_reads_active_pool() {
        let mut c = alive();
        c.weapons.ammo.set_max(AmmoType::Missiles, 400);
        c.weapons.ammo.set(AmmoType::Missiles, 70);
        c.weapons.current = BeamType::Missile;
        let draw = c.draw_state();
        assert_eq!(draw.ammo, 70);
        assert_eq!(draw.ammo_max, 400);
        assert_eq!(draw.alpha, crate::core::fixed::FIXED_ONE);
    }
}
