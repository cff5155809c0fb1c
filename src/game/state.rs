//! Simulation State
//!
//! The combatant arena plus the small slice of world the combatants touch:
//! spawn points and loose items. Combatants are addressed by [`CombatantId`],
//! which is their index in the arena and never changes during a session.
//! Items use BTreeMap for deterministic iteration order.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Serialize, Deserialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::{ConfigError, SimConfig};
use crate::core::hash::{StateHash, compute_state_hash};
use crate::core::time::Ticks;
use crate::core::vec3::FixedVec3;
use crate::game::combatant::{Combatant, CombatantId, Damageable};
use crate::game::damage::{AttackerInfo, DamageOutcome, Hit, ResolvedHit, resolve_amount};
use crate::game::events::{EventSink, SimEventData, SoundCue};
use crate::game::hunter::Hunter;
use crate::game::pickup::{ItemInstance, ItemType, apply_item};
use crate::game::respawn::SpawnPoint;

// =============================================================================
// ERRORS
// =============================================================================

/// Session setup and snapshot errors.
#[derive(Debug, Error)]
pub enum SimError {
    /// Every combatant slot is taken.
    #[error("all {0} combatant slots are taken")]
    SlotsFull(u8),
    /// No combatant with this handle.
    #[error("unknown combatant {0:?}")]
    UnknownCombatant(CombatantId),
    /// Snapshot could not be encoded or decoded.
    #[error("snapshot codec failed: {0}")]
    Snapshot(#[from] bincode::Error),
    /// Configuration rejected.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

// =============================================================================
// SIM STATE
// =============================================================================

/// Complete state of a session.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SimState {
    /// Ticks simulated so far
    pub tick: u32,

    /// Session rules
    pub config: SimConfig,

    /// Arena (index == CombatantId)
    pub combatants: Vec<Combatant>,

    /// Slots handed back to the registry; never processed again
    pub retired: BTreeSet<CombatantId>,

    /// Respawn locations
    pub spawn_points: Vec<SpawnPoint>,

    /// Loose items (BTreeMap for deterministic iteration)
    pub items: BTreeMap<u32, ItemInstance>,

    /// Next item ID (monotonic counter)
    pub next_item_id: u32,

    /// Next visual effect ID (monotonic counter)
    pub next_effect_id: u32,
}

impl SimState {
    /// Create an empty session.
    pub fn new(config: SimConfig) -> Result<Self, SimError> {
        config.validate()?;
        Ok(Self {
            tick: 0,
            config,
            combatants: Vec::new(),
            retired: BTreeSet::new(),
            spawn_points: Vec::new(),
            items: BTreeMap::new(),
            next_item_id: 0,
            next_effect_id: 0,
        })
    }

    /// Add a combatant in the next free slot. It spawns on its first tick.
    pub fn add_combatant(&mut self, hunter: Hunter, team: u8, is_bot: bool) -> Result<CombatantId, SimError> {
        if self.combatants.len() >= self.config.max_slots as usize {
            return Err(SimError::SlotsFull(self.config.max_slots));
        }
        let id = CombatantId(self.combatants.len() as u8);
        let mut combatant = Combatant::new(id, hunter, team, is_bot);
        combatant.is_main_player = id.0 == 0 && !is_bot;
        self.combatants.push(combatant);
        debug!(combatant = id.0, ?hunter, team, is_bot, "combatant added");
        Ok(id)
    }

    /// Hand a slot back to the registry. Its next tick reports it as reclaimable.
    pub fn retire(&mut self, id: CombatantId) -> Result<(), SimError> {
        self.combatant(id)?;
        self.retired.insert(id);
        Ok(())
    }

    /// Whether a slot is still simulated.
    #[inline]
    pub fn is_retired(&self, id: CombatantId) -> bool {
        self.retired.contains(&id)
    }

    /// Get a combatant by handle.
    pub fn get(&self, id: CombatantId) -> Option<&Combatant> {
        self.combatants.get(id.0 as usize)
    }

    /// Get a combatant mutably by handle.
    pub fn get_mut(&mut self, id: CombatantId) -> Option<&mut Combatant> {
        self.combatants.get_mut(id.0 as usize)
    }

    /// Get a combatant or report the unknown handle.
    pub fn combatant(&self, id: CombatantId) -> Result<&Combatant, SimError> {
        self.get(id).ok_or(SimError::UnknownCombatant(id))
    }

    /// Get a combatant mutably or report the unknown handle.
    pub fn combatant_mut(&mut self, id: CombatantId) -> Result<&mut Combatant, SimError> {
        self.get_mut(id).ok_or(SimError::UnknownCombatant(id))
    }

    /// Register a spawn point. Returns its ID.
    pub fn add_spawn_point(&mut self, position: FixedVec3, facing: FixedVec3, team: Option<u8>) -> u16 {
        let id = self.spawn_points.len() as u16;
        let mut point = SpawnPoint::new(id, position, facing);
        point.team = team;
        self.spawn_points.push(point);
        id
    }

    /// Place a permanent item.
    pub fn spawn_item(&mut self, item_type: ItemType, position: FixedVec3) -> u32 {
        let id = self.next_item_id;
        self.next_item_id += 1;
        self.items.insert(id, ItemInstance::new(id, item_type, position));
        id
    }

    /// Place an item that expires.
    pub fn drop_item(&mut self, item_type: ItemType, position: FixedVec3) -> u32 {
        let id = self.next_item_id;
        self.next_item_id += 1;
        self.items.insert(id, ItemInstance::dropped(id, item_type, position));
        id
    }

    /// Positions of every living, simulated combatant in handle order.
    pub fn live_positions(&self) -> Vec<FixedVec3> {
        self.combatants
            .iter()
            .filter(|c| c.is_alive() && !self.is_retired(c.id))
            .map(|c| c.body.position)
            .collect()
    }

    /// Deliver a hit to a combatant.
    ///
    /// Resolves the amount against the attacker still in the arena, applies
    /// it to the victim, credits the kill and places the death drop.
    /// Unknown victims are logged and ignored.
    pub fn take_damage(&mut self, victim: CombatantId, hit: Hit, sink: &mut EventSink) -> DamageOutcome {
        let rules = self.config.damage_rules();
        let Some(target) = self.get(victim) else {
            warn!(victim = victim.0, "hit for unknown combatant");
            return DamageOutcome::Ignored;
        };
        let attacker = hit.source.attacker().and_then(|id| self.get(id));
        let resolved = ResolvedHit {
            amount: resolve_amount(&hit, target, attacker, &rules),
            flags: hit.flags,
            afflictions: hit.afflictions,
            direction: hit.direction,
            attacker: attacker.map(AttackerInfo::of),
        };

        let outcome = match self.get_mut(victim) {
            Some(target) => target.take_damage(&resolved, &rules, sink),
            None => DamageOutcome::Ignored,
        };

        if let DamageOutcome::Killed { killer, drop } = outcome {
            if let Some(killer) = killer.filter(|k| *k != victim) {
                if let Some(c) = self.get_mut(killer) {
                    c.kills = c.kills.saturating_add(1);
                }
            }
            if let Some((item_type, position)) = drop {
                let item_id = self.drop_item(item_type, position);
                sink.push(SimEventData::ItemDropped { item_id, item_type, position });
            }
        }
        outcome
    }

    /// Apply an item directly, as a scripted pickup would.
    pub fn give_item(&mut self, id: CombatantId, item_type: ItemType, sink: &mut EventSink) -> Result<(), SimError> {
        let single_player = self.config.is_single_player();
        let amounts = self.config.pickups.clone();
        let c = self.combatant_mut(id)?;
        apply_item(c, item_type, &amounts, single_player, sink);
        Ok(())
    }

    /// Launch a combatant off a jump pad.
    pub fn activate_jump_pad(
        &mut self,
        id: CombatantId,
        velocity: FixedVec3,
        lock: Ticks,
        sink: &mut EventSink,
    ) -> Result<(), SimError> {
        self.combatant_mut(id)?.body.activate_jump_pad(velocity, lock);
        sink.sound(id, SoundCue::JumpPad);
        Ok(())
    }

    /// Compute hash of current state for verification.
    pub fn compute_hash(&self) -> StateHash {
        compute_state_hash(self.tick, |hasher| {
            // Arena in handle order
            for combatant in &self.combatants {
                combatant.hash_into(hasher);
                hasher.update_bool(self.is_retired(combatant.id));
            }

            for point in &self.spawn_points {
                hasher.update_u16(point.id);
                hasher.update_vec3(point.position);
                hasher.update_bool(point.active);
                hasher.update_u16(point.cooldown);
            }

            // BTreeMap iterates by item ID
            for (item_id, item) in &self.items {
                hasher.update_u32(*item_id);
                hasher.update_u16(item.item_type.code());
                hasher.update_vec3(item.position);
                hasher.update_u16(item.lifetime.unwrap_or(Ticks::MAX));
            }

            hasher.update_u32(self.next_item_id);
            hasher.update_u32(self.next_effect_id);
        })
    }

    /// Encode the whole state for rollback or save-state.
    pub fn snapshot(&self) -> Result<Vec<u8>, SimError> {
        Ok(bincode::serialize(self)?)
    }

    /// Decode a snapshot.
    pub fn restore(bytes: &[u8]) -> Result<Self, SimError> {
        let state: SimState = bincode::deserialize(bytes)?;
        state.config.validate()?;
        Ok(state)
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GameMode;
    use crate::game::combatant::Phase;
    use crate::game::damage::{DamageFlags, DamageSource};
    use crate::game::weapon::{AmmoType, BeamType};

    fn versus(count: u8) -> SimState {
        let mut state = SimState::new(SimConfig::default()).unwrap();
        for i in 0..count {
            let id = state.add_combatant(Hunter::from_index(i).unwrap(), i, false).unwrap();
            let c = state.get_mut(id).unwrap();
            c.phase = Phase::Alive;
            c.health_max = 199;
            c.health = 99;
            c.body.position = FixedVec3::from_ints(i as i32 * 4, 0, 0);
        }
        state
    }

    #[test]
    fn test_slots_are_bounded() {
        let mut state = versus(4);
        let err = state.add_combatant(Hunter::Samus, 0, false).unwrap_err();
        assert!(matches!(err, SimError::SlotsFull(4)));
    }

    #[test]
    fn test_first_human_is_main_player() {
        let state = versus(2);
        assert!(state.get(CombatantId(0)).unwrap().is_main_player);
        assert!(!state.get(CombatantId(1)).unwrap().is_main_player);
    }

    #[test]
    fn test_unknown_handle() {
        let mut state = versus(1);
        assert!(state.get(CombatantId(3)).is_none());
        assert!(matches!(
            state.retire(CombatantId(3)),
            Err(SimError::UnknownCombatant(CombatantId(3)))
        ));
        let mut sink = EventSink::new(0, 0);
        let outcome = state.take_damage(CombatantId(9), Hit::new(10, DamageFlags::NONE), &mut sink);
        assert_eq!(outcome, DamageOutcome::Ignored);
    }

    #[test]
    fn test_kill_credits_attacker_and_drops_ammo() {
        let mut state = versus(2);
        state.get_mut(CombatantId(1)).unwrap().weapons.current = BeamType::Missile;
        let mut sink = EventSink::new(0, 0);
        let hit = Hit::new(200, DamageFlags::NONE).from_source(DamageSource::Projectile {
            owner: Some(CombatantId(1)),
            beam: BeamType::Missile,
        });
        let outcome = state.take_damage(CombatantId(0), hit, &mut sink);

        assert!(matches!(outcome, DamageOutcome::Killed { killer: Some(CombatantId(1)), .. }));
        assert_eq!(state.get(CombatantId(1)).unwrap().kills, 1);
        assert_eq!(state.get(CombatantId(0)).unwrap().deaths, 1);
        assert_eq!(state.items.len(), 1);
        let item = state.items.values().next().unwrap();
        assert_eq!(item.item_type, ItemType::MissileSmall);
        assert!(item.lifetime.is_some());
        assert!(sink
            .events()
            .iter()
            .any(|e| matches!(e.data, SimEventData::ItemDropped { item_type: ItemType::MissileSmall, .. })));
    }

    #[test]
    fn test_hazard_death_has_no_credit() {
        let mut state = versus(2);
        let mut sink = EventSink::new(0, 0);
        let outcome = state.take_damage(
            CombatantId(0),
            Hit::new(0, DamageFlags::DEATH).from_source(DamageSource::Hazard),
            &mut sink,
        );
        assert!(matches!(outcome, DamageOutcome::Killed { killer: None, drop: None }));
        assert!(state.items.is_empty());
        assert_eq!(state.get(CombatantId(1)).unwrap().kills, 0);
    }

    #[test]
    fn test_live_positions_skip_dead_and_retired() {
        let mut state = versus(3);
        state.get_mut(CombatantId(1)).unwrap().phase = Phase::Dead;
        state.retire(CombatantId(2)).unwrap();
        assert_eq!(state.live_positions(), vec![FixedVec3::ZERO]);
    }

    #[test]
    fn test_give_item() {
        let mut state = versus(1);
        let mut sink = EventSink::new(0, 0);
        state.get_mut(CombatantId(0)).unwrap().weapons.ammo.set_max(AmmoType::Ua, 400);
        state.give_item(CombatantId(0), ItemType::UaBig, &mut sink).unwrap();
        assert_eq!(state.get(CombatantId(0)).unwrap().weapons.ammo.get(AmmoType::Ua), 100);
    }

    #[test]
    fn test_jump_pad_hook() {
        let mut state = versus(1);
        let mut sink = EventSink::new(0, 0);
        let launch = FixedVec3::from_ints(0, 1, 1);
        state.activate_jump_pad(CombatantId(0), launch, 2, &mut sink).unwrap();
        let body = &state.get(CombatantId(0)).unwrap().body;
        assert_eq!(body.speed, launch);
        assert_eq!(body.jump_pad_lock, crate::game::movement::JUMP_PAD_MIN_LOCK);
        assert!(!body.grounded);
        assert!(state.activate_jump_pad(CombatantId(5), launch, 2, &mut sink).is_err());
    }

    #[test]
    fn test_hash_changes_with_items() {
        let mut state = versus(2);
        let before = state.compute_hash();
        assert_eq!(before, state.clone().compute_hash());
        state.spawn_item(ItemType::HealthBig, FixedVec3::from_ints(1, 0, 1));
        assert_ne!(before, state.compute_hash());
    }

    #[test]
    fn test_snapshot_restores_identical_hash() {
        let mut state = versus(2);
        state.add_spawn_point(FixedVec3::from_ints(10, 0, 10), FixedVec3::FORWARD, None);
        state.drop_item(ItemType::UaSmall, FixedVec3::from_ints(2, 0, 2));
        state.tick = 77;

        let bytes = state.snapshot().unwrap();
        let restored = SimState::restore(&bytes).unwrap();
        assert_eq!(restored.compute_hash(), state.compute_hash());
        assert_eq!(restored.combatants, state.combatants);
    }

    #[test]
    fn test_restore_rejects_garbage() {
        assert!(matches!(SimState::restore(&[1, 2, 3]), Err(SimError::Snapshot(_))));
    }

    #[test]
    fn test_new_validates_config() {
        let config = SimConfig { mode: GameMode::SinglePlayer, max_slots: 0, ..SimConfig::default() };
        assert!(matches!(SimState::new(config), Err(SimError::Config(_))));
    }
}
