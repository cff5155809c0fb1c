//! Simulation Events
//!
//! Side-effect requests emitted during a tick for the layers this crate
//! does not own (rendering, audio, HUD, projectile spawning), plus the
//! record used for replay comparison.

use serde::{Serialize, Deserialize};

use crate::core::fixed::Fixed;
use crate::core::vec3::FixedVec3;
use crate::game::combatant::CombatantId;
use crate::game::damage::{Affliction, DamageFlags, HitReaction};
use crate::game::pickup::ItemType;
use crate::game::weapon::{BeamType, EquipDenial, GunAnimation};

/// Priority for event processing order.
///
/// Lower value = processed first.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum EventPriority {
    /// Deaths processed first
    Death = 0,
    /// Then damage
    Damage = 1,
    /// Then respawns
    Respawn = 2,
    /// Then pickups and drops
    Pickup = 3,
    /// Then weapon changes
    Weapon = 4,
    /// Then shots
    Shot = 5,
    /// Visual effects
    Effect = 6,
    /// Lowest priority
    Other = 255,
}

/// Handle to a transient visual effect owned by the renderer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EffectId(pub u32);

/// Kind of transient visual effect.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EffectKind {
    /// Flames that follow a burning combatant
    Burn,
    /// Ice shattering when a freeze ends
    FreezeBreak,
    /// Glow while double damage is active
    DoubleDamage,
    /// Charge glow on the gun
    Charge,
    /// Biped death burst
    DeathBiped,
    /// Alt-form death burst
    DeathAlt,
}

/// Render path that played a freeze break.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ThawView {
    /// Alt-form shell
    AltForm,
    /// First-person (main player)
    FirstPerson,
    /// Third-person biped
    ThirdPerson,
}

/// Audio cue.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SoundCue {
    /// Charge reached min
    ChargeStart,
    /// Charge reached full
    ChargeFull,
    /// Charge dropped below min
    ChargeCancel,
    /// Denied weapon switch
    EquipDenied,
    /// Ice broke
    Thaw,
    /// Death cry (single-player)
    DeathSinglePlayer,
    /// Death cry (multiplayer)
    DeathMultiplayer,
    /// Picked up an item
    Pickup,
    /// Jump pad launch
    JumpPad,
}

/// Event data.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum SimEventData {
    /// Combatant took damage and survived
    Damaged {
        victim: CombatantId,
        attacker: Option<CombatantId>,
        amount: u16,
        health: u16,
        flags: DamageFlags,
        reaction: Option<HitReaction>,
    },

    /// Combatant died
    Died {
        victim: CombatantId,
        killer: Option<CombatantId>,
        alt_form: bool,
    },

    /// Combatant respawned
    Respawned {
        combatant: CombatantId,
        spawn_point: u16,
        position: FixedVec3,
    },

    /// Respawn was allowed but no spawn point was eligible
    RespawnDeferred {
        combatant: CombatantId,
    },

    /// Item consumed
    ItemPickedUp {
        combatant: CombatantId,
        item_id: u32,
        item_type: ItemType,
    },

    /// Item dropped into the world
    ItemDropped {
        item_id: u32,
        item_type: ItemType,
        position: FixedVec3,
    },

    /// Weapon equipped
    WeaponEquipped {
        combatant: CombatantId,
        beam: BeamType,
        previous: BeamType,
        animation: Option<GunAnimation>,
    },

    /// Equip refused
    EquipDenied {
        combatant: CombatantId,
        beam: BeamType,
        reason: EquipDenial,
    },

    /// Projectile spawn request
    ShotFired {
        combatant: CombatantId,
        beam: BeamType,
        charge: Fixed,
        afflictions: Affliction,
        origin: FixedVec3,
        direction: FixedVec3,
    },

    /// Trigger pulled with an empty pool
    ShotEmpty {
        combatant: CombatantId,
        beam: BeamType,
    },

    /// Visual effect spawned
    EffectSpawned {
        combatant: CombatantId,
        effect: EffectId,
        kind: EffectKind,
        position: FixedVec3,
    },

    /// Tracked effect moved with its owner
    EffectMoved {
        effect: EffectId,
        position: FixedVec3,
        facing: FixedVec3,
    },

    /// Visual effect removed
    EffectEnded {
        effect: EffectId,
    },

    /// Freeze ended
    Thawed {
        combatant: CombatantId,
        view: ThawView,
    },

    /// Camera shake request
    CameraShake {
        combatant: CombatantId,
        amount: Fixed,
    },

    /// Audio request
    Sound {
        combatant: CombatantId,
        cue: SoundCue,
    },
}

/// An event with timing and priority.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SimEvent {
    /// Tick when event occurred
    pub tick: u32,

    /// Processing priority
    pub priority: EventPriority,

    /// Combatant involved (for tie-breaking)
    pub combatant: Option<CombatantId>,

    /// Event data
    pub data: SimEventData,
}

impl SimEvent {
    /// Create a new event. Priority and combatant are derived from the data.
    pub fn new(tick: u32, data: SimEventData) -> Self {
        let (priority, combatant) = match &data {
            SimEventData::Died { victim, .. } => (EventPriority::Death, Some(*victim)),
            SimEventData::Damaged { victim, .. } => (EventPriority::Damage, Some(*victim)),
            SimEventData::Respawned { combatant, .. }
            | SimEventData::RespawnDeferred { combatant } => (EventPriority::Respawn, Some(*combatant)),
            SimEventData::ItemPickedUp { combatant, .. } => (EventPriority::Pickup, Some(*combatant)),
            SimEventData::ItemDropped { .. } => (EventPriority::Pickup, None),
            SimEventData::WeaponEquipped { combatant, .. }
            | SimEventData::EquipDenied { combatant, .. } => (EventPriority::Weapon, Some(*combatant)),
            SimEventData::ShotFired { combatant, .. }
            | SimEventData::ShotEmpty { combatant, .. } => (EventPriority::Shot, Some(*combatant)),
            SimEventData::EffectSpawned { combatant, .. }
            | SimEventData::Thawed { combatant, .. } => (EventPriority::Effect, Some(*combatant)),
            SimEventData::EffectMoved { .. } | SimEventData::EffectEnded { .. } => (EventPriority::Effect, None),
            SimEventData::CameraShake { combatant, .. }
            | SimEventData::Sound { combatant, .. } => (EventPriority::Other, Some(*combatant)),
        };

        Self {
            tick,
            priority,
            combatant,
            data,
        }
    }
}

impl PartialEq for SimEvent {
    fn eq(&self, other: &Self) -> bool {
        self.tick == other.tick
            && self.priority == other.priority
            && self.combatant == other.combatant
    }
}

impl Eq for SimEvent {}

impl PartialOrd for SimEvent {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for SimEvent {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        // Sort by: tick, then priority, then combatant
        self.tick
            .cmp(&other.tick)
            .then(self.priority.cmp(&other.priority))
            .then(self.combatant.cmp(&other.combatant))
    }
}

// =============================================================================
// EVENT SINK
// =============================================================================

/// Collects events for one tick and hands out effect handles.
#[derive(Debug)]
pub struct EventSink {
    tick: u32,
    events: Vec<SimEvent>,
    next_effect: u32,
}

impl EventSink {
    /// Create a sink for `tick`. `next_effect` continues the handle sequence.
    pub fn new(tick: u32, next_effect: u32) -> Self {
        Self {
            tick,
            events: Vec::new(),
            next_effect,
        }
    }

    /// Tick the sink collects for.
    #[inline]
    pub fn tick(&self) -> u32 {
        self.tick
    }

    /// Record an event.
    #[inline]
    pub fn push(&mut self, data: SimEventData) {
        self.events.push(SimEvent::new(self.tick, data));
    }

    /// Request a visual effect and return its handle.
    pub fn spawn_effect(&mut self, combatant: CombatantId, kind: EffectKind, position: FixedVec3) -> EffectId {
        let effect = EffectId(self.next_effect);
        self.next_effect = self.next_effect.wrapping_add(1);
        self.push(SimEventData::EffectSpawned { combatant, effect, kind, position });
        effect
    }

    /// Request removal of an effect, if one is held.
    pub fn end_effect(&mut self, effect: &mut Option<EffectId>) {
        if let Some(effect) = effect.take() {
            self.push(SimEventData::EffectEnded { effect });
        }
    }

    /// Request a sound.
    #[inline]
    pub fn sound(&mut self, combatant: CombatantId, cue: SoundCue) {
        self.push(SimEventData::Sound { combatant, cue });
    }

    /// Events recorded so far, in emission order.
    pub fn events(&self) -> &[SimEvent] {
        &self.events
    }

    /// Consume the sink: events in stable order plus the next effect handle.
    pub fn finish(mut self) -> (Vec<SimEvent>, u32) {
        // Stable sort keeps emission order within equal keys
        self.events.sort();
        (self.events, self.next_effect)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_ordering() {
        let a = CombatantId(0);
        let b = CombatantId(1);

        let death_a = SimEvent::new(10, SimEventData::Died { victim: a, killer: Some(b), alt_form: false });
        let pickup_a = SimEvent::new(
            10,
            SimEventData::ItemPickedUp { combatant: a, item_id: 3, item_type: ItemType::HealthSmall },
        );
        let death_b = SimEvent::new(10, SimEventData::Died { victim: b, killer: None, alt_form: true });

        // Same tick, but death < pickup
        assert!(death_a < pickup_a);

        // Same tick and priority, lower handle first
        assert!(death_a < death_b);
    }

    #[test]
    fn test_sink_effect_handles_continue() {
        let mut sink = EventSink::new(5, 41);
        let first = sink.spawn_effect(CombatantId(0), EffectKind::Burn, FixedVec3::ZERO);
        let second = sink.spawn_effect(CombatantId(1), EffectKind::Charge, FixedVec3::ZERO);
        assert_eq!(first, EffectId(41));
        assert_eq!(second, EffectId(42));

        let mut held = Some(first);
        sink.end_effect(&mut held);
        sink.end_effect(&mut held);
        assert_eq!(held, None);

        let (events, next) = sink.finish();
        assert_eq!(next, 43);
        let ended = events
            .iter()
            .filter(|e| matches!(e.data, SimEventData::EffectEnded { .. }))
            .count();
        assert_eq!(ended, 1);
    }

    #[test]
    fn test_sink_sorts_stably() {
        let mut sink = EventSink::new(1, 0);
        sink.sound(CombatantId(2), SoundCue::Pickup);
        sink.push(SimEventData::Died { victim: CombatantId(3), killer: None, alt_form: false });
        sink.sound(CombatantId(2), SoundCue::Thaw);
        let (events, _) = sink.finish();
        assert!(matches!(events[0].data, SimEventData::Died { .. }));
        assert!(matches!(events[1].data, SimEventData::Sound { cue: SoundCue::Pickup, .. }));
        assert!(matches!(events[2].data, SimEventData::Sound { cue: SoundCue::Thaw, .. }));
    }
}
