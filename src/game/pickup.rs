//! Item Pickups
//!
//! Proximity tests per form and the effect of every item category.
//! Each consumed item reports [`ItemInstance::consume`] exactly once and is
//! then removed from the world.

use std::collections::BTreeMap;

use serde::{Serialize, Deserialize};
use tracing::debug;

use crate::config::PickupAmounts;
use crate::core::fixed::{Fixed, fixed_mul_sat, to_fixed};
use crate::core::time::{Ticks, count_down};
use crate::core::vec3::FixedVec3;
use crate::game::combatant::{BodyForm, Combatant};
use crate::game::events::{EffectKind, EventSink, SimEventData, SoundCue};
use crate::game::hunter::Hunter;
use crate::game::timers::{BUFF_DURATION, CLOAK_ALPHA};
use crate::game::weapon::{AmmoType, BeamType, AFFINITY_SLOT, weapon_def};

/// Item collision radius
pub const ITEM_RADIUS: Fixed = to_fixed(0.5);

/// Lifetime of an item dropped on death
pub const DROP_LIFETIME: Ticks = 600;

/// UA cap increase per expansion
pub const UA_EXPANSION: u16 = 300;
/// Missile cap increase per expansion
pub const MISSILE_EXPANSION: u16 = 100;

/// Item category.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ItemType {
    HealthSmall,
    HealthMedium,
    HealthBig,
    UaSmall,
    UaBig,
    MissileSmall,
    MissileBig,
    /// Raises max health by one tank
    EnergyTank,
    UaExpansion,
    MissileExpansion,
    DoubleDamage,
    Cloak,
    DeathAlt,
    /// A specific weapon
    Weapon(BeamType),
    /// Whatever the collector's affinity weapon is
    AffinityWeapon,
}

impl ItemType {
    /// Stable numeric code for hashing. Weapons carry their beam in the low byte.
    pub fn code(self) -> u16 {
        match self {
            ItemType::HealthSmall => 0,
            ItemType::HealthMedium => 1,
            ItemType::HealthBig => 2,
            ItemType::UaSmall => 3,
            ItemType::UaBig => 4,
            ItemType::MissileSmall => 5,
            ItemType::MissileBig => 6,
            ItemType::EnergyTank => 7,
            ItemType::UaExpansion => 8,
            ItemType::MissileExpansion => 9,
            ItemType::DoubleDamage => 10,
            ItemType::Cloak => 11,
            ItemType::DeathAlt => 12,
            ItemType::Weapon(beam) => 0x100 | beam as u16,
            ItemType::AffinityWeapon => 13,
        }
    }
}

/// An item lying in the world.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemInstance {
    pub id: u32,
    pub item_type: ItemType,
    pub position: FixedVec3,
    /// Ticks until the item disappears (None = permanent)
    pub lifetime: Option<Ticks>,
    picked_up: bool,
}

impl ItemInstance {
    /// Create a permanent item.
    pub fn new(id: u32, item_type: ItemType, position: FixedVec3) -> Self {
        Self {
            id,
            item_type,
            position,
            lifetime: None,
            picked_up: false,
        }
    }

    /// Create an item that expires.
    pub fn dropped(id: u32, item_type: ItemType, position: FixedVec3) -> Self {
        Self {
            lifetime: Some(DROP_LIFETIME),
            ..Self::new(id, item_type, position)
        }
    }

    /// One-shot pickup transition. Returns true only the first time.
    pub fn consume(&mut self) -> bool {
        if self.picked_up {
            return false;
        }
        self.picked_up = true;
        true
    }

    /// Whether the item has been consumed.
    #[inline]
    pub fn is_picked_up(&self) -> bool {
        self.picked_up
    }

    /// Advance the lifetime. Returns true once it runs out.
    pub fn step_lifetime(&mut self) -> bool {
        match &mut self.lifetime {
            Some(ticks) => count_down(ticks) || *ticks == 0,
            None => false,
        }
    }
}

/// Whether `item` is within reach of `c` in its current form.
pub fn in_reach(c: &Combatant, item: FixedVec3) -> bool {
    let values = c.hunter.values();
    let pos = c.body.position;
    match c.form {
        BodyForm::Alt => {
            let center = pos.with_y(pos.y.wrapping_add(values.alt_col_y));
            let reach = values.alt_col_radius + ITEM_RADIUS;
            center.distance_squared(item) <= fixed_mul_sat(reach, reach)
        }
        BodyForm::Biped => {
            let reach = values.biped_col_radius + ITEM_RADIUS;
            let lateral = (item - pos).horizontal_length_squared();
            let dy = item.y.wrapping_sub(pos.y);
            lateral <= fixed_mul_sat(reach, reach)
                && dy >= values.min_pickup_height
                && dy <= values.max_pickup_height
        }
    }
}

/// Collect every item in reach.
pub fn pick_up_items(
    c: &mut Combatant,
    items: &mut BTreeMap<u32, ItemInstance>,
    amounts: &PickupAmounts,
    single_player: bool,
    sink: &mut EventSink,
) {
    if !c.is_alive() || (c.is_bot && single_player) || c.pickups_suppressed {
        return;
    }
    for item in items.values_mut() {
        if item.is_picked_up() || !in_reach(c, item.position) || !accepts(c, item.item_type) {
            continue;
        }
        if !item.consume() {
            continue;
        }
        apply_item(c, item.item_type, amounts, single_player, sink);
        sink.sound(c.id, SoundCue::Pickup);
        sink.push(SimEventData::ItemPickedUp {
            combatant: c.id,
            item_id: item.id,
            item_type: item.item_type,
        });
        debug!(combatant = c.id.0, item = item.id, item_type = ?item.item_type, "item picked up");
    }
    items.retain(|_, item| !item.is_picked_up());
}

/// Whether a combatant may take an item at all. Refused items stay in the world.
pub fn accepts(c: &Combatant, item_type: ItemType) -> bool {
    match item_type {
        ItemType::HealthSmall | ItemType::HealthMedium | ItemType::HealthBig => !c.prime,
        ItemType::EnergyTank | ItemType::UaExpansion | ItemType::MissileExpansion => !c.is_bot,
        _ => true,
    }
}

/// Apply an item's effect. Returns false if the combatant refuses it.
pub fn apply_item(
    c: &mut Combatant,
    item_type: ItemType,
    amounts: &PickupAmounts,
    single_player: bool,
    sink: &mut EventSink,
) -> bool {
    if !accepts(c, item_type) {
        return false;
    }
    match item_type {
        ItemType::HealthSmall => c.gain_health(amounts.health_small),
        ItemType::HealthMedium => c.gain_health(amounts.health_medium),
        ItemType::HealthBig => c.gain_health(amounts.health_big),
        ItemType::UaSmall => c.weapons.ammo.add(AmmoType::Ua, amounts.ammo_small),
        ItemType::UaBig => c.weapons.ammo.add(AmmoType::Ua, amounts.ammo_big),
        ItemType::MissileSmall => c.weapons.ammo.add(AmmoType::Missiles, amounts.ammo_small),
        ItemType::MissileBig => c.weapons.ammo.add(AmmoType::Missiles, amounts.ammo_big),
        ItemType::EnergyTank => {
            c.health_max = c.health_max.saturating_add(c.hunter.values().energy_tank);
            c.health_recovery = c.health_max - c.health;
        }
        ItemType::UaExpansion => expand(c, AmmoType::Ua, UA_EXPANSION),
        ItemType::MissileExpansion => expand(c, AmmoType::Missiles, MISSILE_EXPANSION),
        ItemType::DoubleDamage => {
            c.timers.double_damage = BUFF_DURATION;
            if c.effects.double_damage.is_none() {
                c.effects.double_damage = Some(sink.spawn_effect(c.id, EffectKind::DoubleDamage, c.body.position));
            }
        }
        ItemType::Cloak => {
            c.timers.cloak = BUFF_DURATION;
            c.fade.target = CLOAK_ALPHA;
        }
        ItemType::DeathAlt => c.timers.death_alt = BUFF_DURATION,
        ItemType::Weapon(beam) => pick_up_weapon(c, beam, amounts, single_player, sink),
        ItemType::AffinityWeapon => match c.hunter {
            Hunter::Samus | Hunter::Guardian => {
                c.weapons.ammo.add(AmmoType::Missiles, amounts.affinity_missile_bonus);
            }
            hunter => pick_up_weapon(c, hunter.affinity_beam(), amounts, single_player, sink),
        },
    }
    true
}

fn expand(c: &mut Combatant, ty: AmmoType, by: u16) {
    let ammo = &mut c.weapons.ammo;
    ammo.set_max(ty, ammo.max(ty).saturating_add(by));
    ammo.recovery[ty as usize] = ammo.max(ty) - ammo.get(ty);
}

/// Unlock a weapon and top up its pool.
///
/// A newly unlocked weapon claims the affinity slot when the slot is empty,
/// when it is the Omega Cannon or the hunter's affinity beam, or when it
/// outranks the slotted weapon. It is also equipped when it outranks the
/// active weapon and fire is not held. A denied equip still binds the slot.
pub fn pick_up_weapon(
    c: &mut Combatant,
    beam: BeamType,
    amounts: &PickupAmounts,
    single_player: bool,
    sink: &mut EventSink,
) {
    if beam.index().is_none() {
        return;
    }

    let def = weapon_def(beam, false);
    let pool = def.ammo_type();
    if beam != BeamType::PowerBeam && c.weapons.ammo.get(pool) < amounts.weapon_ammo_floor {
        c.weapons.ammo.set(pool, amounts.weapon_ammo_floor);
    }

    if c.weapons.available.contains(beam) {
        return;
    }
    c.weapons.unlock(beam);

    let slot = c.weapons.slots[AFFINITY_SLOT];
    let shooting = c.weapons.shooting;
    let favored = beam == BeamType::OmegaCannon || beam == c.hunter.affinity_beam();
    let slot_free = !shooting || c.weapons.current != slot;
    let claims_slot = slot == BeamType::None
        || beam == BeamType::OmegaCannon
        || ((def.priority > weapon_def(slot, false).priority || favored) && slot_free);
    if !claims_slot {
        return;
    }

    if (def.priority > c.weapons.active_def().priority || favored) && !shooting {
        if !c.try_equip_weapon(beam, false, single_player, sink) {
            c.weapons.update_affinity_slot(beam);
        }
    } else if slot_free {
        c.weapons.update_affinity_slot(beam);
    }
}
