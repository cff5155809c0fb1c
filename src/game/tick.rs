//! Per-Frame Orchestrator
//!
//! The core loop that must be 100% deterministic. Each tick runs world
//! upkeep once, then every combatant in handle order through a fixed
//! sequence of steps. Nothing here reads the clock or an RNG.

use std::collections::BTreeMap;

#[cfg(feature = "debug-tracing")]
use tracing::trace;
use tracing::{debug, warn};

use crate::config::SimConfig;
use crate::core::fixed::{FIXED_ONE, to_fixed, Fixed};
use crate::core::hash::StateHash;
use crate::core::time::count_up;
use crate::core::vec3::FixedVec3;
use crate::game::combatant::{BodyForm, CombatantId, Simulated};
use crate::game::damage::{DamageFlags, DamageSource, Hit};
use crate::game::events::{EffectKind, EventSink, SimEvent, SimEventData, SoundCue, ThawView};
use crate::game::hunter::Hunter;
use crate::game::input::{InputFrame, InputRecording};
use crate::game::movement::CollisionService;
use crate::game::pickup::pick_up_items;
use crate::game::respawn::{get_respawn_point, respawn_delay};
use crate::game::state::{SimError, SimState};
use crate::game::weapon::{BeamType, GunAnimation, ShotOutcome};

/// Height of the muzzle above the feet
pub const MUZZLE_HEIGHT: Fixed = to_fixed(1.3);

/// Damage per tick while standing in acid or lava
pub const HAZARD_DAMAGE: u16 = 1;

/// Damage per burn interval
pub const BURN_DAMAGE: u16 = 1;

/// Result of a tick.
#[derive(Debug, Default)]
pub struct TickResult {
    /// Tick that was simulated
    pub tick: u32,
    /// Events generated this tick, ordered by (tick, priority, combatant)
    pub events: Vec<SimEvent>,
    /// Per-slot liveness in handle order. False means the registry may reclaim the slot.
    pub liveness: Vec<bool>,
}

impl TickResult {
    /// Liveness of one slot.
    pub fn is_live(&self, id: CombatantId) -> bool {
        self.liveness.get(id.0 as usize).copied().unwrap_or(false)
    }
}

/// Run one simulation tick.
///
/// # Arguments
///
/// * `state` - The session state (will be mutated)
/// * `inputs` - Combatant inputs for this tick (missing entries are idle)
/// * `world` - Static collision and hazard queries
///
/// # Determinism
///
/// This function is 100% deterministic:
/// - Combatants run in handle order
/// - Uses fixed-point math only
/// - Events are stably sorted before they leave
pub fn tick(
    state: &mut SimState,
    inputs: &BTreeMap<CombatantId, InputFrame>,
    world: &dyn CollisionService,
) -> TickResult {
    let mut sink = EventSink::new(state.tick, state.next_effect_id);

    step_world(state);

    let mut liveness = Vec::with_capacity(state.combatants.len());
    for index in 0..state.combatants.len() {
        let id = CombatantId(index as u8);
        let input = inputs.get(&id).copied().unwrap_or_default();
        liveness.push(step_combatant(state, id, input, world, &mut sink));
    }

    for id in inputs.keys() {
        if state.get(*id).is_none() {
            warn!(combatant = id.0, tick = state.tick, "input for unknown combatant");
        }
    }

    let (events, next_effect) = sink.finish();
    state.next_effect_id = next_effect;
    let result = TickResult { tick: state.tick, events, liveness };
    state.tick += 1;
    result
}

/// Spawn point cooldowns and item lifetimes.
fn step_world(state: &mut SimState) {
    for point in state.spawn_points.iter_mut() {
        point.step_cooldown();
    }
    state.items.retain(|_, item| !item.step_lifetime());
}

/// Advance one combatant through the per-tick sequence.
///
/// Returns the liveness flag for the slot.
fn step_combatant(
    state: &mut SimState,
    id: CombatantId,
    input: InputFrame,
    world: &dyn CollisionService,
    sink: &mut EventSink,
) -> bool {
    if state.is_retired(id) {
        return false;
    }
    let index = id.0 as usize;
    let single_player = state.config.is_single_player();

    // 1. Omega Cannon is dropped the tick after it fires
    {
        let c = &mut state.combatants[index];
        if c.weapons.unequip_omega_pending {
            c.weapons.unequip_omega_pending = false;
            if let Some(beam) = c.weapons.unequip_omega(c.hunter, single_player) {
                let animation = c.weapons.gun_animation;
                sink.push(SimEventData::WeaponEquipped {
                    combatant: id,
                    beam,
                    previous: BeamType::OmegaCannon,
                    animation: (animation != GunAnimation::Idle).then_some(animation),
                });
                debug!(combatant = id.0, ?beam, "omega cannon unequipped");
            }
        }

        // 2. Previous position and speed
        c.body.remember_previous();
    }

    // 3. Respawn
    if !state.combatants[index].is_alive() {
        step_respawn(state, id, input, sink);
        if !state.combatants[index].is_alive() {
            state.combatants[index].buttons = input.buttons;
            return true;
        }
    }

    let c = &mut state.combatants[index];

    // 4. Status timers
    let expired = c.timers.step_status();
    c.weapons.step_shot_clock();
    if expired.cloak {
        c.fade.target = FIXED_ONE;
    }
    #[cfg(feature = "debug-tracing")]
    if expired != Default::default() {
        trace!(combatant = id.0, ?expired, "status timers expired");
    }

    // 5. Alpha
    c.fade.step();

    // 6. Fall back when the active pool runs dry
    if let Some(target) = c.weapons.auto_switch_target() {
        c.try_equip_weapon(target, true, single_player, sink);
    }

    // 7. Freeze, then movement and weapons
    if c.timers.step_freeze() {
        let view = if c.form == BodyForm::Alt {
            ThawView::AltForm
        } else if c.is_main_player {
            ThawView::FirstPerson
        } else {
            ThawView::ThirdPerson
        };
        sink.spawn_effect(id, EffectKind::FreezeBreak, c.body.position);
        sink.sound(id, SoundCue::Thaw);
        sink.push(SimEventData::Thawed { combatant: id, view });
    }
    c.step_morph();
    if c.timers.is_frozen() {
        c.weapons.reset_trigger();
        let values = c.hunter.values();
        c.body.apply_vertical(values.biped_gravity, None);
        let shape = c.collision_shape();
        c.body.integrate(shape, world);
    } else {
        process_input(state, id, input, sink);
        let c = &mut state.combatants[index];
        c.step_physics(input.move_intent(), world);
    }

    let c = &mut state.combatants[index];
    c.buttons = input.buttons;

    // 8. Recovery
    c.step_recovery();

    // 9. Gun animation
    c.weapons.step_gun_animation();

    // 10. Pickups
    pick_up_items(
        &mut state.combatants[index],
        &mut state.items,
        &state.config.pickups,
        single_player,
        sink,
    );

    // 11. Time-since counters
    count_up(&mut state.combatants[index].time_since_death);

    // 12. Hazards and kill height
    step_hazards(state, id, world, sink);

    // 13. Double damage
    let c = &mut state.combatants[index];
    if c.timers.step_double_damage() {
        sink.end_effect(&mut c.effects.double_damage);
    }

    // 14. Burn
    let burn = c.timers.step_burn();
    let owner = c.burn_owner;
    if burn.expired {
        sink.end_effect(&mut c.effects.burn);
        c.burn_owner = None;
    } else if let Some(effect) = c.effects.burn {
        sink.push(SimEventData::EffectMoved {
            effect,
            position: c.body.position,
            facing: c.body.facing,
        });
    }
    if burn.damage_due {
        let hit = Hit::new(
            BURN_DAMAGE,
            DamageFlags::BURN | DamageFlags::IGNORE_INVULN | DamageFlags::NO_DMG_INVULN,
        )
        .from_source(DamageSource::Burn { owner });
        state.take_damage(id, hit, sink);
    }

    true
}

/// Count down the respawn timer and spawn if allowed.
fn step_respawn(state: &mut SimState, id: CombatantId, input: InputFrame, sink: &mut EventSink) {
    let index = id.0 as usize;
    let single_player = state.config.is_single_player();
    let delay = respawn_delay(state.combatants.len(), state.config.survival);

    let c = &mut state.combatants[index];
    count_up(&mut c.time_since_death);
    c.timers.step_respawn();
    if !c.may_respawn(single_player, input.held(InputFrame::BUTTON_FIRE), delay) {
        return;
    }

    let team = state.config.teams.then_some(c.team);
    let live = state.live_positions();
    match get_respawn_point(&mut state.spawn_points, &live, state.tick, team) {
        Some(point) => {
            let point = state.spawn_points[point].clone();
            state.combatants[index].spawn(&point, single_player, sink);
        }
        None => {
            sink.push(SimEventData::RespawnDeferred { combatant: id });
            debug!(combatant = id.0, tick = state.tick, "no spawn point available");
        }
    }
}

/// Aim, morph, weapon selection and the trigger.
fn process_input(state: &mut SimState, id: CombatantId, input: InputFrame, sink: &mut EventSink) {
    let single_player = state.config.is_single_player();
    let c = &mut state.combatants[id.0 as usize];

    if let Some(aim) = input.aim() {
        c.body.aim(aim);
    }

    if input.pressed(InputFrame::BUTTON_MORPH, c.buttons) {
        c.start_morph();
    }

    match input.weapon_request() {
        Some(Ok(beam)) if beam != c.weapons.current => {
            c.try_equip_weapon(beam, false, single_player, sink);
        }
        Some(Err(raw)) => {
            warn!(combatant = id.0, index = raw, "invalid weapon index");
        }
        _ => {}
    }

    if !c.can_fire() {
        if c.weapons.charge_level > 0 {
            sink.end_effect(&mut c.effects.charge);
        }
        c.weapons.reset_trigger();
        return;
    }

    let held = input.held(InputFrame::BUTTON_FIRE);
    let pressed = input.pressed(InputFrame::BUTTON_FIRE, c.buttons);
    let result = c.weapons.step_trigger(held, pressed);

    if result.reached_min_charge {
        sink.sound(id, SoundCue::ChargeStart);
        if c.effects.charge.is_none() {
            c.effects.charge = Some(sink.spawn_effect(id, EffectKind::Charge, c.body.position));
        }
    }
    if result.reached_full_charge {
        sink.sound(id, SoundCue::ChargeFull);
    }
    if result.charge_cancelled {
        sink.sound(id, SoundCue::ChargeCancel);
        sink.end_effect(&mut c.effects.charge);
    }
    #[cfg(feature = "debug-tracing")]
    if c.weapons.charge_level > 0 {
        trace!(combatant = id.0, charge = c.weapons.charge_level, "charging");
    }

    match result.shot {
        Some(ShotOutcome::Fired { beam, charge, afflictions, .. }) => {
            sink.end_effect(&mut c.effects.charge);
            let position = c.body.position;
            sink.push(SimEventData::ShotFired {
                combatant: id,
                beam,
                charge,
                afflictions,
                origin: position.with_y(position.y.wrapping_add(MUZZLE_HEIGHT)),
                direction: c.body.facing,
            });
            if beam == BeamType::OmegaCannon && !single_player {
                c.weapons.unequip_omega_pending = true;
            }
        }
        Some(ShotOutcome::Empty { beam }) => {
            sink.push(SimEventData::ShotEmpty { combatant: id, beam });
        }
        None => {}
    }
}

/// Acid, lava and the kill plane.
fn step_hazards(state: &mut SimState, id: CombatantId, world: &dyn CollisionService, sink: &mut EventSink) {
    let Some(c) = state.get(id) else {
        return;
    };
    if !c.is_alive() {
        return;
    }
    let position = c.body.position;

    if world.hazard_at(position).is_some() {
        let hit = Hit::new(HAZARD_DAMAGE, DamageFlags::IGNORE_INVULN | DamageFlags::NO_DMG_INVULN)
            .from_source(DamageSource::Hazard);
        state.take_damage(id, hit, sink);
    }

    if let Some(kill_height) = state.config.kill_height {
        if position.y < kill_height {
            let hit = Hit::new(0, DamageFlags::DEATH).from_source(DamageSource::Hazard);
            state.take_damage(id, hit, sink);
        }
    }
}

// =============================================================================
// REPLAY
// =============================================================================

/// Combatant setup for a replayed session.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SlotSetup {
    pub hunter: Hunter,
    pub team: u8,
    pub is_bot: bool,
}

/// Rebuild a session and run it from recorded inputs.
///
/// Returns the final state and every event produced.
pub fn replay(
    config: SimConfig,
    slots: &[SlotSetup],
    spawn_points: &[(FixedVec3, FixedVec3)],
    recordings: &[InputRecording],
    tick_count: u32,
    world: &dyn CollisionService,
) -> Result<(SimState, Vec<SimEvent>), SimError> {
    let mut state = SimState::new(config)?;
    for slot in slots {
        state.add_combatant(slot.hunter, slot.team, slot.is_bot)?;
    }
    for (position, facing) in spawn_points {
        state.add_spawn_point(*position, *facing, None);
    }

    let mut all_events = Vec::new();
    for t in 0..tick_count {
        let tick_inputs: BTreeMap<CombatantId, InputFrame> = recordings
            .iter()
            .map(|rec| (rec.combatant, rec.input_at(t)))
            .collect();
        let result = tick(&mut state, &tick_inputs, world);
        all_events.extend(result.events);
    }

    Ok((state, all_events))
}

/// Replay and return only the final state hash.
pub fn replay_hash(
    config: SimConfig,
    slots: &[SlotSetup],
    spawn_points: &[(FixedVec3, FixedVec3)],
    recordings: &[InputRecording],
    tick_count: u32,
    world: &dyn CollisionService,
) -> Result<StateHash, SimError> {
    let (state, _) = replay(config, slots, spawn_points, recordings, tick_count, world)?;
    Ok(state.compute_hash())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GameMode;
    use crate::core::fixed::from_int;
    use crate::game::combatant::Phase;
    use crate::game::damage::Affliction;
    use crate::game::movement::{FloorPlane, Hazard, HazardVolume};
    use crate::game::pickup::ItemType;
    use crate::game::timers::{BURN_INTERVAL, RESPAWN_COUNTDOWN};
    use crate::game::weapon::AmmoType;
    use proptest::prelude::*;

    fn session(config: SimConfig, hunters: &[Hunter]) -> SimState {
        let mut state = SimState::new(config).unwrap();
        for (i, hunter) in hunters.iter().enumerate() {
            state.add_combatant(*hunter, i as u8, false).unwrap();
            state.add_spawn_point(FixedVec3::from_ints(i as i32 * 30, 0, 0), FixedVec3::FORWARD, None);
        }
        state
    }

    fn idle(state: &SimState) -> BTreeMap<CombatantId, InputFrame> {
        (0..state.combatants.len())
            .map(|i| (CombatantId(i as u8), InputFrame::new()))
            .collect()
    }

    fn run(state: &mut SimState, ticks: u32, world: &FloorPlane) -> Vec<SimEvent> {
        let inputs = idle(state);
        let mut events = Vec::new();
        for _ in 0..ticks {
            events.extend(tick(state, &inputs, world).events);
        }
        events
    }

    /// Versus session with everyone already spawned.
    fn spawned(hunters: &[Hunter]) -> (SimState, FloorPlane) {
        let mut state = session(SimConfig::default(), hunters);
        let floor = FloorPlane::at(0);
        run(&mut state, 1, &floor);
        (state, floor)
    }

    #[test]
    fn test_combatants_spawn_on_first_tick() {
        let mut state = session(SimConfig::default(), &[Hunter::Samus, Hunter::Kanden]);
        let floor = FloorPlane::at(0);
        let inputs = idle(&state);
        let result = tick(&mut state, &inputs, &floor);

        let spawned = result
            .events
            .iter()
            .filter(|e| matches!(e.data, SimEventData::Respawned { .. }))
            .count();
        assert_eq!(spawned, 2);
        assert!(state.combatants.iter().all(|c| c.is_alive()));
        assert_eq!(result.liveness, vec![true, true]);
        assert_eq!(state.tick, 1);
    }

    #[test]
    fn test_tick_determinism() {
        let hunters = [Hunter::Samus, Hunter::Trace, Hunter::Sylux];
        let mut a = session(SimConfig::default(), &hunters);
        let mut b = session(SimConfig::default(), &hunters);
        let floor = FloorPlane::at(0);

        let mut inputs = idle(&a);
        inputs.insert(
            CombatantId(0),
            InputFrame::new().with_movement(40, 127).with_buttons(InputFrame::BUTTON_FIRE),
        );
        inputs.insert(CombatantId(2), InputFrame::new().with_aim(127, 0).with_buttons(InputFrame::BUTTON_JUMP));

        for _ in 0..200 {
            let ra = tick(&mut a, &inputs, &floor);
            let rb = tick(&mut b, &inputs, &floor);
            let da: Vec<&SimEventData> = ra.events.iter().map(|e| &e.data).collect();
            let db: Vec<&SimEventData> = rb.events.iter().map(|e| &e.data).collect();
            assert_eq!(da, db);
        }
        assert_eq!(a.compute_hash(), b.compute_hash());
        assert_eq!(a.combatants, b.combatants);
    }

    #[test]
    fn test_walking_moves_forward() {
        let (mut state, floor) = spawned(&[Hunter::Samus]);
        let start = state.combatants[0].body.position;
        let mut inputs = BTreeMap::new();
        inputs.insert(CombatantId(0), InputFrame::new().with_movement(0, 127));
        for _ in 0..30 {
            tick(&mut state, &inputs, &floor);
        }
        let c = &state.combatants[0];
        assert!(c.body.position.z > start.z);
        assert!(c.body.grounded);
    }

    #[test]
    fn test_events_sorted_by_priority() {
        let (mut state, floor) = spawned(&[Hunter::Samus, Hunter::Kanden]);
        state.combatants[1].timers.spawn_invuln = 0;
        state.combatants[1].health = 1;
        state.combatants[1].timers.burn = BURN_INTERVAL + 1;
        state.combatants[1].burn_owner = Some(CombatantId(0));
        let mut inputs = idle(&state);
        inputs.insert(CombatantId(0), InputFrame::new().with_buttons(InputFrame::BUTTON_FIRE));
        let result = tick(&mut state, &inputs, &floor);

        assert!(result.events.windows(2).all(|w| w[0] <= w[1]));
        assert!(matches!(result.events[0].data, SimEventData::Died { .. }));
    }

    // Frozen combatants skip input and thaw exactly once
    #[test]
    fn test_frozen_skips_input_and_thaws_once() {
        let (mut state, floor) = spawned(&[Hunter::Samus]);
        state.combatants[0].timers.frozen = 3;
        state.combatants[0].is_main_player = true;
        let start = state.combatants[0].body.position;

        let mut inputs = BTreeMap::new();
        inputs.insert(
            CombatantId(0),
            InputFrame::new().with_movement(0, 127).with_buttons(InputFrame::BUTTON_FIRE),
        );
        let mut thaws = 0;
        for _ in 0..2 {
            let result = tick(&mut state, &inputs, &floor);
            assert!(!result.events.iter().any(|e| matches!(e.data, SimEventData::ShotFired { .. })));
        }
        assert_eq!(state.combatants[0].body.position.horizontal(), start.horizontal());

        for _ in 0..5 {
            let result = tick(&mut state, &inputs, &floor);
            thaws += result
                .events
                .iter()
                .filter(|e| matches!(e.data, SimEventData::Thawed { view: ThawView::FirstPerson, .. }))
                .count();
        }
        assert_eq!(thaws, 1);
        assert!(state.combatants[0].body.position.z > start.z);
    }

    #[test]
    fn test_tap_fire_spends_and_reports() {
        let (mut state, floor) = spawned(&[Hunter::Samus]);
        state.combatants[0].weapons.current = BeamType::Missile;
        let before = state.combatants[0].weapons.ammo.get(AmmoType::Missiles);
        let mut inputs = BTreeMap::new();
        inputs.insert(CombatantId(0), InputFrame::new().with_buttons(InputFrame::BUTTON_FIRE));
        let result = tick(&mut state, &inputs, &floor);

        let fired = result.events.iter().find_map(|e| match e.data {
            SimEventData::ShotFired { beam, origin, .. } => Some((beam, origin)),
            _ => None,
        });
        let (beam, origin) = fired.unwrap();
        assert_eq!(beam, BeamType::Missile);
        assert!(origin.y > state.combatants[0].body.position.y);
        assert!(state.combatants[0].weapons.ammo.get(AmmoType::Missiles) < before);
    }

    #[test]
    fn test_invalid_weapon_index_is_ignored() {
        let (mut state, floor) = spawned(&[Hunter::Samus]);
        let mut inputs = BTreeMap::new();
        inputs.insert(CombatantId(0), InputFrame { weapon_select: 77, ..InputFrame::new() });
        let before = state.combatants[0].weapons.current;
        tick(&mut state, &inputs, &floor);
        assert_eq!(state.combatants[0].weapons.current, before);
    }

    #[test]
    fn test_omega_dropped_tick_after_firing() {
        let (mut state, floor) = spawned(&[Hunter::Samus]);
        {
            let w = &mut state.combatants[0].weapons;
            w.unlock(BeamType::OmegaCannon);
            w.ammo.set_max(AmmoType::Ua, 400);
            w.ammo.set(AmmoType::Ua, 400);
            w.current = BeamType::OmegaCannon;
        }
        let mut inputs = BTreeMap::new();
        inputs.insert(CombatantId(0), InputFrame::new().with_buttons(InputFrame::BUTTON_FIRE));
        let result = tick(&mut state, &inputs, &floor);
        assert!(result
            .events
            .iter()
            .any(|e| matches!(e.data, SimEventData::ShotFired { beam: BeamType::OmegaCannon, .. })));
        assert!(state.combatants[0].weapons.unequip_omega_pending);

        let inputs = idle(&state);
        tick(&mut state, &inputs, &floor);
        let w = &state.combatants[0].weapons;
        assert_ne!(w.current, BeamType::OmegaCannon);
        assert!(!w.available.contains(BeamType::OmegaCannon));
    }

    // Death, countdown, respawn at a point nobody stands on
    #[test]
    fn test_bot_respawns_after_countdown() {
        let mut state = SimState::new(SimConfig::default()).unwrap();
        state.add_combatant(Hunter::Samus, 0, false).unwrap();
        state.add_combatant(Hunter::Noxus, 1, true).unwrap();
        state.add_spawn_point(FixedVec3::ZERO, FixedVec3::FORWARD, None);
        state.add_spawn_point(FixedVec3::from_ints(40, 0, 0), FixedVec3::FORWARD, None);
        let floor = FloorPlane::at(0);
        run(&mut state, 10, &floor);

        let mut sink = EventSink::new(state.tick, state.next_effect_id);
        state.take_damage(CombatantId(1), Hit::new(0, DamageFlags::DEATH), &mut sink);
        assert_eq!(state.combatants[1].phase, Phase::Dead);

        let mut respawned_after = None;
        for t in 1..=RESPAWN_COUNTDOWN as u32 + 5 {
            let events = run(&mut state, 1, &floor);
            if events.iter().any(|e| matches!(e.data, SimEventData::Respawned { combatant: CombatantId(1), .. })) {
                respawned_after = Some(t);
                break;
            }
        }
        assert_eq!(respawned_after, Some(RESPAWN_COUNTDOWN as u32));
        assert!(state.combatants[1].is_alive());
        assert_ne!(state.combatants[1].body.position, state.combatants[0].body.position);
    }

    #[test]
    fn test_human_waits_for_delay_or_fire() {
        let (mut state, floor) = spawned(&[Hunter::Samus, Hunter::Spire]);
        let mut sink = EventSink::new(state.tick, state.next_effect_id);
        state.take_damage(CombatantId(0), Hit::new(0, DamageFlags::DEATH), &mut sink);

        run(&mut state, RESPAWN_COUNTDOWN as u32 + 10, &floor);
        assert!(!state.combatants[0].is_alive());

        let mut inputs = idle(&state);
        inputs.insert(CombatantId(0), InputFrame::new().with_buttons(InputFrame::BUTTON_FIRE));
        tick(&mut state, &inputs, &floor);
        assert!(state.combatants[0].is_alive());
    }

    #[test]
    fn test_respawn_deferred_without_points() {
        let mut state = SimState::new(SimConfig {
            mode: GameMode::SinglePlayer,
            ..SimConfig::default()
        })
        .unwrap();
        state.add_combatant(Hunter::Samus, 0, false).unwrap();
        let events = run(&mut state, 1, &FloorPlane::at(0));
        assert!(events.iter().any(|e| matches!(e.data, SimEventData::RespawnDeferred { .. })));
        assert!(!state.combatants[0].is_alive());
    }

    #[test]
    fn test_lava_burns_through_invulnerability() {
        let floor = FloorPlane {
            hazards: vec![HazardVolume {
                min: FixedVec3::from_ints(-5, -5, -5),
                max: FixedVec3::from_ints(5, 5, 5),
                hazard: Hazard::Lava,
            }],
            ..FloorPlane::at(0)
        };
        let mut state = session(SimConfig::default(), &[Hunter::Weavel]);
        run(&mut state, 1, &floor);
        let after_spawn = state.combatants[0].health;
        assert!(state.combatants[0].timers.spawn_invuln > 0);
        run(&mut state, 10, &floor);
        assert_eq!(state.combatants[0].health, after_spawn - 10);
    }

    #[test]
    fn test_kill_height() {
        let config = SimConfig { kill_height: Some(from_int(-10)), ..SimConfig::default() };
        let mut state = session(config, &[Hunter::Samus]);
        let floor = FloorPlane::at(from_int(-100));
        run(&mut state, 1, &floor);
        state.combatants[0].body.position = FixedVec3::from_ints(0, -20, 0);
        let events = run(&mut state, 1, &floor);
        assert!(events.iter().any(|e| matches!(e.data, SimEventData::Died { killer: None, .. })));
    }

    // Burn ticks for 1 every interval and credits the igniter
    #[test]
    fn test_burn_self_damage_and_expiry() {
        let (mut state, floor) = spawned(&[Hunter::Sylux, Hunter::Samus]);
        {
            let c = &mut state.combatants[1];
            c.timers.spawn_invuln = 0;
            c.timers.arm_burn();
            c.burn_owner = Some(CombatantId(0));
        }
        let health = state.combatants[1].health;
        let events = run(&mut state, 320, &floor);

        let burn_hits = events
            .iter()
            .filter(|e| matches!(
                e.data,
                SimEventData::Damaged { victim: CombatantId(1), attacker: Some(CombatantId(0)), .. }
            ))
            .count();
        // 300 ticks of burn deal one point on every multiple of 16 from 288 down to 0
        assert_eq!(burn_hits, 19);
        assert_eq!(burn_hits, (300 - 1) / BURN_INTERVAL as usize + 1);
        assert_eq!(state.combatants[1].health, health - burn_hits as u16);
        assert_eq!(state.combatants[1].timers.burn, 0);
        assert_eq!(state.combatants[1].burn_owner, None);
    }

    #[test]
    fn test_burn_effect_follows_and_ends() {
        let (mut state, floor) = spawned(&[Hunter::Samus, Hunter::Kanden]);
        state.combatants[1].timers.spawn_invuln = 0;
        let mut sink = EventSink::new(state.tick, state.next_effect_id);
        let hit = Hit::new(5, DamageFlags::NONE)
            .with_afflictions(Affliction::BURN)
            .from_source(DamageSource::Projectile { owner: Some(CombatantId(0)), beam: BeamType::Magmaul });
        state.take_damage(CombatantId(1), hit, &mut sink);
        let (_, next) = sink.finish();
        state.next_effect_id = next;
        let effect = state.combatants[1].effects.burn.unwrap();

        let events = run(&mut state, 2, &floor);
        assert!(events.iter().any(|e| matches!(e.data, SimEventData::EffectMoved { effect: moved, .. } if moved == effect)));

        let events = run(&mut state, 400, &floor);
        assert!(events.iter().any(|e| matches!(e.data, SimEventData::EffectEnded { effect: ended } if ended == effect)));
        assert_eq!(state.combatants[1].effects.burn, None);
    }

    #[test]
    fn test_dropped_items_expire() {
        let (mut state, floor) = spawned(&[Hunter::Samus]);
        state.drop_item(ItemType::UaSmall, FixedVec3::from_ints(50, 0, 50));
        run(&mut state, crate::game::pickup::DROP_LIFETIME as u32, &floor);
        assert!(state.items.is_empty());
    }

    #[test]
    fn test_item_pickup_in_tick() {
        let (mut state, floor) = spawned(&[Hunter::Samus]);
        let position = state.combatants[0].body.position;
        state.combatants[0].health = 50;
        state.spawn_item(ItemType::HealthSmall, position);
        let events = run(&mut state, 1, &floor);
        assert!(events.iter().any(|e| matches!(e.data, SimEventData::ItemPickedUp { .. })));
        assert_eq!(state.combatants[0].health, 80);
        assert!(state.items.is_empty());
    }

    #[test]
    fn test_retired_slot_reports_not_live() {
        let (mut state, floor) = spawned(&[Hunter::Samus, Hunter::Trace]);
        state.retire(CombatantId(1)).unwrap();
        let before = state.combatants[1].clone();
        let inputs = idle(&state);
        let result = tick(&mut state, &inputs, &floor);
        assert!(result.is_live(CombatantId(0)));
        assert!(!result.is_live(CombatantId(1)));
        assert_eq!(state.combatants[1], before);
    }

    #[test]
    fn test_replay_determinism() {
        let slots = [
            SlotSetup { hunter: Hunter::Samus, team: 0, is_bot: false },
            SlotSetup { hunter: Hunter::Guardian, team: 1, is_bot: true },
        ];
        let points = [
            (FixedVec3::ZERO, FixedVec3::FORWARD),
            (FixedVec3::from_ints(30, 0, 30), FixedVec3::FORWARD),
        ];
        let mut rec = InputRecording::new(CombatantId(0));
        for t in 0..120 {
            let frame = if t % 40 < 20 {
                InputFrame::new().with_movement(0, 127).with_buttons(InputFrame::BUTTON_FIRE)
            } else {
                InputFrame::new().with_aim(127, 0)
            };
            rec.record(t, frame);
        }
        let floor = FloorPlane::at(0);
        let recordings = vec![rec];

        let first = replay_hash(SimConfig::default(), &slots, &points, &recordings, 120, &floor).unwrap();
        let second = replay_hash(SimConfig::default(), &slots, &points, &recordings, 120, &floor).unwrap();
        assert_eq!(first, second);

        let shorter = replay_hash(SimConfig::default(), &slots, &points, &recordings, 119, &floor).unwrap();
        assert_ne!(first, shorter);
    }

    #[test]
    fn test_snapshot_resumes_identically() {
        let (mut state, floor) = spawned(&[Hunter::Samus, Hunter::Kanden]);
        let mut inputs = idle(&state);
        inputs.insert(CombatantId(0), InputFrame::new().with_movement(127, 127));
        for _ in 0..30 {
            tick(&mut state, &inputs, &floor);
        }
        let mut resumed = SimState::restore(&state.snapshot().unwrap()).unwrap();
        for _ in 0..30 {
            tick(&mut state, &inputs, &floor);
            tick(&mut resumed, &inputs, &floor);
        }
        assert_eq!(state.compute_hash(), resumed.compute_hash());
    }

    fn frame_strategy() -> impl Strategy<Value = InputFrame> {
        (any::<i8>(), any::<i8>(), any::<i8>(), any::<i8>(), 0u8..8, prop_oneof![Just(0xFFu8), 0u8..12])
            .prop_map(|(move_x, move_z, aim_x, aim_z, buttons, weapon_select)| InputFrame {
                move_x,
                move_z,
                aim_x,
                aim_z,
                buttons,
                weapon_select,
            })
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(24))]

        #[test]
        fn test_health_and_ammo_stay_in_bounds(
            frames in prop::collection::vec((frame_strategy(), frame_strategy()), 1..120)
        ) {
            let mut state = session(SimConfig::default(), &[Hunter::Trace, Hunter::Spire]);
            state.spawn_item(ItemType::HealthBig, FixedVec3::from_ints(2, 0, 2));
            state.spawn_item(ItemType::UaBig, FixedVec3::from_ints(28, 0, 2));
            let floor = FloorPlane::at(0);
            for (a, b) in frames {
                let mut inputs = BTreeMap::new();
                inputs.insert(CombatantId(0), a);
                inputs.insert(CombatantId(1), b);
                tick(&mut state, &inputs, &floor);

                for c in &state.combatants {
                    prop_assert!(c.health <= c.health_max);
                    for ty in [AmmoType::Ua, AmmoType::Missiles] {
                        prop_assert!(c.weapons.ammo.get(ty) <= c.weapons.ammo.max(ty));
                    }
                    let def = c.weapons.active_def();
                    prop_assert!(c.weapons.charge_level <= def.full_charge);
                }
            }
        }
    }
}
