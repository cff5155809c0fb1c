//! Hunter Sim Demo
//!
//! Runs a headless session on a flat floor, logs what happens and verifies
//! determinism by replaying the recorded inputs.
//!
//! Usage: `hunter-sim [config.json]`

use std::collections::BTreeMap;

use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use hunter_sim::{
    FixedVec3, SimConfig, SimState, TICK_RATE, VERSION,
    game::{
        combatant::CombatantId,
        events::SimEventData,
        hunter::Hunter,
        input::{InputFrame, InputRecording},
        movement::FloorPlane,
        pickup::ItemType,
        tick::{tick, replay, SlotSetup},
        weapon::BeamType,
    },
};

/// Demo session length (60 seconds)
const DEMO_TICKS: u32 = 60 * TICK_RATE;

fn main() -> Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .finish();
    tracing::subscriber::set_global_default(subscriber).context("failed to set tracing subscriber")?;

    info!("Hunter Sim v{}", VERSION);
    info!("Tick Rate: {} Hz", TICK_RATE);

    let config = match std::env::args().nth(1) {
        Some(path) => SimConfig::from_json_file(&path).with_context(|| format!("loading {}", path))?,
        None => SimConfig::default(),
    };
    info!("Mode: {:?}, survival: {}", config.mode, config.survival);

    demo_session(config)
}

/// Scripted stick input for a slot.
fn demo_input(slot: usize, t: u32) -> InputFrame {
    let phase = (t as i32 * (slot as i32 + 1) * 7) % 360;
    let strafe = ((phase % 127) - 63) as i8;
    let forward = (((phase + 90) % 127) - 63) as i8;
    let mut frame = InputFrame::new()
        .with_movement(strafe, forward)
        .with_aim(((phase % 200) - 100) as i8, 90);
    if t % 90 < 30 {
        frame = frame.with_buttons(InputFrame::BUTTON_FIRE);
    }
    if t % 240 == 120 {
        frame = frame.with_buttons(InputFrame::BUTTON_JUMP);
    }
    if t == 600 {
        frame = frame.with_weapon(BeamType::Missile);
    }
    frame
}

/// Demo function to exercise the simulation.
fn demo_session(config: SimConfig) -> Result<()> {
    info!("=== Starting Demo Session ===");

    let slots = [
        SlotSetup { hunter: Hunter::Samus, team: 0, is_bot: false },
        SlotSetup { hunter: Hunter::Kanden, team: 1, is_bot: false },
        SlotSetup { hunter: Hunter::Spire, team: 2, is_bot: true },
    ];
    let points = [
        (FixedVec3::from_ints(0, 0, 0), FixedVec3::FORWARD),
        (FixedVec3::from_ints(25, 0, 0), FixedVec3::FORWARD),
        (FixedVec3::from_ints(0, 0, 25), FixedVec3::FORWARD),
        (FixedVec3::from_ints(25, 0, 25), FixedVec3::FORWARD),
    ];
    let floor = FloorPlane::at(0);

    let mut state = SimState::new(config.clone())?;
    for slot in &slots {
        state.add_combatant(slot.hunter, slot.team, slot.is_bot)?;
    }
    for (position, facing) in &points {
        state.add_spawn_point(*position, *facing, None);
    }

    let mut recordings: Vec<InputRecording> = (0..slots.len())
        .map(|i| InputRecording::new(CombatantId(i as u8)))
        .collect();
    let mut inputs: BTreeMap<CombatantId, InputFrame> = BTreeMap::new();

    info!("Running {} ticks...", DEMO_TICKS);

    let mut total_events = 0;
    for t in 0..DEMO_TICKS {
        if t == 1200 {
            let id = state.spawn_item(ItemType::Weapon(BeamType::Judicator), FixedVec3::from_ints(12, 0, 12));
            info!("Tick {}: placed item {}", t, id);
        }

        for (i, rec) in recordings.iter_mut().enumerate() {
            let frame = demo_input(i, t);
            rec.record(t, frame);
            inputs.insert(rec.combatant, frame);
        }

        let result = tick(&mut state, &inputs, &floor);
        total_events += result.events.len();

        for event in &result.events {
            match &event.data {
                SimEventData::Died { victim, killer, .. } => {
                    info!("Tick {}: combatant {} died (killer {:?})", t, victim.0, killer.map(|k| k.0));
                }
                SimEventData::Respawned { combatant, spawn_point, .. } => {
                    info!("Tick {}: combatant {} spawned at point {}", t, combatant.0, spawn_point);
                }
                SimEventData::WeaponEquipped { combatant, beam, .. } => {
                    info!("Tick {}: combatant {} equipped {:?}", t, combatant.0, beam);
                }
                SimEventData::ItemPickedUp { combatant, item_type, .. } => {
                    info!("Tick {}: combatant {} picked up {:?}", t, combatant.0, item_type);
                }
                _ => {}
            }
        }

        if t % 600 == 0 {
            for c in &state.combatants {
                let (x, y, z) = c.body.position.to_floats();
                info!(
                    "Tick {}: #{} {:?} hp {}/{} at ({:.2}, {:.2}, {:.2})",
                    t, c.id.0, c.hunter, c.health, c.health_max, x, y, z
                );
            }
        }
    }

    // Print final results
    info!("=== Session Results ===");
    let hash = state.compute_hash();
    info!("Final State Hash: {}", hex::encode(hash));
    for c in &state.combatants {
        info!("#{} {:?}: {} kills, {} deaths", c.id.0, c.hunter, c.kills, c.deaths);
    }
    info!("Total events: {}", total_events);

    let snapshot = state.snapshot()?;
    info!("Snapshot size: {} bytes", snapshot.len());

    // Verify determinism by replaying
    info!("=== Verifying Determinism ===");
    let replayed = {
        // The scripted item has to be placed at the same tick, so replay in two legs
        let (mut replay_state, _) = replay(
            config,
            &slots,
            &points,
            &recordings,
            1200,
            &floor,
        )?;
        replay_state.spawn_item(ItemType::Weapon(BeamType::Judicator), FixedVec3::from_ints(12, 0, 12));
        for t in 1200..DEMO_TICKS {
            let frames: BTreeMap<CombatantId, InputFrame> =
                recordings.iter().map(|r| (r.combatant, r.input_at(t))).collect();
            tick(&mut replay_state, &frames, &floor);
        }
        replay_state.compute_hash()
    };
    info!("Replay State Hash: {}", hex::encode(replayed));

    if hash == replayed {
        info!("DETERMINISM VERIFIED: Hashes match!");
    } else {
        anyhow::bail!("determinism failure: {} != {}", hex::encode(hash), hex::encode(replayed));
    }

    let restored = SimState::restore(&snapshot)?;
    info!(
        "Snapshot restore {}",
        if restored.compute_hash() == hash { "matches" } else { "differs" }
    );

    Ok(())
}
