//! Respawn
//!
//! Spawn point selection, the multiplayer respawn delay and the
//! [`Combatant::spawn`] reset.
//!
//! Selection is deterministic: among points at a safe distance from every
//! live combatant, the tick counter picks one. No RNG is involved.

use serde::{Serialize, Deserialize};
use tracing::debug;

use crate::core::fixed::{Fixed, FIXED_ONE, from_int};
use crate::core::time::{Ticks, secs, count_down};
use crate::core::vec3::FixedVec3;
use crate::game::combatant::{BodyForm, Combatant, EffectHandles, Phase};
use crate::game::events::{EventSink, SimEventData};
use crate::game::movement::Body;
use crate::game::timers::Fade;
use crate::game::weapon::{AmmoType, BeamType, Loadout};

/// Spawn points examined per search
pub const MAX_SPAWN_SCAN: usize = 25;

/// Squared distance to the nearest live combatant that makes a point safe (10 units)
pub const SAFE_DISTANCE_SQ: Fixed = from_int(100);

/// Cooldown armed on a chosen point
pub const SPAWN_POINT_COOLDOWN: Ticks = 4;

const SP_HEALTH_MAX: u16 = 799;
const SP_UA_MAX: u16 = 4000;
const SP_MISSILE_MAX: u16 = 950;

/// A place to respawn.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpawnPoint {
    pub id: u16,
    pub position: FixedVec3,
    pub facing: FixedVec3,
    pub active: bool,
    pub cooldown: Ticks,
    /// Restricts the point to one team when teams are on
    pub team: Option<u8>,
}

impl SpawnPoint {
    /// Active, unrestricted point.
    pub fn new(id: u16, position: FixedVec3, facing: FixedVec3) -> Self {
        Self {
            id,
            position,
            facing,
            active: true,
            cooldown: 0,
            team: None,
        }
    }

    /// Advance the cooldown.
    #[inline]
    pub fn step_cooldown(&mut self) {
        count_down(&mut self.cooldown);
    }
}

/// Choose a spawn point and arm its cooldown.
///
/// `team` filters team-restricted points. Returns an index into `points`,
/// or None when nothing is eligible this tick.
pub fn get_respawn_point(
    points: &mut [SpawnPoint],
    live_positions: &[FixedVec3],
    tick: u32,
    team: Option<u8>,
) -> Option<usize> {
    let mut valid: Vec<usize> = Vec::new();
    let mut fallback: Option<(usize, Fixed)> = None;

    for (index, point) in points.iter().enumerate().take(MAX_SPAWN_SCAN) {
        if !point.active || point.cooldown != 0 {
            continue;
        }
        if let (Some(want), Some(have)) = (team, point.team) {
            if want != have {
                continue;
            }
        }
        let nearest = live_positions
            .iter()
            .map(|p| point.position.distance_squared(*p))
            .min()
            .unwrap_or(Fixed::MAX);
        if nearest >= SAFE_DISTANCE_SQ {
            valid.push(index);
        } else if fallback.map_or(true, |(_, best)| nearest > best) {
            fallback = Some((index, nearest));
        }
    }

    let chosen = if valid.is_empty() {
        fallback.map(|(index, _)| index)
    } else {
        Some(valid[tick as usize % valid.len()])
    };
    if let Some(index) = chosen {
        points[index].cooldown = SPAWN_POINT_COOLDOWN;
    }
    chosen
}

/// Multiplayer delay before an automatic respawn.
pub fn respawn_delay(player_count: usize, survival: bool) -> Ticks {
    if survival {
        secs(7.0)
    } else if player_count > 3 {
        secs(30.0)
    } else if player_count > 2 {
        secs(20.0)
    } else {
        secs(10.0)
    }
}

impl Combatant {
    /// Whether a dead combatant may respawn this tick.
    pub fn may_respawn(&self, single_player: bool, fire_held: bool, delay: Ticks) -> bool {
        self.timers.respawn == 0
            && (single_player || self.is_bot || fire_held || self.time_since_death >= delay)
    }

    /// Reset vitals, weapons, timers and body at a spawn point.
    pub fn spawn(&mut self, point: &SpawnPoint, single_player: bool, sink: &mut EventSink) {
        let values = self.hunter.values();

        self.phase = Phase::Alive;
        self.form = BodyForm::Biped;
        self.body = Body {
            position: point.position,
            prev_position: point.position,
            ..Body::default()
        };
        self.body.aim(point.facing);

        let ammo = &mut self.weapons.ammo;
        if single_player {
            self.health_max = SP_HEALTH_MAX;
            self.health = SP_HEALTH_MAX;
            ammo.set_max(AmmoType::Ua, SP_UA_MAX);
            ammo.set_max(AmmoType::Missiles, SP_MISSILE_MAX);
        } else {
            let tank = values.energy_tank;
            self.health_max = tank * 2 - 1;
            self.health = tank - 1;
            ammo.set_max(AmmoType::Ua, values.mp_ammo_cap);
            ammo.set_max(AmmoType::Missiles, values.mp_ammo_cap);
        }
        self.health_recovery = 0;
        self.health_recovery_phase = false;

        let (loadout, first) = match (single_player, self.is_bot) {
            (false, _) => (Loadout::Multiplayer, BeamType::PowerBeam),
            (true, false) => (Loadout::Campaign, BeamType::PowerBeam),
            (true, true) => (Loadout::CampaignBot, self.hunter.affinity_beam()),
        };
        self.weapons.initialize(loadout, self.hunter);
        self.weapons.try_equip(first, true, self.hunter, single_player);
        self.weapons.previous = first;

        self.timers.reset_for_spawn(values.spawn_invuln);
        self.fade = Fade { alpha: FIXED_ONE, target: FIXED_ONE };
        self.effects = EffectHandles::default();
        self.burn_owner = None;
        self.hit_reaction = None;
        self.time_since_death = 0;

        sink.push(SimEventData::Respawned {
            combatant: self.id,
            spawn_point: point.id,
            position: point.position,
        });
        debug!(combatant = self.id.0, spawn_point = point.id, "combatant spawned");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::combatant::CombatantId;
    use crate::game::hunter::Hunter;
    use crate::game::weapon::BeamSet;

    fn ring() -> Vec<SpawnPoint> {
        (0..4)
            .map(|i| SpawnPoint::new(i, FixedVec3::from_ints(i as i32 * 20, 0, 0), FixedVec3::FORWARD))
            .collect()
    }

    #[test]
    fn test_never_picks_cooling_point() {
        let mut points = ring();
        points[0].cooldown = 3;
        points[2].cooldown = 1;
        for tick in 0..50 {
            let mut fresh = points.clone();
            let chosen = get_respawn_point(&mut fresh, &[], tick, None).unwrap();
            assert!(chosen == 1 || chosen == 3);
            assert_eq!(fresh[chosen].cooldown, SPAWN_POINT_COOLDOWN);
        }
    }

    #[test]
    fn test_tick_selects_among_valid() {
        let mut points = ring();
        assert_eq!(get_respawn_point(&mut points.clone(), &[], 0, None), Some(0));
        assert_eq!(get_respawn_point(&mut points.clone(), &[], 5, None), Some(1));
        assert_eq!(get_respawn_point(&mut points, &[], 7, None), Some(3));
    }

    #[test]
    fn test_unsafe_points_skipped() {
        let points = ring();
        // Somebody stands on point 0 and near point 1
        let live = [FixedVec3::from_ints(0, 0, 0), FixedVec3::from_ints(22, 0, 0)];
        for tick in 0..10 {
            let chosen = get_respawn_point(&mut points.clone(), &live, tick, None).unwrap();
            assert!(chosen == 2 || chosen == 3);
        }
    }

    #[test]
    fn test_fallback_is_farthest() {
        let mut points = ring();
        let live: Vec<FixedVec3> = points.iter().map(|p| p.position).collect();
        let mut near = live.clone();
        near[3] = FixedVec3::from_ints(62, 0, 0);
        assert_eq!(get_respawn_point(&mut points, &near, 0, None), Some(3));
    }

    #[test]
    fn test_none_when_all_cooling() {
        let mut points = ring();
        for p in points.iter_mut() {
            p.cooldown = 2;
        }
        assert_eq!(get_respawn_point(&mut points, &[], 0, None), None);
    }

    #[test]
    fn test_scan_cap() {
        let mut points: Vec<SpawnPoint> = (0..30)
            .map(|i| SpawnPoint::new(i, FixedVec3::from_ints(i as i32 * 20, 0, 0), FixedVec3::FORWARD))
            .collect();
        for p in points.iter_mut().take(MAX_SPAWN_SCAN) {
            p.active = false;
        }
        assert_eq!(get_respawn_point(&mut points, &[], 0, None), None);
    }

    #[test]
    fn test_team_filter() {
        let mut points = ring();
        points[0].team = Some(1);
        points[1].team = Some(0);
        points[2].team = Some(1);
        points[3].team = Some(1);
        assert_eq!(get_respawn_point(&mut points, &[], 3, Some(0)), Some(1));
    }

    #[test]
    fn test_respawn_delay() {
        assert_eq!(respawn_delay(4, false), 1800);
        assert_eq!(respawn_delay(3, false), 1200);
        assert_eq!(respawn_delay(2, false), 600);
        assert_eq!(respawn_delay(4, true), 420);
    }

    #[test]
    fn test_multiplayer_spawn_reset() {
        let mut c = Combatant::new(CombatantId(0), Hunter::Trace, 0, false);
        c.timers.burn = 40;
        let point = SpawnPoint::new(3, FixedVec3::from_ints(5, 1, 5), FixedVec3::from_ints(1, 0, 0));
        let mut sink = EventSink::new(0, 0);
        c.spawn(&point, false, &mut sink);

        assert!(c.is_alive());
        assert_eq!(c.health, 99);
        assert_eq!(c.health_max, 199);
        assert_eq!(c.weapons.current, BeamType::PowerBeam);
        assert_eq!(c.weapons.ammo.get(AmmoType::Missiles), 100);
        assert_eq!(c.weapons.ammo.max(AmmoType::Ua), 400);
        assert_eq!(c.timers.burn, 0);
        assert_eq!(c.timers.spawn_invuln, Hunter::Trace.values().spawn_invuln);
        assert_eq!(c.body.position, point.position);
        assert_eq!(c.body.facing, FixedVec3::new(FIXED_ONE, 0, 0));
    }

    #[test]
    fn test_campaign_bot_spawn() {
        let mut c = Combatant::new(CombatantId(1), Hunter::Noxus, 0, true);
        let point = SpawnPoint::new(0, FixedVec3::ZERO, FixedVec3::FORWARD);
        let mut sink = EventSink::new(0, 0);
        c.spawn(&point, true, &mut sink);
        assert_eq!(c.weapons.current, BeamType::Judicator);
        assert!(c.weapons.ammo.infinite);
        assert!(c.weapons.affinity_variant);
        let mut only = BeamSet::EMPTY;
        only.insert(BeamType::Judicator);
        assert_eq!(c.weapons.available, only);
    }

    #[test]
    fn test_may_respawn_rules() {
        let mut c = Combatant::new(CombatantId(0), Hunter::Samus, 0, false);
        c.time_since_death = 10;
        c.timers.respawn = 0;
        assert!(!c.may_respawn(false, false, 600));
        assert!(c.may_respawn(false, true, 600));
        assert!(c.may_respawn(true, false, 600));
        c.time_since_death = 600;
        assert!(c.may_respawn(false, false, 600));
        c.timers.respawn = 1;
        assert!(!c.may_respawn(true, true, 0));
    }
}
