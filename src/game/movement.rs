//! Movement Integrator
//!
//! Turns stick input into acceleration, clamps horizontal speed,
//! applies gravity and jumps, then sweeps the collision sphere against the
//! world through [`CollisionService`].
//!
//! # Speed clamp
//!
//! ```text
//!  new_len <= cap          → unchanged
//!  new_len >  cap, prev <= cap → scaled to exactly cap
//!  new_len >  cap, prev >  cap → scaled to prev (no sudden loss of momentum)
//! ```

use serde::{Serialize, Deserialize};

use crate::core::fixed::{Fixed, FIXED_ONE, FIXED_HALF, fixed_mul, to_fixed};
use crate::core::time::{Ticks, count_down};
use crate::core::vec3::FixedVec3;
use crate::game::hunter::HunterValues;

/// Minimum control lock applied by a jump pad
pub const JUMP_PAD_MIN_LOCK: Ticks = 10;

/// Contact normals with at least this much Y count as floor
const FLOOR_NORMAL_Y: Fixed = FIXED_HALF;

// =============================================================================
// COLLISION SERVICE
// =============================================================================

/// Surface material under a contact.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Terrain {
    #[default]
    Normal,
    /// Reduced traction
    Slippery,
    /// Very low traction
    Ice,
}

impl Terrain {
    /// Traction multiplier on this surface.
    pub fn traction_factor(self) -> Fixed {
        match self {
            Terrain::Normal => FIXED_ONE,
            Terrain::Slippery => to_fixed(0.5),
            Terrain::Ice => to_fixed(0.2),
        }
    }
}

/// Damaging volume.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Hazard {
    Acid,
    Lava,
}

/// Plane `dot(normal, p) = offset`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactPlane {
    pub normal: FixedVec3,
    pub offset: Fixed,
}

impl ContactPlane {
    /// Signed distance from the plane.
    #[inline]
    pub fn distance(&self, point: FixedVec3) -> Fixed {
        self.normal.dot(point).wrapping_sub(self.offset)
    }
}

/// First contact found by a sphere sweep.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SphereContact {
    pub plane: ContactPlane,
    /// Sphere center at contact
    pub position: FixedVec3,
    pub terrain: Terrain,
}

/// World collision queries.
pub trait CollisionService {
    /// Sweep a sphere from `from` to `to` and report the first contact.
    fn sweep_sphere(&self, from: FixedVec3, to: FixedVec3, radius: Fixed) -> Option<SphereContact>;

    /// Hazard volume containing `point`, if any.
    fn hazard_at(&self, point: FixedVec3) -> Option<Hazard>;
}

/// Axis-aligned hazard box.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HazardVolume {
    pub min: FixedVec3,
    pub max: FixedVec3,
    pub hazard: Hazard,
}

impl HazardVolume {
    /// Point containment.
    pub fn contains(&self, p: FixedVec3) -> bool {
        p.x >= self.min.x && p.x <= self.max.x
            && p.y >= self.min.y && p.y <= self.max.y
            && p.z >= self.min.z && p.z <= self.max.z
    }
}

/// Infinite horizontal floor with optional hazard boxes.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FloorPlane {
    pub height: Fixed,
    pub terrain: Terrain,
    pub hazards: Vec<HazardVolume>,
}

impl FloorPlane {
    /// Floor at `height` with normal terrain.
    pub fn at(height: Fixed) -> Self {
        Self { height, ..Default::default() }
    }
}

impl CollisionService for FloorPlane {
    fn sweep_sphere(&self, _from: FixedVec3, to: FixedVec3, radius: Fixed) -> Option<SphereContact> {
        let rest = self.height.wrapping_add(radius);
        if to.y >= rest {
            return None;
        }
        Some(SphereContact {
            plane: ContactPlane { normal: FixedVec3::UP, offset: self.height },
            position: to.with_y(rest),
            terrain: self.terrain,
        })
    }

    fn hazard_at(&self, point: FixedVec3) -> Option<Hazard> {
        self.hazards.iter().find(|v| v.contains(point)).map(|v| v.hazard)
    }
}

// =============================================================================
// BODY
// =============================================================================

/// Physical state of a combatant.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Body {
    /// Feet position
    pub position: FixedVec3,
    pub prev_position: FixedVec3,
    pub speed: FixedVec3,
    pub prev_speed: FixedVec3,
    /// Unit facing; only its XZ part steers movement
    pub facing: FixedVec3,
    pub grounded: bool,
    /// Remaining jump-pad control lock
    pub jump_pad_lock: Ticks,
    /// Surface touched last
    pub terrain: Terrain,
}

impl Default for Body {
    fn default() -> Self {
        Self {
            position: FixedVec3::ZERO,
            prev_position: FixedVec3::ZERO,
            speed: FixedVec3::ZERO,
            prev_speed: FixedVec3::ZERO,
            facing: FixedVec3::FORWARD,
            grounded: false,
            jump_pad_lock: 0,
            terrain: Terrain::Normal,
        }
    }
}

/// Stick input in the combatant's frame, each axis in [-1, 1].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MoveIntent {
    pub forward: Fixed,
    pub strafe: Fixed,
    pub jump: bool,
}

impl MoveIntent {
    /// No stick input.
    #[inline]
    pub fn is_idle(&self) -> bool {
        self.forward == 0 && self.strafe == 0
    }
}

/// Sphere used for collision.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CollisionShape {
    /// Center height above the feet
    pub center_y: Fixed,
    pub radius: Fixed,
}

impl Body {
    /// Save the pre-update position and speed.
    pub fn remember_previous(&mut self) {
        self.prev_position = self.position;
        self.prev_speed = self.speed;
    }

    /// Set facing from an aim vector. Zero vectors are ignored.
    pub fn aim(&mut self, direction: FixedVec3) {
        let unit = direction.normalize();
        if !unit.is_zero() {
            self.facing = unit;
        }
    }

    /// Launch from a jump pad.
    pub fn activate_jump_pad(&mut self, velocity: FixedVec3, lock: Ticks) {
        self.speed = velocity;
        self.jump_pad_lock = lock.max(JUMP_PAD_MIN_LOCK);
        self.grounded = false;
    }

    /// Apply stick input and the speed clamp to the horizontal speed.
    pub fn accelerate(&mut self, values: &HunterValues, intent: MoveIntent) {
        let forward = self.facing.horizontal().normalize();
        let side = FixedVec3::UP.cross(forward);

        let pad = count_down(&mut self.jump_pad_lock) || self.jump_pad_lock > 0;
        let (walk, strafe) = if pad {
            (values.jump_pad_slide_factor, values.jump_pad_slide_factor)
        } else {
            let surface = if self.grounded {
                self.terrain.traction_factor()
            } else {
                values.air_speed_factor
            };
            (
                fixed_mul(values.walk_traction, surface),
                fixed_mul(values.strafe_traction, surface),
            )
        };

        let before = self.speed.horizontal();
        let delta = forward
            .scale(fixed_mul(intent.forward, walk))
            .add(side.scale(fixed_mul(intent.strafe, strafe)));
        let mut after = before + delta;

        if intent.is_idle() && self.grounded && !pad {
            after = after - after.scale(values.stand_speed_factor);
        }

        let cap = if intent.forward != 0 {
            values.walk_speed_cap
        } else {
            values.strafe_speed_cap
        };
        let new_len = after.length();
        if new_len > cap {
            let prev_len = before.length();
            let limit = if prev_len > cap { prev_len.min(new_len) } else { cap };
            after = after.with_length(limit);
        }

        self.speed = after.with_y(self.speed.y);
    }

    /// Gravity and jump impulse.
    pub fn apply_vertical(&mut self, gravity: Fixed, jump_speed: Option<Fixed>) {
        self.speed.y = self.speed.y.wrapping_sub(gravity);
        if let Some(jump) = jump_speed {
            if self.grounded {
                self.speed.y = jump;
                self.grounded = false;
            }
        }
    }

    /// Move by the current speed and resolve against the world.
    pub fn integrate(&mut self, shape: CollisionShape, world: &dyn CollisionService) {
        let offset = FixedVec3::new(0, shape.center_y, 0);
        let from = self.position + offset;
        let to = from + self.speed;
        self.grounded = false;

        let Some(contact) = world.sweep_sphere(from, to, shape.radius) else {
            self.position = to - offset;
            return;
        };

        let normal = contact.plane.normal;
        let depth = contact.plane.distance(contact.position).wrapping_sub(shape.radius);
        let center = if depth < 0 {
            contact.position - normal.scale(depth)
        } else {
            contact.position
        };
        self.position = center - offset;

        let into = self.speed.dot(normal);
        if into < 0 {
            self.speed = self.speed - normal.scale(into);
        }
        if normal.y >= FLOOR_NORMAL_Y {
            self.speed.y = 0;
            self.grounded = true;
            self.terrain = contact.terrain;
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::fixed::from_int;
    use crate::game::hunter::Hunter;
    use proptest::prelude::*;

    fn biped_shape(values: &HunterValues) -> CollisionShape {
        CollisionShape {
            center_y: values.biped_col_radius,
            radius: values.biped_col_radius,
        }
    }

    fn grounded_body() -> Body {
        Body { grounded: true, ..Body::default() }
    }

    #[test]
    fn test_speed_clamp_lands_exactly_on_cap() {
        let values = Hunter::Samus.values();
        let mut body = grounded_body();
        // Just below the cap, moving straight ahead
        body.speed = FixedVec3::new(0, 0, values.walk_speed_cap - 1);
        body.accelerate(values, MoveIntent { forward: FIXED_ONE, strafe: 0, jump: false });
        assert_eq!(body.speed.horizontal().length(), values.walk_speed_cap);
        assert_eq!(body.speed.z, values.walk_speed_cap);
    }

    #[test]
    fn test_speed_clamp_exact_off_axis() {
        let values = Hunter::Samus.values();
        let mut body = grounded_body();
        body.speed = FixedVec3::new(-407, 0, 12800);
        assert!(body.speed.length() < values.walk_speed_cap);
        body.accelerate(values, MoveIntent { forward: FIXED_ONE, strafe: 0, jump: false });
        assert_eq!(body.speed.horizontal().length(), values.walk_speed_cap);
        assert!(body.speed.x < 0);
    }

    proptest! {
        #[test]
        fn prop_speed_clamp_lands_on_cap(
            x in -13_000i32..13_000,
            z in -13_000i32..13_000,
            strafe in -FIXED_ONE..=FIXED_ONE,
        ) {
            let values = Hunter::Samus.values();
            let mut body = grounded_body();
            body.speed = FixedVec3::new(x, 0, z);
            prop_assume!(body.speed.length() < values.walk_speed_cap);
            body.accelerate(values, MoveIntent { forward: FIXED_ONE, strafe, jump: false });
            let mut uncapped = HunterValues { walk_speed_cap: Fixed::MAX, ..*values };
            uncapped.strafe_speed_cap = Fixed::MAX;
            let mut free = grounded_body();
            free.speed = FixedVec3::new(x, 0, z);
            free.accelerate(&uncapped, MoveIntent { forward: FIXED_ONE, strafe, jump: false });

            let len = body.speed.horizontal().length();
            if free.speed.horizontal().length() > values.walk_speed_cap {
                prop_assert_eq!(len, values.walk_speed_cap);
            } else {
                prop_assert_eq!(body.speed, free.speed);
            }
        }
    }

    #[test]
    fn test_speed_clamp_keeps_excess_momentum() {
        let values = Hunter::Samus.values();
        let mut body = grounded_body();
        let fast = values.walk_speed_cap * 2;
        body.speed = FixedVec3::new(0, 0, fast);
        body.accelerate(values, MoveIntent { forward: FIXED_ONE, strafe: 0, jump: false });
        assert_eq!(body.speed.z, fast);
    }

    #[test]
    fn test_below_cap_unclamped() {
        let values = Hunter::Samus.values();
        let mut body = grounded_body();
        body.accelerate(values, MoveIntent { forward: FIXED_ONE, strafe: 0, jump: false });
        assert_eq!(body.speed.z, values.walk_traction);
        assert_eq!(body.speed.x, 0);
    }

    #[test]
    fn test_idle_friction() {
        let values = Hunter::Samus.values();
        let mut body = grounded_body();
        body.speed = FixedVec3::new(0, 0, to_fixed(0.1));
        body.accelerate(values, MoveIntent::default());
        assert!(body.speed.z < to_fixed(0.1));
        assert!(body.speed.z > 0);
    }

    #[test]
    fn test_falls_and_lands() {
        let values = Hunter::Samus.values();
        let floor = FloorPlane::at(0);
        let mut body = Body { position: FixedVec3::from_ints(0, 2, 0), ..Body::default() };
        for _ in 0..120 {
            body.apply_vertical(values.biped_gravity, None);
            body.integrate(biped_shape(values), &floor);
        }
        assert!(body.grounded);
        assert_eq!(body.position.y, 0);
        assert_eq!(body.speed.y, 0);
    }

    #[test]
    fn test_jump_only_when_grounded() {
        let values = Hunter::Samus.values();
        let mut body = grounded_body();
        body.apply_vertical(values.biped_gravity, Some(values.jump_speed));
        assert_eq!(body.speed.y, values.jump_speed);
        assert!(!body.grounded);

        body.apply_vertical(values.biped_gravity, Some(values.jump_speed));
        assert_eq!(body.speed.y, values.jump_speed - values.biped_gravity);
    }

    #[test]
    fn test_jump_pad_lock() {
        let values = Hunter::Samus.values();
        let mut body = grounded_body();
        body.activate_jump_pad(FixedVec3::new(0, to_fixed(0.5), from_int(1)), 2);
        assert_eq!(body.jump_pad_lock, JUMP_PAD_MIN_LOCK);
        assert!(!body.grounded);

        // Pad speed is above the cap and is kept while locked
        body.accelerate(values, MoveIntent { forward: FIXED_ONE, strafe: 0, jump: false });
        assert_eq!(body.speed.z, from_int(1));
        assert_eq!(body.jump_pad_lock, JUMP_PAD_MIN_LOCK - 1);
    }

    #[test]
    fn test_hazard_volume() {
        let floor = FloorPlane {
            hazards: vec![HazardVolume {
                min: FixedVec3::from_ints(-1, -1, -1),
                max: FixedVec3::from_ints(1, 1, 1),
                hazard: Hazard::Lava,
            }],
            ..FloorPlane::at(0)
        };
        assert_eq!(floor.hazard_at(FixedVec3::ZERO), Some(Hazard::Lava));
        assert_eq!(floor.hazard_at(FixedVec3::from_ints(3, 0, 0)), None);
    }

    #[test]
    fn test_aim_ignores_zero() {
        let mut body = Body::default();
        body.aim(FixedVec3::ZERO);
        assert_eq!(body.facing, FixedVec3::FORWARD);
        body.aim(FixedVec3::from_ints(3, 0, 0));
        assert_eq!(body.facing, FixedVec3::new(FIXED_ONE, 0, 0));
    }
}
