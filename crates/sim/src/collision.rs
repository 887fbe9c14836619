//! Collision and interaction rules.
//!
//! Mace and axe heads are single spheres. The sword blade is a row of sample
//! spheres; every test against it uses the nearest sample, which can miss a
//! penetration that falls between samples. All tests compare a centre distance
//! against a sum of radii with a strict `<`.

use nalgebra::Point3;

use crate::catalog::{BLADE_SAMPLES, CollisionShape, WeaponCatalog, WeaponSlot};
use crate::geometry::{Sphere, closest_distance};
use crate::player::{PlayerRecord, WeaponPose};

// ============================================================================
// World-space colliders
// ============================================================================

/// A weapon's collision volume in world space.
#[derive(Debug, Clone, PartialEq)]
pub enum Collider {
    Sphere(Sphere),
    Blade {
        points: [Point3<f32>; BLADE_SAMPLES],
        radius: f32,
    },
}

impl Collider {
    /// Place `slot`'s collision shape at a grip pose.
    pub fn for_weapon(catalog: &WeaponCatalog, slot: WeaponSlot, grip: &WeaponPose) -> Self {
        let geometry = catalog.geometry_for(slot.kind());
        let origin = grip.grip() * geometry.grip_to_origin();

        match &geometry.shape {
            CollisionShape::Sphere { radius, .. } => {
                let anchor = origin * catalog.local_collision_transform(slot);
                Self::Sphere(Sphere::new(anchor * Point3::origin(), *radius))
            }
            CollisionShape::Blade { points, radius } => Self::Blade {
                points: points.map(|p| origin * p),
                radius: *radius,
            },
        }
    }

    pub fn radius(&self) -> f32 {
        match self {
            Self::Sphere(sphere) => sphere.radius,
            Self::Blade { radius, .. } => *radius,
        }
    }

    /// Sample centres of this collider.
    pub fn anchors(&self) -> &[Point3<f32>] {
        match self {
            Self::Sphere(sphere) => std::slice::from_ref(&sphere.center),
            Self::Blade { points, .. } => points,
        }
    }

    /// Distance from `point` to the nearest sample centre.
    pub fn distance_to(&self, point: &Point3<f32>) -> f32 {
        closest_distance(self.anchors(), point)
    }

    /// Weapon-vs-head test.
    pub fn strikes(&self, head: &Point3<f32>, head_radius: f32) -> bool {
        self.distance_to(head) < self.radius() + head_radius
    }

    /// Weapon-vs-weapon test.
    ///
    /// Each sample of `other` is tested against the nearest sample of `self`,
    /// stopping at the first hit.
    pub fn clashes_with(&self, other: &Collider) -> bool {
        let reach = self.radius() + other.radius();
        other
            .anchors()
            .iter()
            .any(|anchor| self.distance_to(anchor) < reach)
    }
}

// ============================================================================
// Pair evaluation
// ============================================================================

/// Collision inputs for one player.
#[derive(Debug, Clone, PartialEq)]
pub struct Combatant {
    pub weapon: Option<(WeaponSlot, Collider)>,
    pub head: Point3<f32>,
}

impl Combatant {
    pub fn from_record(catalog: &WeaponCatalog, record: &PlayerRecord) -> Self {
        Self {
            weapon: record
                .info
                .held_weapon
                .map(|slot| (slot, Collider::for_weapon(catalog, slot, &record.grip))),
            head: record.head,
        }
    }

    pub fn held(&self) -> Option<WeaponSlot> {
        self.weapon.as_ref().map(|(slot, _)| *slot)
    }

    fn strikes(&self, other: &Combatant, head_radius: f32) -> bool {
        self.weapon
            .as_ref()
            .is_some_and(|(_, collider)| collider.strikes(&other.head, head_radius))
    }
}

/// Outcome of testing one pair of players.
///
/// `first_struck` means the first player's head was hit by the second
/// player's weapon, and vice versa.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PairContact {
    pub weapons_clash: bool,
    pub first_struck: bool,
    pub second_struck: bool,
}

/// Test two players against each other.
///
/// An unarmed player can only be struck; the weapon-weapon test needs both
/// players armed.
pub fn check_pair(first: &Combatant, second: &Combatant, head_radius: f32) -> PairContact {
    let weapons_clash = match (&first.weapon, &second.weapon) {
        (Some((_, a)), Some((_, b))) => a.clashes_with(b),
        _ => false,
    };

    PairContact {
        weapons_clash,
        first_struck: second.strikes(first, head_radius),
        second_struck: first.strikes(second, head_radius),
    }
}

// ============================================================================
// Interaction
// ============================================================================

/// Result of two weapons meeting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interaction {
    /// Same kind: both weapons break.
    BothBreak(WeaponSlot, WeaponSlot),
    /// Different kinds: the loser breaks.
    Wins { winner: WeaponSlot, loser: WeaponSlot },
}

impl Interaction {
    pub fn broken(&self) -> Vec<WeaponSlot> {
        match *self {
            Self::BothBreak(a, b) => vec![a, b],
            Self::Wins { loser, .. } => vec![loser],
        }
    }
}

/// Decide which of two clashing weapons breaks.
///
/// Equal types both break. Otherwise the higher type index wins, unless the
/// gap is 2, where the lower one wins. With mace, axe, sword ordered 0, 1, 2:
/// axe beats mace, sword beats axe, mace beats sword.
pub fn resolve_interaction(a: WeaponSlot, b: WeaponSlot) -> Interaction {
    let (ta, tb) = (a.type_index(), b.type_index());
    if ta == tb {
        return Interaction::BothBreak(a, b);
    }

    let (higher, lower) = if ta > tb { (a, b) } else { (b, a) };
    if higher.type_index() - lower.type_index() == 2 {
        Interaction::Wins {
            winner: lower,
            loser: higher,
        }
    } else {
        Interaction::Wins {
            winner: higher,
            loser: lower,
        }
    }
}
