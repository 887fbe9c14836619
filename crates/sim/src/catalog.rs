//! Weapon catalog: static per-type geometry indexed by weapon kind.
//!
//! Six weapon instances are in play, two per kind. A weapon slot maps to its
//! kind by `slot / 2` with the ordering mace, axe, sword. The beats-relation in
//! [`crate::collision::resolve_interaction`] depends on this ordering.

use nalgebra::{Isometry3, Point3, Translation3, UnitQuaternion, Vector3};
use serde::Deserialize;
use thiserror::Error;

// ============================================================================
// Weapon Identity
// ============================================================================

/// Number of weapon slots in a match.
pub const WEAPON_SLOTS: usize = 6;

/// Raw wire value meaning "no weapon held".
pub const NO_WEAPON: i32 = -1;

/// Number of sample spheres along the sword blade.
pub const BLADE_SAMPLES: usize = 9;

/// Distance between consecutive blade samples.
pub const BLADE_SAMPLE_SPACING: f32 = 1.0 / 15.0;

/// Weapon kind, ordered by type index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum WeaponKind {
    Mace = 0,
    Axe = 1,
    Sword = 2,
}

impl WeaponKind {
    pub const ALL: [WeaponKind; 3] = [Self::Mace, Self::Axe, Self::Sword];

    /// Type index used by the interaction rule (`slot / 2`).
    pub fn type_index(self) -> u8 {
        self as u8
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mace => "mace",
            Self::Axe => "axe",
            Self::Sword => "sword",
        }
    }
}

/// Raw weapon value outside the closed slot enumeration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("weapon slot {0} is outside [-1, 5]")]
pub struct SlotError(pub i32);

/// One of the six weapon instances in play.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct WeaponSlot(u8);

impl WeaponSlot {
    /// Returns `None` for indices outside `0..6`.
    pub fn new(index: u8) -> Option<Self> {
        (usize::from(index) < WEAPON_SLOTS).then_some(Self(index))
    }

    /// Parse a raw wire value. `-1` decodes to `None` (unarmed).
    pub fn from_raw(raw: i32) -> Result<Option<Self>, SlotError> {
        if raw == NO_WEAPON {
            return Ok(None);
        }
        u8::try_from(raw)
            .ok()
            .and_then(Self::new)
            .map(Some)
            .ok_or(SlotError(raw))
    }

    /// Encode a held weapon as its raw wire value.
    pub fn to_raw(held: Option<Self>) -> i32 {
        held.map_or(NO_WEAPON, |slot| i32::from(slot.0))
    }

    /// Iterate all slots in index order.
    pub fn all() -> impl Iterator<Item = WeaponSlot> {
        (0..WEAPON_SLOTS as u8).map(Self)
    }

    pub fn index(self) -> usize {
        usize::from(self.0)
    }

    pub fn type_index(self) -> u8 {
        self.0 / 2
    }

    pub fn kind(self) -> WeaponKind {
        match self.type_index() {
            0 => WeaponKind::Mace,
            1 => WeaponKind::Axe,
            2 => WeaponKind::Sword,
            other => unreachable!("weapon slot {} maps to type {}", self.0, other),
        }
    }
}

impl std::fmt::Display for WeaponSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}#{}", self.kind().as_str(), self.0)
    }
}

// ============================================================================
// Geometry
// ============================================================================

/// Collision shape in the weapon's local frame.
#[derive(Debug, Clone, PartialEq)]
pub enum CollisionShape {
    /// Single sphere around the weapon head.
    Sphere { center: Point3<f32>, radius: f32 },
    /// Sample spheres along a blade, base first.
    Blade {
        points: [Point3<f32>; BLADE_SAMPLES],
        radius: f32,
    },
}

impl CollisionShape {
    pub fn radius(&self) -> f32 {
        match self {
            Self::Sphere { radius, .. } | Self::Blade { radius, .. } => *radius,
        }
    }

    /// Local collision anchor: sphere centre or blade base.
    pub fn anchor(&self) -> Point3<f32> {
        match self {
            Self::Sphere { center, .. } => *center,
            Self::Blade { points, .. } => points[0],
        }
    }
}

/// Immutable geometry for one weapon kind.
#[derive(Debug, Clone, PartialEq)]
pub struct WeaponGeometry {
    /// Grip point relative to the weapon's local origin.
    pub handle: Vector3<f32>,
    pub shape: CollisionShape,
}

impl WeaponGeometry {
    /// Transform from the grip (hand) frame to the weapon's local origin.
    ///
    /// Applying it after the hand pose makes the grip, not the model origin,
    /// track the hand.
    pub fn grip_to_origin(&self) -> Isometry3<f32> {
        Isometry3::from_parts(Translation3::from(-self.handle), UnitQuaternion::identity())
    }
}

// ============================================================================
// Tuning
// ============================================================================

/// Tunable catalog parameters.
///
/// Radii must keep `sword < mace < axe < head`.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CatalogTuning {
    pub mace_radius: f32,
    pub axe_radius: f32,
    pub sword_radius: f32,
    pub head_radius: f32,
}

impl Default for CatalogTuning {
    fn default() -> Self {
        Self {
            mace_radius: 0.08,
            axe_radius: 0.13,
            sword_radius: 0.04,
            head_radius: 0.2,
        }
    }
}

/// Rejected catalog tuning.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CatalogError {
    #[error("{name} radius must be finite and positive, got {value}")]
    InvalidRadius { name: &'static str, value: f32 },
    #[error(
        "radii must satisfy sword < mace < axe < head \
         (sword={sword}, mace={mace}, axe={axe}, head={head})"
    )]
    Ordering {
        sword: f32,
        mace: f32,
        axe: f32,
        head: f32,
    },
}

impl CatalogTuning {
    pub fn validate(&self) -> Result<(), CatalogError> {
        for (name, value) in [
            ("mace", self.mace_radius),
            ("axe", self.axe_radius),
            ("sword", self.sword_radius),
            ("head", self.head_radius),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(CatalogError::InvalidRadius { name, value });
            }
        }

        let ordered = self.sword_radius < self.mace_radius
            && self.mace_radius < self.axe_radius
            && self.axe_radius < self.head_radius;
        if !ordered {
            return Err(CatalogError::Ordering {
                sword: self.sword_radius,
                mace: self.mace_radius,
                axe: self.axe_radius,
                head: self.head_radius,
            });
        }
        Ok(())
    }
}

// ============================================================================
// Catalog
// ============================================================================

/// Lookup table of weapon geometry, indexed by [`WeaponKind`].
#[derive(Debug, Clone, PartialEq)]
pub struct WeaponCatalog {
    geometry: [WeaponGeometry; 3],
    head_radius: f32,
}

impl Default for WeaponCatalog {
    fn default() -> Self {
        Self::build(&CatalogTuning::default())
    }
}

impl WeaponCatalog {
    /// Build a catalog from validated tuning.
    pub fn new(tuning: &CatalogTuning) -> Result<Self, CatalogError> {
        tuning.validate()?;
        Ok(Self::build(tuning))
    }

    fn build(tuning: &CatalogTuning) -> Self {
        let mace = WeaponGeometry {
            handle: Vector3::new(0.005, -0.2, 0.0),
            shape: CollisionShape::Sphere {
                center: Point3::new(0.0, 0.42, 0.0),
                radius: tuning.mace_radius,
            },
        };
        let axe = WeaponGeometry {
            handle: Vector3::new(0.0, -0.1, -0.01),
            shape: CollisionShape::Sphere {
                center: Point3::new(0.0, 0.3, 0.0),
                radius: tuning.axe_radius,
            },
        };
        let sword = WeaponGeometry {
            handle: Vector3::new(-0.005, -0.22, 0.0),
            shape: CollisionShape::Blade {
                points: std::array::from_fn(|i| {
                    Point3::new(0.0, i as f32 * BLADE_SAMPLE_SPACING, 0.0)
                }),
                radius: tuning.sword_radius,
            },
        };

        Self {
            geometry: [mace, axe, sword],
            head_radius: tuning.head_radius,
        }
    }

    pub fn geometry_for(&self, kind: WeaponKind) -> &WeaponGeometry {
        &self.geometry[usize::from(kind.type_index())]
    }

    pub fn radius_for(&self, slot: WeaponSlot) -> f32 {
        self.geometry_for(slot.kind()).shape.radius()
    }

    pub fn handle_offset(&self, slot: WeaponSlot) -> Vector3<f32> {
        self.geometry_for(slot.kind()).handle
    }

    /// Transform from a weapon's local origin to its collision anchor.
    pub fn local_collision_transform(&self, slot: WeaponSlot) -> Isometry3<f32> {
        let anchor = self.geometry_for(slot.kind()).shape.anchor();
        Isometry3::from_parts(Translation3::from(anchor.coords), UnitQuaternion::identity())
    }

    pub fn head_radius(&self) -> f32 {
        self.head_radius
    }
}
