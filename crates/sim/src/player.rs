//! Player state store.
//!
//! Holds the last snapshot each player pushed plus the pose data derived from
//! it. Records are replaced wholesale on every update from their owner, except
//! for the `dead` flag which only ever goes from `false` to `true`.

use nalgebra::{Isometry3, Matrix4, Point3, UnitQuaternion};

use crate::catalog::WeaponSlot;
use crate::geometry::{compose, origin_of, pose_from_matrix};

/// Number of player slots in a match.
pub const MAX_PLAYERS: usize = 2;

/// Zero-based player slot.
///
/// Clients address themselves with the 1-based player index handed out at
/// handshake; [`PlayerSlot::from_player_index`] performs that mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PlayerSlot(u8);

impl PlayerSlot {
    pub const FIRST: PlayerSlot = PlayerSlot(0);
    pub const SECOND: PlayerSlot = PlayerSlot(1);

    pub fn new(index: usize) -> Option<Self> {
        (index < MAX_PLAYERS).then(|| Self(index as u8))
    }

    /// Map a 1-based player index to its slot.
    pub fn from_player_index(player_index: u32) -> Option<Self> {
        let index = usize::try_from(player_index.checked_sub(1)?).ok()?;
        Self::new(index)
    }

    /// 1-based player index as seen by clients.
    pub fn player_index(self) -> u32 {
        u32::from(self.0) + 1
    }

    pub fn index(self) -> usize {
        usize::from(self.0)
    }

    /// The other slot of a two-player match.
    pub fn opponent(self) -> Self {
        Self((self.0 + 1) % MAX_PLAYERS as u8)
    }

    pub fn all() -> impl Iterator<Item = PlayerSlot> {
        (0..MAX_PLAYERS as u8).map(Self)
    }
}

impl std::fmt::Display for PlayerSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "player {}", self.player_index())
    }
}

/// Snapshot of one player as exchanged with clients.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerInfo {
    pub held_weapon: Option<WeaponSlot>,
    pub head_in_world: Matrix4<f32>,
    pub rhand_in_world: Matrix4<f32>,
    pub lhand_in_world: Matrix4<f32>,
    pub dead: bool,
}

impl PlayerInfo {
    /// Unarmed, alive, all transforms at the world origin.
    pub fn idle() -> Self {
        Self {
            held_weapon: None,
            head_in_world: Matrix4::identity(),
            rhand_in_world: Matrix4::identity(),
            lhand_in_world: Matrix4::identity(),
            dead: false,
        }
    }

    pub fn head_position(&self) -> Point3<f32> {
        origin_of(&self.head_in_world)
    }
}

impl Default for PlayerInfo {
    fn default() -> Self {
        Self::idle()
    }
}

/// World pose of a weapon grip, taken from the right hand.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeaponPose {
    pub position: Point3<f32>,
    pub rotation: UnitQuaternion<f32>,
}

impl WeaponPose {
    pub fn from_hand(rhand_in_world: &Matrix4<f32>) -> Self {
        let pose = pose_from_matrix(rhand_in_world);
        Self {
            position: pose.translation.vector.into(),
            rotation: pose.rotation,
        }
    }

    /// Grip transform in world space.
    pub fn grip(&self) -> Isometry3<f32> {
        compose(&self.position, &self.rotation)
    }
}

/// Stored state for one player.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerRecord {
    pub info: PlayerInfo,
    pub grip: WeaponPose,
    pub head: Point3<f32>,
}

impl PlayerRecord {
    fn new(info: PlayerInfo) -> Self {
        Self {
            grip: WeaponPose::from_hand(&info.rhand_in_world),
            head: info.head_position(),
            info,
        }
    }
}

/// Per-slot player records.
#[derive(Debug, Clone, Default)]
pub struct PlayerStore {
    records: [Option<PlayerRecord>; MAX_PLAYERS],
}

impl PlayerStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the snapshot for `slot` and recompute its derived poses.
    ///
    /// A stored `dead = true` survives an incoming `dead = false`.
    pub fn apply_update(&mut self, slot: PlayerSlot, mut info: PlayerInfo) -> &PlayerRecord {
        let entry = &mut self.records[slot.index()];
        if let Some(previous) = entry.as_ref() {
            info.dead |= previous.info.dead;
        }
        entry.insert(PlayerRecord::new(info))
    }

    pub fn get(&self, slot: PlayerSlot) -> Option<&PlayerRecord> {
        self.records[slot.index()].as_ref()
    }

    /// Stored snapshot, or an idle one if `slot` has not reported yet.
    pub fn info_or_idle(&self, slot: PlayerSlot) -> PlayerInfo {
        self.get(slot)
            .map(|record| record.info.clone())
            .unwrap_or_default()
    }

    /// Set the dead flag. Returns `true` if the player was alive before.
    pub fn mark_dead(&mut self, slot: PlayerSlot) -> bool {
        match self.records[slot.index()].as_mut() {
            Some(record) if !record.info.dead => {
                record.info.dead = true;
                true
            }
            _ => false,
        }
    }

    /// Records of players that have reported at least once, in slot order.
    pub fn reported(&self) -> impl Iterator<Item = (PlayerSlot, &PlayerRecord)> {
        PlayerSlot::all().filter_map(|slot| self.get(slot).map(|record| (slot, record)))
    }
}
