//! Duelist Wire Protocol Types
//!
//! This crate defines the Protobuf message types exchanged between the headset
//! client and the match server. Framing and transport belong to the RPC layer;
//! this crate only fixes the schema and the conversions to core types.
//!
//! # Calls
//!
//! - `handshake`: [`HandshakeRequest`] → [`HandshakeResponse`]
//! - `push`: [`PushRequest`] → [`PushResponse`]
//!
//! # Matrix Layout
//!
//! Every 4×4 transform is sent as exactly 16 floats in column-major order:
//! column 0 rows 0..3, then column 1, and so on. The translation therefore
//! sits at indices 12, 13 and 14.

#![deny(unsafe_code)]

use duelist_sim::{PlayerInfo, SlotError, WEAPON_SLOTS, WeaponSlot};
use nalgebra::Matrix4;
use thiserror::Error;

/// Number of floats in a flattened transform.
pub const MATRIX_LEN: usize = 16;

/// Smallest accepted determinant of a hand transform's 3×3 block.
///
/// Rejects reflections and collapsed scales, which have no grip orientation.
pub const MIN_HAND_DETERMINANT: f32 = 1.0e-9;

// ============================================================================
// Messages
// ============================================================================

/// Client announces itself.
#[derive(Clone, PartialEq, prost::Message)]
pub struct HandshakeRequest {
    /// Free-form client name, used for logging only.
    #[prost(string, tag = "1")]
    pub name: String,
}

/// Server assigns a player index.
#[derive(Clone, PartialEq, prost::Message)]
pub struct HandshakeResponse {
    /// 1-based player index; pass it back on every push.
    #[prost(uint32, tag = "1")]
    pub player_index: u32,
}

/// One player's snapshot.
#[derive(Clone, PartialEq, prost::Message)]
pub struct PlayerInfoProto {
    /// Weapon slot in `[-1, 5]`, `-1` when unarmed.
    #[prost(sint32, tag = "1")]
    pub held_weapon: i32,

    /// Head transform, column-major.
    #[prost(float, repeated, tag = "2")]
    pub head_in_world: Vec<f32>,

    /// Right hand transform, column-major.
    #[prost(float, repeated, tag = "3")]
    pub rhand_in_world: Vec<f32>,

    /// Left hand transform, column-major.
    #[prost(float, repeated, tag = "4")]
    pub lhand_in_world: Vec<f32>,

    #[prost(bool, tag = "5")]
    pub dead: bool,
}

/// Per-frame pose upload.
#[derive(Clone, PartialEq, prost::Message)]
pub struct PushRequest {
    #[prost(message, optional, tag = "1")]
    pub info: Option<PlayerInfoProto>,

    /// Index returned by the handshake.
    #[prost(uint32, tag = "2")]
    pub player_index: u32,
}

/// Opponent state returned on every push.
#[derive(Clone, PartialEq, prost::Message)]
pub struct PushResponse {
    #[prost(message, optional, tag = "1")]
    pub opponent: Option<PlayerInfoProto>,

    /// One visibility flag per weapon slot.
    #[prost(bool, repeated, tag = "2")]
    pub render_weapons: Vec<bool>,
}

// ============================================================================
// Errors
// ============================================================================

/// A message that cannot be turned into core types.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum WireError {
    #[error("missing field `{0}`")]
    MissingField(&'static str),
    #[error("`{field}` has {len} elements, expected {MATRIX_LEN}")]
    MatrixLength { field: &'static str, len: usize },
    #[error("`{field}` element {index} is not finite")]
    NonFinite { field: &'static str, index: usize },
    #[error(transparent)]
    Slot(#[from] SlotError),
    #[error("`{field}` is a reflection or degenerate (determinant {determinant})")]
    DegenerateTransform {
        field: &'static str,
        determinant: f32,
    },
    #[error("render_weapons has {0} entries, expected {WEAPON_SLOTS}")]
    RenderWeaponsLength(usize),
}

// ============================================================================
// Conversions
// ============================================================================

/// Flatten a transform in column-major order.
pub fn flatten_matrix(m: &Matrix4<f32>) -> Vec<f32> {
    m.as_slice().to_vec()
}

/// Rebuild a transform from 16 column-major floats.
pub fn unflatten_matrix(field: &'static str, values: &[f32]) -> Result<Matrix4<f32>, WireError> {
    if values.len() != MATRIX_LEN {
        return Err(WireError::MatrixLength {
            field,
            len: values.len(),
        });
    }
    if let Some(index) = values.iter().position(|v| !v.is_finite()) {
        return Err(WireError::NonFinite { field, index });
    }
    Ok(Matrix4::from_column_slice(values))
}

/// Rebuild a hand transform, which must carry an orientation.
pub fn unflatten_hand(field: &'static str, values: &[f32]) -> Result<Matrix4<f32>, WireError> {
    let m = unflatten_matrix(field, values)?;
    let determinant = m.fixed_view::<3, 3>(0, 0).into_owned().determinant();
    if !(determinant > MIN_HAND_DETERMINANT) {
        return Err(WireError::DegenerateTransform { field, determinant });
    }
    Ok(m)
}

impl From<&PlayerInfo> for PlayerInfoProto {
    fn from(info: &PlayerInfo) -> Self {
        Self {
            held_weapon: WeaponSlot::to_raw(info.held_weapon),
            head_in_world: flatten_matrix(&info.head_in_world),
            rhand_in_world: flatten_matrix(&info.rhand_in_world),
            lhand_in_world: flatten_matrix(&info.lhand_in_world),
            dead: info.dead,
        }
    }
}

impl TryFrom<PlayerInfoProto> for PlayerInfo {
    type Error = WireError;

    fn try_from(proto: PlayerInfoProto) -> Result<Self, Self::Error> {
        Ok(Self {
            held_weapon: WeaponSlot::from_raw(proto.held_weapon)?,
            head_in_world: unflatten_matrix("head_in_world", &proto.head_in_world)?,
            rhand_in_world: unflatten_hand("rhand_in_world", &proto.rhand_in_world)?,
            lhand_in_world: unflatten_matrix("lhand_in_world", &proto.lhand_in_world)?,
            dead: proto.dead,
        })
    }
}

impl PushRequest {
    /// Decode the carried snapshot.
    pub fn player_info(self) -> Result<PlayerInfo, WireError> {
        self.info
            .ok_or(WireError::MissingField("info"))?
            .try_into()
    }
}

impl PushResponse {
    pub fn new(opponent: &PlayerInfo, render_weapons: [bool; WEAPON_SLOTS]) -> Self {
        Self {
            opponent: Some(opponent.into()),
            render_weapons: render_weapons.to_vec(),
        }
    }

    /// Decode the opponent snapshot and the visibility flags.
    pub fn decode_parts(self) -> Result<(PlayerInfo, [bool; WEAPON_SLOTS]), WireError> {
        let render_weapons: [bool; WEAPON_SLOTS] = self
            .render_weapons
            .as_slice()
            .try_into()
            .map_err(|_| WireError::RenderWeaponsLength(self.render_weapons.len()))?;
        let opponent = self
            .opponent
            .ok_or(WireError::MissingField("opponent"))?
            .try_into()?;
        Ok((opponent, render_weapons))
    }
}

// ============================================================================
// Tests
// ============================================================================
