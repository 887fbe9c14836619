//! Request validation, performed before the match lock is taken.
//!
//! - Player index outside `1..=2`: REJECT
//! - Missing info: REJECT
//! - Matrix with wrong length or NaN/Inf element: REJECT
//! - Right hand mirrored or collapsed (3×3 determinant near or below zero): REJECT
//! - Weapon outside `[-1, 5]`: REJECT
//! - Client name: control characters dropped, truncated

use duelist_sim::{PlayerInfo, PlayerSlot};
use duelist_wire::PushRequest;

use crate::error::SessionError;

/// A push that passed structural checks.
///
/// Whether the index was actually handed out is checked under the lock.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedPush {
    pub slot: PlayerSlot,
    pub info: PlayerInfo,
}

/// Validate and decode a push request.
pub fn validate_push(request: PushRequest) -> Result<ValidatedPush, SessionError> {
    let player_index = request.player_index;
    let slot = PlayerSlot::from_player_index(player_index)
        .ok_or(SessionError::UnknownPlayer(player_index))?;
    let info = request.player_info()?;
    Ok(ValidatedPush { slot, info })
}

/// Clean up a client-supplied name for logging.
pub fn sanitize_name(name: &str, max_len: usize) -> String {
    name.chars()
        .filter(|c| !c.is_control())
        .take(max_len)
        .collect()
}
