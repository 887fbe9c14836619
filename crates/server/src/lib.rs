//! Duelist Session Coordinator
//!
//! The coordinator mediates between headset clients and the arbitration core.
//! It owns:
//! - Player index assignment at handshake
//! - Push validation and decoding
//! - The single authoritative [`SessionState`]
//!
//! # Concurrency
//!
//! [`Server`] is `Sync` and meant to be shared as `Arc<Server>` across RPC
//! worker threads. One mutex guards the whole match; it is held across the
//! store, evaluate and visibility update of a push so no caller ever sees a
//! half-applied update. Validation and decoding happen before the lock.

#![deny(unsafe_code)]

pub mod config;
pub mod error;
pub mod session;
pub mod validation;

use std::sync::{Mutex, MutexGuard};

use duelist_sim::{PlayerInfo, PlayerSlot, SessionState, WEAPON_SLOTS, WeaponCatalog};
use duelist_wire::{HandshakeRequest, HandshakeResponse, PushRequest, PushResponse};
use log::{debug, info, warn};

pub use config::{ConfigError, ServerConfig};
pub use error::SessionError;
use session::SessionRegistry;
use validation::{ValidatedPush, sanitize_name, validate_push};

// ============================================================================
// Replies
// ============================================================================

/// What a push hands back to its caller.
#[derive(Debug, Clone, PartialEq)]
pub struct PushReply {
    /// The other player's latest snapshot, idle if it has not pushed yet.
    pub opponent: PlayerInfo,
    /// Visibility flag per weapon slot.
    pub render_weapons: [bool; WEAPON_SLOTS],
}

impl From<PushReply> for PushResponse {
    fn from(reply: PushReply) -> Self {
        PushResponse::new(&reply.opponent, reply.render_weapons)
    }
}

// ============================================================================
// Server State
// ============================================================================

/// Everything guarded by the match lock.
#[derive(Debug)]
struct Match {
    state: SessionState,
    sessions: SessionRegistry,
}

/// Authoritative match server.
#[derive(Debug)]
pub struct Server {
    config: ServerConfig,
    inner: Mutex<Match>,
}

impl Default for Server {
    fn default() -> Self {
        Self::with_catalog(ServerConfig::default(), WeaponCatalog::default())
    }
}

impl Server {
    /// Create a server, validating the catalog tuning.
    pub fn new(config: ServerConfig) -> Result<Self, ConfigError> {
        let catalog = config.weapon_catalog()?;
        Ok(Self::with_catalog(config, catalog))
    }

    fn with_catalog(config: ServerConfig, catalog: WeaponCatalog) -> Self {
        Self {
            config,
            inner: Mutex::new(Match {
                state: SessionState::new(catalog),
                sessions: SessionRegistry::default(),
            }),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, Match>, SessionError> {
        self.inner.lock().map_err(|_| SessionError::StatePoisoned)
    }

    /// Assign the next player index, starting at 1.
    ///
    /// A third handshake is rejected with [`SessionError::MatchFull`].
    pub fn handshake(&self, name: &str) -> Result<u32, SessionError> {
        let name = sanitize_name(name, self.config.max_name_len);
        let mut guard = self.lock()?;

        let Some(session) = guard.sessions.admit(name) else {
            warn!("Rejected handshake: match is full");
            return Err(SessionError::MatchFull);
        };
        info!(
            "Handshake from {:?} assigned {}",
            session.name, session.slot
        );
        Ok(session.player_index())
    }

    /// Store `info` for `player_index`, arbitrate, and return the opponent.
    pub fn push(&self, info: PlayerInfo, player_index: u32) -> Result<PushReply, SessionError> {
        let Some(slot) = PlayerSlot::from_player_index(player_index) else {
            warn!("Rejected push from unknown player index {player_index}");
            return Err(SessionError::UnknownPlayer(player_index));
        };
        self.apply_push(slot, info)
    }

    fn apply_push(&self, slot: PlayerSlot, info: PlayerInfo) -> Result<PushReply, SessionError> {
        let mut guard = self.lock()?;
        let Match { state, sessions } = &mut *guard;

        let Some(session) = sessions.get_mut(slot) else {
            warn!("Rejected push from {slot}: no handshake");
            return Err(SessionError::UnknownPlayer(slot.player_index()));
        };
        session.pushes += 1;

        let evaluation = state.apply_update(slot, info);
        if !evaluation.is_quiet() {
            debug!(
                "Push {} from {slot} ({:?}): {evaluation:?}",
                session.pushes, session.name
            );
        }

        Ok(PushReply {
            opponent: state.players().info_or_idle(slot.opponent()),
            render_weapons: state.render_weapons(),
        })
    }

    // ========================================================================
    // Wire entry points
    // ========================================================================

    pub fn handle_handshake(
        &self,
        request: HandshakeRequest,
    ) -> Result<HandshakeResponse, SessionError> {
        let player_index = self.handshake(&request.name)?;
        Ok(HandshakeResponse { player_index })
    }

    /// Decode, validate and apply a push. Malformed requests never reach the
    /// match state.
    pub fn handle_push(&self, request: PushRequest) -> Result<PushResponse, SessionError> {
        let ValidatedPush { slot, info } = validate_push(request).inspect_err(|err| {
            warn!("Rejected push: {err}");
        })?;
        self.apply_push(slot, info).map(PushResponse::from)
    }

    // ========================================================================
    // Observability
    // ========================================================================

    /// Number of handshakes accepted.
    pub fn player_count(&self) -> Result<usize, SessionError> {
        Ok(self.lock()?.sessions.admitted())
    }

    pub fn render_weapons(&self) -> Result<[bool; WEAPON_SLOTS], SessionError> {
        Ok(self.lock()?.state.render_weapons())
    }

    /// Last stored snapshot for `slot`, `None` if it never pushed.
    pub fn snapshot(&self, slot: PlayerSlot) -> Result<Option<PlayerInfo>, SessionError> {
        let guard = self.lock()?;
        Ok(guard
            .state
            .players()
            .get(slot)
            .map(|record| record.info.clone()))
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    use duelist_sim::WeaponSlot;
    use duelist_wire::PlayerInfoProto;
    use nalgebra::{Matrix4, Point3, Vector3};
    use prost::Message;

    fn init_logger() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn matched_server() -> Server {
        init_logger();
        let server = Server::default();
        assert_eq!(server.handshake("left").unwrap(), 1);
        assert_eq!(server.handshake("right").unwrap(), 2);
        server
    }

    /// Snapshot with the head at `head` and the right hand at `hand`.
    fn player(weapon: Option<WeaponSlot>, head: Vector3<f32>, hand: Vector3<f32>) -> PlayerInfo {
        PlayerInfo {
            held_weapon: weapon,
            head_in_world: Matrix4::new_translation(&head),
            rhand_in_world: Matrix4::new_translation(&hand),
            lhand_in_world: Matrix4::identity(),
            dead: false,
        }
    }

    /// Hand position that puts `weapon`'s collision anchor at `target`.
    fn hand_for_anchor(weapon: WeaponSlot, target: Point3<f32>) -> Vector3<f32> {
        let catalog = WeaponCatalog::default();
        let geometry = catalog.geometry_for(weapon.kind());
        target.coords + geometry.handle - geometry.shape.anchor().coords
    }

    fn far_head(x: f32) -> Vector3<f32> {
        Vector3::new(x, 50.0, 0.0)
    }

    #[test]
    fn test_handshake_assigns_sequential_indices() {
        init_logger();
        let server = Server::default();
        assert_eq!(server.player_count().unwrap(), 0);

        assert_eq!(server.handshake("quest-a").unwrap(), 1);
        assert_eq!(server.handshake("quest-b").unwrap(), 2);
        assert_eq!(server.handshake("quest-c"), Err(SessionError::MatchFull));
        assert_eq!(server.handshake("quest-d"), Err(SessionError::MatchFull));
        assert_eq!(server.player_count().unwrap(), 2);
    }

    #[test]
    fn test_handle_handshake() {
        init_logger();
        let server = Server::default();
        let response = server
            .handle_handshake(HandshakeRequest {
                name: "headset".to_string(),
            })
            .unwrap();
        assert_eq!(response.player_index, 1);
    }

    #[test]
    fn test_push_before_handshake_rejected() {
        init_logger();
        let server = Server::default();
        server.handshake("solo").unwrap();

        let info = PlayerInfo::idle();
        assert_eq!(
            server.push(info.clone(), 2),
            Err(SessionError::UnknownPlayer(2))
        );
        assert_eq!(
            server.push(info.clone(), 0),
            Err(SessionError::UnknownPlayer(0))
        );
        assert_eq!(
            server.push(info, 9),
            Err(SessionError::UnknownPlayer(9))
        );
        assert_eq!(server.snapshot(PlayerSlot::SECOND).unwrap(), None);
        assert_eq!(server.render_weapons().unwrap(), [true; WEAPON_SLOTS]);
    }

    #[test]
    fn test_push_returns_idle_until_opponent_reports() {
        let server = matched_server();

        let first = player(WeaponSlot::new(1), far_head(0.0), Vector3::zeros());
        let reply = server.push(first.clone(), 1).unwrap();
        assert_eq!(reply.opponent, PlayerInfo::idle());
        assert_eq!(reply.render_weapons, [true; WEAPON_SLOTS]);

        let second = player(WeaponSlot::new(3), far_head(10.0), Vector3::new(10.0, 0.0, 0.0));
        let reply = server.push(second.clone(), 2).unwrap();
        assert_eq!(reply.opponent, first);

        let reply = server.push(first, 1).unwrap();
        assert_eq!(reply.opponent, second);
    }

    #[test]
    fn test_sword_breaks_axe() {
        let server = matched_server();
        let sword = WeaponSlot::new(4).unwrap();
        let axe = WeaponSlot::new(2).unwrap();

        server
            .push(player(Some(sword), far_head(0.0), Vector3::zeros()), 1)
            .unwrap();

        // First blade sample of an upright sword held at the origin.
        let blade_base = Point3::origin() - WeaponCatalog::default().handle_offset(sword);
        let hand = hand_for_anchor(axe, blade_base + Vector3::new(0.1, 0.0, 0.0));
        let reply = server
            .push(player(Some(axe), far_head(0.0), hand), 2)
            .unwrap();

        assert!(!reply.render_weapons[axe.index()]);
        assert!(reply.render_weapons[sword.index()]);
        assert_eq!(server.render_weapons().unwrap(), reply.render_weapons);
        assert!(!server.snapshot(PlayerSlot::FIRST).unwrap().unwrap().dead);
    }

    #[test]
    fn test_unarmed_player_is_killed() {
        let server = matched_server();
        let mace = WeaponSlot::new(0).unwrap();

        server
            .push(player(None, Vector3::zeros(), Vector3::zeros()), 1)
            .unwrap();
        let hand = hand_for_anchor(mace, Point3::new(0.1, 0.0, 0.0));
        let reply = server
            .push(player(Some(mace), far_head(0.0), hand), 2)
            .unwrap();

        assert!(reply.opponent.dead);
        assert_eq!(reply.render_weapons, [true; WEAPON_SLOTS]);

        // Dead stays dead even when the client reports otherwise.
        let reply = server
            .push(player(None, Vector3::new(5.0, 0.0, 0.0), Vector3::zeros()), 1)
            .unwrap();
        assert!(!reply.opponent.dead);
        assert!(server.snapshot(PlayerSlot::FIRST).unwrap().unwrap().dead);
    }

    #[test]
    fn test_repeated_push_is_idempotent() {
        let server = matched_server();
        let left = WeaponSlot::new(0).unwrap();
        let right = WeaponSlot::new(1).unwrap();

        server
            .push(player(Some(left), far_head(0.0), Vector3::zeros()), 1)
            .unwrap();
        // Mace head of an upright mace held at the origin.
        let anchor = Point3::from(-hand_for_anchor(left, Point3::origin()));
        let second = player(Some(right), far_head(0.0), hand_for_anchor(right, anchor));

        let once = server.push(second.clone(), 2).unwrap();
        let twice = server.push(second, 2).unwrap();
        assert_eq!(once, twice);
        assert!(!once.render_weapons[left.index()]);
        assert!(!once.render_weapons[right.index()]);
    }

    #[test]
    fn test_handle_push_over_the_wire() {
        let server = matched_server();
        let first = player(WeaponSlot::new(5), far_head(0.0), Vector3::new(0.2, 1.0, 0.0));
        server.push(first.clone(), 1).unwrap();

        let request = PushRequest {
            info: Some(PlayerInfoProto::from(&PlayerInfo::idle())),
            player_index: 2,
        };
        let bytes = request.encode_to_vec();
        let decoded = PushRequest::decode(bytes.as_slice()).unwrap();

        let response = server.handle_push(decoded).unwrap();
        let bytes = response.encode_to_vec();
        let (opponent, render) = PushResponse::decode(bytes.as_slice())
            .unwrap()
            .decode_parts()
            .unwrap();
        assert_eq!(opponent, first);
        assert_eq!(render, [true; WEAPON_SLOTS]);
    }

    #[test]
    fn test_malformed_push_leaves_state_untouched() {
        let server = matched_server();

        let mut proto = PlayerInfoProto::from(&PlayerInfo::idle());
        proto.head_in_world[12] = f32::INFINITY;
        let result = server.handle_push(PushRequest {
            info: Some(proto),
            player_index: 1,
        });
        assert!(matches!(result, Err(SessionError::Wire(_))));

        let mut proto = PlayerInfoProto::from(&PlayerInfo::idle());
        proto.held_weapon = 6;
        let result = server.handle_push(PushRequest {
            info: Some(proto),
            player_index: 1,
        });
        assert!(matches!(result, Err(SessionError::Wire(_))));

        assert_eq!(server.snapshot(PlayerSlot::FIRST).unwrap(), None);
    }

    #[test]
    fn test_mirrored_hand_rejected_over_the_wire() {
        let server = matched_server();

        let mut proto = PlayerInfoProto::from(&PlayerInfo::idle());
        proto.rhand_in_world = duelist_wire::flatten_matrix(&(-Matrix4::identity()));
        proto.rhand_in_world[15] = 1.0;
        let result = server.handle_push(PushRequest {
            info: Some(proto),
            player_index: 1,
        });
        assert!(matches!(
            result,
            Err(SessionError::Wire(
                duelist_wire::WireError::DegenerateTransform { .. }
            ))
        ));
        assert_eq!(server.snapshot(PlayerSlot::FIRST).unwrap(), None);

        // The lock is still usable afterwards.
        assert!(server.push(PlayerInfo::idle(), 2).is_ok());
    }

    #[test]
    fn test_degenerate_hand_pushed_directly_returns() {
        let server = matched_server();
        let mut mirrored = PlayerInfo::idle();
        mirrored.held_weapon = WeaponSlot::new(4);
        mirrored.rhand_in_world = -Matrix4::identity();
        mirrored.rhand_in_world[(3, 3)] = 1.0;
        server.push(mirrored, 1).unwrap();

        let mut squashed = PlayerInfo::idle();
        squashed.held_weapon = WeaponSlot::new(2);
        squashed.rhand_in_world =
            Matrix4::from_diagonal(&nalgebra::Vector4::new(1e-30, 1.0, 1e30, 1.0));
        server.push(squashed, 2).unwrap();

        assert_eq!(server.player_count().unwrap(), 2);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = ServerConfig::from_toml_str("[catalog]\nsword_radius = 0.5");
        assert!(config.is_err());

        let mut config = ServerConfig::default();
        config.catalog.head_radius = -1.0;
        assert!(matches!(Server::new(config), Err(ConfigError::Catalog(_))));
    }

    #[test]
    fn test_concurrent_pushes_stay_consistent() {
        const PUSHES: u32 = 200;
        let server = Arc::new(matched_server());

        let handles: Vec<_> = [1u32, 2]
            .into_iter()
            .map(|player_index| {
                let server = Arc::clone(&server);
                thread::spawn(move || {
                    let x = player_index as f32 * 100.0;
                    for step in 0..PUSHES {
                        let y = step as f32;
                        // Head and hand move together so a torn snapshot shows.
                        let info = player(
                            None,
                            Vector3::new(x, y, 0.0),
                            Vector3::new(x, y, 0.0),
                        );
                        let reply = server.push(info, player_index).unwrap();
                        let opponent = &reply.opponent;
                        assert_eq!(opponent.head_in_world, opponent.rhand_in_world);
                        assert!(!opponent.dead);
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        for slot in PlayerSlot::all() {
            let info = server.snapshot(slot).unwrap().unwrap();
            assert_eq!(info.head_position().y, (PUSHES - 1) as f32);
        }
        assert_eq!(server.render_weapons().unwrap(), [true; WEAPON_SLOTS]);
    }
}
