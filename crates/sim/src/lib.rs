//! Duelist Arbitration Core
//!
//! This crate owns the authoritative melee rules of a two-player duel:
//! weapon geometry, the per-player state store, weapon-vs-weapon and
//! weapon-vs-head collision tests, and the rock-paper-scissors breakage rule.
//!
//! # Architecture Constraints
//!
//! The core MUST NOT:
//! - Perform I/O operations (file, network, etc.)
//! - Read wall-clock time
//! - Lock or spawn threads
//!
//! Callers hand in already-sampled transforms and get back the updated
//! session state. Serialization and locking are owned by the server crate.
//!
//! # Modules
//!
//! - [`geometry`]: pose decomposition and distance helpers
//! - [`catalog`]: weapon slots, kinds and collision geometry
//! - [`player`]: player slots, snapshots and the state store
//! - [`collision`]: colliders, pair tests and the interaction rule
//! - [`state`]: per-match session state

#![deny(unsafe_code)]

pub mod catalog;
pub mod collision;
pub mod geometry;
pub mod player;
pub mod state;

pub use catalog::{
    BLADE_SAMPLES, CatalogError, CatalogTuning, CollisionShape, NO_WEAPON, SlotError,
    WEAPON_SLOTS, WeaponCatalog, WeaponGeometry, WeaponKind, WeaponSlot,
};
pub use collision::{
    Collider, Combatant, Interaction, PairContact, check_pair, resolve_interaction,
};
pub use player::{MAX_PLAYERS, PlayerInfo, PlayerRecord, PlayerSlot, PlayerStore, WeaponPose};
pub use state::{Evaluation, SessionState};
