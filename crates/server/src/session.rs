//! Connected client bookkeeping.

use duelist_sim::{MAX_PLAYERS, PlayerSlot};

/// Client session state.
#[derive(Debug, Clone)]
pub struct Session {
    pub slot: PlayerSlot,
    /// Name sent at handshake, truncated.
    pub name: String,
    /// Number of accepted pushes from this client.
    pub pushes: u64,
}

impl Session {
    pub fn new(slot: PlayerSlot, name: String) -> Self {
        Self {
            slot,
            name,
            pushes: 0,
        }
    }

    pub fn player_index(&self) -> u32 {
        self.slot.player_index()
    }
}

/// Handshake registry. Slots are handed out in order and never re-used.
#[derive(Debug, Clone, Default)]
pub struct SessionRegistry {
    sessions: [Option<Session>; MAX_PLAYERS],
    issued: usize,
}

impl SessionRegistry {
    /// Register a client in the next free slot, or `None` if all are taken.
    pub fn admit(&mut self, name: String) -> Option<&Session> {
        let slot = PlayerSlot::new(self.issued)?;
        self.issued += 1;
        let session = self.sessions[slot.index()].insert(Session::new(slot, name));
        Some(&*session)
    }

    pub fn get_mut(&mut self, slot: PlayerSlot) -> Option<&mut Session> {
        self.sessions[slot.index()].as_mut()
    }

    /// Number of handshakes accepted so far.
    pub fn admitted(&self) -> usize {
        self.issued
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_admit_in_order() {
        let mut registry = SessionRegistry::default();
        assert_eq!(registry.admitted(), 0);

        let first = registry.admit("left".to_string()).unwrap();
        assert_eq!(first.player_index(), 1);
        let second = registry.admit("right".to_string()).unwrap();
        assert_eq!(second.player_index(), 2);

        assert!(registry.admit("late".to_string()).is_none());
        assert_eq!(registry.admitted(), 2);
        assert_eq!(registry.get_mut(PlayerSlot::SECOND).unwrap().name, "right");
    }

    #[test]
    fn test_unadmitted_slot_is_absent() {
        let mut registry = SessionRegistry::default();
        registry.admit("solo".to_string());
        assert!(registry.get_mut(PlayerSlot::FIRST).is_some());
        assert!(registry.get_mut(PlayerSlot::SECOND).is_none());
    }
}
