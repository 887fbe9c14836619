//! Per-match session state: player records, weapon visibility and the update
//! step that ties them to the collision rules.

use log::{debug, info};

use crate::catalog::{WEAPON_SLOTS, WeaponCatalog, WeaponSlot};
use crate::collision::{Combatant, PairContact, check_pair, resolve_interaction};
use crate::player::{PlayerInfo, PlayerSlot, PlayerStore};

/// Changes produced by one evaluation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Evaluation {
    /// Pairs whose weapons clashed.
    pub clashes: Vec<(PlayerSlot, PlayerSlot)>,
    /// Players whose head was struck, including already-dead ones.
    pub struck: Vec<PlayerSlot>,
    /// Players who died in this pass.
    pub killed: Vec<PlayerSlot>,
    /// Weapons whose render flag was cleared in this pass.
    pub broken: Vec<WeaponSlot>,
}

impl Evaluation {
    pub fn is_quiet(&self) -> bool {
        self.clashes.is_empty() && self.struck.is_empty()
    }
}

/// Authoritative state of one match.
///
/// All mutation goes through [`SessionState::apply_update`], which stores the
/// snapshot and evaluates collisions in a single `&mut self` call.
#[derive(Debug, Clone)]
pub struct SessionState {
    catalog: WeaponCatalog,
    players: PlayerStore,
    render_weapons: [bool; WEAPON_SLOTS],
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new(WeaponCatalog::default())
    }
}

impl SessionState {
    pub fn new(catalog: WeaponCatalog) -> Self {
        Self {
            catalog,
            players: PlayerStore::new(),
            render_weapons: [true; WEAPON_SLOTS],
        }
    }

    pub fn catalog(&self) -> &WeaponCatalog {
        &self.catalog
    }

    pub fn players(&self) -> &PlayerStore {
        &self.players
    }

    /// Visibility flag per weapon slot. Cleared flags never come back.
    pub fn render_weapons(&self) -> [bool; WEAPON_SLOTS] {
        self.render_weapons
    }

    /// Store `info` for `slot`, then evaluate every pair of reported players.
    pub fn apply_update(&mut self, slot: PlayerSlot, info: PlayerInfo) -> Evaluation {
        self.players.apply_update(slot, info);
        self.evaluate()
    }

    /// Collision test between two reported players, without side effects.
    ///
    /// Returns `None` if either has not reported yet.
    pub fn check_collision(&self, first: PlayerSlot, second: PlayerSlot) -> Option<PairContact> {
        let first = Combatant::from_record(&self.catalog, self.players.get(first)?);
        let second = Combatant::from_record(&self.catalog, self.players.get(second)?);
        Some(check_pair(&first, &second, self.catalog.head_radius()))
    }

    fn evaluate(&mut self) -> Evaluation {
        let combatants: Vec<(PlayerSlot, Combatant)> = self
            .players
            .reported()
            .map(|(slot, record)| (slot, Combatant::from_record(&self.catalog, record)))
            .collect();

        let mut evaluation = Evaluation::default();

        for (i, (first_slot, first)) in combatants.iter().enumerate() {
            for (second_slot, second) in &combatants[i + 1..] {
                let contact = check_pair(first, second, self.catalog.head_radius());

                if contact.first_struck {
                    evaluation.struck.push(*first_slot);
                }
                if contact.second_struck {
                    evaluation.struck.push(*second_slot);
                }
                if !contact.weapons_clash {
                    continue;
                }

                evaluation.clashes.push((*first_slot, *second_slot));
                let (Some(a), Some(b)) = (first.held(), second.held()) else {
                    unreachable!("weapons clashed without both players armed");
                };
                let interaction = resolve_interaction(a, b);
                debug!("{first_slot} {a} clashed with {second_slot} {b}: {interaction:?}");

                for weapon in interaction.broken() {
                    if std::mem::replace(&mut self.render_weapons[weapon.index()], false) {
                        info!("{weapon} broke");
                        evaluation.broken.push(weapon);
                    }
                }
            }
        }

        for &victim in &evaluation.struck {
            if self.players.mark_dead(victim) {
                info!("{victim} was killed");
                evaluation.killed.push(victim);
            }
        }

        evaluation
    }
}
