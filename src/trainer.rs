use crate::battle::conditions::{VolatileCondition, VolatileKind};
use crate::pokemon::DuelPokemon;
use schema::StatKind;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A trainer's single choice for one turn.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub enum Action {
    /// Attack with the move in this slot (0-3) of the active creature.
    Move { slot: usize },

    /// Bring in the creature at this party slot (0-5).
    Switch { slot: usize },

    Forfeit,
}

/// One side of a duel: the roster, the live on-field bookkeeping, and the
/// once-per-battle mega allowance.
///
/// Stat stages and volatile conditions belong to the trainer rather than
/// the creature so that switching out clears them for free.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Trainer {
    /// Stable identifier from the chat platform (user id, or an AI tag).
    pub id: String,
    pub name: String,

    pub party: [Option<DuelPokemon>; 6],
    pub active_index: usize,

    /// Stage modifiers (-6..=+6) for the active creature; absent means 0.
    pub stat_stages: HashMap<StatKind, i8>,

    /// Volatile conditions on the active creature, keyed by discriminant
    /// so a condition can never be applied twice.
    pub volatiles: HashMap<VolatileKind, VolatileCondition>,

    /// Slot of the last move this side used; Disable targets it.
    pub last_move_slot: Option<usize>,

    /// Mega evolution: armed for the coming turn / already consumed.
    pub mega_armed: bool,
    pub mega_spent: bool,
}

impl Trainer {
    pub fn new(id: String, name: String, party: Vec<DuelPokemon>) -> Self {
        let mut slots = [const { None }; 6];
        for (i, pokemon) in party.into_iter().take(6).enumerate() {
            slots[i] = Some(pokemon);
        }

        Trainer {
            id,
            name,
            party: slots,
            active_index: 0,
            stat_stages: HashMap::new(),
            volatiles: HashMap::new(),
            last_move_slot: None,
            mega_armed: false,
            mega_spent: false,
        }
    }

    pub fn active(&self) -> Option<&DuelPokemon> {
        self.party.get(self.active_index).and_then(|s| s.as_ref())
    }

    pub fn active_mut(&mut self) -> Option<&mut DuelPokemon> {
        self.party
            .get_mut(self.active_index)
            .and_then(|s| s.as_mut())
    }

    pub fn party_size(&self) -> usize {
        self.party.iter().filter(|s| s.is_some()).count()
    }

    pub fn remaining(&self) -> usize {
        self.party
            .iter()
            .flatten()
            .filter(|p| !p.is_fainted())
            .count()
    }

    pub fn has_usable_pokemon(&self) -> bool {
        self.remaining() > 0
    }

    // === Volatile condition management ===

    pub fn has_volatile(&self, kind: VolatileKind) -> bool {
        self.volatiles.contains_key(&kind)
    }

    pub fn volatile(&self, kind: VolatileKind) -> Option<&VolatileCondition> {
        self.volatiles.get(&kind)
    }

    pub fn add_volatile(&mut self, condition: VolatileCondition) {
        self.volatiles.insert(condition.kind(), condition);
    }

    pub fn remove_volatile(&mut self, kind: VolatileKind) -> Option<VolatileCondition> {
        self.volatiles.remove(&kind)
    }

    // === Stat stage management ===

    pub fn stat_stage(&self, stat: StatKind) -> i8 {
        self.stat_stages.get(&stat).copied().unwrap_or(0)
    }

    pub fn set_stat_stage(&mut self, stat: StatKind, stage: i8) {
        let clamped = stage.clamp(-6, 6);
        if clamped == 0 {
            self.stat_stages.remove(&stat);
        } else {
            self.stat_stages.insert(stat, clamped);
        }
    }

    // === Switching ===

    /// Reset everything scoped to the on-field creature. Called when the
    /// active creature leaves the field (switch or faint).
    pub fn clear_active_state(&mut self) {
        self.volatiles.clear();
        self.stat_stages.clear();
        self.last_move_slot = None;
    }

    /// Change the active slot. Validity (non-fainted, not active, not
    /// trapped) is the caller's job; this only guards structural errors.
    pub fn switch_to(&mut self, new_index: usize) -> Result<(), String> {
        if new_index >= 6 || self.party[new_index].is_none() {
            return Err(format!("no creature in party slot {new_index}"));
        }
        self.clear_active_state();
        self.active_index = new_index;
        Ok(())
    }

    // === Mega evolution bookkeeping ===

    /// Arm or disarm mega evolution for the coming turn. Idempotent until
    /// a turn resolves with the flag set; a spent allowance stays spent.
    pub fn set_mega_armed(&mut self, armed: bool) {
        if self.mega_spent {
            self.mega_armed = false;
            return;
        }
        let has_form = self
            .active()
            .map(|p| p.mega_form.is_some())
            .unwrap_or(false);
        self.mega_armed = armed && has_form;
    }

    /// Consume the one-per-battle allowance. Returns false if it was
    /// already spent.
    pub fn consume_mega(&mut self) -> bool {
        if self.mega_spent {
            return false;
        }
        self.mega_armed = false;
        self.mega_spent = true;
        true
    }
}
