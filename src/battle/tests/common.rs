//! Shared fixtures for the scenario tests. Everything is built in code;
//! the reference store is not involved.

use crate::battle::state::BattleState;
use crate::pokemon::{DuelPokemon, MoveSlot};
use crate::trainer::{Action, Trainer};
use schema::{MoveCategory, MoveData, MoveEffect, PokemonType};

pub fn physical(name: &str, move_type: PokemonType, power: u16) -> MoveData {
    MoveData {
        name: name.to_string(),
        move_type,
        category: MoveCategory::Physical,
        power: Some(power),
        accuracy: Some(100),
        pp: 20,
        priority: 0,
        effects: vec![],
    }
}

pub fn status(name: &str, effects: Vec<MoveEffect>) -> MoveData {
    MoveData {
        name: name.to_string(),
        move_type: PokemonType::Normal,
        category: MoveCategory::Status,
        power: None,
        accuracy: None,
        pp: 20,
        priority: 0,
        effects,
    }
}

pub fn with_priority(mut data: MoveData, priority: i8) -> MoveData {
    data.priority = priority;
    data
}

pub fn with_effects(mut data: MoveData, effects: Vec<MoveEffect>) -> MoveData {
    data.effects = effects;
    data
}

pub fn mon(name: &str, types: Vec<PokemonType>, stats: [u16; 6], moves: Vec<MoveData>) -> DuelPokemon {
    let mut slots: [Option<MoveSlot>; 4] = [const { None }; 4];
    for (i, data) in moves.into_iter().take(4).enumerate() {
        slots[i] = Some(MoveSlot::new(data));
    }
    DuelPokemon::new_for_test(name, types, stats, slots)
}

/// A plain 100-HP normal-type with one 60-power tackle, at the given speed.
pub fn plain_mon(name: &str, speed: u16) -> DuelPokemon {
    mon(
        name,
        vec![PokemonType::Normal],
        [100, 100, 100, 100, 100, speed],
        vec![physical("Tackle", PokemonType::Typeless, 60)],
    )
}

pub fn duel(challenger: Vec<DuelPokemon>, opponent: Vec<DuelPokemon>) -> BattleState {
    let mut state = BattleState::new(
        "test-duel".to_string(),
        Trainer::new("c".to_string(), "Casey".to_string(), challenger),
        Trainer::new("o".to_string(), "Oswin".to_string(), opponent),
        false,
    );
    // Scenario tests drive resolution directly; team preview is the
    // runner's concern.
    state.game_state = crate::battle::state::GameState::WaitingForActions;
    state
}

pub fn queue_both(state: &mut BattleState, challenger: Action, opponent: Action) {
    state.action_queue = [Some(challenger), Some(opponent)];
}
