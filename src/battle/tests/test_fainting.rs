use crate::battle::engine::resolve_turn;
use crate::battle::state::{BattleEvent, GameState, SideId, TurnRng};
use crate::battle::tests::common::*;
use crate::pokemon::StatusCondition;
use crate::trainer::Action;
use pretty_assertions::assert_eq;
use schema::{MoveEffect, PokemonType};

fn lethal_attacker(name: &str, speed: u16) -> crate::pokemon::DuelPokemon {
    mon(
        name,
        vec![PokemonType::Normal],
        [100, 100, 100, 100, 100, speed],
        vec![physical("Overwhelm", PokemonType::Typeless, 250)],
    )
}

#[test]
fn faint_with_bench_left_opens_a_swap_interrupt() {
    let mut state = duel(
        vec![plain_mon("Lead", 10), plain_mon("Bench", 10), plain_mon("Spare", 10)],
        vec![lethal_attacker("Crusher", 200)],
    );
    let starting_turn = state.turn_number;
    queue_both(
        &mut state,
        Action::Move { slot: 0 },
        Action::Move { slot: 0 },
    );

    resolve_turn(&mut state, TurnRng::new_for_test(vec![50, 50, 1]));

    // Not CheckWin: the duel pauses until the replacement is in.
    assert_eq!(state.game_state, GameState::WaitingForChallengerSwap);
    assert_eq!(state.turn_number, starting_turn + 1);

    // Submit the forced swap and resolve the interrupt.
    state.action_queue[SideId::Challenger.index()] = Some(Action::Switch { slot: 1 });
    let bus = resolve_turn(&mut state, TurnRng::new_for_test(vec![]));

    assert_eq!(state.game_state, GameState::WaitingForActions);
    assert_eq!(state.trainer(SideId::Challenger).active_index, 1);
    // The interrupt does not advance the turn counter.
    assert_eq!(state.turn_number, starting_turn + 1);
    assert!(bus
        .events()
        .iter()
        .any(|e| matches!(e, BattleEvent::Switched { side: SideId::Challenger, .. })));
}

#[test]
fn last_creature_fainting_ends_the_duel() {
    let mut state = duel(
        vec![plain_mon("Lone", 10)],
        vec![lethal_attacker("Crusher", 200)],
    );
    queue_both(
        &mut state,
        Action::Move { slot: 0 },
        Action::Move { slot: 0 },
    );

    let bus = resolve_turn(&mut state, TurnRng::new_for_test(vec![50, 50, 1]));

    assert_eq!(state.game_state, GameState::OpponentWin);
    assert!(bus
        .events()
        .iter()
        .any(|e| matches!(e, BattleEvent::BattleEnded { winner: Some(SideId::Opponent) })));
}

#[test]
fn mutual_knockout_is_a_draw_with_no_winner() {
    // The attacker's full-recoil blow fells both sides at once.
    let kamikaze = mon(
        "Kamikaze",
        vec![PokemonType::Normal],
        [5, 100, 100, 100, 100, 200],
        vec![with_effects(
            physical("Final Burst", PokemonType::Typeless, 250),
            vec![MoveEffect::Recoil(100)],
        )],
    );
    let mut state = duel(vec![kamikaze], vec![plain_mon("Bystander", 10)]);
    queue_both(
        &mut state,
        Action::Move { slot: 0 },
        Action::Move { slot: 0 },
    );

    let bus = resolve_turn(&mut state, TurnRng::new_for_test(vec![50, 50, 1]));

    assert_eq!(state.game_state, GameState::Draw);
    assert!(bus
        .events()
        .iter()
        .any(|e| matches!(e, BattleEvent::BattleEnded { winner: None })));
}

#[test]
fn end_of_turn_status_damage_can_force_a_swap() {
    let mut poisoned = plain_mon("Wilting", 10);
    poisoned.hp = 5;
    poisoned.status = Some(StatusCondition::Poison);
    let mut state = duel(
        vec![poisoned, plain_mon("Bench", 10)],
        vec![plain_mon("Observer", 200)],
    );
    // Both sides idle through status moves to isolate the poison tick.
    state.trainers[0].party[0].as_mut().unwrap().moves[1] =
        Some(crate::pokemon::MoveSlot::new(status("Pose", vec![])));
    state.trainers[1].party[0].as_mut().unwrap().moves[1] =
        Some(crate::pokemon::MoveSlot::new(status("Pose", vec![])));
    queue_both(
        &mut state,
        Action::Move { slot: 1 },
        Action::Move { slot: 1 },
    );

    let bus = resolve_turn(&mut state, TurnRng::new_for_test(vec![]));

    // Poison (1/8 of 100 = 12) finished off the 5 HP creature.
    assert!(bus
        .events()
        .iter()
        .any(|e| matches!(e, BattleEvent::StatusDamage { .. })));
    assert_eq!(state.game_state, GameState::WaitingForChallengerSwap);
}

#[test]
fn fainted_attacker_cannot_act_later_in_the_turn() {
    let mut state = duel(
        vec![plain_mon("Slow", 10), plain_mon("Bench", 10)],
        vec![lethal_attacker("Crusher", 200)],
    );
    queue_both(
        &mut state,
        Action::Move { slot: 0 },
        Action::Move { slot: 0 },
    );

    let bus = resolve_turn(&mut state, TurnRng::new_for_test(vec![50, 50, 1]));

    // Exactly one MoveUsed: the victim never got its turn.
    let moves_used = bus
        .events()
        .iter()
        .filter(|e| matches!(e, BattleEvent::MoveUsed { .. }))
        .count();
    assert_eq!(moves_used, 1);
    assert!(bus.events().iter().any(|e| matches!(
        e,
        BattleEvent::ActionFailed {
            reason: crate::battle::state::ActionFailureReason::CreatureFainted
        }
    )));
}
