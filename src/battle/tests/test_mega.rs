use crate::battle::engine::resolve_turn;
use crate::battle::state::{BattleEvent, SideId, TurnRng};
use crate::battle::tests::common::*;
use crate::trainer::Action;
use pretty_assertions::assert_eq;
use schema::{Ability, BaseStats, MegaForm, PokemonType};

fn mega_capable(name: &str, speed: u16) -> crate::pokemon::DuelPokemon {
    let mut pokemon = mon(
        name,
        vec![PokemonType::Normal],
        [100, 100, 100, 100, 100, speed],
        vec![physical("Tackle", PokemonType::Typeless, 60)],
    );
    pokemon.mega_form = Some(MegaForm {
        name: format!("Mega {name}"),
        types: vec![PokemonType::Normal, PokemonType::Steel],
        base_stats: BaseStats {
            hp: 100,
            attack: 150,
            defense: 150,
            sp_attack: 150,
            sp_defense: 150,
            speed: 200,
        },
        ability: Ability::None,
    });
    pokemon
}

#[test]
fn mega_evolution_applies_before_order_is_decided() {
    // 10 base speed, but the mega form at level 50 computes to 205 and
    // must outrun the 150-speed opponent this very turn.
    let mut state = duel(vec![mega_capable("Latent", 10)], vec![plain_mon("Swift", 150)]);
    state.trainer_mut(SideId::Challenger).mega_armed = true;
    queue_both(
        &mut state,
        Action::Move { slot: 0 },
        Action::Move { slot: 0 },
    );

    let bus = resolve_turn(
        &mut state,
        TurnRng::new_for_test(vec![50, 50, 1, 50, 50, 1]),
    );

    let mega_event_index = bus
        .events()
        .iter()
        .position(|e| matches!(e, BattleEvent::MegaEvolved { .. }))
        .expect("mega evolution should have happened");
    let first_move_index = bus
        .events()
        .iter()
        .position(|e| matches!(e, BattleEvent::MoveUsed { .. }))
        .unwrap();
    assert!(mega_event_index < first_move_index);

    // The mega side struck first despite its base speed.
    assert!(matches!(
        bus.events()[first_move_index],
        BattleEvent::MoveUsed {
            side: SideId::Challenger,
            ..
        }
    ));

    let pokemon = state.trainer(SideId::Challenger).active().unwrap();
    assert!(pokemon.mega_evolved);
    assert_eq!(pokemon.species, "Mega Latent");
    assert_eq!(pokemon.types, vec![PokemonType::Normal, PokemonType::Steel]);
    // HP total is untouched by the transformation.
    assert_eq!(pokemon.max_hp(), 100);
    assert!(state.trainer(SideId::Challenger).mega_spent);
}

#[test]
fn the_allowance_is_one_per_trainer_per_battle() {
    let mut state = duel(
        vec![mega_capable("First", 200), mega_capable("Second", 200)],
        vec![plain_mon("Watcher", 50)],
    );
    state.trainer_mut(SideId::Challenger).mega_armed = true;
    queue_both(
        &mut state,
        Action::Move { slot: 0 },
        Action::Move { slot: 0 },
    );
    resolve_turn(
        &mut state,
        TurnRng::new_for_test(vec![50, 50, 1, 50, 50, 1]),
    );
    assert!(state.trainer(SideId::Challenger).mega_spent);

    // Bring in the second mega-capable creature and try to arm again.
    queue_both(
        &mut state,
        Action::Switch { slot: 1 },
        Action::Move { slot: 0 },
    );
    resolve_turn(&mut state, TurnRng::new_for_test(vec![50, 50, 1]));

    state.trainer_mut(SideId::Challenger).set_mega_armed(true);
    assert!(!state.trainer(SideId::Challenger).mega_armed);

    // Even a forced arm flag is ignored by the resolver once spent.
    state.trainer_mut(SideId::Challenger).mega_armed = true;
    queue_both(
        &mut state,
        Action::Move { slot: 0 },
        Action::Move { slot: 0 },
    );
    let bus = resolve_turn(
        &mut state,
        TurnRng::new_for_test(vec![50, 50, 1, 50, 50, 1]),
    );

    assert!(!bus
        .events()
        .iter()
        .any(|e| matches!(e, BattleEvent::MegaEvolved { .. })));
    assert!(!state.trainer(SideId::Challenger).active().unwrap().mega_evolved);
}

#[test]
fn arming_without_a_mega_form_does_nothing() {
    let mut state = duel(vec![plain_mon("Plain", 200)], vec![plain_mon("Watcher", 50)]);
    state.trainer_mut(SideId::Challenger).set_mega_armed(true);
    assert!(!state.trainer(SideId::Challenger).mega_armed);

    state.trainer_mut(SideId::Challenger).mega_armed = true;
    queue_both(
        &mut state,
        Action::Move { slot: 0 },
        Action::Move { slot: 0 },
    );
    let bus = resolve_turn(
        &mut state,
        TurnRng::new_for_test(vec![50, 50, 1, 50, 50, 1]),
    );

    assert!(!bus
        .events()
        .iter()
        .any(|e| matches!(e, BattleEvent::MegaEvolved { .. })));
    assert!(!state.trainer(SideId::Challenger).mega_spent);
}
