use crate::battle::engine::resolve_turn;
use crate::battle::state::{BattleEvent, SideId, TurnRng};
use crate::battle::tests::common::*;
use crate::trainer::Action;
use pretty_assertions::assert_eq;
use schema::{Ability, MoveEffect, PokemonType, Weather};

#[test]
fn sandstorm_chips_everyone_without_shelter() {
    let mut state = duel(vec![plain_mon("Bare A", 200)], vec![plain_mon("Bare B", 50)]);
    state.field.weather = Some((Weather::Sandstorm, 5));
    // Idle through status moves so only the weather moves the HP bars.
    for side in SideId::BOTH {
        state.trainers[side.index()].party[0].as_mut().unwrap().moves[0] =
            Some(crate::pokemon::MoveSlot::new(status("Pose", vec![])));
    }
    queue_both(
        &mut state,
        Action::Move { slot: 0 },
        Action::Move { slot: 0 },
    );

    let bus = resolve_turn(&mut state, TurnRng::new_for_test(vec![]));

    for side in SideId::BOTH {
        assert_eq!(state.trainer(side).active().unwrap().current_hp(), 94); // 1/16 of 100
    }
    assert_eq!(
        bus.events()
            .iter()
            .filter(|e| matches!(e, BattleEvent::WeatherDamage { .. }))
            .count(),
        2
    );
}

#[test]
fn matching_types_and_sheltering_abilities_ignore_the_chip() {
    let rocky = mon(
        "Rocky",
        vec![PokemonType::Rock],
        [100, 100, 100, 100, 100, 200],
        vec![status("Pose", vec![])],
    );
    let mut veiled = plain_mon("Veiled", 50);
    veiled.ability = Ability::SandVeil;
    veiled.moves[0] = Some(crate::pokemon::MoveSlot::new(status("Pose", vec![])));

    let mut state = duel(vec![rocky], vec![veiled]);
    state.field.weather = Some((Weather::Sandstorm, 5));
    queue_both(
        &mut state,
        Action::Move { slot: 0 },
        Action::Move { slot: 0 },
    );

    let bus = resolve_turn(&mut state, TurnRng::new_for_test(vec![]));

    for side in SideId::BOTH {
        assert_eq!(state.trainer(side).active().unwrap().current_hp(), 100);
    }
    assert!(!bus
        .events()
        .iter()
        .any(|e| matches!(e, BattleEvent::WeatherDamage { .. })));
}

#[test]
fn weather_expires_when_its_counter_runs_out() {
    let mut state = duel(vec![plain_mon("A", 200)], vec![plain_mon("B", 50)]);
    state.field.weather = Some((Weather::Rain, 1));
    for side in SideId::BOTH {
        state.trainers[side.index()].party[0].as_mut().unwrap().moves[0] =
            Some(crate::pokemon::MoveSlot::new(status("Pose", vec![])));
    }
    queue_both(
        &mut state,
        Action::Move { slot: 0 },
        Action::Move { slot: 0 },
    );

    let bus = resolve_turn(&mut state, TurnRng::new_for_test(vec![]));

    assert_eq!(state.field.weather, None);
    assert!(bus
        .events()
        .iter()
        .any(|e| matches!(e, BattleEvent::WeatherEnded { weather: Weather::Rain })));
}

#[test]
fn weather_setting_moves_take_effect_and_boost_damage_next_turn() {
    let soaker = mon(
        "Soaker",
        vec![PokemonType::Normal],
        [100, 100, 100, 100, 100, 200],
        vec![
            status("Cloudburst", vec![MoveEffect::SetWeather(Weather::Rain)]),
            physical("Water Jet", PokemonType::Water, 60),
        ],
    );
    let sponge = mon(
        "Sponge",
        vec![PokemonType::Normal],
        [200, 100, 100, 100, 100, 50],
        vec![status("Pose", vec![])],
    );
    let mut state = duel(vec![soaker], vec![sponge]);

    queue_both(
        &mut state,
        Action::Move { slot: 0 },
        Action::Move { slot: 0 },
    );
    let bus = resolve_turn(&mut state, TurnRng::new_for_test(vec![]));
    assert!(bus
        .events()
        .iter()
        .any(|e| matches!(e, BattleEvent::WeatherStarted { weather: Weather::Rain })));
    assert_eq!(state.field.weather, Some((Weather::Rain, 4))); // one tick spent

    queue_both(
        &mut state,
        Action::Move { slot: 1 },
        Action::Move { slot: 0 },
    );
    resolve_turn(&mut state, TurnRng::new_for_test(vec![50, 50, 1]));

    // Base 28 water hit, x1.5 in rain = 42.
    assert_eq!(state.trainer(SideId::Opponent).active().unwrap().current_hp(), 158);
}

#[test]
fn trick_room_toggles_and_expires() {
    let bender = mon(
        "Bender",
        vec![PokemonType::Psychic],
        [100, 100, 100, 100, 100, 200],
        vec![with_priority(
            status("Dimension Twist", vec![MoveEffect::TrickRoom]),
            -7,
        )],
    );
    let mut watcher = plain_mon("Watcher", 50);
    watcher.moves[0] = Some(crate::pokemon::MoveSlot::new(status("Pose", vec![])));
    let mut state = duel(vec![bender], vec![watcher]);

    queue_both(
        &mut state,
        Action::Move { slot: 0 },
        Action::Move { slot: 0 },
    );
    let bus = resolve_turn(&mut state, TurnRng::new_for_test(vec![]));

    assert!(bus
        .events()
        .iter()
        .any(|e| matches!(e, BattleEvent::TrickRoomStarted)));
    // Set at 5, ticked once at end of turn.
    assert_eq!(state.field.trick_room, Some(4));

    // Using it again while active tears it down.
    queue_both(
        &mut state,
        Action::Move { slot: 0 },
        Action::Move { slot: 0 },
    );
    let bus = resolve_turn(&mut state, TurnRng::new_for_test(vec![]));
    assert!(bus
        .events()
        .iter()
        .any(|e| matches!(e, BattleEvent::TrickRoomEnded)));
    assert_eq!(state.field.trick_room, None);
}
