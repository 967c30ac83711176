use crate::battle::conditions::{VolatileCondition, VolatileKind};
use crate::battle::engine::resolve_turn;
use crate::battle::state::{BattleEvent, SideId, TurnRng};
use crate::battle::tests::common::*;
use crate::trainer::Action;
use pretty_assertions::assert_eq;
use schema::{MoveEffect, PokemonType};

/// Attacker tuned so the damage formula yields exactly 40 against the
/// defender below: level 50, power 95, attack 100 into defense 110.
fn forty_damage_attacker() -> crate::pokemon::DuelPokemon {
    mon(
        "Striker",
        vec![PokemonType::Normal],
        [100, 100, 100, 100, 100, 120],
        vec![physical("Measured Hit", PokemonType::Typeless, 95)],
    )
}

fn sturdy_defender() -> crate::pokemon::DuelPokemon {
    mon(
        "Bulwark",
        vec![PokemonType::Normal],
        [100, 100, 110, 100, 110, 50],
        vec![status("Pose", vec![])],
    )
}

fn hp_of(state: &crate::battle::state::BattleState, side: SideId) -> u16 {
    state.trainer(side).active().unwrap().current_hp()
}

#[test]
fn neutral_hit_with_no_crit_deals_the_computed_damage() {
    let mut state = duel(vec![forty_damage_attacker()], vec![sturdy_defender()]);
    queue_both(
        &mut state,
        Action::Move { slot: 0 },
        Action::Move { slot: 0 },
    );

    // accuracy 50 (hit), crit 50 (no), damage roll 1 (full spread).
    let bus = resolve_turn(&mut state, TurnRng::new_for_test(vec![50, 50, 1]));

    assert_eq!(hp_of(&state, SideId::Opponent), 60);
    assert!(bus
        .events()
        .iter()
        .any(|e| matches!(e, BattleEvent::DamageDealt { damage: 40, .. })));
    // Neutral effectiveness stays silent.
    assert!(!bus
        .events()
        .iter()
        .any(|e| matches!(e, BattleEvent::TypeEffectiveness { .. })));
}

#[test]
fn stab_and_effectiveness_multiply_damage() {
    let attacker = mon(
        "Cinder",
        vec![PokemonType::Fire],
        [100, 100, 100, 100, 100, 120],
        vec![physical("Flame Swipe", PokemonType::Fire, 60)],
    );
    let defender = mon(
        "Sprout",
        vec![PokemonType::Grass],
        [200, 100, 100, 100, 100, 50],
        vec![status("Pose", vec![])],
    );
    let mut state = duel(vec![attacker], vec![defender]);
    queue_both(
        &mut state,
        Action::Move { slot: 0 },
        Action::Move { slot: 0 },
    );

    let bus = resolve_turn(&mut state, TurnRng::new_for_test(vec![50, 50, 1]));

    // Base 28, x1.5 STAB, x2 effectiveness.
    assert_eq!(hp_of(&state, SideId::Opponent), 200 - 84);
    assert!(bus
        .events()
        .iter()
        .any(|e| matches!(e, BattleEvent::TypeEffectiveness { multiplier } if *multiplier == 2.0)));
}

#[test]
fn critical_hits_scale_by_half_again() {
    let mut state = duel(vec![forty_damage_attacker()], vec![sturdy_defender()]);
    queue_both(
        &mut state,
        Action::Move { slot: 0 },
        Action::Move { slot: 0 },
    );

    // crit roll 3 is inside the 6% window.
    let bus = resolve_turn(&mut state, TurnRng::new_for_test(vec![50, 3, 1]));

    assert_eq!(hp_of(&state, SideId::Opponent), 40);
    assert!(bus
        .events()
        .iter()
        .any(|e| matches!(e, BattleEvent::CriticalHit)));
}

#[test]
fn type_immunity_stops_the_attack_outright() {
    let attacker = mon(
        "Striker",
        vec![PokemonType::Normal],
        [100, 100, 100, 100, 100, 120],
        vec![physical("Body Check", PokemonType::Normal, 95)],
    );
    let phantom = mon(
        "Phantom",
        vec![PokemonType::Ghost],
        [100, 100, 100, 100, 100, 50],
        vec![status("Pose", vec![])],
    );
    let mut state = duel(vec![attacker], vec![phantom]);
    queue_both(
        &mut state,
        Action::Move { slot: 0 },
        Action::Move { slot: 0 },
    );

    // Only the accuracy roll is consumed; the immunity check stops the
    // rest of the pipeline.
    let bus = resolve_turn(&mut state, TurnRng::new_for_test(vec![50]));

    assert_eq!(hp_of(&state, SideId::Opponent), 100);
    assert!(bus
        .events()
        .iter()
        .any(|e| matches!(e, BattleEvent::TypeEffectiveness { multiplier } if *multiplier == 0.0)));
}

#[test]
fn inverse_mode_turns_immunity_into_weakness() {
    let attacker = mon(
        "Striker",
        vec![PokemonType::Normal],
        [100, 100, 100, 100, 100, 120],
        vec![physical("Body Check", PokemonType::Normal, 95)],
    );
    let phantom = mon(
        "Phantom",
        vec![PokemonType::Ghost],
        [200, 100, 110, 100, 110, 50],
        vec![status("Pose", vec![])],
    );
    let mut state = duel(vec![attacker], vec![phantom]);
    state.inverse = true;
    queue_both(
        &mut state,
        Action::Move { slot: 0 },
        Action::Move { slot: 0 },
    );

    resolve_turn(&mut state, TurnRng::new_for_test(vec![50, 50, 1]));

    // The normally-immune ghost takes double damage: 40 base x2.
    assert_eq!(hp_of(&state, SideId::Opponent), 200 - 80);
}

#[test]
fn struggle_hits_and_recoils_a_quarter_of_damage_dealt() {
    let mut attacker = plain_mon("Empty", 120);
    attacker.moves[0].as_mut().unwrap().pp = 0;
    let defender = plain_mon("Wall", 50);
    let mut state = duel(vec![attacker], vec![defender]);
    queue_both(
        &mut state,
        Action::Move { slot: 0 },
        Action::Move { slot: 0 },
    );

    // Struggle never rolls accuracy: crit 50, damage roll 1, then the
    // defender's tackle: accuracy 50, crit 50, damage roll 1.
    let bus = resolve_turn(&mut state, TurnRng::new_for_test(vec![50, 1, 50, 50, 1]));

    // Struggle: base (22*50*100/100)/50 + 2 = 24; recoil 6.
    assert_eq!(hp_of(&state, SideId::Opponent), 76);
    assert!(bus.events().iter().any(
        |e| matches!(e, BattleEvent::MoveUsed { move_name, .. } if move_name == "Struggle")
    ));
    // Recoil landed on the attacker before the counter-tackle.
    let attacker_hp = hp_of(&state, SideId::Challenger);
    assert!(attacker_hp < 94, "expected recoil plus tackle, got {attacker_hp}");
    // Struggle costs no PP.
    assert_eq!(
        state
            .trainer(SideId::Challenger)
            .active()
            .unwrap()
            .move_slot(0)
            .unwrap()
            .pp,
        0
    );
}

#[test]
fn substitute_absorbs_the_hit_without_carry_over() {
    let mut state = duel(vec![forty_damage_attacker()], vec![sturdy_defender()]);
    state
        .trainer_mut(SideId::Opponent)
        .add_volatile(VolatileCondition::Substitute { hp: 25 });
    queue_both(
        &mut state,
        Action::Move { slot: 0 },
        Action::Move { slot: 0 },
    );

    let bus = resolve_turn(&mut state, TurnRng::new_for_test(vec![50, 50, 1]));

    // 40 computed damage into a 25 HP doll: doll breaks, bearer untouched.
    assert_eq!(hp_of(&state, SideId::Opponent), 100);
    assert!(!state
        .trainer(SideId::Opponent)
        .has_volatile(VolatileKind::Substitute));
    assert!(bus
        .events()
        .iter()
        .any(|e| matches!(e, BattleEvent::SubstituteBroke { .. })));
}

#[test]
fn multi_hit_strikes_guaranteed_hits_then_rolls_on() {
    let attacker = mon(
        "Flurry",
        vec![PokemonType::Normal],
        [100, 100, 100, 100, 100, 120],
        vec![with_effects(
            physical("Fury Swipes", PokemonType::Typeless, 30),
            vec![MoveEffect::MultiHit(2, 50)],
        )],
    );
    let defender = mon(
        "Wall",
        vec![PokemonType::Normal],
        [200, 100, 100, 100, 100, 50],
        vec![status("Pose", vec![])],
    );
    let mut state = duel(vec![attacker], vec![defender]);
    queue_both(
        &mut state,
        Action::Move { slot: 0 },
        Action::Move { slot: 0 },
    );

    // Hit 1: acc, crit, dmg (no continuation roll inside guaranteed hits).
    // Hit 2: acc, crit, dmg, continuation 90 = stop.
    let bus = resolve_turn(
        &mut state,
        TurnRng::new_for_test(vec![50, 50, 1, 50, 50, 1, 90]),
    );

    let hits = bus
        .events()
        .iter()
        .filter(|e| matches!(e, BattleEvent::DamageDealt { .. }))
        .count();
    assert_eq!(hits, 2);
    // Only the first hit spent PP.
    assert_eq!(
        state
            .trainer(SideId::Challenger)
            .active()
            .unwrap()
            .move_slot(0)
            .unwrap()
            .pp,
        19
    );
}

#[test]
fn identical_oracles_reproduce_identical_turns() {
    let build = || {
        let mut state = duel(
            vec![mon(
                "Cinder",
                vec![PokemonType::Fire],
                [150, 100, 100, 100, 100, 120],
                vec![with_effects(
                    physical("Flame Swipe", PokemonType::Fire, 60),
                    vec![MoveEffect::Burn(30)],
                )],
            )],
            vec![mon(
                "Sprout",
                vec![PokemonType::Grass],
                [150, 100, 100, 100, 100, 50],
                vec![physical("Leaf Cut", PokemonType::Grass, 55)],
            )],
        );
        queue_both(
            &mut state,
            Action::Move { slot: 0 },
            Action::Move { slot: 0 },
        );
        state
    };

    let oracle = vec![50, 50, 7, 20, 60, 50, 9];
    let mut first = build();
    let mut second = build();
    resolve_turn(&mut first, TurnRng::new_for_test(oracle.clone()));
    resolve_turn(&mut second, TurnRng::new_for_test(oracle));

    for side in SideId::BOTH {
        let a = first.trainer(side).active().unwrap();
        let b = second.trainer(side).active().unwrap();
        assert_eq!(a.current_hp(), b.current_hp());
        assert_eq!(a.status, b.status);
    }
}
