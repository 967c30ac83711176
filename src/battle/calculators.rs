use crate::battle::commands::BattleCommand;
use crate::battle::conditions::{VolatileCondition, VolatileKind};
use crate::battle::effects::{apply_effect, blocked_by_substitute, EffectContext};
use crate::battle::engine::{BattleAction, UsedMove};
use crate::battle::state::{ActionFailureReason, BattleEvent, BattleState, SideId, TurnRng};
use crate::battle::stats::{
    effective_attack, effective_defense, move_hits, type_effectiveness, weather_damage_multiplier,
};
use schema::{MoveCategory, MoveData, MoveEffect};

/// Calculate the complete outcome of one attack hit as a command list.
/// Reads state, never writes it; the executor applies the result.
pub fn calculate_attack_outcome(
    state: &BattleState,
    attacker_side: SideId,
    defender_side: SideId,
    used: &UsedMove,
    hit_number: u8,
    rng: &mut TurnRng,
) -> Vec<BattleCommand> {
    let mut commands = Vec::new();

    let attacker_trainer = state.trainer(attacker_side);
    let defender_trainer = state.trainer(defender_side);

    let Some(attacker) = attacker_trainer.active() else {
        return vec![BattleCommand::EmitEvent(BattleEvent::ActionFailed {
            reason: ActionFailureReason::CreatureFainted,
        })];
    };
    let Some(defender) = defender_trainer.active() else {
        return vec![BattleCommand::EmitEvent(BattleEvent::ActionFailed {
            reason: ActionFailureReason::NoTargetPresent,
        })];
    };

    let move_data: MoveData = match used {
        UsedMove::Slot(slot) => match attacker.move_slot(*slot) {
            Some(move_slot) => move_slot.data.clone(),
            None => {
                return vec![BattleCommand::EmitEvent(BattleEvent::ActionFailed {
                    reason: ActionFailureReason::MoveFailed,
                })]
            }
        },
        UsedMove::Struggle => MoveData::struggle(),
    };

    let context = EffectContext {
        attacker: attacker_side,
        defender: defender_side,
    };

    // Two-turn moves spend their first turn charging.
    if move_data.effects.contains(&MoveEffect::ChargeUp)
        && !attacker_trainer.has_volatile(VolatileKind::Charging)
    {
        if let UsedMove::Slot(slot) = used {
            return vec![
                BattleCommand::EmitEvent(BattleEvent::MoveUsed {
                    side: attacker_side,
                    pokemon: attacker.name.clone(),
                    move_name: move_data.name.clone(),
                }),
                BattleCommand::EmitEvent(BattleEvent::ChargingUp {
                    pokemon: attacker.name.clone(),
                    move_name: move_data.name.clone(),
                }),
                BattleCommand::AddVolatile {
                    target: attacker_side,
                    condition: VolatileCondition::Charging { slot: *slot },
                },
            ];
        }
    }
    if attacker_trainer.has_volatile(VolatileKind::Charging) {
        commands.push(BattleCommand::RemoveVolatile {
            target: attacker_side,
            kind: VolatileKind::Charging,
        });
    }

    // Rampaging moves lock the user in on first use.
    if move_data.effects.contains(&MoveEffect::Rampage)
        && !attacker_trainer.has_volatile(VolatileKind::Rampaging)
    {
        if let UsedMove::Slot(slot) = used {
            let extra_turns = 1 + rng.next_outcome("Rampage Length") % 2;
            commands.push(BattleCommand::AddVolatile {
                target: attacker_side,
                condition: VolatileCondition::Rampaging {
                    slot: *slot,
                    turns_remaining: extra_turns,
                },
            });
        }
    }

    if hit_number == 0 {
        commands.push(BattleCommand::EmitEvent(BattleEvent::MoveUsed {
            side: attacker_side,
            pokemon: attacker.name.clone(),
            move_name: move_data.name.clone(),
        }));
    }

    if !move_hits(attacker_trainer, defender_trainer, &move_data, &state.field, rng) {
        commands.push(BattleCommand::EmitEvent(BattleEvent::MoveMissed {
            attacker: attacker.name.clone(),
        }));
        return commands;
    }

    let mut damage_dealt: u16 = 0;
    let mut defender_will_faint = false;
    let substitute_hp = match defender_trainer.volatile(VolatileKind::Substitute) {
        Some(VolatileCondition::Substitute { hp }) => Some(*hp),
        _ => None,
    };

    if move_data.is_damaging() {
        let effectiveness = type_effectiveness(move_data.move_type, &defender.types, state.inverse);
        if effectiveness == 0.0 {
            commands.push(BattleCommand::EmitEvent(BattleEvent::TypeEffectiveness {
                multiplier: 0.0,
            }));
            return commands;
        }

        let crit_threshold = if move_data.effects.contains(&MoveEffect::HighCrit) {
            12
        } else {
            6
        };
        let is_crit = rng.next_outcome("Critical Hit Check") <= crit_threshold;

        let damage = compute_damage(
            state,
            attacker_side,
            defender_side,
            &move_data,
            effectiveness,
            is_crit,
            rng,
        );

        if let Some(sub_hp) = substitute_hp {
            damage_dealt = damage.min(sub_hp);
            commands.push(BattleCommand::DamageSubstitute {
                target: defender_side,
                amount: damage,
            });
        } else {
            damage_dealt = damage.min(defender.current_hp());
            defender_will_faint = damage >= defender.current_hp();
            commands.push(BattleCommand::DealDamage {
                target: defender_side,
                amount: damage,
            });
        }

        if is_crit {
            commands.push(BattleCommand::EmitEvent(BattleEvent::CriticalHit));
        }
        if effectiveness != 1.0 {
            commands.push(BattleCommand::EmitEvent(BattleEvent::TypeEffectiveness {
                multiplier: effectiveness,
            }));
        }

        // Damage-linked effects scale with what was actually dealt.
        for effect in &move_data.effects {
            match effect {
                MoveEffect::Recoil(percentage) if damage_dealt > 0 => {
                    let recoil = ((damage_dealt as u32 * *percentage as u32) / 100).max(1) as u16;
                    commands.push(BattleCommand::DealDamage {
                        target: attacker_side,
                        amount: recoil,
                    });
                }
                MoveEffect::Drain(percentage) if damage_dealt > 0 => {
                    let heal = ((damage_dealt as u32 * *percentage as u32) / 100).max(1) as u16;
                    if attacker.current_hp() < attacker.max_hp() {
                        commands.push(BattleCommand::HealPokemon {
                            target: attacker_side,
                            amount: heal,
                        });
                    }
                }
                _ => {}
            }
        }
    }

    // Secondary effects. A substitute blocks anything aimed at the creature
    // behind it, and nothing lands on a target this hit is about to faint.
    for effect in &move_data.effects {
        if substitute_hp.is_some() && blocked_by_substitute(effect) {
            continue;
        }
        if defender_will_faint && blocked_by_substitute(effect) {
            // blocked_by_substitute doubles as "targets the defender".
            continue;
        }
        commands.extend(apply_effect(effect, &context, state, rng));
    }

    // Multi-hit continuation rolls once per completed hit.
    for effect in &move_data.effects {
        if let MoveEffect::MultiHit(guaranteed, continuation) = effect {
            if defender_will_faint {
                break;
            }
            let next_hit = hit_number + 1;
            let continue_hitting = if next_hit < *guaranteed {
                true
            } else {
                next_hit < 5 && rng.next_outcome("Multi-Hit Continuation") <= *continuation
            };
            if continue_hitting {
                commands.push(BattleCommand::PushAction(BattleAction::AttackHit {
                    attacker: attacker_side,
                    defender: defender_side,
                    used: *used,
                    hit_number: next_hit,
                }));
            }
        }
    }

    commands
}

/// The damage formula: level- and power-scaled attack/defense ratio, then
/// the modifier chain (crit, STAB, type, weather, 85-100% spread).
fn compute_damage(
    state: &BattleState,
    attacker_side: SideId,
    defender_side: SideId,
    move_data: &MoveData,
    effectiveness: f32,
    is_crit: bool,
    rng: &mut TurnRng,
) -> u16 {
    let attacker_trainer = state.trainer(attacker_side);
    let defender_trainer = state.trainer(defender_side);
    // Guarded by the caller.
    let attacker = attacker_trainer.active().expect("attacker checked above");
    let defender = defender_trainer.active().expect("defender checked above");

    let power = move_data.power.unwrap_or(0) as u32;
    let attack = effective_attack(attacker, attacker_trainer, move_data) as u32;
    let defense = effective_defense(defender, defender_trainer, move_data) as u32;

    let level_factor = (2 * attacker.level as u32) / 5 + 2;
    let base = (level_factor * power * attack / defense.max(1)) / 50 + 2;

    let stab = if attacker.types.contains(&move_data.move_type) {
        1.5
    } else {
        1.0
    };
    let crit = if is_crit { 1.5 } else { 1.0 };
    let weather = weather_damage_multiplier(state.field.weather_kind(), move_data.move_type);

    // Map a 1-100 draw onto the 85-100% spread so the oracle sees it.
    let roll = rng.next_outcome("Damage Roll");
    let spread = (100 - (roll as u32 - 1) % 16) as f32 / 100.0;

    let damage = base as f32 * stab * crit * effectiveness * weather * spread;
    (damage as u16).max(1)
}

/// A confused creature striking itself: a typeless 40-power physical hit
/// against its own defense, no modifiers, no crit.
pub fn confusion_self_hit(state: &BattleState, side: SideId) -> Vec<BattleCommand> {
    let trainer = state.trainer(side);
    let Some(pokemon) = trainer.active() else {
        return Vec::new();
    };

    let attack = crate::battle::stats::apply_stat_stage_multiplier(
        pokemon.stats[1],
        trainer.stat_stage(schema::StatKind::Attack),
    ) as u32;
    let defense = crate::battle::stats::apply_stat_stage_multiplier(
        pokemon.stats[2],
        trainer.stat_stage(schema::StatKind::Defense),
    )
    .max(1) as u32;

    let level_factor = (2 * pokemon.level as u32) / 5 + 2;
    let damage = ((level_factor * 40 * attack / defense) / 50 + 2).max(1) as u16;

    vec![BattleCommand::DealDamage {
        target: side,
        amount: damage,
    }]
}
