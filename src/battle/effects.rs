use crate::battle::commands::BattleCommand;
use crate::battle::conditions::{VolatileCondition, VolatileKind};
use crate::battle::state::{ActionFailureReason, BattleEvent, BattleState, SideId, TurnRng};
use crate::pokemon::StatusCondition;
use schema::{MoveEffect, PokemonType, Target, Weather};

/// Who is doing what to whom, for effect application.
#[derive(Debug, Clone, Copy)]
pub struct EffectContext {
    pub attacker: SideId,
    pub defender: SideId,
}

impl EffectContext {
    pub fn side_for(&self, target: Target) -> SideId {
        match target {
            Target::User => self.attacker,
            Target::Target => self.defender,
        }
    }
}

/// True when a still-active substitute on the defender blocks this effect.
/// Self-directed effects and field effects pass through; anything aimed at
/// the creature behind the doll does not.
pub fn blocked_by_substitute(effect: &MoveEffect) -> bool {
    match effect {
        MoveEffect::Heal(_)
        | MoveEffect::Substitute
        | MoveEffect::Recoil(_)
        | MoveEffect::Drain(_)
        | MoveEffect::HighCrit
        | MoveEffect::MultiHit(_, _)
        | MoveEffect::SetWeather(_)
        | MoveEffect::TrickRoom
        | MoveEffect::ChargeUp
        | MoveEffect::Rampage => false,
        MoveEffect::StatChange(target, ..) => matches!(target, Target::Target),
        _ => true,
    }
}

/// Apply one secondary effect, producing the commands it implies. Chance
/// rolls are drawn here; immunities resolve to no commands at all.
pub fn apply_effect(
    effect: &MoveEffect,
    context: &EffectContext,
    state: &BattleState,
    rng: &mut TurnRng,
) -> Vec<BattleCommand> {
    match effect {
        MoveEffect::Burn(chance) => status_commands(
            *chance,
            StatusCondition::Burn,
            "Burn Chance",
            context.defender,
            state,
            rng,
        ),
        MoveEffect::Freeze(chance) => status_commands(
            *chance,
            StatusCondition::Freeze,
            "Freeze Chance",
            context.defender,
            state,
            rng,
        ),
        MoveEffect::Paralyze(chance) => status_commands(
            *chance,
            StatusCondition::Paralysis,
            "Paralyze Chance",
            context.defender,
            state,
            rng,
        ),
        MoveEffect::Poison(chance) => status_commands(
            *chance,
            StatusCondition::Poison,
            "Poison Chance",
            context.defender,
            state,
            rng,
        ),
        MoveEffect::BadlyPoison(chance) => status_commands(
            *chance,
            StatusCondition::BadlyPoisoned(1),
            "Toxic Chance",
            context.defender,
            state,
            rng,
        ),
        MoveEffect::Sleep(chance) => {
            // Sleep length is rolled only once the status actually lands.
            let mut commands = status_commands(
                *chance,
                StatusCondition::Sleep(0),
                "Sleep Chance",
                context.defender,
                state,
                rng,
            );
            if !commands.is_empty() {
                let turns = 1 + rng.next_outcome("Sleep Length") % 3;
                commands = status_commands_unchecked(
                    StatusCondition::Sleep(turns),
                    context.defender,
                    state,
                );
            }
            commands
        }

        MoveEffect::Confuse(chance) => {
            if rng.next_outcome("Confuse Chance") > *chance {
                return Vec::new();
            }
            let defender = state.trainer(context.defender);
            if defender.has_volatile(VolatileKind::Confused) || defender.active().is_none() {
                return Vec::new();
            }
            let turns = 2 + rng.next_outcome("Confusion Length") % 4;
            volatile_commands(
                VolatileCondition::Confused {
                    turns_remaining: turns,
                },
                context.defender,
                state,
            )
        }

        MoveEffect::Flinch(chance) => {
            if rng.next_outcome("Flinch Chance") > *chance {
                return Vec::new();
            }
            // Silent: flinching only narrates if the target then fails to act.
            vec![BattleCommand::AddVolatile {
                target: context.defender,
                condition: VolatileCondition::Flinched,
            }]
        }

        MoveEffect::Trap(chance) => {
            if rng.next_outcome("Trap Chance") > *chance {
                return Vec::new();
            }
            let defender = state.trainer(context.defender);
            if defender.has_volatile(VolatileKind::Trapped) || defender.active().is_none() {
                return Vec::new();
            }
            let turns = 4 + rng.next_outcome("Trap Length") % 2;
            volatile_commands(
                VolatileCondition::Trapped {
                    turns_remaining: turns,
                },
                context.defender,
                state,
            )
        }

        MoveEffect::Disable(chance) => {
            if rng.next_outcome("Disable Chance") > *chance {
                return Vec::new();
            }
            let defender = state.trainer(context.defender);
            let Some(slot) = defender.last_move_slot else {
                return vec![BattleCommand::EmitEvent(BattleEvent::ActionFailed {
                    reason: ActionFailureReason::MoveFailed,
                })];
            };
            if defender.has_volatile(VolatileKind::Disabled) {
                return Vec::new();
            }
            volatile_commands(
                VolatileCondition::Disabled {
                    slot,
                    turns_remaining: 4,
                },
                context.defender,
                state,
            )
        }

        MoveEffect::StatChange(target, stat, delta, chance) => {
            if rng.next_outcome("Stat Change Chance") > *chance {
                return Vec::new();
            }
            vec![BattleCommand::ChangeStatStage {
                target: context.side_for(*target),
                stat: *stat,
                delta: *delta,
            }]
        }

        MoveEffect::Heal(percentage) => {
            let attacker = state.trainer(context.attacker);
            let Some(pokemon) = attacker.active() else {
                return Vec::new();
            };
            if pokemon.is_fainted() || pokemon.current_hp() == pokemon.max_hp() {
                return Vec::new();
            }
            let amount = (pokemon.max_hp() as u32 * *percentage as u32 / 100) as u16;
            if amount == 0 {
                return Vec::new();
            }
            vec![BattleCommand::HealPokemon {
                target: context.attacker,
                amount,
            }]
        }

        MoveEffect::Substitute => {
            let attacker = state.trainer(context.attacker);
            let Some(pokemon) = attacker.active() else {
                return Vec::new();
            };
            let cost = (pokemon.max_hp() / 4).max(1);
            if attacker.has_volatile(VolatileKind::Substitute) || pokemon.current_hp() <= cost {
                return vec![BattleCommand::EmitEvent(BattleEvent::ActionFailed {
                    reason: ActionFailureReason::MoveFailed,
                })];
            }
            vec![
                BattleCommand::DealDamage {
                    target: context.attacker,
                    amount: cost,
                },
                BattleCommand::AddVolatile {
                    target: context.attacker,
                    condition: VolatileCondition::Substitute { hp: cost },
                },
                BattleCommand::EmitEvent(BattleEvent::SubstituteCreated {
                    target: pokemon.name.clone(),
                }),
            ]
        }

        MoveEffect::SetWeather(weather) => {
            if state.field.weather_kind() == Some(*weather) {
                return vec![BattleCommand::EmitEvent(BattleEvent::ActionFailed {
                    reason: ActionFailureReason::MoveFailed,
                })];
            }
            vec![BattleCommand::SetWeather {
                weather: *weather,
                turns: 5,
            }]
        }

        MoveEffect::TrickRoom => {
            if state.field.trick_room_active() {
                vec![BattleCommand::ClearTrickRoom]
            } else {
                vec![BattleCommand::SetTrickRoom { turns: 5 }]
            }
        }

        // Flow-control and damage-linked effects are the attack pipeline's
        // business, not a post-hit secondary.
        MoveEffect::Recoil(_)
        | MoveEffect::Drain(_)
        | MoveEffect::HighCrit
        | MoveEffect::MultiHit(_, _)
        | MoveEffect::ChargeUp
        | MoveEffect::Rampage => Vec::new(),
    }
}

/// Commands for landing a primary status: respects existing status and
/// type immunities, silent on failure (secondary chances fizzle quietly).
fn status_commands(
    chance: u8,
    status: StatusCondition,
    roll_reason: &str,
    target: SideId,
    state: &BattleState,
    rng: &mut TurnRng,
) -> Vec<BattleCommand> {
    if rng.next_outcome(roll_reason) > chance {
        return Vec::new();
    }
    status_commands_unchecked(status, target, state)
}

fn status_commands_unchecked(
    status: StatusCondition,
    target: SideId,
    state: &BattleState,
) -> Vec<BattleCommand> {
    let trainer = state.trainer(target);
    let Some(pokemon) = trainer.active() else {
        return Vec::new();
    };
    if pokemon.is_fainted() || pokemon.status.is_some() || status_immune(&pokemon.types, status) {
        return Vec::new();
    }

    vec![
        BattleCommand::SetStatus {
            target,
            status: Some(status),
        },
        BattleCommand::EmitEvent(BattleEvent::StatusApplied {
            target: pokemon.name.clone(),
            status,
        }),
    ]
}

fn status_immune(types: &[PokemonType], status: StatusCondition) -> bool {
    match status {
        StatusCondition::Burn => types.contains(&PokemonType::Fire),
        StatusCondition::Poison | StatusCondition::BadlyPoisoned(_) => {
            types.contains(&PokemonType::Poison) || types.contains(&PokemonType::Steel)
        }
        StatusCondition::Freeze => types.contains(&PokemonType::Ice),
        StatusCondition::Paralysis => types.contains(&PokemonType::Electric),
        _ => false,
    }
}

fn volatile_commands(
    condition: VolatileCondition,
    target: SideId,
    state: &BattleState,
) -> Vec<BattleCommand> {
    let Some(pokemon) = state.trainer(target).active() else {
        return Vec::new();
    };
    let kind = condition.kind();
    vec![
        BattleCommand::AddVolatile { target, condition },
        BattleCommand::EmitEvent(BattleEvent::VolatileApplied {
            target: pokemon.name.clone(),
            kind,
        }),
    ]
}

/// End-of-turn weather chip immunity: matching types shrug it off, and a
/// few abilities shelter their holder.
pub fn immune_to_weather_damage(weather: Weather, pokemon: &crate::pokemon::DuelPokemon) -> bool {
    use schema::Ability;

    match pokemon.ability {
        Ability::MagicGuard | Ability::Overcoat => return true,
        Ability::SandVeil if weather == Weather::Sandstorm => return true,
        Ability::IceBody if weather == Weather::Hail => return true,
        _ => {}
    }

    match weather {
        Weather::Sandstorm => pokemon.types.iter().any(|t| {
            matches!(
                t,
                PokemonType::Rock | PokemonType::Ground | PokemonType::Steel
            )
        }),
        Weather::Hail => pokemon.types.contains(&PokemonType::Ice),
        _ => true,
    }
}
