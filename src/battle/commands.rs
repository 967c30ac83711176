use crate::battle::conditions::{VolatileCondition, VolatileKind};
use crate::battle::engine::BattleAction;
use crate::battle::state::{BattleEvent, BattleState, EventBus, GameState, SideId};
use crate::pokemon::StatusCondition;
use schema::{StatKind, Weather};

/// Atomic state changes. Calculators produce these; the executor below is
/// the only code that applies them, so every mutation has one audit point.
#[derive(Debug, Clone)]
pub enum BattleCommand {
    // Battle flow
    SetGameState(GameState),
    IncrementTurnNumber,
    ClearActionQueue,
    EmitEvent(BattleEvent),
    PushAction(BattleAction),

    // Creature modifications
    /// Direct damage to the active creature. Bypasses any substitute:
    /// recoil, status and weather damage are never absorbed.
    DealDamage {
        target: SideId,
        amount: u16,
    },
    /// Attack damage routed into a substitute's HP pool.
    DamageSubstitute {
        target: SideId,
        amount: u16,
    },
    HealPokemon {
        target: SideId,
        amount: u16,
    },
    SetStatus {
        target: SideId,
        status: Option<StatusCondition>,
    },

    // Trainer-side state
    ChangeStatStage {
        target: SideId,
        stat: StatKind,
        delta: i8,
    },
    AddVolatile {
        target: SideId,
        condition: VolatileCondition,
    },
    RemoveVolatile {
        target: SideId,
        kind: VolatileKind,
    },
    SetLastMoveSlot {
        target: SideId,
        slot: usize,
    },

    // Field-wide effects
    SetWeather {
        weather: Weather,
        turns: u8,
    },
    SetTrickRoom {
        turns: u8,
    },
    ClearTrickRoom,
}

#[derive(Debug, PartialEq)]
pub enum ExecutionError {
    NoActivePokemon,
    NoSubstitute,
}

/// Apply a batch of commands in order.
pub fn execute_command_batch(
    commands: Vec<BattleCommand>,
    state: &mut BattleState,
    bus: &mut EventBus,
    pending: &mut Vec<BattleAction>,
) -> Result<(), ExecutionError> {
    for command in commands {
        execute_command(command, state, bus, pending)?;
    }
    Ok(())
}

pub fn execute_command(
    command: BattleCommand,
    state: &mut BattleState,
    bus: &mut EventBus,
    pending: &mut Vec<BattleAction>,
) -> Result<(), ExecutionError> {
    match command {
        BattleCommand::SetGameState(new_state) => {
            state.game_state = new_state;
            Ok(())
        }
        BattleCommand::IncrementTurnNumber => {
            state.turn_number += 1;
            Ok(())
        }
        BattleCommand::ClearActionQueue => {
            state.action_queue = [None, None];
            Ok(())
        }
        BattleCommand::EmitEvent(event) => {
            bus.push(event);
            Ok(())
        }
        BattleCommand::PushAction(action) => {
            pending.push(action);
            Ok(())
        }

        BattleCommand::DealDamage { target, amount } => {
            let trainer = state.trainer_mut(target);
            let pokemon = trainer.active_mut().ok_or(ExecutionError::NoActivePokemon)?;
            let fainted = pokemon.take_damage(amount);
            let remaining_hp = pokemon.current_hp();
            let name = pokemon.name.clone();

            bus.push(BattleEvent::DamageDealt {
                target: name.clone(),
                damage: amount,
                remaining_hp,
            });
            if fainted {
                bus.push(BattleEvent::Fainted {
                    side: target,
                    pokemon: name,
                });
            }
            Ok(())
        }

        BattleCommand::DamageSubstitute { target, amount } => {
            let trainer = state.trainer_mut(target);
            let name = trainer
                .active()
                .map(|p| p.name.clone())
                .ok_or(ExecutionError::NoActivePokemon)?;
            let Some(VolatileCondition::Substitute { hp }) =
                trainer.volatile(VolatileKind::Substitute).cloned()
            else {
                return Err(ExecutionError::NoSubstitute);
            };

            if amount >= hp {
                // Excess damage does not carry over to the bearer.
                trainer.remove_volatile(VolatileKind::Substitute);
                bus.push(BattleEvent::SubstituteDamaged {
                    target: name.clone(),
                    damage: hp,
                    remaining: 0,
                });
                bus.push(BattleEvent::SubstituteBroke { target: name });
            } else {
                let remaining = hp - amount;
                trainer.add_volatile(VolatileCondition::Substitute { hp: remaining });
                bus.push(BattleEvent::SubstituteDamaged {
                    target: name,
                    damage: amount,
                    remaining,
                });
            }
            Ok(())
        }

        BattleCommand::HealPokemon { target, amount } => {
            let trainer = state.trainer_mut(target);
            let pokemon = trainer.active_mut().ok_or(ExecutionError::NoActivePokemon)?;
            let before = pokemon.current_hp();
            pokemon.heal(amount);
            let healed = pokemon.current_hp() - before;
            if healed > 0 {
                bus.push(BattleEvent::Healed {
                    target: pokemon.name.clone(),
                    amount: healed,
                    new_hp: pokemon.current_hp(),
                });
            }
            Ok(())
        }

        BattleCommand::SetStatus { target, status } => {
            let trainer = state.trainer_mut(target);
            let pokemon = trainer.active_mut().ok_or(ExecutionError::NoActivePokemon)?;
            pokemon.status = status;
            Ok(())
        }

        BattleCommand::ChangeStatStage {
            target,
            stat,
            delta,
        } => {
            let trainer = state.trainer_mut(target);
            let name = trainer
                .active()
                .map(|p| p.name.clone())
                .ok_or(ExecutionError::NoActivePokemon)?;
            let old_stage = trainer.stat_stage(stat);
            let new_stage = (old_stage + delta).clamp(-6, 6);

            if new_stage == old_stage {
                bus.push(BattleEvent::StatChangeBlocked { target: name, stat });
            } else {
                trainer.set_stat_stage(stat, new_stage);
                bus.push(BattleEvent::StatStageChanged {
                    target: name,
                    stat,
                    old_stage,
                    new_stage,
                });
            }
            Ok(())
        }

        BattleCommand::AddVolatile { target, condition } => {
            state.trainer_mut(target).add_volatile(condition);
            Ok(())
        }
        BattleCommand::RemoveVolatile { target, kind } => {
            state.trainer_mut(target).remove_volatile(kind);
            Ok(())
        }
        BattleCommand::SetLastMoveSlot { target, slot } => {
            state.trainer_mut(target).last_move_slot = Some(slot);
            Ok(())
        }

        BattleCommand::SetWeather { weather, turns } => {
            state.field.weather = Some((weather, turns));
            bus.push(BattleEvent::WeatherStarted { weather });
            Ok(())
        }
        BattleCommand::SetTrickRoom { turns } => {
            state.field.trick_room = Some(turns);
            bus.push(BattleEvent::TrickRoomStarted);
            Ok(())
        }
        BattleCommand::ClearTrickRoom => {
            if state.field.trick_room.take().is_some() {
                bus.push(BattleEvent::TrickRoomEnded);
            }
            Ok(())
        }
    }
}
