//! A scoring-based AI opponent for duels without a second human.

use crate::battle::runner::{BrainError, TrainerBrain, TurnCommand};
use crate::battle::state::{BattleState, SideId};
use crate::battle::stats::type_effectiveness;
use crate::battle::validity::MoveChoice;
use crate::trainer::Action;
use async_trait::async_trait;
use ordered_float::OrderedFloat;
use schema::{MoveCategory, MoveData, MoveEffect, Target};

/// Scores every legal action and plays the best one. Deliberately
/// shallow: one ply, no prediction of the opponent, a small random factor
/// to avoid repetitive play.
pub struct ScoringAi;

impl ScoringAi {
    pub fn new() -> Self {
        Self
    }

    fn score_move(&self, side: SideId, slot: usize, state: &BattleState) -> f32 {
        let trainer = state.trainer(side);
        let opponent = state.trainer(side.other());
        let Some(attacker) = trainer.active() else {
            return -1.0;
        };
        let Some(defender) = opponent.active() else {
            return 0.0;
        };
        let Some(move_slot) = attacker.move_slot(slot) else {
            return -1.0;
        };
        let data: &MoveData = &move_slot.data;

        // Core damage estimate.
        let mut damage_score = 0.0;
        if data.is_damaging() {
            let effectiveness =
                type_effectiveness(data.move_type, &defender.types, state.inverse);
            if effectiveness == 0.0 {
                return -1.0;
            }
            let stab = if attacker.types.contains(&data.move_type) {
                1.5
            } else {
                1.0
            };
            damage_score = data.power.unwrap_or(0) as f32 * effectiveness * stab / 100.0;
        }

        // Utility of secondary effects.
        let mut utility_score = 0.0;
        for effect in &data.effects {
            match effect {
                MoveEffect::StatChange(Target::User, stat, stages, chance) if *stages > 0 => {
                    let current = trainer.stat_stage(*stat);
                    if current < 6 {
                        let headroom = 1.0 - (current as f32 / 6.0);
                        utility_score +=
                            0.2 * (*stages as f32) * headroom * (*chance as f32 / 100.0);
                    }
                }
                MoveEffect::StatChange(Target::Target, _, stages, chance) if *stages < 0 => {
                    utility_score += 0.15 * stages.unsigned_abs() as f32 * (*chance as f32 / 100.0);
                }
                MoveEffect::Burn(chance)
                | MoveEffect::Freeze(chance)
                | MoveEffect::Paralyze(chance)
                | MoveEffect::Poison(chance)
                | MoveEffect::BadlyPoison(chance)
                | MoveEffect::Sleep(chance) => {
                    if defender.status.is_none() {
                        utility_score += 0.45 * (*chance as f32 / 100.0);
                    }
                }
                MoveEffect::Flinch(chance) => {
                    utility_score += 0.3 * (*chance as f32 / 100.0);
                }
                MoveEffect::Heal(percentage) => {
                    let missing = 1.0 - attacker.hp_fraction();
                    utility_score += (*percentage as f32 / 100.0) * missing * 2.0;
                }
                _ => {}
            }
        }

        let mut score = damage_score + utility_score;

        // A status move with nothing to contribute is a wasted turn.
        if data.category == MoveCategory::Status && utility_score < 0.01 {
            return -0.5;
        }

        if let Some(accuracy) = data.accuracy {
            score *= accuracy as f32 / 100.0;
        }

        // Small random factor to break ties between equivalent options.
        score * (1.0 + (rand::random::<f32>() * 0.1 - 0.05))
    }

    fn score_switch(&self, side: SideId, slot: usize, state: &BattleState) -> f32 {
        let trainer = state.trainer(side);
        let healthiness = trainer.party[slot]
            .as_ref()
            .map(|p| p.hp_fraction())
            .unwrap_or(0.0);
        // Worse than any decent attack, better than a wasted move.
        0.1 * healthiness + rand::random::<f32>() * 0.05
    }
}

impl Default for ScoringAi {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TrainerBrain for ScoringAi {
    async fn choose_lead(
        &mut self,
        side: SideId,
        state: &BattleState,
        valid: &[usize],
    ) -> Result<usize, BrainError> {
        // Lead with the fastest party member.
        Ok(valid
            .iter()
            .copied()
            .max_by_key(|&slot| {
                state.trainer(side).party[slot]
                    .as_ref()
                    .map(|p| p.stats[5])
                    .unwrap_or(0)
            })
            .unwrap_or(0))
    }

    async fn choose_action(
        &mut self,
        side: SideId,
        state: &BattleState,
        moves: &MoveChoice,
        swaps: &[usize],
    ) -> Result<TurnCommand, BrainError> {
        // Mega evolve as soon as the option exists; holding it back wins
        // nothing at this search depth.
        let trainer = state.trainer(side);
        let mega = !trainer.mega_spent
            && trainer
                .active()
                .map(|p| p.mega_form.is_some())
                .unwrap_or(false);

        let best_move = match moves {
            MoveChoice::Forced { slot } => Some((Action::Move { slot: *slot }, f32::MAX)),
            MoveChoice::StruggleOnly => Some((Action::Move { slot: 0 }, 0.0)),
            MoveChoice::Usable { slots } => slots
                .iter()
                .map(|&slot| {
                    (
                        Action::Move { slot },
                        self.score_move(side, slot, state),
                    )
                })
                .max_by_key(|(_, score)| OrderedFloat(*score)),
        };

        let best_switch = swaps
            .iter()
            .map(|&slot| (Action::Switch { slot }, self.score_switch(side, slot, state)))
            .max_by_key(|(_, score)| OrderedFloat(*score));

        let action = match (best_move, best_switch) {
            (Some((move_action, move_score)), Some((switch_action, switch_score))) => {
                if switch_score > move_score {
                    switch_action
                } else {
                    move_action
                }
            }
            (Some((move_action, _)), None) => move_action,
            (None, Some((switch_action, _))) => switch_action,
            (None, None) => Action::Forfeit,
        };

        Ok(TurnCommand { action, mega })
    }

    async fn choose_swap(
        &mut self,
        side: SideId,
        state: &BattleState,
        valid: &[usize],
    ) -> Result<usize, BrainError> {
        valid
            .iter()
            .copied()
            .max_by_key(|&slot| {
                OrderedFloat(
                    state.trainer(side).party[slot]
                        .as_ref()
                        .map(|p| p.hp_fraction())
                        .unwrap_or(0.0),
                )
            })
            // The runner only asks when a replacement exists.
            .ok_or(BrainError::Disconnected)
    }
}
