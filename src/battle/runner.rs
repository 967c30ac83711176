use crate::battle::engine::resolve_turn;
use crate::battle::state::{
    BattleEvent, BattleSnapshot, BattleState, GameState, SideId, TurnRng,
};
use crate::battle::validity::{available_moves, valid_swaps, MoveChoice, SwapKind};
use crate::errors::{DuelError, DuelResult};
use crate::trainer::{Action, Trainer};
use async_trait::async_trait;
use rand::{Rng, SeedableRng};
use std::time::Duration;
use tokio::sync::mpsc;

/// Battle-level configuration, fixed at creation.
#[derive(Debug, Clone)]
pub struct DuelRules {
    /// How long each trainer gets to submit a turn action.
    pub action_timeout: Duration,
    /// How long each trainer gets to pick a lead or a forced replacement.
    pub prompt_timeout: Duration,
    /// Inverse mode: type effectiveness is flipped for the whole duel.
    pub inverse: bool,
    /// Seed for the per-turn RNG oracles. None draws from the OS.
    pub seed: Option<u64>,
}

impl Default for DuelRules {
    fn default() -> Self {
        Self {
            action_timeout: Duration::from_secs(60),
            prompt_timeout: Duration::from_secs(60),
            inverse: false,
            seed: None,
        }
    }
}

/// A trainer's full instruction for one turn: the action, plus whether the
/// mega-evolution toggle is set for it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TurnCommand {
    pub action: Action,
    pub mega: bool,
}

impl TurnCommand {
    pub fn plain(action: Action) -> Self {
        Self {
            action,
            mega: false,
        }
    }
}

/// The decision-maker behind one side: a scoring AI, or a bridge to a
/// human on the chat platform. An error means the transport is gone,
/// which aborts the battle; slow answers are the controller's timeout
/// problem, not the brain's.
#[async_trait]
pub trait TrainerBrain: Send {
    async fn choose_lead(
        &mut self,
        side: SideId,
        state: &BattleState,
        valid: &[usize],
    ) -> Result<usize, BrainError>;

    async fn choose_action(
        &mut self,
        side: SideId,
        state: &BattleState,
        moves: &MoveChoice,
        swaps: &[usize],
    ) -> Result<TurnCommand, BrainError>;

    async fn choose_swap(
        &mut self,
        side: SideId,
        state: &BattleState,
        valid: &[usize],
    ) -> Result<usize, BrainError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BrainError {
    Disconnected,
}

/// Everything the presentation layer needs to render one resolved turn.
#[derive(Debug, Clone)]
pub struct TurnReport {
    pub turn_number: u32,
    pub events: Vec<BattleEvent>,
    pub narration: Vec<String>,
    pub snapshot: BattleSnapshot,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DuelOutcome {
    pub winner: Option<SideId>,
    pub turns: u32,
}

/// One side of the duel as handed to [`Duel::new`].
pub struct DuelSetup {
    pub trainer: Trainer,
    pub brain: Box<dyn TrainerBrain>,
}

enum SideReply<T> {
    Submitted(T),
    TimedOut,
    Disconnected,
}

/// The turn controller. Owns all battle state for its lifetime; `run`
/// drives it to a terminal state and reports each resolved turn through
/// the channel returned by `new`.
pub struct Duel {
    state: BattleState,
    brains: [Box<dyn TrainerBrain>; 2],
    rules: DuelRules,
    reports: mpsc::UnboundedSender<TurnReport>,
    master_rng: Option<rand::rngs::StdRng>,
}

impl Duel {
    pub fn new(
        battle_id: String,
        challenger: DuelSetup,
        opponent: DuelSetup,
        rules: DuelRules,
    ) -> DuelResult<(Duel, mpsc::UnboundedReceiver<TurnReport>)> {
        for setup in [&challenger, &opponent] {
            if !setup.trainer.has_usable_pokemon() {
                return Err(DuelError::EmptyParty(setup.trainer.name.clone()));
            }
        }

        let state = BattleState::new(
            battle_id,
            challenger.trainer,
            opponent.trainer,
            rules.inverse,
        );
        let master_rng = rules.seed.map(rand::rngs::StdRng::seed_from_u64);
        let (tx, rx) = mpsc::unbounded_channel();

        log::info!(
            "duel {} created: {} vs {}{}",
            state.battle_id,
            state.trainer(SideId::Challenger).name,
            state.trainer(SideId::Opponent).name,
            if rules.inverse { " (inverse)" } else { "" }
        );

        Ok((
            Duel {
                state,
                brains: [challenger.brain, opponent.brain],
                rules,
                reports: tx,
                master_rng,
            },
            rx,
        ))
    }

    /// Drive the duel to its terminal state. Returns the winner (None for
    /// a mutual knockout or double timeout); transport failures abort the
    /// battle with an error instead.
    pub async fn run(mut self) -> DuelResult<DuelOutcome> {
        if self.state.game_state == GameState::TeamPreview {
            self.run_team_preview().await?;
        }

        while !self.state.game_state.is_terminal() {
            match self.state.game_state {
                GameState::WaitingForActions => self.run_turn().await?,
                GameState::WaitingForChallengerSwap
                | GameState::WaitingForOpponentSwap
                | GameState::WaitingForBothSwaps => self.run_swap_interrupt().await?,
                other => {
                    return Err(DuelError::ResolverFault {
                        turn: self.state.turn_number,
                        detail: format!(
                            "controller saw unexpected state {:?}; {}",
                            other,
                            self.state.context_line()
                        ),
                    });
                }
            }
        }

        let winner = self.state.game_state.winner();
        log::info!(
            "duel {} finished after {} turns: winner {:?}",
            self.state.battle_id,
            self.state.turn_number,
            winner.map(|side| self.state.trainer(side).name.clone())
        );

        Ok(DuelOutcome {
            winner,
            turns: self.state.turn_number,
        })
    }

    fn next_turn_rng(&mut self) -> TurnRng {
        match &mut self.master_rng {
            Some(rng) => TurnRng::new_seeded(rng.random()),
            None => TurnRng::new_random(),
        }
    }

    fn send_report(&self, events: Vec<BattleEvent>) {
        let narration = events
            .iter()
            .filter_map(|event| event.format(&self.state))
            .collect();
        // The receiver may have been dropped by a disinterested caller;
        // the duel continues regardless.
        let _ = self.reports.send(TurnReport {
            turn_number: self.state.turn_number,
            events,
            narration,
            snapshot: self.state.snapshot(),
        });
    }

    /// End the duel because one or both sides stopped responding.
    fn timeout_forfeit(&mut self, timed_out: [bool; 2]) {
        let mut events = Vec::new();
        for side in SideId::BOTH {
            if timed_out[side.index()] {
                log::warn!(
                    "duel {}: {} timed out",
                    self.state.battle_id,
                    self.state.trainer(side).name
                );
                events.push(BattleEvent::TimedOut { side });
            }
        }

        let winner = match (timed_out[0], timed_out[1]) {
            (true, true) => None,
            (true, false) => Some(SideId::Opponent),
            (false, true) => Some(SideId::Challenger),
            (false, false) => unreachable!("timeout_forfeit called without a timeout"),
        };

        self.state.game_state = match winner {
            Some(side) => GameState::win_state_for(side),
            None => GameState::Draw,
        };
        events.push(BattleEvent::BattleEnded { winner });
        self.send_report(events);
    }

    fn valid_leads(&self, side: SideId) -> Vec<usize> {
        self.state
            .trainer(side)
            .party
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| slot.as_ref().filter(|p| !p.is_fainted()).map(|_| i))
            .collect()
    }

    async fn run_team_preview(&mut self) -> DuelResult<()> {
        let challenger_leads = self.valid_leads(SideId::Challenger);
        let opponent_leads = self.valid_leads(SideId::Opponent);

        let prompt_timeout = self.rules.prompt_timeout;
        let [challenger_brain, opponent_brain] = &mut self.brains;
        let state: &BattleState = &self.state;

        let (challenger_reply, opponent_reply) = tokio::join!(
            ask(
                prompt_timeout,
                challenger_brain.choose_lead(SideId::Challenger, state, &challenger_leads),
            ),
            ask(
                prompt_timeout,
                opponent_brain.choose_lead(SideId::Opponent, state, &opponent_leads),
            ),
        );

        let mut timed_out = [false; 2];
        let mut leads = [0usize; 2];
        for (side, reply, valid) in [
            (SideId::Challenger, challenger_reply, &challenger_leads),
            (SideId::Opponent, opponent_reply, &opponent_leads),
        ] {
            match reply {
                SideReply::Submitted(slot) if valid.contains(&slot) => {
                    leads[side.index()] = slot;
                }
                SideReply::Submitted(slot) => {
                    log::warn!(
                        "duel {}: {} chose invalid lead {}, keeping slot 0",
                        self.state.battle_id,
                        self.state.trainer(side).name,
                        slot
                    );
                }
                SideReply::TimedOut => timed_out[side.index()] = true,
                SideReply::Disconnected => {
                    return Err(DuelError::TransportClosed {
                        side: self.state.trainer(side).name.clone(),
                    })
                }
            }
        }

        if timed_out[0] || timed_out[1] {
            self.timeout_forfeit(timed_out);
            return Ok(());
        }

        let mut events = Vec::new();
        for side in SideId::BOTH {
            self.state.trainer_mut(side).active_index = leads[side.index()];
            events.push(BattleEvent::LeadChosen {
                side,
                pokemon: self
                    .state
                    .trainer(side)
                    .active()
                    .map(|p| p.name.clone())
                    .unwrap_or_default(),
            });
        }
        self.state.game_state = GameState::WaitingForActions;
        self.send_report(events);
        Ok(())
    }

    async fn run_turn(&mut self) -> DuelResult<()> {
        self.state.interaction_turn = self.state.turn_number;

        let legal = |side: SideId| {
            let trainer = self.state.trainer(side);
            let opponent = self.state.trainer(side.other());
            (
                available_moves(trainer),
                valid_swaps(trainer, opponent, SwapKind::Voluntary),
            )
        };
        let (challenger_moves, challenger_swaps) = legal(SideId::Challenger);
        let (opponent_moves, opponent_swaps) = legal(SideId::Opponent);

        let action_timeout = self.rules.action_timeout;
        let [challenger_brain, opponent_brain] = &mut self.brains;
        let state: &BattleState = &self.state;

        // A forced move bypasses its trainer entirely; the other side
        // still gets the full window.
        let challenger_fut = async {
            if let MoveChoice::Forced { slot } = &challenger_moves {
                SideReply::Submitted(TurnCommand::plain(Action::Move { slot: *slot }))
            } else {
                ask(
                    action_timeout,
                    challenger_brain.choose_action(
                        SideId::Challenger,
                        state,
                        &challenger_moves,
                        &challenger_swaps,
                    ),
                )
                .await
            }
        };
        let opponent_fut = async {
            if let MoveChoice::Forced { slot } = &opponent_moves {
                SideReply::Submitted(TurnCommand::plain(Action::Move { slot: *slot }))
            } else {
                ask(
                    action_timeout,
                    opponent_brain.choose_action(
                        SideId::Opponent,
                        state,
                        &opponent_moves,
                        &opponent_swaps,
                    ),
                )
                .await
            }
        };

        let (challenger_reply, opponent_reply) = tokio::join!(challenger_fut, opponent_fut);

        let mut timed_out = [false; 2];
        for (side, reply, moves, swaps) in [
            (
                SideId::Challenger,
                challenger_reply,
                &challenger_moves,
                &challenger_swaps,
            ),
            (
                SideId::Opponent,
                opponent_reply,
                &opponent_moves,
                &opponent_swaps,
            ),
        ] {
            match reply {
                SideReply::Submitted(command) => {
                    let action = self.sanitize_command(side, command, moves, swaps);
                    self.state.action_queue[side.index()] = Some(action);
                }
                SideReply::TimedOut => timed_out[side.index()] = true,
                SideReply::Disconnected => {
                    return Err(DuelError::TransportClosed {
                        side: self.state.trainer(side).name.clone(),
                    })
                }
            }
        }

        // A timeout ends the duel immediately; the punctual side's choice
        // is deliberately not executed.
        if timed_out[0] || timed_out[1] {
            self.timeout_forfeit(timed_out);
            return Ok(());
        }

        let rng = self.next_turn_rng();
        let bus = resolve_turn(&mut self.state, rng);
        self.send_report(bus.events().to_vec());
        Ok(())
    }

    /// Validate a brain's decision against the legal action space. An
    /// illegal decision from an in-process brain is a bug; it forfeits
    /// rather than silently becoming something else. (Remote handles
    /// validate at submission time and never produce one.)
    fn sanitize_command(
        &mut self,
        side: SideId,
        command: TurnCommand,
        moves: &MoveChoice,
        swaps: &[usize],
    ) -> Action {
        let legal = match command.action {
            Action::Forfeit => true,
            Action::Move { slot } => match moves {
                MoveChoice::Usable { slots } => slots.contains(&slot),
                // The struggle fallback is submitted as slot 0 by
                // convention; the engine converts it.
                MoveChoice::StruggleOnly => true,
                MoveChoice::Forced { slot: forced } => slot == *forced,
            },
            Action::Switch { slot } => swaps.contains(&slot),
        };

        if !legal {
            log::warn!(
                "duel {}: {} produced illegal action {:?}; treating as forfeit",
                self.state.battle_id,
                self.state.trainer(side).name,
                command.action
            );
            return Action::Forfeit;
        }

        self.state.trainer_mut(side).set_mega_armed(command.mega);
        command.action
    }

    async fn run_swap_interrupt(&mut self) -> DuelResult<()> {
        self.state.mid_turn_swap = true;
        self.state.swap_prompt_turn = self.state.turn_number;

        let needs_swap = [
            matches!(
                self.state.game_state,
                GameState::WaitingForChallengerSwap | GameState::WaitingForBothSwaps
            ),
            matches!(
                self.state.game_state,
                GameState::WaitingForOpponentSwap | GameState::WaitingForBothSwaps
            ),
        ];

        let swap_targets = |side: SideId| -> Vec<usize> {
            valid_swaps(
                self.state.trainer(side),
                self.state.trainer(side.other()),
                SwapKind::Forced,
            )
        };
        let challenger_targets = swap_targets(SideId::Challenger);
        let opponent_targets = swap_targets(SideId::Opponent);

        let prompt_timeout = self.rules.prompt_timeout;
        let [challenger_brain, opponent_brain] = &mut self.brains;
        let state: &BattleState = &self.state;

        let challenger_fut = async {
            if !needs_swap[0] {
                return None;
            }
            Some(
                ask(
                    prompt_timeout,
                    challenger_brain.choose_swap(SideId::Challenger, state, &challenger_targets),
                )
                .await,
            )
        };
        let opponent_fut = async {
            if !needs_swap[1] {
                return None;
            }
            Some(
                ask(
                    prompt_timeout,
                    opponent_brain.choose_swap(SideId::Opponent, state, &opponent_targets),
                )
                .await,
            )
        };

        let (challenger_reply, opponent_reply) = tokio::join!(challenger_fut, opponent_fut);

        let mut timed_out = [false; 2];
        for (side, reply, valid) in [
            (SideId::Challenger, challenger_reply, &challenger_targets),
            (SideId::Opponent, opponent_reply, &opponent_targets),
        ] {
            let Some(reply) = reply else { continue };
            match reply {
                SideReply::Submitted(slot) if valid.contains(&slot) => {
                    self.state.action_queue[side.index()] = Some(Action::Switch { slot });
                }
                SideReply::Submitted(slot) => {
                    // No legal fallback exists for a bad forced swap.
                    log::warn!(
                        "duel {}: {} produced illegal swap {}; treating as timeout",
                        self.state.battle_id,
                        self.state.trainer(side).name,
                        slot
                    );
                    timed_out[side.index()] = true;
                }
                SideReply::TimedOut => timed_out[side.index()] = true,
                SideReply::Disconnected => {
                    return Err(DuelError::TransportClosed {
                        side: self.state.trainer(side).name.clone(),
                    })
                }
            }
        }

        if timed_out[0] || timed_out[1] {
            self.state.mid_turn_swap = false;
            self.timeout_forfeit(timed_out);
            return Ok(());
        }

        let rng = self.next_turn_rng();
        let bus = resolve_turn(&mut self.state, rng);
        self.state.mid_turn_swap = false;
        self.send_report(bus.events().to_vec());
        Ok(())
    }
}

/// Await a brain reply under the given deadline.
async fn ask<T>(
    timeout: Duration,
    fut: impl std::future::Future<Output = Result<T, BrainError>>,
) -> SideReply<T> {
    match tokio::time::timeout(timeout, fut).await {
        Ok(Ok(value)) => SideReply::Submitted(value),
        Ok(Err(BrainError::Disconnected)) => SideReply::Disconnected,
        Err(_) => SideReply::TimedOut,
    }
}
