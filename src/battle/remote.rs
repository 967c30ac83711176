use crate::battle::runner::{BrainError, TrainerBrain, TurnCommand};
use crate::battle::state::{BattleSnapshot, BattleState, SideId};
use crate::battle::validity::MoveChoice;
use crate::errors::SubmitError;
use crate::trainer::Action;
use async_trait::async_trait;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::{mpsc, oneshot};

/// A question sent to the chat layer. Each variant carries the legal
/// choices and the one-shot responder that accepts exactly one answer.
pub enum DuelPrompt {
    ChooseLead {
        valid: Vec<usize>,
        responder: Responder<usize>,
    },
    ChooseAction {
        turn: u32,
        moves: MoveChoice,
        swaps: Vec<usize>,
        can_mega: bool,
        responder: Responder<TurnCommand>,
    },
    ChooseSwap {
        turn: u32,
        valid: Vec<usize>,
        responder: Responder<usize>,
    },
}

pub struct PromptEnvelope {
    pub snapshot: BattleSnapshot,
    pub prompt: DuelPrompt,
}

type Validator<T> = Box<dyn Fn(&T) -> Result<(), SubmitError> + Send + Sync>;

/// Write-once reply slot for one prompt. A second submission, a reply to
/// an expired prompt, and an illegal choice are each rejected with a
/// distinct error so the UI can explain itself.
pub struct Responder<T> {
    prompt_epoch: u32,
    current_epoch: Arc<AtomicU32>,
    validate: Validator<T>,
    tx: Mutex<Option<oneshot::Sender<T>>>,
}

impl<T> Responder<T> {
    pub fn submit(&self, value: T) -> Result<(), SubmitError> {
        let current = self.current_epoch.load(Ordering::SeqCst);
        if current != self.prompt_epoch {
            return Err(SubmitError::StaleInteraction {
                prompt: self.prompt_epoch,
                current,
            });
        }

        (self.validate)(&value)?;

        let sender = self
            .tx
            .lock()
            .expect("responder lock never poisoned")
            .take()
            .ok_or(SubmitError::AlreadySubmitted)?;

        // The controller stopped listening (timeout or battle over).
        sender.send(value).map_err(|_| SubmitError::NotAwaitingInput)
    }
}

/// A [`TrainerBrain`] that forwards every decision to the chat platform
/// through a prompt channel and waits on a fresh one-shot reply per turn.
pub struct RemoteBrain {
    prompts: mpsc::UnboundedSender<PromptEnvelope>,
    epoch: Arc<AtomicU32>,
}

impl RemoteBrain {
    /// Build a brain plus the receiving end the presentation layer drains.
    pub fn channel() -> (RemoteBrain, mpsc::UnboundedReceiver<PromptEnvelope>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            RemoteBrain {
                prompts: tx,
                epoch: Arc::new(AtomicU32::new(0)),
            },
            rx,
        )
    }

    /// Open a new prompt epoch, expiring every control issued before it.
    fn next_epoch(&self) -> u32 {
        self.epoch.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn responder<T>(
        &self,
        prompt_epoch: u32,
        validate: Validator<T>,
    ) -> (Responder<T>, oneshot::Receiver<T>) {
        let (tx, rx) = oneshot::channel();
        (
            Responder {
                prompt_epoch,
                current_epoch: Arc::clone(&self.epoch),
                validate,
                tx: Mutex::new(Some(tx)),
            },
            rx,
        )
    }

    async fn send_and_wait<T>(
        &self,
        envelope: PromptEnvelope,
        rx: oneshot::Receiver<T>,
    ) -> Result<T, BrainError> {
        self.prompts
            .send(envelope)
            .map_err(|_| BrainError::Disconnected)?;
        rx.await.map_err(|_| BrainError::Disconnected)
    }
}

#[async_trait]
impl TrainerBrain for RemoteBrain {
    async fn choose_lead(
        &mut self,
        _side: SideId,
        state: &BattleState,
        valid: &[usize],
    ) -> Result<usize, BrainError> {
        let epoch = self.next_epoch();
        let valid_owned = valid.to_vec();
        let check = valid_owned.clone();
        let (responder, rx) = self.responder(
            epoch,
            Box::new(move |slot: &usize| {
                if check.contains(slot) {
                    Ok(())
                } else {
                    Err(SubmitError::IllegalSwap(*slot))
                }
            }),
        );

        self.send_and_wait(
            PromptEnvelope {
                snapshot: state.snapshot(),
                prompt: DuelPrompt::ChooseLead {
                    valid: valid_owned,
                    responder,
                },
            },
            rx,
        )
        .await
    }

    async fn choose_action(
        &mut self,
        side: SideId,
        state: &BattleState,
        moves: &MoveChoice,
        swaps: &[usize],
    ) -> Result<TurnCommand, BrainError> {
        let epoch = self.next_epoch();
        let turn = state.turn_number;
        let trainer = state.trainer(side);
        let can_mega = !trainer.mega_spent
            && trainer
                .active()
                .map(|p| p.mega_form.is_some())
                .unwrap_or(false);

        let moves_check = moves.clone();
        let swaps_check = swaps.to_vec();
        let (responder, rx) = self.responder(
            epoch,
            Box::new(move |command: &TurnCommand| match command.action {
                Action::Forfeit => Ok(()),
                Action::Move { slot } => match &moves_check {
                    MoveChoice::Usable { slots } if slots.contains(&slot) => Ok(()),
                    MoveChoice::StruggleOnly => Ok(()),
                    MoveChoice::Forced { slot: forced } if slot == *forced => Ok(()),
                    _ => Err(SubmitError::IllegalMove(slot)),
                },
                Action::Switch { slot } => {
                    if swaps_check.contains(&slot) {
                        Ok(())
                    } else {
                        Err(SubmitError::IllegalSwap(slot))
                    }
                }
            }),
        );

        self.send_and_wait(
            PromptEnvelope {
                snapshot: state.snapshot(),
                prompt: DuelPrompt::ChooseAction {
                    turn,
                    moves: moves.clone(),
                    swaps: swaps.to_vec(),
                    can_mega,
                    responder,
                },
            },
            rx,
        )
        .await
    }

    async fn choose_swap(
        &mut self,
        _side: SideId,
        state: &BattleState,
        valid: &[usize],
    ) -> Result<usize, BrainError> {
        let epoch = self.next_epoch();
        let turn = state.turn_number;
        let valid_owned = valid.to_vec();
        let check = valid_owned.clone();
        let (responder, rx) = self.responder(
            epoch,
            Box::new(move |slot: &usize| {
                if check.contains(slot) {
                    Ok(())
                } else {
                    Err(SubmitError::IllegalSwap(*slot))
                }
            }),
        );

        self.send_and_wait(
            PromptEnvelope {
                snapshot: state.snapshot(),
                prompt: DuelPrompt::ChooseSwap {
                    turn,
                    valid: valid_owned,
                    responder,
                },
            },
            rx,
        )
        .await
    }
}
