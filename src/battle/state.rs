use crate::battle::conditions::VolatileKind;
use crate::pokemon::StatusCondition;
use crate::trainer::{Action, Trainer};
use schema::{StatKind, Weather};
use serde::{Deserialize, Serialize};

/// Which side of the duel. The challenger issued the duel request; the
/// opponent accepted it.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SideId {
    Challenger,
    Opponent,
}

impl SideId {
    pub fn index(self) -> usize {
        match self {
            SideId::Challenger => 0,
            SideId::Opponent => 1,
        }
    }

    pub fn other(self) -> SideId {
        match self {
            SideId::Challenger => SideId::Opponent,
            SideId::Opponent => SideId::Challenger,
        }
    }

    pub fn from_index(index: usize) -> SideId {
        match index {
            0 => SideId::Challenger,
            1 => SideId::Opponent,
            _ => panic!("invalid side index: {index}"),
        }
    }

    pub const BOTH: [SideId; 2] = [SideId::Challenger, SideId::Opponent];
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Copy)]
pub enum GameState {
    /// Party duels pick a lead before turn 1.
    TeamPreview,
    WaitingForActions,
    TurnInProgress,
    /// Mid-turn interrupt: a side's active creature fainted and a
    /// replacement must come in before normal flow resumes.
    WaitingForChallengerSwap,
    WaitingForOpponentSwap,
    WaitingForBothSwaps,
    ChallengerWin,
    OpponentWin,
    Draw,
}

impl GameState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            GameState::ChallengerWin | GameState::OpponentWin | GameState::Draw
        )
    }

    pub fn winner(&self) -> Option<SideId> {
        match self {
            GameState::ChallengerWin => Some(SideId::Challenger),
            GameState::OpponentWin => Some(SideId::Opponent),
            _ => None,
        }
    }

    pub fn win_state_for(side: SideId) -> GameState {
        match side {
            SideId::Challenger => GameState::ChallengerWin,
            SideId::Opponent => GameState::OpponentWin,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub enum ActionFailureReason {
    IsAsleep,
    IsFrozen,
    IsParalyzed,
    IsFlinching,
    IsConfused,
    IsTrapped,
    NoTargetPresent,
    NoPpRemaining,
    CreatureFainted,
    MoveFailed,
}

/// Everything observable that happened during resolution, in order.
/// The renderer turns these into text and imagery; tests assert on them.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub enum BattleEvent {
    TurnStarted {
        turn_number: u32,
    },
    TurnEnded,

    LeadChosen {
        side: SideId,
        pokemon: String,
    },
    Switched {
        side: SideId,
        old_pokemon: String,
        new_pokemon: String,
    },
    MoveUsed {
        side: SideId,
        pokemon: String,
        move_name: String,
    },
    MoveMissed {
        attacker: String,
    },
    CriticalHit,
    TypeEffectiveness {
        multiplier: f32,
    },
    DamageDealt {
        target: String,
        damage: u16,
        remaining_hp: u16,
    },
    Healed {
        target: String,
        amount: u16,
        new_hp: u16,
    },
    Fainted {
        side: SideId,
        pokemon: String,
    },

    SubstituteCreated {
        target: String,
    },
    SubstituteDamaged {
        target: String,
        damage: u16,
        remaining: u16,
    },
    SubstituteBroke {
        target: String,
    },

    StatusApplied {
        target: String,
        status: StatusCondition,
    },
    StatusRemoved {
        target: String,
        status: StatusCondition,
    },
    StatusDamage {
        target: String,
        status: StatusCondition,
        damage: u16,
        remaining_hp: u16,
    },

    VolatileApplied {
        target: String,
        kind: VolatileKind,
    },
    VolatileExpired {
        target: String,
        kind: VolatileKind,
    },
    VolatileDamage {
        target: String,
        kind: VolatileKind,
        damage: u16,
        remaining_hp: u16,
    },

    StatStageChanged {
        target: String,
        stat: StatKind,
        old_stage: i8,
        new_stage: i8,
    },
    StatChangeBlocked {
        target: String,
        stat: StatKind,
    },

    WeatherStarted {
        weather: Weather,
    },
    WeatherEnded {
        weather: Weather,
    },
    WeatherDamage {
        target: String,
        weather: Weather,
        damage: u16,
        remaining_hp: u16,
    },
    TrickRoomStarted,
    TrickRoomEnded,

    MegaEvolved {
        side: SideId,
        old_species: String,
        new_species: String,
    },
    ChargingUp {
        pokemon: String,
        move_name: String,
    },

    ActionFailed {
        reason: ActionFailureReason,
    },
    TimedOut {
        side: SideId,
    },
    Forfeited {
        side: SideId,
    },
    TrainerDefeated {
        side: SideId,
    },
    BattleEnded {
        winner: Option<SideId>,
    },
}

impl BattleEvent {
    /// Human-readable narration for this event, or None for silent
    /// bookkeeping events.
    pub fn format(&self, state: &BattleState) -> Option<String> {
        match self {
            BattleEvent::TurnStarted { turn_number } => {
                Some(format!("=== Turn {} ===", turn_number))
            }
            BattleEvent::TurnEnded => None,

            BattleEvent::LeadChosen { side, pokemon } => Some(format!(
                "{} will lead with {}!",
                state.trainer(*side).name,
                pokemon
            )),
            BattleEvent::Switched {
                side,
                old_pokemon,
                new_pokemon,
            } => Some(format!(
                "{} recalled {} and sent out {}!",
                state.trainer(*side).name,
                old_pokemon,
                new_pokemon
            )),
            BattleEvent::MoveUsed {
                side,
                pokemon,
                move_name,
            } => Some(format!(
                "{}'s {} used {}!",
                state.trainer(*side).name,
                pokemon,
                move_name
            )),
            BattleEvent::MoveMissed { attacker } => {
                Some(format!("{}'s attack missed!", attacker))
            }
            BattleEvent::CriticalHit => Some("A critical hit!".to_string()),
            BattleEvent::TypeEffectiveness { multiplier } => match *multiplier {
                m if m > 1.0 => Some("It's super effective!".to_string()),
                m if m == 0.0 => Some("It had no effect!".to_string()),
                m if m < 1.0 => Some("It's not very effective...".to_string()),
                _ => None,
            },
            BattleEvent::DamageDealt { target, damage, .. } => {
                Some(format!("{} took {} damage!", target, damage))
            }
            BattleEvent::Healed { target, amount, .. } => {
                Some(format!("{} recovered {} HP!", target, amount))
            }
            BattleEvent::Fainted { pokemon, .. } => Some(format!("{} fainted!", pokemon)),

            BattleEvent::SubstituteCreated { target } => {
                Some(format!("{} put up a substitute!", target))
            }
            BattleEvent::SubstituteDamaged { target, .. } => {
                Some(format!("{}'s substitute took the hit!", target))
            }
            BattleEvent::SubstituteBroke { target } => {
                Some(format!("{}'s substitute faded!", target))
            }

            BattleEvent::StatusApplied { target, status } => {
                let text = match status {
                    StatusCondition::Sleep(_) => "fell asleep!",
                    StatusCondition::Poison => "was poisoned!",
                    StatusCondition::BadlyPoisoned(_) => "was badly poisoned!",
                    StatusCondition::Burn => "was burned!",
                    StatusCondition::Paralysis => "is paralyzed! It may be unable to move!",
                    StatusCondition::Freeze => "was frozen solid!",
                };
                Some(format!("{} {}", target, text))
            }
            BattleEvent::StatusRemoved { target, status } => {
                let text = match status {
                    StatusCondition::Sleep(_) => "woke up!".to_string(),
                    StatusCondition::Freeze => "thawed out!".to_string(),
                    other => format!("was cured of its {}!", other.label()),
                };
                Some(format!("{} {}", target, text))
            }
            BattleEvent::StatusDamage {
                target,
                status,
                damage,
                ..
            } => Some(format!(
                "{} is hurt by its {}! ({} damage)",
                target,
                status.label(),
                damage
            )),

            BattleEvent::VolatileApplied { target, kind } => {
                Some(format!("{} was affected by {}!", target, kind.describe()))
            }
            BattleEvent::VolatileExpired { target, kind } => {
                Some(format!("{}'s {} wore off.", target, kind.describe()))
            }
            BattleEvent::VolatileDamage {
                target,
                kind,
                damage,
                ..
            } => Some(format!(
                "{} is hurt by {}! ({} damage)",
                target,
                kind.describe(),
                damage
            )),

            BattleEvent::StatStageChanged {
                target,
                stat,
                old_stage,
                new_stage,
            } => {
                let direction = if new_stage > old_stage { "rose" } else { "fell" };
                Some(format!("{}'s {} {}!", target, stat, direction))
            }
            BattleEvent::StatChangeBlocked { target, .. } => {
                Some(format!("{}'s stats can't go any further!", target))
            }

            BattleEvent::WeatherStarted { weather } => {
                let text = match weather {
                    Weather::Rain => "It started to rain!",
                    Weather::Sun => "The sunlight turned harsh!",
                    Weather::Sandstorm => "A sandstorm kicked up!",
                    Weather::Hail => "It started to hail!",
                    Weather::Fog => "A thick fog rolled in!",
                };
                Some(text.to_string())
            }
            BattleEvent::WeatherEnded { weather } => Some(format!("The {} subsided.", weather)),
            BattleEvent::WeatherDamage {
                target,
                weather,
                damage,
                ..
            } => Some(format!(
                "{} is buffeted by {}! ({} damage)",
                target, weather, damage
            )),
            BattleEvent::TrickRoomStarted => {
                Some("The dimensions were twisted! Slower creatures move first!".to_string())
            }
            BattleEvent::TrickRoomEnded => Some("The twisted dimensions returned to normal.".to_string()),

            BattleEvent::MegaEvolved {
                side, new_species, ..
            } => Some(format!(
                "{}'s creature mega evolved into {}!",
                state.trainer(*side).name,
                new_species
            )),
            BattleEvent::ChargingUp { pokemon, move_name } => {
                Some(format!("{} is charging up {}!", pokemon, move_name))
            }

            BattleEvent::ActionFailed { reason } => Some(
                match reason {
                    ActionFailureReason::IsAsleep => "It's fast asleep.",
                    ActionFailureReason::IsFrozen => "It's frozen solid!",
                    ActionFailureReason::IsParalyzed => "It's fully paralyzed!",
                    ActionFailureReason::IsFlinching => "It flinched and couldn't move!",
                    ActionFailureReason::IsConfused => "It hurt itself in its confusion!",
                    ActionFailureReason::IsTrapped => "It can't escape!",
                    ActionFailureReason::NoTargetPresent => "But there was no target...",
                    ActionFailureReason::NoPpRemaining => "But there was no PP left for the move!",
                    ActionFailureReason::CreatureFainted => "But it had already fainted...",
                    ActionFailureReason::MoveFailed => "But it failed!",
                }
                .to_string(),
            ),
            BattleEvent::TimedOut { side } => Some(format!(
                "{} took too long to respond and forfeited the duel!",
                state.trainer(*side).name
            )),
            BattleEvent::Forfeited { side } => {
                Some(format!("{} forfeited the duel!", state.trainer(*side).name))
            }
            BattleEvent::TrainerDefeated { side } => Some(format!(
                "{} is out of usable creatures!",
                state.trainer(*side).name
            )),
            BattleEvent::BattleEnded { winner } => match winner {
                Some(side) => Some(format!(
                    "{} has won the duel!",
                    state.trainer(*side).name
                )),
                None => Some("The duel ended with no winner!".to_string()),
            },
        }
    }
}

/// Ordered collection of the events produced while resolving one turn.
#[derive(Debug, Clone, Default)]
pub struct EventBus {
    events: Vec<BattleEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    pub fn push(&mut self, event: BattleEvent) {
        self.events.push(event);
    }

    pub fn events(&self) -> &[BattleEvent] {
        &self.events
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Render every narratable event against the given state.
    pub fn narration(&self, state: &BattleState) -> Vec<String> {
        self.events
            .iter()
            .filter_map(|event| event.format(state))
            .collect()
    }
}

/// Pre-drawn random outcomes for one turn, consumed in resolution order.
///
/// Every consumer names what it is rolling for; a test that under-supplies
/// outcomes fails with that name, and a transcript of consumption is the
/// turn's complete non-determinism. Identical outcome vectors therefore
/// reproduce identical turns.
#[derive(Debug, Clone)]
pub struct TurnRng {
    outcomes: Vec<u8>,
    index: usize,
}

impl TurnRng {
    pub fn new_for_test(outcomes: Vec<u8>) -> Self {
        Self { outcomes, index: 0 }
    }

    pub fn new_random() -> Self {
        use rand::Rng;
        let mut rng = rand::rng();
        let outcomes: Vec<u8> = (0..160).map(|_| rng.random_range(1..=100)).collect();
        Self { outcomes, index: 0 }
    }

    /// Deterministic oracle for a given seed; backs the reproducibility
    /// guarantee for replays and dispute handling.
    pub fn new_seeded(seed: u64) -> Self {
        use rand::{Rng, SeedableRng};
        let mut rng = rand::rngs::StdRng::seed_from_u64(seed);
        let outcomes: Vec<u8> = (0..160).map(|_| rng.random_range(1..=100)).collect();
        Self { outcomes, index: 0 }
    }

    /// Draw the next outcome (1..=100). The reason string makes exhaustion
    /// panics in tests self-explanatory.
    pub fn next_outcome(&mut self, reason: &str) -> u8 {
        if self.index >= self.outcomes.len() {
            panic!("TurnRng exhausted! Tried to get a value for: '{}'.", reason);
        }
        let outcome = self.outcomes[self.index];

        #[cfg(test)]
        println!("[RNG] Consumed {} for: {}", outcome, reason);

        self.index += 1;
        outcome
    }
}

/// Field-wide timed effects.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct FieldState {
    /// Active weather and its remaining turns.
    pub weather: Option<(Weather, u8)>,
    /// Trick Room's remaining turns while active.
    pub trick_room: Option<u8>,
}

impl FieldState {
    pub fn weather_kind(&self) -> Option<Weather> {
        self.weather.map(|(w, _)| w)
    }

    pub fn trick_room_active(&self) -> bool {
        self.trick_room.is_some()
    }
}

/// The complete state of one duel. Owned by a single controller task;
/// nothing here is shared between battles.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct BattleState {
    pub battle_id: String,
    pub trainers: [Trainer; 2],
    pub turn_number: u32,
    pub game_state: GameState,
    pub action_queue: [Option<Action>; 2],
    pub field: FieldState,
    /// Inverse mode flips type effectiveness for the whole duel. Fixed at
    /// creation.
    pub inverse: bool,

    // Prompt-staleness bookkeeping for the presentation layer. The
    // resolver never reads these; a UI control captured at prompt time is
    // rejected when its counter no longer matches.
    pub interaction_turn: u32,
    pub swap_prompt_turn: u32,
    pub mid_turn_swap: bool,
}

impl BattleState {
    pub fn new(battle_id: String, challenger: Trainer, opponent: Trainer, inverse: bool) -> Self {
        let party_duel = challenger.party_size() > 1 && opponent.party_size() > 1;
        Self {
            battle_id,
            trainers: [challenger, opponent],
            turn_number: 1,
            game_state: if party_duel {
                GameState::TeamPreview
            } else {
                GameState::WaitingForActions
            },
            action_queue: [None, None],
            field: FieldState::default(),
            inverse,
            interaction_turn: 0,
            swap_prompt_turn: 0,
            mid_turn_swap: false,
        }
    }

    pub fn trainer(&self, side: SideId) -> &Trainer {
        &self.trainers[side.index()]
    }

    pub fn trainer_mut(&mut self, side: SideId) -> &mut Trainer {
        &mut self.trainers[side.index()]
    }

    /// One-line state of both actives, attached to resolver faults so a
    /// failing turn can be reconstructed.
    pub fn context_line(&self) -> String {
        let describe = |side: SideId| -> String {
            match self.trainer(side).active() {
                Some(p) => format!(
                    "{} {}/{}hp status={:?}",
                    p.name,
                    p.current_hp(),
                    p.max_hp(),
                    p.status
                ),
                None => "<empty>".to_string(),
            }
        };
        format!(
            "challenger=[{}] opponent=[{}] weather={:?} trick_room={:?}",
            describe(SideId::Challenger),
            describe(SideId::Opponent),
            self.field.weather,
            self.field.trick_room
        )
    }

    pub fn snapshot(&self) -> BattleSnapshot {
        let side = |s: SideId| -> SideSnapshot {
            let trainer = self.trainer(s);
            let active = trainer.active();
            SideSnapshot {
                trainer_name: trainer.name.clone(),
                pokemon_name: active.map(|p| p.name.clone()).unwrap_or_default(),
                species: active.map(|p| p.species.clone()).unwrap_or_default(),
                hp: active.map(|p| p.current_hp()).unwrap_or(0),
                max_hp: active.map(|p| p.max_hp()).unwrap_or(0),
                hp_fraction: active.map(|p| p.hp_fraction()).unwrap_or(0.0),
                status: active.and_then(|p| p.status.map(|s| s.label().to_string())),
                shiny: active.map(|p| p.shiny).unwrap_or(false),
                mega_evolved: active.map(|p| p.mega_evolved).unwrap_or(false),
                has_substitute: trainer.has_volatile(VolatileKind::Substitute),
                remaining: trainer.remaining(),
                party_size: trainer.party_size(),
            }
        };

        BattleSnapshot {
            battle_id: self.battle_id.clone(),
            turn_number: self.turn_number,
            weather: self.field.weather_kind(),
            trick_room: self.field.trick_room_active(),
            inverse: self.inverse,
            sides: [side(SideId::Challenger), side(SideId::Opponent)],
        }
    }
}

/// What the renderer needs to draw one side: HP bar, status icon, party
/// dots, weather backdrop.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct SideSnapshot {
    pub trainer_name: String,
    pub pokemon_name: String,
    pub species: String,
    pub hp: u16,
    pub max_hp: u16,
    pub hp_fraction: f32,
    pub status: Option<String>,
    pub shiny: bool,
    pub mega_evolved: bool,
    pub has_substitute: bool,
    pub remaining: usize,
    pub party_size: usize,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct BattleSnapshot {
    pub battle_id: String,
    pub turn_number: u32,
    pub weather: Option<Weather>,
    pub trick_room: bool,
    pub inverse: bool,
    pub sides: [SideSnapshot; 2],
}
