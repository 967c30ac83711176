//! Pokeduel Battle Engine
//!
//! The turn-based duel engine behind a chat-platform creature game: two
//! trainers (humans over a prompt channel, or a scoring AI) each submit
//! one action per turn, and a deterministic resolver turns the pair into
//! damage, status, switches, narration, and eventually a winner.

// --- MODULE DECLARATIONS ---
pub mod ai;
pub mod battle;
pub mod dex;
pub mod errors;
pub mod pokemon;
pub mod trainer;

// --- PUBLIC API RE-EXPORTS ---

// --- From the `schema` crate ---
// Re-export the shared data-definition types.
pub use schema::{
    Ability,
    BaseStats,
    Gender,
    MegaForm,
    MoveCategory,
    MoveData,
    MoveEffect,
    PokemonType,
    SpeciesData,
    StatKind,
    Target,
    Weather,
};

// --- From this crate's modules ---

// Reference data access.
pub use dex::{normalize_id, Dex};

// Core runtime types for a duel.
pub use pokemon::{DuelPokemon, MoveSlot, StatusCondition};
pub use trainer::{Action, Trainer};

// Turn resolution.
pub use battle::engine::resolve_turn;
pub use battle::state::{
    BattleEvent, BattleSnapshot, BattleState, EventBus, GameState, SideId, TurnRng,
};
pub use battle::validity::{available_moves, valid_swaps, MoveChoice, SwapKind};

// The async duel controller and its collaborators.
pub use ai::ScoringAi;
pub use battle::remote::{DuelPrompt, PromptEnvelope, RemoteBrain, Responder};
pub use battle::runner::{
    BrainError, Duel, DuelOutcome, DuelRules, DuelSetup, TrainerBrain, TurnCommand, TurnReport,
};

// Crate-specific error and result types.
pub use errors::{DuelError, DuelResult, SubmitError};
