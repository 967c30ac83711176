use thiserror::Error;

/// Battle-fatal errors. Any of these aborts the duel with no winner; the
/// caller owns participant notification and operator-facing diagnostics.
#[derive(Debug, Error)]
pub enum DuelError {
    /// The reference store has no record for a participating species.
    #[error("unknown species '{0}'")]
    UnknownSpecies(String),

    /// The reference store has no record for a requested move.
    #[error("unknown move '{0}'")]
    UnknownMove(String),

    /// Reference data could not be read or parsed.
    #[error("failed to load reference data: {0}")]
    DataLoad(String),

    /// A creature was requested with no moves at all.
    #[error("'{0}' was built without any moves")]
    NoMoves(String),

    /// A trainer arrived with an empty or fully fainted party.
    #[error("trainer '{0}' has no usable creatures")]
    EmptyParty(String),

    /// The channel to a trainer's interaction layer closed mid-battle.
    #[error("transport closed while waiting on {side}")]
    TransportClosed { side: String },

    /// An invariant broke during effect application. Carries enough
    /// context to reproduce the turn.
    #[error("resolver fault on turn {turn}: {detail}")]
    ResolverFault { turn: u32, detail: String },
}

/// Recoverable submission errors. These are returned to the interaction
/// layer at submission time so it can re-prompt; they never reach the
/// resolver.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SubmitError {
    /// The pending-action slot is write-once per turn.
    #[error("an action was already submitted for this turn")]
    AlreadySubmitted,

    /// A control from an earlier prompt was used after the battle moved
    /// on. The counters are prompt epochs: every prompt issued to a
    /// trainer opens a new one and expires all before it.
    #[error("this control has expired (prompt {prompt}, current {current})")]
    StaleInteraction { prompt: u32, current: u32 },

    /// Move slot is out of range, empty, exhausted, or disabled.
    #[error("move slot {0} is not usable")]
    IllegalMove(usize),

    /// Switch target is out of range, fainted, active, or blocked.
    #[error("party slot {0} is not a valid switch target")]
    IllegalSwap(usize),

    /// The battle is not waiting on this trainer right now.
    #[error("no input is being accepted from this trainer")]
    NotAwaitingInput,
}

/// Type alias for results carrying a battle-fatal error.
pub type DuelResult<T> = Result<T, DuelError>;
