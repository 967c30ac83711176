use serde::{Deserialize, Serialize};

/// Volatile conditions attached to the creature currently on the field.
/// They live on the owning trainer and are wiped on switch-out, so a
/// freshly sent creature always starts clean.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub enum VolatileCondition {
    Flinched,
    Confused { turns_remaining: u8 },
    Trapped { turns_remaining: u8 },
    /// Committed to a two-turn move; strikes with `slot` next turn.
    Charging { slot: usize },
    /// Locked into `slot` until the counter empties, then confusion.
    Rampaging { slot: usize, turns_remaining: u8 },
    Disabled { slot: usize, turns_remaining: u8 },
    Substitute { hp: u16 },
}

/// Payload-less discriminant, used as the map key and in removal commands.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VolatileKind {
    Flinched,
    Confused,
    Trapped,
    Charging,
    Rampaging,
    Disabled,
    Substitute,
}

impl VolatileCondition {
    pub fn kind(&self) -> VolatileKind {
        match self {
            VolatileCondition::Flinched => VolatileKind::Flinched,
            VolatileCondition::Confused { .. } => VolatileKind::Confused,
            VolatileCondition::Trapped { .. } => VolatileKind::Trapped,
            VolatileCondition::Charging { .. } => VolatileKind::Charging,
            VolatileCondition::Rampaging { .. } => VolatileKind::Rampaging,
            VolatileCondition::Disabled { .. } => VolatileKind::Disabled,
            VolatileCondition::Substitute { .. } => VolatileKind::Substitute,
        }
    }
}

impl VolatileKind {
    /// Narration text for applied/expired messages.
    pub fn describe(&self) -> &'static str {
        match self {
            VolatileKind::Flinched => "flinching",
            VolatileKind::Confused => "confusion",
            VolatileKind::Trapped => "trapping",
            VolatileKind::Charging => "charging",
            VolatileKind::Rampaging => "rampage",
            VolatileKind::Disabled => "disable",
            VolatileKind::Substitute => "substitute",
        }
    }
}
