use crate::battle_data::Weather;
use crate::pokemon_types::PokemonType;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MoveCategory {
    Physical,
    Special,
    Status,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Target {
    User,
    Target,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display)]
pub enum StatKind {
    Attack,
    Defense,
    SpecialAttack,
    SpecialDefense,
    Speed,
    Accuracy,
    Evasion,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MoveEffect {
    // Status infliction, all with a % chance
    Burn(u8),
    Freeze(u8),
    Paralyze(u8),
    Poison(u8),
    BadlyPoison(u8),
    Sleep(u8),
    Confuse(u8),
    Flinch(u8),

    // Stat stages: target, stat, delta, chance %
    StatChange(Target, StatKind, i8, u8),

    // Damage-linked effects
    Recoil(u8), // % of damage dealt
    Drain(u8),  // % of damage dealt healed
    HighCrit,
    MultiHit(u8, u8), // guaranteed hits, % chance of continuation

    // Self-targeted utility
    Heal(u8), // % of max HP
    Substitute,

    // Opponent-targeted conditions
    Trap(u8),    // chance % to trap (blocks voluntary switching)
    Disable(u8), // chance % to disable the target's last used move

    // Field-wide effects
    SetWeather(Weather),
    TrickRoom,

    // Multi-turn commitments (forced moves)
    ChargeUp, // spend a turn charging, strike next turn
    Rampage,  // locked in for 2-3 turns, then confused
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoveData {
    pub name: String,
    pub move_type: PokemonType,
    pub category: MoveCategory,
    pub power: Option<u16>,
    pub accuracy: Option<u8>, // None never misses
    pub pp: u8,
    pub priority: i8,
    pub effects: Vec<MoveEffect>,
}

impl MoveData {
    /// The always-legal fallback when every slot is exhausted. Typeless,
    /// never disabled, unlimited uses; the quarter-damage recoil is applied
    /// by the resolver.
    pub fn struggle() -> MoveData {
        MoveData {
            name: "Struggle".to_string(),
            move_type: PokemonType::Typeless,
            category: MoveCategory::Physical,
            power: Some(50),
            accuracy: None,
            pp: 0,
            priority: 0,
            effects: vec![MoveEffect::Recoil(25)],
        }
    }

    pub fn is_damaging(&self) -> bool {
        matches!(self.category, MoveCategory::Physical | MoveCategory::Special)
            && self.power.is_some()
    }
}
