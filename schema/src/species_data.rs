use crate::pokemon_types::{Ability, PokemonType};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BaseStats {
    pub hp: u8,
    pub attack: u8,
    pub defense: u8,
    pub sp_attack: u8,
    pub sp_defense: u8,
    pub speed: u8,
}

impl BaseStats {
    pub fn as_array(&self) -> [u8; 6] {
        [
            self.hp,
            self.attack,
            self.defense,
            self.sp_attack,
            self.sp_defense,
            self.speed,
        ]
    }
}

/// A one-per-battle upgraded form. HP is untouched on transformation, so
/// the mega record carries no hp field of its own.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MegaForm {
    pub name: String,
    pub types: Vec<PokemonType>,
    pub base_stats: BaseStats,
    pub ability: Ability,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeciesData {
    pub dex_number: u16,
    pub name: String,
    pub types: Vec<PokemonType>,
    pub base_stats: BaseStats,
    pub ability: Ability,
    /// Percent chance of being male; None for genderless species.
    pub male_ratio: Option<u8>,
    pub mega: Option<MegaForm>,
}
