use crate::dex::Dex;
use crate::errors::{DuelError, DuelResult};
use schema::{Ability, Gender, MegaForm, MoveData, PokemonType};
use serde::{Deserialize, Serialize};

/// Primary status. Mutually exclusive; switching does not clear it.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum StatusCondition {
    /// Remaining sleep turns, decremented when the sleeper tries to act.
    Sleep(u8),
    Poison,
    /// Escalating poison; the counter grows each end-of-turn tick.
    BadlyPoisoned(u8),
    Burn,
    Paralysis,
    Freeze,
}

impl StatusCondition {
    /// Short label for HP-bar style rendering.
    pub fn label(&self) -> &'static str {
        match self {
            StatusCondition::Sleep(_) => "SLP",
            StatusCondition::Poison => "PSN",
            StatusCondition::BadlyPoisoned(_) => "TOX",
            StatusCondition::Burn => "BRN",
            StatusCondition::Paralysis => "PAR",
            StatusCondition::Freeze => "FRZ",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoveSlot {
    pub data: MoveData,
    pub pp: u8,
}

#[derive(Debug, PartialEq)]
pub enum UseMoveError {
    NoPpRemaining,
    EmptySlot,
}

impl MoveSlot {
    pub fn new(data: MoveData) -> Self {
        let pp = data.pp;
        MoveSlot { data, pp }
    }

    pub fn max_pp(&self) -> u8 {
        self.data.pp
    }

    pub fn spend(&mut self) -> Result<(), UseMoveError> {
        if self.pp == 0 {
            return Err(UseMoveError::NoPpRemaining);
        }
        self.pp -= 1;
        Ok(())
    }
}

/// One battling creature's live state. Built from the reference store at
/// battle start, mutated turn by turn, discarded with the battle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DuelPokemon {
    /// Nickname if one was given, otherwise the species name.
    pub name: String,
    /// Display species name; replaced by the mega form's on transformation.
    pub species: String,
    pub level: u8,
    pub gender: Gender,
    pub shiny: bool,
    pub types: Vec<PokemonType>,
    pub ability: Ability,
    /// HP, ATK, DEF, SP.ATK, SP.DEF, SPD at full health.
    pub stats: [u16; 6],
    pub hp: u16,
    pub status: Option<StatusCondition>,
    pub moves: [Option<MoveSlot>; 4],
    pub mega_evolved: bool,
    /// Present iff the species record carries a mega form and it has not
    /// been applied yet.
    pub mega_form: Option<MegaForm>,
}

/// Stat computation from base stats and level. HP gets the flat level
/// bonus; everything else the +5 floor.
fn computed_stats(base: [u8; 6], level: u8) -> [u16; 6] {
    let mut stats = [0u16; 6];
    for (i, b) in base.iter().enumerate() {
        let scaled = (2 * (*b as u32) * level as u32) / 100;
        stats[i] = if i == 0 {
            (scaled + level as u32 + 10) as u16
        } else {
            (scaled + 5) as u16
        };
    }
    stats
}

impl DuelPokemon {
    /// Resolve a creature against the reference store. Fails closed if the
    /// species or any move cannot be found.
    pub fn from_dex(
        dex: &Dex,
        species_id: &str,
        nickname: Option<String>,
        level: u8,
        gender: Gender,
        shiny: bool,
        move_ids: &[&str],
    ) -> DuelResult<DuelPokemon> {
        let species = dex.species(species_id)?;
        if move_ids.is_empty() {
            return Err(DuelError::NoMoves(species.name.clone()));
        }

        let mut moves: [Option<MoveSlot>; 4] = [const { None }; 4];
        for (i, id) in move_ids.iter().take(4).enumerate() {
            moves[i] = Some(MoveSlot::new(dex.move_data(id)?.clone()));
        }

        let stats = computed_stats(species.base_stats.as_array(), level);
        Ok(DuelPokemon {
            name: nickname.unwrap_or_else(|| species.name.clone()),
            species: species.name.clone(),
            level,
            gender,
            shiny,
            types: species.types.clone(),
            ability: species.ability,
            stats,
            hp: stats[0],
            status: None,
            moves,
            mega_evolved: false,
            mega_form: species.mega.clone(),
        })
    }

    pub fn max_hp(&self) -> u16 {
        self.stats[0]
    }

    pub fn current_hp(&self) -> u16 {
        self.hp
    }

    pub fn hp_fraction(&self) -> f32 {
        self.hp as f32 / self.max_hp().max(1) as f32
    }

    pub fn is_fainted(&self) -> bool {
        self.hp == 0
    }

    /// Apply damage, clamping at zero. Returns true if this blow fainted
    /// the creature (false if it was already fainted).
    pub fn take_damage(&mut self, amount: u16) -> bool {
        if self.is_fainted() {
            return false;
        }
        self.hp = self.hp.saturating_sub(amount);
        self.is_fainted()
    }

    /// Heal up to max HP. Fainted creatures stay down.
    pub fn heal(&mut self, amount: u16) {
        if self.is_fainted() {
            return;
        }
        self.hp = (self.hp + amount).min(self.max_hp());
    }

    pub fn move_slot(&self, index: usize) -> Option<&MoveSlot> {
        self.moves.get(index).and_then(|slot| slot.as_ref())
    }

    pub fn spend_pp(&mut self, index: usize) -> Result<(), UseMoveError> {
        match self.moves.get_mut(index).and_then(|slot| slot.as_mut()) {
            Some(slot) => slot.spend(),
            None => Err(UseMoveError::EmptySlot),
        }
    }

    /// True when no slot has PP left, which makes Struggle the only
    /// remaining attack.
    pub fn out_of_pp(&self) -> bool {
        self.moves
            .iter()
            .flatten()
            .all(|slot| slot.pp == 0)
    }

    /// End-of-turn status damage. Returns the damage amount and the status
    /// to store afterwards (the toxic counter escalates here).
    pub fn status_damage(&self) -> (u16, Option<StatusCondition>) {
        let max = self.max_hp() as u32;
        match self.status {
            Some(StatusCondition::Burn) => ((max / 16).max(1) as u16, self.status),
            Some(StatusCondition::Poison) => ((max / 8).max(1) as u16, self.status),
            Some(StatusCondition::BadlyPoisoned(n)) => {
                let ticks = n.max(1) as u32;
                (
                    ((max * ticks) / 16).max(1) as u16,
                    Some(StatusCondition::BadlyPoisoned(n.saturating_add(1))),
                )
            }
            _ => (0, self.status),
        }
    }

    /// Replace everything but HP with the mega form. The caller is
    /// responsible for the once-per-battle bookkeeping.
    pub fn mega_evolve(&mut self) -> Option<String> {
        let mega = self.mega_form.take()?;
        let old_species = std::mem::replace(&mut self.species, mega.name.clone());
        self.types = mega.types;
        self.ability = mega.ability;
        let new_stats = computed_stats(mega.base_stats.as_array(), self.level);
        // HP total is untouched by mega evolution.
        for i in 1..6 {
            self.stats[i] = new_stats[i];
        }
        self.mega_evolved = true;
        Some(old_species)
    }

    /// Bare-stats constructor for scenario tests; bypasses the reference
    /// store entirely.
    #[cfg(test)]
    pub fn new_for_test(
        name: &str,
        types: Vec<PokemonType>,
        stats: [u16; 6],
        moves: [Option<MoveSlot>; 4],
    ) -> DuelPokemon {
        DuelPokemon {
            name: name.to_string(),
            species: name.to_string(),
            level: 50,
            gender: Gender::Unknown,
            shiny: false,
            types,
            ability: Ability::None,
            stats,
            hp: stats[0],
            status: None,
            moves,
            mega_evolved: false,
            mega_form: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn damage_clamps_at_zero_and_reports_the_killing_blow() {
        let mut mon =
            DuelPokemon::new_for_test("Test", vec![PokemonType::Normal], [40, 50, 50, 50, 50, 50], [const { None }; 4]);
        assert!(!mon.take_damage(39));
        assert_eq!(mon.current_hp(), 1);
        assert!(mon.take_damage(200));
        assert_eq!(mon.current_hp(), 0);
        // Already fainted: no second "fainted" report.
        assert!(!mon.take_damage(10));
    }

    #[test]
    fn heal_never_exceeds_max_and_never_revives() {
        let mut mon =
            DuelPokemon::new_for_test("Test", vec![PokemonType::Normal], [100, 50, 50, 50, 50, 50], [const { None }; 4]);
        mon.take_damage(30);
        mon.heal(500);
        assert_eq!(mon.current_hp(), 100);

        mon.take_damage(200);
        mon.heal(50);
        assert_eq!(mon.current_hp(), 0);
    }

    #[test]
    fn toxic_counter_escalates() {
        let mut mon =
            DuelPokemon::new_for_test("Test", vec![PokemonType::Normal], [160, 50, 50, 50, 50, 50], [const { None }; 4]);
        mon.status = Some(StatusCondition::BadlyPoisoned(1));

        let (first, next) = mon.status_damage();
        assert_eq!(first, 10); // 160/16
        mon.status = next;

        let (second, _) = mon.status_damage();
        assert_eq!(second, 20); // 2 * 160/16
    }

    #[test]
    fn level_formula_matches_known_values() {
        // Base 100 across the board at level 50.
        let stats = computed_stats([100; 6], 50);
        assert_eq!(stats[0], 160); // 2*100*50/100 + 50 + 10
        assert_eq!(stats[1], 105); // 2*100*50/100 + 5
    }
}
