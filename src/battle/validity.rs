use crate::battle::conditions::{VolatileCondition, VolatileKind};
use crate::trainer::Trainer;
use schema::Ability;

/// The legal move space for one trainer's coming turn. Callers must
/// branch: each variant carries a different payload and a different
/// obligation (auto-submit, present a menu, or present only Struggle).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoveChoice {
    /// A multi-turn commitment locks in exactly one move; the trainer is
    /// not prompted.
    Forced { slot: usize },

    /// The move-slot indexes that may be chosen this turn.
    Usable { slots: Vec<usize> },

    /// Every slot is exhausted or disabled; Struggle is the only attack.
    StruggleOnly,
}

/// Whether a swap is one of the trainer's two turn actions or a forced
/// replacement after a faint. Trapping only restricts the former.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwapKind {
    Voluntary,
    Forced,
}

/// Compute the legal move space for the trainer's active creature.
pub fn available_moves(trainer: &Trainer) -> MoveChoice {
    // Multi-turn commitments bypass choice entirely.
    if let Some(VolatileCondition::Charging { slot }) = trainer.volatile(VolatileKind::Charging) {
        return MoveChoice::Forced { slot: *slot };
    }
    if let Some(VolatileCondition::Rampaging { slot, .. }) =
        trainer.volatile(VolatileKind::Rampaging)
    {
        return MoveChoice::Forced { slot: *slot };
    }

    let Some(active) = trainer.active() else {
        return MoveChoice::StruggleOnly;
    };

    let disabled_slot = match trainer.volatile(VolatileKind::Disabled) {
        Some(VolatileCondition::Disabled { slot, .. }) => Some(*slot),
        _ => None,
    };

    let slots: Vec<usize> = active
        .moves
        .iter()
        .enumerate()
        .filter_map(|(i, slot)| {
            let slot = slot.as_ref()?;
            if slot.pp == 0 || disabled_slot == Some(i) {
                None
            } else {
                Some(i)
            }
        })
        .collect();

    if slots.is_empty() {
        MoveChoice::StruggleOnly
    } else {
        MoveChoice::Usable { slots }
    }
}

/// Compute the legal swap targets for a trainer. A bench creature is a
/// valid target iff it exists, is not fainted, and is not already active.
/// Voluntary swaps are additionally blocked by trapping (the Trapped
/// volatile, or an opposing Shadow Tag); forced post-faint swaps never
/// are.
pub fn valid_swaps(trainer: &Trainer, opponent: &Trainer, kind: SwapKind) -> Vec<usize> {
    if kind == SwapKind::Voluntary {
        let trapped = trainer.has_volatile(VolatileKind::Trapped)
            || opponent
                .active()
                .map(|p| !p.is_fainted() && p.ability == Ability::ShadowTag)
                .unwrap_or(false);
        if trapped {
            return Vec::new();
        }
    }

    trainer
        .party
        .iter()
        .enumerate()
        .filter_map(|(i, slot)| {
            let pokemon = slot.as_ref()?;
            if i != trainer.active_index && !pokemon.is_fainted() {
                Some(i)
            } else {
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pokemon::{DuelPokemon, MoveSlot};
    use schema::{MoveCategory, MoveData, PokemonType};

    fn basic_move(name: &str, pp: u8) -> MoveData {
        MoveData {
            name: name.to_string(),
            move_type: PokemonType::Normal,
            category: MoveCategory::Physical,
            power: Some(60),
            accuracy: Some(100),
            pp,
            priority: 0,
            effects: vec![],
        }
    }

    fn slot_with_pp(name: &str, max: u8, remaining: u8) -> MoveSlot {
        let mut slot = MoveSlot::new(basic_move(name, max));
        slot.pp = remaining;
        slot
    }

    fn trainer_with_moves(moves: [Option<MoveSlot>; 4]) -> Trainer {
        let pokemon = DuelPokemon::new_for_test(
            "Lead",
            vec![PokemonType::Normal],
            [100, 80, 80, 80, 80, 80],
            moves,
        );
        let bench = DuelPokemon::new_for_test(
            "Bench",
            vec![PokemonType::Normal],
            [100, 80, 80, 80, 80, 80],
            [const { None }; 4],
        );
        Trainer::new("t".to_string(), "Trainer".to_string(), vec![pokemon, bench])
    }

    fn plain_opponent() -> Trainer {
        trainer_with_moves([const { None }; 4])
    }

    #[test]
    fn exhausted_slots_are_excluded() {
        let trainer = trainer_with_moves([
            Some(slot_with_pp("Tackle", 35, 10)),
            Some(slot_with_pp("Slam", 20, 0)),
            Some(slot_with_pp("Bite", 25, 3)),
            None,
        ]);

        assert_eq!(
            available_moves(&trainer),
            MoveChoice::Usable { slots: vec![0, 2] }
        );
    }

    #[test]
    fn all_exhausted_leaves_only_struggle() {
        let trainer = trainer_with_moves([
            Some(slot_with_pp("Tackle", 35, 0)),
            Some(slot_with_pp("Slam", 20, 0)),
            None,
            None,
        ]);

        assert_eq!(available_moves(&trainer), MoveChoice::StruggleOnly);
    }

    #[test]
    fn disable_removes_exactly_one_slot() {
        let mut trainer = trainer_with_moves([
            Some(slot_with_pp("Tackle", 35, 10)),
            Some(slot_with_pp("Slam", 20, 10)),
            None,
            None,
        ]);
        trainer.add_volatile(VolatileCondition::Disabled {
            slot: 0,
            turns_remaining: 3,
        });

        assert_eq!(
            available_moves(&trainer),
            MoveChoice::Usable { slots: vec![1] }
        );
    }

    #[test]
    fn charging_forces_the_committed_slot() {
        let mut trainer = trainer_with_moves([
            Some(slot_with_pp("Sky Dive", 10, 9)),
            Some(slot_with_pp("Slam", 20, 10)),
            None,
            None,
        ]);
        trainer.add_volatile(VolatileCondition::Charging { slot: 0 });

        assert_eq!(available_moves(&trainer), MoveChoice::Forced { slot: 0 });
    }

    #[test]
    fn trapping_blocks_voluntary_but_not_forced_swaps() {
        let mut trainer = trainer_with_moves([Some(slot_with_pp("Tackle", 35, 10)), None, None, None]);
        trainer.add_volatile(VolatileCondition::Trapped { turns_remaining: 3 });
        let opponent = plain_opponent();

        assert!(valid_swaps(&trainer, &opponent, SwapKind::Voluntary).is_empty());
        assert_eq!(valid_swaps(&trainer, &opponent, SwapKind::Forced), vec![1]);
    }

    #[test]
    fn shadow_tag_on_the_opposing_active_traps() {
        let trainer = trainer_with_moves([Some(slot_with_pp("Tackle", 35, 10)), None, None, None]);
        let mut opponent = plain_opponent();
        opponent.active_mut().unwrap().ability = Ability::ShadowTag;

        assert!(valid_swaps(&trainer, &opponent, SwapKind::Voluntary).is_empty());
        assert_eq!(valid_swaps(&trainer, &opponent, SwapKind::Forced), vec![1]);
    }

    #[test]
    fn fainted_bench_members_are_never_valid() {
        let mut trainer = trainer_with_moves([Some(slot_with_pp("Tackle", 35, 10)), None, None, None]);
        trainer.party[1].as_mut().unwrap().take_damage(500);
        let opponent = plain_opponent();

        assert!(valid_swaps(&trainer, &opponent, SwapKind::Voluntary).is_empty());
        assert!(valid_swaps(&trainer, &opponent, SwapKind::Forced).is_empty());
    }
}
