use crate::battle::state::{FieldState, TurnRng};
use crate::pokemon::{DuelPokemon, StatusCondition};
use crate::trainer::Trainer;
use schema::{MoveCategory, MoveData, PokemonType, StatKind, Weather};

/// Effective attacking stat for a move, after stage modifiers and burn.
pub fn effective_attack(pokemon: &DuelPokemon, trainer: &Trainer, move_data: &MoveData) -> u16 {
    let (base, stat) = match move_data.category {
        MoveCategory::Physical => (pokemon.stats[1], StatKind::Attack),
        MoveCategory::Special => (pokemon.stats[3], StatKind::SpecialAttack),
        MoveCategory::Status => return 0,
    };

    let mut value = apply_stat_stage_multiplier(base, trainer.stat_stage(stat));

    // Burn halves physical attack.
    if move_data.category == MoveCategory::Physical
        && matches!(pokemon.status, Some(StatusCondition::Burn))
    {
        value /= 2;
    }

    value
}

/// Effective defending stat against a move, after stage modifiers.
pub fn effective_defense(pokemon: &DuelPokemon, trainer: &Trainer, move_data: &MoveData) -> u16 {
    let (base, stat) = match move_data.category {
        MoveCategory::Physical => (pokemon.stats[2], StatKind::Defense),
        MoveCategory::Special => (pokemon.stats[4], StatKind::SpecialDefense),
        MoveCategory::Status => return 0,
    };

    apply_stat_stage_multiplier(base, trainer.stat_stage(stat)).max(1)
}

/// Effective speed after stage modifiers and paralysis quartering.
pub fn effective_speed(pokemon: &DuelPokemon, trainer: &Trainer) -> u16 {
    let mut speed = apply_stat_stage_multiplier(pokemon.stats[5], trainer.stat_stage(StatKind::Speed));

    if matches!(pokemon.status, Some(StatusCondition::Paralysis)) {
        speed /= 4;
    }

    speed
}

/// Type effectiveness of an attacking type against a defender's full type
/// list. Inverse mode flips each per-type component: immunities and
/// resistances become weaknesses, weaknesses become resistances.
pub fn type_effectiveness(
    attacking: PokemonType,
    defender_types: &[PokemonType],
    inverse: bool,
) -> f32 {
    defender_types
        .iter()
        .map(|defending| {
            let base = PokemonType::type_effectiveness(attacking, *defending);
            if inverse { invert_component(base) } else { base }
        })
        .product()
}

fn invert_component(multiplier: f32) -> f32 {
    if multiplier == 0.0 || multiplier == 0.5 {
        2.0
    } else if multiplier == 2.0 {
        0.5
    } else {
        1.0
    }
}

/// Weather multiplier on a move's damage.
pub fn weather_damage_multiplier(weather: Option<Weather>, move_type: PokemonType) -> f32 {
    match (weather, move_type) {
        (Some(Weather::Rain), PokemonType::Water) => 1.5,
        (Some(Weather::Rain), PokemonType::Fire) => 0.5,
        (Some(Weather::Sun), PokemonType::Fire) => 1.5,
        (Some(Weather::Sun), PokemonType::Water) => 0.5,
        _ => 1.0,
    }
}

/// Roll whether a move connects: base accuracy, stage-adjusted, fog-adjusted.
pub fn move_hits(
    attacker: &Trainer,
    defender: &Trainer,
    move_data: &MoveData,
    field: &FieldState,
    rng: &mut TurnRng,
) -> bool {
    // No accuracy value means the move never misses.
    let Some(base_accuracy) = move_data.accuracy else {
        return true;
    };

    let adjusted_stage = (attacker.stat_stage(StatKind::Accuracy)
        - defender.stat_stage(StatKind::Evasion))
    .clamp(-6, 6);

    let mut accuracy = base_accuracy as f64 * accuracy_stage_multiplier(adjusted_stage);

    if field.weather_kind() == Some(Weather::Fog) {
        accuracy *= 3.0 / 5.0;
    }

    let threshold = (accuracy.round() as i64).clamp(1, 100) as u8;
    rng.next_outcome("Accuracy Check") <= threshold
}

/// Accuracy/evasion stage multipliers. A different table from the regular
/// stat multipliers: thirds instead of halves.
fn accuracy_stage_multiplier(stage: i8) -> f64 {
    match stage {
        -6 => 3.0 / 9.0,
        -5 => 3.0 / 8.0,
        -4 => 3.0 / 7.0,
        -3 => 3.0 / 6.0,
        -2 => 3.0 / 5.0,
        -1 => 3.0 / 4.0,
        0 => 1.0,
        1 => 4.0 / 3.0,
        2 => 5.0 / 3.0,
        3 => 6.0 / 3.0,
        4 => 7.0 / 3.0,
        5 => 8.0 / 3.0,
        6 => 9.0 / 3.0,
        _ => 1.0,
    }
}

/// Regular stat stage multipliers: -6..=+6 maps 2/8 .. 8/2.
pub fn apply_stat_stage_multiplier(base_stat: u16, stage: i8) -> u16 {
    let clamped = stage.clamp(-6, 6);
    if clamped == 0 {
        return base_stat;
    }

    let multiplier = if clamped < 0 {
        2.0 / (2.0 + (-clamped) as f64)
    } else {
        (2.0 + clamped as f64) / 2.0
    };

    ((base_stat as f64) * multiplier).round() as u16
}
