//! Demo binary: load the reference data and run an AI-vs-AI duel,
//! printing each turn's narration as it resolves.

use pokeduel::{
    Dex, Duel, DuelPokemon, DuelResult, DuelRules, DuelSetup, Gender, ScoringAi, Trainer,
};
use std::path::Path;

fn build_party(dex: &Dex, specs: &[(&str, u8, &[&str])]) -> DuelResult<Vec<DuelPokemon>> {
    specs
        .iter()
        .map(|(species, level, moves)| {
            DuelPokemon::from_dex(dex, species, None, *level, Gender::Unknown, false, moves)
        })
        .collect()
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let dex = Dex::load_dir(Path::new("data"))?;

    let red_party = build_party(
        &dex,
        &[
            ("charizard", 60, &["flamethrower", "dragon-claw", "slash", "sunny-day"]),
            ("garchomp", 60, &["earthquake", "outrage", "sandstorm", "swords-dance"]),
            ("gengar", 60, &["shadow-ball", "sludge-bomb", "hypnosis", "disable"]),
        ],
    )?;
    let blue_party = build_party(
        &dex,
        &[
            ("blastoise", 60, &["hydro-pump", "ice-beam", "rain-dance", "substitute"]),
            ("lucario", 60, &["aura-sphere", "extreme-speed", "iron-head", "swords-dance"]),
            ("dragonite", 60, &["outrage", "thunderbolt", "recover", "double-slap"]),
        ],
    )?;

    let (duel, mut reports) = Duel::new(
        "demo".to_string(),
        DuelSetup {
            trainer: Trainer::new("red".to_string(), "Red".to_string(), red_party),
            brain: Box::new(ScoringAi::new()),
        },
        DuelSetup {
            trainer: Trainer::new("blue".to_string(), "Blue".to_string(), blue_party),
            brain: Box::new(ScoringAi::new()),
        },
        DuelRules::default(),
    )?;

    let printer = tokio::spawn(async move {
        while let Some(report) = reports.recv().await {
            for line in &report.narration {
                println!("{line}");
            }
            println!();
        }
    });

    let outcome = duel.run().await?;
    printer.await?;

    match outcome.winner {
        Some(side) => println!("Winner: {:?} (after {} turns)", side, outcome.turns),
        None => println!("No winner (after {} turns)", outcome.turns),
    }

    Ok(())
}
