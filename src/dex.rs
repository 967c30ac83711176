use crate::errors::{DuelError, DuelResult};
use schema::{MoveData, SpeciesData};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// Normalize a species or move identifier for lookup: lower-cased, with
/// everything that is not a letter or digit stripped. "Mr. Mime",
/// "mr-mime" and "MRMIME" all resolve to the same record.
pub fn normalize_id(raw: &str) -> String {
    raw.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

/// Read-only species/move reference store. Built once before any battle
/// and shared; the engine never mutates it.
///
/// Lookups fail closed: a missing record is an error the caller must
/// handle by rejecting the battle, never a silently substituted default.
#[derive(Debug, Clone, Default)]
pub struct Dex {
    species: HashMap<String, SpeciesData>,
    moves: HashMap<String, MoveData>,
}

impl Dex {
    /// Build a store from in-memory records. Used by tests and by callers
    /// that source data from somewhere other than the RON files.
    pub fn from_records(
        species: impl IntoIterator<Item = SpeciesData>,
        moves: impl IntoIterator<Item = MoveData>,
    ) -> Self {
        let mut dex = Dex::default();
        for record in species {
            dex.species.insert(normalize_id(&record.name), record);
        }
        for record in moves {
            dex.moves.insert(normalize_id(&record.name), record);
        }
        dex
    }

    /// Load `species.ron` and `moves.ron` from a data directory.
    pub fn load_dir(data_path: &Path) -> DuelResult<Dex> {
        let species: Vec<SpeciesData> = load_ron(&data_path.join("species.ron"))?;
        let moves: Vec<MoveData> = load_ron(&data_path.join("moves.ron"))?;
        let dex = Dex::from_records(species, moves);
        log::info!(
            "loaded reference data: {} species, {} moves",
            dex.species.len(),
            dex.moves.len()
        );
        Ok(dex)
    }

    pub fn species(&self, id: &str) -> DuelResult<&SpeciesData> {
        self.species
            .get(&normalize_id(id))
            .ok_or_else(|| DuelError::UnknownSpecies(id.to_string()))
    }

    pub fn move_data(&self, id: &str) -> DuelResult<&MoveData> {
        self.moves
            .get(&normalize_id(id))
            .ok_or_else(|| DuelError::UnknownMove(id.to_string()))
    }

    pub fn species_count(&self) -> usize {
        self.species.len()
    }

    pub fn move_count(&self) -> usize {
        self.moves.len()
    }
}

fn load_ron<T: serde::de::DeserializeOwned>(path: &Path) -> DuelResult<T> {
    let content = fs::read_to_string(path)
        .map_err(|e| DuelError::DataLoad(format!("{}: {}", path.display(), e)))?;
    ron::from_str(&content).map_err(|e| DuelError::DataLoad(format!("{}: {}", path.display(), e)))
}
