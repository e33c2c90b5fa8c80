use anyhow::{Context, Result};
use reefwatch_core::{error::ReefwatchError, history::WaterTestLog};
use reefwatch_schemas::{
    file_formats::{SaltMixFile, TankFile},
    salt_mix::SaltMix,
    tank::Tank,
};
use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
};
use tracing::info;

/// Everything loaded from the data directory: tank definitions and salt mixes.
/// Water tests stay on disk and are read per tank through [`KnowledgeBase::test_log`].
pub struct KnowledgeBase {
    pub data_dir: PathBuf,
    pub tanks: HashMap<String, Tank>,
    pub salt_mixes: HashMap<String, SaltMix>,
}

impl KnowledgeBase {
    /// Loads all data from the specified base directory.
    pub fn load(base_path: &Path) -> Result<Self> {
        info!("Loading knowledge base from '{}'...", base_path.display());

        let tanks = load_yaml_files_into_map(
            base_path.join("tanks"),
            |file: TankFile| file.tanks,
            |item: &Tank| item.tank_id.clone(),
        )?;
        let salt_mixes = load_yaml_files_into_map(
            base_path.join("salt_mixes"),
            |file: SaltMixFile| file.salt_mixes,
            |item: &SaltMix| item.salt_mix_id.clone(),
        )?;

        info!(tanks = tanks.len(), salt_mixes = salt_mixes.len(), "Knowledge base loaded.");
        Ok(Self {
            data_dir: base_path.to_path_buf(),
            tanks,
            salt_mixes,
        })
    }

    pub fn tank(&self, tank_id: &str) -> Result<&Tank, ReefwatchError> {
        self.tanks
            .get(tank_id)
            .ok_or_else(|| ReefwatchError::TankNotFound(tank_id.to_string()))
    }

    pub fn salt_mix(&self, salt_mix_id: &str) -> Result<&SaltMix, ReefwatchError> {
        self.salt_mixes
            .get(salt_mix_id)
            .ok_or_else(|| ReefwatchError::SaltMixNotFound(salt_mix_id.to_string()))
    }

    /// The CSV history for `tank_id`, at `<data>/tests/<tank_id>.csv`.
    pub fn test_log(&self, tank_id: &str) -> WaterTestLog {
        WaterTestLog::new(self.data_dir.join("tests").join(format!("{}.csv", tank_id)))
    }
}

/// Generic helper to load all YAML files in a directory into a HashMap.
/// A missing directory yields an empty map.
fn load_yaml_files_into_map<P, F, E, T, K>(
    dir_path: P,
    extract_vec: E,
    get_key: K,
) -> Result<HashMap<String, T>>
where
    P: AsRef<Path>,
    F: for<'de> serde::Deserialize<'de>, // The file wrapper struct (e.g., TankFile)
    E: Fn(F) -> Vec<T>,                  // A closure to extract the Vec<T> from the wrapper
    K: Fn(&T) -> String,                 // A closure to get the key for the map from an item T
{
    let mut map = HashMap::new();
    if !dir_path.as_ref().is_dir() {
        return Ok(map);
    }

    for entry in fs::read_dir(dir_path.as_ref())
        .with_context(|| format!("Failed to read directory: {:?}", dir_path.as_ref()))?
    {
        let entry = entry?;
        let path = entry.path();
        if path.is_file() && path.extension().map_or(false, |s| s == "yaml" || s == "yml") {
            let content = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read {:?}", path))?;
            let file_wrapper: F = serde_yaml::from_str(&content)
                .with_context(|| format!("Failed to parse YAML from {:?}", path))?;

            for item in extract_vec(file_wrapper) {
                map.insert(get_key(&item), item);
            }
        }
    }
    Ok(map)
}
