//! Runtime configuration, read from an optional JSON file.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use waystones_engine::world::dimension::DimensionId;

use crate::names::{NameGenerationMode, SyllableNameGenerator};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Where levels and registry data are saved.
    pub world_dir: PathBuf,
    /// Seed for the level's random source (names are drawn from it).
    pub seed: u64,
    pub dimension: DimensionId,
    pub name_generation_mode: NameGenerationMode,
    /// Preset names, used according to `name_generation_mode`.
    pub custom_names: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            world_dir: PathBuf::from("world"),
            seed: 0,
            dimension: DimensionId::Overworld,
            name_generation_mode: NameGenerationMode::RandomOnly,
            custom_names: Vec::new(),
        }
    }
}

impl Config {
    /// Read `path` if given; missing fields take their defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        serde_json::from_str(&text).with_context(|| format!("parsing config {}", path.display()))
    }

    pub fn name_generator(&self) -> SyllableNameGenerator {
        SyllableNameGenerator::new(self.name_generation_mode, self.custom_names.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_keeps_defaults() {
        let config: Config = serde_json::from_str(
            r#"{ "seed": 42, "dimension": "minecraft:the_end", "name_generation_mode": "preset_first" }"#,
        )
        .unwrap();
        assert_eq!(config.seed, 42);
        assert_eq!(config.dimension, DimensionId::End);
        assert_eq!(config.name_generation_mode, NameGenerationMode::PresetFirst);
        assert_eq!(config.world_dir, PathBuf::from("world"));
        assert!(config.custom_names.is_empty());
    }

    #[test]
    fn no_path_means_defaults() {
        assert_eq!(Config::load(None).unwrap(), Config::default());
    }
}
