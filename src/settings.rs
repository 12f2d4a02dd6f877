use std::{fs, path::PathBuf};

use anyhow::{Context, Result};
use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::tiles::{default_providers, TileProvider};
use crate::types::Coord;

/// On-disk app configuration. Missing or unreadable files fall back to
/// defaults so a fresh install always starts.
#[derive(Resource, Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    pub starting_location: Coord,
    pub starting_zoom: u32,
    pub tile_providers: Vec<TileProvider>,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            starting_location: Coord::new(0.0, 0.0),
            starting_zoom: 4,
            tile_providers: default_providers(),
        }
    }
}

fn settings_path() -> PathBuf {
    directories::ProjectDirs::from("", "", "geosketch")
        .map(|dirs| dirs.config_dir().join("settings.json"))
        .unwrap_or_else(|| PathBuf::from("settings.json"))
}

impl AppSettings {
    pub fn load() -> Self {
        let path = settings_path();
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(settings) => settings,
                Err(e) => {
                    // Runs before DefaultPlugins installs the tracing
                    // subscriber, so the log macros would be swallowed here.
                    eprintln!("ignoring malformed {}: {e}", path.display());
                    Self::default()
                }
            },
            Err(_) => Self::default(),
        }
    }

    pub fn save(&self) -> Result<()> {
        let path = settings_path();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating {}", parent.display()))?;
        }
        let contents = serde_json::to_string_pretty(self).context("serializing settings")?;
        fs::write(&path, contents).with_context(|| format!("writing {}", path.display()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_survive_a_round_trip() {
        let settings = AppSettings::default();
        let json = serde_json::to_string(&settings).unwrap();
        let back: AppSettings = serde_json::from_str(&json).unwrap();
        assert_eq!(back.starting_zoom, settings.starting_zoom);
        assert_eq!(back.tile_providers, settings.tile_providers);
    }

    #[test]
    fn partial_files_fill_in_defaults() {
        let back: AppSettings = serde_json::from_str(r#"{"starting_zoom": 9}"#).unwrap();
        assert_eq!(back.starting_zoom, 9);
        assert_eq!(back.tile_providers, default_providers());
    }
}
