//! Settings persistence using TOML
//!
//! Stores settings in ~/.config/blockfall/settings.toml (or platform equivalent)

use crate::bag::{Bag, PieceSpec};
use crate::error::{EngineError, Result};
use crate::map::MapConfig;
use crate::tetromino::PieceKind;
use directories::ProjectDirs;
use ratatui::style::Color;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::warn;

/// Game settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Grid geometry
    pub board: BoardSettings,
    /// Tick timing
    pub timing: TimingSettings,
    /// Keybindings
    pub keys: KeyBindings,
    /// Audio settings
    pub audio: AudioSettings,
    /// Piece catalogue
    pub pieces: PieceSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoardSettings {
    /// Inner width in cells
    pub width: usize,
    /// Inner height in cells
    pub height: usize,
    /// Terminal columns per cell
    pub cell_size: u16,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingSettings {
    /// Gravity tick in milliseconds
    pub tick_ms: u64,
}

/// Key bindings (stored as strings for easy editing)
/// Each action can have one or more keys bound to it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyBindings {
    #[serde(deserialize_with = "deserialize_keys", serialize_with = "serialize_keys")]
    pub move_left: Vec<String>,
    #[serde(deserialize_with = "deserialize_keys", serialize_with = "serialize_keys")]
    pub move_right: Vec<String>,
    #[serde(deserialize_with = "deserialize_keys", serialize_with = "serialize_keys")]
    pub soft_drop: Vec<String>,
    #[serde(deserialize_with = "deserialize_keys", serialize_with = "serialize_keys")]
    pub rotate: Vec<String>,
    #[serde(deserialize_with = "deserialize_keys", serialize_with = "serialize_keys")]
    pub quit: Vec<String>,
}

/// Deserialize keys as either a single string or array of strings
fn deserialize_keys<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::{self, Visitor};

    struct KeysVisitor;

    impl<'de> Visitor<'de> for KeysVisitor {
        type Value = Vec<String>;

        fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
            formatter.write_str("a string or array of strings")
        }

        fn visit_str<E>(self, v: &str) -> std::result::Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(vec![v.to_string()])
        }

        fn visit_seq<A>(self, mut seq: A) -> std::result::Result<Self::Value, A::Error>
        where
            A: de::SeqAccess<'de>,
        {
            let mut keys = Vec::new();
            while let Some(key) = seq.next_element::<String>()? {
                keys.push(key);
            }
            Ok(keys)
        }
    }

    deserializer.deserialize_any(KeysVisitor)
}

/// Serialize keys: single key as string, multiple as array
fn serialize_keys<S>(keys: &[String], serializer: S) -> std::result::Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    use serde::ser::SerializeSeq;

    if keys.len() == 1 {
        serializer.serialize_str(&keys[0])
    } else {
        let mut seq = serializer.serialize_seq(Some(keys.len()))?;
        for key in keys {
            seq.serialize_element(key)?;
        }
        seq.end()
    }
}

/// Audio settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioSettings {
    pub enabled: bool,
    /// SFX volume (0-100)
    pub sfx_volume: u32,
}

/// Piece catalogue and randomizer seed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PieceSettings {
    pub catalogue: Vec<PieceEntry>,
    /// Fixed bag seed, random when absent
    pub seed: Option<u64>,
}

/// A catalogue entry; color falls back to the kind's default
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PieceEntry {
    pub kind: PieceKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<Color>,
}

impl Default for BoardSettings {
    fn default() -> Self {
        let map = MapConfig::default();
        Self {
            width: map.width,
            height: map.height,
            cell_size: map.cell_size,
        }
    }
}

impl Default for TimingSettings {
    fn default() -> Self {
        Self {
            tick_ms: MapConfig::default().tick_interval.as_millis() as u64,
        }
    }
}

impl Default for KeyBindings {
    fn default() -> Self {
        Self {
            move_left: vec!["Left".to_string(), "a".to_string()],
            move_right: vec!["Right".to_string(), "d".to_string()],
            soft_drop: vec!["Down".to_string(), "s".to_string()],
            rotate: vec!["Up".to_string(), "w".to_string()],
            quit: vec!["q".to_string(), "Esc".to_string()],
        }
    }
}

impl Default for AudioSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            sfx_volume: 50,
        }
    }
}

impl Default for PieceSettings {
    fn default() -> Self {
        Self {
            catalogue: PieceKind::all()
                .into_iter()
                .map(|kind| PieceEntry { kind, color: None })
                .collect(),
            seed: None,
        }
    }
}

impl Settings {
    /// Get the config directory path
    fn config_dir() -> Option<PathBuf> {
        ProjectDirs::from("com", "blockfall", "blockfall")
            .map(|dirs| dirs.config_dir().to_path_buf())
    }

    /// Get the settings file path
    pub fn settings_path() -> Option<PathBuf> {
        Self::config_dir().map(|dir| dir.join("settings.toml"))
    }

    /// Load settings from the default location, or fall back to defaults
    pub fn load() -> Self {
        let Some(path) = Self::settings_path() else {
            return Self::default();
        };
        if !path.exists() {
            return Self::default();
        }

        Self::load_from(&path).unwrap_or_else(|e| {
            warn!("using default settings: {}", e);
            Self::default()
        })
    }

    /// Load settings from an explicit file
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .map_err(|e| EngineError::Settings(format!("failed to read {}: {}", path.display(), e)))?;
        Self::from_toml(&contents)
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        toml::from_str(contents).map_err(|e| EngineError::Settings(format!("failed to parse: {}", e)))
    }

    /// Save settings to the default location
    pub fn save(&self) -> Result<()> {
        let Some(path) = Self::settings_path() else {
            return Err(EngineError::Settings(
                "could not determine settings path".to_string(),
            ));
        };
        self.save_to(&path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)
                .map_err(|e| EngineError::Settings(format!("failed to create config dir: {}", e)))?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| EngineError::Settings(format!("failed to serialize: {}", e)))?;

        fs::write(path, contents)
            .map_err(|e| EngineError::Settings(format!("failed to write settings: {}", e)))?;

        Ok(())
    }

    /// Validated session configuration
    pub fn map_config(&self) -> Result<MapConfig> {
        let config = MapConfig {
            width: self.board.width,
            height: self.board.height,
            cell_size: self.board.cell_size,
            tick_interval: Duration::from_millis(self.timing.tick_ms),
            ..MapConfig::default()
        };
        config.validate()?;
        Ok(config)
    }

    /// Catalogue entries with colors resolved
    pub fn catalogue(&self) -> Result<Vec<PieceSpec>> {
        if self.pieces.catalogue.is_empty() {
            return Err(EngineError::config("piece catalogue is empty"));
        }
        Ok(self
            .pieces
            .catalogue
            .iter()
            .map(|entry| PieceSpec::new(entry.kind, entry.color.unwrap_or(entry.kind.default_color())))
            .collect())
    }

    /// Piece source for a new session
    pub fn piece_source(&self) -> Result<Bag> {
        let catalogue = self.catalogue()?;
        Ok(match self.pieces.seed {
            Some(seed) => Bag::with_seed(catalogue, seed),
            None => Bag::new(catalogue),
        })
    }

    /// SFX volume as a 0.0-1.0 gain
    pub fn sfx_gain(&self) -> f32 {
        if self.audio.enabled {
            (self.audio.sfx_volume.min(100) as f32) / 100.0
        } else {
            0.0
        }
    }
}
