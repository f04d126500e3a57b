use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;
use tracing::info;

use super::gameplay::DWELL_SECONDS;

pub(crate) const SETTINGS_FILE_NAME: &str = "gameplay.json";

/// Tunables read from `assets/config/gameplay.json`. Every field is optional in
/// the file; missing ones keep the shipped defaults.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct GameplaySettings {
    pub(crate) lobby_move_speed: f32,
    pub(crate) mission_control_move_speed: f32,
    pub(crate) npc_speed: f32,
    pub(crate) npc_dwell_seconds: f32,
    pub(crate) interaction_radius: f32,
    pub(crate) start_scene: String,
}

impl Default for GameplaySettings {
    fn default() -> Self {
        Self {
            lobby_move_speed: 160.0,
            mission_control_move_speed: 200.0,
            npc_speed: 60.0,
            npc_dwell_seconds: DWELL_SECONDS,
            interaction_radius: 48.0,
            start_scene: "title".to_string(),
        }
    }
}

#[derive(Debug, Error)]
pub(crate) enum SettingsError {
    #[error("read settings '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("parse settings '{path}'{}: {message}", at_json_path(.json_path))]
    Parse {
        path: PathBuf,
        json_path: String,
        message: String,
    },
    #[error("validation failed at {field}: {message}")]
    Invalid { field: &'static str, message: String },
}

fn at_json_path(json_path: &str) -> String {
    if json_path.is_empty() || json_path == "." {
        String::new()
    } else {
        format!(" at {json_path}")
    }
}

impl GameplaySettings {
    /// An absent file means defaults; an unreadable or malformed one is an error.
    pub(crate) fn load(config_dir: &Path) -> Result<Self, SettingsError> {
        let path = config_dir.join(SETTINGS_FILE_NAME);
        let raw = match fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(error) if error.kind() == io::ErrorKind::NotFound => {
                info!(path = %path.display(), "gameplay_settings_default");
                return Ok(Self::default());
            }
            Err(source) => return Err(SettingsError::Read { path, source }),
        };
        let settings = Self::parse_json(&raw, &path)?;
        settings.validate()?;
        info!(
            path = %path.display(),
            start_scene = %settings.start_scene,
            "gameplay_settings_loaded"
        );
        Ok(settings)
    }

    fn parse_json(raw: &str, path: &Path) -> Result<Self, SettingsError> {
        let mut deserializer = serde_json::Deserializer::from_str(raw);
        match serde_path_to_error::deserialize::<_, GameplaySettings>(&mut deserializer) {
            Ok(settings) => Ok(settings),
            Err(error) => {
                let json_path = error.path().to_string();
                let source = error.into_inner();
                Err(SettingsError::Parse {
                    path: path.to_path_buf(),
                    json_path,
                    message: source.to_string(),
                })
            }
        }
    }

    fn validate(&self) -> Result<(), SettingsError> {
        let positive = [
            ("lobby_move_speed", self.lobby_move_speed),
            ("mission_control_move_speed", self.mission_control_move_speed),
            ("npc_speed", self.npc_speed),
            ("interaction_radius", self.interaction_radius),
        ];
        for (field, value) in positive {
            if !value.is_finite() || value <= 0.0 {
                return Err(SettingsError::Invalid {
                    field,
                    message: format!("expected a positive number, got {value}"),
                });
            }
        }
        if !self.npc_dwell_seconds.is_finite() || self.npc_dwell_seconds < DWELL_SECONDS {
            return Err(SettingsError::Invalid {
                field: "npc_dwell_seconds",
                message: format!(
                    "expected at least {DWELL_SECONDS} seconds, got {}",
                    self.npc_dwell_seconds
                ),
            });
        }
        if self.start_scene.trim().is_empty() {
            return Err(SettingsError::Invalid {
                field: "start_scene",
                message: "must not be empty".to_string(),
            });
        }
        Ok(())
    }
}
