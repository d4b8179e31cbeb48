//! Runtime configuration
//!
//! Values come from an optional JSON file, then environment variables override
//! individual fields. Everything is validated before a session is built from it.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use log::LevelFilter;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::{get_shape, is_valid, Grid, LayerLimits, SessionConfig};
use crate::runtime::RuntimeOptions;
use crate::types::{PatternKind, Position, GRID_SIZE, LINE_CLEAR_DELAY_MS, SPAWN_POSITION};

const N: usize = GRID_SIZE as usize;

pub const ENV_SEED: &str = "BLOCK_BUSTERS_SEED";
pub const ENV_CLEAR_DELAY_MS: &str = "BLOCK_BUSTERS_CLEAR_DELAY_MS";
pub const ENV_LOG: &str = "BLOCK_BUSTERS_LOG";
pub const ENV_STREAM: &str = "BLOCK_BUSTERS_STREAM";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("spawn position ({x}, {y}, {z}) cannot hold every block pattern")]
    InvalidSpawn { x: i8, y: i8, z: i8 },
    #[error("invalid layer limits: {0}")]
    InvalidLayerLimits(String),
    #[error("invalid value {value:?} for {var}")]
    InvalidEnv { var: &'static str, value: String },
    #[error("unknown log level {0:?}")]
    InvalidLogLevel(String),
}

/// How layer occupancy limits are chosen
///
/// In JSON: `"standard"`, `"disabled"`, or `{"custom": [null, 8, 5, 0, ...]}` with one
/// entry per layer from the floor up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum LayerLimitsSetting {
    #[default]
    Standard,
    Disabled,
    Custom(Vec<Option<u16>>),
}

impl LayerLimitsSetting {
    pub fn to_limits(&self) -> Result<LayerLimits, ConfigError> {
        match self {
            LayerLimitsSetting::Standard => Ok(LayerLimits::standard()),
            LayerLimitsSetting::Disabled => Ok(LayerLimits::disabled()),
            LayerLimitsSetting::Custom(values) => {
                if values.len() != N {
                    return Err(ConfigError::InvalidLayerLimits(format!(
                        "expected {} layers, got {}",
                        N,
                        values.len()
                    )));
                }
                let mut limits = [None; N];
                let mut ceiling: Option<(usize, u16)> = None;
                for (layer, value) in values.iter().enumerate() {
                    match (ceiling, *value) {
                        (Some((below, _)), None) => {
                            return Err(ConfigError::InvalidLayerLimits(format!(
                                "layer {} is unlimited above limited layer {}",
                                layer, below
                            )));
                        }
                        (Some((below, max)), Some(limit)) if limit > max => {
                            return Err(ConfigError::InvalidLayerLimits(format!(
                                "layer {} allows {} cells, more than layer {} ({})",
                                layer, limit, below, max
                            )));
                        }
                        (_, Some(limit)) => ceiling = Some((layer, limit)),
                        (None, None) => {}
                    }
                    limits[layer] = *value;
                }
                Ok(LayerLimits::from_limits(limits))
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RuntimeConfig {
    pub seed: u32,
    /// Spawn origin as `[x, y, z]`
    pub spawn: [i8; 3],
    pub clear_delay_ms: u32,
    pub layer_limits: LayerLimitsSetting,
    /// Push an observation after every state change, not only on request
    pub stream_observations: bool,
    pub max_pending_commands: usize,
    pub log_level: String,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            seed: 1,
            spawn: [SPAWN_POSITION.x, SPAWN_POSITION.y, SPAWN_POSITION.z],
            clear_delay_ms: LINE_CLEAR_DELAY_MS,
            layer_limits: LayerLimitsSetting::Standard,
            stream_observations: false,
            max_pending_commands: 16,
            log_level: "info".to_string(),
        }
    }
}

impl RuntimeConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&text)
    }

    /// Defaults or file contents, then environment overrides, then validation
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_overrides(|name| env::var(name).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Apply overrides from a variable lookup (the process environment in [`load`](Self::load))
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &'static str| {
            lookup(name)
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .map(|s| (name, s))
        };

        if let Some((name, value)) = var(ENV_SEED) {
            self.seed = parse_env(name, &value)?;
        }
        if let Some((name, value)) = var(ENV_CLEAR_DELAY_MS) {
            self.clear_delay_ms = parse_env(name, &value)?;
        }
        if let Some((_, value)) = var(ENV_LOG) {
            self.log_level = value;
        }
        if let Some((name, value)) = var(ENV_STREAM) {
            self.stream_observations = match value.to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" => true,
                "0" | "false" | "no" => false,
                _ => return Err(ConfigError::InvalidEnv { var: name, value }),
            };
        }
        Ok(())
    }

    pub fn spawn_position(&self) -> Position {
        Position::new(self.spawn[0], self.spawn[1], self.spawn[2])
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let spawn = self.spawn_position();
        let empty = Grid::new();
        let fits = PatternKind::ALL
            .iter()
            .all(|&kind| is_valid(&get_shape(kind), spawn, &empty));
        if !fits {
            return Err(ConfigError::InvalidSpawn {
                x: spawn.x,
                y: spawn.y,
                z: spawn.z,
            });
        }
        self.layer_limits.to_limits()?;
        self.level_filter()?;
        Ok(())
    }

    pub fn level_filter(&self) -> Result<LevelFilter, ConfigError> {
        self.log_level
            .parse()
            .map_err(|_| ConfigError::InvalidLogLevel(self.log_level.clone()))
    }

    pub fn session_config(&self) -> Result<SessionConfig, ConfigError> {
        Ok(SessionConfig {
            seed: self.seed,
            spawn: self.spawn_position(),
            layer_limits: self.layer_limits.to_limits()?,
            clear_delay_ms: self.clear_delay_ms,
        })
    }

    pub fn runtime_options(&self) -> RuntimeOptions {
        RuntimeOptions {
            stream_observations: self.stream_observations,
            max_pending_commands: self.max_pending_commands.max(1),
        }
    }
}

fn parse_env<T: std::str::FromStr>(var: &'static str, value: &str) -> Result<T, ConfigError> {
    value.parse().map_err(|_| ConfigError::InvalidEnv {
        var,
        value: value.to_string(),
    })
}
