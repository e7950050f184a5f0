use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use toml::map::Entry;
use tracing::{info, warn};

pub mod conf_file;
pub mod gestures;

use gestures::{build_table, ActionTable, EntryError, GestureMap};

use crate::input::{
    classify::SwipeLimits,
    delay::{DelaySettings, DEFAULT_DELAY_MS, MIN_DELAY_MS},
    gestures::{EngineSettings, GestureEngine},
};

/// Timeouts at or below this many ms would cancel every swipe; they disable it instead.
pub const MIN_TIMEOUT_MS: u64 = 60;

pub const CONFIG_NAME: &str = "swipectl";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Device path, device name, or `all`; the first touchpad when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device: Option<String>,
    /// Minimum swipe distance in dots.
    pub swipe_threshold: f64,
    /// Maximum swipe duration in ms, 0 disables.
    pub timeout: u64,
    /// Settle time in ms before a held begin hook fires.
    pub drag_delay: u64,
    pub drag_delay_3: bool,
    pub drag_delay_4: bool,
    #[serde(default = "gestures::default_gesture_map")]
    pub gestures: GestureMap,
    #[serde(skip)]
    source: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            device: None,
            swipe_threshold: 0.0,
            timeout: 0,
            drag_delay: DEFAULT_DELAY_MS,
            drag_delay_3: false,
            drag_delay_4: false,
            gestures: gestures::default_gesture_map(),
            source: None,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid configuration in {}: {source}", path.display())]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("{}:{line}: {source}", path.display())]
    Line {
        path: PathBuf,
        line: usize,
        #[source]
        source: conf_file::LineError,
    },
    #[error("{}: {source}", path.display())]
    Binding {
        path: PathBuf,
        #[source]
        source: EntryError,
    },
    #[error("invalid {name} '{value}': {reason}")]
    Setting {
        name: &'static str,
        value: String,
        reason: &'static str,
    },
}

impl Config {
    /// Load `path`, or the first file found on the search path.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let found = match path {
            Some(path) => Some(path.to_path_buf()),
            None => search_paths().into_iter().find(|candidate| candidate.is_file()),
        };

        match found {
            Some(path) => Self::from_file(&path),
            None => {
                warn!("no configuration file found, no gestures are bound");
                Ok(Self::default())
            }
        }
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let mut config = if path.extension().is_some_and(|ext| ext == "toml") {
            Self::from_toml(&content).map_err(|source| ConfigError::Toml {
                path: path.to_path_buf(),
                source,
            })?
        } else {
            conf_file::parse(&content).map_err(|(line, source)| ConfigError::Line {
                path: path.to_path_buf(),
                line,
                source,
            })?
        };
        config.source = Some(path.to_path_buf());

        // Surface binding errors at load time, with the file they came from.
        config.action_table()?;
        config.engine_settings()?;

        info!(path = %path.display(), "configuration loaded");
        Ok(config)
    }

    /// Parse TOML layered over the defaults.
    pub fn from_toml(content: &str) -> Result<Self, toml::de::Error> {
        let mut merged =
            toml::Value::try_from(Self::default()).expect("default config is always valid toml");
        let overrides = content.parse::<toml::Value>()?;
        merge_value(&mut merged, overrides);
        merged.try_into()
    }

    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    pub fn action_table(&self) -> Result<ActionTable, ConfigError> {
        build_table(&self.gestures).map_err(|source| ConfigError::Binding {
            path: self.source.clone().unwrap_or_default(),
            source,
        })
    }

    pub fn engine_settings(&self) -> Result<EngineSettings, ConfigError> {
        if self.swipe_threshold.is_nan() || self.swipe_threshold < 0.0 {
            return Err(ConfigError::Setting {
                name: "swipe_threshold",
                value: self.swipe_threshold.to_string(),
                reason: "must be zero or more dots",
            });
        }
        if self.drag_delay < MIN_DELAY_MS {
            return Err(ConfigError::Setting {
                name: "drag_delay",
                value: self.drag_delay.to_string(),
                reason: "must be at least 25 ms",
            });
        }

        let timeout_ms = if self.timeout > 0 && self.timeout <= MIN_TIMEOUT_MS {
            warn!(
                timeout = self.timeout,
                "swipe timeout of {MIN_TIMEOUT_MS} ms or less disables the timeout"
            );
            0
        } else {
            self.timeout
        };

        Ok(EngineSettings {
            swipe: SwipeLimits {
                min_distance: self.swipe_threshold,
                timeout_ms,
            },
            delay: DelaySettings {
                threshold_ms: self.drag_delay,
                three_fingers: self.drag_delay_3,
                four_fingers: self.drag_delay_4,
            },
        })
    }

    pub fn build_engine(&self) -> Result<GestureEngine, ConfigError> {
        Ok(GestureEngine::new(
            self.action_table()?,
            self.engine_settings()?,
        ))
    }

    /// Human readable listing of settings and bindings.
    pub fn describe(&self, table: &ActionTable) -> String {
        let mut out = String::new();
        let source = self
            .source()
            .map(|path| path.display().to_string())
            .unwrap_or_else(|| "(defaults)".to_string());
        let _ = writeln!(out, "configuration: {source}");
        let _ = writeln!(out, "device: {}", self.device.as_deref().unwrap_or("(first touchpad)"));
        let _ = writeln!(out, "swipe_threshold: {}", self.swipe_threshold);
        let _ = writeln!(out, "timeout: {} ms", self.timeout);
        let _ = writeln!(
            out,
            "drag_delay: {} ms (3 fingers: {}, 4 fingers: {})",
            self.drag_delay, self.drag_delay_3, self.drag_delay_4
        );
        for (family, motion, fingers, command) in table.bindings() {
            let fingers = fingers.map(|n| n.to_string()).unwrap_or_else(|| "*".into());
            let _ = writeln!(out, "gesture {family} {motion} {fingers} {command}");
        }
        out
    }
}

fn merge_value(base: &mut toml::Value, overrides: toml::Value) {
    match (base, overrides) {
        (toml::Value::Table(base_map), toml::Value::Table(override_map)) => {
            for (key, override_value) in override_map {
                match base_map.entry(key) {
                    Entry::Occupied(mut entry) => merge_value(entry.get_mut(), override_value),
                    Entry::Vacant(entry) => {
                        entry.insert(override_value);
                    }
                }
            }
        }
        (base_value, override_value) => {
            *base_value = override_value;
        }
    }
}

/// Candidate files in lookup order.
pub fn search_paths() -> Vec<PathBuf> {
    let config_home = std::env::var_os("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .filter(|path| path.is_absolute())
        .or_else(|| std::env::var_os("HOME").map(|home| PathBuf::from(home).join(".config")));

    let mut dirs: Vec<PathBuf> = config_home.into_iter().collect();
    dirs.push(PathBuf::from("/etc"));

    dirs.iter()
        .flat_map(|dir| {
            ["toml", "conf"]
                .into_iter()
                .map(move |ext| dir.join(format!("{CONFIG_NAME}.{ext}")))
        })
        .collect()
}
