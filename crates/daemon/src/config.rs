// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Installation settings loading (SPEC_FULL.md §9 "Global singletons"):
//! read once at startup from a TOML file, handed down as
//! `Arc<RwLock<GlobalSettings>>`, and re-read on [`GlobalSettings::RELOAD_CADENCE_SECS`]
//! so an admin's change to e.g. `global_process_timeout_minutes` takes
//! effect without a restart.

use ratio_core::GlobalSettings;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read settings file {path}: {source}")]
    Read { path: PathBuf, source: std::io::Error },

    #[error("failed to parse settings file {path}: {source}")]
    Parse { path: PathBuf, source: toml::de::Error },

    #[error("failed to serialize settings: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error(transparent)]
    Write(#[from] std::io::Error),
}

/// Load settings from `path`, falling back to [`GlobalSettings::default`]
/// when the file doesn't exist yet (first run, before `/initialize`).
pub fn load(path: &Path) -> Result<GlobalSettings, ConfigError> {
    if !path.exists() {
        return Ok(GlobalSettings::default());
    }
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read { path: path.to_path_buf(), source })?;
    toml::from_str(&text).map_err(|source| ConfigError::Parse { path: path.to_path_buf(), source })
}

/// Persist `settings` to `path`, creating parent directories as needed.
/// Called after an admin mutates settings (e.g. `/initialize`).
pub fn save(path: &Path, settings: &GlobalSettings) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let text = toml::to_string_pretty(settings)?;
    std::fs::write(path, text)?;
    Ok(())
}
