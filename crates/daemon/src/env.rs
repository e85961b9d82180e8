// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the daemon crate.

use std::path::PathBuf;
use std::time::Duration;

/// Resolve the daemon's working state directory: `RATIO_STATE_DIR` >
/// `XDG_STATE_HOME/ratio` > `~/.local/state/ratio`. Snapshots and the
/// local storage tree (when no external storage backend is configured)
/// live here.
pub fn state_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("RATIO_STATE_DIR") {
        return PathBuf::from(dir);
    }
    if let Ok(xdg) = std::env::var("XDG_STATE_HOME") {
        return PathBuf::from(xdg).join("ratio");
    }
    dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")).join(".local/state/ratio")
}

/// Path to the TOML settings file: `RATIO_CONFIG` or `<state_dir>/settings.toml`.
pub fn config_path() -> PathBuf {
    std::env::var("RATIO_CONFIG").map(PathBuf::from).unwrap_or_else(|_| state_dir().join("settings.toml"))
}

/// HTTP bind address, default `127.0.0.1:8800`.
pub fn bind_addr() -> String {
    std::env::var("RATIO_BIND_ADDR").unwrap_or_else(|_| "127.0.0.1:8800".to_string())
}

/// How often the reconciler sweep runs (SPEC_FULL.md §4.9, default 15 minutes).
pub fn reconcile_interval() -> Duration {
    std::env::var("RATIO_RECONCILE_INTERVAL_SECS")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_secs)
        .unwrap_or(Duration::from_secs(15 * 60))
}

/// How often the in-memory stores are snapshotted to disk.
pub fn snapshot_interval() -> Duration {
    std::env::var("RATIO_SNAPSHOT_INTERVAL_SECS")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_secs)
        .unwrap_or(Duration::from_secs(60))
}

/// RSA key pair paths for JWT verification (Component E). Both must be set
/// for the gateway to start; there is no insecure fallback.
pub fn rsa_private_key_path() -> Option<PathBuf> {
    std::env::var("RATIO_RSA_PRIVATE_KEY").map(PathBuf::from).ok()
}

pub fn rsa_public_key_path() -> Option<PathBuf> {
    std::env::var("RATIO_RSA_PUBLIC_KEY").map(PathBuf::from).ok()
}

pub fn token_issuer() -> String {
    std::env::var("RATIO_TOKEN_ISSUER").unwrap_or_else(|_| "ratio".to_string())
}

/// Actor name storage attributes its own filesystem-event mutations to.
pub fn storage_actor() -> String {
    std::env::var("RATIO_STORAGE_ACTOR").unwrap_or_else(|_| "ratio-daemon".to_string())
}
