// SPDX-FileCopyrightText: 2026 Tidings Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./tidings.toml` > `~/.config/tidings/tidings.toml` > `/etc/tidings/tidings.toml`
//! with environment variable overrides via `TIDINGS_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::{Path, PathBuf};

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use tracing::debug;

use crate::model::TidingsConfig;

/// System-wide configuration file.
pub const SYSTEM_CONFIG_PATH: &str = "/etc/tidings/tidings.toml";

/// Local configuration file, relative to the working directory.
pub const LOCAL_CONFIG_FILE: &str = "tidings.toml";

/// Path of the per-user configuration file, if a config directory exists.
pub fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("tidings/tidings.toml"))
}

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/tidings/tidings.toml` (system-wide)
/// 3. `~/.config/tidings/tidings.toml` (user XDG config)
/// 4. `./tidings.toml` (local directory)
/// 5. `TIDINGS_*` environment variables
pub fn load_config() -> Result<TidingsConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string on top of the defaults (no files, no env).
pub fn load_config_from_str(toml_content: &str) -> Result<TidingsConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(TidingsConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<TidingsConfig, figment::Error> {
    debug!(path = %path.display(), "loading config file");
    Figment::new()
        .merge(Serialized::defaults(TidingsConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Build the Figment used for config loading, before extraction.
pub fn build_figment() -> Figment {
    let mut figment = Figment::new().merge(Serialized::defaults(TidingsConfig::default()));

    let files = layered_files();
    if files.is_empty() {
        debug!("no config files found, using defaults");
    }
    for path in files {
        debug!(path = %path.display(), "layering config file");
        figment = figment.merge(Toml::file(path));
    }

    figment.merge(env_provider())
}

/// Config files from the XDG hierarchy that exist, lowest precedence first.
pub fn layered_files() -> Vec<PathBuf> {
    [
        Some(PathBuf::from(SYSTEM_CONFIG_PATH)),
        user_config_path(),
        Some(PathBuf::from(LOCAL_CONFIG_FILE)),
    ]
    .into_iter()
    .flatten()
    .filter(|path| path.is_file())
    .collect()
}

/// Environment provider with explicit section mapping.
///
/// Uses `Env::map()` rather than `Env::split("_")` because key names contain
/// underscores: `TIDINGS_AGENT_MAX_CONTEXT_TURNS` must map to
/// `agent.max_context_turns`, not `agent.max.context.turns`.
fn env_provider() -> Env {
    Env::prefixed("TIDINGS_").map(|key| {
        let mapped = key
            .as_str()
            .replacen("agent_", "agent.", 1)
            .replacen("ollama_", "ollama.", 1)
            .replacen("news_", "news.", 1)
            .replacen("delivery_", "delivery.", 1);
        mapped.into()
    })
}
