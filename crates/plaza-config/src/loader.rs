// SPDX-FileCopyrightText: 2026 Plaza Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./plaza.toml` > `~/.config/plaza/plaza.toml` > `/etc/plaza/plaza.toml`
//! with environment variable overrides via `PLAZA_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::PlazaConfig;

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/plaza/plaza.toml` (system-wide)
/// 3. `~/.config/plaza/plaza.toml` (user XDG config)
/// 4. `./plaza.toml` (local directory)
/// 5. `PLAZA_*` environment variables
pub fn load_config() -> Result<PlazaConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(PlazaConfig::default()))
        .merge(Toml::file("/etc/plaza/plaza.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("plaza/plaza.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("plaza.toml"))
        .merge(env_provider())
        .extract()
}

/// Load configuration from a TOML string only (no XDG lookup).
///
/// Used for testing and embedded configuration.
pub fn load_config_from_str(toml_content: &str) -> Result<PlazaConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(PlazaConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<PlazaConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(PlazaConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Create the environment variable provider using explicit `map()` for section-to-dot mapping.
///
/// Uses `Env::map()` NOT `Env::split("_")` to avoid ambiguity with
/// underscore-containing key names. For example, `PLAZA_CACHE_TTL_SECS`
/// must map to `cache.ttl_secs`, not `cache.ttl.secs`.
fn env_provider() -> Env {
    Env::prefixed("PLAZA_").map(|key| {
        // `key` is the lowercased env var name with prefix stripped.
        // Example: PLAZA_BACKEND_BASE_URL -> "backend_base_url"
        let key_str = key.as_str();
        let mapped = key_str
            .replacen("pipeline_", "pipeline.", 1)
            .replacen("backend_breaker_", "backend.breaker.", 1)
            .replacen("backend_", "backend.", 1)
            .replacen("cache_", "cache.", 1)
            .replacen("risk_", "risk.", 1)
            .replacen("fallback_", "fallback.", 1)
            .replacen("monitor_", "monitor.", 1);
        mapped.into()
    })
}
