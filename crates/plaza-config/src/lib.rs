// SPDX-FileCopyrightText: 2026 Plaza Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration system for the Plaza reply pipeline.
//!
//! Layered TOML + environment loading via Figment, strict unknown-key
//! rejection, and a collected semantic validation pass.

pub mod loader;
pub mod model;
pub mod validation;

pub use loader::{load_config, load_config_from_path, load_config_from_str};
pub use model::{
    BackendConfig, BreakerConfig, CacheConfig, FallbackConfig, MonitorConfig, OperationMode,
    PipelineConfig, PlazaConfig, RiskConfig,
};
pub use validation::validate_config;
