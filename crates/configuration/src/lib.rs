//! # Configuration Crate
//!
//! Loads, validates and exposes the bot's settings, and owns the process-wide
//! logging setup.
//!
//! ## Architectural Principles
//!
//! - **Single entry point:** binaries call `load_config` once and hand the
//!   resulting structs to the crates that need them. No other crate reads files
//!   or environment variables.
//! - **Layered sources:** the TOML file supplies the baseline and
//!   `BOT_`-prefixed environment variables override it (`__` separates nested
//!   keys, e.g. `BOT_EXCHANGE__API_SECRET`).
//!
//! ## Public API
//!
//! - `load_config`: reads, deserializes and validates a `Config`.
//! - `init_tracing`: installs the global `tracing` subscriber.
//! - The settings structs (`Config`, `PairConfig`, `IndicatorParams`, ...).

use std::path::Path;

pub mod error;
pub mod logging;
pub mod settings;

pub use error::ConfigError;
pub use logging::init_tracing;
pub use settings::{
    Config, ExchangeConfig, IndicatorParams, LoggingConfig, MAX_WINDOW_CAPACITY, PairConfig,
    StorageConfig, SystemConfig,
};

/// Loads the application configuration from `path` layered with environment
/// overrides, then validates it.
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let builder = config::Config::builder()
        .add_source(config::File::from(path))
        .add_source(
            config::Environment::with_prefix("BOT")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    let mut config = builder.try_deserialize::<Config>()?;
    // Source keys may arrive lowercased; symbols are matched in upper case.
    config.trading_pairs = config
        .trading_pairs
        .into_iter()
        .map(|(symbol, pair)| (symbol.to_uppercase(), pair))
        .collect();
    config.validate()?;

    Ok(config)
}
