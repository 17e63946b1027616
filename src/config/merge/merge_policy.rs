//! Merge rules: defaults, override order, conflict handling.
//!
//! Later sources override earlier ones key by key. Defaults are registered
//! here so a partial file only needs the keys it changes.

use config::Config;
use config::ConfigBuilder;
use config::ConfigError;

/// Create a Config builder with merge policy defaults applied.
pub fn builder_with_defaults() -> Result<ConfigBuilder<config::builder::DefaultState>, ConfigError>
{
    Config::builder()
        .set_default("waiting.timeout", 5.0)?
        .set_default("waiting.retry_interval", 0.1)?
        .set_default("defaults.cache", true)?
        .set_default("defaults.required", true)
}
