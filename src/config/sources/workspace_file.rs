//! Workspace config file source: config/pagemodel.toml and config/pagemodel.{env}.toml

use config::builder::DefaultState;
use config::ConfigBuilder;
use config::ConfigError;
use config::File;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Environment variable selecting the environment-specific file.
pub const ENVIRONMENT_VAR: &str = "PAGEMODEL_ENV";

/// Base workspace config path.
pub fn base_config_path(workspace_root: &Path) -> PathBuf {
    workspace_root.join("config").join("pagemodel.toml")
}

/// Environment-specific workspace config path.
pub fn environment_config_path(workspace_root: &Path, environment: &str) -> PathBuf {
    workspace_root
        .join("config")
        .join(format!("pagemodel.{}.toml", environment))
}

/// Add workspace config files to builder.
/// Precedence: config/pagemodel.toml (base) then config/pagemodel.{env}.toml.
pub fn add_to_builder(
    builder: ConfigBuilder<DefaultState>,
    workspace_root: &Path,
    environment: Option<&str>,
) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    let mut builder = builder;

    let base_config_path = base_config_path(workspace_root);
    if base_config_path.exists() {
        debug!(config_path = %base_config_path.display(), "Using workspace configuration");
        builder = builder.add_source(File::from(base_config_path.as_path()).required(false));
    }

    if let Some(environment) = environment {
        let env_config_path = environment_config_path(workspace_root, environment);
        if env_config_path.exists() {
            debug!(
                config_path = %env_config_path.display(),
                environment,
                "Using environment configuration"
            );
            builder = builder.add_source(File::from(env_config_path.as_path()).required(false));
        }
    }

    Ok(builder)
}
