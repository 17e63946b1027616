//! Layered configuration loading.

use super::merge::builder_with_defaults;
use super::sources::{global_file, workspace_file};
use super::PageModelConfig;
use crate::error::ConfigurationError;
use config::Environment;
use std::path::{Path, PathBuf};

/// Loads [`PageModelConfig`] from defaults, files and the environment
///
/// Precedence, lowest first: built-in defaults, global file, workspace
/// `config/pagemodel.toml`, workspace `config/pagemodel.{env}.toml`,
/// `PAGEMODEL__SECTION__KEY` environment variables.
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    workspace_root: Option<PathBuf>,
    environment: Option<String>,
    include_global: bool,
    include_env_vars: bool,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    /// Loader with every source enabled and no workspace
    pub fn new() -> Self {
        Self {
            workspace_root: None,
            environment: None,
            include_global: true,
            include_env_vars: true,
        }
    }

    /// Load configuration for a workspace using every source
    pub fn load(workspace_root: &Path) -> Result<PageModelConfig, ConfigurationError> {
        Self::new().workspace(workspace_root).build()
    }

    pub fn workspace(mut self, workspace_root: &Path) -> Self {
        self.workspace_root = Some(workspace_root.to_path_buf());
        self
    }

    /// Select the environment file explicitly instead of reading `PAGEMODEL_ENV`
    pub fn environment(mut self, environment: impl Into<String>) -> Self {
        self.environment = Some(environment.into());
        self
    }

    pub fn without_global(mut self) -> Self {
        self.include_global = false;
        self
    }

    pub fn without_env_vars(mut self) -> Self {
        self.include_env_vars = false;
        self
    }

    /// Merge all enabled sources and validate the result
    pub fn build(&self) -> Result<PageModelConfig, ConfigurationError> {
        let mut builder = builder_with_defaults()?;

        if self.include_global {
            builder = global_file::add_to_builder(builder)?;
        }

        if let Some(root) = &self.workspace_root {
            let environment = self
                .environment
                .clone()
                .or_else(|| std::env::var(workspace_file::ENVIRONMENT_VAR).ok());
            builder = workspace_file::add_to_builder(builder, root, environment.as_deref())?;
        }

        if self.include_env_vars {
            builder = builder.add_source(
                Environment::with_prefix("PAGEMODEL")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            );
        }

        let config: PageModelConfig = builder.build()?.try_deserialize()?;
        config.validate().map_err(ConfigurationError::Invalid)?;
        Ok(config)
    }
}
