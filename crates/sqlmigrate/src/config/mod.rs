//! Configuration loading and validation.

mod expand;
mod types;
mod validation;

pub use expand::{expand_env, expand_with};
pub use types::*;

use crate::error::{MigrateError, Result};
use std::path::Path;
use tracing::debug;

impl DbConfig {
    /// Load configuration from a YAML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: DbConfig = serde_yaml::from_str(yaml)?;
        if config.environments.is_empty() {
            return Err(MigrateError::Config(
                "Config file does not define any environment".into(),
            ));
        }
        Ok(config)
    }

    /// Names of all configured environments, sorted.
    pub fn environment_names(&self) -> Vec<&str> {
        self.environments.keys().map(String::as_str).collect()
    }

    /// Look up, validate and resolve an environment.
    ///
    /// The returned environment has its datasource expanded against the
    /// process environment.
    pub fn environment(&self, name: &str) -> Result<Environment> {
        let env = self
            .environments
            .get(name)
            .ok_or_else(|| MigrateError::Config(format!("No environment: {}", name)))?;

        let dialect = validation::validate(name, env)?;
        debug!("Using environment '{}' ({})", name, dialect);

        let mut resolved = env.clone();
        resolved.datasource = expand_env(&env.datasource).into_owned();
        Ok(resolved)
    }
}

impl Environment {
    /// Parse the dialect name.
    pub fn dialect_kind(&self) -> Result<Dialect> {
        self.dialect.parse()
    }
}
