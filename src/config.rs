// Configuration
// Built once at startup and handed to each component, nothing is read from the
// environment after that

use crate::error::ConfigError;
use std::fmt;
use std::path::{Path, PathBuf};

pub const DEFAULT_SCHEMA: &str = "public";
pub const DEFAULT_MODEL: &str = "gemini-pro";
pub const DEFAULT_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Connection parameters for the PostgreSQL database
#[derive(Clone, PartialEq)]
pub struct DatabaseConfig {
    pub host: String,
    pub port: u16,
    pub name: String,
    pub user: String,
    pub password: String,
    /// Catalog namespace the schema reader describes
    pub schema: String,
}

impl DatabaseConfig {
    /// Build the driver configuration for one connection
    pub fn to_pg_config(&self) -> postgres::Config {
        let mut config = postgres::Config::new();
        config
            .host(&self.host)
            .port(self.port)
            .dbname(&self.name)
            .user(&self.user)
            .password(&self.password)
            .application_name("text2sql");
        config
    }
}

// Keep the password out of logs
impl fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("name", &self.name)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("schema", &self.schema)
            .finish()
    }
}

/// Settings for the language-model API
#[derive(Clone, PartialEq)]
pub struct ModelConfig {
    pub api_key: String,
    pub model: String,
    /// Base URL without a trailing slash, e.g. `https://host/v1beta`
    pub endpoint: String,
}

impl fmt::Debug for ModelConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelConfig")
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .field("endpoint", &self.endpoint)
            .finish()
    }
}

/// Everything the pipeline needs, validated
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub database: DatabaseConfig,
    pub model: ModelConfig,
}

impl Config {
    /// Validate the raw settings
    ///
    /// An empty string counts as missing: `DB_HOST=` in the environment must
    /// not silently turn into a default.
    pub fn new(mut database: DatabaseConfig, mut model: ModelConfig) -> Result<Self, ConfigError> {
        require("DB_HOST", &database.host)?;
        require("DB_NAME", &database.name)?;
        require("DB_USER", &database.user)?;
        require("DB_PASSWORD", &database.password)?;
        require("GEMINI_API_KEY", &model.api_key)?;
        require("GEMINI_MODEL", &model.model)?;
        require("GEMINI_ENDPOINT", &model.endpoint)?;

        if database.port == 0 {
            return Err(ConfigError::Invalid {
                name: "DB_PORT",
                reason: "port must be between 1 and 65535".to_string(),
            });
        }

        if database.schema.trim().is_empty() {
            database.schema = DEFAULT_SCHEMA.to_string();
        }

        if !model.endpoint.starts_with("http://") && !model.endpoint.starts_with("https://") {
            return Err(ConfigError::Invalid {
                name: "GEMINI_ENDPOINT",
                reason: format!("'{}' is not an http(s) URL", model.endpoint),
            });
        }
        model.endpoint = model.endpoint.trim_end_matches('/').to_string();

        Ok(Self { database, model })
    }
}

/// Load `KEY=value` pairs from an env file into the process environment
///
/// Variables that are already set win over the file. With no path, `.env` is
/// searched for from the current directory upwards. A missing file is not an
/// error and yields `None`.
pub fn load_env_file(path: Option<&Path>) -> Result<Option<PathBuf>, ConfigError> {
    let loaded = match path {
        Some(path) => dotenvy::from_path(path).map(|()| path.to_path_buf()),
        None => dotenvy::dotenv(),
    };

    match loaded {
        Ok(path) => Ok(Some(path)),
        Err(e) if e.not_found() => Ok(None),
        Err(e) => Err(ConfigError::EnvFile(e.to_string())),
    }
}

fn require(name: &'static str, value: &str) -> Result<(), ConfigError> {
    if value.trim().is_empty() {
        Err(ConfigError::Missing(name))
    } else {
        Ok(())
    }
}
