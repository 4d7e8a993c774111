use std::env;

use config::Config as ConfigBuilder;
use config::ConfigError;
use config::Environment;
use config::File;
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub tokens: TokenConfig,
    /// Presence selects the Postgres store; absence selects in-memory.
    #[serde(default)]
    pub database: Option<DatabaseConfig>,
    /// Optional bootstrap account created at startup.
    #[serde(default)]
    pub seed: Option<SeedConfig>,
    #[serde(default = "default_run_mode")]
    pub run_mode: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub http_port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct TokenConfig {
    /// Required. Missing secrets fail deserialization, so a misconfigured
    /// process never accepts traffic.
    pub access_secret: String,
    pub refresh_secret: String,
    /// TTL strings in the `<int><s|m|h|d>` grammar; defaults 15m / 7d.
    #[serde(default)]
    pub access_ttl: Option<String>,
    #[serde(default)]
    pub refresh_ttl: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    #[serde(default = "default_schema")]
    pub schema: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SeedConfig {
    pub email: String,
    pub password: String,
    /// Comma-separated role names; unknown names are dropped, and an empty
    /// result falls back to admin.
    #[serde(default)]
    pub roles: Option<String>,
}

fn default_schema() -> String {
    "auth".to_string()
}

fn default_run_mode() -> String {
    "development".to_string()
}

impl Config {
    /// Load configuration from files with environment variable overrides
    ///
    /// Priority (highest to lowest):
    /// 1. Environment variables (TOKENS__ACCESS_SECRET, DATABASE__URL, etc.)
    /// 2. Environment-specific config file (config/{environment}.toml)
    /// 3. Default config file (config/default.toml)
    pub fn load() -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let configuration = ConfigBuilder::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            .add_source(Environment::with_prefix("").separator("__"))
            .build()?;

        let config: Config = configuration.try_deserialize()?;
        config.validate()?;

        Ok(config)
    }

    pub fn is_production(&self) -> bool {
        self.run_mode == "production"
    }

    /// Reject values that would be unsafe to use, before any I/O happens.
    fn validate(&self) -> Result<(), ConfigError> {
        if let Some(database) = &self.database {
            if !is_valid_schema_name(&database.schema) {
                return Err(ConfigError::Message(format!(
                    "Invalid schema name: {:?} (must match [a-zA-Z_][a-zA-Z0-9_]*)",
                    database.schema
                )));
            }
        }
        Ok(())
    }
}

/// Identifier grammar for the schema name. The name is interpolated into
/// SQL, so anything outside this grammar is a configuration error.
fn is_valid_schema_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
