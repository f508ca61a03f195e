use crate::error::{Error, Result};
use crate::migrate::RetryPolicy;
use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, Environment, File as ConfigFile};
use serde::Deserialize;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

pub const ENV_PREFIX: &str = "SHARE_MIGRATOR";

#[derive(Clone, Deserialize)]
pub struct DatabaseConfig {
    pub username: String,
    pub password: String,
    pub host: String,
    pub port: u16,
    pub name: String,
}

impl DatabaseConfig {
    /// Only the migration connects, so these settings are checked on their own.
    pub fn validate(&self) -> Result<()> {
        let required = [
            ("database.username", &self.username),
            ("database.host", &self.host),
            ("database.name", &self.name),
        ];
        for (key, value) in required {
            if value.trim().is_empty() {
                return Err(Error::InvalidConfig(format!("{} must be set", key)));
            }
        }
        if self.port == 0 {
            return Err(Error::InvalidConfig("database.port must be set".to_string()));
        }
        Ok(())
    }

    pub fn url(&self) -> String {
        format!(
            "mysql://{}:{}@{}:{}/{}",
            urlencoding::encode(&self.username),
            urlencoding::encode(&self.password),
            self.host,
            self.port,
            self.name
        )
    }
}

impl fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("username", &self.username)
            .field("password", &"********")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("name", &self.name)
            .finish()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct EosConfig {
    pub binary: PathBuf,
    pub mgm_url: String,
    /// Identity used for metadata lookups.
    pub lookup_uid: String,
    pub lookup_gid: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub delay_ms: u64,
}

impl RetryConfig {
    pub fn policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts,
            delay: Duration::from_millis(self.delay_ms),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub eos: EosConfig,
    pub retry: RetryConfig,
    pub dry_run: bool,
    pub user_prefix: String,
    pub user: Option<String>,
    pub debug: bool,
    pub concurrency: usize,
    pub report_path: Option<PathBuf>,
}

impl AppConfig {
    /// Deserialize and validate whatever `builder` has collected.
    pub fn from_builder(builder: ConfigBuilder<DefaultState>) -> Result<AppConfig> {
        let mut config: AppConfig = builder.build()?.try_deserialize()?;
        config.user = config.user.filter(|user| !user.is_empty());
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        let required = [
            ("eos.mgm_url", &self.eos.mgm_url),
            ("user_prefix", &self.user_prefix),
        ];
        for (key, value) in required {
            if value.trim().is_empty() {
                return Err(Error::InvalidConfig(format!("{} must be set", key)));
            }
        }
        if self.concurrency == 0 {
            return Err(Error::InvalidConfig("concurrency must be at least 1".to_string()));
        }
        if self.retry.max_attempts == 0 {
            return Err(Error::InvalidConfig(
                "retry.max_attempts must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Built-in defaults only.
pub fn default_builder() -> std::result::Result<ConfigBuilder<DefaultState>, ConfigError> {
    Config::builder()
        .set_default("database.username", "")?
        .set_default("database.password", "")?
        .set_default("database.host", "")?
        .set_default("database.port", 0)?
        .set_default("database.name", "")?
        .set_default("eos.binary", "/usr/bin/eos")?
        .set_default("eos.mgm_url", "root://eospps-slave.cern.ch")?
        .set_default("eos.lookup_uid", "0")?
        .set_default("eos.lookup_gid", "0")?
        .set_default("retry.max_attempts", 5)?
        .set_default("retry.delay_ms", 500)?
        .set_default("dry_run", false)?
        .set_default("user_prefix", "/eos/scratch/user/")?
        .set_default("debug", false)?
        .set_default("concurrency", 20)
}

/// Defaults, then `Config.*` in the working directory, then `SHARE_MIGRATOR__*` variables.
pub fn load_builder() -> std::result::Result<ConfigBuilder<DefaultState>, ConfigError> {
    Ok(default_builder()?
        .add_source(ConfigFile::with_name("Config").required(false))
        .add_source(environment()))
}

// Values stay strings until deserialized into their typed fields, so a
// password like `007123` is not read as a number.
fn environment() -> Environment {
    Environment::with_prefix(ENV_PREFIX).separator("__")
}
