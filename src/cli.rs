use clap::{Args, Parser, Subcommand};
use config::builder::DefaultState;
use config::{ConfigBuilder, ConfigError};
use std::path::PathBuf;

#[derive(Debug, Parser)] // requires `derive` feature
#[command(name = "share-migrator")]
#[command(about = "Point public file shares at their EOS version folders", long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub overrides: Overrides,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Migrate all public file shares (the default)
    Migrate,
    /// Print configuration values
    PrintConfig,
    /// Resolve and classify a single inode without touching the database
    Inspect {
        /// Inode number as stored in oc_share.file_source
        inode: i64,
    },
}

/// Command line values; each one overrides the config file and environment.
#[derive(Debug, Args)]
pub struct Overrides {
    /// The username to connect to the db
    #[arg(long, global = true)]
    pub username: Option<String>,
    /// The password to connect to the db
    #[arg(long, global = true)]
    pub password: Option<String>,
    /// The host of the db
    #[arg(long, global = true)]
    pub host: Option<String>,
    /// The port of the db
    #[arg(long, global = true)]
    pub port: Option<u16>,
    /// The name of the database
    #[arg(long, global = true)]
    pub dbname: Option<String>,
    /// Log the updates without writing them to the db
    #[arg(long, alias = "dry-run", global = true)]
    pub notouchdb: bool,
    /// The EOS MGM URL
    #[arg(long, global = true)]
    pub eosmgmurl: Option<String>,
    /// The path under which users reside
    #[arg(long, global = true)]
    pub userprefix: Option<String>,
    /// Run the migration just for this user
    #[arg(long, global = true)]
    pub user: Option<String>,
    /// Print debug information
    #[arg(long, global = true)]
    pub debug: bool,
    /// Number of shares processed at once
    #[arg(long, global = true)]
    pub concurrency: Option<u32>,
    /// Lookups of a freshly created version folder before giving up
    #[arg(long, global = true)]
    pub retry_attempts: Option<u32>,
    /// Pause between those lookups, in milliseconds
    #[arg(long, global = true)]
    pub retry_delay_ms: Option<u32>,
    /// Write a CSV line per share to this file
    #[arg(long, global = true)]
    pub report: Option<PathBuf>,
}

impl Overrides {
    pub fn apply(
        &self,
        builder: ConfigBuilder<DefaultState>,
    ) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
        let mut builder = builder
            .set_override_option("database.username", self.username.clone())?
            .set_override_option("database.password", self.password.clone())?
            .set_override_option("database.host", self.host.clone())?
            .set_override_option("database.port", self.port.map(i64::from))?
            .set_override_option("database.name", self.dbname.clone())?
            .set_override_option("eos.mgm_url", self.eosmgmurl.clone())?
            .set_override_option("user_prefix", self.userprefix.clone())?
            .set_override_option("user", self.user.clone())?
            .set_override_option("concurrency", self.concurrency.map(i64::from))?
            .set_override_option("retry.max_attempts", self.retry_attempts.map(i64::from))?
            .set_override_option("retry.delay_ms", self.retry_delay_ms.map(i64::from))?
            .set_override_option(
                "report_path",
                self.report.as_ref().map(|p| p.to_string_lossy().into_owned()),
            )?;
        // Flags can only switch these on.
        if self.notouchdb {
            builder = builder.set_override("dry_run", true)?;
        }
        if self.debug {
            builder = builder.set_override("debug", true)?;
        }
        Ok(builder)
    }
}
