mod cli;
mod logging;

use anyhow::{bail, Context};
use clap::Parser;
use colored::*;
use cli::{Cli, Commands};
use dotenv::dotenv;
use share_migrator::config::load_builder;
use share_migrator::db::{self, MysqlShareStore, ShareStore};
use share_migrator::eos::{EosClient, Lookup, StorageBackend};
use share_migrator::migrate::{self, report, BatchSummary, Reconciler};
use share_migrator::AppConfig;
use std::process;
use std::time::Instant;
use tracing::{error, info};

fn main() {
    dotenv().ok();

    let args = Cli::parse();

    let config = match load_config(&args) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("Error loading configuration: {:#}", err);
            process::exit(1);
        }
    };

    let guard = logging::init_logger(config.debug);

    let result = match args.command.unwrap_or(Commands::Migrate) {
        Commands::Migrate => run_migration(&config),
        Commands::PrintConfig => {
            println!("Configuration: {:#?}", config);
            Ok(())
        }
        Commands::Inspect { inode } => run_inspect(&config, inode),
    };

    let code = match result {
        Ok(()) => 0,
        Err(err) => {
            error!("Error: {:#}", err);
            1
        }
    };

    drop(guard);
    process::exit(code);
}

fn load_config(args: &Cli) -> anyhow::Result<AppConfig> {
    let builder = args.overrides.apply(load_builder()?)?;
    Ok(AppConfig::from_builder(builder)?)
}

fn run_migration(config: &AppConfig) -> anyhow::Result<()> {
    config.database.validate()?;
    let connection = db::establish_connection(&config.database.url()).with_context(|| {
        format!(
            "Cannot connect to {}:{}/{}",
            config.database.host, config.database.port, config.database.name
        )
    })?;
    let store = MysqlShareStore::new(connection, config.dry_run);

    let shares = store
        .fetch_shares(config.user.as_deref())
        .context("Cannot get all shares")?;
    if shares.is_empty() {
        bail!("oc_share table does not contain public share files");
    }
    info!(
        "{} public file shares to process with {} workers",
        shares.len(),
        config.concurrency
    );

    let backend = EosClient::new(&config.eos);
    let reconciler = Reconciler::new(
        &backend,
        &store,
        &config.user_prefix,
        config.retry.policy(),
    );

    let start_time = Instant::now();
    let results = reconciler.run(&shares, config.concurrency)?;
    let elapsed = start_time.elapsed();

    if let Some(path) = &config.report_path {
        let rows = report::write_csv(path, &results, config.dry_run)
            .with_context(|| format!("Cannot write report to {}", path.display()))?;
        info!("{} rows written to {}", rows, path.display());
    }

    BatchSummary::from_results(&results).log(elapsed, config.dry_run);
    Ok(())
}

fn run_inspect(config: &AppConfig, inode: i64) -> anyhow::Result<()> {
    let backend = EosClient::new(&config.eos);
    let file = match backend.lookup_by_inode(inode)? {
        Lookup::Found(meta) => meta,
        Lookup::NotFound => bail!("No file with inode {}", inode),
    };

    println!("inode:          {}", file.inode);
    println!("path:           {:?}", file.path);
    println!("owner:          {}:{}", file.owner_uid, file.owner_gid);
    if let Some(size) = file.size {
        println!("size:           {}", size);
    }
    let classification = format!("{:?}", migrate::classify(&file.path, &config.user_prefix));
    println!("classification: {}", classification.cyan());
    println!(
        "version folder: {:?}",
        migrate::classify::version_folder_path(&file.path)
    );
    Ok(())
}
