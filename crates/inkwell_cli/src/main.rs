//! Operator CLI for the Inkwell core.
//!
//! # Responsibility
//! - Verify `inkwell_core` linkage (`ping`).
//! - Create/migrate and seed SQLite databases.
//! - Validate environment configuration before deployment.

use anyhow::Context;
use clap::{Parser, Subcommand};
use inkwell_core::config::{DB_PATH_KEY, LOG_DIR_KEY, LOG_LEVEL_KEY};
use inkwell_core::seed::seed_demo_data;
use inkwell_core::{
    default_log_level, init_logging, open_db, BcryptCredentialHasher, CoreConfig,
};
use log::info;
use std::path::PathBuf;

const DEFAULT_DB_PATH: &str = "inkwell.db";

/// Maintenance commands for an Inkwell deployment.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print core linkage and version.
    Ping,
    /// Create the database file if needed and apply migrations.
    InitDb(DbArgs),
    /// Insert the demo users and blog into a database.
    Seed(DbArgs),
    /// Load and validate the full environment configuration.
    CheckConfig,
}

#[derive(Parser)]
struct DbArgs {
    /// Database path. Falls back to INKWELL_DB_PATH, then `inkwell.db`.
    #[arg(long)]
    db: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    if !matches!(cli.command, Commands::Ping) {
        let level =
            std::env::var(LOG_LEVEL_KEY).unwrap_or_else(|_| default_log_level().to_string());
        let log_dir = std::env::var(LOG_DIR_KEY).ok();
        init_logging(&level, log_dir.as_deref()).context("failed to initialize logging")?;
    }

    match cli.command {
        Commands::Ping => {
            println!("inkwell_core ping={}", inkwell_core::ping());
            println!("inkwell_core version={}", inkwell_core::core_version());
        }
        Commands::InitDb(args) => {
            let path = resolve_db_path(args.db);
            open_db(&path).with_context(|| format!("failed to open `{}`", path.display()))?;
            info!("event=cli_init_db module=cli status=ok path={}", path.display());
            println!("database ready at {}", path.display());
        }
        Commands::Seed(args) => {
            let path = resolve_db_path(args.db);
            let conn = open_db(&path)
                .with_context(|| format!("failed to open `{}`", path.display()))?;
            let report = seed_demo_data(&conn, &BcryptCredentialHasher::default())
                .context("failed to seed demo data")?;
            println!(
                "seeded {} users and {} blogs into {}",
                report.users_created,
                report.blogs_created,
                path.display()
            );
        }
        Commands::CheckConfig => {
            let config = CoreConfig::from_env().context("invalid configuration")?;
            println!("{config:#?}");
        }
    }

    Ok(())
}

fn resolve_db_path(flag: Option<PathBuf>) -> PathBuf {
    flag.or_else(|| std::env::var(DB_PATH_KEY).ok().map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_DB_PATH))
}
