//! Restaviews CLI - browse restaurants and post reviews from the terminal
//!
//! Reads come from the server when it is reachable and from the local mirror
//! when it is not. Favorites and reviews are queued locally and replayed.

mod cli;
mod commands;
mod error;

#[cfg(test)]
mod tests;

use std::env;
use std::path::PathBuf;

use clap::Parser;
use restaviews_core::ClientConfig;
use tracing_subscriber::filter::Directive;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Commands, SyncCommands};
use crate::commands::common::Context;
use crate::error::CliError;

const DB_PATH_ENV: &str = "RESTAVIEWS_DB_PATH";

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("Error: {error}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), CliError> {
    dotenvy::dotenv().ok();

    let directive = "restaviews=info"
        .parse::<Directive>()
        .map_err(|error| CliError::Config(format!("invalid log directive: {error}")))?;
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(directive))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = resolve_config(cli.api_url)?;
    let ctx = Context {
        db_path: resolve_db_path(cli.db_path),
        config,
        json: cli.json,
    };

    match cli.command {
        Commands::Restaurants {
            cuisine,
            neighborhood,
        } => {
            commands::restaurants::run_list(&ctx, cuisine.as_deref(), neighborhood.as_deref())
                .await
        }
        Commands::Restaurant { id } => commands::restaurants::run_show(&ctx, &id).await,
        Commands::Filters => commands::restaurants::run_filters(&ctx).await,
        Commands::Reviews { restaurant_id } => {
            commands::reviews::run_list(&ctx, &restaurant_id).await
        }
        Commands::Favorite { id, off, delivery } => {
            commands::favorite::run_favorite(&ctx, &id, !off, delivery).await
        }
        Commands::Review {
            restaurant_id,
            name,
            rating,
            comments,
            delivery,
        } => {
            commands::reviews::run_add(&ctx, &restaurant_id, &name, rating, &comments, delivery)
                .await
        }
        Commands::Sync { command } => match command.unwrap_or(SyncCommands::Run) {
            SyncCommands::Run => commands::sync::run_sync(&ctx).await,
            SyncCommands::Pending => commands::sync::run_pending(&ctx).await,
            SyncCommands::Clear { kind } => commands::sync::run_clear(&ctx, kind).await,
            SyncCommands::Watch { interval } => commands::sync::run_watch(&ctx, interval).await,
        },
    }
}

fn resolve_config(api_url: Option<String>) -> Result<ClientConfig, CliError> {
    let mut config = ClientConfig::from_env()?;
    if let Some(api_url) = api_url {
        config.api_base_url = api_url;
        config = config.validated()?;
    }
    Ok(config)
}

fn resolve_db_path(cli_db_path: Option<PathBuf>) -> PathBuf {
    if let Some(path) = cli_db_path {
        return path;
    }
    if let Some(path) = env::var_os(DB_PATH_ENV) {
        return PathBuf::from(path);
    }
    default_db_path()
}

fn default_db_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("restaviews")
        .join("restaviews.db")
}
