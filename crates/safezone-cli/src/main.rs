//! SafeZone CLI - live incident reports, safe spots and safety tips
//!
//! Offline demo mode kicks in when no Firebase project is configured.

mod auth;
mod backend;
mod cli;
mod commands;
mod device;
mod error;

#[cfg(test)]
mod tests;

use clap::Parser;
use safezone_core::models::Coordinate;
use tracing_subscriber::filter::{Directive, LevelFilter};
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Commands};
use crate::commands::auth_cmd::{run_login, run_login_google, run_logout, run_status};
use crate::commands::common::CliContext;
use crate::commands::completions::run_completions;
use crate::commands::config::{run_config, ConfigUpdate};
use crate::commands::home::run_home;
use crate::commands::places::{run_directions, run_spots, run_tips};
use crate::commands::report_actions::{run_flag, run_share};
use crate::commands::reports::{run_reports, ReportsOptions};
use crate::error::CliError;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    if let Err(error) = run().await {
        match error {
            CliError::Alert(alert) => eprintln!("{alert}"),
            error => eprintln!("Error: {error}"),
        }
        std::process::exit(1);
    }
}

async fn run() -> Result<(), CliError> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let context = CliContext::load(cli.config.as_deref(), cli.platform.map(Into::into));

    match cli.command {
        Commands::Reports {
            search,
            filter,
            lat,
            lng,
            watch,
            json,
        } => {
            let options = ReportsOptions {
                search,
                filter: filter.map(Into::into),
                position: lat.zip(lng).map(|(lat, lng)| Coordinate::new(lat, lng)),
                watch,
                as_json: json,
            };
            run_reports(&context, options).await?;
        }
        Commands::Spots { json } => run_spots(json)?,
        Commands::Tips { json } => run_tips(json)?,
        Commands::Directions { spot, open } => run_directions(&context, &spot, open).await?,
        Commands::Share { id } => run_share(&context, &id).await?,
        Commands::Flag { id, yes } => run_flag(&context, &id, yes).await?,
        Commands::Home { json } => run_home(&context, json).await?,
        Commands::Login { email, password } => run_login(&context, &email, &password).await?,
        Commands::LoginGoogle { id_token } => run_login_google(&context, &id_token).await?,
        Commands::Logout => run_logout(&context).await?,
        Commands::Status => run_status(&context).await?,
        Commands::Config {
            project_id,
            api_key,
            firestore_url,
            auth_url,
            poll_interval_secs,
        } => {
            let update = ConfigUpdate {
                project_id,
                api_key,
                firestore_url,
                auth_url,
                poll_interval_secs,
                platform: cli.platform.map(Into::into),
            };
            run_config(&context, update)?;
        }
        Commands::Completions { shell, output } => {
            run_completions(shell, output.as_deref())?;
        }
    }

    Ok(())
}

fn init_tracing(verbose: bool) {
    let level = if verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::INFO
    };
    let directive = format!("safezone={level}")
        .parse::<Directive>()
        .unwrap_or_else(|_| level.into());

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(directive))
        .with_writer(std::io::stderr)
        .init();
}
