#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Terminal front end for the trail map.
//!
//! ```text
//! trail_map trails
//! trail_map report
//! trail_map neighbors [--precinct 3927] [--since 2021-01-01] [--party D]
//! trail_map locate [--precinct 3927] <voter id>
//! trail_map parties
//! ```
//!
//! Running `trail_map` with no subcommand enters interactive mode.
//! `--config <path>` layers a TOML file over the built-in defaults.
//!
//! Uses `indicatif-log-bridge` (via [`trail_map_cli_utils::init_logger`])
//! to route `log` output through `indicatif::MultiProgress` so that log
//! lines and spinners never fight for the terminal.

mod commands;
mod interactive;
mod prompt;

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use trail_map_api::TrailMapClient;
use trail_map_config::AppConfig;

use crate::commands::App;

#[derive(Parser)]
#[command(
    name = "trail_map",
    about = "Trail issues and neighbor lists on a map"
)]
struct Cli {
    /// TOML file overriding the built-in configuration
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// List trails and reported issues
    Trails,
    /// Report an issue on a trail
    Report,
    /// List the registered voters of a precinct
    Neighbors {
        /// Precinct number (defaults to the configured precinct)
        #[arg(long)]
        precinct: Option<String>,
        /// Only voters who voted on or after this date (YYYY-MM-DD)
        #[arg(long, value_parser = commands::parse_date)]
        since: Option<NaiveDate>,
        /// Only voters registered with this party code
        #[arg(long)]
        party: Option<String>,
    },
    /// Geocode one voter's address
    Locate {
        /// Precinct number (defaults to the configured precinct)
        #[arg(long)]
        precinct: Option<String>,
        /// Voter ID number
        voter_id: String,
    },
    /// List party codes
    Parties,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let multi = trail_map_cli_utils::init_logger();
    let cli = Cli::parse();

    let config = AppConfig::load(cli.config.as_deref())?;
    if config.geocoder.access_token.is_empty() {
        log::warn!(
            "No geocoder access token configured (set {}); neighbor lookups will fail",
            trail_map_config::ENV_MAPBOX_TOKEN
        );
    }
    let client = TrailMapClient::new(&config)?;
    let app = App {
        config,
        client,
        multi,
    };

    let Some(command) = cli.command else {
        return interactive::run(&app).await;
    };

    match command {
        Commands::Trails => commands::trails(&app).await?,
        Commands::Report => commands::report(&app).await?,
        Commands::Neighbors {
            precinct,
            since,
            party,
        } => commands::neighbors(&app, precinct, since, party).await?,
        Commands::Locate { precinct, voter_id } => {
            commands::locate(&app, precinct, &voter_id).await?;
        }
        Commands::Parties => commands::parties(),
    }

    Ok(())
}
