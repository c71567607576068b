#![deny(clippy::expect_used, clippy::unwrap_used, clippy::panic)]

use crate::app_config::AppConfig;
use args::{CliArgs, Command};
use clap::{CommandFactory, Parser};
use commands::{
    config::config_cmd,
    favourites::{favourites_cmd, notifications_cmd},
    init::init_cmd,
    login::{guest_cmd, login_cmd, logout_cmd},
    lookup::{directory_cmd, lookup_cmd},
    preset::preset_cmd,
    search::search_cmd,
    Session,
};
use profile::{get_profile_config_path, profile_name, Profile};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod app_config;
mod args;
mod commands;
mod db;
mod formatters;
mod model;
mod profile;
mod utils;
mod web_client;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    setup_tracing();

    if let Err(e) = run().await {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let args = CliArgs::parse();

    let Some(command) = args.command else {
        CliArgs::command().print_help()?;
        return Ok(());
    };

    let profile_path = get_profile_config_path(&profile_name(&args.config.profile));
    let profile = Profile::from_path(&profile_path)?;
    let config = AppConfig::from_args(args.config, &profile_path, profile.as_ref());

    match command {
        Command::Config => config_cmd(config)?,
        Command::Init(init) => init_cmd(&config, init.force)?,
        Command::Completions { shell } => {
            clap_complete::generate(
                shell,
                &mut CliArgs::command(),
                "sportcal",
                &mut std::io::stdout(),
            );
        }
        Command::Notifications { state } => notifications_cmd(&config, state)?,
        command => {
            let session = Session::open(config)?;
            match command {
                Command::Login(login) => login_cmd(&session, login).await?,
                Command::Guest => guest_cmd(&session)?,
                Command::Logout => logout_cmd(&session)?,
                Command::Preset(subcommand) => preset_cmd(&session, subcommand).await?,
                Command::Search(search) => search_cmd(&session, search).await?,
                Command::Lookup(lookup) => lookup_cmd(&session, lookup).await?,
                Command::Directory(directory) => directory_cmd(&session, directory).await?,
                Command::Favourites(subcommand) => favourites_cmd(&session, subcommand).await?,
                Command::Config
                | Command::Init(_)
                | Command::Completions { .. }
                | Command::Notifications { .. } => {}
            }
        }
    }

    Ok(())
}

/// Logs go to stderr so they never mix with command output
fn setup_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!(
                    "{crate_name}=warn,sportcal_core=warn",
                    crate_name = env!("CARGO_CRATE_NAME")
                )
                .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
