use std::path::Path;

use anyhow::{Context, Result};
use sportcal_core::{db::set_notifications, favourites::unstar, PreferencesStore};

use super::Session;
use crate::{
    app_config::AppConfig,
    args::{FavouritesCommand, Toggle},
    db::open_prefs,
    formatters::Printer,
};

pub async fn favourites_cmd(session: &Session, subcommand: FavouritesCommand) -> Result<()> {
    match subcommand {
        FavouritesCommand::List(args) => {
            let favourites = session.prefs.read()?.favourites;
            Printer::stdout(args.output).print_events(&favourites)?;
        }
        FavouritesCommand::Remove { event_id } => {
            let removed = unstar(&session.client, &session.prefs, event_id)
                .await
                .context("Failed to cancel event reminders")?;
            if !removed {
                anyhow::bail!("Event {} is not in favourites", event_id);
            }
            println!("Event {} removed from favourites", event_id);
        }
    }

    Ok(())
}

pub fn notifications_cmd(config: &AppConfig, state: Toggle) -> Result<()> {
    let prefs = open_prefs(Path::new(&config.db_path))?;
    let enabled = state == Toggle::On;

    set_notifications(&prefs, enabled)?;
    println!(
        "Notifications {}",
        if enabled { "enabled" } else { "disabled" }
    );

    Ok(())
}
