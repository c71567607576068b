use anyhow::{Context, Result};
use sportcal_core::{
    store::CUSTOM_PRESET_NAME, ActiveFilterSet, AuthState, ComposedFilter, ComposedFilterStore,
    PreferencesStore,
};

use super::{filters, Session};
use crate::{args::PresetCommand, formatters::Printer};

pub async fn preset_cmd(session: &Session, subcommand: PresetCommand) -> Result<()> {
    let mut store = ComposedFilterStore::new(&session.client, &session.prefs);

    match subcommand {
        PresetCommand::List(args) => {
            let prefs = session.prefs.read()?;
            Printer::stdout(args.output)
                .print_presets(&prefs.composed_filters, prefs.default_filter_id)?;
        }
        PresetCommand::Show { id, output } => {
            let preset = store.get(id)?;
            Printer::stdout(output.output).print_preset(&preset)?;
        }
        PresetCommand::Create { name, filters } => {
            session.require_account()?;
            let mut active = ActiveFilterSet::new();
            filters::apply(&filters, &mut active, &session.client).await?;

            let preset = store
                .create(&name, active.as_slice())
                .await
                .context("Failed to create preset")?;
            println!("Preset '{}' created ({})", preset.name, display_id(&preset));
        }
        PresetCommand::Update { id, name, filters } => {
            session.require_account()?;
            let current = store.get(id)?;
            let mut active = ActiveFilterSet::new();
            store.select_as_active(&current, &mut active);
            filters::apply(&filters, &mut active, &session.client).await?;

            let preset = store
                .save_editing(name.as_deref(), &active)
                .await
                .context("Failed to update preset")?;
            println!("Preset '{}' updated ({})", preset.name, display_id(&preset));
        }
        PresetCommand::Delete { id } => {
            session.require_account()?;
            let preset = store.get(id)?;
            let mut active = ActiveFilterSet::new();
            store
                .delete(id, &mut active)
                .await
                .context("Failed to delete preset")?;
            println!("Preset '{}' deleted", preset.name);
        }
        PresetCommand::Default { id, clear } => {
            if clear {
                store.set_default(&ComposedFilter::new(CUSTOM_PRESET_NAME, vec![]))?;
                println!("Default preset cleared");
            } else if let Some(id) = id {
                let preset = store.get(id)?;
                store.set_default(&preset)?;
                println!("Default preset is now '{}'", preset.name);
            }
        }
        PresetCommand::Sync => {
            if session.prefs.read()?.auth_state() != AuthState::Authenticated {
                println!("Presets are only stored on the server for signed-in accounts");
                return Ok(());
            }

            store
                .load_remote()
                .await
                .context("Failed to load presets from the server")?;
            let count = session.prefs.read()?.composed_filters.len();
            println!("{} presets loaded", count);
        }
    }

    Ok(())
}

fn display_id(preset: &ComposedFilter) -> String {
    preset
        .id
        .map(|id| format!("#{}", id))
        .unwrap_or_else(|| "local".to_string())
}
