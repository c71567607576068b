use anyhow::{Context, Result};
use sportcal_core::{
    favourites::star, paginator::FIRST_PAGE, ActiveFilterSet, ComposedFilterStore, PageOutcome,
    Paginator, RemoteError,
};
use tracing::debug;

use super::{filters, Session};
use crate::{args::SearchArgs, formatters::Printer};

pub async fn search_cmd(session: &Session, args: SearchArgs) -> Result<()> {
    let mut store = ComposedFilterStore::new(&session.client, &session.prefs);
    let mut active = ActiveFilterSet::new();

    match args.preset {
        Some(id) => {
            let preset = store.get(id)?;
            store.select_as_active(&preset, &mut active);
        }
        None => {
            store.seed_from_default(&mut active)?;
        }
    }

    filters::apply(&args.filters, &mut active, &session.client).await?;

    if args.save_as.is_some() || args.save {
        session.require_account()?;
    }

    if let Some(name) = &args.save_as {
        let preset = store
            .create(name, active.as_slice())
            .await
            .context("Failed to save preset")?;
        store.select_as_active(&preset, &mut active);
        eprintln!("Saved preset '{}'", preset.name);
    } else if args.save {
        let preset = store
            .save_editing(None, &active)
            .await
            .context("Failed to save preset")?;
        eprintln!("Saved preset '{}'", preset.name);
    }

    let mut printer = Printer::stdout(args.output);
    printer.print_active(store.editing(), active.as_slice())?;

    let mut paginator = Paginator::new(&session.client, session.config.query_options());

    let mut outcome = paginator.start(active.as_slice(), FIRST_PAGE).await;
    for _ in 1..args.pages {
        if !matches!(outcome, PageOutcome::Loaded { .. }) || paginator.is_last_page() {
            break;
        }
        outcome = paginator.request_next_page(active.as_slice()).await;
    }
    let failure: Option<RemoteError> = match outcome {
        PageOutcome::Failed(e) => Some(e),
        _ => None,
    };

    debug!(
        events = paginator.items().len(),
        last_page = paginator.is_last_page(),
        "Search finished"
    );

    if failure.is_none() || !paginator.items().is_empty() {
        printer.print_events(paginator.items())?;
    }

    for event_id in &args.star {
        let event = paginator
            .items()
            .iter()
            .find(|e| e.id == *event_id)
            .with_context(|| format!("Event {} is not among the results", event_id))?;
        star(&session.client, &session.prefs, event)
            .await
            .with_context(|| format!("Failed to subscribe to event {}", event_id))?;
        eprintln!("Added '{}' to favourites", event.event_name);
    }

    match failure {
        Some(e) if paginator.items().is_empty() => Err(e).context("Search failed"),
        Some(e) => Err(e).context("Search stopped before all pages were loaded"),
        None => Ok(()),
    }
}
