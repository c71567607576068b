use anyhow::Result;
use sportcal_core::{
    ActiveFilterSet, Filter, FilterKey, FilterKind, ReferenceDirectory, ReferenceService,
};
use tracing::warn;

use crate::args::FilterArgs;

/// Applies filter flags to `active`: clear, removals, dates, members, then picks
pub async fn apply(
    args: &FilterArgs,
    active: &mut ActiveFilterSet,
    reference: &impl ReferenceService,
) -> Result<()> {
    if args.clear {
        active.clear();
    }

    for removal in &args.remove {
        match removal.id {
            Some(id) => {
                let id = if removal.kind.is_singleton() { None } else { Some(id) };
                active.remove_key(FilterKey {
                    kind: removal.kind,
                    id,
                });
            }
            None => {
                let keys: Vec<FilterKey> = active
                    .iter()
                    .filter(|f| f.kind() == removal.kind)
                    .map(Filter::key)
                    .collect();
                for key in keys {
                    active.remove_key(key);
                }
            }
        }
    }

    if let Some(target) = &args.date {
        match target.to_filter() {
            Some(filter) => active.upsert(filter),
            None => {
                active.remove_key(FilterKey {
                    kind: FilterKind::DateRange,
                    id: None,
                });
            }
        }
    }

    if args.from.is_some() || args.to.is_some() {
        let (start, end) = match active.get(FilterKind::DateRange) {
            Some(Filter::DateRange { start, end }) => (*start, *end),
            _ => (None, None),
        };
        let start = args.from.or(start);
        let end = args.to.or(end);

        if let (Some(start), Some(end)) = (start, end) {
            if start > end {
                anyhow::bail!("Date range starts on {} after it ends on {}", start, end);
            }
        }
        active.upsert(Filter::DateRange { start, end });
    }

    if let Some(members) = args.members {
        active.upsert(Filter::MemberCountRange {
            start: members.start,
            end: members.end,
        });
    }

    let picks = args.picks();
    let mut directory: Option<Option<ReferenceDirectory>> = None;

    for (kind, pick) in picks {
        let filter = match &pick.name {
            Some(name) => Filter::reference(kind, pick.id, name.clone()),
            None => {
                if directory.is_none() {
                    directory = Some(match reference.directory().await {
                        Ok(directory) => Some(directory),
                        Err(e) => {
                            warn!(error = %e, "Reference directory unavailable, using ids as names");
                            None
                        }
                    });
                }

                match directory.as_ref().and_then(Option::as_ref) {
                    Some(directory) => match directory.find(kind, pick.id) {
                        Some(filter) => Some(filter),
                        None => anyhow::bail!("No {} with id {}", kind, pick.id),
                    },
                    None => Filter::reference(kind, pick.id, format!("#{}", pick.id)),
                }
            }
        };

        if let Some(filter) = filter {
            active.upsert(filter);
        }
    }

    Ok(())
}
