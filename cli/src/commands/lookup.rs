use anyhow::{Context, Result};
use sportcal_core::ReferenceService;

use super::Session;
use crate::{
    args::{DirectoryArgs, LookupArgs},
    formatters::Printer,
};

pub async fn lookup_cmd(session: &Session, args: LookupArgs) -> Result<()> {
    let found = session
        .client
        .lookup(args.kind, &args.name)
        .await
        .with_context(|| format!("Failed to look up {} '{}'", args.kind, args.name))?;

    Printer::stdout(args.output.output).print_filters(&found)?;

    Ok(())
}

pub async fn directory_cmd(session: &Session, args: DirectoryArgs) -> Result<()> {
    let directory = session
        .client
        .directory()
        .await
        .context("Failed to load the reference directory")?;

    Printer::stdout(args.output.output).print_directory(&directory, args.kind)?;

    Ok(())
}
