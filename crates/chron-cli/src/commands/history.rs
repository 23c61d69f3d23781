use anyhow::Context;

use crate::cli::GlobalFlags;
use crate::cli::OutputFormat;
use crate::cli::root_commands::HistoryArgs;
use crate::commands::parse::parse_entity_ref;
use crate::context::AppContext;
use crate::output::{output, render_field_history};

/// Handle `chron history`.
pub async fn handle(args: &HistoryArgs, ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    let subject = parse_entity_ref(&args.subject, "subject")?;
    let mut entries = ctx
        .log
        .field_audit()
        .history(&subject)
        .await
        .context("failed to read field audit trail")?;
    if let Some(limit) = args.limit {
        entries.truncate(limit);
    }

    if flags.format == OutputFormat::Text {
        println!("{}", render_field_history(&entries));
        Ok(())
    } else {
        output(&entries, flags.format)
    }
}
