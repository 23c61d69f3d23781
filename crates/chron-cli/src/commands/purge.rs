use anyhow::Context;
use serde::Serialize;

use chron_log::ActivityStore;

use crate::cli::GlobalFlags;
use crate::cli::OutputFormat;
use crate::cli::root_commands::PurgeArgs;
use crate::context::AppContext;
use crate::output::output;

#[derive(Debug, Serialize)]
struct PurgeResponse {
    days: u32,
    purged: u64,
}

/// Handle `chron purge`.
pub async fn handle(args: &PurgeArgs, ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    let days = args
        .days
        .or(ctx.log.config().storage.retention_days)
        .context("no retention window: pass --days or set storage.retention_days")?;

    let purged = ctx
        .log
        .store()
        .purge_older_than(days)
        .await
        .context("failed to purge activity")?;
    tracing::info!(days, purged, "purge finished");

    if flags.format == OutputFormat::Text {
        if !flags.quiet {
            println!("purged {purged} record(s) older than {days} day(s)");
        }
        Ok(())
    } else {
        output(&PurgeResponse { days, purged }, flags.format)
    }
}
