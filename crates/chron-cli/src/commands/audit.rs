use anyhow::Context;
use serde_json::Value;

use chron_core::FieldAuditEntry;

use crate::cli::GlobalFlags;
use crate::cli::OutputFormat;
use crate::cli::root_commands::AuditArgs;
use crate::commands::parse::{parse_entity_ref, parse_time, parse_value};
use crate::context::AppContext;
use crate::output::output;

/// Handle `chron audit`.
pub async fn handle(args: &AuditArgs, ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    let trail = ctx.log.field_audit();
    let subject = parse_entity_ref(&args.subject, "subject")?;
    let causer = if let Some(causer) = &args.causer {
        Some(parse_entity_ref(causer, "causer")?)
    } else if args.no_causer {
        None
    } else {
        trail.current_actor()
    };

    let mut entry = FieldAuditEntry::new(
        subject,
        args.field.clone(),
        args.old.as_deref().map_or(Value::Null, parse_value),
        args.new.as_deref().map_or(Value::Null, parse_value),
    )
    .with_causer(causer);
    if let Some(description) = &args.description {
        entry = entry.with_description(description.clone());
    }
    if let Some(at) = &args.at {
        entry = entry.at(parse_time(at, "at")?);
    }

    let id = entry.id.clone();
    trail
        .log(entry.clone())
        .await
        .context("failed to write field audit entry")?;

    if flags.format == OutputFormat::Text {
        if !flags.quiet {
            println!("{id}");
        }
        Ok(())
    } else {
        output(&entry, flags.format)
    }
}
