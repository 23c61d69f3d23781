use anyhow::Context;
use uuid::Uuid;

use crate::cli::GlobalFlags;
use crate::cli::OutputFormat;
use crate::cli::root_commands::LogArgs;
use crate::commands::parse::{parse_entity_ref, parse_pairs};
use crate::context::AppContext;
use crate::output::output;

/// Handle `chron log`.
pub async fn handle(args: &LogArgs, ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    let mut session = ctx.log.session();

    if let Some(batch) = &args.batch {
        let id = Uuid::parse_str(batch).with_context(|| format!("invalid --batch '{batch}'"))?;
        session.start_batch(Some(id));
    }
    if let Some(description) = &args.description {
        session.set_description(description.clone());
    }
    if let Some(event) = &args.event {
        session.set_event(event.clone());
    }
    if let Some(log_name) = &args.log_name {
        session.set_log_name(log_name.clone());
    }
    if let Some(subject) = &args.subject {
        session.set_subject(parse_entity_ref(subject, "subject")?);
    }
    if let Some(causer) = &args.causer {
        session.set_causer(Some(parse_entity_ref(causer, "causer")?));
    } else if args.no_causer {
        session.set_causer(None);
    }
    if let Some(template) = &args.template {
        session.set_template(template.clone());
    }
    session
        .merge_properties(parse_pairs(&args.properties, "property")?)
        .merge_context(parse_pairs(&args.context, "context")?);

    session.commit().await.context("failed to commit activity")?;
    let handle = session
        .last_committed()
        .cloned()
        .context("commit did not produce a record")?;

    if flags.format == OutputFormat::Text {
        if !flags.quiet {
            println!("{}", handle.id);
        }
        Ok(())
    } else {
        output(&handle, flags.format)
    }
}
