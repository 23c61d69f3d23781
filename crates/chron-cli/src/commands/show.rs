use std::path::Path;

use anyhow::Context;

use chron_core::{EntityRegistry, EntitySnapshot};
use chron_log::{ActivityPresenter, ActivityStore};

use crate::cli::GlobalFlags;
use crate::cli::OutputFormat;
use crate::cli::root_commands::ShowArgs;
use crate::commands::parse::parse_entity_ref;
use crate::context::AppContext;
use crate::output::{output, render_views};

/// Handle `chron show`.
pub async fn handle(args: &ShowArgs, ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    let store = ctx.log.store();
    let mut records = if let Some(subject) = &args.subject {
        store.find_by_subject(&parse_entity_ref(subject, "subject")?).await?
    } else if let Some(causer) = &args.causer {
        store
            .find_by_causer(Some(&parse_entity_ref(causer, "causer")?))
            .await?
    } else if args.no_causer {
        store.find_by_causer(None).await?
    } else if let Some(log_name) = &args.log_name {
        store.find_by_log_name(log_name).await?
    } else if let Some(event) = &args.event {
        store.find_by_event(event).await?
    } else {
        anyhow::bail!("show needs one of --subject, --causer, --no-causer, --log-name, --event");
    };
    if let Some(limit) = args.limit {
        records.truncate(limit);
    }

    let entities = match &args.entities {
        Some(path) => load_entities(Path::new(path))?,
        None => EntityRegistry::new(),
    };

    let views: Vec<_> = records
        .iter()
        .map(|record| {
            let presenter: ActivityPresenter<'_> = ctx.log.present(record, &entities);
            let mut view = presenter.view();
            if let Some(template) = &args.template {
                view.description = presenter.render_template(template);
            }
            view
        })
        .collect();

    if flags.format == OutputFormat::Text {
        println!("{}", render_views(&views));
        Ok(())
    } else {
        output(&views, flags.format)
    }
}

/// Read entity snapshots, one JSON object per line.
fn load_entities(path: &Path) -> anyhow::Result<EntityRegistry> {
    serde_jsonlines::json_lines::<EntitySnapshot, _>(path)
        .with_context(|| format!("failed to open entities file {}", path.display()))?
        .collect::<Result<EntityRegistry, _>>()
        .with_context(|| format!("invalid entity snapshot in {}", path.display()))
}
