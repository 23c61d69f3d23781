use serde::Serialize;

use crate::cli::GlobalFlags;
use crate::cli::OutputFormat;
use crate::context::AppContext;
use crate::output::output;

#[derive(Debug, Serialize)]
struct TemplateEntry<'a> {
    event: &'a str,
    template: &'a str,
}

/// Handle `chron templates`.
pub fn handle(ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    let entries: Vec<_> = ctx
        .log
        .engine()
        .registry()
        .effective()
        .into_iter()
        .map(|(event, template)| TemplateEntry { event, template })
        .collect();

    if flags.format == OutputFormat::Text {
        for entry in &entries {
            println!("{:<12} {}", entry.event, entry.template);
        }
        Ok(())
    } else {
        output(&entries, flags.format)
    }
}
