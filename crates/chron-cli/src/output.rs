use serde::Serialize;

use chron_core::FieldAuditEntry;
use chron_log::ActivityView;

use crate::cli::OutputFormat;

/// Render a serializable response to a string in the requested format.
pub fn render<T: Serialize>(value: &T, format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json | OutputFormat::Text => Ok(serde_json::to_string_pretty(value)?),
        OutputFormat::Raw => Ok(serde_json::to_string(value)?),
    }
}

/// Print a serializable response in the requested format.
pub fn output<T: Serialize>(value: &T, format: OutputFormat) -> anyhow::Result<()> {
    let rendered = render(value, format)?;
    println!("{rendered}");
    Ok(())
}

/// One line per record: timestamp, log name, description.
pub fn render_views(views: &[ActivityView]) -> String {
    if views.is_empty() {
        return String::from("(no activity)");
    }
    views
        .iter()
        .map(|view| {
            format!(
                "{}  [{}]  {}",
                view.created_at.format("%Y-%m-%d %H:%M:%S"),
                view.log_name,
                view.description
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// One line per entry: event time, field, old and new value, causer.
pub fn render_field_history(entries: &[FieldAuditEntry]) -> String {
    if entries.is_empty() {
        return String::from("(no field changes)");
    }
    entries
        .iter()
        .map(|entry| {
            let causer = entry
                .causer
                .as_ref()
                .map_or_else(|| String::from("-"), ToString::to_string);
            format!(
                "{}  {}: {} -> {}  by {causer}",
                entry.event_time.format("%Y-%m-%d %H:%M:%S"),
                entry.field,
                entry.old_value,
                entry.new_value
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}
