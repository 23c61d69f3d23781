use clap::{Args, Subcommand};

/// Root-level `chron` commands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Commit one activity record.
    Log(LogArgs),
    /// List activity records with rendered descriptions.
    Show(ShowArgs),
    /// Delete records older than the retention window.
    Purge(PurgeArgs),
    /// Record one changed field in the field audit trail.
    Audit(AuditArgs),
    /// List a subject's field audit trail.
    History(HistoryArgs),
    /// List the effective event templates.
    Templates,
    /// Print the effective configuration.
    Config,
}

#[derive(Debug, Args)]
pub struct LogArgs {
    /// Free-text description. Generated from event and subject when omitted.
    #[arg(short, long)]
    pub description: Option<String>,
    #[arg(short, long)]
    pub event: Option<String>,
    #[arg(long)]
    pub log_name: Option<String>,
    /// Subject as `Type:id`.
    #[arg(long)]
    pub subject: Option<String>,
    /// Causer as `Type:id`. Defaults to `CHRONICLE_ACTOR`.
    #[arg(long, conflicts_with = "no_causer")]
    pub causer: Option<String>,
    /// Record that nobody caused the activity.
    #[arg(long)]
    pub no_causer: bool,
    /// Extra property as `key=value`; values that parse as JSON are stored as JSON.
    #[arg(short = 'P', long = "property")]
    pub properties: Vec<String>,
    /// Context item as `key=value`.
    #[arg(short = 'C', long = "context")]
    pub context: Vec<String>,
    #[arg(long)]
    pub template: Option<String>,
    /// Tag the record with a batch id.
    #[arg(long)]
    pub batch: Option<String>,
}

#[derive(Debug, Args)]
#[command(group(
    clap::ArgGroup::new("filter")
        .required(true)
        .args(["subject", "causer", "no_causer", "log_name", "event"])
))]
pub struct ShowArgs {
    /// Records about `Type:id`.
    #[arg(long)]
    pub subject: Option<String>,
    /// Records caused by `Type:id`.
    #[arg(long)]
    pub causer: Option<String>,
    /// Records without a causer.
    #[arg(long)]
    pub no_causer: bool,
    #[arg(long)]
    pub log_name: Option<String>,
    #[arg(long)]
    pub event: Option<String>,
    /// JSONL file of entity snapshots used to render names.
    #[arg(long)]
    pub entities: Option<String>,
    /// Render every record with this template instead.
    #[arg(long)]
    pub template: Option<String>,
    /// Max records to print.
    #[arg(short, long)]
    pub limit: Option<usize>,
}

#[derive(Debug, Args)]
pub struct PurgeArgs {
    /// Age in days. Defaults to `storage.retention_days`.
    #[arg(long)]
    pub days: Option<u32>,
}

#[derive(Debug, Args)]
pub struct AuditArgs {
    /// Entity whose field changed, as `Type:id`.
    pub subject: String,
    pub field: String,
    /// Previous value; JSON if it parses as JSON, else a string.
    #[arg(long)]
    pub old: Option<String>,
    /// New value; JSON if it parses as JSON, else a string.
    #[arg(long)]
    pub new: Option<String>,
    #[arg(short, long)]
    pub description: Option<String>,
    /// Causer as `Type:id`. Defaults to `CHRONICLE_ACTOR`.
    #[arg(long, conflicts_with = "no_causer")]
    pub causer: Option<String>,
    #[arg(long)]
    pub no_causer: bool,
    /// When the change happened (RFC 3339). Defaults to now.
    #[arg(long)]
    pub at: Option<String>,
}

#[derive(Debug, Args)]
pub struct HistoryArgs {
    /// Entity as `Type:id`.
    pub subject: String,
    /// Max entries to print.
    #[arg(short, long)]
    pub limit: Option<usize>,
}
