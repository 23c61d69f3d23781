use anyhow::Context;

use crate::cli::GlobalFlags;
use crate::cli::OutputFormat;
use crate::context::AppContext;
use crate::output::output;

/// Handle `chron config`. Text output is TOML, ready to paste into
/// `.chronicle/config.toml`.
pub fn handle(ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    let config = ctx.log.config();
    if flags.format == OutputFormat::Text {
        let rendered =
            toml::to_string_pretty(config).context("failed to render configuration as TOML")?;
        print!("{rendered}");
        Ok(())
    } else {
        output(config, flags.format)
    }
}
