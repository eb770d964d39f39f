use anyhow::{Context, Result};
use clap::Args;

use crate::home::ParrotHome;
use crate::output::format::format_clean_reports;
use crate::output::OutputFormat;

#[derive(Args)]
pub struct CleanArgs {
    /// Only clean this channel (default: every brain)
    pub channel: Option<String>,

    /// Remove self-loops and non-ASCII transitions instead of blacklisted ones
    #[arg(long)]
    pub non_ascii: bool,
}

pub fn run(args: &CleanArgs, home: &ParrotHome, format: OutputFormat) -> Result<()> {
    let registry = home.registry();

    if args.non_ascii {
        let removed = match &args.channel {
            Some(channel) => registry
                .existing(channel)
                .with_context(|| format!("Cannot clean #{channel}"))?
                .clean_non_ascii(),
            None => registry.clean_non_ascii_all(),
        };
        match format {
            OutputFormat::Json => {
                println!("{}", serde_json::json!({ "removed": removed }));
            }
            OutputFormat::Text => println!("Removed {removed} non-ASCII transition(s)."),
        }
        return Ok(());
    }

    let reports = match &args.channel {
        Some(channel) => vec![registry
            .clean(channel)
            .with_context(|| format!("Cannot clean #{channel}"))?],
        None => registry.clean_all(),
    };
    println!("{}", format_clean_reports(&reports, format).trim_end());
    Ok(())
}
