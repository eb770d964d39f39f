use anyhow::{Context, Result};
use clap::Args;
use parrot_core::storage::DEFAULT_PAGE_SIZE;

use crate::home::ParrotHome;
use crate::output::format::format_transitions;
use crate::output::OutputFormat;

#[derive(Args)]
pub struct TransitionsArgs {
    /// Channel to browse
    pub channel: String,

    /// Only rows where any token contains this text
    #[arg(short, long, default_value = "")]
    pub search: String,

    /// Page number, starting at 1
    #[arg(short, long, default_value = "1")]
    pub page: u32,

    /// Rows per page (1-100)
    #[arg(long, default_value_t = DEFAULT_PAGE_SIZE)]
    pub page_size: u32,
}

pub fn run(args: &TransitionsArgs, home: &ParrotHome, format: OutputFormat) -> Result<()> {
    let page = home
        .registry()
        .transitions(&args.channel, &args.search, args.page, args.page_size)
        .with_context(|| format!("Failed to list transitions for #{}", args.channel))?;
    println!(
        "{}",
        format_transitions(&args.channel, &page, format).trim_end()
    );
    Ok(())
}
