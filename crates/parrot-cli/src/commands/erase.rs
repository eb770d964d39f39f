use anyhow::{Context, Result};
use clap::Args;

use crate::home::ParrotHome;

#[derive(Args)]
pub struct EraseArgs {
    /// Channel whose transitions to drop
    pub channel: String,

    /// Skip confirmation prompt
    #[arg(long, short)]
    pub yes: bool,
}

pub fn run(args: &EraseArgs, home: &ParrotHome) -> Result<()> {
    let brain = home
        .registry()
        .existing(&args.channel)
        .with_context(|| format!("Cannot erase #{}", args.channel))?;
    let stats = brain.stats();

    println!(
        "#{} has {} transition(s) to erase.",
        brain.channel(),
        stats.total_entries
    );
    if !args.yes {
        eprintln!("\nUse --yes to confirm.");
        return Ok(());
    }

    brain.erase().context("Failed to erase brain")?;
    println!("Erased #{}.", brain.channel());
    Ok(())
}
