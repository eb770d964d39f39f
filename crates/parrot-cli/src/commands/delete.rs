use anyhow::{Context, Result};
use clap::Args;

use crate::home::ParrotHome;

#[derive(Args)]
pub struct DeleteArgs {
    /// Channel whose database to delete
    pub channel: String,

    /// Skip confirmation prompt
    #[arg(long, short)]
    pub yes: bool,
}

pub fn run(args: &DeleteArgs, home: &ParrotHome) -> Result<()> {
    if !args.yes {
        println!("This permanently deletes everything #{} has learned.", args.channel);
        eprintln!("\nUse --yes to confirm deletion.");
        return Ok(());
    }

    let removed = home
        .registry()
        .delete(&args.channel)
        .with_context(|| format!("Failed to delete #{}", args.channel))?;
    if removed {
        println!("Deleted #{}.", args.channel);
    } else {
        println!("No brain found for #{}.", args.channel);
    }
    Ok(())
}
