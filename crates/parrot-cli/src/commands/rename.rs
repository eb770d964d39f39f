use anyhow::{Context, Result};
use clap::Args;

use crate::home::ParrotHome;

#[derive(Args)]
pub struct RenameArgs {
    /// Current channel name
    pub old: String,
    /// New channel name
    pub new: String,
}

pub fn run(args: &RenameArgs, home: &ParrotHome) -> Result<()> {
    let moved = home
        .registry()
        .rename(&args.old, &args.new)
        .with_context(|| format!("Failed to rename #{} to #{}", args.old, args.new))?;
    home.save_settings()?;

    if moved {
        println!("Renamed #{} to #{}.", args.old, args.new);
    } else {
        println!(
            "No brain found for #{}; settings moved to #{}.",
            args.old, args.new
        );
    }
    Ok(())
}
