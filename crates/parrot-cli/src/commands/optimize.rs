use anyhow::{Context, Result};
use clap::Args;

use crate::home::ParrotHome;

#[derive(Args)]
pub struct OptimizeArgs {
    /// Only compact this channel (default: every brain)
    pub channel: Option<String>,
}

pub fn run(args: &OptimizeArgs, home: &ParrotHome) -> Result<()> {
    let registry = home.registry();
    match &args.channel {
        Some(channel) => {
            let brain = registry
                .existing(channel)
                .with_context(|| format!("Cannot optimize #{channel}"))?;
            let before = brain.stats().db_size;
            brain.optimize().context("Failed to optimize brain")?;
            let after = brain.stats().db_size;
            println!("Optimized #{} ({before} -> {after} bytes).", brain.channel());
        }
        None => {
            let optimized = registry.optimize_all();
            println!("Optimized {} brain(s).", optimized.len());
            for channel in &optimized {
                println!("  #{channel}");
            }
        }
    }
    Ok(())
}
