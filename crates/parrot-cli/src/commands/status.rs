use anyhow::{Context, Result};
use clap::Args;
use parrot_core::config::Settings;

use crate::home::ParrotHome;
use crate::output::OutputFormat;

#[derive(Args)]
pub struct StatusArgs {
    /// Channel to inspect
    pub channel: String,
}

pub fn run(args: &StatusArgs, home: &ParrotHome, format: OutputFormat) -> Result<()> {
    let registry = home.registry();
    let brain = registry
        .existing(&args.channel)
        .with_context(|| format!("Cannot show status for #{}", args.channel))?;
    let channel = brain.channel();

    let (remaining, interval) = registry.countdown(channel);
    let last_message = registry.last_message(channel);
    let stats = brain.stats();
    let settings = home.settings();
    let use_global = settings.use_global_brain(channel);
    let enabled = settings.channel_stats(channel).enabled;

    match format {
        OutputFormat::Json => {
            let out = serde_json::json!({
                "channel": channel,
                "messages_until_response": remaining,
                "interval": interval,
                "message_counter": brain.message_counter(),
                "last_message": last_message,
                "use_global_brain": use_global,
                "enabled": enabled,
                "stats": stats,
            });
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
        OutputFormat::Text => {
            println!("#{channel}");
            println!("  Next response in: {remaining} of {interval} message(s)");
            println!(
                "  Brain:            {}",
                if use_global { "global" } else { "local" }
            );
            println!("  Enabled:          {}", if enabled { "yes" } else { "no" });
            println!(
                "  Learned:          {} transitions, {} pairs",
                stats.total_entries, stats.unique_pairs
            );
            println!("  Messages seen:    {}", stats.message_count);
            println!(
                "  Last response:    {}",
                last_message.as_deref().unwrap_or("(none)")
            );
        }
    }
    Ok(())
}
