use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use parrot_core::storage::channel_key;

use crate::home::ParrotHome;
use crate::output::format::{describe_generation, format_generation};
use crate::output::OutputFormat;

#[derive(Args)]
pub struct FeedArgs {
    /// Channel the lines were said in
    pub channel: String,

    /// Username the lines are attributed to
    #[arg(long, default_value = "viewer")]
    pub sender: String,

    /// Read lines from this file instead of stdin
    #[arg(long)]
    pub file: Option<PathBuf>,
}

pub fn run(args: &FeedArgs, home: &ParrotHome, bot: &str, format: OutputFormat) -> Result<()> {
    let key = channel_key(&args.channel)?;
    if key.eq_ignore_ascii_case(bot) {
        anyhow::bail!("#{key} is the bot's own channel; nothing is learned there.");
    }
    home.registry()
        .brain(&key)
        .with_context(|| format!("Failed to open brain for #{key}"))?;

    let reader: Box<dyn BufRead> = match &args.file {
        Some(path) => Box::new(BufReader::new(
            File::open(path).with_context(|| format!("Failed to open {}", path.display()))?,
        )),
        None => Box::new(std::io::stdin().lock()),
    };

    let router = home.router();
    let mut processed = 0usize;
    let mut responses = 0usize;
    for line in reader.lines() {
        let line = line.context("Failed to read input")?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let result = router.process_message(&key, line, &args.sender, bot);
        processed += 1;
        if result.triggered {
            tracing::info!(channel = %key, "{}", describe_generation(&result));
        }
        if result.success {
            responses += 1;
        }
        if let Some(out) = format_generation(&result, format) {
            println!("{out}");
        }
    }

    home.save_settings()?;
    eprintln!("Fed {processed} line(s) to #{key}, {responses} response(s).");
    Ok(())
}
