use anyhow::{Context, Result};
use clap::Args;

use crate::home::ParrotHome;
use crate::output::OutputFormat;

#[derive(Args)]
pub struct GenerateArgs {
    /// Channel whose brain to generate from
    #[arg(required_unless_present = "global")]
    pub channel: Option<String>,

    /// Pool every brain's vocabulary instead of one channel's
    #[arg(long)]
    pub global: bool,

    /// Maximum tokens sampled after the starting pair
    #[arg(short = 'n', long, default_value = "20")]
    pub max_tokens: usize,

    /// Number of lines to generate
    #[arg(short, long, default_value = "1")]
    pub count: usize,
}

pub fn run(args: &GenerateArgs, home: &ParrotHome, format: OutputFormat) -> Result<()> {
    let registry = home.registry();

    let lines: Vec<String> = match (&args.channel, args.global) {
        (_, true) => {
            // Global generation only sees loaded brains.
            registry.load_all();
            (0..args.count)
                .map(|_| registry.generate_global(args.max_tokens))
                .collect()
        }
        (Some(channel), false) => {
            let brain = registry
                .existing(channel)
                .with_context(|| format!("Cannot generate for #{channel}"))?;
            (0..args.count)
                .map(|_| brain.generate(args.max_tokens))
                .collect()
        }
        (None, false) => anyhow::bail!("Pass a channel or --global."),
    };
    let lines: Vec<String> = lines.into_iter().filter(|l| !l.is_empty()).collect();

    match format {
        OutputFormat::Json => {
            let out = serde_json::json!({
                "channel": args.channel,
                "global": args.global,
                "lines": lines,
            });
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
        OutputFormat::Text => {
            if lines.is_empty() {
                eprintln!("Nothing learned yet.");
            }
            for line in &lines {
                println!("{line}");
            }
        }
    }
    Ok(())
}
