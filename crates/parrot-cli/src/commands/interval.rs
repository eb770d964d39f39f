use anyhow::Result;
use clap::Args;
use parrot_core::config::{Settings, MAX_MESSAGE_INTERVAL, MIN_MESSAGE_INTERVAL};

use crate::home::ParrotHome;
use crate::output::OutputFormat;

#[derive(Args)]
pub struct IntervalArgs {
    /// New interval in messages (1-100); omit to show the current one
    pub messages: Option<u32>,

    /// Apply to one channel instead of the global default
    #[arg(short, long)]
    pub channel: Option<String>,
}

pub fn run(args: &IntervalArgs, home: &ParrotHome, format: OutputFormat) -> Result<()> {
    let settings = home.settings();

    if let Some(messages) = args.messages {
        if !(MIN_MESSAGE_INTERVAL..=MAX_MESSAGE_INTERVAL).contains(&messages) {
            eprintln!(
                "Interval {messages} is outside {MIN_MESSAGE_INTERVAL}-{MAX_MESSAGE_INTERVAL}; clamping."
            );
        }
        match &args.channel {
            Some(channel) => settings.set_channel_message_interval(channel, messages),
            None => settings.set_message_interval(messages),
        }
        home.save_settings()?;
    }

    let (scope, interval) = match &args.channel {
        Some(channel) => (
            format!("#{}", channel.to_lowercase()),
            settings.channel_message_interval(channel),
        ),
        None => ("default".to_string(), settings.message_interval()),
    };
    match format {
        OutputFormat::Json => {
            let out = serde_json::json!({
                "channel": args.channel.as_deref().map(str::to_lowercase),
                "interval": interval,
            });
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
        OutputFormat::Text => println!("Response interval ({scope}): every {interval} message(s)"),
    }
    Ok(())
}
