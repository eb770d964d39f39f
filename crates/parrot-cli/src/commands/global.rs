use anyhow::Result;
use clap::{Args, ValueEnum};

use crate::home::ParrotHome;

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum Toggle {
    On,
    Off,
}

#[derive(Args)]
pub struct GlobalArgs {
    /// Channel to configure
    pub channel: String,

    /// Answer from the pooled brain of every channel (on) or only this one (off)
    pub state: Toggle,
}

pub fn run(args: &GlobalArgs, home: &ParrotHome) -> Result<()> {
    let use_global = matches!(args.state, Toggle::On);
    home.settings()
        .set_channel_use_global(&args.channel, use_global);
    home.save_settings()?;

    if use_global {
        println!("#{} now answers from the global brain.", args.channel);
    } else {
        println!("#{} now answers from its own brain.", args.channel);
    }
    Ok(())
}
