use anyhow::{Context, Result};
use clap::Args;

use crate::home::ParrotHome;

#[derive(Args)]
pub struct ForgetArgs {
    /// Channel holding the transition
    pub channel: String,
    /// First context word
    pub word1: String,
    /// Second context word
    pub word2: String,
    /// The word that follows
    pub next_word: String,
}

pub fn run(args: &ForgetArgs, home: &ParrotHome) -> Result<()> {
    let removed = home
        .registry()
        .delete_transition(&args.channel, &args.word1, &args.word2, &args.next_word)
        .with_context(|| format!("Failed to delete transition in #{}", args.channel))?;

    if removed {
        println!("Forgot \"{} {} -> {}\".", args.word1, args.word2, args.next_word);
    } else {
        println!("No such transition.");
    }
    Ok(())
}
