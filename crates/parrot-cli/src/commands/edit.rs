use anyhow::{Context, Result};
use clap::Args;

use crate::home::ParrotHome;

#[derive(Args)]
pub struct EditArgs {
    /// Channel holding the transition
    pub channel: String,
    /// First context word
    pub word1: String,
    /// Second context word
    pub word2: String,
    /// The word that follows
    pub next_word: String,
    /// New count; anything below 1 deletes the transition
    #[arg(allow_negative_numbers = true)]
    pub count: i64,
}

pub fn run(args: &EditArgs, home: &ParrotHome) -> Result<()> {
    let changed = home
        .registry()
        .set_transition_count(
            &args.channel,
            &args.word1,
            &args.word2,
            &args.next_word,
            args.count,
        )
        .with_context(|| format!("Failed to edit transition in #{}", args.channel))?;

    if !changed {
        anyhow::bail!(
            "No transition \"{} {} -> {}\" in #{}",
            args.word1,
            args.word2,
            args.next_word,
            args.channel
        );
    }
    if args.count < 1 {
        println!("Deleted \"{} {} -> {}\".", args.word1, args.word2, args.next_word);
    } else {
        println!(
            "Set \"{} {} -> {}\" to {}.",
            args.word1, args.word2, args.next_word, args.count
        );
    }
    Ok(())
}
