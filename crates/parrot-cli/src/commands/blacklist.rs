use anyhow::Result;
use clap::{Args, Subcommand};
use parrot_core::config::Settings;

use crate::home::ParrotHome;
use crate::output::OutputFormat;

#[derive(Args)]
pub struct BlacklistArgs {
    #[command(subcommand)]
    pub action: BlacklistAction,
}

#[derive(Subcommand)]
pub enum BlacklistAction {
    /// Blacklist a word, or a phrase when given several words
    Add {
        #[arg(required = true)]
        words: Vec<String>,
    },
    /// Remove a word or phrase from the blacklist
    Remove {
        #[arg(required = true)]
        words: Vec<String>,
    },
    /// Show the blacklist
    List,
}

pub fn run(args: &BlacklistArgs, home: &ParrotHome, format: OutputFormat) -> Result<()> {
    let settings = home.settings();
    match &args.action {
        BlacklistAction::Add { words } => {
            let entry = words.join(" ");
            if settings.add_blacklisted_word(&entry) {
                home.save_settings()?;
                println!("Blacklisted \"{entry}\".");
                println!("Run `parrot clean` to purge what was already learned.");
            } else {
                println!("\"{entry}\" is already blacklisted.");
            }
        }
        BlacklistAction::Remove { words } => {
            let entry = words.join(" ");
            if settings.remove_blacklisted_word(&entry) {
                home.save_settings()?;
                println!("Removed \"{entry}\" from the blacklist.");
            } else {
                println!("\"{entry}\" was not blacklisted.");
            }
        }
        BlacklistAction::List => {
            let words = settings.blacklisted_words();
            match format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&words)?),
                OutputFormat::Text if words.is_empty() => println!("The blacklist is empty."),
                OutputFormat::Text => {
                    for word in &words {
                        println!("{word}");
                    }
                }
            }
        }
    }
    Ok(())
}
