use anyhow::Result;
use clap::{Args, Subcommand};

use crate::home::ParrotHome;
use crate::output::OutputFormat;

#[derive(Args)]
pub struct IgnoreArgs {
    #[command(subcommand)]
    pub action: IgnoreAction,
}

#[derive(Subcommand)]
pub enum IgnoreAction {
    /// Never learn from this user
    Add { user: String },
    /// Learn from this user again
    Remove { user: String },
    /// Show ignored users
    List,
}

pub fn run(args: &IgnoreArgs, home: &ParrotHome, format: OutputFormat) -> Result<()> {
    let settings = home.settings();
    match &args.action {
        IgnoreAction::Add { user } => {
            if settings.add_blacklisted_user(user) {
                home.save_settings()?;
                println!("Ignoring {user}.");
            } else {
                println!("{user} is already ignored.");
            }
        }
        IgnoreAction::Remove { user } => {
            if settings.remove_blacklisted_user(user) {
                home.save_settings()?;
                println!("No longer ignoring {user}.");
            } else {
                println!("{user} was not ignored.");
            }
        }
        IgnoreAction::List => {
            let users = settings.blacklisted_users();
            match format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&users)?),
                OutputFormat::Text if users.is_empty() => println!("No users are ignored."),
                OutputFormat::Text => {
                    for user in &users {
                        println!("{user}");
                    }
                }
            }
        }
    }
    Ok(())
}
