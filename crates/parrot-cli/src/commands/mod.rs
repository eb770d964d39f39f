pub mod blacklist;
pub mod clean;
pub mod delete;
pub mod edit;
pub mod erase;
pub mod feed;
pub mod forget;
pub mod generate;
pub mod global;
pub mod ignore;
pub mod interval;
pub mod list;
pub mod optimize;
pub mod rename;
pub mod stats;
pub mod status;
pub mod transitions;

use clap::Subcommand;

#[derive(Subcommand)]
pub enum Commands {
    /// Feed chat lines from stdin to a channel and print any responses
    Feed(feed::FeedArgs),
    /// Generate text from a channel's brain, or from all brains with --global
    Generate(generate::GenerateArgs),
    /// List every brain with its statistics
    List,
    /// Show aggregate statistics across all brains
    Stats,
    /// Show a channel's countdown, last response and settings
    Status(status::StatusArgs),
    /// Browse a channel's transitions, most frequent first
    Transitions(transitions::TransitionsArgs),
    /// Set the count of one transition (below 1 deletes it)
    Edit(edit::EditArgs),
    /// Delete one transition
    Forget(forget::ForgetArgs),
    /// Purge blacklisted (or non-ASCII) transitions
    Clean(clean::CleanArgs),
    /// Drop everything a channel has learned but keep its database
    Erase(erase::EraseArgs),
    /// Delete a channel's database entirely
    Delete(delete::DeleteArgs),
    /// Compact brain databases
    Optimize(optimize::OptimizeArgs),
    /// Move a channel's brain and settings to a new name
    Rename(rename::RenameArgs),
    /// Manage blacklisted words and phrases
    Blacklist(blacklist::BlacklistArgs),
    /// Manage users whose lines are never learned
    Ignore(ignore::IgnoreArgs),
    /// Show or set the response interval
    Interval(interval::IntervalArgs),
    /// Toggle generation from the pooled global brain for a channel
    Global(global::GlobalArgs),
}
