use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};

mod commands;
mod home;
mod output;

use home::ParrotHome;

#[derive(Parser)]
#[command(
    name = "parrot",
    version,
    about = "Per-channel Markov brains that learn from chat and talk back"
)]
struct Cli {
    /// Increase verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Output format
    #[arg(long, global = true, default_value = "text")]
    format: output::OutputFormat,

    /// Data directory holding settings.json and brains/ (default: ~/.parrot)
    #[arg(long, global = true, env = "PARROT_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// The bot's own username; its lines and its own channel are never learned
    #[arg(long, global = true, env = "PARROT_BOT", default_value = "parrot")]
    bot: String,

    #[command(subcommand)]
    command: commands::Commands,
}

fn init_tracing(verbose: u8) {
    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let home = ParrotHome::open(cli.data_dir.as_deref())?;

    match &cli.command {
        commands::Commands::Feed(args) => commands::feed::run(args, &home, &cli.bot, cli.format),
        commands::Commands::Generate(args) => commands::generate::run(args, &home, cli.format),
        commands::Commands::List => commands::list::run(&home, cli.format),
        commands::Commands::Stats => commands::stats::run(&home, cli.format),
        commands::Commands::Status(args) => commands::status::run(args, &home, cli.format),
        commands::Commands::Transitions(args) => {
            commands::transitions::run(args, &home, cli.format)
        }
        commands::Commands::Edit(args) => commands::edit::run(args, &home),
        commands::Commands::Forget(args) => commands::forget::run(args, &home),
        commands::Commands::Clean(args) => commands::clean::run(args, &home, cli.format),
        commands::Commands::Erase(args) => commands::erase::run(args, &home),
        commands::Commands::Delete(args) => commands::delete::run(args, &home),
        commands::Commands::Optimize(args) => commands::optimize::run(args, &home),
        commands::Commands::Rename(args) => commands::rename::run(args, &home),
        commands::Commands::Blacklist(args) => commands::blacklist::run(args, &home, cli.format),
        commands::Commands::Ignore(args) => commands::ignore::run(args, &home, cli.format),
        commands::Commands::Interval(args) => commands::interval::run(args, &home, cli.format),
        commands::Commands::Global(args) => commands::global::run(args, &home),
    }
}
