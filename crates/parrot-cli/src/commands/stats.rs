use anyhow::Result;

use crate::home::ParrotHome;
use crate::output::format::format_database_stats;
use crate::output::OutputFormat;

pub fn run(home: &ParrotHome, format: OutputFormat) -> Result<()> {
    let stats = home.registry().stats();
    println!("{}", format_database_stats(&stats, format).trim_end());
    Ok(())
}
