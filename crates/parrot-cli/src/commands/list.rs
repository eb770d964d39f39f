use anyhow::Result;

use crate::home::ParrotHome;
use crate::output::format::format_brain_list;
use crate::output::OutputFormat;

pub fn run(home: &ParrotHome, format: OutputFormat) -> Result<()> {
    let brains = home.registry().list();
    println!("{}", format_brain_list(&brains, format).trim_end());
    Ok(())
}
