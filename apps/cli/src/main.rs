//! termgroup CLI: groups ontology term ids under header terms.
//!
//! Reads a term graph and a term list, writes section files in the text or
//! literal encoding, and converts or compares existing section files.

mod commands;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    commands::run(cli)
}
