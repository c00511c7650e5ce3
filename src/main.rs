//! dfumap - Inspect DfuSe memory layouts
//!
//! DfuSe devices publish the memory map of every alternate setting as a
//! string descriptor. dfumap parses those strings, prints the resulting
//! segments, and checks where a firmware image would land before it is
//! downloaded.

mod cli;
mod commands;
mod error;

use clap::Parser;
use cli::{Cli, Commands};
use dfumap_core::ParseOptions;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logger, RUST_LOG overrides the verbosity flag
    let default_level = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    let options = ParseOptions::new().verbose(cli.verbose > 0);

    match cli.command {
        Commands::Show { input } => commands::layout::cmd_show(&input, &options)?,
        Commands::Find {
            descriptor,
            address,
        } => commands::layout::cmd_find(&descriptor, address, &options)?,
        Commands::Split {
            descriptor,
            address,
            length,
            mode,
            pages,
        } => commands::layout::cmd_split(&descriptor, address, length, mode, pages, &options)?,
    }

    Ok(())
}
