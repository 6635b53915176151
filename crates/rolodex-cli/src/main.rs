//! # rolodex — address book assistant
//!
//! With no arguments, runs the interactive assistant on the terminal.
//! Subcommands serve the same assistant over TCP and manage the container
//! recipe that packages it.

mod commands;
mod output;
mod session;

use clap::Parser;

use crate::commands::Cli;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    commands::execute(cli)
}
