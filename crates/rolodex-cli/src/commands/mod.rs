//! CLI command definitions and dispatch.

pub mod console;
pub mod recipe;
pub mod serve;
pub mod stage;
pub mod start;

use std::io::IsTerminal;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use rolodex_common::config::RolodexConfig;

/// Rolodex: address book assistant bot.
#[derive(Parser, Debug)]
#[command(name = "rolodex", version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute. When omitted, the interactive assistant runs
    /// on a terminal and the TCP server runs otherwise.
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Path to a JSON configuration file.
    #[arg(long, global = true, env = "ROLODEX_CONFIG")]
    pub config: Option<PathBuf>,

    /// Path to the address book file.
    #[arg(long, global = true, env = "ROLODEX_DATA_FILE")]
    pub data_file: Option<PathBuf>,
}

/// Available CLI subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the assistant interactively on this terminal.
    Console,
    /// Serve the assistant over TCP, one session per connection.
    Serve(serve::ServeArgs),
    /// Print the container recipe, or inspect the contract of one.
    Recipe(recipe::RecipeArgs),
    /// Stage a build context into an image root directory.
    Stage(stage::StageArgs),
    /// Start the entrypoint of a staged image root.
    Start(start::StartArgs),
}

/// Builds the effective configuration: file (or defaults), then flags.
///
/// # Errors
///
/// Returns an error if the configuration file cannot be loaded.
pub fn resolve_config(cli: &Cli) -> anyhow::Result<RolodexConfig> {
    let mut config = match &cli.config {
        Some(path) => RolodexConfig::load(path).map_err(|e| anyhow::anyhow!("{e}"))?,
        None => RolodexConfig::default(),
    };
    if let Some(data_file) = &cli.data_file {
        config.data_file.clone_from(data_file);
    }
    tracing::debug!(?config, "resolved configuration");
    Ok(config)
}

/// Picks the command to run when none was given.
///
/// A container started without `-it` has no terminal on stdin, so it
/// serves over TCP instead of ending at the first read.
fn command_or_default(command: Option<Command>, interactive: bool) -> Command {
    command.unwrap_or_else(|| {
        if interactive {
            Command::Console
        } else {
            Command::Serve(serve::ServeArgs { listen: None })
        }
    })
}

/// Dispatches the parsed CLI command to its handler.
///
/// # Errors
///
/// Returns an error if the command execution fails.
pub fn execute(cli: Cli) -> anyhow::Result<()> {
    let config = resolve_config(&cli)?;
    let interactive = std::io::stdin().is_terminal();
    match command_or_default(cli.command, interactive) {
        Command::Console => console::execute(&config),
        Command::Serve(args) => serve::execute(args, config),
        Command::Recipe(args) => recipe::execute(&args),
        Command::Stage(args) => stage::execute(&args),
        Command::Start(args) => start::execute(&args),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_arguments_selects_console() {
        let cli = Cli::try_parse_from(["rolodex"]).expect("parse");
        assert!(cli.command.is_none());
    }

    #[test]
    fn no_subcommand_runs_console_on_a_terminal() {
        let cli = Cli::try_parse_from(["rolodex"]).expect("parse");
        assert!(matches!(
            command_or_default(cli.command, true),
            Command::Console
        ));
    }

    #[test]
    fn no_subcommand_serves_without_a_terminal() {
        let cli = Cli::try_parse_from(["rolodex"]).expect("parse");
        assert!(matches!(
            command_or_default(cli.command, false),
            Command::Serve(serve::ServeArgs { listen: None })
        ));
    }

    #[test]
    fn explicit_console_ignores_the_terminal_check() {
        let cli = Cli::try_parse_from(["rolodex", "console"]).expect("parse");
        assert!(matches!(
            command_or_default(cli.command, false),
            Command::Console
        ));
    }

    #[test]
    fn data_file_flag_overrides_default() {
        let cli = Cli::try_parse_from(["rolodex", "--data-file", "/tmp/x.json", "console"])
            .expect("parse");
        let config = resolve_config(&cli).expect("config");
        assert_eq!(config.data_file, PathBuf::from("/tmp/x.json"));
    }

    #[test]
    fn config_file_is_applied_before_flags() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("rolodex.json");
        std::fs::write(&path, r#"{ "data_file": "from-file.json", "upcoming_days": 3 }"#)
            .expect("write");
        let cli = Cli::try_parse_from([
            "rolodex",
            "--config",
            path.to_str().expect("utf-8 path"),
        ])
        .expect("parse");
        let config = resolve_config(&cli).expect("config");
        assert_eq!(config.data_file, PathBuf::from("from-file.json"));
        assert_eq!(config.upcoming_days, 3);
    }

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
