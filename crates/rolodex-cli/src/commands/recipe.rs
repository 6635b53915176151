//! `rolodex recipe` — Print or inspect a container recipe.

use std::path::PathBuf;

use clap::Args;
use rolodex_image::recipe::{Recipe, RuntimeContract};

/// Arguments for the `recipe` command.
#[derive(Args, Debug)]
pub struct RecipeArgs {
    /// Recipe to inspect instead of printing the workspace recipe.
    #[arg(long)]
    pub inspect: Option<PathBuf>,

    /// Print the runtime contract as JSON.
    #[arg(long, requires = "inspect")]
    pub json: bool,
}

/// Executes the `recipe` command.
///
/// # Errors
///
/// Returns an error if the inspected recipe cannot be read or violates
/// the runtime contract.
#[allow(clippy::print_stdout)]
pub fn execute(args: &RecipeArgs) -> anyhow::Result<()> {
    let Some(path) = &args.inspect else {
        print!("{}", Recipe::default_for_workspace().render());
        return Ok(());
    };

    let contract = Recipe::load(path)
        .and_then(|recipe| recipe.contract())
        .map_err(|e| anyhow::anyhow!("{e}"))?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&contract)?);
    } else {
        print_contract(&contract);
    }
    Ok(())
}

#[allow(clippy::print_stdout)]
fn print_contract(contract: &RuntimeContract) {
    println!("base image:  {}", contract.base_image);
    println!("workdir:     {}", contract.workdir);
    if let Some(user) = &contract.user {
        println!("user:        {user}");
    }
    let ports: Vec<String> = contract
        .exposed_ports
        .iter()
        .map(ToString::to_string)
        .collect();
    println!(
        "ports:       {}",
        if ports.is_empty() { "-".to_string() } else { ports.join(", ") }
    );
    println!("command:     {}", contract.command.join(" "));
    for (key, value) in &contract.env {
        println!("env:         {key}={value}");
    }
    println!();
    println!("COPY steps:");
    for copy in &contract.copies {
        let origin = copy
            .from_stage
            .as_deref()
            .map_or_else(|| "context".to_string(), |stage| format!("stage {stage}"));
        println!("  {} -> {}  ({origin})", copy.sources.join(" "), copy.dest);
    }
}
