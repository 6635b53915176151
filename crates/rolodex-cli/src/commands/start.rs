//! `rolodex start` — Start the entrypoint of a staged image root.

use std::path::PathBuf;

use clap::Args;
use rolodex_image::launch::plan_start;
use rolodex_image::recipe::Recipe;

/// Arguments for the `start` command.
#[derive(Args, Debug)]
pub struct StartArgs {
    /// Directory standing in for the image root filesystem.
    pub image_root: PathBuf,

    /// Recipe the image root was staged with (defaults to the workspace recipe).
    #[arg(long)]
    pub recipe: Option<PathBuf>,
}

/// Executes the `start` command and exits with the child's exit code.
///
/// # Errors
///
/// Returns an error if the entrypoint is missing or cannot be spawned.
pub fn execute(args: &StartArgs) -> anyhow::Result<()> {
    let recipe = match &args.recipe {
        Some(path) => Recipe::load(path).map_err(|e| anyhow::anyhow!("{e}"))?,
        None => Recipe::default_for_workspace(),
    };
    let contract = recipe.contract().map_err(|e| anyhow::anyhow!("{e}"))?;
    let plan = plan_start(&contract, &args.image_root).map_err(|e| anyhow::anyhow!("{e}"))?;

    tracing::info!(program = %plan.program, cwd = %plan.cwd.display(), "starting entrypoint");
    let status = plan.run().map_err(|e| anyhow::anyhow!("{e}"))?;
    tracing::info!(%status, "entrypoint exited");

    match status.code() {
        Some(0) => Ok(()),
        Some(code) => std::process::exit(code),
        None => Err(anyhow::anyhow!("entrypoint terminated by a signal")),
    }
}
