//! `rolodex stage` — Stage a build context into an image root.

use std::path::PathBuf;

use clap::Args;
use rolodex_common::constants::RECIPE_FILE;
use rolodex_image::context::{StagedContext, stage_context};
use rolodex_image::recipe::Recipe;

use crate::output::{format_bytes, short_digest};

/// Arguments for the `stage` command.
#[derive(Args, Debug)]
pub struct StageArgs {
    /// Build context directory.
    pub context: PathBuf,

    /// Directory standing in for the image root filesystem.
    pub image_root: PathBuf,

    /// Recipe to follow (defaults to the Dockerfile of the context).
    #[arg(long)]
    pub recipe: Option<PathBuf>,

    /// Print the staging manifest as JSON.
    #[arg(long)]
    pub json: bool,
}

/// Executes the `stage` command.
///
/// # Errors
///
/// Returns an error if the recipe is invalid or the context cannot be
/// staged.
#[allow(clippy::print_stdout)]
pub fn execute(args: &StageArgs) -> anyhow::Result<()> {
    let recipe_path = args
        .recipe
        .clone()
        .unwrap_or_else(|| args.context.join(RECIPE_FILE));
    let contract = Recipe::load(&recipe_path)
        .and_then(|recipe| recipe.contract())
        .map_err(|e| anyhow::anyhow!("{e}"))?;
    let staged = stage_context(&args.context, &args.image_root, &contract)
        .map_err(|e| anyhow::anyhow!("{e}"))?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&staged)?);
    } else {
        print_manifest(&staged);
    }
    Ok(())
}

#[allow(clippy::print_stdout, clippy::print_stderr)]
fn print_manifest(staged: &StagedContext) {
    println!("DIGEST\tSIZE\tPATH");
    for (path, file) in &staged.files {
        println!(
            "{}\t{}\t{}",
            short_digest(file.digest.as_hex()),
            format_bytes(file.size),
            path.display()
        );
    }
    println!();
    println!(
        "{} file(s), {} staged into {}",
        staged.files.len(),
        format_bytes(staged.total_bytes()),
        staged.workdir_path().display()
    );
    for skipped in &staged.skipped {
        eprintln!(
            "note: COPY --from={} {} was not staged",
            skipped.from_stage.as_deref().unwrap_or_default(),
            skipped.sources.join(" ")
        );
    }
}
