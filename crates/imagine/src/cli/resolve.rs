//! The `imagine resolve` command: materialize one artifact from the shell.

use clap::Args;
use imagine_core::Imagine;
use std::path::Path;

/// Arguments for the `resolve` command.
#[derive(Args, Debug)]
pub struct ResolveArgs {
    /// Filter set name
    pub filter_set: String,

    /// Source image path, relative to the adapter's source root
    pub path: String,
}

/// Execute the resolve command.
pub async fn execute(args: ResolveArgs, config_path: Option<&Path>) -> anyhow::Result<()> {
    let config = super::load_config(config_path)?;
    let imagine = Imagine::new(config)?;

    let location = imagine.resolve(&args.filter_set, &args.path).await?;
    println!("{location}");
    Ok(())
}
