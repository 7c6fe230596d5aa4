//! Imagine CLI - serves filtered images from a storage-backed cache.
//!
//! Requests name a filter set and a source path; the server redirects to
//! the cached artifact, computing and storing it first on a miss.
//!
//! # Usage
//!
//! ```bash
//! # Serve on the configured address
//! imagine serve
//!
//! # Materialize one artifact and print its location
//! imagine resolve thumb photos/cat.jpg
//!
//! # View configuration
//! imagine config show
//! ```

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod cli;
mod logging;
mod server;

/// Imagine - on-demand image filtering with a storage-backed cache.
#[derive(Parser, Debug)]
#[command(name = "imagine")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose (debug) logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output logs in JSON format
    #[arg(long, global = true)]
    json_logs: bool,

    /// Config file to use instead of the default location
    #[arg(short, long, global = true, env = "IMAGINE_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Serve the resolve endpoint over HTTP
    Serve(cli::serve::ServeArgs),

    /// Resolve one image through a filter set and print its location
    Resolve(cli::resolve::ResolveArgs),

    /// View and manage configuration
    Config(cli::config::ConfigArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logging isn't initialized yet, so use eprintln for config warnings.
    let config = match cli::load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!(
                "Warning: Failed to load config: {e:#}\n  \
                 Using default logging settings. Check your config file with `imagine config path`."
            );
            imagine_core::Config::default()
        }
    };
    logging::init_from_config(&config, cli.verbose, cli.json_logs);

    tracing::debug!("Imagine v{}", imagine_core::VERSION);

    let config_path = cli.config;
    match cli.command {
        Commands::Serve(args) => cli::serve::execute(args, config_path.as_deref()).await,
        Commands::Resolve(args) => cli::resolve::execute(args, config_path.as_deref()).await,
        Commands::Config(args) => cli::config::execute(args, config_path.as_deref()).await,
    }
}
