mod cli;
mod commands;
mod config;
mod error;
mod logging;
mod server;

use crate::cli::{Cli, Commands};
use crate::config::PartialConfig;
use crate::error::{CliError, Result};
use clap::Parser;
use tokio::task;
use tracing::{debug, error, info};

#[tokio::main]
async fn main() {
    if let Err(e) = run_app().await {
        eprintln!("\n❌ Error: {}", e);
        std::process::exit(1);
    }
}

/// Runs a CPU-bound command off the async runtime.
async fn blocking<F>(job: F) -> Result<()>
where
    F: FnOnce() -> Result<()> + Send + 'static,
{
    task::spawn_blocking(job)
        .await
        .map_err(|e| CliError::Other(anyhow::anyhow!("Analysis task failed: {}", e)))?
}

async fn run_app() -> Result<()> {
    let cli = Cli::parse();
    logging::setup_logging(cli.verbose, cli.quiet, cli.log_file.as_deref())?;

    let (panic_hook, eyre_hook) = color_eyre::config::HookBuilder::default().into_hooks();
    eyre_hook.install().map_err(|e| CliError::Other(e.into()))?;
    std::panic::set_hook(Box::new(move |pi| {
        error!("{}", panic_hook.panic_report(pi));
    }));

    info!("SimAna CLI v{} starting up.", env!("CARGO_PKG_VERSION"));
    debug!("Full CLI arguments parsed: {:?}", &cli);

    let command_result = async {
        let config = PartialConfig::load(cli.config.as_deref(), &cli.set_values)?;
        match cli.command {
            Commands::Serve(args) => {
                info!("Dispatching to 'serve' command.");
                commands::serve::run(args, config).await
            }
            Commands::ContactMap(args) => {
                info!("Dispatching to 'contact-map' command.");
                blocking(move || commands::contact_map::run(args, config)).await
            }
            Commands::Dccm(args) => {
                info!("Dispatching to 'dccm' command.");
                blocking(move || commands::dccm::run(args, config)).await
            }
            Commands::Bfactor(args) => {
                info!("Dispatching to 'bfactor' command.");
                blocking(move || commands::bfactor::run(args, config)).await
            }
            Commands::Ramachandran(args) => {
                info!("Dispatching to 'ramachandran' command.");
                blocking(move || commands::ramachandran::run(args, config)).await
            }
        }
    }
    .await;

    match &command_result {
        Ok(_) => {
            info!("✅ Command completed successfully.");
            println!("✅ Command completed successfully.");
        }
        Err(e) => {
            error!("❌ Command failed: {}", e);
        }
    }

    command_result
}
