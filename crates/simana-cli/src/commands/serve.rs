use crate::cli::ServeArgs;
use crate::config::PartialConfig;
use crate::error::Result;
use crate::server;
use tracing::info;

pub async fn run(args: ServeArgs, config: PartialConfig) -> Result<()> {
    let config = config.merge_with_cli(&args)?;
    info!(
        bind = %config.bind,
        staging = ?config.staging_dir,
        "Starting HTTP service."
    );
    server::serve(config).await
}
