//! Main entry point for the shopring client.

use std::time::Duration;

use clap::Parser;
use shopring_client::{App, RouterClient, config::Cli};
use shopring_common::logging::{LoggingConfig, init_logging};
use tokio::io::BufReader;
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let configuration = cli.configuration()?;
    // Console logs would interleave with the menu
    let _logging_guard = init_logging(&LoggingConfig::from_env(false))?;

    let routers = configuration.router_addresses();
    info!(routers = ?routers, "Starting client");
    let router = RouterClient::new(routers, configuration.request_timeout_ms())?;

    let mut app = App::new(
        BufReader::new(tokio::io::stdin()),
        std::io::stdout(),
        configuration.client_data_dir(),
        Duration::from_millis(configuration.refresh_interval_ms()),
    )
    .with_user(cli.user.clone());
    app.run(router).await?;
    Ok(())
}
