//! Main entry point for a shopring router.

use std::sync::Arc;

use clap::Parser;
use shopring_common::{
    logging::{LoggingConfig, init_logging},
    shutdown::wait_for_shutdown_signal,
};
use shopring_core::PeerClient;
use shopring_router::{
    model::{
        common::AppState,
        config::{Cli, initial_view},
    },
    service::{RouterService, RoutingSettings},
    startup,
};
use tracing::{error, info};

#[actix_web::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let configuration = cli.configuration()?;
    let _logging_guard = init_logging(&LoggingConfig::from_env(true))?;

    let view = initial_view(&configuration);
    info!(
        servers = view.members().len(),
        vnodes_per_server = view.vnodes_per_server(),
        "Created initial ring"
    );

    let router = Arc::new(RouterService::new(
        view.shared(),
        PeerClient::new(configuration.request_timeout_ms())?,
        configuration.router_peers(),
        RoutingSettings {
            replicas: configuration.replicas(),
            max_walk: configuration.max_walk(),
        },
    ));
    let app_state = Arc::new(AppState::new(router.clone()));

    let port = configuration.router_port();
    let server = startup::router_server(app_state, configuration.cluster_host(), port)?;
    let server_handle = server.handle();
    let server_task = actix_web::rt::spawn(server);
    info!(port, "Router listening");

    // Servers that are already up pick up the ring now; the rest fetch it on startup
    let initial = router.clone();
    actix_web::rt::spawn(async move {
        initial.push_snapshot().await;
    });

    let shutdown_signal = wait_for_shutdown_signal();
    let mut shutdown_rx = shutdown_signal.subscribe();

    tokio::select! {
        result = server_task => {
            match result {
                Ok(Err(e)) => error!("Router server error: {}", e),
                Err(e) => error!("Router server task failed: {}", e),
                Ok(Ok(())) => {}
            }
        }
        _ = shutdown_rx.recv() => {
            info!("Stopping router...");
            server_handle.stop(true).await;
        }
    }

    info!("Router shutdown complete");
    Ok(())
}
