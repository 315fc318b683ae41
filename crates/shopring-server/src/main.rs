//! Main entry point for a shopring storage server.

use std::{sync::Arc, time::Duration};

use clap::Parser;
use shopring_api::{HEALTH_PATH, HealthInfo, JoinRequest, RING_JOIN_PATH, RING_PATH, RingSnapshot};
use shopring_common::{
    logging::{LoggingConfig, init_logging},
    shutdown::wait_for_shutdown_signal,
};
use shopring_core::{ClusterView, FailoverHttpClient, HttpClientConfig, PeerClient};
use shopring_persistence::{
    ServerDbPersistService, ServerListPersistence, connect, init_server_schema, sqlite_url,
};
use shopring_server::{
    model::{common::AppState, config::Cli},
    service::{ReplicationSettings, StorageService, start_handoff_task},
    startup,
};
use tracing::{error, info, warn};

#[actix_web::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let configuration = cli.configuration()?;
    let _logging_guard = init_logging(&LoggingConfig::from_env(true))?;

    let server_id = cli.id;
    let address = configuration.server_address(server_id);
    let port = configuration.server_port(server_id)?;
    let timeout_ms = configuration.request_timeout_ms();

    // Local database
    let db_path = cli.db_path(&configuration);
    let db = connect(&sqlite_url(&db_path)?).await?;
    init_server_schema(&db).await?;
    let persistence: Arc<dyn ServerListPersistence> = Arc::new(ServerDbPersistService::new(db));
    info!(server_id, path = %db_path.display(), "Opened server database");

    // A router must be reachable before this server takes part in the ring
    let routers = FailoverHttpClient::new(
        HttpClientConfig::with_servers(configuration.router_addresses())
            .with_timeouts(timeout_ms, timeout_ms.saturating_mul(3)),
    )?;
    match routers.get::<HealthInfo>(HEALTH_PATH).await {
        Ok(_) => info!(router = %routers.current_server(), "Found live router"),
        Err(e) => {
            error!(error = %e, "No router is reachable, exiting");
            return Err(e.into());
        }
    }

    let storage = Arc::new(StorageService::new(
        server_id,
        persistence,
        ClusterView::new(configuration.vnodes_per_server()).shared(),
        PeerClient::new(timeout_ms)?,
        ReplicationSettings {
            replicas: configuration.replicas(),
            max_walk: configuration.max_walk(),
        },
    ));
    let app_state = Arc::new(AppState::new(storage.clone()));

    let shutdown_signal = wait_for_shutdown_signal();
    let mut shutdown_rx = shutdown_signal.subscribe();

    let server = startup::storage_server(app_state, configuration.cluster_host(), port)?;
    let server_handle = server.handle();
    let server_task = actix_web::rt::spawn(server);
    info!(server_id, %address, "Storage server listening");

    // The router calls back into this server while handling a join
    let snapshot = if cli.join {
        routers
            .post_json::<RingSnapshot, _>(
                RING_JOIN_PATH,
                &JoinRequest {
                    server_id,
                    address: address.clone(),
                },
            )
            .await
    } else {
        routers.get::<RingSnapshot>(RING_PATH).await
    };
    match snapshot {
        Ok(snapshot) => {
            if let Err(e) = storage.install_ring(&snapshot).await {
                warn!(error = %e, "Failed to install ring from router");
            }
        }
        Err(e) => warn!(error = %e, join = cli.join, "Could not fetch the ring from a router"),
    }

    let handoff_task = start_handoff_task(
        storage.clone(),
        Duration::from_secs(configuration.handoff_interval_secs()),
        shutdown_signal.subscribe(),
    );

    tokio::select! {
        result = server_task => {
            match result {
                Ok(Err(e)) => error!("Storage server error: {}", e),
                Err(e) => error!("Storage server task failed: {}", e),
                Ok(Ok(())) => {}
            }
        }
        _ = shutdown_rx.recv() => {
            info!("Stopping storage server...");
            server_handle.stop(true).await;
        }
    }

    shutdown_signal.shutdown();
    if let Err(e) = handoff_task.await {
        warn!("Hinted handoff task ended abnormally: {}", e);
    }

    info!(server_id, "Storage server shutdown complete");
    Ok(())
}
