//! Command line handling and initial ring for the router

use clap::Parser;
use config::{ConfigBuilder, builder::DefaultState};
use shopring_common::{
    Configuration, ShopringError,
    config::{CLUSTER_INITIAL_SERVERS, CLUSTER_VNODES_PER_SERVER, ROUTER_PORT},
};
use shopring_core::ClusterView;

/// Command line arguments for the router
#[derive(Debug, Parser)]
#[command(name = "shopring-router", about = "Shopring router")]
pub struct Cli {
    #[arg(long = "port")]
    pub port: Option<u16>,
    /// Number of storage servers in the initial ring (ids 1..=n)
    #[arg(long = "servers")]
    pub servers: Option<u32>,
    #[arg(long = "vnodes")]
    pub vnodes: Option<u32>,
}

fn set_override(
    builder: ConfigBuilder<DefaultState>,
    key: &str,
    value: i64,
) -> Result<ConfigBuilder<DefaultState>, ShopringError> {
    builder
        .set_override(key, value)
        .map_err(|e| ShopringError::ConfigError(e.to_string()))
}

impl Cli {
    pub fn configuration(&self) -> Result<Configuration, ShopringError> {
        let mut builder = Configuration::builder();
        if let Some(v) = self.port {
            builder = set_override(builder, ROUTER_PORT, i64::from(v))?;
        }
        if let Some(v) = self.servers {
            builder = set_override(builder, CLUSTER_INITIAL_SERVERS, i64::from(v))?;
        }
        if let Some(v) = self.vnodes {
            builder = set_override(builder, CLUSTER_VNODES_PER_SERVER, i64::from(v))?;
        }
        Configuration::from_builder(builder)
    }
}

/// Version 1 of the ring: servers `1..=initial_servers` at their configured addresses
pub fn initial_view(configuration: &Configuration) -> ClusterView {
    let mut view = ClusterView::new(configuration.vnodes_per_server());
    for server_id in 1..=configuration.initial_servers() {
        view.add_member(server_id, &configuration.server_address(server_id));
    }
    view.bump_version();
    view
}
