//! Command line handling for the storage server

use std::path::PathBuf;

use clap::Parser;
use config::{ConfigBuilder, builder::DefaultState};
use shopring_common::{
    Configuration, ShopringError,
    config::{CLUSTER_HOST, SERVER_DB_DIR},
};

/// Command line arguments for the storage server
#[derive(Debug, Parser)]
#[command(name = "shopring-server", about = "Shopring storage server")]
pub struct Cli {
    /// Server id; the server listens on the base port plus this id
    #[arg(long = "id")]
    pub id: u32,
    /// Join an already running ring instead of waiting for the initial snapshot
    #[arg(long = "join", default_value_t = false)]
    pub join: bool,
    #[arg(long = "address")]
    pub address: Option<String>,
    #[arg(long = "db-dir")]
    pub db_dir: Option<PathBuf>,
}

fn set_override(
    builder: ConfigBuilder<DefaultState>,
    key: &str,
    value: String,
) -> Result<ConfigBuilder<DefaultState>, ShopringError> {
    builder
        .set_override(key, value)
        .map_err(|e| ShopringError::ConfigError(e.to_string()))
}

impl Cli {
    /// Load the configuration with this command line applied on top
    pub fn configuration(&self) -> Result<Configuration, ShopringError> {
        let mut builder = Configuration::builder();
        if let Some(v) = &self.address {
            builder = set_override(builder, CLUSTER_HOST, v.clone())?;
        }
        if let Some(v) = &self.db_dir {
            builder = set_override(builder, SERVER_DB_DIR, v.display().to_string())?;
        }
        Configuration::from_builder(builder)
    }

    /// Database file for this server inside the configured directory
    pub fn db_path(&self, configuration: &Configuration) -> PathBuf {
        configuration
            .server_db_dir()
            .join(format!("server_{}.db", self.id))
    }
}
