//! Command line handling for the client

use std::path::PathBuf;

use clap::Parser;
use config::{ConfigBuilder, builder::DefaultState};
use shopring_common::{
    Configuration, ShopringError,
    config::{CLIENT_DATA_DIR, ROUTER_ADDRESSES},
};

/// Command line arguments for the shopping list client
#[derive(Debug, Parser)]
#[command(name = "shopring", about = "Shopring shopping lists")]
pub struct Cli {
    /// Sign in as this user instead of being asked
    #[arg(long = "user")]
    pub user: Option<String>,
    /// Comma separated router addresses, tried in order
    #[arg(long = "routers")]
    pub routers: Option<String>,
    #[arg(long = "data-dir")]
    pub data_dir: Option<PathBuf>,
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
    pub fn configuration(&self) -> Result<Configuration, ShopringError> {
        let mut builder = Configuration::builder();
        if let Some(v) = &self.routers {
            builder = set_override(builder, ROUTER_ADDRESSES, v.clone())?;
        }
        if let Some(v) = &self.data_dir {
            builder = set_override(builder, CLIENT_DATA_DIR, v.display().to_string())?;
        }
        Configuration::from_builder(builder)
    }
}

/// User names end up in file names, so only a safe subset is accepted
pub fn valid_user_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}
