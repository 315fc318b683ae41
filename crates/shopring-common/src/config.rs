//! Configuration management for shopring processes
//!
//! Values are layered: optional `conf/application.yml`, then `SHOPRING_*`
//! environment variables, then command line overrides applied by each binary.

use std::path::PathBuf;

use config::{Config, ConfigBuilder, Environment, builder::DefaultState};

use crate::error::ShopringError;

pub const DEFAULT_CONFIG_FILE: &str = "conf/application.yml";

pub const CLUSTER_HOST: &str = "cluster.host";
pub const CLUSTER_SERVER_BASE_PORT: &str = "cluster.server_base_port";
pub const CLUSTER_INITIAL_SERVERS: &str = "cluster.initial_servers";
pub const CLUSTER_VNODES_PER_SERVER: &str = "cluster.vnodes_per_server";
pub const CLUSTER_REPLICAS: &str = "cluster.replicas";
pub const CLUSTER_MAX_WALK: &str = "cluster.max_walk";
pub const CLUSTER_REQUEST_TIMEOUT_MS: &str = "cluster.request_timeout_ms";
pub const ROUTER_PORT: &str = "router.port";
pub const ROUTER_ADDRESSES: &str = "router.addresses";
pub const ROUTER_PEERS: &str = "router.peers";
pub const SERVER_DB_DIR: &str = "server.db_dir";
pub const SERVER_HANDOFF_INTERVAL_SECS: &str = "server.handoff_interval_secs";
pub const CLIENT_DATA_DIR: &str = "client.data_dir";
pub const CLIENT_REFRESH_INTERVAL_MS: &str = "client.refresh_interval_ms";

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_SERVER_BASE_PORT: u16 = 5000;
pub const DEFAULT_INITIAL_SERVERS: u32 = 4;
pub const DEFAULT_VNODES_PER_SERVER: u32 = 3;
pub const DEFAULT_REPLICAS: usize = 2;
pub const DEFAULT_MAX_WALK: usize = 10;
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 1000;
pub const DEFAULT_ROUTER_PORT: u16 = 6001;
pub const DEFAULT_ROUTER_ADDRESSES: [&str; 3] = [
    "http://127.0.0.1:6001",
    "http://127.0.0.1:6002",
    "http://127.0.0.1:6003",
];
pub const DEFAULT_SERVER_DB_DIR: &str = "database/server";
pub const DEFAULT_HANDOFF_INTERVAL_SECS: u64 = 10;
pub const DEFAULT_CLIENT_DATA_DIR: &str = "database/client";
pub const DEFAULT_REFRESH_INTERVAL_MS: u64 = 2000;

/// Application configuration loaded from config files and environment
#[derive(Clone, Debug, Default)]
pub struct Configuration {
    pub config: Config,
}

impl Configuration {
    /// Base builder with the file and environment sources attached.
    ///
    /// Binaries add their command line values with `set_override` before
    /// calling [`Configuration::from_builder`].
    pub fn builder() -> ConfigBuilder<DefaultState> {
        Config::builder()
            .add_source(config::File::with_name(DEFAULT_CONFIG_FILE).required(false))
            .add_source(
                Environment::with_prefix("shopring")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key(ROUTER_ADDRESSES)
                    .with_list_parse_key(ROUTER_PEERS),
            )
    }

    pub fn from_builder(builder: ConfigBuilder<DefaultState>) -> Result<Self, ShopringError> {
        let config = builder
            .build()
            .map_err(|e| ShopringError::ConfigError(e.to_string()))?;
        Ok(Configuration { config })
    }

    pub fn new() -> Result<Self, ShopringError> {
        Self::from_builder(Self::builder())
    }

    // ========================================================================
    // Cluster Configuration
    // ========================================================================

    pub fn cluster_host(&self) -> String {
        self.config
            .get_string(CLUSTER_HOST)
            .unwrap_or(DEFAULT_HOST.to_string())
    }

    pub fn server_base_port(&self) -> u16 {
        self.config
            .get_int(CLUSTER_SERVER_BASE_PORT)
            .ok()
            .and_then(|v| u16::try_from(v).ok())
            .unwrap_or(DEFAULT_SERVER_BASE_PORT)
    }

    pub fn initial_servers(&self) -> u32 {
        self.config
            .get_int(CLUSTER_INITIAL_SERVERS)
            .ok()
            .and_then(|v| u32::try_from(v).ok())
            .unwrap_or(DEFAULT_INITIAL_SERVERS)
    }

    pub fn vnodes_per_server(&self) -> u32 {
        self.config
            .get_int(CLUSTER_VNODES_PER_SERVER)
            .ok()
            .and_then(|v| u32::try_from(v).ok())
            .filter(|v| *v > 0)
            .unwrap_or(DEFAULT_VNODES_PER_SERVER)
    }

    pub fn replicas(&self) -> usize {
        self.config
            .get_int(CLUSTER_REPLICAS)
            .ok()
            .and_then(|v| usize::try_from(v).ok())
            .unwrap_or(DEFAULT_REPLICAS)
    }

    pub fn max_walk(&self) -> usize {
        self.config
            .get_int(CLUSTER_MAX_WALK)
            .ok()
            .and_then(|v| usize::try_from(v).ok())
            .unwrap_or(DEFAULT_MAX_WALK)
    }

    pub fn request_timeout_ms(&self) -> u64 {
        self.config
            .get_int(CLUSTER_REQUEST_TIMEOUT_MS)
            .ok()
            .and_then(|v| u64::try_from(v).ok())
            .unwrap_or(DEFAULT_REQUEST_TIMEOUT_MS)
    }

    /// Base URL of a storage server derived from its id
    pub fn server_address(&self, server_id: u32) -> String {
        let port = u32::from(self.server_base_port()) + server_id;
        format!("http://{}:{}", self.cluster_host(), port)
    }

    pub fn server_port(&self, server_id: u32) -> Result<u16, ShopringError> {
        let port = u32::from(self.server_base_port()) + server_id;
        u16::try_from(port).map_err(|_| {
            ShopringError::ConfigError(format!("server id {} gives invalid port {}", server_id, port))
        })
    }

    // ========================================================================
    // Router Configuration
    // ========================================================================

    pub fn router_port(&self) -> u16 {
        self.config
            .get_int(ROUTER_PORT)
            .ok()
            .and_then(|v| u16::try_from(v).ok())
            .unwrap_or(DEFAULT_ROUTER_PORT)
    }

    pub fn router_addresses(&self) -> Vec<String> {
        let addresses = self.string_list(ROUTER_ADDRESSES);
        if addresses.is_empty() {
            DEFAULT_ROUTER_ADDRESSES
                .iter()
                .map(|s| s.to_string())
                .collect()
        } else {
            addresses
        }
    }

    pub fn router_peers(&self) -> Vec<String> {
        self.string_list(ROUTER_PEERS)
    }

    // ========================================================================
    // Server Configuration
    // ========================================================================

    pub fn server_db_dir(&self) -> PathBuf {
        self.config
            .get_string(SERVER_DB_DIR)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_SERVER_DB_DIR))
    }

    pub fn handoff_interval_secs(&self) -> u64 {
        self.config
            .get_int(SERVER_HANDOFF_INTERVAL_SECS)
            .ok()
            .and_then(|v| u64::try_from(v).ok())
            .filter(|v| *v > 0)
            .unwrap_or(DEFAULT_HANDOFF_INTERVAL_SECS)
    }

    // ========================================================================
    // Client Configuration
    // ========================================================================

    pub fn client_data_dir(&self) -> PathBuf {
        self.config
            .get_string(CLIENT_DATA_DIR)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CLIENT_DATA_DIR))
    }

    pub fn refresh_interval_ms(&self) -> u64 {
        self.config
            .get_int(CLIENT_REFRESH_INTERVAL_MS)
            .ok()
            .and_then(|v| u64::try_from(v).ok())
            .filter(|v| *v > 0)
            .unwrap_or(DEFAULT_REFRESH_INTERVAL_MS)
    }

    /// Reads a list either as a YAML sequence or as a comma separated string
    fn string_list(&self, key: &str) -> Vec<String> {
        if let Ok(values) = self.config.get_array(key) {
            return values
                .into_iter()
                .filter_map(|v| v.into_string().ok())
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }
        self.config
            .get_string(key)
            .map(|s| {
                s.split(',')
                    .map(|e| e.trim().to_string())
                    .filter(|e| !e.is_empty())
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn configuration(overrides: &[(&str, &str)]) -> Configuration {
        let mut builder = Config::builder();
        for (key, value) in overrides {
            builder = builder.set_override(*key, *value).unwrap();
        }
        Configuration::from_builder(builder).unwrap()
    }

    #[test]
    fn test_defaults() {
        let config = configuration(&[]);
        assert_eq!(config.cluster_host(), "127.0.0.1");
        assert_eq!(config.server_base_port(), 5000);
        assert_eq!(config.initial_servers(), 4);
        assert_eq!(config.vnodes_per_server(), 3);
        assert_eq!(config.replicas(), 2);
        assert_eq!(config.max_walk(), 10);
        assert_eq!(config.request_timeout_ms(), 1000);
        assert_eq!(config.router_port(), 6001);
        assert_eq!(config.router_addresses().len(), 3);
        assert!(config.router_peers().is_empty());
        assert_eq!(config.handoff_interval_secs(), 10);
        assert_eq!(config.refresh_interval_ms(), 2000);
        assert_eq!(config.server_db_dir(), PathBuf::from("database/server"));
        assert_eq!(config.client_data_dir(), PathBuf::from("database/client"));
    }

    #[test]
    fn test_overrides() {
        let config = configuration(&[
            (CLUSTER_HOST, "10.0.0.7"),
            (CLUSTER_SERVER_BASE_PORT, "7000"),
            (CLUSTER_VNODES_PER_SERVER, "8"),
            (ROUTER_ADDRESSES, "http://a:1, http://b:2"),
        ]);
        assert_eq!(config.server_address(3), "http://10.0.0.7:7003");
        assert_eq!(config.server_port(3).unwrap(), 7003);
        assert_eq!(config.vnodes_per_server(), 8);
        assert_eq!(
            config.router_addresses(),
            vec!["http://a:1".to_string(), "http://b:2".to_string()]
        );
    }

    #[test]
    fn test_invalid_values_fall_back() {
        let config = configuration(&[
            (CLUSTER_VNODES_PER_SERVER, "0"),
            (ROUTER_PORT, "99999"),
            (CLUSTER_SERVER_BASE_PORT, "65535"),
        ]);
        assert_eq!(config.vnodes_per_server(), DEFAULT_VNODES_PER_SERVER);
        assert_eq!(config.router_port(), DEFAULT_ROUTER_PORT);
        assert!(config.server_port(1).is_err());
    }
}
