//! Shopring Common - Shared errors, configuration and process plumbing
//!
//! This crate provides the foundational pieces used by every shopring binary:
//! - Error types and error codes
//! - Layered configuration
//! - File and console logging
//! - Graceful shutdown signals

pub mod config;
pub mod error;
pub mod logging;
pub mod shutdown;

pub use config::Configuration;
pub use error::{ErrorCode, ShopringError};

/// Prefix of every HTTP route exposed by routers and servers
pub const API_PREFIX: &str = "/shopring/v1";

/// Query parameter names
pub const VNODE: &str = "vnode";
pub const LEVEL: &str = "level";
