//! Shopring API - HTTP models shared by routers, servers and clients
//!
//! This crate provides:
//! - Virtual node identifiers
//! - Request/response models for list, key and ring endpoints
//! - The `{code, message, data}` response envelope

pub mod model;
pub mod node;
pub mod response;

pub use model::*;
pub use node::VirtualNode;
pub use response::Result;
