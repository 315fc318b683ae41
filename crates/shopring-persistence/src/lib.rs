//! Shopring Persistence - SQLite storage for servers and clients
//!
//! This crate provides:
//! - SeaORM entity definitions for the server and client databases
//! - Persistence trait abstractions
//! - SQLite-backed implementations and schema setup

pub mod db;
pub mod entity;
pub mod model;
pub mod sql;
pub mod traits;

// Re-export sea-orm for convenience
pub use sea_orm;

pub use db::{connect, init_client_schema, init_server_schema, sqlite_url};
pub use model::{ClientList, ServerListRow};
pub use sql::{ClientDbPersistService, ServerDbPersistService};
pub use traits::{ClientListPersistence, ServerListPersistence};
