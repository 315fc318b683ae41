//! Persistence traits for server and client storage

pub mod client;
pub mod server;

pub use client::ClientListPersistence;
pub use server::ServerListPersistence;
