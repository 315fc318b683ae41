//! Shopring Client - offline-first shopping lists
//!
//! This crate provides:
//! - A local SQLite store per user
//! - A router client with failover across router addresses
//! - `ShoppingSession`, the list and product operations used by the app
//! - The interactive terminal app

pub mod app;
pub mod config;
pub mod local;
pub mod remote;
pub mod session;

pub use app::App;
pub use local::LocalStore;
pub use remote::RouterClient;
pub use session::{ShoppingSession, SyncStatus};
