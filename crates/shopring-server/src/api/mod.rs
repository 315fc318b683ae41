//! HTTP handlers of the storage server

pub mod health;
pub mod keys;
pub mod lists;
pub mod ring;
pub mod route;
