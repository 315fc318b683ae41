//! HTTP handlers of the router

pub mod health;
pub mod lists;
pub mod ring;
pub mod route;
