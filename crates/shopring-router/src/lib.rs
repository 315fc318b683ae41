//! Shopring router
//!
//! Owns the consistent-hash ring, forwards list requests to the servers that
//! own them and coordinates data movement when servers join or leave.

pub mod api;
pub mod model;
pub mod service;
pub mod startup;
