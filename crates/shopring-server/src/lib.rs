//! Shopring storage server
//!
//! Stores shopping lists in a local SQLite database, merges incoming states
//! with the list CRDT and replicates each list along the ring.

pub mod api;
pub mod model;
pub mod service;
pub mod startup;
