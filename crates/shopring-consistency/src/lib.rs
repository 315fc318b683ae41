//! Shopring Consistency - CRDTs used as shopping list content
//!
//! A list is a map from item name to PN-counter. Replicas converge by
//! merging states with a pointwise maximum, so no coordination is needed.

pub mod crdt;

pub use crdt::{PnCounter, PnCounterMap};
