//! Router business logic

pub mod membership;
pub mod routing;

pub use membership::RebalanceReport;
pub use routing::{RouterService, RoutingSettings};
