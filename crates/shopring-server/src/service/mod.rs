//! Storage server business logic

pub mod handoff;
pub mod storage;

pub use handoff::{HandoffReport, start_handoff_task};
pub use storage::{ReplicationSettings, StorageService};
