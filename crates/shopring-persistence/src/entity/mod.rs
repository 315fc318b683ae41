//! `SeaORM` entities

pub mod prelude;

pub mod client_list;
pub mod server_list;
