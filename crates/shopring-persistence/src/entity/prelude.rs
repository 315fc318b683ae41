//! `SeaORM` entity prelude

pub use super::client_list::Entity as ClientList;
pub use super::server_list::Entity as ServerList;
