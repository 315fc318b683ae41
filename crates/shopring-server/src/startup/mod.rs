pub mod http;

pub use http::storage_server;
