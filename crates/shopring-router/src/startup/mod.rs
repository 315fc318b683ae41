pub mod http;

pub use http::router_server;
