//! Command transport: the HTTP contract and the background listener that
//! feeds the command queue.

pub mod config;
pub mod listener;
pub mod routes;

pub use config::ServerConfig;
pub use listener::{CommandServer, ServerHandle};
pub use routes::{ApiError, ServerState, build_router};
