pub mod channel;
pub mod client;
pub mod commands;
pub mod config;
pub mod constants;
pub mod errors;
pub mod handlers;
pub mod message;
pub mod replies;
pub mod server;

pub use config::Config;
pub use errors::{ConfigError, RunError, SetupError};
pub use server::Server;
