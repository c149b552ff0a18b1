//! CLI command handlers.

mod checksum;
mod config;
mod console;
mod get;

pub use checksum::run_checksum;
pub use config::run_config;
pub use get::{run_get, GetArgs};
