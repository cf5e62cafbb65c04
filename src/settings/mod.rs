//! Application settings
//!
//! Configuration types for the `tripwire` binary and their layered loader.

pub mod config;
pub mod loader;

pub use self::config::AppConfig;
pub use loader::load_config;
