// bot/mod.rs

// Exported functions
pub use self::dispatcher::{register_commands, run_dispatcher};

// Exported structs and types
pub use self::config::{Config, ConfigError};
pub use self::dispatcher::TelegramResponder;
pub use self::processor::Processor;
pub use self::router::Router;

// Declare submodules
pub mod api;
pub mod config;
pub mod currency;
mod dispatcher;
pub mod handler;
pub mod processor;
pub mod router;
pub mod schema;
