//! Layered configuration of the `map` command.
//!
//! Values are resolved in order of increasing precedence: built-in defaults,
//! the TOML file given with `--config`, `-S key=value` overrides, and finally
//! dedicated command-line flags.

mod builder;
mod defaults;
mod file;
mod models;

pub use builder::build_config;
pub use models::AppConfig;
