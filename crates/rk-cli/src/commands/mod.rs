pub mod apply;
pub mod config;

use std::path::Path;

use rk_core::config::{Config, ConfigError};

/// Load the given config file, or the default one (falling back to defaults
/// when it does not exist).
pub fn load_config(path: Option<&Path>) -> Result<Config, ConfigError> {
    match path {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    }
}
