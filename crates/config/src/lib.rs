mod models;
mod defaults;
mod loader;
mod migration;
mod overrides;
mod validation;
mod errors;

pub use models::*;
pub use defaults::{DEFAULT_CONFIG_TEMPLATE, DEFAULT_URL_EXPIRY_SECS, MAX_URL_EXPIRY_SECS};
pub use errors::ConfigError;
