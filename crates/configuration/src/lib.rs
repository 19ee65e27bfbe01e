use crate::error::ConfigError;
use std::path::Path;

// Declare the modules that make up this crate.
pub mod error;
pub mod logging;
pub mod settings;

// Re-export the core types to provide a clean public API.
pub use logging::init_tracing;
pub use settings::{
    ClientConfig, Config, DatabaseConfig, LedgerDefaults, LogFormat, LoggingConfig, ServerConfig,
};

/// Prefix of environment variables that override file settings,
/// e.g. `PNL__SERVER__PORT=8080`.
pub const ENV_PREFIX: &str = "PNL";

/// Loads the application configuration from the `config.toml` file in the
/// working directory, if present, and the environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(Path::new("config.toml"))
}

/// Loads the configuration from the given file (optional) layered under
/// `PNL__*` environment variables, then validates it.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let builder = config::Config::builder()
        .add_source(config::File::from(path).required(false))
        .add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    // Attempt to deserialize the entire configuration into our `Config` struct
    let config = builder.try_deserialize::<Config>()?;
    config.validate()?;

    Ok(config)
}
