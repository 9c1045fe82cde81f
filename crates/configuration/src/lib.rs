use crate::error::ConfigError;
use std::path::Path;

// Declare the modules that make up this crate.
pub mod error;
pub mod logging;
pub mod settings;

// Re-export the core types to provide a clean public API.
pub use logging::init_tracing;
pub use settings::{
    Config, CredentialSettings, LogFormat, LoggingSettings, RegistrationSettings, RemoteSettings,
    ServerSettings,
};

/// The file looked up by [`load_config`]. It is optional.
pub const DEFAULT_CONFIG_FILE: &str = "config.toml";

/// Prefix for structured overrides, e.g. `STOCKLENS__REMOTE__TIMEOUT_SECS=5`.
pub const ENV_PREFIX: &str = "STOCKLENS";

/// Flat variable names kept for compatibility with existing `.env` files.
const LEGACY_ENV_KEYS: &[(&str, &str)] = &[
    ("EMAIL", "registration.email"),
    ("NAME", "registration.name"),
    ("MOBILE_NO", "registration.mobile_no"),
    ("GITHUB_USERNAME", "registration.github_username"),
    ("ROLL_NO", "registration.roll_no"),
    ("COLLEGE_NAME", "registration.college_name"),
    ("ACCESS_CODE", "registration.access_code"),
    ("CLIENT_ID", "credentials.client_id"),
    ("CLIENT_SECRET", "credentials.client_secret"),
    ("PORT", "server.port"),
];

/// Loads the application configuration from `config.toml` and the process environment.
pub fn load_config() -> Result<Config, ConfigError> {
    let env: config::Map<String, String> = std::env::vars().collect();
    load_config_from(Path::new(DEFAULT_CONFIG_FILE), &env)
}

/// Loads the configuration from an explicit file and environment map.
///
/// Precedence, lowest first: built-in defaults, the file (if it exists),
/// `STOCKLENS__*` variables, then the legacy flat variables.
pub fn load_config_from(
    path: &Path,
    env: &config::Map<String, String>,
) -> Result<Config, ConfigError> {
    let mut builder = config::Config::builder()
        .add_source(config::File::from(path).required(false))
        .add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true)
                .source(Some(env.clone())),
        );

    for (var, key) in LEGACY_ENV_KEYS {
        let value = env
            .get(*var)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty());
        builder = builder.set_override_option(*key, value)?;
    }

    // Attempt to deserialize the entire configuration into our `Config` struct
    let config = builder.build()?.try_deserialize::<Config>()?;
    validate(&config)?;

    Ok(config)
}

fn validate(config: &Config) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "server.port must be non-zero".to_string(),
        ));
    }
    let base_url = config.remote.base_url.trim();
    if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
        return Err(ConfigError::ValidationError(format!(
            "remote.base_url must be an http(s) URL, got '{base_url}'"
        )));
    }
    if config.remote.timeout_secs == 0 {
        return Err(ConfigError::ValidationError(
            "remote.timeout_secs must be at least 1".to_string(),
        ));
    }
    Ok(())
}
