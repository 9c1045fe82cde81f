use core_types::{Credentials, RegistrationDetails};
use serde::Deserialize;
use std::path::PathBuf;

/// The public evaluation service the price data is pulled from.
pub const DEFAULT_BASE_URL: &str = "http://20.244.56.144/evaluation-service";

/// The root configuration structure for the entire application.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub remote: RemoteSettings,
    #[serde(default)]
    pub registration: RegistrationSettings,
    #[serde(default)]
    pub credentials: CredentialSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

/// Where the HTTP boundary listens.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 7000,
        }
    }
}

/// How the remote price service is reached.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RemoteSettings {
    pub base_url: String,
    /// Per-request timeout applied by the HTTP transport.
    pub timeout_secs: u64,
    /// Re-authenticate and retry once when a fetch is rejected with 401.
    /// Disabling this leaves only the "ensure a token exists" check.
    pub reauth_on_expiry: bool,
}

impl Default for RemoteSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: 10,
            reauth_on_expiry: true,
        }
    }
}

/// Registration fields, usually supplied through the environment.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RegistrationSettings {
    pub email: String,
    pub name: String,
    pub mobile_no: String,
    pub github_username: String,
    pub roll_no: String,
    pub college_name: String,
    pub access_code: String,
}

impl RegistrationSettings {
    pub fn to_details(&self) -> RegistrationDetails {
        RegistrationDetails {
            email: self.email.clone(),
            name: self.name.clone(),
            mobile_no: self.mobile_no.clone(),
            github_username: self.github_username.clone(),
            roll_no: self.roll_no.clone(),
            college_name: self.college_name.clone(),
            access_code: self.access_code.clone(),
        }
    }
}

/// Client credentials from a previous registration, if any.
#[derive(Clone, Default, Deserialize)]
#[serde(default)]
pub struct CredentialSettings {
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
}

impl CredentialSettings {
    /// Both halves must be present and non-empty.
    pub fn credentials(&self) -> Option<Credentials> {
        let id = self.client_id.as_deref().map(str::trim).filter(|s| !s.is_empty())?;
        let secret = self
            .client_secret
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())?;
        Some(Credentials::new(id, secret))
    }
}

impl std::fmt::Debug for CredentialSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialSettings")
            .field("client_id", &self.client_id)
            .field("client_secret", &self.client_secret.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Output style of the console log layer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
pub enum LogFormat {
    #[default]
    Full,
    Compact,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// An `EnvFilter` directive; `RUST_LOG` takes precedence when set.
    pub level: String,
    pub format: LogFormat,
    /// When set, logs are also written to a daily-rolling file in this directory.
    pub directory: Option<PathBuf>,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Full,
            directory: None,
        }
    }
}
