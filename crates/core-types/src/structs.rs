use crate::error::CoreError;
use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Deref;

/// A single price observation for a ticker, as returned by the price service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceSample {
    pub price: f64,
    /// ISO-8601 timestamp, kept verbatim from the remote response.
    pub timestamp: String,
}

impl PriceSample {
    pub fn new(price: f64, timestamp: impl Into<String>) -> Self {
        Self {
            price,
            timestamp: timestamp.into(),
        }
    }

    /// Parses the timestamp, returning `None` when it is not valid RFC 3339.
    pub fn parsed_timestamp(&self) -> Option<DateTime<FixedOffset>> {
        DateTime::parse_from_rfc3339(&self.timestamp).ok()
    }
}

/// The ordered samples of one ticker over one window.
///
/// Order is whatever the remote service returned. Statistics never depend on
/// it; use [`PriceSeries::chronological`] when a time axis matters.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PriceSeries(Vec<PriceSample>);

impl PriceSeries {
    pub fn new(samples: Vec<PriceSample>) -> Self {
        Self(samples)
    }

    pub fn samples(&self) -> &[PriceSample] {
        &self.0
    }

    pub fn into_inner(self) -> Vec<PriceSample> {
        self.0
    }

    /// Returns a copy sorted by timestamp. Samples whose timestamp cannot be
    /// parsed keep their relative order and are placed last.
    pub fn chronological(&self) -> PriceSeries {
        let mut samples = self.0.clone();
        samples.sort_by_cached_key(|s| {
            let ts = s.parsed_timestamp();
            (ts.is_none(), ts)
        });
        PriceSeries(samples)
    }
}

impl Deref for PriceSeries {
    type Target = [PriceSample];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<Vec<PriceSample>> for PriceSeries {
    fn from(samples: Vec<PriceSample>) -> Self {
        Self(samples)
    }
}

impl FromIterator<PriceSample> for PriceSeries {
    fn from_iter<I: IntoIterator<Item = PriceSample>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Client credentials issued by the registration endpoint.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Credentials {
    pub client_id: String,
    pub client_secret: String,
}

impl Credentials {
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
        }
    }
}

// The secret must never end up in logs.
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .finish()
    }
}

/// An opaque bearer token. Expiry is not tracked locally.
#[derive(Clone, PartialEq, Eq)]
pub struct Token(String);

impl Token {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// A short, log-safe rendering of the token.
    pub fn masked(&self) -> String {
        let prefix: String = self.0.chars().take(6).collect();
        format!("{prefix}…")
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Token({})", self.masked())
    }
}

/// The fields the registration endpoint requires. All must be non-empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationDetails {
    pub email: String,
    pub name: String,
    pub mobile_no: String,
    pub github_username: String,
    pub roll_no: String,
    pub college_name: String,
    pub access_code: String,
}

impl RegistrationDetails {
    fn fields(&self) -> [(&'static str, &str); 7] {
        [
            ("email", &self.email),
            ("name", &self.name),
            ("mobileNo", &self.mobile_no),
            ("githubUsername", &self.github_username),
            ("rollNo", &self.roll_no),
            ("collegeName", &self.college_name),
            ("accessCode", &self.access_code),
        ]
    }

    /// Names of every field that is empty or whitespace.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        self.fields()
            .into_iter()
            .filter(|(_, value)| value.trim().is_empty())
            .map(|(name, _)| name)
            .collect()
    }

    /// Fails on the first empty field.
    pub fn validate(&self) -> Result<(), CoreError> {
        match self.missing_fields().first() {
            Some(field) => Err(CoreError::MissingField(field)),
            None => Ok(()),
        }
    }
}
