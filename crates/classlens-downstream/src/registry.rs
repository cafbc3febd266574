//! Downstream service registry.
//!
//! One base URL per service, fixed at process start. Resolution never
//! fails at request time; a missing URL is a startup configuration
//! error.

use std::fmt;

use thiserror::Error;

/// The four downstream analysis services.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Service {
    Localization,
    Recognition,
    Attention,
    HandRaising,
}

impl Service {
    pub const ALL: [Service; 4] = [
        Service::Localization,
        Service::Recognition,
        Service::Attention,
        Service::HandRaising,
    ];

    /// Lowercase name, as used in proxy route paths.
    pub fn name(&self) -> &'static str {
        match self {
            Service::Localization => "localization",
            Service::Recognition => "recognition",
            Service::Attention => "attention",
            Service::HandRaising => "handraising",
        }
    }

    /// Environment variable holding this service's base URL.
    pub fn env_var(&self) -> &'static str {
        match self {
            Service::Localization => "LOCALIZATION_URL",
            Service::Recognition => "RECOGNITION_URL",
            Service::Attention => "ATTENTION_URL",
            Service::HandRaising => "HANDRAISING_URL",
        }
    }

    fn default_url(&self) -> &'static str {
        match self {
            Service::Localization => "http://localization:23122",
            Service::Recognition => "http://recognition:23121",
            Service::Attention => "http://attention:23123",
            Service::HandRaising => "http://handraising:23124",
        }
    }

    /// Resolve a service from its route-path name, case-insensitively.
    pub fn from_name(name: &str) -> Option<Self> {
        Service::ALL
            .into_iter()
            .find(|s| s.name().eq_ignore_ascii_case(name))
    }
}

impl fmt::Display for Service {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Startup configuration error.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("empty base URL for {0} service (check {1})")]
    EmptyUrl(Service, &'static str),
}

/// Read-only map from service to base URL.
///
/// Constructed once at startup and shared by value; safe for
/// unsynchronized concurrent reads.
#[derive(Debug, Clone)]
pub struct ServiceRegistry {
    localization: String,
    recognition: String,
    attention: String,
    handraising: String,
}

impl ServiceRegistry {
    /// Create a registry from explicit base URLs. Trailing slashes are
    /// stripped so paths can be appended directly.
    pub fn new(
        localization: impl Into<String>,
        recognition: impl Into<String>,
        attention: impl Into<String>,
        handraising: impl Into<String>,
    ) -> Self {
        fn normalize(url: String) -> String {
            url.trim_end_matches('/').to_string()
        }

        Self {
            localization: normalize(localization.into()),
            recognition: normalize(recognition.into()),
            attention: normalize(attention.into()),
            handraising: normalize(handraising.into()),
        }
    }

    /// Create a registry from environment variables, falling back to
    /// the compose-network defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        fn url_for(service: Service) -> Result<String, ConfigError> {
            let url = std::env::var(service.env_var())
                .unwrap_or_else(|_| service.default_url().to_string());
            if url.trim().is_empty() {
                return Err(ConfigError::EmptyUrl(service, service.env_var()));
            }
            Ok(url)
        }

        Ok(Self::new(
            url_for(Service::Localization)?,
            url_for(Service::Recognition)?,
            url_for(Service::Attention)?,
            url_for(Service::HandRaising)?,
        ))
    }

    /// Base URL for a service, without a trailing slash.
    pub fn resolve(&self, service: Service) -> &str {
        match service {
            Service::Localization => &self.localization,
            Service::Recognition => &self.recognition,
            Service::Attention => &self.attention,
            Service::HandRaising => &self.handraising,
        }
    }
}
