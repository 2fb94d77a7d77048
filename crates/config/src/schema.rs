use hubgate_types::HubError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Environment variable prefix; nested keys are separated by `__`.
pub const ENV_PREFIX: &str = "HUBGATE_";

fn default_port() -> u16 {
    4000
}
fn default_host() -> String {
    "127.0.0.1".to_string()
}
fn default_refresh_margin() -> u64 {
    300
}
fn default_resource_url() -> String {
    "https://uswe.datahub.connect.aveva.com".to_string()
}
fn default_api_version() -> String {
    "v1".to_string()
}
fn default_timeout() -> u64 {
    30
}
fn default_connect_timeout() -> u64 {
    10
}
fn default_log_level() -> String {
    "info".to_string()
}

/// Client-credentials settings for the identity endpoint.
#[derive(Clone, Serialize, Deserialize)]
pub struct IdentityConfig {
    /// Token endpoint. Defaults to `<resource_url>/identity/connect/token`.
    #[serde(default)]
    pub token_url: Option<String>,
    #[serde(default)]
    pub client_id: String,
    /// Never serialized back out.
    #[serde(default, skip_serializing)]
    pub client_secret: String,
    /// Optional `audience` form field.
    #[serde(default)]
    pub audience: Option<String>,
    /// Optional `scope` form field.
    #[serde(default)]
    pub scope: Option<String>,
    /// Refresh the token once its remaining lifetime drops to this many
    /// seconds (defaults to 300).
    #[serde(default = "default_refresh_margin")]
    pub refresh_margin_secs: u64,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            token_url: None,
            client_id: String::new(),
            client_secret: String::new(),
            audience: None,
            scope: None,
            refresh_margin_secs: default_refresh_margin(),
        }
    }
}

impl std::fmt::Debug for IdentityConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdentityConfig")
            .field("token_url", &self.token_url)
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("audience", &self.audience)
            .field("scope", &self.scope)
            .field("refresh_margin_secs", &self.refresh_margin_secs)
            .finish()
    }
}

impl IdentityConfig {
    #[must_use]
    pub fn refresh_margin(&self) -> Duration {
        Duration::from_secs(self.refresh_margin_secs)
    }
}

/// Location of the time-series service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamConfig {
    #[serde(default = "default_resource_url")]
    pub resource_url: String,
    #[serde(default = "default_api_version")]
    pub api_version: String,
    /// Tenant segment of every data URL.
    #[serde(default)]
    pub tenant_id: String,
    /// Upper bound for one upstream call, in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            resource_url: default_resource_url(),
            api_version: default_api_version(),
            tenant_id: String::new(),
            timeout_secs: default_timeout(),
            connect_timeout_secs: default_connect_timeout(),
        }
    }
}

impl UpstreamConfig {
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    #[must_use]
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

/// Logging output settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// Default filter directive; `RUST_LOG` takes precedence.
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Emit JSON lines instead of human-readable output.
    #[serde(default)]
    pub json: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

/// Top-level application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Listen port (defaults to 4000).
    #[serde(default = "default_port")]
    pub port: u16,
    /// Listen address (defaults to `127.0.0.1`).
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default)]
    pub identity: IdentityConfig,
    #[serde(default)]
    pub upstream: UpstreamConfig,
    #[serde(default)]
    pub log: LogConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: default_port(),
            host: default_host(),
            identity: IdentityConfig::default(),
            upstream: UpstreamConfig::default(),
            log: LogConfig::default(),
        }
    }
}

impl Config {
    /// Parses configuration from a YAML string, merged with defaults.
    ///
    /// # Errors
    ///
    /// Returns a [`figment::Error`] if the YAML is invalid or extraction fails.
    #[allow(clippy::result_large_err)]
    pub fn from_yaml(yaml: &str) -> Result<Self, figment::Error> {
        use figment::{
            Figment,
            providers::{Format as _, Serialized, Yaml},
        };
        Figment::from(Serialized::defaults(Config::default()))
            .merge(Yaml::string(yaml))
            .extract()
    }

    /// Loads configuration from defaults, an optional YAML file, and
    /// `HUBGATE_`-prefixed environment variables, in that order.
    ///
    /// # Errors
    ///
    /// Returns a [`figment::Error`] if the file cannot be read or parsed, or
    /// an environment value has the wrong type.
    #[allow(clippy::result_large_err)]
    pub fn load(path: Option<&std::path::Path>) -> Result<Self, figment::Error> {
        use figment::{
            Figment,
            providers::{Env, Format as _, Serialized, Yaml},
        };
        let mut figment = Figment::from(Serialized::defaults(Config::default()));
        if let Some(path) = path {
            figment = figment.merge(Yaml::file(path));
        }
        figment
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
    }

    /// Base URL under which every namespace lives:
    /// `<resource>/api/<version>/Tenants/<tenant>/Namespaces`.
    #[must_use]
    pub fn namespaces_url(&self) -> String {
        format!(
            "{}/api/{}/Tenants/{}/Namespaces",
            self.upstream.resource_url.trim_end_matches('/'),
            self.upstream.api_version,
            self.upstream.tenant_id
        )
    }

    /// The identity token endpoint.
    #[must_use]
    pub fn token_url(&self) -> String {
        match &self.identity.token_url {
            Some(url) if !url.trim().is_empty() => url.clone(),
            _ => format!(
                "{}/identity/connect/token",
                self.upstream.resource_url.trim_end_matches('/')
            ),
        }
    }

    /// Checks that the settings needed to reach the service are present.
    ///
    /// # Errors
    ///
    /// Returns [`HubError::Config`] naming the first problem found.
    pub fn validate(&self) -> Result<(), HubError> {
        let url = self.upstream.resource_url.trim();
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(HubError::Config(format!(
                "upstream.resource_url must be an http(s) URL, got '{url}'"
            )));
        }
        if self.upstream.tenant_id.trim().is_empty() {
            return Err(HubError::Config("upstream.tenant_id is required".into()));
        }
        if self.identity.client_id.trim().is_empty() {
            return Err(HubError::Config("identity.client_id is required".into()));
        }
        if self.identity.client_secret.is_empty() {
            return Err(HubError::Config(
                "identity.client_secret is required".into(),
            ));
        }
        if self.upstream.timeout_secs == 0 {
            return Err(HubError::Config(
                "upstream.timeout_secs must be greater than zero".into(),
            ));
        }
        Ok(())
    }
}
