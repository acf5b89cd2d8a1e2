//! Client configuration
//!
//! Settings are layered: built-in defaults, then a YAML file, then
//! environment variables, then command-line flags.
//!
//! ```yaml
//! base_url: http://mps.local:3000
//! api_key: mps_0123456789abcdef0123456789abcdef
//! timeout_secs: 30
//! page_size: 100
//! max_pages: 500
//! ```

use crate::auth::AuthMode;
use crate::error::{Error, Result, ResultExt};
use crate::http::HttpClientConfig;
use crate::pagination::WalkOptions;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::debug;

/// Environment variables consulted by [`ClientConfig::apply_env`], first match wins
pub const ENV_BASE_URL: &[&str] = &["MPS_BASE_URL", "API_BASE_URL"];
pub const ENV_API_KEY: &[&str] = &["MPS_API_KEY", "API_KEY"];
pub const ENV_USERNAME: &[&str] = &["MPS_USERNAME"];
pub const ENV_PASSWORD: &[&str] = &["MPS_PASSWORD"];

/// Connection and walk settings for [`MpsClient`](crate::api::MpsClient)
#[derive(Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClientConfig {
    /// Server base URL
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Static API key; takes precedence over username/password
    #[serde(default)]
    pub api_key: Option<String>,

    /// Login name for session auth
    #[serde(default)]
    pub username: Option<String>,

    /// Password for session auth
    #[serde(default)]
    pub password: Option<String>,

    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Records per page
    #[serde(default = "default_page_size")]
    pub page_size: u32,

    /// Upper bound on pages per walk
    #[serde(default)]
    pub max_pages: Option<u32>,

    /// Override the user agent
    #[serde(default)]
    pub user_agent: Option<String>,
}

fn default_base_url() -> String {
    "http://localhost:3000".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_page_size() -> u32 {
    crate::pagination::DEFAULT_PAGE_SIZE
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_key: None,
            username: None,
            password: None,
            timeout_secs: default_timeout_secs(),
            page_size: default_page_size(),
            max_pages: None,
            user_agent: None,
        }
    }
}

impl ClientConfig {
    /// Parse from a YAML string
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Load from a YAML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        debug!(path = %path.display(), "Loaded config file");
        Self::from_yaml_str(&content)
    }

    /// Overlay values from the process environment
    pub fn apply_env(&mut self) {
        self.apply_env_from(|name| std::env::var(name).ok());
    }

    /// Overlay values from `lookup`; empty values are ignored
    pub fn apply_env_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let first = |names: &[&str]| {
            names
                .iter()
                .filter_map(|&name| lookup(name))
                .find(|value| !value.trim().is_empty())
        };

        if let Some(url) = first(ENV_BASE_URL) {
            self.base_url = url;
        }
        if let Some(key) = first(ENV_API_KEY) {
            self.api_key = Some(key);
        }
        if let Some(username) = first(ENV_USERNAME) {
            self.username = Some(username);
        }
        if let Some(password) = first(ENV_PASSWORD) {
            self.password = Some(password);
        }
    }

    /// Check the base URL and sizing
    pub fn validate(&self) -> Result<()> {
        let url = url::Url::parse(&self.base_url)?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(Error::config(format!(
                "base_url must be http or https, got '{}'",
                url.scheme()
            )));
        }
        if self.page_size == 0 {
            return Err(Error::config("page_size must be positive"));
        }
        if self.timeout_secs == 0 {
            return Err(Error::config("timeout_secs must be positive"));
        }
        if self.max_pages == Some(0) {
            return Err(Error::config("max_pages must be positive when set"));
        }
        Ok(())
    }

    /// Whether username and password are both present
    pub fn has_credentials(&self) -> bool {
        let present = |v: &Option<String>| v.as_deref().is_some_and(|s| !s.is_empty());
        present(&self.username) && present(&self.password)
    }

    /// Initial auth mode: the API key if one is set, otherwise none until login
    pub fn auth_mode(&self) -> AuthMode {
        match &self.api_key {
            Some(key) if !key.is_empty() => AuthMode::ApiKey(key.clone()),
            _ => AuthMode::Unauthenticated,
        }
    }

    /// Walk options derived from `page_size` and `max_pages`
    pub fn walk_options(&self) -> WalkOptions {
        let options = WalkOptions::new().page_size(self.page_size);
        match self.max_pages {
            Some(max_pages) => options.max_pages(max_pages),
            None => options,
        }
    }

    /// HTTP client settings
    pub fn http_config(&self) -> HttpClientConfig {
        let builder = HttpClientConfig::builder()
            .base_url(&self.base_url)
            .timeout(Duration::from_secs(self.timeout_secs));
        match &self.user_agent {
            Some(agent) => builder.user_agent(agent).build(),
            None => builder.build(),
        }
    }
}

impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let redact = |v: &Option<String>| v.as_ref().map(|_| "***");
        f.debug_struct("ClientConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &redact(&self.api_key))
            .field("username", &self.username)
            .field("password", &redact(&self.password))
            .field("timeout_secs", &self.timeout_secs)
            .field("page_size", &self.page_size)
            .field("max_pages", &self.max_pages)
            .field("user_agent", &self.user_agent)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.base_url, "http://localhost:3000");
        assert_eq!(config.timeout_secs, 30);
        assert_eq!(config.page_size, 100);
        assert_eq!(config.max_pages, None);
        assert_eq!(config.auth_mode(), AuthMode::Unauthenticated);
        config.validate().unwrap();
    }

    #[test]
    fn test_parse_yaml() {
        let yaml = r#"
base_url: http://mps.local:3000
api_key: mps_0123456789abcdef0123456789abcdef
page_size: 250
max_pages: 40
"#;
        let config = ClientConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(config.base_url, "http://mps.local:3000");
        assert_eq!(config.page_size, 250);
        assert_eq!(config.max_pages, Some(40));
        assert_eq!(config.timeout_secs, 30);
        assert!(config.auth_mode().is_api_key());

        let walk = config.walk_options();
        assert_eq!(walk.page_size, 250);
        assert_eq!(walk.max_pages, Some(40));
    }

    #[test]
    fn test_parse_yaml_rejects_unknown_keys() {
        let err = ClientConfig::from_yaml_str("base_ulr: http://x\n").unwrap_err();
        assert!(matches!(err, Error::YamlParse(_)));
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "username: production\npassword: password123").unwrap();

        let config = ClientConfig::from_file(file.path()).unwrap();
        assert_eq!(config.username.as_deref(), Some("production"));
        assert!(config.has_credentials());
        assert_eq!(config.auth_mode(), AuthMode::Unauthenticated);
    }

    #[test]
    fn test_from_missing_file() {
        let err = ClientConfig::from_file("/nonexistent/mps.yaml").unwrap_err();
        assert!(err.to_string().contains("Failed to read config"));
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("MPS_BASE_URL", ""),
            ("API_BASE_URL", "http://fallback:3000"),
            ("API_KEY", "mps_ffffffffffffffffffffffffffffffff"),
            ("MPS_USERNAME", "warehouse"),
        ]
        .into_iter()
        .collect();

        let mut config = ClientConfig::from_yaml_str("base_url: http://file:3000\n").unwrap();
        config.apply_env_from(|name| env.get(name).map(|v| v.to_string()));

        assert_eq!(config.base_url, "http://fallback:3000");
        assert_eq!(
            config.api_key.as_deref(),
            Some("mps_ffffffffffffffffffffffffffffffff")
        );
        assert_eq!(config.username.as_deref(), Some("warehouse"));
        assert_eq!(config.password, None);
    }

    #[test]
    fn test_env_prefers_mps_prefix() {
        let env: HashMap<&str, &str> = [
            ("MPS_API_KEY", "mps_11111111111111111111111111111111"),
            ("API_KEY", "mps_22222222222222222222222222222222"),
        ]
        .into_iter()
        .collect();

        let mut config = ClientConfig::default();
        config.apply_env_from(|name| env.get(name).map(|v| v.to_string()));
        assert_eq!(
            config.api_key.as_deref(),
            Some("mps_11111111111111111111111111111111")
        );
    }

    #[test]
    fn test_validate() {
        let config = ClientConfig {
            base_url: "not a url".to_string(),
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(Error::InvalidUrl(_))));

        let config = ClientConfig {
            base_url: "ftp://mps.local".to_string(),
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(Error::Config { .. })));

        let config = ClientConfig {
            page_size: 0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(Error::Config { .. })));

        let config = ClientConfig {
            max_pages: Some(0),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_http_config() {
        let config = ClientConfig {
            timeout_secs: 5,
            user_agent: Some("mps-sync/2.0".to_string()),
            ..Default::default()
        };
        let http = config.http_config();
        assert_eq!(http.base_url.as_deref(), Some("http://localhost:3000"));
        assert_eq!(http.timeout, Duration::from_secs(5));
        assert_eq!(http.user_agent, "mps-sync/2.0");
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let config = ClientConfig {
            api_key: Some("mps_secret".to_string()),
            password: Some("hunter2".to_string()),
            ..Default::default()
        };
        let debug = format!("{config:?}");
        assert!(!debug.contains("mps_secret"));
        assert!(!debug.contains("hunter2"));
    }
}
