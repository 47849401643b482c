//! Configuration management for teamctl

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::error::{ConfigError, Result};

/// Default Teams API base URL
pub const DEFAULT_API_URL: &str = "http://teams-api.127.0.0.1.sslip.io";

/// Default identity broker base URL
pub const DEFAULT_BROKER_URL: &str = "http://platform-auth.127.0.0.1.sslip.io";

/// Default broker realm
pub const DEFAULT_REALM: &str = "teams";

/// Default broker client identifier
pub const DEFAULT_CLIENT_ID: &str = "teams-ui";

const CONFIG_DIR: &str = ".teamctl";
const CONFIG_FILE: &str = "config.yaml";
const SESSION_FILE: &str = "session.yaml";

/// Application configuration
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Config {
    /// Teams API base URL
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Identity broker settings
    #[serde(default)]
    pub broker: BrokerConfig,
}

/// Identity broker connection settings
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BrokerConfig {
    /// Broker base URL
    #[serde(default = "default_broker_url")]
    pub url: String,

    /// Realm identifier
    #[serde(default = "default_realm")]
    pub realm: String,

    /// Public client identifier
    #[serde(default = "default_client_id")]
    pub client_id: String,
}

fn default_api_url() -> String {
    DEFAULT_API_URL.to_string()
}

fn default_broker_url() -> String {
    DEFAULT_BROKER_URL.to_string()
}

fn default_realm() -> String {
    DEFAULT_REALM.to_string()
}

fn default_client_id() -> String {
    DEFAULT_CLIENT_ID.to_string()
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            url: default_broker_url(),
            realm: default_realm(),
            client_id: default_client_id(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            broker: BrokerConfig::default(),
        }
    }
}

impl BrokerConfig {
    /// OpenID Connect endpoint base for the configured realm
    pub fn oidc_base(&self) -> String {
        format!(
            "{}/realms/{}/protocol/openid-connect",
            self.url.trim_end_matches('/'),
            self.realm
        )
    }
}

/// Values taken from CLI flags or environment variables.
///
/// Anything set here wins over the config file.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub api_url: Option<String>,
    pub broker_url: Option<String>,
    pub realm: Option<String>,
    pub client_id: Option<String>,
}

impl Config {
    /// Get the default config file path
    pub fn default_path() -> Result<PathBuf> {
        let home = dirs::home_dir().ok_or(ConfigError::Invalid(
            "Could not determine home directory".to_string(),
        ))?;

        Ok(home.join(CONFIG_DIR).join(CONFIG_FILE))
    }

    /// Resolve the config file path, honoring an explicit override
    pub fn resolve_path(path: Option<&str>) -> Result<PathBuf> {
        match path {
            Some(p) => Ok(PathBuf::from(p)),
            None => Self::default_path(),
        }
    }

    /// Path of the broker session file that lives next to the config file
    pub fn session_path(config_path: &Path) -> PathBuf {
        config_path
            .parent()
            .map(|dir| dir.join(SESSION_FILE))
            .unwrap_or_else(|| PathBuf::from(SESSION_FILE))
    }

    /// Load configuration, falling back to defaults when no file exists
    pub fn load_at(path: Option<&str>) -> Result<Self> {
        let path = Self::resolve_path(path)?;
        if !path.exists() {
            log::debug!("No config file at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        Self::load_from(&path)
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&contents).map_err(ConfigError::from)?;
        config.validate()?;
        Ok(config)
    }

    /// Apply CLI/environment overrides on top of the loaded values
    pub fn with_overrides(mut self, overrides: &ConfigOverrides) -> Result<Self> {
        if let Some(ref url) = overrides.api_url {
            self.api_url = url.clone();
        }
        if let Some(ref url) = overrides.broker_url {
            self.broker.url = url.clone();
        }
        if let Some(ref realm) = overrides.realm {
            self.broker.realm = realm.clone();
        }
        if let Some(ref client_id) = overrides.client_id {
            self.broker.client_id = client_id.clone();
        }
        self.validate()?;
        Ok(self)
    }

    /// Validate that URLs and identifiers are usable
    pub fn validate(&self) -> Result<()> {
        for (field, url) in [("api_url", &self.api_url), ("broker.url", &self.broker.url)] {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(ConfigError::Invalid(format!(
                    "{} must be an http(s) URL, got '{}'",
                    field, url
                ))
                .into());
            }
        }
        if self.broker.realm.trim().is_empty() {
            return Err(ConfigError::Invalid("broker.realm is empty".to_string()).into());
        }
        if self.broker.client_id.trim().is_empty() {
            return Err(ConfigError::Invalid("broker.client_id is empty".to_string()).into());
        }
        Ok(())
    }
}

/// Write a file readable only by the current user, creating parent directories
pub fn write_private(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    std::fs::write(path, contents)?;

    // Set file permissions to 600 on Unix systems
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mut perms = std::fs::metadata(path)?.permissions();
        perms.set_mode(0o600);
        std::fs::set_permissions(path, perms)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.api_url, DEFAULT_API_URL);
        assert_eq!(config.broker.realm, "teams");
        assert_eq!(config.broker.client_id, "teams-ui");
    }

    #[test]
    fn test_oidc_base_strips_trailing_slash() {
        let broker = BrokerConfig {
            url: "https://auth.example.com/".to_string(),
            realm: "teams".to_string(),
            client_id: "teams-ui".to_string(),
        };
        assert_eq!(
            broker.oidc_base(),
            "https://auth.example.com/realms/teams/protocol/openid-connect"
        );
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("missing.yaml");
        let config = Config::load_at(path.to_str()).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("config.yaml");
        std::fs::write(&path, "api_url: https://api.example.com\nbroker:\n  realm: staff\n")
            .unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.api_url, "https://api.example.com");
        assert_eq!(config.broker.realm, "staff");
        assert_eq!(config.broker.url, DEFAULT_BROKER_URL);
        assert_eq!(config.broker.client_id, DEFAULT_CLIENT_ID);
    }

    #[test]
    fn test_write_private_creates_parents_with_owner_only_mode() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("nested").join("session.yaml");

        write_private(&path, "access_token: tok\n").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "access_token: tok\n");

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = std::fs::metadata(&path).unwrap().permissions().mode();
            assert_eq!(mode & 0o777, 0o600);
        }
    }

    #[test]
    fn test_overrides_win_over_file_values() {
        let overrides = ConfigOverrides {
            api_url: Some("http://localhost:8000".to_string()),
            realm: Some("dev".to_string()),
            ..Default::default()
        };

        let config = Config::default().with_overrides(&overrides).unwrap();
        assert_eq!(config.api_url, "http://localhost:8000");
        assert_eq!(config.broker.realm, "dev");
        assert_eq!(config.broker.client_id, DEFAULT_CLIENT_ID);
    }

    #[test]
    fn test_invalid_api_url_rejected() {
        let overrides = ConfigOverrides {
            api_url: Some("teams-api.local".to_string()),
            ..Default::default()
        };
        assert!(Config::default().with_overrides(&overrides).is_err());
    }

    #[test]
    fn test_session_path_is_sibling_of_config() {
        let path = PathBuf::from("/home/user/.teamctl/config.yaml");
        assert_eq!(
            Config::session_path(&path),
            PathBuf::from("/home/user/.teamctl/session.yaml")
        );
    }
}
