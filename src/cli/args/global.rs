//! Global CLI options shared across all commands
//!
//! Consolidates the global flags into one struct so handlers and the
//! application context take a single argument.

use crate::cli::{Cli, OutputFormat};
use crate::config::ConfigOverrides;

/// Global CLI options passed to all command handlers.
///
/// # Precedence
///
/// CLI flag > environment variable > config file > default. This struct
/// captures the CLI/env layer; the config file is merged in `AppContext`.
#[derive(Debug, Clone, Default)]
pub struct GlobalOptions {
    /// Output format (table, json)
    pub format: OutputFormat,

    /// Custom config file path (defaults to ~/.teamctl/config.yaml)
    pub config: Option<String>,

    /// Teams API base URL override
    pub api_url: Option<String>,

    /// Identity broker URL override
    pub broker_url: Option<String>,

    /// Realm override
    pub realm: Option<String>,

    /// Client ID override
    pub client_id: Option<String>,
}

impl GlobalOptions {
    /// Create GlobalOptions from a parsed CLI struct.
    pub fn from_cli(cli: &Cli) -> Self {
        Self {
            format: cli.format,
            config: cli.config.clone(),
            api_url: cli.api_url.clone(),
            broker_url: cli.broker_url.clone(),
            realm: cli.realm.clone(),
            client_id: cli.client_id.clone(),
        }
    }

    /// Get config path as `Option<&str>`.
    pub fn config_ref(&self) -> Option<&str> {
        self.config.as_deref()
    }

    /// Config values set on the command line or in the environment
    pub fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            api_url: self.api_url.clone(),
            broker_url: self.broker_url.clone(),
            realm: self.realm.clone(),
            client_id: self.client_id.clone(),
        }
    }
}
