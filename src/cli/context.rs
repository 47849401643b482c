//! Command execution context
//!
//! Owns the session state for one invocation: built once in `main`,
//! handed to every command, and torn down explicitly with
//! [`AppContext::shutdown`].

use std::sync::Arc;

use log::{debug, warn};

use crate::auth::{IdentityBroker, KeycloakBroker, SessionManager};
use crate::cli::{GlobalOptions, OutputFormat};
use crate::client::{ReactiveReauth, TeamsClient};
use crate::config::Config;
use crate::error::Result;

/// Context for command execution containing the session and API client.
pub struct AppContext {
    /// Cached login state in front of the identity broker
    pub session: Arc<SessionManager>,
    /// Background login triggered by unauthorized API responses
    pub reauth: Arc<ReactiveReauth>,
    /// Teams API client
    pub teams: TeamsClient,
    /// Output format preference
    pub format: OutputFormat,
}

impl AppContext {
    /// Load config, initialize the broker and populate the session.
    ///
    /// A broker that fails to initialize is not fatal: the session starts
    /// logged out and commands that need a token report it.
    ///
    /// # Errors
    /// Returns error if the config file cannot be read or is invalid.
    pub async fn init(opts: &GlobalOptions) -> Result<Self> {
        let path = Config::resolve_path(opts.config_ref())?;
        let config = Config::load_at(opts.config_ref())?.with_overrides(&opts.overrides())?;

        let broker = KeycloakBroker::new(config.broker.clone())?
            .with_storage(Config::session_path(&path));
        match broker.init() {
            Ok(logged_in) => debug!("Broker initialized (logged in: {})", logged_in),
            Err(e) => warn!("Identity broker initialization failed: {}", e),
        }

        Self::with_broker(config, Arc::new(broker), opts.format).await
    }

    /// Build a context around an already constructed broker
    pub async fn with_broker(
        config: Config,
        broker: Arc<dyn IdentityBroker>,
        format: OutputFormat,
    ) -> Result<Self> {
        let session = SessionManager::start(broker).await;
        let reauth = Arc::new(ReactiveReauth::new(session.clone()));
        let teams = TeamsClient::new(&config.api_url, session.clone(), reauth.clone())?;

        Ok(Self {
            session,
            reauth,
            teams,
            format,
        })
    }

    /// Wait for any login started by an unauthorized response
    pub async fn shutdown(&self) {
        let pending = self.reauth.pending();
        if pending > 0 {
            debug!("Waiting for {} pending login(s)", pending);
        }
        self.reauth.settle().await;
    }
}
