//! Reactive re-authentication
//!
//! When the Teams API answers 401 the failed call is reported to the user
//! as-is and a login is started in the background, so the user can retry
//! once it completes. The original request is never replayed.

use std::sync::{Arc, Mutex, PoisonError};

use log::{debug, warn};
use tokio::task::JoinHandle;

use crate::auth::SessionManager;

/// One-shot background logins triggered by unauthorized responses
pub struct ReactiveReauth {
    session: Arc<SessionManager>,
    pending: Mutex<Vec<JoinHandle<()>>>,
}

impl ReactiveReauth {
    pub fn new(session: Arc<SessionManager>) -> Self {
        Self {
            session,
            pending: Mutex::new(Vec::new()),
        }
    }

    /// Start a login without waiting for it
    pub fn trigger(&self) {
        debug!("Unauthorized response, starting re-authentication");
        let session = self.session.clone();
        let handle = tokio::spawn(async move {
            if let Err(e) = session.login().await {
                warn!("Re-authentication failed: {}", e);
            }
        });
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(handle);
    }

    /// Number of logins started and not yet awaited by [`settle`](Self::settle)
    pub fn pending(&self) -> usize {
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Wait for every started login to finish
    pub async fn settle(&self) {
        let handles: Vec<JoinHandle<()>> = std::mem::take(
            &mut *self.pending.lock().unwrap_or_else(PoisonError::into_inner),
        );
        for handle in handles {
            if let Err(e) = handle.await {
                warn!("Re-authentication task did not complete: {}", e);
            }
        }
    }
}
