use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};

use shared::{domain::User, error::ClientError};
use tokio::sync::{broadcast, Mutex};
use tracing::{info, warn};

use crate::{AuthDirectoryService, ClientEvent, CredentialStore, SessionEndReason};

/// Resolved identity plus the bearer credential proving it. A snapshot only
/// exists while both halves are valid together.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub user: User,
    pub token: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Anonymous,
    Authenticated(SessionSnapshot),
}

impl SessionState {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated(_))
    }
}

/// Owns the authenticated identity and its lifecycle. All other components
/// read identity and token through this manager, and every `Unauthorized`
/// observed anywhere in the core is routed back here (`absorb`) so teardown
/// happens in exactly one place.
pub struct SessionManager {
    auth: Arc<dyn AuthDirectoryService>,
    credentials: Arc<dyn CredentialStore>,
    inner: Mutex<SessionState>,
    epoch: AtomicU64,
    events: broadcast::Sender<ClientEvent>,
}

impl SessionManager {
    pub fn new(
        auth: Arc<dyn AuthDirectoryService>,
        credentials: Arc<dyn CredentialStore>,
        events: broadcast::Sender<ClientEvent>,
    ) -> Arc<Self> {
        Arc::new(Self {
            auth,
            credentials,
            inner: Mutex::new(SessionState::Anonymous),
            epoch: AtomicU64::new(0),
            events,
        })
    }

    /// Monotonic counter bumped on every teardown. A result fetched under an
    /// older epoch must be discarded instead of applied to the current
    /// session's state.
    pub fn epoch(&self) -> u64 {
        self.epoch.load(Ordering::SeqCst)
    }

    pub async fn state(&self) -> SessionState {
        self.inner.lock().await.clone()
    }

    pub async fn current_token(&self) -> Result<String, ClientError> {
        match &*self.inner.lock().await {
            SessionState::Authenticated(snapshot) => Ok(snapshot.token.clone()),
            SessionState::Anonymous => Err(ClientError::Unauthorized),
        }
    }

    pub async fn current_user(&self) -> Result<User, ClientError> {
        match &*self.inner.lock().await {
            SessionState::Authenticated(snapshot) => Ok(snapshot.user.clone()),
            SessionState::Anonymous => Err(ClientError::Unauthorized),
        }
    }

    /// Rebuilds the session from the persisted credential, if any. Never
    /// fails: any resolution failure degrades to `Anonymous` and drops the
    /// stored token.
    pub async fn restore(&self) -> SessionState {
        let stored = match self.credentials.load_token().await {
            Ok(stored) => stored,
            Err(err) => {
                warn!("failed to read persisted credential: {err:#}");
                None
            }
        };
        let Some(token) = stored else {
            return SessionState::Anonymous;
        };

        match self.auth.resolve_identity(&token).await {
            Ok(user) => {
                let snapshot = SessionSnapshot {
                    user: user.clone(),
                    token,
                };
                *self.inner.lock().await = SessionState::Authenticated(snapshot.clone());
                info!(user_id = user.id.0, "session restored from persisted credential");
                let _ = self.events.send(ClientEvent::SessionEstablished { user });
                SessionState::Authenticated(snapshot)
            }
            Err(err) => {
                info!("persisted credential no longer usable, dropping it: {err}");
                if let Err(store_err) = self.credentials.clear_token().await {
                    warn!("failed to clear persisted credential: {store_err:#}");
                }
                *self.inner.lock().await = SessionState::Anonymous;
                SessionState::Anonymous
            }
        }
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<User, ClientError> {
        let token = self.auth.authenticate(email, password).await?;
        self.establish(token).await
    }

    /// Creates a directory account and continues as a successful login.
    pub async fn register_account(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<User, ClientError> {
        let token = self.auth.register_account(name, email, password).await?;
        self.establish(token).await
    }

    async fn establish(&self, token: String) -> Result<User, ClientError> {
        if let Err(err) = self.credentials.store_token(&token).await {
            warn!("failed to persist credential: {err:#}");
        }
        match self.auth.resolve_identity(&token).await {
            Ok(user) => {
                *self.inner.lock().await = SessionState::Authenticated(SessionSnapshot {
                    user: user.clone(),
                    token,
                });
                info!(user_id = user.id.0, "session established");
                let _ = self
                    .events
                    .send(ClientEvent::SessionEstablished { user: user.clone() });
                Ok(user)
            }
            Err(err) => {
                // The token was issued but the identity behind it could not
                // be resolved; no half-open session may survive this.
                self.teardown(SessionEndReason::TokenRejected).await;
                Err(err)
            }
        }
    }

    /// Clears credential and identity unconditionally; never fails.
    pub async fn logout(&self) {
        self.teardown(SessionEndReason::Logout).await;
    }

    /// Central `Unauthorized` policy: components pass every authenticated
    /// call result through here instead of tearing session state down
    /// themselves.
    pub async fn absorb<T>(&self, result: Result<T, ClientError>) -> Result<T, ClientError> {
        if let Err(err) = &result {
            if err.is_unauthorized() {
                self.teardown(SessionEndReason::TokenRejected).await;
            }
        }
        result
    }

    async fn teardown(&self, reason: SessionEndReason) {
        let was_authenticated = {
            let mut guard = self.inner.lock().await;
            let was = guard.is_authenticated();
            *guard = SessionState::Anonymous;
            was
        };
        self.epoch.fetch_add(1, Ordering::SeqCst);
        if let Err(err) = self.credentials.clear_token().await {
            warn!("failed to clear persisted credential: {err:#}");
        }
        if was_authenticated {
            info!(?reason, "session ended");
            let _ = self.events.send(ClientEvent::SessionEnded { reason });
        }
    }
}
