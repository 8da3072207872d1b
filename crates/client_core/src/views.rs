use std::sync::Arc;

use shared::{domain::User, error::ClientError, protocol::PairingRecord};
use tokio::sync::Mutex;

use crate::{DirectoryClient, PairingClient, SessionManager};

/// Loading is distinct from an empty result: a view that has not completed
/// a fetch yet must not render as "nothing to show".
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewState<T> {
    Loading,
    Ready(T),
}

impl<T> ViewState<T> {
    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }

    pub fn ready(&self) -> Option<&T> {
        match self {
            Self::Ready(rows) => Some(rows),
            Self::Loading => None,
        }
    }
}

/// Read-only renderer over the caller's weekly history. Owns its snapshot;
/// refreshes independently of the other views.
pub struct HistoryView {
    pairing: PairingClient,
    session: Arc<SessionManager>,
    state: Mutex<ViewState<Vec<PairingRecord>>>,
}

impl HistoryView {
    pub fn new(pairing: PairingClient, session: Arc<SessionManager>) -> Self {
        Self {
            pairing,
            session,
            state: Mutex::new(ViewState::Loading),
        }
    }

    pub async fn state(&self) -> ViewState<Vec<PairingRecord>> {
        self.state.lock().await.clone()
    }

    pub async fn refresh(&self) -> Result<Vec<PairingRecord>, ClientError> {
        let epoch = self.session.epoch();
        *self.state.lock().await = ViewState::Loading;
        let records = self.pairing.list_history().await?;
        if self.session.epoch() != epoch {
            // Stale response from before a teardown; discard it rather than
            // apply it to whatever session exists now.
            return Err(ClientError::Unauthorized);
        }
        *self.state.lock().await = ViewState::Ready(records.clone());
        Ok(records)
    }
}

/// Read-only renderer over today's unpaired roster, as computed by the
/// pairing service.
pub struct UnpairedRosterView {
    directory: DirectoryClient,
    session: Arc<SessionManager>,
    state: Mutex<ViewState<Vec<User>>>,
}

impl UnpairedRosterView {
    pub fn new(directory: DirectoryClient, session: Arc<SessionManager>) -> Self {
        Self {
            directory,
            session,
            state: Mutex::new(ViewState::Loading),
        }
    }

    pub async fn state(&self) -> ViewState<Vec<User>> {
        self.state.lock().await.clone()
    }

    pub async fn refresh(&self) -> Result<Vec<User>, ClientError> {
        let epoch = self.session.epoch();
        *self.state.lock().await = ViewState::Loading;
        let users = self.directory.list_unpaired().await?;
        if self.session.epoch() != epoch {
            return Err(ClientError::Unauthorized);
        }
        *self.state.lock().await = ViewState::Ready(users.clone());
        Ok(users)
    }
}
