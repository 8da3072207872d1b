use std::sync::Arc;

use async_trait::async_trait;
use shared::{
    domain::{User, UserId},
    error::ClientError,
    protocol::{PairingRecord, StoredPair},
};
use tokio::sync::broadcast;

pub mod clock;
pub mod directory;
pub mod http;
pub mod pairing;
pub mod registration;
pub mod resolver;
pub mod session;
pub mod views;

pub use clock::{Clock, SystemClock};
pub use directory::DirectoryClient;
pub use http::{HttpAuthDirectoryService, HttpPairingRecordService};
pub use pairing::PairingClient;
pub use registration::RegistrationFlow;
pub use resolver::{resolve_today_pair, TodayPair};
pub use session::{SessionManager, SessionSnapshot, SessionState};
pub use views::{HistoryView, UnpairedRosterView, ViewState};

/// Authentication & Directory Service boundary. Abstract over transport so
/// flows can be exercised against in-process doubles.
#[async_trait]
pub trait AuthDirectoryService: Send + Sync {
    async fn authenticate(&self, email: &str, password: &str) -> Result<String, ClientError>;
    async fn register_account(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<String, ClientError>;
    async fn resolve_identity(&self, token: &str) -> Result<User, ClientError>;
    async fn list_users(&self, token: &str) -> Result<Vec<User>, ClientError>;
    async fn list_unpaired(&self, token: &str) -> Result<Vec<User>, ClientError>;
}

/// Pairing Record Service boundary. The unpaired roster is computed
/// server-side (see `AuthDirectoryService::list_unpaired`) so client and
/// server never disagree on what "today" means for that set.
#[async_trait]
pub trait PairingRecordService: Send + Sync {
    async fn list_weekly_history(&self, token: &str) -> Result<Vec<PairingRecord>, ClientError>;
    async fn create_pairing(
        &self,
        token: &str,
        partner_id: UserId,
    ) -> Result<StoredPair, ClientError>;
}

/// Durable store for the single persisted bearer credential.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn load_token(&self) -> anyhow::Result<Option<String>>;
    async fn store_token(&self, token: &str) -> anyhow::Result<()>;
    async fn clear_token(&self) -> anyhow::Result<()>;
}

#[async_trait]
impl CredentialStore for storage::Storage {
    async fn load_token(&self) -> anyhow::Result<Option<String>> {
        self.load_credential(storage::SESSION_TOKEN_KEY).await
    }

    async fn store_token(&self, token: &str) -> anyhow::Result<()> {
        self.store_credential(storage::SESSION_TOKEN_KEY, token).await
    }

    async fn clear_token(&self) -> anyhow::Result<()> {
        self.clear_credential(storage::SESSION_TOKEN_KEY).await
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEndReason {
    Logout,
    TokenRejected,
}

/// Events published by the core. Presentation layers subscribe for
/// notifications; dependent views subscribe to stay consistent after
/// mutations.
#[derive(Debug, Clone)]
pub enum ClientEvent {
    SessionEstablished { user: User },
    SessionEnded { reason: SessionEndReason },
    PairingCreated { record: PairingRecord },
    GateResolved { today_pair: Option<PairingRecord> },
    Error(String),
}

/// Wires the session manager, clients, registration flow and views around
/// one event channel.
pub struct PairBoard {
    session: Arc<SessionManager>,
    directory: DirectoryClient,
    pairing: PairingClient,
    registration: Arc<RegistrationFlow>,
    history: Arc<HistoryView>,
    unpaired: Arc<UnpairedRosterView>,
    events: broadcast::Sender<ClientEvent>,
}

impl PairBoard {
    pub fn new(
        auth: Arc<dyn AuthDirectoryService>,
        pairing_service: Arc<dyn PairingRecordService>,
        credentials: Arc<dyn CredentialStore>,
        clock: Arc<dyn Clock>,
    ) -> Arc<Self> {
        let (events, _) = broadcast::channel(256);
        let session = SessionManager::new(Arc::clone(&auth), credentials, events.clone());
        let directory = DirectoryClient::new(auth, Arc::clone(&session));
        let pairing = PairingClient::new(pairing_service, Arc::clone(&session));
        let registration = Arc::new(RegistrationFlow::new(
            directory.clone(),
            pairing.clone(),
            Arc::clone(&session),
            clock,
            events.clone(),
        ));
        let history = Arc::new(HistoryView::new(pairing.clone(), Arc::clone(&session)));
        let unpaired = Arc::new(UnpairedRosterView::new(
            directory.clone(),
            Arc::clone(&session),
        ));
        Arc::new(Self {
            session,
            directory,
            pairing,
            registration,
            history,
            unpaired,
            events,
        })
    }

    pub fn session(&self) -> &Arc<SessionManager> {
        &self.session
    }

    pub fn directory(&self) -> &DirectoryClient {
        &self.directory
    }

    pub fn pairing(&self) -> &PairingClient {
        &self.pairing
    }

    pub fn registration(&self) -> &Arc<RegistrationFlow> {
        &self.registration
    }

    pub fn history(&self) -> &Arc<HistoryView> {
        &self.history
    }

    pub fn unpaired(&self) -> &Arc<UnpairedRosterView> {
        &self.unpaired
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<ClientEvent> {
        self.events.subscribe()
    }

    /// Keeps dependent views consistent after mutations: a created pairing
    /// re-fetches the history snapshot without a manual refresh trigger.
    pub fn spawn_view_refresh(self: &Arc<Self>) -> tokio::task::JoinHandle<()> {
        let board = Arc::clone(self);
        let mut events = self.events.subscribe();
        tokio::spawn(async move {
            while let Ok(event) = events.recv().await {
                if let ClientEvent::PairingCreated { .. } = event {
                    if let Err(err) = board.history.refresh().await {
                        let _ = board.events.send(ClientEvent::Error(format!(
                            "history refresh after pairing failed: {err}"
                        )));
                    }
                }
            }
        })
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
