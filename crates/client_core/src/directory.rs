use std::sync::Arc;

use shared::{domain::User, error::ClientError};

use crate::{AuthDirectoryService, SessionManager};

/// Roster and identity lookups against the directory service, scoped to the
/// current session's token.
#[derive(Clone)]
pub struct DirectoryClient {
    service: Arc<dyn AuthDirectoryService>,
    session: Arc<SessionManager>,
}

impl DirectoryClient {
    pub fn new(service: Arc<dyn AuthDirectoryService>, session: Arc<SessionManager>) -> Self {
        Self { service, session }
    }

    pub async fn list_users(&self) -> Result<Vec<User>, ClientError> {
        let token = self.session.current_token().await?;
        let result = self.service.list_users(&token).await;
        self.session.absorb(result).await
    }

    pub async fn current_user(&self) -> Result<User, ClientError> {
        let token = self.session.current_token().await?;
        let result = self.service.resolve_identity(&token).await;
        self.session.absorb(result).await
    }

    /// Today's unpaired set as computed by the pairing service. The client
    /// never recomputes this from raw history; the server's clock is the
    /// only "today" that counts for the roster.
    pub async fn list_unpaired(&self) -> Result<Vec<User>, ClientError> {
        let token = self.session.current_token().await?;
        let result = self.service.list_unpaired(&token).await;
        self.session.absorb(result).await
    }
}
