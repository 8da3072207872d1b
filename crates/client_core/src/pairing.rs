use std::sync::Arc;

use shared::{
    domain::User,
    error::ClientError,
    protocol::PairingRecord,
};
use tracing::info;

use crate::{PairingRecordService, SessionManager};

/// Pairing record creation and history queries, scoped to the current
/// session's token.
#[derive(Clone)]
pub struct PairingClient {
    service: Arc<dyn PairingRecordService>,
    session: Arc<SessionManager>,
}

impl PairingClient {
    pub fn new(service: Arc<dyn PairingRecordService>, session: Arc<SessionManager>) -> Self {
        Self { service, session }
    }

    /// The caller's records for the current week (Monday-Sunday, service
    /// clock), newest first as served.
    pub async fn list_history(&self) -> Result<Vec<PairingRecord>, ClientError> {
        let token = self.session.current_token().await?;
        let result = self.service.list_weekly_history(&token).await;
        self.session.absorb(result).await
    }

    /// Submits today's pairing. Self-pairing is rejected before any network
    /// call; the service stays authoritative for everything else, including
    /// the one-pair-per-day invariant.
    pub async fn create_pairing(&self, partner: &User) -> Result<PairingRecord, ClientError> {
        let me = self.session.current_user().await?;
        if partner.id == me.id {
            return Err(ClientError::InvalidPartner(
                "cannot pair with yourself".to_string(),
            ));
        }

        let token = self.session.current_token().await?;
        let result = self.service.create_pairing(&token, partner.id).await;
        let stored = self.session.absorb(result).await?;

        let partner_id = if stored.user_id_1 == me.id {
            stored.user_id_2
        } else {
            stored.user_id_1
        };
        if partner_id != partner.id {
            return Err(ClientError::ConsistencyViolation(format!(
                "created pairing references partner {} instead of {}",
                partner_id.0, partner.id.0
            )));
        }

        info!(partner_id = partner.id.0, date = %stored.pair_date, "pairing registered");
        Ok(PairingRecord {
            pairing_id: stored.pair_id,
            partner_id,
            partner_name: partner.name.clone(),
            pair_date: stored.pair_date,
        })
    }
}
