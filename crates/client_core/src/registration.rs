use std::sync::Arc;

use shared::{domain::User, error::ClientError, protocol::PairingRecord};
use tokio::sync::{broadcast, Mutex};
use tracing::warn;

use crate::{
    resolver::{resolve_today_pair, TodayPair},
    ClientEvent, Clock, DirectoryClient, PairingClient, SessionManager,
};

#[derive(Default)]
struct FlowState {
    selection: Option<User>,
    today_pair: Option<PairingRecord>,
}

/// Orchestrates candidate selection and submission. The gate derived from
/// history decides whether a submission is attempted at all; the pairing
/// service remains authoritative for the daily invariant, so a stale gate
/// can only produce a rejected duplicate, never a second record.
pub struct RegistrationFlow {
    directory: DirectoryClient,
    pairing: PairingClient,
    session: Arc<SessionManager>,
    clock: Arc<dyn Clock>,
    inner: Mutex<FlowState>,
    events: broadcast::Sender<ClientEvent>,
}

impl RegistrationFlow {
    pub fn new(
        directory: DirectoryClient,
        pairing: PairingClient,
        session: Arc<SessionManager>,
        clock: Arc<dyn Clock>,
        events: broadcast::Sender<ClientEvent>,
    ) -> Self {
        Self {
            directory,
            pairing,
            session,
            clock,
            inner: Mutex::new(FlowState::default()),
            events,
        }
    }

    /// The roster minus the caller. Only genuinely empty when the directory
    /// contains nobody but the caller.
    pub async fn available_partners(&self) -> Result<Vec<User>, ClientError> {
        let me = self.session.current_user().await?;
        let roster = self.directory.list_users().await?;
        Ok(roster.into_iter().filter(|user| user.id != me.id).collect())
    }

    pub async fn select(&self, partner: User) {
        self.inner.lock().await.selection = Some(partner);
    }

    pub async fn clear_selection(&self) {
        self.inner.lock().await.selection = None;
    }

    pub async fn selection(&self) -> Option<User> {
        self.inner.lock().await.selection.clone()
    }

    pub async fn today_pair(&self) -> Option<PairingRecord> {
        self.inner.lock().await.today_pair.clone()
    }

    /// Re-derives the gate from a fresh history fetch. An upstream
    /// uniqueness violation is surfaced on the event channel and returned to
    /// the caller, never swallowed.
    pub async fn refresh_gate(&self) -> Result<TodayPair, ClientError> {
        let epoch = self.session.epoch();
        let history = self.pairing.list_history().await?;
        if self.session.epoch() != epoch {
            // The session ended while the fetch was in flight; this result
            // belongs to the old session and must not land in the new one.
            return Err(ClientError::Unauthorized);
        }

        let resolved = resolve_today_pair(&history, self.clock.today());
        self.inner.lock().await.today_pair = resolved.record.clone();
        if let Some(violation) = &resolved.violation {
            warn!("today-pair resolution anomaly: {violation}");
            let _ = self.events.send(ClientEvent::Error(
                ClientError::ConsistencyViolation(violation.clone()).to_string(),
            ));
        }
        let _ = self.events.send(ClientEvent::GateResolved {
            today_pair: resolved.record.clone(),
        });
        Ok(resolved)
    }

    /// Submits the current selection. Rejected without a network call when
    /// the gate already shows a pair for today or nothing is selected. On
    /// success the selection is cleared, history is re-fetched so the gate
    /// reflects the server's view, and `PairingCreated` is published. On
    /// failure the selection survives for a retry.
    pub async fn submit(&self) -> Result<PairingRecord, ClientError> {
        let partner = {
            let guard = self.inner.lock().await;
            if guard.today_pair.is_some() {
                return Err(ClientError::DuplicateForToday);
            }
            guard
                .selection
                .clone()
                .ok_or_else(|| ClientError::InvalidPartner("no partner selected".to_string()))?
        };

        let record = self.pairing.create_pairing(&partner).await?;

        {
            let mut guard = self.inner.lock().await;
            guard.selection = None;
            guard.today_pair = Some(record.clone());
        }

        // The locally stored record closes the gate immediately; the
        // re-fetch below reconciles it with the server before anything else
        // trusts the gate again.
        if let Err(err) = self.refresh_gate().await {
            let _ = self.events.send(ClientEvent::Error(format!(
                "pairing registered but gate refresh failed: {err}"
            )));
        }

        let _ = self.events.send(ClientEvent::PairingCreated {
            record: record.clone(),
        });

        Ok(record)
    }
}
