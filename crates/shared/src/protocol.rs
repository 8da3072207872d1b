use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::{PairingId, UserId};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterAccountRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePairingRequest {
    pub partner_id: UserId,
}

/// One row of the caller's weekly history as served by the pairing service.
/// Dates are day-granular, `YYYY-MM-DD` on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PairingRecord {
    #[serde(rename = "id")]
    pub pairing_id: PairingId,
    pub partner_id: UserId,
    pub partner_name: String,
    pub pair_date: NaiveDate,
}

/// Creation response: the stored pair row carries both member ids, lowest
/// first, and no display names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredPair {
    #[serde(rename = "id")]
    pub pair_id: PairingId,
    pub user_id_1: UserId,
    pub user_id_2: UserId,
    pub pair_date: NaiveDate,
}
