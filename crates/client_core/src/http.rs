use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use shared::{
    domain::{User, UserId},
    error::{ClientError, ErrorDetail},
    protocol::{
        CreatePairingRequest, LoginRequest, PairingRecord, RegisterAccountRequest, StoredPair,
        TokenResponse,
    },
};
use url::Url;

/// Shared request plumbing for both HTTP service bindings.
#[derive(Clone, Debug)]
struct HttpBase {
    http: Client,
    base_url: String,
}

impl HttpBase {
    fn new(base_url: &str) -> Result<Self, ClientError> {
        let parsed = Url::parse(base_url).map_err(|err| {
            ClientError::Unreachable(format!("invalid server url '{base_url}': {err}"))
        })?;
        if parsed.scheme() != "http" && parsed.scheme() != "https" {
            return Err(ClientError::Unreachable(format!(
                "server url must be http or https, got '{base_url}'"
            )));
        }
        Ok(Self {
            http: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    async fn get_authed<T: DeserializeOwned>(
        &self,
        path: &str,
        token: &str,
    ) -> Result<T, ClientError> {
        let response = self
            .http
            .get(self.endpoint(path))
            .bearer_auth(token)
            .send()
            .await
            .map_err(transport_error)?;
        match response.status() {
            status if status.is_success() => response.json().await.map_err(transport_error),
            StatusCode::UNAUTHORIZED => Err(ClientError::Unauthorized),
            status => Err(unexpected_status(status, read_detail(response).await)),
        }
    }
}

fn transport_error(err: reqwest::Error) -> ClientError {
    ClientError::Unreachable(err.to_string())
}

fn unexpected_status(status: StatusCode, detail: String) -> ClientError {
    // The core only distinguishes failed from succeeded; statuses outside
    // the taxonomy collapse into the transport bucket with their detail.
    ClientError::Unreachable(format!("unexpected status {status}: {detail}"))
}

async fn read_detail(response: reqwest::Response) -> String {
    match response.json::<ErrorDetail>().await {
        Ok(body) => body.detail,
        Err(_) => "request rejected by server".to_string(),
    }
}

fn classify_pairing_rejection(detail: String) -> ClientError {
    if detail.to_ascii_lowercase().contains("you have already paired") {
        ClientError::DuplicateForToday
    } else {
        ClientError::InvalidPartner(detail)
    }
}

/// Authentication & Directory Service over HTTP.
#[derive(Clone, Debug)]
pub struct HttpAuthDirectoryService {
    base: HttpBase,
}

impl HttpAuthDirectoryService {
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        Ok(Self {
            base: HttpBase::new(base_url)?,
        })
    }

    /// Unauthenticated liveness probe, for telling "server up, credentials
    /// bad" apart from "server unreachable".
    pub async fn health(&self) -> Result<(), ClientError> {
        let response = self
            .base
            .http
            .get(self.base.endpoint("/healthz"))
            .send()
            .await
            .map_err(transport_error)?;
        if response.status().is_success() {
            Ok(())
        } else {
            Err(ClientError::Unreachable(format!(
                "health check returned {}",
                response.status()
            )))
        }
    }
}

#[async_trait]
impl crate::AuthDirectoryService for HttpAuthDirectoryService {
    async fn authenticate(&self, email: &str, password: &str) -> Result<String, ClientError> {
        let response = self
            .base
            .http
            .post(self.base.endpoint("/api/login"))
            .json(&LoginRequest {
                email: email.to_string(),
                password: password.to_string(),
            })
            .send()
            .await
            .map_err(transport_error)?;
        match response.status() {
            status if status.is_success() => {
                let body: TokenResponse = response.json().await.map_err(transport_error)?;
                Ok(body.access_token)
            }
            StatusCode::UNAUTHORIZED => {
                Err(ClientError::InvalidCredentials(read_detail(response).await))
            }
            status => Err(unexpected_status(status, read_detail(response).await)),
        }
    }

    async fn register_account(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<String, ClientError> {
        let response = self
            .base
            .http
            .post(self.base.endpoint("/api/register"))
            .json(&RegisterAccountRequest {
                name: name.to_string(),
                email: email.to_string(),
                password: password.to_string(),
            })
            .send()
            .await
            .map_err(transport_error)?;
        match response.status() {
            status if status.is_success() => {
                let body: TokenResponse = response.json().await.map_err(transport_error)?;
                Ok(body.access_token)
            }
            StatusCode::BAD_REQUEST | StatusCode::UNAUTHORIZED => {
                Err(ClientError::InvalidCredentials(read_detail(response).await))
            }
            status => Err(unexpected_status(status, read_detail(response).await)),
        }
    }

    async fn resolve_identity(&self, token: &str) -> Result<User, ClientError> {
        self.base.get_authed("/api/users/me", token).await
    }

    async fn list_users(&self, token: &str) -> Result<Vec<User>, ClientError> {
        self.base.get_authed("/api/users", token).await
    }

    async fn list_unpaired(&self, token: &str) -> Result<Vec<User>, ClientError> {
        self.base.get_authed("/api/users/unpaired", token).await
    }
}

/// Pairing Record Service over HTTP.
#[derive(Clone)]
pub struct HttpPairingRecordService {
    base: HttpBase,
}

impl HttpPairingRecordService {
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        Ok(Self {
            base: HttpBase::new(base_url)?,
        })
    }
}

#[async_trait]
impl crate::PairingRecordService for HttpPairingRecordService {
    async fn list_weekly_history(&self, token: &str) -> Result<Vec<PairingRecord>, ClientError> {
        self.base.get_authed("/api/pairs/history", token).await
    }

    async fn create_pairing(
        &self,
        token: &str,
        partner_id: UserId,
    ) -> Result<StoredPair, ClientError> {
        let response = self
            .base
            .http
            .post(self.base.endpoint("/api/pairs"))
            .bearer_auth(token)
            .json(&CreatePairingRequest { partner_id })
            .send()
            .await
            .map_err(transport_error)?;
        match response.status() {
            status if status.is_success() => response.json().await.map_err(transport_error),
            StatusCode::UNAUTHORIZED => Err(ClientError::Unauthorized),
            StatusCode::BAD_REQUEST | StatusCode::NOT_FOUND => {
                Err(classify_pairing_rejection(read_detail(response).await))
            }
            status => Err(unexpected_status(status, read_detail(response).await)),
        }
    }
}

#[cfg(test)]
#[path = "tests/http_tests.rs"]
mod tests;
