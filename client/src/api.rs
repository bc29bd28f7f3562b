//! Transport to the session store.
//!
//! [`SessionApi`] is the seam between the session client's state machine and
//! the network. [`HttpSessionApi`] speaks the HTTP contract; tests swap in
//! [`MockSessionApi`](crate::mocks::MockSessionApi).

use crate::config::ClientConfig;
use crate::error::ApiError;
use credit_meter_core::constants::{SESSION_HEADER, routes};
use credit_meter_core::{CreditInfo, CreditReceipt, SessionId, SessionInfo};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use std::future::Future;

/// The three session store operations.
pub trait SessionApi: Send + Sync {
    /// `POST /session/create`.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` on transport failure or a non-success status.
    fn create_session(&self) -> impl Future<Output = Result<SessionInfo, ApiError>> + Send;

    /// `GET /session/credits` for `session_id`.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::SessionNotFound` if the store does not know the
    /// session, other variants on transport or protocol failure.
    fn credits(
        &self,
        session_id: &SessionId,
    ) -> impl Future<Output = Result<CreditInfo, ApiError>> + Send;

    /// `POST /session/use-credit` for `session_id`.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::CreditsExhausted` when the balance is zero,
    /// `ApiError::SessionNotFound` if the store does not know the session.
    fn use_credit(
        &self,
        session_id: &SessionId,
    ) -> impl Future<Output = Result<CreditReceipt, ApiError>> + Send;
}

/// [`SessionApi`] over HTTP.
#[derive(Debug, Clone)]
pub struct HttpSessionApi {
    client: Client,
    config: ClientConfig,
}

impl HttpSessionApi {
    /// Create a transport with a fresh `reqwest::Client`.
    #[must_use]
    pub fn new(config: ClientConfig) -> Self {
        Self::with_client(Client::new(), config)
    }

    /// Create a transport sharing an existing `reqwest::Client`.
    #[must_use]
    pub const fn with_client(client: Client, config: ClientConfig) -> Self {
        Self { client, config }
    }

    /// Configuration in use.
    #[must_use]
    pub const fn config(&self) -> &ClientConfig {
        &self.config
    }
}

impl SessionApi for HttpSessionApi {
    async fn create_session(&self) -> Result<SessionInfo, ApiError> {
        let response = self
            .client
            .post(self.config.url(routes::CREATE_SESSION))
            .send()
            .await
            .map_err(|e| ApiError::RequestFailed(e.to_string()))?;

        decode(response).await
    }

    async fn credits(&self, session_id: &SessionId) -> Result<CreditInfo, ApiError> {
        let response = self
            .client
            .get(self.config.url(routes::CREDITS))
            .header(SESSION_HEADER, session_id.as_str())
            .send()
            .await
            .map_err(|e| ApiError::RequestFailed(e.to_string()))?;

        decode(response).await
    }

    async fn use_credit(&self, session_id: &SessionId) -> Result<CreditReceipt, ApiError> {
        let response = self
            .client
            .post(self.config.url(routes::USE_CREDIT))
            .header(SESSION_HEADER, session_id.as_str())
            .send()
            .await
            .map_err(|e| ApiError::RequestFailed(e.to_string()))?;

        decode(response).await
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
    let status = response.status();

    if status.is_success() {
        return response
            .json::<T>()
            .await
            .map_err(|e| ApiError::ResponseParseFailed(e.to_string()));
    }

    let body = response.text().await.unwrap_or_default();
    Err(ApiError::from_status(status.as_u16(), &body))
}
