//! Request augmentor.
//!
//! Wraps a `reqwest::Client` so that every downstream call carries the
//! session header, and turns two well-known response signals into explicit
//! results:
//!
//! | Response | Result | Session |
//! |---|---|---|
//! | 402 | `Err(ApiError::CreditsExhausted)` | untouched |
//! | 404 mentioning "Session" | `Err(ApiError::SessionNotFound)` | cleared if it is still the id sent |
//! | anything else | `Ok(ApiResponse)` | untouched |
//!
//! Credit accounting belongs to [`SessionClient::use_credit`]; this layer only
//! catches session loss on calls made outside it.
//!
//! # Example
//!
//! ```ignore
//! let augmentor = RequestAugmentor::new(Arc::clone(&session), &config);
//! let response = augmentor.execute(augmentor.post("/reports/acme")).await?;
//! if let Some(left) = response.credits_remaining() {
//!     println!("{left} free reports left");
//! }
//! ```

use crate::api::SessionApi;
use crate::config::ClientConfig;
use crate::error::{ApiError, error_detail, mentions_session};
use crate::session::SessionClient;
use crate::storage::KeyValueStore;
use credit_meter_core::SessionId;
use credit_meter_core::constants::SESSION_HEADER;
use reqwest::header::HeaderMap;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use std::borrow::Cow;
use std::sync::Arc;

/// What a response means for the local session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseSignal {
    /// 402: the visitor is out of credits.
    QuotaExhausted,
    /// 404 about a session: the store has forgotten it.
    SessionUnknown,
    /// Nothing session-related.
    PassThrough,
}

/// Classify a response by status and body.
#[must_use]
pub fn classify_response(status: StatusCode, body: &str) -> ResponseSignal {
    match status {
        StatusCode::PAYMENT_REQUIRED => ResponseSignal::QuotaExhausted,
        StatusCode::NOT_FOUND if mentions_session(body) => ResponseSignal::SessionUnknown,
        _ => ResponseSignal::PassThrough,
    }
}

/// A fully buffered downstream response.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: Vec<u8>,
}

impl ApiResponse {
    /// Build from parts.
    #[must_use]
    pub const fn new(status: StatusCode, headers: HeaderMap, body: Vec<u8>) -> Self {
        Self {
            status,
            headers,
            body,
        }
    }

    /// HTTP status.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    /// Response headers.
    #[must_use]
    pub const fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Raw body.
    #[must_use]
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Body as text, with invalid UTF-8 replaced.
    #[must_use]
    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }

    /// Deserialize the body as JSON.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::ResponseParseFailed` if the body does not match `T`.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, ApiError> {
        serde_json::from_slice(&self.body).map_err(|e| ApiError::ResponseParseFailed(e.to_string()))
    }

    /// Server-computed balance carried in a success payload, if present.
    ///
    /// Metered downstream calls report the remaining credits alongside their
    /// result as a top-level `credits_remaining` field.
    #[must_use]
    pub fn credits_remaining(&self) -> Option<u32> {
        if !self.status.is_success() {
            return None;
        }

        serde_json::from_slice::<serde_json::Value>(&self.body)
            .ok()?
            .get("credits_remaining")?
            .as_u64()
            .and_then(|n| u32::try_from(n).ok())
    }
}

/// Session-aware wrapper around a `reqwest::Client`.
pub struct RequestAugmentor<A, K> {
    client: Client,
    config: ClientConfig,
    session: Arc<SessionClient<A, K>>,
}

impl<A, K> RequestAugmentor<A, K>
where
    A: SessionApi,
    K: KeyValueStore,
{
    /// Create an augmentor with a fresh `reqwest::Client`.
    #[must_use]
    pub fn new(session: Arc<SessionClient<A, K>>, config: &ClientConfig) -> Self {
        Self::with_client(Client::new(), session, config)
    }

    /// Create an augmentor sharing an existing `reqwest::Client`.
    #[must_use]
    pub fn with_client(client: Client, session: Arc<SessionClient<A, K>>, config: &ClientConfig) -> Self {
        Self {
            client,
            config: config.clone(),
            session,
        }
    }

    /// The session client whose id is attached.
    #[must_use]
    pub const fn session(&self) -> &Arc<SessionClient<A, K>> {
        &self.session
    }

    /// `GET` request to `path`, with the session header attached.
    #[must_use]
    pub fn get(&self, path: &str) -> RequestBuilder {
        self.augment(self.client.get(self.config.url(path)))
    }

    /// `POST` request to `path`, with the session header attached.
    #[must_use]
    pub fn post(&self, path: &str) -> RequestBuilder {
        self.augment(self.client.post(self.config.url(path)))
    }

    /// Attach the cached session id, if any. Requests made before a session
    /// exists go out without the header.
    #[must_use]
    pub fn augment(&self, builder: RequestBuilder) -> RequestBuilder {
        match self.session.session_id() {
            Some(session_id) => builder.header(SESSION_HEADER, session_id.as_str()),
            None => builder,
        }
    }

    /// Send `builder` and inspect the response.
    ///
    /// The builder is sent as given; build it with [`get`](Self::get),
    /// [`post`](Self::post) or [`augment`](Self::augment) to carry the session.
    ///
    /// # Errors
    ///
    /// - `ApiError::CreditsExhausted` on 402 (session state untouched)
    /// - `ApiError::SessionNotFound` on a session 404; the cached session is
    ///   cleared only if it is the id the request carried
    /// - `ApiError::RequestFailed` if the request could not be built or no
    ///   response was received
    pub async fn execute(&self, builder: RequestBuilder) -> Result<ApiResponse, ApiError> {
        let (client, request) = builder.build_split();
        let request = request.map_err(|e| ApiError::RequestFailed(e.to_string()))?;
        let sent = request
            .headers()
            .get(SESSION_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(SessionId::from);

        let response = client
            .execute(request)
            .await
            .map_err(|e| ApiError::RequestFailed(e.to_string()))?;

        let status = response.status();
        let headers = response.headers().clone();
        let body = response
            .bytes()
            .await
            .map_err(|e| ApiError::RequestFailed(e.to_string()))?
            .to_vec();
        let text = String::from_utf8_lossy(&body).into_owned();

        match classify_response(status, &text) {
            ResponseSignal::QuotaExhausted => {
                tracing::warn!(status = %status, "Downstream call refused, credits exhausted");
                Err(ApiError::CreditsExhausted {
                    detail: error_detail(&text),
                })
            }
            ResponseSignal::SessionUnknown => {
                match &sent {
                    Some(session_id) => {
                        tracing::warn!(session_id = %session_id, "Downstream reported session unknown");
                        self.session.invalidate(session_id);
                    }
                    None => tracing::debug!("Session 404 for a request sent without a session"),
                }
                Err(ApiError::SessionNotFound)
            }
            ResponseSignal::PassThrough => Ok(ApiResponse::new(status, headers, body)),
        }
    }
}

impl<A, K> std::fmt::Debug for RequestAugmentor<A, K> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestAugmentor")
            .field("config", &self.config)
            .field("session", &self.session)
            .finish_non_exhaustive()
    }
}
