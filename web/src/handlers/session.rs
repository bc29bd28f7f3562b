//! Anonymous session handlers.
//!
//! Create a session, query its balance, and consume a credit. The ledger
//! decides every outcome; handlers only translate it into HTTP.

use crate::error::AppError;
use crate::extractors::SessionHeader;
use crate::metrics;
use crate::state::AppState;
use crate::WebResult;
use axum::{Json, extract::State};
use credit_meter_core::{CreditInfo, CreditReceipt, SessionId, SessionInfo};
use credit_meter_ledger::{CreditLedger, DebitOutcome, LedgerError};

/// Create a new anonymous session.
///
/// # Endpoint
///
/// ```text
/// POST /session/create
/// ```
///
/// # Response
///
/// ```json
/// {
///   "session_id": "uuid",
///   "credits_remaining": 6
/// }
/// ```
pub async fn create_session<L>(
    State(state): State<AppState<L>>,
) -> WebResult<Json<SessionInfo>>
where
    L: CreditLedger + 'static,
{
    let info = state.ledger.create_session().await?;
    metrics::record_session_created();

    Ok(Json(info))
}

/// Get the balance of the session named in the header.
///
/// # Endpoint
///
/// ```text
/// GET /session/credits
/// X-Session-Id: uuid
/// ```
///
/// # Response
///
/// ```json
/// {
///   "credits_remaining": 4,
///   "session_valid": true
/// }
/// ```
///
/// `404` with a "Session not found" detail when the session is unknown or expired.
pub async fn get_credits<L>(
    State(state): State<AppState<L>>,
    SessionHeader(session_id): SessionHeader,
) -> WebResult<Json<CreditInfo>>
where
    L: CreditLedger + 'static,
{
    let credits_remaining = state
        .ledger
        .balance(&session_id)
        .await
        .map_err(|e| session_error(&session_id, e))?;

    Ok(Json(CreditInfo {
        credits_remaining,
        session_valid: true,
    }))
}

/// Consume one credit.
///
/// # Endpoint
///
/// ```text
/// POST /session/use-credit
/// X-Session-Id: uuid
/// ```
///
/// # Response
///
/// ```json
/// {
///   "success": true,
///   "credits_remaining": 3,
///   "message": "3 credits remaining"
/// }
/// ```
///
/// `402` when the balance is zero, `404` when the session is unknown or expired.
pub async fn use_credit<L>(
    State(state): State<AppState<L>>,
    SessionHeader(session_id): SessionHeader,
) -> WebResult<Json<CreditReceipt>>
where
    L: CreditLedger + 'static,
{
    let outcome = state
        .ledger
        .use_credit(&session_id)
        .await
        .map_err(|e| session_error(&session_id, e))?;

    match outcome {
        DebitOutcome::Granted { credits_remaining } => {
            metrics::record_credit_used();
            tracing::info!(
                session_id = %session_id,
                credits_remaining,
                "Credit consumed"
            );
            Ok(Json(CreditReceipt::granted(credits_remaining)))
        }
        DebitOutcome::Exhausted => {
            metrics::record_credit_denied();
            tracing::warn!(session_id = %session_id, "Credit refused, quota exhausted");
            Err(AppError::credits_exhausted())
        }
    }
}

fn session_error(session_id: &SessionId, err: LedgerError) -> AppError {
    if err.is_session_gone() {
        metrics::record_session_expired();
        tracing::info!(session_id = %session_id, "Unknown or expired session");
    }
    err.into()
}
