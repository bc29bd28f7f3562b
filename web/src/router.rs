//! Router composition.

use crate::handlers::{health, session};
use crate::middleware::{cors_layer, with_http_layers};
use crate::state::AppState;
use axum::{
    Router,
    routing::{get, post},
};
use credit_meter_core::constants::routes;
use credit_meter_ledger::CreditLedger;

/// Session store routes.
///
/// # Routes
///
/// - `POST /session/create` - Create an anonymous session
/// - `GET /session/credits` - Balance of the session in `X-Session-Id`
/// - `POST /session/use-credit` - Atomically consume one credit
pub fn session_router<L>() -> Router<AppState<L>>
where
    L: CreditLedger + 'static,
{
    Router::new()
        .route(routes::CREATE_SESSION, post(session::create_session::<L>))
        .route(routes::CREDITS, get(session::get_credits::<L>))
        .route(routes::USE_CREDIT, post(session::use_credit::<L>))
}

/// Complete application: session routes, banner, health and metrics, wrapped
/// in the request-ID, tracing and CORS layers.
///
/// # Example
///
/// ```rust,ignore
/// let state = AppState::new(InMemoryLedger::default());
/// let app = build_router(state, &["http://localhost:3000".to_string()]);
/// axum::serve(listener, app).await?;
/// ```
pub fn build_router<L>(state: AppState<L>, cors_origins: &[String]) -> Router
where
    L: CreditLedger + 'static,
{
    let router = Router::new()
        .route("/", get(health::root))
        .route("/health", get(health::health_check))
        .route("/metrics", get(health::metrics::<L>))
        .merge(session_router::<L>());

    with_http_layers(router, cors_layer(cors_origins)).with_state(state)
}
