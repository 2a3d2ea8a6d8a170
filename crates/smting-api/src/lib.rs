pub mod discovery;
pub mod error;
pub mod kane;
pub mod messages;
pub mod middleware;
pub mod profiles;
pub mod reports;
pub mod state;
pub mod talk;

use axum::{
    Router, middleware as axum_middleware,
    routing::{get, post, put},
};
use tracing::error;

use smting_core::CoreError;

use crate::error::ApiError;
use crate::state::AppState;

/// Every route of the service. Layers for tracing and CORS are added by the
/// binary.
pub fn router(state: AppState) -> Router {
    let public_routes = Router::new().route("/health", get(health));

    let protected_routes = Router::new()
        .route("/profiles", post(profiles::register))
        .route("/profiles/me", get(profiles::me).patch(profiles::update_me))
        .route("/profiles/me/location", put(profiles::update_location))
        .route("/profiles/me/activity", post(profiles::touch_activity))
        .route("/profiles/{user_id}", get(profiles::get_profile))
        .route("/discover", get(discovery::discover))
        .route("/messages", get(messages::threads))
        .route("/messages/unread-count", get(messages::unread_count))
        .route(
            "/messages/{user_id}",
            get(messages::conversation).post(messages::send_message),
        )
        .route("/messages/{user_id}/read", post(messages::mark_read))
        .route("/messages/{user_id}/quote", get(messages::quote))
        .route("/talk", get(talk::list_posts).post(talk::create_post))
        .route("/talk/{post_id}", get(talk::get_post))
        .route("/kane", get(kane::history))
        .route("/kane/packages", get(kane::packages))
        .route("/kane/purchase", post(kane::purchase))
        .route("/reports", post(reports::file_report))
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::require_auth,
        ));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(state)
}

async fn health() -> &'static str {
    "ok"
}

/// Run a synchronous core call off the async runtime.
pub(crate) async fn blocking<F, T>(f: F) -> Result<T, ApiError>
where
    F: FnOnce() -> Result<T, CoreError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| {
            error!("spawn_blocking join error: {}", e);
            ApiError::Internal(e.to_string())
        })?
        .map_err(ApiError::from)
}
