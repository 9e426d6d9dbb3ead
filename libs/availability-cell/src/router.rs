use axum::{
    middleware,
    routing::{delete, get, post},
    Router,
};

use shared_database::AppState;
use shared_utils::extractor::auth_middleware;

use crate::handlers;

pub fn availability_routes(state: AppState) -> Router {
    // Public routes (no authentication required)
    let public_routes = Router::new()
        .route("/", get(handlers::list_slots))
        .route("/{professional_id}/summary", get(handlers::day_summary));

    // Protected routes: the caller must be the professional or an admin
    let protected_routes = Router::new()
        .route("/", post(handlers::publish_slots))
        .route("/{professional_id}", delete(handlers::clear_slots))
        .route("/{professional_id}/blocks", post(handlers::publish_blocks))
        .route("/{professional_id}/slots/{slot_id}", delete(handlers::withdraw_slot))
        .layer(middleware::from_fn_with_state(state.config.clone(), auth_middleware));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(state)
}
