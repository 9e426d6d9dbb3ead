use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use shared_database::AppState;
use shared_utils::extractor::auth_middleware;

use crate::handlers;

pub fn appointment_routes(state: AppState) -> Router {
    // Every booking route requires authentication
    Router::new()
        .route("/", post(handlers::book_appointment))
        .route("/{appointment_id}", get(handlers::get_appointment))
        .layer(middleware::from_fn_with_state(state.config.clone(), auth_middleware))
        .with_state(state)
}
