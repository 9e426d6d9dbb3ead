use axum::{routing::get, Router};

use appointment_cell::router::appointment_routes;
use availability_cell::router::availability_routes;
use shared_database::AppState;

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(|| async { "Clinic booking API is running!" }))
        .nest("/availability", availability_routes(state.clone()))
        .nest("/appointments", appointment_routes(state))
}
