use axum::{
    Router,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

use crate::state::AppState;
use crate::web::handlers::{adopt_dog, cat_facts, healthcheck, list_dogs};

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(healthcheck))
        .route("/dogs", get(list_dogs))
        .route("/dogs/:dog_id/adoptions", post(adopt_dog))
        .route("/cats/facts", get(cat_facts))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
