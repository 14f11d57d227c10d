pub mod checkin;
pub mod cycle;
pub mod mood;
pub mod recommend;
pub mod session;
pub mod survey;
pub mod symptoms;

use crate::state::SharedState;
use axum::{routing::get, Router};

async fn health() -> &'static str {
    "OK"
}

pub fn routes(state: SharedState) -> Router {
    Router::new()
        .route("/health", get(health))
        .nest("/cycle", cycle::router(state.clone()))
        .nest("/survey", survey::router(state.clone()))
        .nest("/symptoms", symptoms::router(state.clone()))
        .nest("/checkin", checkin::router(state.clone()))
        .nest("/recommend", recommend::router(state.clone()))
        .nest("/mood", mood::router(state))
}
