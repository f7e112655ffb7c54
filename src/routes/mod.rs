pub mod attempts;
pub mod export;
pub mod health;
pub mod questions;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::middleware::cors::permissive_cors;
use crate::AppState;

pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health))
        .route("/next-question", get(questions::next_question))
        .route("/warm-up", post(questions::warm_up))
        .route("/buffer-status", get(questions::buffer_status))
        .route("/save-attempt", post(attempts::save_attempt))
        .route("/download-report", get(export::download_report))
        .route("/download-report/:subject", get(export::download_subject_report))
        .with_state(state)
        .layer(permissive_cors())
        .layer(TraceLayer::new_for_http())
}
