//! Routes for the study-portal API.
//!
//! ## Structure
//! - **Probes**
//!   - `GET  /health`      — liveness
//!   - `GET  /readyz`      — readiness (db + library directories)
//!
//! - **Listing and download endpoints**
//!   - `GET  /exams`       — exam PDF filenames
//!   - `GET  /answer-keys` — answer-key PDF filenames
//!   - `GET  /file/{type}/{filename}` — attachment download
//!
//! - **Relay**
//!   - `POST /ask`         — forward a question to the answering service
//!
//! Anything unmatched falls through to the legacy static page.

use crate::{
    handlers::{
        ask_handlers::ask,
        health_handlers::{health, readyz},
        paper_handlers::{download_paper, list_answer_keys, list_exams},
    },
    state::AppState,
};
use axum::{
    Router,
    routing::{get, post},
};
use tower_http::services::ServeDir;

/// Build and return the router for the whole portal surface.
///
/// The router carries shared state (`AppState`) to all handlers; the static
/// page is a plain file service with no state.
pub fn routes(static_dir: &str) -> Router<AppState> {
    Router::new()
        // probes (mounted at root)
        .route("/health", get(health))
        .route("/readyz", get(readyz))
        // listing + download
        .route("/exams", get(list_exams))
        .route("/answer-keys", get(list_answer_keys))
        .route("/file/{type}/{filename}", get(download_paper))
        // relay
        .route("/ask", post(ask))
        // legacy static page
        .fallback_service(ServeDir::new(static_dir))
}
