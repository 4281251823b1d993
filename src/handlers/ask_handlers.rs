//! The `/ask` relay.
//!
//! The portal does no reasoning of its own: it forwards the question to the
//! configured answering service and passes the answer back untouched. When
//! no upstream is configured the endpoint reports itself unavailable.

use crate::{errors::AppError, state::AppState};
use axum::{Json, extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::json;

#[derive(Debug, Deserialize)]
pub struct AskRequest {
    #[serde(default)]
    pub query: String,
}

#[derive(Debug, Serialize)]
pub struct AskResponse {
    pub answer: String,
}

#[derive(Debug, Deserialize)]
struct UpstreamAnswer {
    answer: String,
}

/// POST `/ask` with `{ "query": ... }`.
pub async fn ask(
    State(state): State<AppState>,
    Json(req): Json<AskRequest>,
) -> Result<Json<AskResponse>, AppError> {
    let query = req.query.trim();
    if query.is_empty() {
        return Err(AppError::bad_request("no query provided"));
    }

    let Some(ask_url) = state.ask_url.as_deref() else {
        return Err(AppError::new(
            StatusCode::SERVICE_UNAVAILABLE,
            "ask relay is not configured",
        ));
    };

    let answer = relay_question(&state.http, ask_url, query).await?;
    Ok(Json(AskResponse { answer }))
}

/// Forward the question upstream and extract the answer.
///
/// Upstream detail is logged, never returned; every failure mode collapses
/// to the same 502 body.
async fn relay_question(
    client: &reqwest::Client,
    ask_url: &str,
    query: &str,
) -> Result<String, AppError> {
    let response = client
        .post(ask_url)
        .json(&json!({ "query": query }))
        .send()
        .await
        .map_err(|err| {
            tracing::warn!("ask upstream unreachable: {}", err);
            AppError::new(StatusCode::BAD_GATEWAY, "answering service unavailable")
        })?;

    let status = response.status();
    if !status.is_success() {
        tracing::warn!("ask upstream returned {}", status);
        return Err(AppError::new(
            StatusCode::BAD_GATEWAY,
            "answering service unavailable",
        ));
    }

    let body: UpstreamAnswer = response.json().await.map_err(|err| {
        tracing::warn!("ask upstream sent a malformed body: {}", err);
        AppError::new(StatusCode::BAD_GATEWAY, "answering service unavailable")
    })?;

    Ok(body.answer)
}
