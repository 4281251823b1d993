//! Health & readiness handlers.
//!
//! - GET /health  -> simple liveness ("ok")
//! - GET /readyz  -> readiness that checks DB connectivity and the library dirs

use crate::state::AppState;
use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use std::{collections::HashMap, path::Path};
use tokio::fs;

/// `GET /health`
///
/// Very small liveness probe — always returns 200 OK with a plain JSON body.
/// This endpoint should be cheap, never perform I/O, and have no side effects.
pub async fn health() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "ok",
            service: "study-portal",
        }),
    )
}

/// `GET /readyz`
///
/// Readiness probe that:
/// 1. Runs a lightweight query against SQLite (`SELECT 1`).
/// 2. Checks that both library directories are present and are directories.
///
/// Returns JSON describing each check. HTTP 200 when all checks pass,
/// HTTP 503 when any check fails.
pub async fn readyz(State(state): State<AppState>) -> impl IntoResponse {
    let sqlite_check = match sqlx::query_scalar::<_, i64>("SELECT 1")
        .fetch_one(&*state.library.db)
        .await
    {
        Ok(1) => (true, None::<String>),
        Ok(v) => (false, Some(format!("unexpected result: {}", v))),
        Err(e) => (false, Some(format!("error: {}", e))),
    };

    let exams_check = dir_check(&state.library.exams_dir).await;
    let keys_check = dir_check(&state.library.answer_keys_dir).await;

    let overall_ok = sqlite_check.0 && exams_check.0 && keys_check.0;

    let mut checks = HashMap::new();
    checks.insert(
        "sqlite",
        CheckStatus {
            ok: sqlite_check.0,
            error: sqlite_check.1,
        },
    );
    checks.insert(
        "exams_dir",
        CheckStatus {
            ok: exams_check.0,
            error: exams_check.1,
        },
    );
    checks.insert(
        "answer_keys_dir",
        CheckStatus {
            ok: keys_check.0,
            error: keys_check.1,
        },
    );

    let body = ReadyResponse {
        status: if overall_ok { "ok" } else { "error" },
        checks,
    };

    let status = if overall_ok {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(body))
}

async fn dir_check(path: &Path) -> (bool, Option<String>) {
    match fs::metadata(path).await {
        Ok(meta) if meta.is_dir() => (true, None),
        Ok(_) => (false, Some(format!("{} is not a directory", path.display()))),
        Err(e) => (false, Some(format!("{}: {}", path.display(), e))),
    }
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    service: &'static str,
}

#[derive(Serialize)]
struct ReadyResponse {
    status: &'static str,
    checks: HashMap<&'static str, CheckStatus>,
}

#[derive(Serialize)]
struct CheckStatus {
    ok: bool,
    error: Option<String>,
}
