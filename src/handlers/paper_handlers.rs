//! HTTP handlers for listing and downloading papers.
//! Downloads stream from disk to avoid buffering whole files in memory;
//! storage concerns live in `LibraryService`.

use crate::{errors::AppError, services::library_service::Category, state::AppState};
use axum::{
    Json,
    body::Body,
    extract::{Path, State},
    http::{HeaderValue, StatusCode, header},
    response::Response,
};
use tokio_util::io::ReaderStream;

/// GET `/exams` — filenames of available exam PDFs. Always an array.
pub async fn list_exams(State(state): State<AppState>) -> Result<Json<Vec<String>>, AppError> {
    Ok(Json(state.library.list(Category::Exams).await?))
}

/// GET `/answer-keys` — filenames of available answer-key PDFs.
pub async fn list_answer_keys(
    State(state): State<AppState>,
) -> Result<Json<Vec<String>>, AppError> {
    Ok(Json(state.library.list(Category::AnswerKeys).await?))
}

/// GET `/file/{type}/{filename}` — stream one paper as an attachment.
///
/// The router hands `filename` over already percent-decoded. Unknown types
/// 404 before any storage lookup.
pub async fn download_paper(
    State(state): State<AppState>,
    Path((category, filename)): Path<(String, String)>,
) -> Result<Response, AppError> {
    let Some(category) = Category::from_route(&category) else {
        return Err(AppError::not_found(format!("unknown type: {}", category)));
    };

    let (paper, file) = state.library.open(category, &filename).await?;
    let stream = ReaderStream::new(file);
    let body = Body::from_stream(stream);

    let mut response = Response::new(body);
    *response.status_mut() = StatusCode::OK;
    let headers = response.headers_mut();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static(content_type_for(&paper.name)),
    );
    headers.insert(
        header::CONTENT_LENGTH,
        HeaderValue::from_str(&paper.size_bytes.to_string())
            .unwrap_or_else(|_| HeaderValue::from_static("0")),
    );
    let disposition = format!("attachment; filename=\"{}\"", paper.name.replace('"', ""));
    if let Ok(value) = HeaderValue::from_str(&disposition) {
        headers.insert(header::CONTENT_DISPOSITION, value);
    }

    Ok(response)
}

/// Content type by extension. The library holds PDFs; the scan sheets that
/// occasionally land next to them are images.
fn content_type_for(name: &str) -> &'static str {
    let lower = name.to_ascii_lowercase();
    if lower.ends_with(".pdf") {
        "application/pdf"
    } else if lower.ends_with(".png") {
        "image/png"
    } else if lower.ends_with(".jpg") || lower.ends_with(".jpeg") {
        "image/jpeg"
    } else {
        "application/octet-stream"
    }
}
