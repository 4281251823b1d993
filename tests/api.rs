//! End-to-end tests: boot the real router on an ephemeral port and drive it
//! over HTTP.

use serde_json::Value;
use sqlx::{SqlitePool, sqlite::SqlitePoolOptions};
use std::{path::PathBuf, sync::Arc};
use study_portal::{
    routes::routes::routes, services::library_service::LibraryService, state::AppState,
};
use tempfile::TempDir;
use tokio::net::TcpListener;

struct TestPortal {
    addr: String,
    exams_dir: PathBuf,
    db: Arc<SqlitePool>,
    // Holds the library directories for the lifetime of the test.
    _root: TempDir,
}

async fn spawn_portal(ask_url: Option<String>) -> TestPortal {
    let root = TempDir::new().unwrap();
    let exams_dir = root.path().join("exams");
    let keys_dir = root.path().join("answer_keys");
    let static_dir = root.path().join("static");
    std::fs::create_dir_all(&exams_dir).unwrap();
    std::fs::create_dir_all(&keys_dir).unwrap();
    std::fs::create_dir_all(&static_dir).unwrap();

    std::fs::write(exams_dir.join("midterm.pdf"), b"%PDF-1.4 midterm").unwrap();
    std::fs::write(exams_dir.join("Final Exam 2024.pdf"), b"%PDF-1.4 final").unwrap();
    std::fs::write(exams_dir.join("Algebra #2 100%.pdf"), b"%PDF-1.4 algebra").unwrap();
    std::fs::write(exams_dir.join("notes.txt"), b"not a pdf").unwrap();

    let db = Arc::new(
        SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap(),
    );
    let library = LibraryService::new(db.clone(), &exams_dir, &keys_dir);
    library.init_schema().await.unwrap();

    let app_state = AppState {
        library,
        http: reqwest::Client::new(),
        ask_url,
    };
    let app = routes(static_dir.to_str().unwrap()).with_state(app_state);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = format!("http://{}", listener.local_addr().unwrap());
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    TestPortal {
        addr,
        exams_dir,
        db,
        _root: root,
    }
}

#[tokio::test]
async fn health_reports_ok() {
    let portal = spawn_portal(None).await;

    let resp = reqwest::get(format!("{}/health", portal.addr)).await.unwrap();
    assert_eq!(resp.status(), 200);

    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["service"], "study-portal");
}

#[tokio::test]
async fn readyz_goes_unavailable_when_a_library_dir_vanishes() {
    let portal = spawn_portal(None).await;

    let resp = reqwest::get(format!("{}/readyz", portal.addr)).await.unwrap();
    assert_eq!(resp.status(), 200);

    std::fs::remove_dir_all(&portal.exams_dir).unwrap();
    let resp = reqwest::get(format!("{}/readyz", portal.addr)).await.unwrap();
    assert_eq!(resp.status(), 503);

    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["status"], "error");
    assert_eq!(body["checks"]["exams_dir"]["ok"], false);
    assert_eq!(body["checks"]["sqlite"]["ok"], true);
}

#[tokio::test]
async fn readyz_goes_unavailable_when_the_database_is_down() {
    let portal = spawn_portal(None).await;
    portal.db.close().await;

    let resp = reqwest::get(format!("{}/readyz", portal.addr)).await.unwrap();
    assert_eq!(resp.status(), 503);

    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["status"], "error");
    assert_eq!(body["checks"]["sqlite"]["ok"], false);
    assert_eq!(body["checks"]["exams_dir"]["ok"], true);
}

#[tokio::test]
async fn listings_are_always_arrays() {
    let portal = spawn_portal(None).await;

    let exams: Vec<String> = reqwest::get(format!("{}/exams", portal.addr))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    // Case-insensitive order, non-PDFs excluded.
    assert_eq!(
        exams,
        vec![
            "Algebra #2 100%.pdf".to_string(),
            "Final Exam 2024.pdf".to_string(),
            "midterm.pdf".to_string()
        ]
    );

    let keys: Vec<String> = reqwest::get(format!("{}/answer-keys", portal.addr))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(keys.is_empty());
}

#[tokio::test]
async fn listed_files_round_trip_through_download() {
    let portal = spawn_portal(None).await;

    let exams: Vec<String> = reqwest::get(format!("{}/exams", portal.addr))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    for name in exams {
        // Percent-encode the listed name the way a browser would; the
        // fixtures include `#` and `%` to keep this honest.
        let mut url = reqwest::Url::parse(&portal.addr).unwrap();
        url.path_segments_mut()
            .unwrap()
            .pop_if_empty()
            .extend(["file", "exams", name.as_str()]);
        let resp = reqwest::get(url).await.unwrap();
        assert_eq!(resp.status(), 200, "download of `{}` failed", name);
        assert_eq!(
            resp.headers()["content-type"].to_str().unwrap(),
            "application/pdf"
        );
        let disposition = resp.headers()["content-disposition"].to_str().unwrap();
        assert!(disposition.starts_with("attachment"));
        assert!(resp.bytes().await.unwrap().starts_with(b"%PDF"));
    }
}

#[tokio::test]
async fn traversal_payloads_are_not_found() {
    let portal = spawn_portal(None).await;

    for path in [
        "/file/exams/..%2F..%2Fetc%2Fpasswd",
        "/file/exams/..%5C..%5Csecret.pdf",
        "/file/exams/%2Fetc%2Fpasswd",
        "/file/exams/.hidden.pdf",
    ] {
        let resp = reqwest::get(format!("{}{}", portal.addr, path)).await.unwrap();
        assert_eq!(resp.status(), 404, "expected 404 for `{}`", path);
        let body = resp.text().await.unwrap();
        assert!(!body.contains("root:"), "leaked file contents for `{}`", path);
    }
}

#[tokio::test]
async fn unknown_category_is_not_found() {
    let portal = spawn_portal(None).await;

    let resp = reqwest::get(format!("{}/file/homework/x.pdf", portal.addr))
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
}

#[tokio::test]
async fn missing_file_is_not_found() {
    let portal = spawn_portal(None).await;

    let resp = reqwest::get(format!("{}/file/exams/ghost.pdf", portal.addr))
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);

    // A failed download never poisons later requests.
    let resp = reqwest::get(format!("{}/exams", portal.addr)).await.unwrap();
    assert_eq!(resp.status(), 200);
}

#[tokio::test]
async fn ask_requires_a_query() {
    let portal = spawn_portal(None).await;

    let client = reqwest::Client::new();
    for body in [r#"{"query":""}"#, r#"{}"#, r#"{"query":"   "}"#] {
        let resp = client
            .post(format!("{}/ask", portal.addr))
            .header("content-type", "application/json")
            .body(body)
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 400, "expected 400 for body `{}`", body);

        let json: Value = resp.json().await.unwrap();
        assert_eq!(json["error"], "no query provided");
    }
}

#[tokio::test]
async fn ask_without_an_upstream_is_unavailable() {
    let portal = spawn_portal(None).await;

    let resp = reqwest::Client::new()
        .post(format!("{}/ask", portal.addr))
        .json(&serde_json::json!({ "query": "what is calculus" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 503);

    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"], "ask relay is not configured");
}

#[tokio::test]
async fn ask_relays_the_upstream_answer() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/")
        .with_status(200)
        .with_body(r#"{"answer":"The derivative of x^2 is 2x."}"#)
        .create_async()
        .await;

    let portal = spawn_portal(Some(server.url())).await;

    let resp = reqwest::Client::new()
        .post(format!("{}/ask", portal.addr))
        .json(&serde_json::json!({ "query": "differentiate x^2" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["answer"], "The derivative of x^2 is 2x.");
}
