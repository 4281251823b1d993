use anyhow::{Context, Result};
use axum::Router;
use sqlx::sqlite::SqlitePoolOptions;
use std::{fs, io::ErrorKind, path::Path, sync::Arc};
use study_portal::{config, routes, services::library_service::LibraryService, state::AppState};
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // --- Logging setup ---
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    // --- Parse config ---
    let cfg = config::AppConfig::from_env_and_args()?;

    tracing::info!("Starting study-portal with config: {:?}", cfg);

    // --- Ensure library directories exist ---
    for dir in [&cfg.exams_dir, &cfg.answer_keys_dir] {
        if !Path::new(dir).exists() {
            fs::create_dir_all(dir)?;
            tracing::info!("Created library directory at {}", dir);
        }
    }

    // --- Initialize SQLite connection ---
    // SQLx will not create a missing SQLite database file on its own, so
    // touch the file (and its parent directory) before connecting.
    if let Some(db_path) = cfg
        .database_url
        .strip_prefix("sqlite://")
        .map(|p| p.trim_start_matches("file:"))
    {
        let db_path_obj = Path::new(db_path);
        if let Some(parent) = db_path_obj.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent)?;
                tracing::info!("Created missing directory {:?}", parent);
            }
        }
        fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(db_path)
            .with_context(|| format!("creating database file `{}`", db_path))?;
    }

    let db = Arc::new(
        SqlitePoolOptions::new()
            .max_connections(5)
            .connect(&cfg.database_url)
            .await
            .with_context(|| format!("connecting to database `{}`", cfg.database_url))?,
    );

    // --- Initialize core service ---
    let library = LibraryService::new(db, &cfg.exams_dir, &cfg.answer_keys_dir);
    library
        .init_schema()
        .await
        .context("initializing catalog schema")?;

    let app_state = AppState {
        library,
        http: reqwest::Client::new(),
        ask_url: cfg.ask_url.clone(),
    };

    // --- Build router ---
    // Permissive CORS: the React frontend runs on a different origin in
    // development.
    let app: Router = routes::routes::routes(&cfg.static_dir)
        .layer(CorsLayer::permissive())
        .with_state(app_state);

    // --- Start server ---
    let addr = cfg.addr();
    let listener = match TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(err)
            if err.kind() == ErrorKind::PermissionDenied
                && matches!(cfg.host.as_str(), "0.0.0.0" | "::") =>
        {
            let fallback_addr = format!("127.0.0.1:{}", cfg.port);
            tracing::warn!(
                "Permission denied binding to {} ({}). Falling back to {}",
                addr,
                err,
                fallback_addr
            );
            TcpListener::bind(&fallback_addr).await?
        }
        Err(err) => return Err(err.into()),
    };

    tracing::info!("Server listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app).await?;

    Ok(())
}
