use anyhow::{Context, Result, bail};
use clap::Parser;
use std::env;

/// Centralized application configuration.
/// Combines environment variables and CLI arguments.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub exams_dir: String,
    pub answer_keys_dir: String,
    pub database_url: String,
    pub ask_url: Option<String>,
    pub static_dir: String,
}

/// Command-line + environment configuration.
#[derive(Parser, Debug)]
#[command(author, version, about = "Study-materials portal API")]
pub struct Args {
    /// Host to bind to (overrides STUDY_PORTAL_HOST)
    #[arg(long)]
    pub host: Option<String>,

    /// Port to bind to (overrides STUDY_PORTAL_PORT)
    #[arg(long)]
    pub port: Option<u16>,

    /// Directory holding exam PDFs (overrides STUDY_PORTAL_EXAMS_DIR)
    #[arg(long)]
    pub exams_dir: Option<String>,

    /// Directory holding answer-key PDFs (overrides STUDY_PORTAL_ANSWER_KEYS_DIR)
    #[arg(long)]
    pub answer_keys_dir: Option<String>,

    /// Database URL (overrides STUDY_PORTAL_DATABASE_URL)
    #[arg(long)]
    pub database_url: Option<String>,

    /// Upstream answering service for /ask (overrides STUDY_PORTAL_ASK_URL)
    #[arg(long)]
    pub ask_url: Option<String>,

    /// Directory holding the legacy static page (overrides STUDY_PORTAL_STATIC_DIR)
    #[arg(long)]
    pub static_dir: Option<String>,
}

impl AppConfig {
    /// Parse environment variables + CLI args into AppConfig.
    ///
    /// The database URL is the one setting without a default: the connection
    /// string must come from the environment or the command line, and the
    /// process refuses to start without it.
    pub fn from_env_and_args() -> Result<Self> {
        // Parse CLI once
        let args = Args::parse();

        // --- Environment fallback ---
        let env_host = env::var("STUDY_PORTAL_HOST").unwrap_or_else(|_| "0.0.0.0".into());
        let env_port = match env::var("STUDY_PORTAL_PORT") {
            Ok(value) => value
                .parse::<u16>()
                .with_context(|| format!("parsing STUDY_PORTAL_PORT value `{}`", value))?,
            Err(env::VarError::NotPresent) => 8080,
            Err(err) => return Err(err).context("reading STUDY_PORTAL_PORT"),
        };
        let env_exams = env::var("STUDY_PORTAL_EXAMS_DIR").unwrap_or_else(|_| "./exams".into());
        let env_keys =
            env::var("STUDY_PORTAL_ANSWER_KEYS_DIR").unwrap_or_else(|_| "./answer_keys".into());
        let env_static = env::var("STUDY_PORTAL_STATIC_DIR").unwrap_or_else(|_| "./static".into());

        let database_url = match args
            .database_url
            .or_else(|| env::var("STUDY_PORTAL_DATABASE_URL").ok())
        {
            Some(url) if !url.trim().is_empty() => url,
            _ => bail!("STUDY_PORTAL_DATABASE_URL is not set; refusing to start without a database"),
        };

        let ask_url = args
            .ask_url
            .or_else(|| env::var("STUDY_PORTAL_ASK_URL").ok())
            .filter(|url| !url.trim().is_empty());

        // --- Merge ---
        Ok(Self {
            host: args.host.unwrap_or(env_host),
            port: args.port.unwrap_or(env_port),
            exams_dir: args.exams_dir.unwrap_or(env_exams),
            answer_keys_dir: args.answer_keys_dir.unwrap_or(env_keys),
            database_url,
            ask_url,
            static_dir: args.static_dir.unwrap_or(env_static),
        })
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
