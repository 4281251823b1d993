//! Shared state handed to every handler through the router.

use crate::services::library_service::LibraryService;

#[derive(Clone)]
pub struct AppState {
    /// Storage accessor for listings and downloads.
    pub library: LibraryService,

    /// Outbound client for the `/ask` relay. Shared for connection pooling.
    pub http: reqwest::Client,

    /// Upstream answering service; `None` disables the relay.
    pub ask_url: Option<String>,
}
