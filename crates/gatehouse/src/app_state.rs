use crate::cors::CorsPolicy;
use crate::playlist::PlaylistCache;

/// Shared application state bundled into a single Arc-wrapped struct,
/// constructed once at startup and handed to every request handler.
pub struct AppState {
    pub playlists: PlaylistCache,
    pub cors: CorsPolicy,
    /// Shared HTTP client for the generic proxy (connection pooling / keep-alive).
    pub http_client: reqwest::Client,
}
