use std::collections::HashMap;
use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;
use serde_json::Value;
use thiserror::Error;
use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::auth::{AuthError, TokenProvider};

static PLAYLIST_ID: LazyLock<Regex> = LazyLock::new(|| Regex::new("^[a-zA-Z0-9]+$").unwrap());

#[derive(Debug, Error)]
pub enum PlaylistError {
    #[error("invalid playlist id format")]
    InvalidId,

    #[error("playlist not found upstream")]
    NotFound,

    #[error("upstream rejected the playlist request as unauthorized")]
    Unauthorized,

    #[error(transparent)]
    Token(#[from] AuthError),

    #[error("upstream returned status {0}")]
    UpstreamStatus(reqwest::StatusCode),

    #[error("upstream request failed: {0}")]
    Request(#[from] reqwest::Error),
}

struct CachedPlaylist {
    payload: Value,
    expires_at: Instant,
}

impl CachedPlaylist {
    fn is_valid(&self) -> bool {
        Instant::now() < self.expires_at
    }
}

/// TTL cache of playlist-track responses in front of the Spotify Web API.
///
/// Lookups for a cached, unexpired playlist return without any network call.
/// Entries are replaced wholesale; a stale entry is simply overwritten on the
/// next fetch of the same key. The map is unbounded — the key space is the
/// set of playlist ids actually requested through the site.
pub struct PlaylistCache {
    client: reqwest::Client,
    api_endpoint: String,
    tokens: TokenProvider,
    entries: RwLock<HashMap<String, CachedPlaylist>>,
    ttl: Duration,
}

impl PlaylistCache {
    pub fn new(
        client: reqwest::Client,
        api_endpoint: String,
        tokens: TokenProvider,
        ttl: Duration,
    ) -> Self {
        Self {
            client,
            api_endpoint,
            tokens,
            entries: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    /// Fetch the track listing of `playlist_id`, from cache when possible.
    pub async fn get_tracks(&self, playlist_id: &str) -> Result<Value, PlaylistError> {
        if !PLAYLIST_ID.is_match(playlist_id) {
            return Err(PlaylistError::InvalidId);
        }

        {
            let entries = self.entries.read().await;
            if let Some(entry) = entries.get(playlist_id) {
                if entry.is_valid() {
                    debug!(playlist_id, "serving playlist tracks from cache");
                    return Ok(entry.payload.clone());
                }
            }
        }

        let token = self.tokens.get_token().await?;

        let url = format!("{}/playlists/{}/tracks", self.api_endpoint, playlist_id);
        let response = self.client.get(&url).bearer_auth(&token).send().await?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(PlaylistError::NotFound);
        }
        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(PlaylistError::Unauthorized);
        }
        if !status.is_success() {
            warn!(%status, playlist_id, "upstream playlist fetch failed");
            return Err(PlaylistError::UpstreamStatus(status));
        }

        let payload: Value = response.json().await?;

        let mut entries = self.entries.write().await;
        entries.insert(
            playlist_id.to_string(),
            CachedPlaylist {
                payload: payload.clone(),
                expires_at: Instant::now() + self.ttl,
            },
        );

        Ok(payload)
    }
}
