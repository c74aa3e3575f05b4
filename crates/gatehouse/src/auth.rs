use std::time::Duration;

use common::consts::TOKEN_EXPIRY_BUFFER_SECS;
use serde::Deserialize;
use thiserror::Error;
use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("spotify client credentials are not configured")]
    NotConfigured,

    #[error("token exchange returned status {0}")]
    Upstream(reqwest::StatusCode),

    #[error("token exchange request failed: {0}")]
    Request(#[from] reqwest::Error),
}

#[derive(Debug, Clone)]
pub struct ClientCredentials {
    pub client_id: String,
    pub client_secret: String,
}

/// Token response of the client-credentials grant.
#[derive(Debug, Deserialize)]
struct TokenGrant {
    access_token: String,
    expires_in: u64,
}

#[derive(Debug)]
struct CachedToken {
    value: String,
    expires_at: Instant,
}

impl CachedToken {
    fn new(value: impl Into<String>, expires_in_secs: u64) -> Self {
        let lifetime = expires_in_secs.saturating_sub(TOKEN_EXPIRY_BUFFER_SECS);
        Self {
            value: value.into(),
            expires_at: Instant::now() + Duration::from_secs(lifetime),
        }
    }

    fn is_valid(&self) -> bool {
        Instant::now() < self.expires_at
    }
}

/// Obtains and caches a Spotify bearer token via the client-credentials grant.
///
/// A valid cached token is returned without any I/O. A failed exchange leaves
/// the cache exactly as it was: an earlier token is never cleared by a failed
/// refresh, and no token is stored unless the upstream reported success.
pub struct TokenProvider {
    client: reqwest::Client,
    token_endpoint: String,
    credentials: Option<ClientCredentials>,
    cached: RwLock<Option<CachedToken>>,
}

impl TokenProvider {
    pub fn new(
        client: reqwest::Client,
        token_endpoint: String,
        credentials: Option<ClientCredentials>,
    ) -> Self {
        Self {
            client,
            token_endpoint,
            credentials,
            cached: RwLock::new(None),
        }
    }

    pub async fn get_token(&self) -> Result<String, AuthError> {
        if let Some(token) = self.cached.read().await.as_ref() {
            if token.is_valid() {
                return Ok(token.value.clone());
            }
        }

        let credentials = self.credentials.as_ref().ok_or(AuthError::NotConfigured)?;

        let response = self
            .client
            .post(&self.token_endpoint)
            .basic_auth(&credentials.client_id, Some(&credentials.client_secret))
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(%status, body = %body, "spotify token exchange failed");
            return Err(AuthError::Upstream(status));
        }

        let grant: TokenGrant = response.json().await?;
        debug!(expires_in = grant.expires_in, "obtained spotify access token");

        let token = CachedToken::new(grant.access_token, grant.expires_in);
        let value = token.value.clone();
        *self.cached.write().await = Some(token);

        Ok(value)
    }
}
