use serde::Deserialize;

use crate::consts::{
    DEFAULT_API_ENDPOINT, DEFAULT_BIND_ADDRESS, DEFAULT_CORS_DOMAIN, DEFAULT_TOKEN_ENDPOINT,
    DEFAULT_TRACKS_CACHE_TTL_SECS, DEFAULT_UPSTREAM_TIMEOUT_SECS,
};

/// Gateway configuration, deserialized from YAML.
///
/// Every field has a default, so an empty document (or no file at all) yields
/// a working configuration. Credentials can also be supplied through the
/// `SPOTIFY_CLIENT_ID` / `SPOTIFY_CLIENT_SECRET` environment variables, which
/// take precedence over the file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Configuration {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub spotify: SpotifyConfig,
    #[serde(default)]
    pub cors: CorsConfig,
    #[serde(default)]
    pub upstream: UpstreamConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_address: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: DEFAULT_BIND_ADDRESS.to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SpotifyConfig {
    pub token_endpoint: String,
    pub api_endpoint: String,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub tracks_cache_ttl_secs: u64,
}

impl Default for SpotifyConfig {
    fn default() -> Self {
        Self {
            token_endpoint: DEFAULT_TOKEN_ENDPOINT.to_string(),
            api_endpoint: DEFAULT_API_ENDPOINT.to_string(),
            client_id: None,
            client_secret: None,
            tracks_cache_ttl_secs: DEFAULT_TRACKS_CACHE_TTL_SECS,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CorsConfig {
    /// Domain whose origin (and subdomain origins) may make credentialed
    /// cross-origin requests. Everything else is answered with the canonical
    /// `https://{domain}` origin.
    pub domain: String,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            domain: DEFAULT_CORS_DOMAIN.to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Per-call timeout applied to every outbound HTTP request.
    pub timeout_secs: u64,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            timeout_secs: DEFAULT_UPSTREAM_TIMEOUT_SECS,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn empty_document_yields_defaults() {
        let config: Configuration = serde_yaml::from_str("{}").unwrap();

        assert_eq!(config.server.bind_address, DEFAULT_BIND_ADDRESS);
        assert_eq!(config.spotify.token_endpoint, DEFAULT_TOKEN_ENDPOINT);
        assert_eq!(config.spotify.api_endpoint, DEFAULT_API_ENDPOINT);
        assert_eq!(config.spotify.client_id, None);
        assert_eq!(
            config.spotify.tracks_cache_ttl_secs,
            DEFAULT_TRACKS_CACHE_TTL_SECS
        );
        assert_eq!(config.cors.domain, DEFAULT_CORS_DOMAIN);
        assert_eq!(config.upstream.timeout_secs, DEFAULT_UPSTREAM_TIMEOUT_SECS);
    }

    #[test]
    fn partial_document_keeps_remaining_defaults() {
        let yaml = r#"
server:
  bind_address: "127.0.0.1:8080"
spotify:
  client_id: "abc"
  client_secret: "def"
cors:
  domain: "example.org"
"#;
        let config: Configuration = serde_yaml::from_str(yaml).unwrap();

        assert_eq!(config.server.bind_address, "127.0.0.1:8080");
        assert_eq!(config.spotify.client_id.as_deref(), Some("abc"));
        assert_eq!(config.spotify.client_secret.as_deref(), Some("def"));
        assert_eq!(config.spotify.token_endpoint, DEFAULT_TOKEN_ENDPOINT);
        assert_eq!(config.cors.domain, "example.org");
        assert_eq!(config.upstream.timeout_secs, DEFAULT_UPSTREAM_TIMEOUT_SECS);
    }
}
