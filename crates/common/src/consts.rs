/// Route served by the playlist-tracks handler.
pub const TRACKS_PATH: &str = "/tracks";

/// Route prefix for the identicon handler; the rest of the path is the seed value.
pub const IDENTICON_PREFIX: &str = "/identicon/";

/// Route prefix for the generic proxy; the rest of the path is a percent-encoded URL.
pub const PROXY_PREFIX: &str = "/proxy/";

pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:3000";
pub const DEFAULT_TOKEN_ENDPOINT: &str = "https://accounts.spotify.com/api/token";
pub const DEFAULT_API_ENDPOINT: &str = "https://api.spotify.com/v1";
pub const DEFAULT_CORS_DOMAIN: &str = "koeni.dev";

/// Seconds shaved off the upstream-declared token lifetime so a token is
/// refreshed before it can expire mid-flight.
pub const TOKEN_EXPIRY_BUFFER_SECS: u64 = 60;

/// Playlist responses are reused for 48 hours.
pub const DEFAULT_TRACKS_CACHE_TTL_SECS: u64 = 48 * 60 * 60;

pub const DEFAULT_UPSTREAM_TIMEOUT_SECS: u64 = 30;

/// Some proxied targets refuse requests without a browser user agent.
pub const PROXY_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/58.0.3029.110 Safari/537.36";
