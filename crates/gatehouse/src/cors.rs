use hyper::header::{HeaderMap, HeaderValue};
use regex::Regex;

/// Methods allowed on the playlist endpoint, preflight included.
pub const ALLOW_METHODS: &str = "GET, OPTIONS";

/// Methods advertised by the generic proxy, matching what it relays.
pub const PROXY_ALLOW_METHODS: &str = "GET, POST, PUT, DELETE, OPTIONS";

pub const ALLOW_HEADERS: &str = "Content-Type, Authorization";

/// Decides the `Access-Control-Allow-Origin` value for a request.
///
/// An HTTPS origin of the configured domain or any of its subdomains is
/// echoed back, which is what lets credentialed requests through; any other
/// origin gets the canonical `https://{domain}` instead.
pub struct CorsPolicy {
    allow_origin: Regex,
    default_origin: String,
}

impl CorsPolicy {
    pub fn new(domain: &str) -> Result<Self, regex::Error> {
        let pattern = format!(r"^https://([a-z0-9-]+\.)*{}$", regex::escape(domain));
        Ok(Self {
            allow_origin: Regex::new(&pattern)?,
            default_origin: format!("https://{domain}"),
        })
    }

    pub fn resolve_origin<'a>(&'a self, request_origin: Option<&'a str>) -> &'a str {
        match request_origin {
            Some(origin) if self.allow_origin.is_match(origin) => origin,
            _ => &self.default_origin,
        }
    }

    /// Attach the CORS headers for the playlist endpoint to `headers`.
    pub fn apply(&self, headers: &mut HeaderMap, origin: Option<&HeaderValue>) {
        let resolved = self.resolve_origin(origin.and_then(|value| value.to_str().ok()));
        if let Ok(value) = HeaderValue::from_str(resolved) {
            headers.insert("Access-Control-Allow-Origin", value);
        }
        headers.insert(
            "Access-Control-Allow-Methods",
            HeaderValue::from_static(ALLOW_METHODS),
        );
        headers.insert(
            "Access-Control-Allow-Headers",
            HeaderValue::from_static(ALLOW_HEADERS),
        );
    }

    /// Attach the proxy variant: canonical origin only, wider method list.
    pub fn apply_proxy(&self, headers: &mut HeaderMap) {
        if let Ok(value) = HeaderValue::from_str(&self.default_origin) {
            headers.insert("Access-Control-Allow-Origin", value);
        }
        headers.insert(
            "Access-Control-Allow-Methods",
            HeaderValue::from_static(PROXY_ALLOW_METHODS),
        );
        headers.insert(
            "Access-Control-Allow-Headers",
            HeaderValue::from_static(ALLOW_HEADERS),
        );
    }
}
