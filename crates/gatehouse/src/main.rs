use std::sync::Arc;
use std::time::Duration;
use std::{env, fs};

use bytes::Bytes;
use common::configuration::Configuration;
use common::consts::{IDENTICON_PREFIX, PROXY_PREFIX, TRACKS_PATH};
use gatehouse::app_state::AppState;
use gatehouse::auth::{ClientCredentials, TokenProvider};
use gatehouse::cors::CorsPolicy;
use gatehouse::handlers::{identicon, proxy, response, tracks};
use gatehouse::playlist::PlaylistCache;
use http_body_util::combinators::BoxBody;
use hyper::body::Incoming;
use hyper::header;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use tokio::net::TcpListener;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

const CONFIG_PATH_ENV: &str = "GATEHOUSE_CONFIG_PATH";
const DEFAULT_CONFIG_PATH: &str = "./gatehouse.yaml";

// ---------------------------------------------------------------------------
// Configuration loading
// ---------------------------------------------------------------------------

/// Load the YAML configuration file.
///
/// The path is read from `GATEHOUSE_CONFIG_PATH` (env) or falls back to
/// `./gatehouse.yaml`; with neither present the built-in defaults apply.
fn load_config() -> Result<Configuration, Box<dyn std::error::Error + Send + Sync>> {
    let path = match env::var(CONFIG_PATH_ENV) {
        Ok(path) => path,
        Err(_) => {
            if !std::path::Path::new(DEFAULT_CONFIG_PATH).exists() {
                info!("no configuration file found, using defaults");
                return Ok(Configuration::default());
            }
            DEFAULT_CONFIG_PATH.to_string()
        }
    };

    let contents = fs::read_to_string(&path).map_err(|e| format!("failed to read {path}: {e}"))?;

    let config: Configuration =
        serde_yaml::from_str(&contents).map_err(|e| format!("failed to parse {path}: {e}"))?;

    Ok(config)
}

// ---------------------------------------------------------------------------
// Application state initialization
// ---------------------------------------------------------------------------

/// Spotify credentials: environment first, configuration file second.
fn resolve_credentials(config: &Configuration) -> Option<ClientCredentials> {
    let client_id = env::var("SPOTIFY_CLIENT_ID")
        .ok()
        .or_else(|| config.spotify.client_id.clone());
    let client_secret = env::var("SPOTIFY_CLIENT_SECRET")
        .ok()
        .or_else(|| config.spotify.client_secret.clone());

    match (client_id, client_secret) {
        (Some(client_id), Some(client_secret)) => Some(ClientCredentials {
            client_id,
            client_secret,
        }),
        _ => None,
    }
}

/// Build the shared [`AppState`] from a parsed [`Configuration`].
fn init_app_state(
    config: &Configuration,
) -> Result<AppState, Box<dyn std::error::Error + Send + Sync>> {
    let http_client = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.upstream.timeout_secs))
        .build()?;

    let credentials = resolve_credentials(config);
    if credentials.is_none() {
        warn!("spotify client credentials are not configured, /tracks requests will fail");
    }

    let tokens = TokenProvider::new(
        http_client.clone(),
        config.spotify.token_endpoint.clone(),
        credentials,
    );
    let playlists = PlaylistCache::new(
        http_client.clone(),
        config.spotify.api_endpoint.clone(),
        tokens,
        Duration::from_secs(config.spotify.tracks_cache_ttl_secs),
    );
    let cors = CorsPolicy::new(&config.cors.domain)?;

    Ok(AppState {
        playlists,
        cors,
        http_client,
    })
}

// ---------------------------------------------------------------------------
// Request routing
// ---------------------------------------------------------------------------

/// Route an incoming HTTP request to the appropriate handler.
async fn route(
    req: Request<Incoming>,
    state: Arc<AppState>,
) -> Result<Response<BoxBody<Bytes, hyper::Error>>, hyper::Error> {
    let path = req.uri().path().to_string();
    let origin = req.headers().get(header::ORIGIN).cloned();

    let response = match (req.method(), path.as_str()) {
        (&Method::GET, TRACKS_PATH) => {
            tracks::get_tracks(&state, req.uri().query(), origin.as_ref()).await
        }
        (&Method::OPTIONS, TRACKS_PATH) => tracks::preflight(&state, origin.as_ref()),
        (&Method::GET, path) if path.starts_with(IDENTICON_PREFIX) => {
            identicon::render(&path[IDENTICON_PREFIX.len()..], req.uri().query())
        }
        (&Method::GET, path) if path.starts_with(PROXY_PREFIX) => {
            proxy::forward(&state, &path[PROXY_PREFIX.len()..]).await
        }
        _ => {
            debug!(method = %req.method(), path = %path, "no route found");
            let mut not_found = Response::new(response::empty());
            *not_found.status_mut() = StatusCode::NOT_FOUND;
            not_found
        }
    };

    Ok(response)
}

// ---------------------------------------------------------------------------
// Server loop
// ---------------------------------------------------------------------------

/// Accept connections and spawn a task per connection.
///
/// Listens for `SIGINT` / `ctrl-c` and shuts down gracefully, allowing
/// in-flight connections to finish.
async fn run_server(
    state: Arc<AppState>,
    bind_address: &str,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let listener = TcpListener::bind(bind_address).await?;
    info!(address = %bind_address, "server listening");

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            result = listener.accept() => {
                let (stream, _) = result?;
                let peer_addr = stream.peer_addr()?;
                let io = TokioIo::new(stream);
                let state = Arc::clone(&state);

                tokio::task::spawn(async move {
                    debug!(peer = ?peer_addr, "accepted connection");

                    let service = service_fn(move |req| {
                        let state = Arc::clone(&state);
                        async move { route(req, state).await }
                    });

                    if let Err(err) = http1::Builder::new().serve_connection(io, service).await {
                        warn!(error = ?err, "error serving connection");
                    }
                });
            }
            _ = &mut shutdown => {
                info!("received shutdown signal, stopping server");
                break;
            }
        }
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = load_config()?;
    let state = Arc::new(init_app_state(&config)?);

    let bind_address =
        env::var("BIND_ADDRESS").unwrap_or_else(|_| config.server.bind_address.clone());

    run_server(state, &bind_address).await
}
