use std::time::Duration;

use bytes::Bytes;
use http_body_util::combinators::BoxBody;
use http_body_util::BodyExt;
use hyper::header::HeaderValue;
use hyper::{Response, StatusCode};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};

use super::{identicon, proxy, tracks};
use crate::app_state::AppState;
use crate::auth::{ClientCredentials, TokenProvider};
use crate::cors::{CorsPolicy, ALLOW_METHODS, PROXY_ALLOW_METHODS};
use crate::playlist::PlaylistCache;

const GRANT_BODY: &str = r#"{"access_token":"test-token","token_type":"Bearer","expires_in":3600}"#;
const TRACKS_BODY: &str = r#"{"items":[{"track":{"name":"one"}}],"total":1}"#;

fn state_for(server: &mockito::ServerGuard) -> AppState {
    let client = reqwest::Client::new();
    let tokens = TokenProvider::new(
        client.clone(),
        format!("{}/api/token", server.url()),
        Some(ClientCredentials {
            client_id: "id".to_string(),
            client_secret: "secret".to_string(),
        }),
    );
    let playlists = PlaylistCache::new(
        client.clone(),
        server.url(),
        tokens,
        Duration::from_secs(48 * 60 * 60),
    );

    AppState {
        playlists,
        cors: CorsPolicy::new("koeni.dev").unwrap(),
        http_client: client,
    }
}

async fn mock_token(server: &mut mockito::ServerGuard) {
    server
        .mock("POST", "/api/token")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(GRANT_BODY)
        .create_async()
        .await;
}

async fn body_bytes(response: Response<BoxBody<Bytes, hyper::Error>>) -> Bytes {
    response.into_body().collect().await.unwrap().to_bytes()
}

async fn body_json(response: Response<BoxBody<Bytes, hyper::Error>>) -> Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

#[tokio::test]
async fn missing_playlist_id_is_a_bad_request() {
    let server = mockito::Server::new_async().await;
    let state = state_for(&server);

    let response = tracks::get_tracks(&state, None, None).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        response.headers().get("Access-Control-Allow-Origin").unwrap(),
        "https://koeni.dev"
    );
    assert_eq!(
        body_json(response).await,
        json!({"error": "playlistId parameter is required"})
    );
}

#[tokio::test]
async fn invalid_playlist_id_is_a_bad_request() {
    let server = mockito::Server::new_async().await;
    let state = state_for(&server);

    let response = tracks::get_tracks(&state, Some("playlistId=abc-123"), None).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        body_json(response).await,
        json!({"error": "Invalid playlistId format"})
    );
}

#[tokio::test]
async fn success_relays_the_upstream_payload() {
    let mut server = mockito::Server::new_async().await;
    mock_token(&mut server).await;
    server
        .mock("GET", "/playlists/abc123/tracks")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(TRACKS_BODY)
        .create_async()
        .await;

    let state = state_for(&server);
    let origin = HeaderValue::from_static("https://sub.koeni.dev");

    let response = tracks::get_tracks(&state, Some("playlistId=abc123"), Some(&origin)).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get("Access-Control-Allow-Origin").unwrap(),
        "https://sub.koeni.dev"
    );
    assert_eq!(
        response.headers().get("content-type").unwrap(),
        "application/json"
    );
    assert_eq!(
        body_json(response).await,
        serde_json::from_str::<Value>(TRACKS_BODY).unwrap()
    );
}

#[tokio::test]
async fn upstream_errors_map_to_client_statuses() {
    let mut server = mockito::Server::new_async().await;
    mock_token(&mut server).await;
    server
        .mock("GET", "/playlists/gone404/tracks")
        .with_status(404)
        .create_async()
        .await;
    server
        .mock("GET", "/playlists/auth401/tracks")
        .with_status(401)
        .create_async()
        .await;
    server
        .mock("GET", "/playlists/boom500/tracks")
        .with_status(500)
        .create_async()
        .await;

    let state = state_for(&server);

    let response = tracks::get_tracks(&state, Some("playlistId=gone404"), None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(
        body_json(response).await,
        json!({"error": "Playlist not found"})
    );

    let response = tracks::get_tracks(&state, Some("playlistId=auth401"), None).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        body_json(response).await,
        json!({"error": "Authentication failed"})
    );

    let response = tracks::get_tracks(&state, Some("playlistId=boom500"), None).await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        body_json(response).await,
        json!({"error": "Internal server error"})
    );
}

#[tokio::test]
async fn preflight_echoes_an_allowed_origin() {
    let server = mockito::Server::new_async().await;
    let state = state_for(&server);
    let origin = HeaderValue::from_static("https://sub.koeni.dev");

    let response = tracks::preflight(&state, Some(&origin));

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get("Access-Control-Allow-Origin").unwrap(),
        "https://sub.koeni.dev"
    );
    assert_eq!(
        response.headers().get("Access-Control-Allow-Methods").unwrap(),
        ALLOW_METHODS
    );
    assert!(body_bytes(response).await.is_empty());
}

#[tokio::test]
async fn preflight_falls_back_for_third_party_origins() {
    let server = mockito::Server::new_async().await;
    let state = state_for(&server);
    let origin = HeaderValue::from_static("https://evil.example.com");

    let response = tracks::preflight(&state, Some(&origin));

    assert_eq!(
        response.headers().get("Access-Control-Allow-Origin").unwrap(),
        "https://koeni.dev"
    );
}

#[tokio::test]
async fn proxy_relays_status_content_type_and_body() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/hello")
        .with_status(202)
        .with_header("content-type", "text/plain")
        .with_body("teapot")
        .create_async()
        .await;

    let state = state_for(&server);
    let encoded = urlencoding::encode(&format!("{}/hello", server.url())).into_owned();

    let response = proxy::forward(&state, &encoded).await;

    assert_eq!(response.status(), StatusCode::ACCEPTED);
    assert_eq!(response.headers().get("content-type").unwrap(), "text/plain");
    assert_eq!(
        response.headers().get("Access-Control-Allow-Origin").unwrap(),
        "https://koeni.dev"
    );
    assert_eq!(
        response.headers().get("Access-Control-Allow-Methods").unwrap(),
        PROXY_ALLOW_METHODS
    );
    assert_eq!(body_bytes(response).await, Bytes::from("teapot"));
}

#[tokio::test]
async fn proxy_failure_is_an_internal_error() {
    let server = mockito::Server::new_async().await;
    let state = state_for(&server);

    let response = proxy::forward(&state, "not-a-url").await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body_bytes(response).await, Bytes::from("Internal Server Error"));
}

#[tokio::test]
async fn identicon_renders_png_by_default() {
    let response = identicon::render("octocat", None);

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers().get("content-type").unwrap(), "image/png");
    assert!(!body_bytes(response).await.is_empty());
}

#[tokio::test]
async fn identicon_renders_svg_on_request() {
    let response = identicon::render("octocat", Some("format=svg"));

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get("content-type").unwrap(),
        "image/svg+xml"
    );
    assert!(!body_bytes(response).await.is_empty());
}

#[tokio::test]
async fn identicon_without_a_value_is_not_found() {
    let response = identicon::render("", None);

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
