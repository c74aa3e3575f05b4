use bytes::Bytes;
use http_body_util::combinators::BoxBody;
use hyper::header::HeaderValue;
use hyper::{Response, StatusCode};
use tracing::{error, warn};
use url::form_urlencoded;

use super::response::{empty, error_response, json_response};
use crate::app_state::AppState;
use crate::auth::AuthError;
use crate::playlist::PlaylistError;

/// GET /tracks?playlistId=<id>
///
/// CORS headers are attached to every response, validation failures included,
/// so error responses stay consumable by the browser caller.
pub async fn get_tracks(
    state: &AppState,
    query: Option<&str>,
    origin: Option<&HeaderValue>,
) -> Response<BoxBody<Bytes, hyper::Error>> {
    let playlist_id = query.and_then(|query| {
        form_urlencoded::parse(query.as_bytes())
            .find(|(key, _)| key == "playlistId")
            .map(|(_, value)| value.into_owned())
    });

    let mut response = match playlist_id {
        None => error_response(StatusCode::BAD_REQUEST, "playlistId parameter is required"),
        Some(id) => match state.playlists.get_tracks(&id).await {
            Ok(payload) => json_response(StatusCode::OK, &payload),
            Err(err) => playlist_error_response(&err),
        },
    };

    state.cors.apply(response.headers_mut(), origin);
    response
}

/// OPTIONS /tracks — CORS preflight, short-circuits with an empty 200.
pub fn preflight(
    state: &AppState,
    origin: Option<&HeaderValue>,
) -> Response<BoxBody<Bytes, hyper::Error>> {
    let mut response = Response::new(empty());
    state.cors.apply(response.headers_mut(), origin);
    response
}

/// Map a playlist failure to its client-facing status and generic message.
/// Detail never reaches the client; it goes to the log here.
fn playlist_error_response(err: &PlaylistError) -> Response<BoxBody<Bytes, hyper::Error>> {
    match err {
        PlaylistError::InvalidId => {
            error_response(StatusCode::BAD_REQUEST, "Invalid playlistId format")
        }
        PlaylistError::NotFound => error_response(StatusCode::NOT_FOUND, "Playlist not found"),
        PlaylistError::Unauthorized => {
            warn!(error = %err, "upstream rejected playlist request");
            error_response(StatusCode::UNAUTHORIZED, "Authentication failed")
        }
        PlaylistError::Token(AuthError::NotConfigured) => {
            error!(error = %err, "spotify client credentials missing");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
        }
        PlaylistError::Token(_) => {
            warn!(error = %err, "token exchange failed");
            error_response(StatusCode::UNAUTHORIZED, "Authentication failed")
        }
        PlaylistError::UpstreamStatus(_) | PlaylistError::Request(_) => {
            warn!(error = %err, "error fetching playlist tracks");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
        }
    }
}
