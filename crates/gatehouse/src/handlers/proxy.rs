use bytes::Bytes;
use http_body_util::combinators::BoxBody;
use hyper::header::{CONTENT_TYPE, USER_AGENT};
use hyper::{Response, StatusCode};
use tracing::warn;

use super::response::{full, text_response};
use crate::app_state::AppState;
use common::consts::PROXY_USER_AGENT;

/// GET /proxy/{percent-encoded-url}
///
/// Forwards a GET to the decoded target and relays status, content type and
/// body, with CORS headers for the canonical origin attached.
pub async fn forward(state: &AppState, encoded: &str) -> Response<BoxBody<Bytes, hyper::Error>> {
    let target = match urlencoding::decode(encoded) {
        Ok(target) => target.into_owned(),
        Err(err) => {
            warn!(error = %err, "proxy target is not valid percent-encoded utf-8");
            return failure();
        }
    };

    let upstream = match state
        .http_client
        .get(&target)
        .header(USER_AGENT, PROXY_USER_AGENT)
        .send()
        .await
    {
        Ok(upstream) => upstream,
        Err(err) => {
            warn!(error = %err, url = %target, "error fetching proxied url");
            return failure();
        }
    };

    let status = upstream.status();
    let content_type = upstream.headers().get(CONTENT_TYPE).cloned();

    let body = match upstream.bytes().await {
        Ok(body) => body,
        Err(err) => {
            warn!(error = %err, url = %target, "error reading proxied response");
            return failure();
        }
    };

    let mut response = Response::new(full(body));
    *response.status_mut() = status;
    if let Some(content_type) = content_type {
        response.headers_mut().insert(CONTENT_TYPE, content_type);
    }
    state.cors.apply_proxy(response.headers_mut());
    response
}

fn failure() -> Response<BoxBody<Bytes, hyper::Error>> {
    text_response(StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error")
}
