use bytes::Bytes;
use http_body_util::combinators::BoxBody;
use hyper::header::{HeaderValue, CONTENT_TYPE};
use hyper::{Response, StatusCode};
use identicon_rs::Identicon;
use tracing::warn;
use url::form_urlencoded;

use super::response::{empty, full, text_response};

/// GET /identicon/{value}[?format=svg]
///
/// Renders an identicon for the decoded path value. Rendering itself is
/// delegated to the identicon collaborator crate; this handler only picks the
/// output format and wraps the result.
pub fn render(encoded_value: &str, query: Option<&str>) -> Response<BoxBody<Bytes, hyper::Error>> {
    let value = match urlencoding::decode(encoded_value) {
        Ok(value) => value.into_owned(),
        Err(_) => encoded_value.to_string(),
    };

    if value.is_empty() {
        let mut response = Response::new(empty());
        *response.status_mut() = StatusCode::NOT_FOUND;
        return response;
    }

    let svg = query
        .map(|query| {
            form_urlencoded::parse(query.as_bytes())
                .any(|(key, value)| key == "format" && value == "svg")
        })
        .unwrap_or(false);

    let identicon = Identicon::new(value.as_str());
    let rendered = if svg {
        identicon
            .export_svg_data()
            .map(|data| (Bytes::from(data.into_bytes()), "image/svg+xml"))
            .map_err(|err| err.to_string())
    } else {
        identicon
            .export_png_data()
            .map(|data| (Bytes::from(data), "image/png"))
            .map_err(|err| err.to_string())
    };

    match rendered {
        Ok((body, content_type)) => {
            let mut response = Response::new(full(body));
            response
                .headers_mut()
                .insert(CONTENT_TYPE, HeaderValue::from_static(content_type));
            response
        }
        Err(err) => {
            warn!(error = %err, "identicon rendering failed");
            text_response(StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error")
        }
    }
}
