use bytes::Bytes;
use http_body_util::combinators::BoxBody;
use http_body_util::{BodyExt, Empty, Full};
use hyper::header::HeaderValue;
use hyper::{Response, StatusCode};

/// An empty HTTP body (404 / preflight responses).
pub fn empty() -> BoxBody<Bytes, hyper::Error> {
    Empty::<Bytes>::new()
        .map_err(|never| match never {})
        .boxed()
}

pub fn full(body: Bytes) -> BoxBody<Bytes, hyper::Error> {
    Full::new(body).map_err(|never| match never {}).boxed()
}

pub fn json_response(
    status: StatusCode,
    body: &serde_json::Value,
) -> Response<BoxBody<Bytes, hyper::Error>> {
    let bytes = serde_json::to_vec(body).unwrap_or_default();
    let mut response = Response::new(full(Bytes::from(bytes)));
    *response.status_mut() = status;
    response.headers_mut().insert(
        "content-type",
        HeaderValue::from_static("application/json"),
    );
    response
}

/// JSON error body in the gateway's `{"error": "..."}` shape.
pub fn error_response(status: StatusCode, message: &str) -> Response<BoxBody<Bytes, hyper::Error>> {
    json_response(status, &serde_json::json!({ "error": message }))
}

pub fn text_response(status: StatusCode, message: &str) -> Response<BoxBody<Bytes, hyper::Error>> {
    let mut response = Response::new(full(Bytes::from(message.to_string())));
    *response.status_mut() = status;
    response
}
