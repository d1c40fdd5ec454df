use hyper::header::{
    HeaderValue, ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS,
    ACCESS_CONTROL_ALLOW_ORIGIN, ACCESS_CONTROL_MAX_AGE, ALLOW, CONTENT_TYPE,
};
use hyper::{Body, Response, StatusCode};
use log::error;
use serde::Serialize;

pub const NO_IMAGE: &str = "No image provided";

/// Body of every `/predict` answer. Serializes to an object with exactly one
/// key, `predicted_class` or `error`.
#[derive(Debug, Serialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum PredictResponse {
    PredictedClass(String),
    Error(String),
}

impl PredictResponse {
    pub fn missing_image() -> Self {
        PredictResponse::Error(NO_IMAGE.to_owned())
    }

    /// Failures are reported in the body, the status is always 200.
    pub fn into_response(self) -> Response<Body> {
        let body = serde_json::to_string(&self).unwrap_or_else(|e| {
            error!("Failed to serialize response: {}", e);
            r#"{"error":"Internal error"}"#.to_owned()
        });

        build(
            Response::builder()
                .status(StatusCode::OK)
                .header(CONTENT_TYPE, "application/json")
                .body(Body::from(body)),
        )
    }
}

/// Answer to a CORS preflight request.
pub fn preflight() -> Response<Body> {
    build(
        Response::builder()
            .status(StatusCode::NO_CONTENT)
            .header(ALLOW, "POST, OPTIONS")
            .header(ACCESS_CONTROL_ALLOW_METHODS, "POST, OPTIONS")
            .header(ACCESS_CONTROL_ALLOW_HEADERS, "*")
            .header(ACCESS_CONTROL_MAX_AGE, "86400")
            .body(Body::empty()),
    )
}

pub fn not_found() -> Response<Body> {
    build(
        Response::builder()
            .status(StatusCode::NOT_FOUND)
            .header(CONTENT_TYPE, "text/plain")
            .body(Body::from("404 Not Found")),
    )
}

pub fn method_not_allowed() -> Response<Body> {
    build(
        Response::builder()
            .status(StatusCode::METHOD_NOT_ALLOWED)
            .header(CONTENT_TYPE, "text/plain")
            .header(ALLOW, "POST, OPTIONS")
            .body(Body::from("405 Method Not Allowed")),
    )
}

/// Any origin may call us.
pub fn allow_any_origin(mut response: Response<Body>) -> Response<Body> {
    response
        .headers_mut()
        .insert(ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
    response
}

fn build(result: hyper::http::Result<Response<Body>>) -> Response<Body> {
    result.unwrap_or_else(|e| {
        error!("Failed to build response: {}", e);
        let mut response = Response::new(Body::empty());
        *response.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
        response
    })
}
