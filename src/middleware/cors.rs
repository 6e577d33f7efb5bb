use axum::http::{header, Method};
use tower_http::cors::{Any, CorsLayer};

/// Any origin, the verbs webhook senders use, and `Content-Length` exposed to
/// browser clients. Credentials are never allowed alongside a wildcard origin.
pub fn permissive_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::HEAD,
            Method::OPTIONS,
        ])
        .allow_headers(Any)
        .expose_headers([header::CONTENT_LENGTH])
}
