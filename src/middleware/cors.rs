use tower_http::cors::{Any, CorsLayer};

/// The practice UI is served from a different origin than this API.
pub fn permissive_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_methods(Any)
        .allow_headers(Any)
        .allow_origin(Any)
}
