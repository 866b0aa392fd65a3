pub mod api;

use crate::state::AppState;
use axum::http::{header, HeaderName, Method};
use axum::Router;
use std::path::Path;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;

pub fn build_router(state: AppState) -> Router {
    let state = Arc::new(state);

    // CORS: any origin; preflight OPTIONS requests are answered here
    // and never reach the auth extractor.
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::DELETE])
        .allow_headers([
            header::ORIGIN,
            HeaderName::from_static("x-requested-with"),
            header::CONTENT_TYPE,
            header::ACCEPT,
            header::AUTHORIZATION,
        ]);

    let mut router = Router::new()
        .nest("/api", api::build_api_routes(state.clone()))
        // Uploaded images are served as static files
        .nest_service("/uploads/images", ServeDir::new(state.images.base_dir()));

    // All unmatched non-API routes serve the SPA entry document so
    // client-side routing keeps working on deep links.
    if let Some(public_dir) = &state.config.public_dir {
        let index = Path::new(public_dir).join("index.html");
        router = router
            .fallback_service(ServeDir::new(public_dir).not_found_service(ServeFile::new(index)));
    }

    router.layer(cors).layer(TraceLayer::new_for_http())
}
