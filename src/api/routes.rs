use axum::{
    http::{header, HeaderValue, Method},
    middleware,
    routing::{get, post, put},
    Router,
};
use std::path::Path;
use std::sync::Arc;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    services::{ServeDir, ServeFile},
    trace::TraceLayer,
};
use tracing::warn;

use crate::auth::require_admin;
use crate::config::FrontendConfig;

use super::analytics::{get_stats, record_blog_event, record_visit};
use super::contact::submit_contact;
use super::handlers::{
    admin_list_posts, blog_health, create_post, delete_post, get_post, health_check, list_posts,
    update_post, validate_post, AppState,
};
use super::session::login;

pub fn create_api_router(state: Arc<AppState>, frontend: &FrontendConfig) -> Router {
    let admin_routes = Router::new()
        .route("/api/analytics/stats", get(get_stats))
        .route("/api/admin/blog", get(admin_list_posts))
        .route("/api/blog", post(create_post))
        .route("/api/blog/validate", post(validate_post))
        .route("/api/blog/health", get(blog_health))
        .route("/api/blog/{slug}", put(update_post).delete(delete_post))
        .route_layer(middleware::from_fn_with_state(
            Arc::clone(&state.auth),
            require_admin,
        ));

    let public_routes = Router::new()
        .route("/api/health", get(health_check))
        .route("/api/analytics/visit", post(record_visit))
        .route("/api/analytics/blog-event", post(record_blog_event))
        .route("/api/blog", get(list_posts))
        .route("/api/blog/{slug}", get(get_post))
        .route("/api/contact", post(submit_contact))
        .route("/api/auth/login", post(login));

    let mut router = Router::new()
        .merge(public_routes)
        .merge(admin_routes)
        .with_state(state);

    if let Some(dir) = &frontend.static_dir {
        let index = Path::new(dir).join("index.html");
        router = router.fallback_service(ServeDir::new(dir).fallback(ServeFile::new(index)));
    }

    router
        .layer(cors_layer(&frontend.cors_allowed_origins))
        .layer(TraceLayer::new_for_http())
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    if origins.is_empty() {
        return layer.allow_origin(Any);
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin '{}'", origin);
                None
            }
        })
        .collect();

    layer.allow_origin(AllowOrigin::list(allowed))
}
