//! Router assembly.

use axum::Router;
use axum::http::{HeaderValue, Method};
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::warn;

use crate::config::Config;
use crate::middleware::throttle_mutations;
use crate::routes;
use crate::state::AppState;

/// Build the full application router.
pub fn build_router(state: AppState, config: &Config) -> Router {
    let cors = build_cors_layer(config);

    Router::new()
        .merge(routes::front::router())
        .merge(routes::health::router())
        .merge(routes::auth::router())
        .merge(routes::content::router())
        .merge(routes::pages::router())
        .merge(routes::leads::router())
        .merge(routes::upload::router())
        .merge(routes::collections::router())
        .nest_service(
            "/admin",
            ServeDir::new(&config.admin_static_dir).append_index_html_on_directories(true),
        )
        .nest_service("/static/uploads", ServeDir::new(&config.uploads_dir))
        // Middleware layers (last added = first executed in request flow):
        // TraceLayer → CORS → rate limit → routes
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            throttle_mutations,
        ))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn build_cors_layer(config: &Config) -> CorsLayer {
    let methods = [
        Method::GET,
        Method::POST,
        Method::PUT,
        Method::PATCH,
        Method::DELETE,
        Method::OPTIONS,
    ];

    if config.cors_allowed_origins.len() == 1 && config.cors_allowed_origins[0] == "*" {
        CorsLayer::new()
            .allow_origin(tower_http::cors::Any)
            .allow_methods(methods)
            .allow_headers(tower_http::cors::Any)
    } else {
        let origins: Vec<HeaderValue> = config
            .cors_allowed_origins
            .iter()
            .filter_map(|o| match o.parse::<HeaderValue>() {
                Ok(v) => Some(v),
                Err(_) => {
                    warn!(origin = %o, "ignoring unparseable CORS origin");
                    None
                }
            })
            .collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(methods)
            .allow_headers([
                axum::http::header::AUTHORIZATION,
                axum::http::header::CONTENT_TYPE,
            ])
            .allow_credentials(true)
    }
}
