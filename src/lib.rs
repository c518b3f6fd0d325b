use axum::{
    Router,
    routing::{get, post},
};
use http::{Method, header};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::{DefaultMakeSpan, DefaultOnFailure, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

pub mod config;
pub mod db;
pub mod error;
pub mod state;

pub mod models {
    pub mod install;
    pub mod server_config;
    pub mod session;
    pub mod user;
}

pub mod repositories {
    pub mod install;
    pub mod memory;
    pub mod server_config;
    pub mod session;
    pub mod user;
}

pub mod services {
    pub mod installs;
    pub mod server_config;
    pub mod sessions;
}

pub mod handlers {
    pub mod installs;
    pub mod server_config;
    pub mod sessions;
    pub mod stats;
}

use state::AppState;

/// Builds the full application router.
///
/// Telemetry endpoints are unauthenticated, so CORS is limited to the two
/// methods the client app actually uses.
pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE]);

    Router::new()
        .route("/start-session/", post(handlers::sessions::start_session))
        .route("/end-session/", post(handlers::sessions::end_session))
        .route("/report-install/", post(handlers::installs::report_install))
        .route("/stats/", get(handlers::stats::stats))
        .route("/stats/detailed/", get(handlers::stats::detailed_stats))
        .route("/server-config/", get(handlers::server_config::server_config))
        .route("/health", get(|| async { "ok" }))
        .with_state(state)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::default())
                .on_request(DefaultOnRequest::default().level(Level::DEBUG))
                .on_response(DefaultOnResponse::default().level(Level::DEBUG))
                .on_failure(DefaultOnFailure::default().level(Level::ERROR)),
        )
        .layer(cors)
}
