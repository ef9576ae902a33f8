use axum::{http::Method, routing::get, Router};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub mod account;
pub mod admin;
pub mod auth;
pub mod catalog;
pub mod error;
pub mod metrics;
pub mod middleware;
pub mod state;

pub use state::{AppState, AuthConfig};

pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::OPTIONS])
        .allow_headers([
            axum::http::header::AUTHORIZATION,
            axum::http::header::CONTENT_TYPE,
            axum::http::header::USER_AGENT,
        ]);

    Router::new()
        .merge(auth::routes())
        .merge(catalog::routes())
        .merge(account::routes())
        .merge(admin::routes(state.clone()))
        .route("/metrics", get(metrics::export))
        // Runs before the admin gate, which reads the claims it attaches.
        .layer(axum::middleware::from_fn_with_state(state.clone(), middleware::optional_session))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
