pub mod error;
pub mod routes;
pub mod state;

use anyhow::Context;
use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method},
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::adapters::http::state::HttpState;

pub fn router(state: HttpState, cors: CorsLayer, max_upload_bytes: usize) -> Router {
    Router::new()
        .route("/wakeup", get(routes::wakeup))
        .route("/health", get(routes::health))
        .route("/predict", post(routes::predict))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// `"*"` en la lista abre a cualquier origen (sin credenciales, que el navegador
/// no admite con comodín). Con orígenes explícitos se permiten credenciales.
pub fn cors_layer(origins: &[String]) -> anyhow::Result<CorsLayer> {
    let base = CorsLayer::new().allow_methods([Method::GET, Method::POST]);

    if origins.is_empty() || origins.iter().any(|o| o.trim() == "*") {
        return Ok(base.allow_origin(Any).allow_headers(Any));
    }

    let parsed = origins
        .iter()
        .map(|o| {
            o.trim()
                .parse::<HeaderValue>()
                .with_context(|| format!("origen CORS inválido: {o}"))
        })
        .collect::<anyhow::Result<Vec<_>>>()?;

    Ok(base
        .allow_origin(parsed)
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT, header::AUTHORIZATION])
        .allow_credentials(true))
}
