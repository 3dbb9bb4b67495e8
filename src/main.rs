mod adapters;
mod application;
mod config;
mod domain;

use std::sync::Arc;

use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::adapters::{
    http::{cors_layer, router, state::HttpState},
    onnx::{loader::OnnxModelLoader, preprocess::VggPreprocessor},
};
use crate::application::{
    lifecycle::ModelLifecycle,
    services::{PredictionService, PredictionSettings},
};
use crate::config::Cli;
use crate::domain::model::LoadStrategy;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Logs (RUST_LOG=info por defecto)
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "info");
    }
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    // 2. Configuración: flags o variables de entorno
    let cfg = Cli::parse().into_config()?;
    info!(
        model = %cfg.model_path.display(),
        size = %cfg.target_size,
        labels = cfg.labels.len(),
        strategy = ?cfg.strategy,
        filter = ?cfg.resize_filter,
        "🔧 Inicializando adaptadores..."
    );

    for label in cfg.labels.iter().filter(|l| !cfg.catalog.contains(l)) {
        warn!(label, fallback = ?cfg.catalog.fallback(), "Etiqueta sin consejos, se usará el genérico");
    }

    // 3. Adaptadores y casos de uso
    let loader = Arc::new(OnnxModelLoader::new(cfg.session.clone(), cfg.target_size));
    let lifecycle = Arc::new(ModelLifecycle::new(loader).with_expected_outputs(cfg.labels.len()));
    let preprocessor = Arc::new(VggPreprocessor::new(cfg.resize_filter));
    let prediction = Arc::new(PredictionService::new(
        lifecycle,
        preprocessor,
        cfg.labels.clone(),
        cfg.catalog.clone(),
        PredictionSettings {
            model_path: cfg.model_path.clone(),
            target_size: cfg.target_size,
            strategy: cfg.strategy,
        },
    ));

    // 4. Carga del modelo según la estrategia. Un fallo nunca detiene el proceso.
    match cfg.strategy {
        LoadStrategy::Eager => {
            if prediction.load_model().await.is_err() {
                warn!("Arrancando sin modelo: /predict responderá 503");
            }
        }
        LoadStrategy::Hook => {
            let svc = prediction.clone();
            tokio::spawn(async move {
                if svc.load_model().await.is_err() {
                    warn!("Modelo no cargado en el arranque: /predict responderá 503");
                }
            });
        }
        LoadStrategy::Lazy => info!("El modelo se cargará en la primera predicción"),
    }

    // 5. Router
    let state = HttpState { prediction: prediction.clone() };
    let app = router(state, cors_layer(&cfg.allowed_origins)?, cfg.max_upload_bytes);

    // 6. Servidor
    let listener = tokio::net::TcpListener::bind(&cfg.addr).await?;
    info!("🚀 API de detección iniciada en http://{}", cfg.addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    prediction.release();
    info!("Recursos del modelo liberados");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "No se pudo escuchar ctrl-c; el apagado ordenado queda desactivado");
        std::future::pending::<()>().await;
    }
    info!("Apagando servidor...");
}
