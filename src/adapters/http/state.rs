use std::sync::Arc;
use crate::application::services::PredictionService;

/// Estado compartido para los manejadores HTTP de Axum.
#[derive(Clone)]
pub struct HttpState {
    /// Caso de uso de predicción; también expone la preparación del modelo.
    pub prediction: Arc<PredictionService>,
}
