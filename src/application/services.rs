use std::path::PathBuf;
use std::sync::Arc;

use tokio::task::JoinError;
use tracing::{debug, error};

use crate::application::{
    inference::infer,
    lifecycle::{LoadState, ModelHandle, ModelLifecycle},
    ports::PreprocessorPort,
};
use crate::domain::{
    errors::{InferenceError, LoadError, PredictError, PreprocessError},
    model::{LoadStrategy, TargetSize},
    prediction::{ClassLabelSet, PredictionResult, SuggestionCatalog},
};

#[derive(Debug, Clone)]
pub struct PredictionSettings {
    pub model_path: PathBuf,
    pub target_size: TargetSize,
    pub strategy: LoadStrategy,
}

/// Caso de uso principal: bytes de imagen -> etiqueta, confianza y consejos.
#[derive(Clone)]
pub struct PredictionService {
    lifecycle: Arc<ModelLifecycle>,
    preprocessor: Arc<dyn PreprocessorPort>,
    labels: Arc<ClassLabelSet>,
    catalog: Arc<SuggestionCatalog>,
    settings: PredictionSettings,
}

impl PredictionService {
    pub fn new(
        lifecycle: Arc<ModelLifecycle>,
        preprocessor: Arc<dyn PreprocessorPort>,
        labels: ClassLabelSet,
        catalog: SuggestionCatalog,
        settings: PredictionSettings,
    ) -> Self {
        Self {
            lifecycle,
            preprocessor,
            labels: Arc::new(labels),
            catalog: Arc::new(catalog),
            settings,
        }
    }

    pub fn model_path(&self) -> &PathBuf {
        &self.settings.model_path
    }

    /// Carga explícita (estrategias `eager` y `hook`).
    pub async fn load_model(&self) -> Result<ModelHandle, LoadError> {
        self.lifecycle.initialize(&self.settings.model_path).await
    }

    pub fn readiness(&self) -> LoadState {
        self.lifecycle.state()
    }

    pub fn release(&self) {
        self.lifecycle.release();
    }

    pub async fn predict(&self, bytes: Vec<u8>) -> Result<PredictionResult, PredictError> {
        // Sin modelo no se gasta trabajo en preprocesar.
        let handle = self
            .acquire_handle()
            .await
            .ok_or(InferenceError::ModelUnavailable)?;

        let target = self.settings.target_size;
        let expected = handle.input().size;
        if expected != target {
            error!(%expected, configured = %target, "Tamaño de entrada mal configurado");
            return Err(PreprocessError::ShapeMismatch {
                expected: (expected.width, expected.height),
                got: (target.width, target.height),
            }
            .into());
        }

        let preprocessor = self.preprocessor.clone();
        let tensor = tokio::task::spawn_blocking(move || preprocessor.preprocess(&bytes, target))
            .await
            .map_err(task_failure)?
            .inspect_err(|e| debug!(error = %e, "Imagen rechazada"))?;

        let labels = self.labels.clone();
        let catalog = self.catalog.clone();
        let result = tokio::task::spawn_blocking(move || infer(&handle, tensor, &labels, &catalog))
            .await
            .map_err(task_failure)??;

        debug!(label = %result.label, confidence = result.confidence, "Predicción completada");
        Ok(result)
    }

    async fn acquire_handle(&self) -> Option<ModelHandle> {
        match self.settings.strategy {
            LoadStrategy::Lazy => self.lifecycle.load_once(&self.settings.model_path).await,
            LoadStrategy::Eager | LoadStrategy::Hook => self.lifecycle.current(),
        }
    }
}

// Un pánico dentro de la tarea no debe llegar al llamador tal cual.
fn task_failure(e: JoinError) -> InferenceError {
    error!(error = %e, "La tarea de predicción terminó de forma anómala");
    InferenceError::Failed("prediction task aborted".into())
}
