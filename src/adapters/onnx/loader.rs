use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::adapters::onnx::classifier::{OnnxClassifier, SessionOptions};
use crate::application::ports::{LoadedModel, ModelLoaderPort};
use crate::domain::errors::LoadError;
use crate::domain::model::TargetSize;

/// Carga modelos ONNX desde disco. El trabajo pesado va a un hilo bloqueante.
pub struct OnnxModelLoader {
    options: SessionOptions,
    fallback_size: TargetSize,
}

impl OnnxModelLoader {
    pub fn new(options: SessionOptions, fallback_size: TargetSize) -> Self {
        Self { options, fallback_size }
    }
}

#[async_trait]
impl ModelLoaderPort for OnnxModelLoader {
    async fn load(&self, path: &Path) -> Result<LoadedModel, LoadError> {
        if path.as_os_str().is_empty() || !path.exists() {
            return Err(LoadError::NotFound(path.to_path_buf()));
        }

        let owned: PathBuf = path.to_path_buf();
        let options = self.options.clone();
        let fallback = self.fallback_size;

        let joined = tokio::task::spawn_blocking(move || -> anyhow::Result<LoadedModel> {
            let classifier = OnnxClassifier::load(&owned, &options)?;
            let input = classifier.input_spec(fallback)?;
            let output_len = classifier.output_len();
            Ok(LoadedModel { classifier: Arc::new(classifier), input, output_len })
        })
        .await;

        let corrupt = |reason: String| LoadError::Corrupt { path: path.to_path_buf(), reason };
        match joined {
            Ok(Ok(model)) => Ok(model),
            Ok(Err(e)) => Err(corrupt(format!("{e:#}"))),
            Err(e) => Err(corrupt(format!("la tarea de carga terminó de forma anómala: {e}"))),
        }
    }
}
