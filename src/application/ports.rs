use async_trait::async_trait;
use ndarray::Array4;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

use crate::domain::{
    errors::{LoadError, PreprocessError},
    model::{InputSpec, TargetSize},
};

/// Pase hacia delante de un grafo ya cargado.
/// Recibe un lote NHWC de una imagen y devuelve el vector de puntuaciones.
pub trait ClassifierPort: Send + Sync {
    fn classify(&self, input: Array4<f32>) -> anyhow::Result<Vec<f32>>;
}

/// Resultado de una carga completa: nunca existe a medias.
#[derive(Clone)]
pub struct LoadedModel {
    pub classifier: Arc<dyn ClassifierPort>,
    pub input: InputSpec,
    /// Longitud del vector de salida si el grafo la declara estática.
    pub output_len: Option<usize>,
}

impl fmt::Debug for LoadedModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoadedModel")
            .field("input", &self.input)
            .field("output_len", &self.output_len)
            .finish_non_exhaustive()
    }
}

#[async_trait]
pub trait ModelLoaderPort: Send + Sync {
    async fn load(&self, path: &Path) -> Result<LoadedModel, LoadError>;
}

/// Bytes codificados -> lote NHWC `(1, alto, ancho, 3)` listo para el modelo.
pub trait PreprocessorPort: Send + Sync {
    fn preprocess(&self, bytes: &[u8], target: TargetSize) -> Result<Array4<f32>, PreprocessError>;
}
