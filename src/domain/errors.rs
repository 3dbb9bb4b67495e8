use std::path::PathBuf;
use thiserror::Error;

/// Fallo al cargar el artefacto del modelo. Nunca tumba el proceso:
/// el servicio queda degradado y lo reporta en `/health`.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum LoadError {
    #[error("Modelo no encontrado: {}", .0.display())]
    NotFound(PathBuf),
    #[error("Modelo corrupto en {}: {reason}", .path.display())]
    Corrupt { path: PathBuf, reason: String },
}

impl LoadError {
    /// Categoría corta, apta para exponer fuera del proceso.
    pub fn category(&self) -> &'static str {
        match self {
            LoadError::NotFound(_) => "not_found",
            LoadError::Corrupt { .. } => "corrupt",
        }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum PreprocessError {
    #[error("Imagen no decodificable: {0}")]
    UndecodableImage(String),
    #[error("Tamaño configurado {got:?} no coincide con la entrada del modelo {expected:?}")]
    ShapeMismatch { expected: (u32, u32), got: (u32, u32) },
}

#[derive(Debug, Error, PartialEq)]
pub enum InferenceError {
    #[error("Modelo no disponible")]
    ModelUnavailable,
    #[error("Fallo de inferencia: {0}")]
    Failed(String),
}

#[derive(Debug, Error, PartialEq)]
pub enum PredictError {
    #[error(transparent)]
    Preprocess(#[from] PreprocessError),
    #[error(transparent)]
    Inference(#[from] InferenceError),
}

/// Cómo debe tratar el llamador cada fallo.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Client,
    Unavailable,
    Internal,
}

impl PredictError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            PredictError::Preprocess(PreprocessError::UndecodableImage(_)) => ErrorKind::Client,
            PredictError::Preprocess(PreprocessError::ShapeMismatch { .. }) => ErrorKind::Internal,
            PredictError::Inference(InferenceError::ModelUnavailable) => ErrorKind::Unavailable,
            PredictError::Inference(InferenceError::Failed(_)) => ErrorKind::Internal,
        }
    }
}
