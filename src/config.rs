use anyhow::{ensure, Context, Result};
use clap::Parser;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::adapters::onnx::classifier::SessionOptions;
use crate::domain::model::{LoadStrategy, ResizeFilter, TargetSize};
use crate::domain::prediction::{ClassLabelSet, SuggestionCatalog};

/// Servicio de detección de enfermedades de la piel
#[derive(Parser, Debug, Clone)]
#[command(name = "lesion-classifier", version, about = "API de clasificación de lesiones cutáneas (ONNX)")]
pub struct Cli {
    /// Dirección de escucha
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Puerto HTTP
    #[arg(long, env = "PORT", default_value_t = 8000)]
    pub port: u16,

    /// Ruta al modelo ONNX
    #[arg(long, env = "MODEL_PATH", default_value = "model/final_best_model.onnx")]
    pub model_path: PathBuf,

    /// Tamaño de entrada (ancho, alto)
    #[arg(long, env = "IMAGE_SIZE", default_value = "(224, 224)")]
    pub image_size: TargetSize,

    /// Lista JSON de etiquetas en el orden de salida del modelo
    #[arg(long, env = "CLASS_NAMES", default_value = r#"["Chickenpox", "Measles", "Monkeypox", "Normal"]"#)]
    pub class_names: String,

    /// Fichero JSON {etiqueta: [consejos]}; sin él se usa el catálogo integrado
    #[arg(long, env = "SUGGESTIONS_FILE")]
    pub suggestions_file: Option<PathBuf>,

    /// Lista JSON de orígenes CORS; "*" permite cualquiera
    #[arg(long, env = "ALLOWED_ORIGINS", default_value = r#"["*"]"#)]
    pub allowed_origins: String,

    /// Cuándo cargar el modelo
    #[arg(long, env = "LOAD_STRATEGY", value_enum, default_value_t = LoadStrategy::Hook)]
    pub load_strategy: LoadStrategy,

    /// Filtro de redimensionado
    #[arg(long, env = "RESIZE_FILTER", value_enum, default_value_t = ResizeFilter::CatmullRom)]
    pub resize_filter: ResizeFilter,

    /// Hilos intra-op de ONNX Runtime
    #[arg(long, env = "INTRA_THREADS", default_value_t = 4)]
    pub intra_threads: usize,

    /// Intentar usar CUDA
    #[arg(long, env = "USE_CUDA")]
    pub cuda: bool,

    /// Tamaño máximo del cuerpo de la petición
    #[arg(long, env = "MAX_UPLOAD_BYTES", default_value_t = 10 * 1024 * 1024)]
    pub max_upload_bytes: usize,
}

/// Configuración ya validada.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub addr: String,
    pub model_path: PathBuf,
    pub target_size: TargetSize,
    pub labels: ClassLabelSet,
    pub catalog: SuggestionCatalog,
    pub allowed_origins: Vec<String>,
    pub strategy: LoadStrategy,
    pub resize_filter: ResizeFilter,
    pub session: SessionOptions,
    pub max_upload_bytes: usize,
}

impl Cli {
    pub fn into_config(self) -> Result<AppConfig> {
        let labels = parse_class_names(&self.class_names)?;
        let catalog = match &self.suggestions_file {
            Some(path) => load_catalog(path)?,
            None => SuggestionCatalog::default(),
        };
        let allowed_origins: Vec<String> = serde_json::from_str(&self.allowed_origins)
            .with_context(|| format!("ALLOWED_ORIGINS no es una lista JSON: {}", self.allowed_origins))?;
        ensure!(self.intra_threads > 0, "INTRA_THREADS debe ser mayor que 0");

        Ok(AppConfig {
            addr: format!("{}:{}", self.host, self.port),
            model_path: self.model_path,
            target_size: self.image_size,
            labels,
            catalog,
            allowed_origins,
            strategy: self.load_strategy,
            resize_filter: self.resize_filter,
            session: SessionOptions { intra_threads: self.intra_threads, cuda: self.cuda },
            max_upload_bytes: self.max_upload_bytes,
        })
    }
}

fn parse_class_names(raw: &str) -> Result<ClassLabelSet> {
    let names: Vec<String> = serde_json::from_str(raw)
        .with_context(|| format!("CLASS_NAMES no es una lista JSON: {raw}"))?;
    let labels = ClassLabelSet::new(names);
    ensure!(!labels.is_empty(), "CLASS_NAMES no puede estar vacía");
    Ok(labels)
}

fn load_catalog(path: &Path) -> Result<SuggestionCatalog> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("no se pudo leer {}", path.display()))?;
    let entries: HashMap<String, Vec<String>> = serde_json::from_str(&raw)
        .with_context(|| format!("{} no es un catálogo JSON válido", path.display()))?;
    Ok(SuggestionCatalog::new(entries))
}
