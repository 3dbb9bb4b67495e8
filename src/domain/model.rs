use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Tamaño de entrada de la red: (ancho, alto) en píxeles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetSize {
    pub width: u32,
    pub height: u32,
}

impl Default for TargetSize {
    fn default() -> Self {
        Self { width: 224, height: 224 }
    }
}

impl fmt::Display for TargetSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.width, self.height)
    }
}

/// Acepta `(224, 224)`, `224,224` o `224x224`.
impl FromStr for TargetSize {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let inner = s.trim().trim_start_matches('(').trim_end_matches(')');
        let parts: Vec<&str> = inner
            .split(|c: char| c == ',' || c == 'x')
            .map(str::trim)
            .collect();
        let [w, h] = parts.as_slice() else {
            return Err(format!("tamaño inválido '{s}', se esperaba (ancho, alto)"));
        };
        let width: u32 = w.parse().map_err(|_| format!("ancho inválido '{w}'"))?;
        let height: u32 = h.parse().map_err(|_| format!("alto inválido '{h}'"))?;
        if width == 0 || height == 0 {
            return Err(format!("tamaño nulo '{s}'"));
        }
        Ok(Self { width, height })
    }
}

/// Filtro de remuestreo. Debe coincidir con el usado en entrenamiento.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResizeFilter {
    Nearest,
    Triangle,
    /// Bicúbico, equivalente al filtro por defecto de PIL.
    #[default]
    CatmullRom,
    Gaussian,
    Lanczos3,
}

/// Cuándo se carga el modelo. Una vez existe el handle las tres se comportan igual.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoadStrategy {
    /// Antes de abrir el puerto.
    Eager,
    /// En la primera petición de predicción.
    Lazy,
    /// Tarea de arranque en segundo plano.
    #[default]
    Hook,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChannelOrder {
    Rgb,
}

/// Metadatos de entrada que espera el grafo cargado.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputSpec {
    pub name: String,
    pub size: TargetSize,
    pub channels: ChannelOrder,
}
