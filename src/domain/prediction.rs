use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Etiqueta para índices fuera de la lista configurada.
pub const UNKNOWN_LABEL: &str = "Unknown";

pub const DEFAULT_CLASS_NAMES: [&str; 4] = ["Chickenpox", "Measles", "Monkeypox", "Normal"];

/// Resultado de una inferencia. Se serializa con el nombre de campo `disease`
/// que usan los clientes existentes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PredictionResult {
    #[serde(rename = "disease")]
    pub label: String,
    pub confidence: f32,
    pub suggestions: Vec<String>,
}

/// Etiquetas ordenadas según la posición en el vector de salida del modelo.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassLabelSet(Vec<String>);

impl ClassLabelSet {
    pub fn new(labels: Vec<String>) -> Self {
        Self(labels)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    /// Nunca falla: un índice fuera de rango devuelve `"Unknown"`.
    pub fn label_for(&self, index: usize) -> &str {
        self.0.get(index).map(String::as_str).unwrap_or(UNKNOWN_LABEL)
    }
}

impl Default for ClassLabelSet {
    fn default() -> Self {
        Self(DEFAULT_CLASS_NAMES.iter().map(|s| s.to_string()).collect())
    }
}

/// Consejos por etiqueta con un valor por defecto explícito.
#[derive(Debug, Clone, PartialEq)]
pub struct SuggestionCatalog {
    entries: HashMap<String, Vec<String>>,
    fallback: Vec<String>,
}

impl SuggestionCatalog {
    pub fn new(entries: HashMap<String, Vec<String>>) -> Self {
        Self {
            entries,
            fallback: default_fallback(),
        }
    }

    /// Las entradas vacías cuentan como ausentes: el resultado nunca está vacío.
    pub fn suggestions_for(&self, label: &str) -> &[String] {
        match self.entries.get(label) {
            Some(list) if !list.is_empty() => list,
            _ => &self.fallback,
        }
    }

    pub fn fallback(&self) -> &[String] {
        &self.fallback
    }

    pub fn contains(&self, label: &str) -> bool {
        self.entries.get(label).is_some_and(|l| !l.is_empty())
    }
}

fn default_fallback() -> Vec<String> {
    vec!["Konsultasikan dengan profesional medis.".to_string()]
}

fn owned(lines: &[&str]) -> Vec<String> {
    lines.iter().map(|s| s.to_string()).collect()
}

impl Default for SuggestionCatalog {
    fn default() -> Self {
        let mut entries = HashMap::new();
        entries.insert(
            "Monkeypox".to_string(),
            owned(&[
                "Segera konsultasikan dengan dokter atau fasilitas kesehatan terdekat.",
                "Isolasi diri dan hindari kontak fisik dengan orang lain sampai lesi sembuh.",
                "Jangan menggaruk atau memencet lesi, tutup dengan kain kasa bersih.",
                "Cuci tangan secara rutin dan jangan berbagi handuk atau pakaian.",
            ]),
        );
        entries.insert(
            "Chickenpox".to_string(),
            owned(&[
                "Konsultasikan dengan dokter untuk memastikan diagnosis.",
                "Istirahat yang cukup dan perbanyak minum air putih.",
                "Gunakan losion kalamin untuk meredakan gatal, hindari menggaruk.",
                "Hindari kontak dengan ibu hamil, bayi, dan orang dengan imunitas rendah.",
            ]),
        );
        entries.insert(
            "Measles".to_string(),
            owned(&[
                "Segera hubungi dokter, campak dapat menimbulkan komplikasi serius.",
                "Istirahat di rumah dan hindari kontak dengan orang lain.",
                "Minum cukup cairan dan redakan demam sesuai anjuran dokter.",
                "Pastikan anggota keluarga lain sudah mendapat vaksin MMR.",
            ]),
        );
        entries.insert(
            "Normal".to_string(),
            owned(&[
                "Kulit Anda tampak normal.",
                "Jaga kebersihan kulit dan gunakan tabir surya saat beraktivitas di luar.",
                "Jika muncul keluhan baru, konsultasikan dengan dokter.",
            ]),
        );
        Self::new(entries)
    }
}
