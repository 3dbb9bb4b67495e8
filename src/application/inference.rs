use ndarray::Array4;
use tracing::error;

use crate::application::lifecycle::ModelHandle;
use crate::domain::{
    errors::InferenceError,
    prediction::{ClassLabelSet, PredictionResult, SuggestionCatalog},
};

const DISTRIBUTION_TOLERANCE: f32 = 1e-3;

/// Ejecuta el modelo y decodifica la salida. Sin efectos secundarios.
pub fn infer(
    handle: &ModelHandle,
    input: Array4<f32>,
    labels: &ClassLabelSet,
    catalog: &SuggestionCatalog,
) -> Result<PredictionResult, InferenceError> {
    if !handle.is_ready() {
        return Err(InferenceError::ModelUnavailable);
    }

    let scores = handle.classifier().classify(input).map_err(|e| {
        error!(error = ?e, "Fallo en el pase hacia delante");
        InferenceError::Failed("forward pass failed".into())
    })?;

    decode(&scores, labels, catalog)
}

/// Argmax (primer índice en empate), búsqueda de etiqueta y de consejos.
pub fn decode(
    scores: &[f32],
    labels: &ClassLabelSet,
    catalog: &SuggestionCatalog,
) -> Result<PredictionResult, InferenceError> {
    if scores.is_empty() {
        error!("El modelo devolvió un vector vacío");
        return Err(InferenceError::Failed("empty model output".into()));
    }
    if scores.iter().any(|v| !v.is_finite()) {
        error!(?scores, "El modelo devolvió valores no finitos");
        return Err(InferenceError::Failed("non-finite model output".into()));
    }

    let probabilities = to_probabilities(scores);
    let (index, confidence) = probabilities
        .iter()
        .copied()
        .enumerate()
        .fold((0, f32::NEG_INFINITY), |best, (i, p)| if p > best.1 { (i, p) } else { best });

    let label = labels.label_for(index).to_string();
    let suggestions = catalog.suggestions_for(&label).to_vec();

    Ok(PredictionResult {
        label,
        confidence: confidence.clamp(0.0, 1.0),
        suggestions,
    })
}

/// La confianza siempre es una probabilidad: si la salida ya es una distribución
/// se usa tal cual, si no se aplica softmax.
pub fn to_probabilities(scores: &[f32]) -> Vec<f32> {
    if is_distribution(scores) {
        return scores.to_vec();
    }
    let max = scores.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let exps: Vec<f32> = scores.iter().map(|v| (v - max).exp()).collect();
    let sum: f32 = exps.iter().sum();
    exps.into_iter().map(|e| e / sum).collect()
}

fn is_distribution(scores: &[f32]) -> bool {
    let in_range = scores.iter().all(|v| (0.0..=1.0).contains(v));
    let sum: f32 = scores.iter().sum();
    in_range && (sum - 1.0).abs() <= DISTRIBUTION_TOLERANCE
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::lifecycle::ModelLifecycle;
    use crate::application::testing::{loaded, FakeClassifier, FakeLoader};
    use crate::domain::prediction::UNKNOWN_LABEL;
    use std::path::Path;
    use std::sync::Arc;

    fn tensor() -> Array4<f32> {
        Array4::zeros((1, 224, 224, 3))
    }

    fn handle(classifier: Arc<FakeClassifier>) -> ModelHandle {
        ModelHandle::new(loaded(classifier))
    }

    #[test]
    fn monkeypox_scenario() {
        let labels = ClassLabelSet::default();
        let catalog = SuggestionCatalog::default();
        let h = handle(Arc::new(FakeClassifier::new(vec![0.1, 0.05, 0.8, 0.05])));

        let result = infer(&h, tensor(), &labels, &catalog).unwrap();

        assert_eq!(result.label, "Monkeypox");
        assert!((result.confidence - 0.8).abs() < 1e-6);
        assert_eq!(result.suggestions, catalog.suggestions_for("Monkeypox"));
    }

    #[test]
    fn index_past_label_set_is_unknown() {
        let labels = ClassLabelSet::new(vec!["A".into(), "B".into()]);
        let catalog = SuggestionCatalog::default();

        let result = decode(&[0.1, 0.1, 0.7, 0.1], &labels, &catalog).unwrap();

        assert_eq!(result.label, UNKNOWN_LABEL);
        assert_eq!(result.suggestions, catalog.fallback());
    }

    #[test]
    fn label_without_catalog_entry_gets_fallback() {
        let labels = ClassLabelSet::new(vec!["Psoriasis".into()]);
        let catalog = SuggestionCatalog::default();

        let result = decode(&[1.0], &labels, &catalog).unwrap();

        assert_eq!(result.label, "Psoriasis");
        assert!(!result.suggestions.is_empty());
        assert_eq!(result.suggestions, catalog.fallback());
    }

    #[tokio::test]
    async fn not_ready_handle_never_runs_forward_pass() {
        let classifier = Arc::new(FakeClassifier::new(vec![1.0]));
        let lc = ModelLifecycle::new(Arc::new(FakeLoader::shared(classifier.clone())));
        let released = lc.initialize(Path::new("m")).await.unwrap();
        lc.release();

        let err = infer(&released, tensor(), &ClassLabelSet::default(), &SuggestionCatalog::default())
            .unwrap_err();

        assert_eq!(err, InferenceError::ModelUnavailable);
        assert_eq!(classifier.calls(), 0);
    }

    #[test]
    fn classifier_fault_is_generic() {
        let h = handle(Arc::new(FakeClassifier::broken()));

        let err = infer(&h, tensor(), &ClassLabelSet::default(), &SuggestionCatalog::default())
            .unwrap_err();

        match err {
            InferenceError::Failed(msg) => assert!(!msg.contains("node 42")),
            other => panic!("error inesperado: {other:?}"),
        }
    }

    #[test]
    fn empty_or_nan_output_fails() {
        let labels = ClassLabelSet::default();
        let catalog = SuggestionCatalog::default();
        assert!(matches!(decode(&[], &labels, &catalog), Err(InferenceError::Failed(_))));
        assert!(matches!(
            decode(&[0.2, f32::NAN], &labels, &catalog),
            Err(InferenceError::Failed(_))
        ));
    }

    #[test]
    fn logits_are_softmaxed() {
        let probs = to_probabilities(&[2.0, 1.0, 0.1]);
        let sum: f32 = probs.iter().sum();
        assert!((sum - 1.0).abs() < 1e-5);
        assert!(probs[0] > probs[1] && probs[1] > probs[2]);

        let result = decode(&[2.0, 1.0, 0.1], &ClassLabelSet::default(), &SuggestionCatalog::default())
            .unwrap();
        assert_eq!(result.label, "Chickenpox");
        assert!(result.confidence > 0.0 && result.confidence < 1.0);
    }

    #[test]
    fn ties_pick_first_index() {
        let result = decode(&[0.5, 0.5], &ClassLabelSet::default(), &SuggestionCatalog::default())
            .unwrap();
        assert_eq!(result.label, "Chickenpox");
    }
}
