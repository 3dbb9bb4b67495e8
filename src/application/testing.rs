//! Dobles de prueba para los puertos del modelo.

use async_trait::async_trait;
use ndarray::Array4;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::application::ports::{ClassifierPort, LoadedModel, ModelLoaderPort};
use crate::domain::errors::LoadError;
use crate::domain::model::{ChannelOrder, InputSpec, TargetSize};

/// Devuelve siempre el mismo vector y cuenta las llamadas.
pub struct FakeClassifier {
    scores: Vec<f32>,
    calls: AtomicUsize,
    fail: bool,
}

impl FakeClassifier {
    pub fn new(scores: Vec<f32>) -> Self {
        Self { scores, calls: AtomicUsize::new(0), fail: false }
    }

    pub fn broken() -> Self {
        Self { scores: Vec::new(), calls: AtomicUsize::new(0), fail: true }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl ClassifierPort for FakeClassifier {
    fn classify(&self, input: Array4<f32>) -> anyhow::Result<Vec<f32>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        anyhow::ensure!(input.shape()[0] == 1, "batch inesperado");
        if self.fail {
            anyhow::bail!("onnxruntime internal: kernel exploded at node 42");
        }
        Ok(self.scores.clone())
    }
}

pub fn input_spec(size: TargetSize) -> InputSpec {
    InputSpec { name: "input".into(), size, channels: ChannelOrder::Rgb }
}

pub fn loaded(classifier: Arc<FakeClassifier>) -> LoadedModel {
    let output_len = Some(classifier.scores.len());
    LoadedModel {
        classifier,
        input: input_spec(TargetSize::default()),
        output_len,
    }
}

pub struct FakeLoader {
    outcome: Result<Arc<FakeClassifier>, LoadError>,
    delay: Duration,
    loads: AtomicUsize,
}

impl FakeLoader {
    pub fn ok(classifier: FakeClassifier) -> Self {
        Self::shared(Arc::new(classifier))
    }

    pub fn shared(classifier: Arc<FakeClassifier>) -> Self {
        Self { outcome: Ok(classifier), delay: Duration::ZERO, loads: AtomicUsize::new(0) }
    }

    pub fn failing(err: LoadError) -> Self {
        Self { outcome: Err(err), delay: Duration::ZERO, loads: AtomicUsize::new(0) }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn loads(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ModelLoaderPort for FakeLoader {
    async fn load(&self, _path: &Path) -> Result<LoadedModel, LoadError> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.outcome.clone().map(loaded)
    }
}

/// Carga en un hilo bloqueante, como el cargador ONNX, y registra cuántas
/// cargas llegan a solaparse.
pub struct BlockingLoader {
    work: Duration,
    loads: AtomicUsize,
    running: Arc<AtomicUsize>,
    max_concurrent: Arc<AtomicUsize>,
}

impl BlockingLoader {
    pub fn new(work: Duration) -> Self {
        Self {
            work,
            loads: AtomicUsize::new(0),
            running: Arc::new(AtomicUsize::new(0)),
            max_concurrent: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn loads(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }

    pub fn max_concurrent(&self) -> usize {
        self.max_concurrent.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ModelLoaderPort for BlockingLoader {
    async fn load(&self, _path: &Path) -> Result<LoadedModel, LoadError> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        let (work, running, max) = (self.work, self.running.clone(), self.max_concurrent.clone());

        tokio::task::spawn_blocking(move || {
            let now = running.fetch_add(1, Ordering::SeqCst) + 1;
            max.fetch_max(now, Ordering::SeqCst);
            std::thread::sleep(work);
            running.fetch_sub(1, Ordering::SeqCst);
        })
        .await
        .map_err(|e| LoadError::Corrupt { path: "fake".into(), reason: e.to_string() })?;

        Ok(loaded(Arc::new(FakeClassifier::new(vec![1.0]))))
    }
}
