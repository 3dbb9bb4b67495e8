use std::fmt;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use tokio::sync::Mutex;
use tracing::{error, info, warn};

use crate::application::ports::{ClassifierPort, LoadedModel, ModelLoaderPort};
use crate::domain::{errors::LoadError, model::InputSpec};

/// Referencia a un grafo cargado y listo. Clonar es barato; todos los clones
/// comparten el mismo indicador de disponibilidad.
#[derive(Clone)]
pub struct ModelHandle {
    ready: Arc<AtomicBool>,
    classifier: Arc<dyn ClassifierPort>,
    input: InputSpec,
    output_len: Option<usize>,
}

impl ModelHandle {
    pub fn new(model: LoadedModel) -> Self {
        Self {
            ready: Arc::new(AtomicBool::new(true)),
            classifier: model.classifier,
            input: model.input,
            output_len: model.output_len,
        }
    }

    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::Acquire)
    }

    pub fn input(&self) -> &InputSpec {
        &self.input
    }

    pub fn output_len(&self) -> Option<usize> {
        self.output_len
    }

    pub(crate) fn classifier(&self) -> &dyn ClassifierPort {
        self.classifier.as_ref()
    }

    fn mark_released(&self) {
        self.ready.store(false, Ordering::Release);
    }
}

impl fmt::Debug for ModelHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelHandle")
            .field("ready", &self.is_ready())
            .field("input", &self.input)
            .field("output_len", &self.output_len)
            .finish()
    }
}

#[derive(Debug, Clone)]
pub enum LoadState {
    Unloaded,
    Ready(ModelHandle),
    Failed(LoadError),
    Released,
}

impl LoadState {
    pub fn name(&self) -> &'static str {
        match self {
            LoadState::Unloaded => "unloaded",
            LoadState::Ready(_) => "ready",
            LoadState::Failed(_) => "failed",
            LoadState::Released => "released",
        }
    }
}

/// Dueño único del modelo en el proceso.
/// La carga se serializa con `load_guard`; la inferencia no pasa por aquí.
pub struct ModelLifecycle {
    slot: Arc<Slot>,
    load_guard: Arc<Mutex<()>>,
    expected_outputs: Option<usize>,
}

// Parte compartida con la tarea de carga, que sobrevive al llamador.
struct Slot {
    loader: Arc<dyn ModelLoaderPort>,
    state: RwLock<LoadState>,
    // Cargas terminadas. Permite a quien esperaba el candado reutilizar el resultado.
    attempts: AtomicU64,
}

impl ModelLifecycle {
    pub fn new(loader: Arc<dyn ModelLoaderPort>) -> Self {
        Self {
            slot: Arc::new(Slot {
                loader,
                state: RwLock::new(LoadState::Unloaded),
                attempts: AtomicU64::new(0),
            }),
            load_guard: Arc::new(Mutex::new(())),
            expected_outputs: None,
        }
    }

    /// Número de etiquetas configuradas; se contrasta con la salida del grafo al cargar.
    pub fn with_expected_outputs(mut self, n: usize) -> Self {
        self.expected_outputs = Some(n);
        self
    }

    /// Carga el modelo si no está cargado. Llamadas posteriores devuelven el handle en caché.
    /// Si otra carga está en curso se espera a ella y se devuelve su resultado.
    ///
    /// La carga corre en una tarea propia que retiene el candado: cancelar al
    /// llamador no la interrumpe ni permite que arranque otra en paralelo.
    pub async fn initialize(&self, path: &Path) -> Result<ModelHandle, LoadError> {
        if let Some(handle) = self.current() {
            return Ok(handle);
        }

        let seen = self.slot.attempts.load(Ordering::Acquire);
        let guard = self.load_guard.clone().lock_owned().await;

        match self.state() {
            LoadState::Ready(handle) => return Ok(handle),
            LoadState::Failed(err) if self.slot.attempts.load(Ordering::Acquire) != seen => {
                return Err(err)
            }
            _ => {}
        }

        let slot = self.slot.clone();
        let owned = path.to_path_buf();
        let expected_outputs = self.expected_outputs;
        let task = tokio::spawn(async move {
            let result = slot.load(&owned, expected_outputs).await;
            drop(guard);
            result
        });

        match task.await {
            Ok(result) => result,
            Err(e) => {
                let err = LoadError::Corrupt {
                    path: path.to_path_buf(),
                    reason: format!("la tarea de carga terminó de forma anómala: {e}"),
                };
                error!(error = %err, "Carga del modelo abortada");
                self.slot.attempts.fetch_add(1, Ordering::AcqRel);
                self.slot.set_state(LoadState::Failed(err.clone()));
                Err(err)
            }
        }
    }

    /// Carga solo si nunca se ha intentado. Un fallo previo no se reintenta.
    pub async fn load_once(&self, path: &Path) -> Option<ModelHandle> {
        match self.state() {
            LoadState::Ready(handle) => Some(handle),
            LoadState::Unloaded => self.initialize(path).await.ok(),
            LoadState::Failed(_) | LoadState::Released => None,
        }
    }

    /// No bloquea ni falla.
    pub fn current(&self) -> Option<ModelHandle> {
        match self.state() {
            LoadState::Ready(handle) => Some(handle),
            _ => None,
        }
    }

    pub fn state(&self) -> LoadState {
        self.slot.state()
    }

    pub fn release(&self) {
        let mut state = self.slot.state.write().unwrap_or_else(PoisonError::into_inner);
        if let LoadState::Ready(handle) = &*state {
            handle.mark_released();
            info!("Modelo liberado");
        }
        *state = LoadState::Released;
    }
}

impl Slot {
    async fn load(&self, path: &Path, expected_outputs: Option<usize>) -> Result<ModelHandle, LoadError> {
        info!(path = %path.display(), "Cargando modelo...");
        let result = self.loader.load(path).await;
        self.attempts.fetch_add(1, Ordering::AcqRel);

        match result {
            Ok(model) => {
                let handle = ModelHandle::new(model);
                info!(
                    input = %handle.input().name,
                    size = %handle.input().size,
                    output_len = ?handle.output_len(),
                    "✅ Modelo cargado"
                );
                check_output_len(expected_outputs, &handle);
                self.set_state(LoadState::Ready(handle.clone()));
                Ok(handle)
            }
            Err(err) => {
                warn!(error = %err, "Modelo no disponible, el servicio sigue en modo degradado");
                self.set_state(LoadState::Failed(err.clone()));
                Err(err)
            }
        }
    }

    fn state(&self) -> LoadState {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn set_state(&self, next: LoadState) {
        *self.state.write().unwrap_or_else(PoisonError::into_inner) = next;
    }
}

// Un desajuste no impide servir: los índices fuera de rango acaban en "Unknown".
fn check_output_len(expected: Option<usize>, handle: &ModelHandle) {
    if let (Some(expected), Some(actual)) = (expected, handle.output_len()) {
        if expected != actual {
            error!(
                labels = expected,
                outputs = actual,
                "El número de etiquetas no coincide con la salida del modelo"
            );
        }
    }
}
