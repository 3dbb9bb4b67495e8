use anyhow::{anyhow, bail, ensure, Context, Result};
use ndarray::Array4;
use ort::execution_providers::CUDAExecutionProvider;
use ort::session::Session;
use ort::value::{Tensor, ValueType};
use std::path::Path;
use std::sync::Mutex;
use tracing::{debug, info};

use crate::application::ports::ClassifierPort;
use crate::domain::model::{ChannelOrder, InputSpec, TargetSize};

#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub intra_threads: usize,
    pub cuda: bool,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self { intra_threads: 4, cuda: false }
    }
}

/// Clasificador sobre una sesión de ONNX Runtime.
/// `run` exige acceso exclusivo a la sesión, de ahí el `Mutex`.
pub struct OnnxClassifier {
    session: Mutex<Session>,
    input_name: String,
}

impl OnnxClassifier {
    pub fn load(path: &Path, opts: &SessionOptions) -> Result<Self> {
        let mut builder = Session::builder()?.with_intra_threads(opts.intra_threads)?;

        // CUDA es opcional: si no se puede registrar seguimos en CPU.
        if opts.cuda {
            let cuda = CUDAExecutionProvider::default().build();
            match builder.clone().with_execution_providers([cuda]) {
                Ok(with_cuda) => builder = with_cuda,
                Err(e) => info!(error = %e, "CUDA no disponible, usando CPU"),
            }
        }

        let model_bytes = std::fs::read(path)
            .with_context(|| format!("no se pudo leer {}", path.display()))?;
        let session = builder
            .commit_from_memory(&model_bytes)
            .context("no se pudo crear la sesión ONNX")?;

        let input_name = session
            .inputs
            .first()
            .map(|i| i.name.clone())
            .context("el modelo no declara entradas")?;

        Ok(Self { session: Mutex::new(session), input_name })
    }

    /// Metadatos de la primera entrada. Las dimensiones dinámicas toman `fallback`.
    pub fn input_spec(&self, fallback: TargetSize) -> Result<InputSpec> {
        let session = self.session.lock().map_err(|_| anyhow!("sesión envenenada"))?;
        let input = session.inputs.first().context("el modelo no declara entradas")?;
        let ValueType::Tensor { shape, .. } = &input.input_type else {
            bail!("la entrada '{}' no es un tensor", input.name);
        };
        let dims: Vec<i64> = shape.iter().copied().collect();
        let size = nhwc_size(&dims, fallback)?;

        Ok(InputSpec { name: input.name.clone(), size, channels: ChannelOrder::Rgb })
    }

    /// Última dimensión de la primera salida, si es estática.
    pub fn output_len(&self) -> Option<usize> {
        let session = self.session.lock().ok()?;
        let output = session.outputs.first()?;
        match &output.output_type {
            ValueType::Tensor { shape, .. } => shape.last().and_then(|&d| usize::try_from(d).ok()),
            _ => None,
        }
    }
}

impl ClassifierPort for OnnxClassifier {
    fn classify(&self, input: Array4<f32>) -> Result<Vec<f32>> {
        let input_shape = input.shape().to_vec();
        let (data, _) = input.into_raw_vec_and_offset();
        let input_tensor = Tensor::from_array((input_shape, data))?;

        let mut session = self.session.lock().map_err(|_| anyhow!("sesión envenenada"))?;
        let outputs = session.run(ort::inputs![self.input_name.as_str() => input_tensor])?;
        let (shape_out, data_out) = outputs[0].try_extract_tensor::<f32>()?;

        let dims: Vec<i64> = shape_out.iter().copied().collect();
        debug!(?dims, "Salida del modelo");
        single_row(&dims, data_out)
    }
}

/// Admite `[N]`, `[1, N]` o cualquier forma con todas las dimensiones previas a 1.
fn single_row(dims: &[i64], data: &[f32]) -> Result<Vec<f32>> {
    let Some((&last, leading)) = dims.split_last() else {
        bail!("salida escalar inesperada");
    };
    ensure!(
        leading.iter().all(|&d| d == 1),
        "forma de salida {dims:?} no es una sola fila"
    );
    ensure!(
        usize::try_from(last).ok() == Some(data.len()),
        "forma de salida {dims:?} no cuadra con {} valores",
        data.len()
    );
    Ok(data.to_vec())
}

/// Entrada NHWC `[N, H, W, 3]`. Dimensiones negativas son simbólicas.
fn nhwc_size(dims: &[i64], fallback: TargetSize) -> Result<TargetSize> {
    let [_, h, w, c] = dims else {
        bail!("entrada de rango {} no soportada, se espera NHWC", dims.len());
    };
    ensure!(*c < 0 || *c == 3, "entrada con {c} canales no soportada, se espera NHWC con 3");

    let pick = |d: i64, default: u32| u32::try_from(d).ok().filter(|&v| v > 0).unwrap_or(default);
    Ok(TargetSize {
        width: pick(*w, fallback.width),
        height: pick(*h, fallback.height),
    })
}
