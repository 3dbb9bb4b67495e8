use image::{imageops::FilterType, RgbImage};
use ndarray::Array4;

use crate::application::ports::PreprocessorPort;
use crate::domain::errors::PreprocessError;
use crate::domain::model::{ResizeFilter, TargetSize};

/// Medias por canal de ImageNet en orden BGR (modo "caffe" de Keras para VGG).
pub const VGG_MEAN_BGR: [f32; 3] = [103.939, 116.779, 123.68];

impl From<ResizeFilter> for FilterType {
    fn from(f: ResizeFilter) -> Self {
        match f {
            ResizeFilter::Nearest => FilterType::Nearest,
            ResizeFilter::Triangle => FilterType::Triangle,
            ResizeFilter::CatmullRom => FilterType::CatmullRom,
            ResizeFilter::Gaussian => FilterType::Gaussian,
            ResizeFilter::Lanczos3 => FilterType::Lanczos3,
        }
    }
}

/// Preprocesado de la familia VGG: RGB forzado, redimensionado fijo,
/// lote de 1 y resta de medias en BGR sin escalar.
pub struct VggPreprocessor {
    filter: ResizeFilter,
}

impl VggPreprocessor {
    pub fn new(filter: ResizeFilter) -> Self {
        Self { filter }
    }
}

impl PreprocessorPort for VggPreprocessor {
    fn preprocess(&self, bytes: &[u8], target: TargetSize) -> Result<Array4<f32>, PreprocessError> {
        let img = image::load_from_memory(bytes)
            .map_err(|e| PreprocessError::UndecodableImage(e.to_string()))?;

        // Siempre a RGB de 8 bits: quita alfa y expande escala de grises.
        let rgb = img.to_rgb8();
        let resized = image::imageops::resize(&rgb, target.width, target.height, self.filter.into());

        Ok(to_vgg_tensor(&resized))
    }
}

fn to_vgg_tensor(rgb: &RgbImage) -> Array4<f32> {
    let (w, h) = rgb.dimensions();
    let mut input = Array4::<f32>::zeros((1, h as usize, w as usize, 3));
    for (x, y, pixel) in rgb.enumerate_pixels() {
        let (x, y) = (x as usize, y as usize);
        input[[0, y, x, 0]] = pixel[2] as f32 - VGG_MEAN_BGR[0];
        input[[0, y, x, 1]] = pixel[1] as f32 - VGG_MEAN_BGR[1];
        input[[0, y, x, 2]] = pixel[0] as f32 - VGG_MEAN_BGR[2];
    }
    input
}
