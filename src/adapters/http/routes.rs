use axum::{
    extract::{
        multipart::{Field, MultipartError},
        Multipart, State,
    },
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use tracing::{debug, warn};

use crate::adapters::http::{error::ApiError, state::HttpState};
use crate::application::dto::{HealthResponse, StatusResponse};

const UPLOAD_FIELD: &str = "file";
const IMAGE_EXTENSIONS: [&str; 9] = ["jpg", "jpeg", "png", "bmp", "gif", "webp", "tif", "tiff", "ico"];

pub async fn wakeup() -> impl IntoResponse {
    Json(StatusResponse { status: "ok".into() })
}

pub async fn health(State(st): State<HttpState>) -> impl IntoResponse {
    let state = st.prediction.readiness();
    let body = HealthResponse::from_state(&state, st.prediction.model_path().display().to_string());
    let status = if body.ready { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };
    (status, Json(body))
}

pub async fn predict(
    State(st): State<HttpState>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let bytes = read_upload(&mut multipart).await?;
    let result = st.prediction.predict(bytes).await?;
    Ok(Json(result))
}

async fn read_upload(multipart: &mut Multipart) -> Result<Vec<u8>, ApiError> {
    loop {
        let field = multipart
            .next_field()
            .await
            .map_err(upload_error)?;

        let Some(field) = field else {
            return Err(ApiError::BadRequest(format!("Field '{UPLOAD_FIELD}' wajib diisi.")));
        };
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }

        validate_upload(&field)?;
        let bytes = field
            .bytes()
            .await
            .map_err(upload_error)?;
        return Ok(bytes.to_vec());
    }
}

fn upload_error(e: MultipartError) -> ApiError {
    debug!(error = %e, "Multipart inválido");
    ApiError::bad_upload(e.status())
}

/// Filtro previo al preprocesado: tipo declarado `image/*` y extensión conocida.
fn validate_upload(field: &Field<'_>) -> Result<(), ApiError> {
    let content_type = field.content_type().unwrap_or_default();
    if !is_image_upload(content_type, field.file_name()) {
        warn!(content_type, file_name = ?field.file_name(), "Subida rechazada: no es una imagen");
        return Err(ApiError::not_an_image());
    }
    debug!(content_type, file_name = ?field.file_name(), "Subida aceptada");
    Ok(())
}

fn is_image_upload(content_type: &str, file_name: Option<&str>) -> bool {
    if !content_type.to_ascii_lowercase().starts_with("image/") {
        return false;
    }
    let extension = file_name
        .and_then(|name| std::path::Path::new(name).extension())
        .map(|ext| ext.to_string_lossy().to_ascii_lowercase());
    match extension {
        Some(ext) => IMAGE_EXTENSIONS.contains(&ext.as_str()),
        None => true,
    }
}
