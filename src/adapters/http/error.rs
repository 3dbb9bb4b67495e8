use axum::{http::StatusCode, response::{IntoResponse, Response}, Json};

use crate::application::dto::ErrorResponse;
use crate::domain::errors::{ErrorKind, PredictError};

/// Mensajes públicos. La causa concreta solo va al log.
const MSG_NOT_IMAGE: &str = "File yang diunggah harus berupa gambar.";
const MSG_UNREADABLE: &str = "Gambar tidak dapat dibaca.";
const MSG_UNAVAILABLE: &str =
    "Model tidak tersedia atau gagal dimuat saat startup. Periksa log server.";
const MSG_INTERNAL: &str = "Kesalahan internal pada server.";
pub const MSG_BAD_UPLOAD: &str = "Unggahan tidak valid atau terlalu besar.";

#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    Status(StatusCode, String),
    Unavailable,
    Internal,
}

impl ApiError {
    pub fn not_an_image() -> Self {
        ApiError::BadRequest(MSG_NOT_IMAGE.into())
    }

    /// Conserva el código (400, 413) pero no el texto del parser.
    pub fn bad_upload(status: StatusCode) -> Self {
        ApiError::Status(status, MSG_BAD_UPLOAD.into())
    }
}

impl From<PredictError> for ApiError {
    fn from(e: PredictError) -> Self {
        match e.kind() {
            ErrorKind::Client => ApiError::BadRequest(MSG_UNREADABLE.into()),
            ErrorKind::Unavailable => ApiError::Unavailable,
            ErrorKind::Internal => ApiError::Internal,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, detail) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Status(status, msg) => (status, msg),
            ApiError::Unavailable => (StatusCode::SERVICE_UNAVAILABLE, MSG_UNAVAILABLE.into()),
            ApiError::Internal => (StatusCode::INTERNAL_SERVER_ERROR, MSG_INTERNAL.into()),
        };
        (status, Json(ErrorResponse::new(detail))).into_response()
    }
}
