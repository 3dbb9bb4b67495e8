use serde::{Deserialize, Serialize};

use crate::application::lifecycle::LoadState;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    pub status: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub detail: String,
}

impl ErrorResponse {
    pub fn new(detail: impl Into<String>) -> Self {
        Self { detail: detail.into() }
    }
}

/// Estado de preparación del modelo para `/health`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub ready: bool,
    pub model_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_size: Option<[u32; 2]>,
}

impl HealthResponse {
    pub fn from_state(state: &LoadState, model_path: String) -> Self {
        let (ready, detail, input_size) = match state {
            LoadState::Ready(h) => {
                let size = h.input().size;
                (h.is_ready(), None, Some([size.width, size.height]))
            }
            LoadState::Failed(e) => (false, Some(e.category().to_string()), None),
            LoadState::Unloaded | LoadState::Released => (false, None, None),
        };
        Self {
            status: state.name().to_string(),
            ready,
            model_path,
            detail,
            input_size,
        }
    }
}
