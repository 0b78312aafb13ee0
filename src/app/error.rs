use crate::utils::error::PharmacyError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    pub suggestion: &'static str,
}

impl PharmacyError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            PharmacyError::EmptyUpload
            | PharmacyError::UnsupportedFileType { .. }
            | PharmacyError::ValidationError { .. }
            | PharmacyError::InvalidQuantity { .. }
            | PharmacyError::EmptyCart => StatusCode::BAD_REQUEST,
            PharmacyError::FileTooLarge { .. } | PharmacyError::UploadTooLarge { .. } => {
                StatusCode::PAYLOAD_TOO_LARGE
            }
            PharmacyError::MedicineNotFound { .. } => StatusCode::NOT_FOUND,
            PharmacyError::OutOfStock { .. } | PharmacyError::InsufficientStock { .. } => {
                StatusCode::CONFLICT
            }
            PharmacyError::ApiError(_)
            | PharmacyError::ExtractionError { .. }
            | PharmacyError::ModelResponseError { .. } => StatusCode::BAD_GATEWAY,
            PharmacyError::ConfigError { .. }
            | PharmacyError::ConfigValidationError { .. }
            | PharmacyError::InvalidConfigValueError { .. }
            | PharmacyError::MissingConfigError { .. }
            | PharmacyError::IoError(_)
            | PharmacyError::SerializationError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for PharmacyError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(
                "❌ Request failed: {} (Category: {:?}, Severity: {:?})",
                self,
                self.category(),
                self.severity()
            );
        } else {
            tracing::debug!("Request rejected: {}", self);
        }

        // 模型原始輸出一併回傳，方便使用者判斷處方是否可讀
        let details = match &self {
            PharmacyError::ModelResponseError { raw, .. } => Some(raw.clone()),
            PharmacyError::ConfigError { .. }
            | PharmacyError::ConfigValidationError { .. }
            | PharmacyError::InvalidConfigValueError { .. }
            | PharmacyError::MissingConfigError { .. }
            | PharmacyError::IoError(_)
            | PharmacyError::SerializationError(_) => None,
            other => Some(other.to_string()),
        };

        let body = ErrorBody {
            error: self.user_friendly_message(),
            details,
            suggestion: self.recovery_suggestion(),
        };
        (status, Json(body)).into_response()
    }
}
