use thiserror::Error;

#[derive(Error, Debug)]
pub enum PharmacyError {
    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Configuration validation failed for '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Validation error: {message}")]
    ValidationError { message: String },

    #[error("Prescription extraction failed: {message}")]
    ExtractionError { message: String },

    #[error("Failed to parse prescription data: {message}")]
    ModelResponseError { message: String, raw: String },

    #[error("No file provided")]
    EmptyUpload,

    #[error("File size {size} bytes exceeds the {limit} byte limit")]
    FileTooLarge { size: usize, limit: usize },

    #[error("Upload exceeds the {limit} byte limit")]
    UploadTooLarge { limit: usize },

    #[error("Unsupported file type: {mime_type}")]
    UnsupportedFileType { mime_type: String },

    #[error("Medicine not found: {id}")]
    MedicineNotFound { id: String },

    #[error("{name} is out of stock")]
    OutOfStock { name: String },

    #[error("Only {available} of {name} available in stock")]
    InsufficientStock { name: String, available: u32 },

    #[error("Invalid quantity {quantity} for medicine {id}")]
    InvalidQuantity { id: String, quantity: u32 },

    #[error("Cart is empty")]
    EmptyCart,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Network,
    Extraction,
    Upload,
    Cart,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl PharmacyError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            PharmacyError::ConfigError { .. }
            | PharmacyError::ConfigValidationError { .. }
            | PharmacyError::InvalidConfigValueError { .. }
            | PharmacyError::MissingConfigError { .. } => ErrorCategory::Configuration,
            PharmacyError::ApiError(_) => ErrorCategory::Network,
            PharmacyError::ExtractionError { .. } | PharmacyError::ModelResponseError { .. } => {
                ErrorCategory::Extraction
            }
            PharmacyError::EmptyUpload
            | PharmacyError::FileTooLarge { .. }
            | PharmacyError::UploadTooLarge { .. }
            | PharmacyError::UnsupportedFileType { .. } => ErrorCategory::Upload,
            PharmacyError::MedicineNotFound { .. }
            | PharmacyError::OutOfStock { .. }
            | PharmacyError::InsufficientStock { .. }
            | PharmacyError::InvalidQuantity { .. }
            | PharmacyError::EmptyCart
            | PharmacyError::ValidationError { .. } => ErrorCategory::Cart,
            PharmacyError::IoError(_) | PharmacyError::SerializationError(_) => {
                ErrorCategory::System
            }
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Upload | ErrorCategory::Cart => ErrorSeverity::Low,
            ErrorCategory::Network | ErrorCategory::Extraction => ErrorSeverity::Medium,
            ErrorCategory::Configuration => ErrorSeverity::High,
            ErrorCategory::System => ErrorSeverity::Critical,
        }
    }

    /// 供使用者參考的處理建議
    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            PharmacyError::MissingConfigError { .. } => {
                "Set the missing value in the config file or via environment (e.g. GEMINI_API_KEY)"
            }
            PharmacyError::ConfigError { .. }
            | PharmacyError::ConfigValidationError { .. }
            | PharmacyError::InvalidConfigValueError { .. } => {
                "Check the configuration file for typos and invalid values"
            }
            PharmacyError::ApiError(_) => "Check your network connection and retry the upload",
            PharmacyError::ExtractionError { .. } | PharmacyError::ModelResponseError { .. } => {
                "Retry the upload with a clearer image, or select medicines manually"
            }
            PharmacyError::EmptyUpload => "Attach a prescription file and try again",
            PharmacyError::FileTooLarge { .. } | PharmacyError::UploadTooLarge { .. } => {
                "Upload a smaller file"
            }
            PharmacyError::UnsupportedFileType { .. } => "Upload a PDF or JPG prescription",
            PharmacyError::MedicineNotFound { .. } => "Browse the catalog and pick another medicine",
            PharmacyError::OutOfStock { .. } | PharmacyError::InsufficientStock { .. } => {
                "Reduce the quantity or choose an alternative medicine"
            }
            PharmacyError::InvalidQuantity { .. } | PharmacyError::ValidationError { .. } => {
                "Correct the request and try again"
            }
            PharmacyError::EmptyCart => "Add items to the cart before proceeding",
            PharmacyError::IoError(_) | PharmacyError::SerializationError(_) => {
                "Check file permissions and disk space"
            }
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            PharmacyError::ApiError(_) => {
                "Could not reach the prescription reader service".to_string()
            }
            PharmacyError::MissingConfigError { field } if field.contains("api_key") => {
                "Gemini API key not configured".to_string()
            }
            PharmacyError::ExtractionError { .. } => "Failed to process prescription".to_string(),
            PharmacyError::ModelResponseError { .. } => {
                "Failed to parse prescription data".to_string()
            }
            PharmacyError::FileTooLarge { limit, .. }
            | PharmacyError::UploadTooLarge { limit } => {
                format!("File size must be less than {}MB", limit / (1024 * 1024))
            }
            PharmacyError::EmptyCart => {
                "Please add items to cart before proceeding".to_string()
            }
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, PharmacyError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_categories_and_severity() {
        let err = PharmacyError::MissingConfigError {
            field: "gemini.api_key".to_string(),
        };
        assert_eq!(err.category(), ErrorCategory::Configuration);
        assert_eq!(err.severity(), ErrorSeverity::High);
        assert_eq!(err.user_friendly_message(), "Gemini API key not configured");

        let err = PharmacyError::OutOfStock {
            name: "Omeprazole 20mg".to_string(),
        };
        assert_eq!(err.category(), ErrorCategory::Cart);
        assert_eq!(err.severity(), ErrorSeverity::Low);
        assert_eq!(err.to_string(), "Omeprazole 20mg is out of stock");
    }

    #[test]
    fn test_file_too_large_message_in_megabytes() {
        let err = PharmacyError::FileTooLarge {
            size: 11 * 1024 * 1024,
            limit: 10 * 1024 * 1024,
        };
        assert_eq!(err.user_friendly_message(), "File size must be less than 10MB");
        assert_eq!(err.category(), ErrorCategory::Upload);

        let err = PharmacyError::UploadTooLarge {
            limit: 1024 * 1024,
        };
        assert_eq!(err.user_friendly_message(), "File size must be less than 1MB");
        assert_eq!(err.to_string(), "Upload exceeds the 1048576 byte limit");
    }
}
