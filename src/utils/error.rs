use thiserror::Error;

#[derive(Error, Debug)]
pub enum HoneycombError {
    #[error("HTTP request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Manifest parsing error: {0}")]
    ManifestError(#[from] serde_yaml::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Missing configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid value for {field} ({value}): {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Validation error on {field}: {message}")]
    ValidationError { field: String, message: String },

    #[error("Geometry error: {message}")]
    GeometryError { message: String },

    #[error("Run exceeds limit: {message}")]
    LimitExceeded { message: String },

    #[error("Storage upload failed ({status}): {message}")]
    StorageError { status: u16, message: String },

    #[error("{generator}: all batch runs failed")]
    BatchFailed { generator: String },

    #[error("Storage client is not initialised")]
    StorageUnavailable,

    #[error("Background task failed: {0}")]
    TaskError(#[from] tokio::task::JoinError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl HoneycombError {
    pub fn validation(field: &str, message: impl Into<String>) -> Self {
        HoneycombError::ValidationError {
            field: field.to_string(),
            message: message.into(),
        }
    }

    pub fn geometry(message: impl Into<String>) -> Self {
        HoneycombError::GeometryError {
            message: message.into(),
        }
    }

    /// 錯誤嚴重程度，CLI 用來決定退出碼
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            HoneycombError::LimitExceeded { .. } => ErrorSeverity::Low,
            HoneycombError::ApiError(_) | HoneycombError::StorageError { .. } => {
                ErrorSeverity::Medium
            }
            HoneycombError::ValidationError { .. }
            | HoneycombError::GeometryError { .. }
            | HoneycombError::BatchFailed { .. }
            | HoneycombError::SerializationError(_)
            | HoneycombError::ManifestError(_) => ErrorSeverity::High,
            HoneycombError::IoError(_)
            | HoneycombError::ConfigError { .. }
            | HoneycombError::MissingConfigError { .. }
            | HoneycombError::InvalidConfigValueError { .. }
            | HoneycombError::StorageUnavailable
            | HoneycombError::TaskError(_) => ErrorSeverity::Critical,
        }
    }

    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            HoneycombError::ValidationError { .. } | HoneycombError::InvalidConfigValueError { .. }
        )
    }

    pub fn exit_code(&self) -> i32 {
        match self.severity() {
            ErrorSeverity::Low => 0,
            ErrorSeverity::Medium => 2,
            ErrorSeverity::High => 1,
            ErrorSeverity::Critical => 3,
        }
    }
}

pub type Result<T> = std::result::Result<T, HoneycombError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_maps_to_exit_code() {
        let err = HoneycombError::validation("job_id", "empty");
        assert_eq!(err.severity(), ErrorSeverity::High);
        assert_eq!(err.exit_code(), 1);
        assert!(err.is_client_error());

        let err = HoneycombError::StorageError {
            status: 502,
            message: "bad gateway".to_string(),
        };
        assert_eq!(err.exit_code(), 2);
        assert!(!err.is_client_error());

        assert_eq!(HoneycombError::StorageUnavailable.exit_code(), 3);
    }

    #[test]
    fn test_error_display() {
        let err = HoneycombError::InvalidConfigValueError {
            field: "port".to_string(),
            value: "0".to_string(),
            reason: "Value must be at least 1".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Invalid value for port (0): Value must be at least 1"
        );
    }
}
