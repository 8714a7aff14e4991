use thiserror::Error;

#[derive(Error, Debug)]
pub enum EtlError {
    #[error("Source file not found: {path}")]
    NotFoundError { path: String },

    #[error("Malformed source data in {path}: {message}")]
    FormatError { path: String, message: String },

    #[error("Schema error: {message}")]
    SchemaError { message: String },

    #[error("Transform error: {message}")]
    TransformError { message: String },

    #[error("Load error: {message}")]
    LoadError { message: String },

    #[error("Connection error: {message}")]
    ConnectionError { message: String },

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Scheduler error: {message}")]
    SchedulerError { message: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Input,
    Destination,
    Processing,
    Configuration,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Medium,
    High,
    Critical,
}

impl EtlError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            EtlError::NotFoundError { .. } | EtlError::FormatError { .. } => ErrorCategory::Input,
            EtlError::SchemaError { .. }
            | EtlError::LoadError { .. }
            | EtlError::ConnectionError { .. } => ErrorCategory::Destination,
            EtlError::TransformError { .. } => ErrorCategory::Processing,
            EtlError::ConfigError { .. }
            | EtlError::MissingConfigError { .. }
            | EtlError::InvalidConfigValueError { .. } => ErrorCategory::Configuration,
            EtlError::SchedulerError { .. } | EtlError::IoError(_) => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            // 目的端暫時無法連線，排程重試可能成功
            EtlError::ConnectionError { .. } | EtlError::NotFoundError { .. } => {
                ErrorSeverity::Medium
            }
            EtlError::SchedulerError { .. } | EtlError::IoError(_) => ErrorSeverity::Critical,
            _ => ErrorSeverity::High,
        }
    }

    /// Process exit code for a run that ended with this error. Never zero.
    pub fn exit_code(&self) -> i32 {
        match self.severity() {
            ErrorSeverity::Medium => 2,
            ErrorSeverity::High => 1,
            ErrorSeverity::Critical => 3,
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            EtlError::NotFoundError { path } => format!("Cannot find the source file '{}'", path),
            EtlError::FormatError { path, .. } => {
                format!("The source file '{}' could not be parsed", path)
            }
            EtlError::SchemaError { .. } => {
                "The destination table could not be created or verified".to_string()
            }
            EtlError::TransformError { message } => format!("Transformation failed: {}", message),
            EtlError::LoadError { .. } => "Writing to the destination table failed".to_string(),
            EtlError::ConnectionError { .. } => "The destination store is unreachable".to_string(),
            EtlError::ConfigError { .. }
            | EtlError::MissingConfigError { .. }
            | EtlError::InvalidConfigValueError { .. } => {
                format!("Invalid configuration: {}", self)
            }
            EtlError::SchedulerError { .. } | EtlError::IoError(_) => {
                format!("System failure: {}", self)
            }
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            EtlError::NotFoundError { .. } => "Check the --source path and file permissions",
            EtlError::FormatError { .. } => {
                "Make sure the file is UTF-8 CSV with a header row and equal-length rows"
            }
            EtlError::SchemaError { .. } => {
                "Check that the destination file is a writable SQLite database"
            }
            EtlError::TransformError { .. } => {
                "The source needs numeric 'UnitPrice' and 'Quantity' columns"
            }
            EtlError::LoadError { .. } => {
                "Look for rows sharing InvoiceNo, StockCode, CustomerID and InvoiceDate"
            }
            EtlError::ConnectionError { .. } => {
                "Check the --destination connection string and that its directory exists"
            }
            EtlError::ConfigError { .. }
            | EtlError::MissingConfigError { .. }
            | EtlError::InvalidConfigValueError { .. } => "Fix the configuration and run again",
            EtlError::SchedulerError { .. } | EtlError::IoError(_) => {
                "Retry later; inspect the logs if the failure persists"
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, EtlError>;
