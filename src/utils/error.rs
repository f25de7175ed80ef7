use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProbeError {
    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("Provider rejected {operation} (HTTP {status}): {message}")]
    ProviderError {
        operation: String,
        status: u16,
        message: String,
    },

    #[error("{operation} timed out after {seconds}s")]
    Timeout { operation: String, seconds: u64 },

    #[error("Malformed provider response: {message}")]
    MalformedResponse { message: String },

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Missing configuration value: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Validation error: {message}")]
    ValidationError { message: String },
}

/// Where an error belongs in the failure taxonomy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Credentials, settings or targets are unusable; the run cannot start.
    Config,
    /// A single provider query failed.
    Query,
    /// The provider answered with something we could not interpret.
    Execution,
    /// Reading inputs or writing reports failed.
    Output,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl ProbeError {
    pub fn config(message: impl Into<String>) -> Self {
        Self::ConfigError {
            message: message.into(),
        }
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedResponse {
            message: message.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::ConfigError { .. }
            | Self::MissingConfigError { .. }
            | Self::InvalidConfigValueError { .. }
            | Self::ValidationError { .. }
            | Self::TomlError(_) => ErrorCategory::Config,
            Self::ApiError(_) | Self::ProviderError { .. } | Self::Timeout { .. } => {
                ErrorCategory::Query
            }
            Self::MalformedResponse { .. } | Self::SerializationError(_) => {
                ErrorCategory::Execution
            }
            Self::CsvError(_) | Self::IoError(_) => ErrorCategory::Output,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Config => ErrorSeverity::Critical,
            ErrorCategory::Output => ErrorSeverity::High,
            ErrorCategory::Execution => ErrorSeverity::Medium,
            ErrorCategory::Query => ErrorSeverity::Low,
        }
    }

    /// Only configuration problems are allowed to end the process.
    pub fn is_fatal(&self) -> bool {
        self.category() == ErrorCategory::Config
    }

    /// Process exit status for an error that ended the run. Never zero.
    pub fn exit_code(&self) -> i32 {
        match self.severity() {
            ErrorSeverity::Critical => 3,
            ErrorSeverity::Medium => 2,
            ErrorSeverity::High | ErrorSeverity::Low => 1,
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            Self::MissingConfigError { field } => {
                format!("Required setting '{}' is missing from the configuration", field)
            }
            Self::InvalidConfigValueError { field, reason, .. } => {
                format!("Setting '{}' is invalid: {}", field, reason)
            }
            Self::ProviderError { status: 401 | 403, .. } => {
                "The intelligence provider refused the API credentials".to_string()
            }
            Self::ProviderError { status: 429, .. } => {
                "The intelligence provider rate limit was reached".to_string()
            }
            Self::Timeout { operation, .. } => format!("{} did not answer in time", operation),
            other => other.to_string(),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self.category() {
            ErrorCategory::Config => {
                "Check the config file and the environment variables it references"
            }
            ErrorCategory::Query => {
                "Retry later or lower scan.concurrency to stay under the provider rate limit"
            }
            ErrorCategory::Execution => "The provider response schema may have changed",
            ErrorCategory::Output => "Check that the input files are readable and the output directory is writable",
        }
    }
}

pub type Result<T> = std::result::Result<T, ProbeError>;
