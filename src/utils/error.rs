use thiserror::Error;

#[derive(Error, Debug)]
pub enum PlotterError {
    #[error("Zip operation failed: {0}")]
    ZipError(#[from] zip::result::ZipError),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    YamlError(#[from] serde_yaml::Error),

    #[error("Malformed log line ({reason}): {line}")]
    LogParseError { line: String, reason: String },

    #[error("No log lines were parsed from '{path}'. Check that you set the correct logs path.")]
    NoLogLinesError { path: String },

    #[error("Chart rendering failed: {message}")]
    RenderError { message: String },

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Missing configuration field: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Configuration validation failed for {field}: {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Data processing error: {message}")]
    ProcessingError { message: String },

    #[error("Validation error: {message}")]
    ValidationError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Config,
    Input,
    Processing,
    Output,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl PlotterError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            PlotterError::ConfigError { .. }
            | PlotterError::MissingConfigError { .. }
            | PlotterError::InvalidConfigValueError { .. }
            | PlotterError::ConfigValidationError { .. } => ErrorCategory::Config,
            PlotterError::LogParseError { .. }
            | PlotterError::NoLogLinesError { .. }
            | PlotterError::YamlError(_)
            | PlotterError::ValidationError { .. } => ErrorCategory::Input,
            PlotterError::ProcessingError { .. } => ErrorCategory::Processing,
            PlotterError::CsvError(_)
            | PlotterError::SerializationError(_)
            | PlotterError::ZipError(_)
            | PlotterError::RenderError { .. } => ErrorCategory::Output,
            PlotterError::IoError(_) => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            PlotterError::LogParseError { .. } => ErrorSeverity::Low,
            PlotterError::RenderError { .. } | PlotterError::ZipError(_) => ErrorSeverity::Medium,
            PlotterError::IoError(_) => ErrorSeverity::Critical,
            _ => ErrorSeverity::High,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            PlotterError::NoLogLinesError { .. } => {
                "Point --logs-path (or LOGS_PATH) at the directory holding the Apache access logs"
            }
            PlotterError::LogParseError { .. } => {
                "Make sure the logs use the Apache combined log format"
            }
            PlotterError::ConfigError { .. }
            | PlotterError::MissingConfigError { .. }
            | PlotterError::InvalidConfigValueError { .. }
            | PlotterError::ConfigValidationError { .. } => {
                "Check the command line flags and the TOML configuration file"
            }
            PlotterError::YamlError(_) | PlotterError::ValidationError { .. } => {
                "Fix the reported entries in the environment descriptor"
            }
            PlotterError::RenderError { .. } => "Re-run with --verbose to see which chart failed",
            PlotterError::IoError(_) => "Check that the paths exist and are readable/writable",
            PlotterError::CsvError(_)
            | PlotterError::SerializationError(_)
            | PlotterError::ZipError(_) => "Check free disk space and permissions on the output path",
            PlotterError::ProcessingError { .. } => "Re-run with --verbose and inspect the offending log lines",
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Config => format!("Invalid configuration: {}", self),
            ErrorCategory::Input => format!("Could not read input: {}", self),
            ErrorCategory::Processing => format!("Report generation failed: {}", self),
            ErrorCategory::Output => format!("Could not write output: {}", self),
            ErrorCategory::System => format!("System error: {}", self),
        }
    }

    /// Process exit code for a failed run.
    pub fn exit_code(&self) -> i32 {
        match self.severity() {
            ErrorSeverity::Low => 0,
            ErrorSeverity::Medium => 2,
            ErrorSeverity::High => 1,
            ErrorSeverity::Critical => 3,
        }
    }

    pub(crate) fn render<E: std::fmt::Display>(err: E) -> Self {
        PlotterError::RenderError {
            message: err.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, PlotterError>;
