use thiserror::Error;

#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("Invalid value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("Malformed record '{record}': {reason}")]
    MalformedRecord { record: String, reason: String },

    #[error("Vehicle with ID {0} already exists")]
    DuplicateId(u64),

    #[error("Vehicle with ID {0} not found")]
    NotFound(u64),

    #[error("Import source missing: {location}")]
    ImportSourceMissing { location: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("XML error: {message}")]
    XmlError { message: String },

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Configuration error in '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid configuration value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Validation,
    Record,
    Registry,
    Configuration,
    System,
}

impl RegistryError {
    pub fn invalid_value(field: &str, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.to_string(),
            reason: reason.into(),
        }
    }

    pub fn malformed(record: &str, reason: impl Into<String>) -> Self {
        Self::MalformedRecord {
            record: record.to_string(),
            reason: reason.into(),
        }
    }

    pub fn xml(err: impl std::fmt::Display) -> Self {
        Self::XmlError {
            message: err.to_string(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::InvalidValue { .. } => ErrorCategory::Validation,
            Self::MalformedRecord { .. } | Self::SerializationError(_) | Self::XmlError { .. } => {
                ErrorCategory::Record
            }
            Self::DuplicateId(_) | Self::NotFound(_) | Self::ImportSourceMissing { .. } => {
                ErrorCategory::Registry
            }
            Self::ConfigError { .. }
            | Self::ConfigValidationError { .. }
            | Self::InvalidConfigValueError { .. }
            | Self::MissingConfigError { .. } => ErrorCategory::Configuration,
            Self::IoError(_) => ErrorCategory::System,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            Self::InvalidValue { .. } => "Check the field values: ages, power and ticket ids must not be negative",
            Self::MalformedRecord { .. } => {
                "Make sure every record carries id, make, model, year, driver, engine and a variant field"
            }
            Self::DuplicateId(_) => "Use a different ID or update the existing vehicle instead",
            Self::NotFound(_) => "Run `list` to see the IDs currently in the registry",
            Self::ImportSourceMissing { .. } => "Pass an existing file name with --source",
            Self::SerializationError(_) => "The JSON file is not valid JSON; fix or regenerate it",
            Self::XmlError { .. } => "The XML file is not well-formed; fix or regenerate it",
            Self::IoError(_) => "Check that the data directory exists and is writable",
            Self::ConfigError { .. }
            | Self::ConfigValidationError { .. }
            | Self::InvalidConfigValueError { .. }
            | Self::MissingConfigError { .. } => "Review the configuration file and command-line flags",
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            Self::DuplicateId(id) => format!("A vehicle with ID {} is already registered", id),
            Self::NotFound(id) => format!("No vehicle with ID {} in the registry", id),
            Self::ImportSourceMissing { location } => {
                format!("Nothing to import from '{}'", location)
            }
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, RegistryError>;
