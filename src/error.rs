//! Error types for envbot
//!
//! Provides structured error handling with:
//! - Numeric error codes for machine parsing
//! - Operator hints for the failures worth explaining
//! - Exit codes for CLI

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for envbot operations
pub type Result<T> = std::result::Result<T, Error>;

/// Numeric error codes for machine parsing and documentation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum ErrorCode {
    // Configuration errors (1xx)
    ConfigNotFound = 100,
    ConfigParseError = 101,
    ConfigValidation = 102,

    // Store / persistence errors (2xx)
    StoreRead = 200,
    StoreWrite = 201,
    StoreCorrupt = 202,
    IoNotFound = 203,
    IoPermission = 204,
    Serialization = 205,

    // Request errors (3xx)
    Usage = 300,
    InvalidArgument = 301,
    UnknownCommand = 302,

    // Access list outcomes (4xx)
    UserNotFound = 400,
    UserExists = 401,

    // Internal errors (9xx)
    InternalError = 900,
}

impl ErrorCode {
    /// Get the string code (e.g., "E100")
    pub fn as_str(&self) -> String {
        format!("E{}", *self as u16)
    }

    /// Get the exit code for CLI
    pub fn exit_code(&self) -> i32 {
        match *self as u16 {
            100..=199 => 10,
            200..=299 => 20,
            300..=399 => 30,
            400..=499 => 40,
            900..=999 => 90,
            _ => 1,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Main error type for envbot
#[derive(Error, Debug)]
pub enum Error {
    // ─────────────────────────────────────────────────────────────
    // Configuration Errors
    // ─────────────────────────────────────────────────────────────

    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    ConfigNotFound { path: PathBuf },

    /// Configuration parse error
    #[error("Failed to parse configuration {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    /// Configuration validation error
    #[error("Configuration validation failed: {message}")]
    ConfigValidation { message: String, field: Option<String> },

    /// Generic configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    // ─────────────────────────────────────────────────────────────
    // Store Errors
    // ─────────────────────────────────────────────────────────────

    /// Env file could not be read
    #[error("Failed to read env file: {path}")]
    StoreRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Env file could not be rewritten
    #[error("Failed to write env file: {path}")]
    StoreWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Env file content violates the access list invariants
    #[error("Env file {path} is inconsistent: {message}")]
    StoreCorrupt { path: PathBuf, message: String },

    /// Generic IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML serialization error
    #[error("TOML serialization error: {0}")]
    Toml(#[from] toml::ser::Error),

    /// JSON serialization error
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    // ─────────────────────────────────────────────────────────────
    // Request Errors
    // ─────────────────────────────────────────────────────────────

    /// Wrong number of arguments for a command
    #[error("{usage}")]
    Usage { usage: &'static str },

    /// Argument present but unusable
    #[error("Invalid {field} '{value}': {reason}")]
    InvalidArgument {
        field: &'static str,
        value: String,
        reason: String,
    },

    /// Command name not recognised
    #[error("Unknown command: {name}")]
    UnknownCommand { name: String },

    // ─────────────────────────────────────────────────────────────
    // Access List Outcomes
    // ─────────────────────────────────────────────────────────────

    /// Identity absent from the access list
    #[error("User not found: {identity}")]
    UserNotFound { identity: String },

    /// Identity already on the access list
    #[error("User already exists: {identity}")]
    UserExists { identity: String },

    // ─────────────────────────────────────────────────────────────
    // Internal Errors
    // ─────────────────────────────────────────────────────────────

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    // ─────────────────────────────────────────────────────────────
    // Error Classification
    // ─────────────────────────────────────────────────────────────

    /// Get the numeric error code
    pub fn code(&self) -> ErrorCode {
        match self {
            Error::ConfigNotFound { .. } => ErrorCode::ConfigNotFound,
            Error::ConfigParse { .. } => ErrorCode::ConfigParseError,
            Error::ConfigValidation { .. } => ErrorCode::ConfigValidation,
            Error::Config(_) => ErrorCode::ConfigValidation,

            Error::StoreRead { source, .. } => match source.kind() {
                std::io::ErrorKind::NotFound => ErrorCode::IoNotFound,
                std::io::ErrorKind::PermissionDenied => ErrorCode::IoPermission,
                _ => ErrorCode::StoreRead,
            },
            Error::StoreWrite { .. } => ErrorCode::StoreWrite,
            Error::StoreCorrupt { .. } => ErrorCode::StoreCorrupt,
            Error::Io(e) => match e.kind() {
                std::io::ErrorKind::NotFound => ErrorCode::IoNotFound,
                std::io::ErrorKind::PermissionDenied => ErrorCode::IoPermission,
                _ => ErrorCode::StoreRead,
            },
            Error::Toml(_) | Error::Json(_) => ErrorCode::Serialization,

            Error::Usage { .. } => ErrorCode::Usage,
            Error::InvalidArgument { .. } => ErrorCode::InvalidArgument,
            Error::UnknownCommand { .. } => ErrorCode::UnknownCommand,

            Error::UserNotFound { .. } => ErrorCode::UserNotFound,
            Error::UserExists { .. } => ErrorCode::UserExists,

            Error::Internal(_) => ErrorCode::InternalError,
        }
    }

    /// Check if the error is fatal (startup must halt)
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Error::ConfigNotFound { .. }
                | Error::ConfigParse { .. }
                | Error::ConfigValidation { .. }
                | Error::Config(_)
                | Error::StoreRead { .. }
                | Error::StoreCorrupt { .. }
                | Error::Internal(_)
        )
    }

    /// Check if the error is a request outcome the caller can simply be told about
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Error::Usage { .. }
                | Error::InvalidArgument { .. }
                | Error::UnknownCommand { .. }
                | Error::UserNotFound { .. }
                | Error::UserExists { .. }
        )
    }

    /// Get the exit code for CLI
    pub fn exit_code(&self) -> i32 {
        self.code().exit_code()
    }

    // ─────────────────────────────────────────────────────────────
    // User-Friendly Messages
    // ─────────────────────────────────────────────────────────────

    /// Get a hint for how to fix this error
    pub fn suggestion(&self) -> Option<&'static str> {
        match self {
            Error::ConfigNotFound { .. } => {
                Some("Run 'envbot config init' to create a default configuration file.")
            }
            Error::ConfigParse { .. } => Some(
                "Check your configuration file syntax. Run 'envbot config validate' to see details.",
            ),
            Error::ConfigValidation { .. } => {
                Some("Review the configuration file and fix the invalid values.")
            }
            Error::StoreRead { .. } => Some(
                "The env file must exist before envbot starts. Point --env-file or ENVBOT_ENV_FILE at it.",
            ),
            Error::StoreWrite { .. } => {
                Some("Check that the env file and its directory are writable.")
            }
            Error::StoreCorrupt { .. } => Some(
                "Fix the identity and budget lists by hand so they have the same number of unique entries.",
            ),
            Error::UnknownCommand { .. } => Some("Send /start to see the available commands."),
            _ => None,
        }
    }

    /// Format the error for terminal display with colors
    pub fn format_for_terminal(&self) -> String {
        let mut output = format!(
            "\x1b[31mError [{}]\x1b[0m: {}\n",
            self.code().as_str(),
            self
        );

        if let Some(hint) = self.suggestion() {
            output.push_str(&format!("\n\x1b[33mHint\x1b[0m: {}\n", hint));
        }

        output
    }

    /// Format the error for logging (no colors)
    pub fn format_for_log(&self) -> String {
        format!("[{}] {}", self.code().as_str(), self)
    }
}

// ─────────────────────────────────────────────────────────────────
// Error Constructors
// ─────────────────────────────────────────────────────────────────

impl Error {
    /// Create a config validation error
    pub fn config_validation(message: impl Into<String>) -> Self {
        Error::ConfigValidation {
            message: message.into(),
            field: None,
        }
    }

    /// Create a config validation error with field name
    pub fn config_field_invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        Error::ConfigValidation {
            message: message.into(),
            field: Some(field.into()),
        }
    }

    /// Create a store corruption error
    pub fn store_corrupt(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Error::StoreCorrupt {
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn invalid_argument(
        field: &'static str,
        value: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Error::InvalidArgument {
            field,
            value: value.into(),
            reason: reason.into(),
        }
    }

    pub fn user_not_found(identity: impl Into<String>) -> Self {
        Error::UserNotFound {
            identity: identity.into(),
        }
    }

    pub fn user_exists(identity: impl Into<String>) -> Self {
        Error::UserExists {
            identity: identity.into(),
        }
    }
}

// ─────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────
