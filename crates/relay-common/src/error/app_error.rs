//! Application error types
//!
//! Unified error handling for agent startup and the outer task layer.
//! Session-level failures stay inside the clients as `SessionError`s; only
//! errors that stop the agent surface here.

use relay_core::{SessionError, StoreError};
use std::fmt;

use crate::config::ConfigError;

/// Application-wide error type
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    // Storage errors
    #[error("Storage error: {0}")]
    Storage(#[from] StoreError),

    // Session errors that escape a client
    #[error(transparent)]
    Session(#[from] SessionError),

    // TLS setup errors
    #[error("TLS setup failed: {0}")]
    Tls(String),

    // Console errors
    #[error("Console error: {0}")]
    Console(String),

    // I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // Internal errors
    #[error("Internal error")]
    Internal(#[source] anyhow::Error),
}

impl AppError {
    /// Get an error code for structured logs
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Config(_) => "CONFIG_ERROR",
            Self::Storage(_) => "STORAGE_ERROR",
            Self::Session(e) => e.code(),
            Self::Tls(_) => "TLS_ERROR",
            Self::Console(_) => "CONSOLE_ERROR",
            Self::Io(_) => "IO_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Process exit code for this error
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config(_) => 2,
            _ => 1,
        }
    }

    #[must_use]
    pub fn tls(msg: impl fmt::Display) -> Self {
        Self::Tls(msg.to_string())
    }

    #[must_use]
    pub fn console(msg: impl fmt::Display) -> Self {
        Self::Console(msg.to_string())
    }

    /// Create an internal error from any error
    pub fn internal(err: impl Into<anyhow::Error>) -> Self {
        Self::Internal(err.into())
    }
}

/// Result type alias for application operations
pub type AppResult<T> = Result<T, AppError>;
