// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Error types for the companion engine
//!
//! Transports surface raw `BackendError`s; the session engine is the only
//! place that turns them into transcript text.

use thiserror::Error;

/// Main error type for companion operations
#[derive(Error, Debug)]
pub enum CompanionError {
    /// Backend transport errors
    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Session state errors (operation not valid in the current phase)
    #[error("Session error: {0}")]
    Session(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Backend-specific error types
#[derive(Error, Debug)]
pub enum BackendError {
    /// Transport unreachable before any bytes were exchanged
    #[error("Could not reach {backend}: {message}")]
    Connection { backend: String, message: String },

    /// Backend reachable but rejected the request
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// Response did not match the expected shape
    #[error("Invalid backend response: {0}")]
    Protocol(String),

    /// Response channel failed after bytes were received
    #[error("Streaming error: {0}")]
    Stream(String),

    /// No progress from the backend within the turn timeout
    #[error("Request timed out after {seconds} seconds")]
    Timeout { seconds: u64 },
}

impl BackendError {
    /// HTTP status code, if the backend answered with one
    pub fn status(&self) -> Option<u16> {
        match self {
            BackendError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Result type alias for companion operations
pub type Result<T> = std::result::Result<T, CompanionError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_companion_error_config() {
        let err = CompanionError::Config("bad config".to_string());
        assert!(err.to_string().contains("Configuration error"));
        assert!(err.to_string().contains("bad config"));
    }

    #[test]
    fn test_companion_error_session() {
        let err = CompanionError::Session("turn in flight".to_string());
        assert!(err.to_string().contains("Session error"));
    }

    #[test]
    fn test_companion_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: CompanionError = io_err.into();
        assert!(err.to_string().contains("IO error"));
    }

    #[test]
    fn test_companion_error_from_backend_error() {
        let err: CompanionError = BackendError::Protocol("missing choices".to_string()).into();
        assert!(err.to_string().contains("Backend error"));
        assert!(err.to_string().contains("missing choices"));
    }

    #[test]
    fn test_backend_error_connection() {
        let err = BackendError::Connection {
            backend: "Ollama".to_string(),
            message: "connection refused".to_string(),
        };
        assert!(err.to_string().contains("Ollama"));
        assert!(err.to_string().contains("connection refused"));
        assert_eq!(err.status(), None);
    }

    #[test]
    fn test_backend_error_http_status() {
        let err = BackendError::Http {
            status: 429,
            body: "slow down".to_string(),
        };
        assert_eq!(err.status(), Some(429));
        assert!(err.to_string().contains("429"));
        assert!(err.to_string().contains("slow down"));
    }

    #[test]
    fn test_backend_error_timeout() {
        let err = BackendError::Timeout { seconds: 30 };
        assert!(err.to_string().contains("timed out"));
        assert!(err.to_string().contains("30"));
    }

    #[test]
    fn test_backend_error_debug() {
        let err = BackendError::Stream("reset".to_string());
        assert!(format!("{:?}", err).contains("Stream"));
    }
}
