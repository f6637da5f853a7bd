// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Failure classification
//!
//! Maps a failed turn to the explanation shown in the transcript. The raw
//! error never reaches the user; it goes to the diagnostics sink instead.

use crate::chat::selection::BackendKind;
use crate::error::{BackendError, CompanionError};

/// What the user is told about a failed turn
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClass {
    /// 401
    Credentials,
    /// 429
    RateLimited,
    /// 400
    BadRequest,
    /// 500
    ServerError,
    /// No progress within the turn timeout
    TimedOut,
    /// Unreachable, unexpected payload, broken stream, other statuses
    Generic,
}

impl FailureClass {
    pub fn classify(err: &CompanionError) -> Self {
        match err {
            CompanionError::Backend(BackendError::Http { status, .. }) => match *status {
                401 => FailureClass::Credentials,
                429 => FailureClass::RateLimited,
                400 => FailureClass::BadRequest,
                500 => FailureClass::ServerError,
                _ => FailureClass::Generic,
            },
            CompanionError::Backend(BackendError::Timeout { .. }) => FailureClass::TimedOut,
            _ => FailureClass::Generic,
        }
    }

    /// Transcript text for this class, naming the backend where it helps
    pub fn message(self, backend: BackendKind) -> String {
        let name = backend.display_name();
        match self {
            FailureClass::Credentials => {
                format!("Authentication failed. Please check the {} API key.", name)
            }
            FailureClass::RateLimited => {
                "Rate limit exceeded. Please wait a moment and try again.".to_string()
            }
            FailureClass::BadRequest => {
                "Invalid request format. Please try rephrasing your message.".to_string()
            }
            FailureClass::ServerError => {
                format!("{} server error. Please try again later.", name)
            }
            FailureClass::TimedOut => {
                format!("{} took too long to respond. Please try again.", name)
            }
            FailureClass::Generic => format!(
                "Sorry, I could not get a response from {}. Please try again.",
                name
            ),
        }
    }
}

/// Transcript text for a failed turn on `backend`
pub fn user_facing_message(backend: BackendKind, err: &CompanionError) -> String {
    FailureClass::classify(err).message(backend)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn http(status: u16) -> CompanionError {
        CompanionError::Backend(BackendError::Http {
            status,
            body: "raw body".to_string(),
        })
    }

    #[test]
    fn test_classify_status_codes() {
        assert_eq!(FailureClass::classify(&http(401)), FailureClass::Credentials);
        assert_eq!(FailureClass::classify(&http(429)), FailureClass::RateLimited);
        assert_eq!(FailureClass::classify(&http(400)), FailureClass::BadRequest);
        assert_eq!(FailureClass::classify(&http(500)), FailureClass::ServerError);
        assert_eq!(FailureClass::classify(&http(503)), FailureClass::Generic);
        assert_eq!(FailureClass::classify(&http(404)), FailureClass::Generic);
    }

    #[test]
    fn test_classify_non_http_errors() {
        let connection = CompanionError::Backend(BackendError::Connection {
            backend: "Ollama".to_string(),
            message: "refused".to_string(),
        });
        let protocol = CompanionError::Backend(BackendError::Protocol("no choices".to_string()));
        let stream = CompanionError::Backend(BackendError::Stream("reset".to_string()));
        let timeout = CompanionError::Backend(BackendError::Timeout { seconds: 5 });

        assert_eq!(FailureClass::classify(&connection), FailureClass::Generic);
        assert_eq!(FailureClass::classify(&protocol), FailureClass::Generic);
        assert_eq!(FailureClass::classify(&stream), FailureClass::Generic);
        assert_eq!(FailureClass::classify(&timeout), FailureClass::TimedOut);
    }

    #[test]
    fn test_messages_name_the_backend() {
        assert_eq!(
            user_facing_message(BackendKind::CloudBatch, &http(401)),
            "Authentication failed. Please check the Groq API key."
        );
        assert_eq!(
            user_facing_message(BackendKind::LocalStreaming, &http(500)),
            "Ollama server error. Please try again later."
        );
        assert_eq!(
            user_facing_message(
                BackendKind::LocalStreaming,
                &CompanionError::Backend(BackendError::Protocol("x".to_string()))
            ),
            "Sorry, I could not get a response from Ollama. Please try again."
        );
    }

    #[test]
    fn test_rate_limit_wording() {
        let text = user_facing_message(BackendKind::CloudBatch, &http(429));
        assert!(text.contains("Rate limit"));
    }

    #[test]
    fn test_raw_error_never_leaks() {
        for status in [400, 401, 429, 500, 502] {
            let text = user_facing_message(BackendKind::CloudBatch, &http(status));
            assert!(!text.contains("raw body"));
            assert!(!text.contains(&status.to_string()));
        }
    }
}
