// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

use std::io;

use companion::chat::failure::{user_facing_message, FailureClass};
use companion::chat::selection::BackendKind;
use companion::error::{BackendError, CompanionError};

#[test]
fn test_io_error_conversion() {
    let io_error = io::Error::new(io::ErrorKind::NotFound, "File not found");
    let error: CompanionError = io_error.into();

    match error {
        CompanionError::Io(_) => {} // Expected
        _ => panic!("Expected Io error, got different error type"),
    }
}

#[test]
fn test_config_error_display() {
    let error = CompanionError::Config("Missing base URL".to_string());
    assert_eq!(error.to_string(), "Configuration error: Missing base URL");
}

#[test]
fn test_http_error_display() {
    let error = BackendError::Http {
        status: 401,
        body: "invalid api key".to_string(),
    };
    assert_eq!(error.to_string(), "HTTP 401: invalid api key");
}

#[test]
fn test_timeout_error_display() {
    let error = BackendError::Timeout { seconds: 120 };
    assert_eq!(error.to_string(), "Request timed out after 120 seconds");
}

#[test]
fn test_json_error_conversion() {
    let json_error = serde_json::from_str::<serde_json::Value>("{bad").unwrap_err();
    let error: CompanionError = json_error.into();
    assert!(matches!(error, CompanionError::Json(_)));
}

#[test]
fn test_backend_error_is_classified_for_users() {
    let error: CompanionError = BackendError::Http {
        status: 429,
        body: String::new(),
    }
    .into();
    assert_eq!(FailureClass::classify(&error), FailureClass::RateLimited);
    assert_eq!(
        user_facing_message(BackendKind::LocalStreaming, &error),
        "Rate limit exceeded. Please wait a moment and try again."
    );
}

#[test]
fn test_connection_error_is_generic_for_users() {
    let error: CompanionError = BackendError::Connection {
        backend: "Groq".to_string(),
        message: "dns error".to_string(),
    }
    .into();
    let text = user_facing_message(BackendKind::CloudBatch, &error);
    assert_eq!(
        text,
        "Sorry, I could not get a response from Groq. Please try again."
    );
    assert!(!text.contains("dns"));
}
