// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

use crate::chat::selection::BackendKind;
use crate::error::{BackendError, CompanionError};

/// Map a failure to obtain a response at all into a connection error.
pub(crate) fn map_send_error(backend: BackendKind, err: reqwest::Error) -> CompanionError {
    connection_error(backend, describe_send_error(&err))
}

pub(crate) fn describe_send_error(err: &reqwest::Error) -> String {
    if err.is_connect() {
        format!("connection failed: {}", err)
    } else if err.is_timeout() {
        format!("request timed out: {}", err)
    } else {
        err.to_string()
    }
}

pub(crate) fn connection_error(backend: BackendKind, message: String) -> CompanionError {
    CompanionError::Backend(BackendError::Connection {
        backend: backend.display_name().to_string(),
        message,
    })
}

/// Read the body of a non-success response into an HTTP error.
pub(crate) async fn http_error(response: reqwest::Response) -> CompanionError {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    CompanionError::Backend(BackendError::Http { status, body })
}
