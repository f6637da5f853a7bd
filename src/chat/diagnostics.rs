// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Diagnostics sink for failed turns

use std::sync::{Arc, Mutex};
use uuid::Uuid;

use crate::chat::selection::BackendKind;
use crate::error::CompanionError;

/// Receives the technical error behind every failed turn
pub trait DiagnosticsSink: Send + Sync {
    fn report(&self, backend: BackendKind, turn_id: Uuid, error: &CompanionError);
}

/// Default sink: logs through tracing
#[derive(Debug, Default)]
pub struct TracingDiagnostics;

impl DiagnosticsSink for TracingDiagnostics {
    fn report(&self, backend: BackendKind, turn_id: Uuid, error: &CompanionError) {
        let status = match error {
            CompanionError::Backend(err) => err.status(),
            _ => None,
        };
        tracing::error!(
            target: "companion.chat.engine",
            turn_id = %turn_id,
            backend = %backend,
            status = ?status,
            error = %error,
            "turn failed"
        );
    }
}

/// One captured report
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagnosticReport {
    pub backend: BackendKind,
    pub turn_id: Uuid,
    pub error: String,
}

/// Sink that keeps reports in memory, for tests and embedding UIs
#[derive(Debug, Clone, Default)]
pub struct RecordingDiagnostics {
    reports: Arc<Mutex<Vec<DiagnosticReport>>>,
}

impl RecordingDiagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reports(&self) -> Vec<DiagnosticReport> {
        match self.reports.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl DiagnosticsSink for RecordingDiagnostics {
    fn report(&self, backend: BackendKind, turn_id: Uuid, error: &CompanionError) {
        let report = DiagnosticReport {
            backend,
            turn_id,
            error: error.to_string(),
        };
        match self.reports.lock() {
            Ok(mut guard) => guard.push(report),
            Err(poisoned) => {
                tracing::warn!("Diagnostics lock was poisoned, recovering");
                poisoned.into_inner().push(report);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BackendError;

    #[test]
    fn test_recording_sink_keeps_raw_error() {
        let sink = RecordingDiagnostics::new();
        let turn_id = Uuid::new_v4();
        let error = CompanionError::Backend(BackendError::Http {
            status: 429,
            body: "rate_limit_exceeded".to_string(),
        });

        sink.report(BackendKind::CloudBatch, turn_id, &error);

        let reports = sink.reports();
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].backend, BackendKind::CloudBatch);
        assert_eq!(reports[0].turn_id, turn_id);
        assert!(reports[0].error.contains("rate_limit_exceeded"));
    }

    #[test]
    fn test_recording_sink_clones_share_reports() {
        let sink = RecordingDiagnostics::new();
        let clone = sink.clone();
        clone.report(
            BackendKind::LocalStreaming,
            Uuid::new_v4(),
            &CompanionError::Session("x".to_string()),
        );
        assert_eq!(sink.reports().len(), 1);
    }

    #[test]
    fn test_tracing_sink_does_not_panic() {
        TracingDiagnostics.report(
            BackendKind::LocalStreaming,
            Uuid::new_v4(),
            &CompanionError::Backend(BackendError::Stream("reset".to_string())),
        );
    }
}
