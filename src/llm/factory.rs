// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Transport factory
//!
//! Builds both backend adapters from settings so the engine can route each
//! turn to whichever backend was selected when it was dispatched.

use std::sync::Arc;

use crate::chat::selection::BackendKind;
use crate::config::Settings;
use crate::llm::transport::ChatTransport;
use crate::llm::transports::{CloudBatchTransport, LocalStreamingTransport};

/// One adapter per backend
#[derive(Clone)]
pub struct TransportSet {
    local: Arc<dyn ChatTransport>,
    cloud: Arc<dyn ChatTransport>,
}

impl TransportSet {
    /// Build from explicit adapters
    pub fn new(local: Arc<dyn ChatTransport>, cloud: Arc<dyn ChatTransport>) -> Self {
        Self { local, cloud }
    }

    /// Build both real adapters from settings
    ///
    /// A missing cloud API key is not an error here: the request goes out
    /// unauthenticated and the backend's 401 is reported per turn.
    pub fn from_settings(settings: &Settings) -> Self {
        let local_cfg = &settings.backends.local;
        let local = LocalStreamingTransport::with_base_url(&local_cfg.base_url, &local_cfg.model)
            .with_carry_partial_lines(local_cfg.carry_partial_lines);

        let api_key = settings.get_cloud_api_key();
        if api_key.is_none() {
            tracing::warn!(
                target: "companion.llm.cloud",
                env = %settings.backends.cloud.api_key_env,
                "no cloud API key configured; cloud turns will be rejected"
            );
        }
        let cloud = CloudBatchTransport::with_base_url(api_key, &settings.backends.cloud.base_url);

        Self::new(Arc::new(local), Arc::new(cloud))
    }

    /// The adapter for a backend
    pub fn for_backend(&self, backend: BackendKind) -> Arc<dyn ChatTransport> {
        match backend {
            BackendKind::LocalStreaming => Arc::clone(&self.local),
            BackendKind::CloudBatch => Arc::clone(&self.cloud),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::mock_transport::MockTransport;

    #[test]
    fn test_from_settings_routes_by_backend() {
        let set = TransportSet::from_settings(&Settings::default());
        assert_eq!(
            set.for_backend(BackendKind::LocalStreaming).backend(),
            BackendKind::LocalStreaming
        );
        assert_eq!(
            set.for_backend(BackendKind::CloudBatch).backend(),
            BackendKind::CloudBatch
        );
    }

    #[test]
    fn test_new_with_mocks() {
        let set = TransportSet::new(
            Arc::new(MockTransport::new(BackendKind::LocalStreaming)),
            Arc::new(MockTransport::new(BackendKind::CloudBatch)),
        );
        assert_eq!(
            set.for_backend(BackendKind::CloudBatch).backend(),
            BackendKind::CloudBatch
        );
    }
}
