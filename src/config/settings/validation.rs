// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

use crate::error::{CompanionError, Result};

use super::Settings;

impl Settings {
    /// Get the cloud API key, checking env var first.
    pub fn get_cloud_api_key(&self) -> Option<String> {
        // Priority: env var > config file.
        std::env::var(&self.backends.cloud.api_key_env)
            .ok()
            .filter(|key| !key.is_empty())
            .or_else(|| self.backends.cloud.api_key.clone())
    }

    /// Check that the settings can drive a session.
    pub fn validate(&self) -> Result<()> {
        if self.backends.local.base_url.trim().is_empty() {
            return Err(CompanionError::Config(
                "backends.local.base_url must not be empty".to_string(),
            ));
        }
        if self.backends.local.model.trim().is_empty() {
            return Err(CompanionError::Config(
                "backends.local.model must not be empty".to_string(),
            ));
        }
        if self.backends.cloud.base_url.trim().is_empty() {
            return Err(CompanionError::Config(
                "backends.cloud.base_url must not be empty".to_string(),
            ));
        }
        if self.session.greeting.trim().is_empty() {
            return Err(CompanionError::Config(
                "session.greeting must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Settings as JSON with any stored API key masked.
    pub fn redacted_json(&self) -> Result<String> {
        let mut value = serde_json::to_value(self)?;
        if let Some(key) = value.pointer_mut("/backends/cloud/api_key") {
            *key = serde_json::Value::String("********".to_string());
        }
        Ok(serde_json::to_string_pretty(&value)?)
    }
}
