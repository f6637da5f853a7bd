// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Backend transport implementations

pub mod cloud;
mod common;
pub mod local;
pub mod ndjson;

pub use cloud::CloudBatchTransport;
pub use local::LocalStreamingTransport;
pub use ndjson::NdjsonDecoder;
