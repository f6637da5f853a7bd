// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! LLM module for the companion
//!
//! Provides one transport abstraction over the local streaming backend and
//! the cloud batch backend.

pub mod factory;
pub mod message;
pub mod mock_transport;
pub mod think;
pub mod transport;
pub mod transports;

pub use message::*;
pub use transport::*;
